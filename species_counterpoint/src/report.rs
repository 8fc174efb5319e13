// The structured analysis report.
//
// A `Report` maps each `RuleId` the species checks to exactly one
// `RuleResult` variant, whose shape is fixed per rule: per-voice findings,
// per-pair findings, per-pair groups (parallel runs), per-pair alignment, or
// the cantus firmus identification. A rule that finds nothing still has an
// entry with empty lists, so "checked and clean" is distinguishable from "not
// checked".
//
// Findings hold copies of the nodes involved, so a report owns all of its
// data and outlives the note lists it was computed from.

use crate::composition::VoiceName;
use crate::harmonic::Alignment;
use crate::interval::Interval;
use crate::note_list::{NoteNode, Onset};
use std::collections::BTreeMap;
use std::fmt;

/// Every rule the evaluator can report, in report order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RuleId {
    AccidentalErrors,
    AlignmentErrors,
    CantusFirmus,
    ConsecutiveParallelErrors,
    DirectMotionErrors,
    HighPointErrors,
    HighVoiceBeginningError,
    HighVoiceEndingError,
    HorizontalErrors,
    IndirectHorizontalErrors,
    InvalidDurations,
    InvalidRests,
    LowVoiceBeginningError,
    ParallelDownbeatErrors,
    ParallelErrors,
    RepeatedNotes,
    StrongBeatHorizontals,
    TurnaroundErrors,
    VerticalIntervalErrors,
    VoiceCrossingErrors,
    WeakHorizontalErrors,
}

impl RuleId {
    pub const ALL: [RuleId; 21] = [
        RuleId::AccidentalErrors,
        RuleId::AlignmentErrors,
        RuleId::CantusFirmus,
        RuleId::ConsecutiveParallelErrors,
        RuleId::DirectMotionErrors,
        RuleId::HighPointErrors,
        RuleId::HighVoiceBeginningError,
        RuleId::HighVoiceEndingError,
        RuleId::HorizontalErrors,
        RuleId::IndirectHorizontalErrors,
        RuleId::InvalidDurations,
        RuleId::InvalidRests,
        RuleId::LowVoiceBeginningError,
        RuleId::ParallelDownbeatErrors,
        RuleId::ParallelErrors,
        RuleId::RepeatedNotes,
        RuleId::StrongBeatHorizontals,
        RuleId::TurnaroundErrors,
        RuleId::VerticalIntervalErrors,
        RuleId::VoiceCrossingErrors,
        RuleId::WeakHorizontalErrors,
    ];

    /// Snake-case identifier used in output and logs.
    pub fn name(self) -> &'static str {
        match self {
            RuleId::AccidentalErrors => "accidental_errors",
            RuleId::AlignmentErrors => "alignment_errors",
            RuleId::CantusFirmus => "cantus_firmus",
            RuleId::ConsecutiveParallelErrors => "consecutive_parallel_errors",
            RuleId::DirectMotionErrors => "direct_motion_errors",
            RuleId::HighPointErrors => "high_point_errors",
            RuleId::HighVoiceBeginningError => "high_voice_beginning_error",
            RuleId::HighVoiceEndingError => "high_voice_ending_error",
            RuleId::HorizontalErrors => "horizontal_errors",
            RuleId::IndirectHorizontalErrors => "indirect_horizontal_errors",
            RuleId::InvalidDurations => "invalid_durations",
            RuleId::InvalidRests => "invalid_rests",
            RuleId::LowVoiceBeginningError => "low_voice_beginning_error",
            RuleId::ParallelDownbeatErrors => "parallel_downbeat_errors",
            RuleId::ParallelErrors => "parallel_errors",
            RuleId::RepeatedNotes => "repeated_notes",
            RuleId::StrongBeatHorizontals => "strong_beat_horizontals",
            RuleId::TurnaroundErrors => "turnaround_errors",
            RuleId::VerticalIntervalErrors => "vertical_interval_errors",
            RuleId::VoiceCrossingErrors => "voice_crossing_errors",
            RuleId::WeakHorizontalErrors => "weak_horizontal_errors",
        }
    }

    /// The written rule, shown after a violation.
    pub fn description(self) -> &'static str {
        match self {
            RuleId::AccidentalErrors => "All notes must belong to the key; accidentals are not allowed.",
            RuleId::AlignmentErrors => {
                "In first species every note must line up with a note of the same length in every other voice."
            }
            RuleId::CantusFirmus => "The cantus firmus is written entirely in whole notes.",
            RuleId::ConsecutiveParallelErrors => "No parallel interval may repeat more than 3 times.",
            RuleId::DirectMotionErrors => {
                "Direct (similar) motion to a P5, P1, or their octaves, is forbidden."
            }
            RuleId::HighPointErrors => "The melodic high points of two voices may not coincide.",
            RuleId::HighVoiceBeginningError => "The highest voice must begin on the tonic or the fifth.",
            RuleId::HighVoiceEndingError => {
                "The highest voice must end by step from the leading tone to the tonic."
            }
            RuleId::HorizontalErrors => {
                "Melodic intervals are limited to m2, M2, m3, M3, P4, P5, m6, M6 and their octaves."
            }
            RuleId::IndirectHorizontalErrors => {
                "The span between melodic high and low points is limited to m2, M2, m3, M3, P4, P5, m6, M6 and their octaves."
            }
            RuleId::InvalidDurations => {
                "The counterpoint moves in half notes, ending with a whole note after a whole or half note."
            }
            RuleId::InvalidRests => "A rest may only open the counterpoint.",
            RuleId::LowVoiceBeginningError => "The lowest voice must begin on the tonic.",
            RuleId::ParallelDownbeatErrors => {
                "Only m3, M3, m6, M6 and their octaves may repeat on consecutive downbeats."
            }
            RuleId::ParallelErrors => {
                "Parallel motion is only allowed in m3, M3, m6, M6 and their octaves."
            }
            RuleId::RepeatedNotes => "A note may not be repeated immediately.",
            RuleId::StrongBeatHorizontals => {
                "Consecutive strong beats are limited to m2, M2, m3, M3, P4, P5, m6, M6 and their octaves."
            }
            RuleId::TurnaroundErrors => {
                "A leap of a fifth or more must be followed by a step in the opposite direction."
            }
            RuleId::VerticalIntervalErrors => {
                "Vertical intervals are limited to P1, m3, M3, P4, P5, m6, M6, and their octaves."
            }
            RuleId::VoiceCrossingErrors => {
                "A voice may not cross into the range of another voice, within one note."
            }
            RuleId::WeakHorizontalErrors => "Leaps greater than a 5th may only land on strong beats.",
        }
    }
}

impl fmt::Display for RuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Two voices, the higher one first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VoicePair {
    pub high: VoiceName,
    pub low: VoiceName,
}

impl VoicePair {
    pub fn new(high: VoiceName, low: VoiceName) -> Self {
        VoicePair { high, low }
    }
}

impl fmt::Display for VoicePair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} and {}", self.high, self.low)
    }
}

/// One violation located in the music.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Finding {
    /// A single offending note.
    Note(NoteNode),
    /// A melodic interval, located at the note it lands on.
    Leap { interval: Interval, note: NoteNode },
    /// A span between two notes of one voice.
    Outline {
        interval: Interval,
        from: NoteNode,
        to: NoteNode,
    },
    /// Two consecutive notes of the same pitch.
    Repeat { from: NoteNode, to: NoteNode },
    /// An instant shared by both voices of a pair.
    Onset(Onset),
    /// A vertical interval at an onset.
    Vertical { interval: Interval, onset: Onset },
    /// The two notes of a voice crossing.
    Crossing { upper: NoteNode, lower: NoteNode },
}

/// The result of one rule, shaped by its scope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleResult {
    Cantus(Option<VoiceName>),
    ByVoice(BTreeMap<VoiceName, Vec<Finding>>),
    ByPair(BTreeMap<VoicePair, Vec<Finding>>),
    GroupedByPair(BTreeMap<VoicePair, Vec<Vec<Finding>>>),
    Alignment(BTreeMap<VoicePair, Alignment>),
}

impl RuleResult {
    /// Number of reportable violations.
    pub fn violation_count(&self) -> usize {
        match self {
            RuleResult::Cantus(_) => 0,
            RuleResult::ByVoice(map) => map.values().map(Vec::len).sum(),
            RuleResult::ByPair(map) => map.values().map(Vec::len).sum(),
            RuleResult::GroupedByPair(map) => map.values().map(Vec::len).sum(),
            RuleResult::Alignment(map) => map
                .values()
                .map(|a| a.unmatched_a.len() + a.unmatched_b.len())
                .sum(),
        }
    }
}

/// Rule results for one analysis.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Report {
    results: BTreeMap<RuleId, RuleResult>,
}

impl Report {
    pub fn new() -> Self {
        Report::default()
    }

    pub fn insert(&mut self, rule: RuleId, result: RuleResult) {
        log::debug!("{}: {} violation(s)", rule, result.violation_count());
        self.results.insert(rule, result);
    }

    pub fn get(&self, rule: RuleId) -> Option<&RuleResult> {
        self.results.get(&rule)
    }

    pub fn contains(&self, rule: RuleId) -> bool {
        self.results.contains_key(&rule)
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&RuleId, &RuleResult)> {
        self.results.iter()
    }

    pub fn rules(&self) -> impl Iterator<Item = RuleId> + '_ {
        self.results.keys().copied()
    }

    /// Total violations across all rules.
    pub fn violation_count(&self) -> usize {
        self.results.values().map(RuleResult::violation_count).sum()
    }

    /// The identified cantus firmus, if the report carries one.
    pub fn cantus_firmus(&self) -> Option<VoiceName> {
        match self.get(RuleId::CantusFirmus) {
            Some(RuleResult::Cantus(voice)) => *voice,
            _ => None,
        }
    }

    /// Findings of a per-voice rule for one voice (empty if absent).
    pub fn voice_findings(&self, rule: RuleId, voice: VoiceName) -> &[Finding] {
        match self.get(rule) {
            Some(RuleResult::ByVoice(map)) => map.get(&voice).map(Vec::as_slice).unwrap_or(&[]),
            _ => &[],
        }
    }

    /// Findings of a per-pair rule for one pair (empty if absent).
    pub fn pair_findings(&self, rule: RuleId, pair: VoicePair) -> &[Finding] {
        match self.get(rule) {
            Some(RuleResult::ByPair(map)) => map.get(&pair).map(Vec::as_slice).unwrap_or(&[]),
            _ => &[],
        }
    }

    /// Groups of a grouped per-pair rule for one pair (empty if absent).
    pub fn pair_groups(&self, rule: RuleId, pair: VoicePair) -> &[Vec<Finding>] {
        match self.get(rule) {
            Some(RuleResult::GroupedByPair(map)) => {
                map.get(&pair).map(Vec::as_slice).unwrap_or(&[])
            }
            _ => &[],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ratio::Ratio;

    fn onset(bar: usize) -> Onset {
        Onset::new(bar, Ratio::zero())
    }

    #[test]
    fn test_rule_names_are_unique() {
        let mut names: Vec<&str> = RuleId::ALL.iter().map(|r| r.name()).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), RuleId::ALL.len());
    }

    #[test]
    fn test_rule_order_matches_names() {
        let names: Vec<&str> = RuleId::ALL.iter().map(|r| r.name()).collect();
        let mut sorted = names.clone();
        sorted.sort();
        assert_eq!(names, sorted);
    }

    #[test]
    fn test_every_rule_has_description() {
        for rule in RuleId::ALL {
            assert!(rule.description().ends_with('.'), "{} description", rule);
        }
    }

    #[test]
    fn test_violation_count_by_shape() {
        let pair = VoicePair::new(VoiceName::Soprano, VoiceName::Bass);
        let mut report = Report::new();
        report.insert(RuleId::CantusFirmus, RuleResult::Cantus(Some(VoiceName::Bass)));
        report.insert(
            RuleId::VerticalIntervalErrors,
            RuleResult::ByPair(BTreeMap::from([(
                pair,
                vec![Finding::Onset(onset(0)), Finding::Onset(onset(1))],
            )])),
        );
        report.insert(
            RuleId::ParallelErrors,
            RuleResult::GroupedByPair(BTreeMap::from([(pair, vec![vec![], vec![]])])),
        );
        assert_eq!(report.violation_count(), 4);
        assert_eq!(report.cantus_firmus(), Some(VoiceName::Bass));
        assert_eq!(report.pair_findings(RuleId::VerticalIntervalErrors, pair).len(), 2);
        assert!(report.voice_findings(RuleId::HorizontalErrors, VoiceName::Bass).is_empty());
    }

    #[test]
    fn test_voice_pair_display() {
        let pair = VoicePair::new(VoiceName::Alto, VoiceName::Tenor);
        assert_eq!(pair.to_string(), "Alto and Tenor");
    }
}
