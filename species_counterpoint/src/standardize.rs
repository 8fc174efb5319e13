// Flattening a `Report` into printable error records.
//
// Each rule result shape maps to `ErrorRecord`s: one or more located items
// (a note in a voice, or an interval between two voices) plus an optional
// message. `error_text` renders a record as a single line, e.g.
//
//   Error: between C5 at mm. 1 beat 1.00 in Soprano, B4 at mm. 9 beat 1.00 in Soprano: outlines a M7
//
// Records follow rule-identifier order and, within a rule, voice or pair
// order. The cantus firmus entry is informational and produces no record.

use crate::composition::{Meter, VoiceName};
use crate::harmonic::Alignment;
use crate::note_list::{NoteNode, Onset};
use crate::report::{Finding, Report, RuleId, RuleResult, VoicePair};
use std::fmt;

/// Where a located item lives: a single voice, or between two voices.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    Voice(VoiceName),
    Pair(VoicePair),
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scope::Voice(v) => write!(f, "in {}", v),
            Scope::Pair(p) => write!(f, "between {}", p),
        }
    }
}

/// A named item at a point in the music.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    pub scope: Scope,
    /// Note name, "rest", an interval name, or a short description.
    pub label: String,
    pub onset: Onset,
}

impl Location {
    fn note(voice: VoiceName, node: &NoteNode) -> Self {
        Location {
            scope: Scope::Voice(voice),
            label: node.label(),
            onset: node.onset,
        }
    }

    fn between(pair: VoicePair, label: String, onset: Onset) -> Self {
        Location {
            scope: Scope::Pair(pair),
            label,
            onset,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorRecord {
    pub locations: Vec<Location>,
    pub message: Option<String>,
    pub rule: RuleId,
}

/// Message attached to findings of `rule`, if it has one.
fn message_for(rule: RuleId, finding: &Finding) -> Option<String> {
    match (rule, finding) {
        (RuleId::HorizontalErrors, Finding::Leap { interval, .. }) => Some(format!(
            "Approached by {} leap",
            interval.classical_name()
        )),
        (RuleId::WeakHorizontalErrors, Finding::Leap { interval, .. }) => Some(format!(
            "{} leap to weak beat",
            interval.classical_name()
        )),
        (
            RuleId::IndirectHorizontalErrors | RuleId::StrongBeatHorizontals,
            Finding::Outline { interval, .. },
        ) => Some(format!("outlines a {}", interval.classical_name())),
        (RuleId::RepeatedNotes, _) => Some("Repeated note".to_string()),
        (RuleId::InvalidRests, _) => Some("Rests are only allowed at the beginning".to_string()),
        (RuleId::InvalidDurations, _) => Some("Invalid note duration".to_string()),
        _ => None,
    }
}

fn voice_locations(voice: VoiceName, finding: &Finding) -> Vec<Location> {
    match finding {
        Finding::Note(node) | Finding::Leap { note: node, .. } => vec![Location::note(voice, node)],
        Finding::Outline { from, to, .. } | Finding::Repeat { from, to } => {
            vec![Location::note(voice, from), Location::note(voice, to)]
        }
        Finding::Onset(onset) => vec![Location {
            scope: Scope::Voice(voice),
            label: String::new(),
            onset: *onset,
        }],
        Finding::Vertical { interval, onset } => vec![Location {
            scope: Scope::Voice(voice),
            label: interval.classical_name(),
            onset: *onset,
        }],
        Finding::Crossing { upper, lower } => {
            vec![Location::note(voice, upper), Location::note(voice, lower)]
        }
    }
}

fn pair_locations(pair: VoicePair, finding: &Finding) -> Vec<Location> {
    match finding {
        Finding::Onset(onset) => vec![Location::between(
            pair,
            "melodic high point".to_string(),
            *onset,
        )],
        Finding::Vertical { interval, onset } => {
            vec![Location::between(pair, interval.classical_name(), *onset)]
        }
        Finding::Crossing { upper, lower } => vec![
            Location::note(pair.high, upper),
            Location::note(pair.low, lower),
        ],
        other => voice_locations(pair.high, other),
    }
}

fn alignment_records(pair: VoicePair, alignment: &Alignment) -> Vec<ErrorRecord> {
    let sides = [
        (pair.high, pair.low, &alignment.unmatched_a),
        (pair.low, pair.high, &alignment.unmatched_b),
    ];
    sides
        .into_iter()
        .flat_map(|(voice, other, nodes)| {
            nodes.iter().map(move |node| ErrorRecord {
                locations: vec![Location::note(voice, node)],
                message: Some(format!("Has no matching note in the {}", other)),
                rule: RuleId::AlignmentErrors,
            })
        })
        .collect()
}

/// Records for one rule result.
pub fn standardize_rule(rule: RuleId, result: &RuleResult) -> Vec<ErrorRecord> {
    let mut records = Vec::new();
    match result {
        RuleResult::Cantus(_) => {}
        RuleResult::ByVoice(map) => {
            for (voice, findings) in map {
                for finding in findings {
                    records.push(ErrorRecord {
                        locations: voice_locations(*voice, finding),
                        message: message_for(rule, finding),
                        rule,
                    });
                }
            }
        }
        RuleResult::ByPair(map) => {
            for (pair, findings) in map {
                for finding in findings {
                    records.push(ErrorRecord {
                        locations: pair_locations(*pair, finding),
                        message: message_for(rule, finding),
                        rule,
                    });
                }
            }
        }
        RuleResult::GroupedByPair(map) => {
            for (pair, groups) in map {
                for group in groups {
                    let locations: Vec<Location> =
                        group.iter().flat_map(|f| pair_locations(*pair, f)).collect();
                    let message = group.first().map(|first| {
                        let name = match first {
                            Finding::Vertical { interval, .. } => interval.classical_name(),
                            _ => String::new(),
                        };
                        format!("Interval {} is repeated {} times.", name, group.len())
                    });
                    records.push(ErrorRecord {
                        locations,
                        message,
                        rule,
                    });
                }
            }
        }
        RuleResult::Alignment(map) => {
            for (pair, alignment) in map {
                records.extend(alignment_records(*pair, alignment));
            }
        }
    }
    records
}

/// Every record in the report, in rule order.
pub fn standardize(report: &Report) -> Vec<ErrorRecord> {
    report
        .iter()
        .flat_map(|(rule, result)| standardize_rule(*rule, result))
        .collect()
}

fn location_text(location: &Location, meter: Meter) -> String {
    let label = if location.label.is_empty() {
        "event"
    } else {
        location.label.as_str()
    };
    format!(
        "{} at mm. {} beat {:.2} {}",
        label,
        location.onset.bar + 1,
        meter.beat_number(location.onset.beat),
        location.scope
    )
}

/// One-line rendering of a record.
pub fn error_text(record: &ErrorRecord, meter: Meter) -> String {
    let parts: Vec<String> = record
        .locations
        .iter()
        .map(|l| location_text(l, meter))
        .collect();
    let mut text = if parts.len() > 1 {
        format!("Error: between {}", parts.join(", "))
    } else {
        format!("Error: {}", parts.join(", "))
    };
    if let Some(message) = &record.message {
        text.push_str(": ");
        text.push_str(message);
    }
    text
}

/// The cantus firmus line for species that search for one; `None` when the
/// report has no cantus entry.
pub fn cantus_line(report: &Report) -> Option<String> {
    match report.get(RuleId::CantusFirmus)? {
        RuleResult::Cantus(Some(voice)) => Some(format!("Cantus firmus: {}", voice)),
        RuleResult::Cantus(None) => Some("No cantus firmus found".to_string()),
        _ => None,
    }
}

/// All records as text, each rule's block optionally followed by its
/// written rule.
pub fn render_report(report: &Report, meter: Meter, show_rules: bool) -> Vec<String> {
    let mut lines = Vec::new();
    for (rule, result) in report.iter() {
        let records = standardize_rule(*rule, result);
        if records.is_empty() {
            continue;
        }
        lines.extend(records.iter().map(|r| error_text(r, meter)));
        if show_rules {
            lines.push(format!("Rule: {}", rule.description()));
        }
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interval::{IntervalClass, Interval};
    use crate::pitch::Pitch;
    use crate::ratio::Ratio;
    use std::collections::BTreeMap;

    fn node(name: &str, bar: usize, beat: Ratio) -> NoteNode {
        NoteNode {
            pitch: Some(name.parse::<Pitch>().unwrap()),
            onset: Onset::new(bar, beat),
            duration: Ratio::from(2),
        }
    }

    fn fifth() -> Interval {
        Interval::Between {
            class: IntervalClass::PERFECT_FIFTH,
            semitones: 7,
        }
    }

    #[test]
    fn test_single_note_text() {
        let record = ErrorRecord {
            locations: vec![Location::note(
                VoiceName::Soprano,
                &node("Bb4", 1, Ratio::new(1, 2)),
            )],
            message: None,
            rule: RuleId::AccidentalErrors,
        };
        assert_eq!(
            error_text(&record, Meter::common_time()),
            "Error: Bb4 at mm. 2 beat 3.00 in Soprano"
        );
    }

    #[test]
    fn test_outline_text_has_between_and_message() {
        let finding = Finding::Outline {
            interval: fifth(),
            from: node("C4", 0, Ratio::zero()),
            to: node("G4", 2, Ratio::zero()),
        };
        let result = RuleResult::ByVoice(BTreeMap::from([(VoiceName::Alto, vec![finding])]));
        let records = standardize_rule(RuleId::IndirectHorizontalErrors, &result);
        assert_eq!(records.len(), 1);
        assert_eq!(
            error_text(&records[0], Meter::common_time()),
            "Error: between C4 at mm. 1 beat 1.00 in Alto, G4 at mm. 3 beat 1.00 in Alto: outlines a P5"
        );
    }

    #[test]
    fn test_parallel_group_message() {
        let pair = VoicePair::new(VoiceName::Soprano, VoiceName::Bass);
        let group = vec![
            Finding::Vertical {
                interval: fifth(),
                onset: Onset::new(0, Ratio::zero()),
            },
            Finding::Vertical {
                interval: fifth(),
                onset: Onset::new(1, Ratio::zero()),
            },
        ];
        let result = RuleResult::GroupedByPair(BTreeMap::from([(pair, vec![group])]));
        let records = standardize_rule(RuleId::ParallelErrors, &result);
        assert_eq!(records.len(), 1);
        let text = error_text(&records[0], Meter::common_time());
        assert!(text.starts_with("Error: between P5 at mm. 1 beat 1.00 between Soprano and Bass"));
        assert!(text.ends_with(": Interval P5 is repeated 2 times."));
    }

    #[test]
    fn test_alignment_records_name_other_voice() {
        let pair = VoicePair::new(VoiceName::Soprano, VoiceName::Alto);
        let alignment = Alignment {
            matched: 0,
            unmatched_a: vec![node("E4", 0, Ratio::zero())],
            unmatched_b: vec![],
        };
        let result = RuleResult::Alignment(BTreeMap::from([(pair, alignment)]));
        let records = standardize_rule(RuleId::AlignmentErrors, &result);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].message.as_deref(), Some("Has no matching note in the Alto"));
    }

    #[test]
    fn test_cantus_is_not_rendered() {
        let mut report = Report::new();
        report.insert(RuleId::CantusFirmus, RuleResult::Cantus(Some(VoiceName::Alto)));
        assert!(standardize(&report).is_empty());
        assert!(render_report(&report, Meter::common_time(), true).is_empty());
    }

    #[test]
    fn test_cantus_line_only_when_searched() {
        let mut report = Report::new();
        report.insert(
            RuleId::AccidentalErrors,
            RuleResult::ByVoice(BTreeMap::from([(VoiceName::Soprano, vec![])])),
        );
        assert_eq!(cantus_line(&report), None);

        report.insert(RuleId::CantusFirmus, RuleResult::Cantus(None));
        assert_eq!(cantus_line(&report).as_deref(), Some("No cantus firmus found"));

        report.insert(RuleId::CantusFirmus, RuleResult::Cantus(Some(VoiceName::Bass)));
        assert_eq!(cantus_line(&report).as_deref(), Some("Cantus firmus: Bass"));
    }

    #[test]
    fn test_render_report_appends_rule_text() {
        let mut report = Report::new();
        report.insert(
            RuleId::RepeatedNotes,
            RuleResult::ByVoice(BTreeMap::from([(
                VoiceName::Soprano,
                vec![Finding::Repeat {
                    from: node("C5", 0, Ratio::zero()),
                    to: node("C5", 0, Ratio::new(1, 2)),
                }],
            )])),
        );
        report.insert(
            RuleId::AccidentalErrors,
            RuleResult::ByVoice(BTreeMap::from([(VoiceName::Soprano, vec![])])),
        );
        let lines = render_report(&report, Meter::common_time(), true);
        assert_eq!(lines.len(), 2);
        assert!(lines[0].ends_with(": Repeated note"));
        assert_eq!(lines[1], format!("Rule: {}", RuleId::RepeatedNotes.description()));
        assert_eq!(render_report(&report, Meter::common_time(), false).len(), 1);
    }
}
