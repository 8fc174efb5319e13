// Species rule evaluation.
//
// `evaluate` turns a composition into a `Report` for one species. It builds a
// `NoteList` per voice with content, orders the voices by the configured
// priority (first = high voice, last = low voice), and runs the species'
// rule catalogue from `rules.rs` over single voices and over every unordered
// pair of voices (higher-priority voice first).
//
// First species checks beginnings, the cadence, melodic intervals and
// contour, accidentals, rhythmic alignment and the usual vertical rules.
// Second species needs a cantus firmus (a voice entirely in whole notes); the
// rest of the voices are checked for the 2:1 rhythm, and weak-beat passing
// dissonances and weak-beat unison crossings are tolerated. Third and fourth
// species are accepted but have no rules yet, so their report is empty.

use crate::composition::{Composition, VoiceName};
use crate::config::AnalysisConfig;
use crate::error::{AnalysisError, ValidationError};
use crate::harmonic::all_notes_line_up;
use crate::note_list::NoteList;
use crate::ratio::Ratio;
use crate::report::{Finding, Report, RuleId, RuleResult, VoicePair};
use crate::rules;
use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Species {
    First,
    Second,
    Third,
    Fourth,
}

impl Species {
    pub fn number(self) -> u8 {
        match self {
            Species::First => 1,
            Species::Second => 2,
            Species::Third => 3,
            Species::Fourth => 4,
        }
    }
}

impl TryFrom<u8> for Species {
    type Error = ValidationError;

    fn try_from(n: u8) -> Result<Self, Self::Error> {
        match n {
            1 => Ok(Species::First),
            2 => Ok(Species::Second),
            3 => Ok(Species::Third),
            4 => Ok(Species::Fourth),
            other => Err(ValidationError::UnsupportedSpecies(other)),
        }
    }
}

impl fmt::Display for Species {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Species::First => "first",
            Species::Second => "second",
            Species::Third => "third",
            Species::Fourth => "fourth",
        };
        write!(f, "{} species", name)
    }
}

// ---------------------------------------------------------------------------
// Voice split
// ---------------------------------------------------------------------------

/// Note lists of the voices with content, highest priority first.
struct Voices {
    lists: Vec<NoteList>,
}

impl Voices {
    fn build(composition: &Composition, config: &AnalysisConfig) -> Result<Voices, AnalysisError> {
        let mut names = composition.voices_with_content();
        names.sort_by_key(|v| config.rank(*v));

        let mut lists = Vec::with_capacity(names.len());
        for name in names {
            if let Some(line) = composition.voice(name) {
                lists.push(NoteList::new(name, line)?);
            }
        }
        if lists.len() < 2 {
            return Err(AnalysisError::TooFewVoices(lists.len()));
        }
        Ok(Voices { lists })
    }

    fn high(&self) -> &NoteList {
        &self.lists[0]
    }

    fn low(&self) -> &NoteList {
        &self.lists[self.lists.len() - 1]
    }

    /// Every unordered pair, the higher-priority voice first.
    fn pairs(&self) -> Vec<(&NoteList, &NoteList)> {
        let mut pairs = Vec::new();
        for (i, a) in self.lists.iter().enumerate() {
            for b in &self.lists[i + 1..] {
                pairs.push((a, b));
            }
        }
        pairs
    }
}

fn pair_of(a: &NoteList, b: &NoteList) -> VoicePair {
    VoicePair::new(a.voice(), b.voice())
}

fn one_voice(list: &NoteList, findings: Vec<Finding>) -> RuleResult {
    RuleResult::ByVoice(BTreeMap::from([(list.voice(), findings)]))
}

fn each_voice<'a, I, F>(lists: I, check: F) -> RuleResult
where
    I: IntoIterator<Item = &'a NoteList>,
    F: Fn(&NoteList) -> Vec<Finding>,
{
    RuleResult::ByVoice(lists.into_iter().map(|l| (l.voice(), check(l))).collect())
}

fn each_voice_checked<'a, I, F>(lists: I, check: F) -> Result<RuleResult, AnalysisError>
where
    I: IntoIterator<Item = &'a NoteList>,
    F: Fn(&NoteList) -> Result<Vec<Finding>, AnalysisError>,
{
    let mut map = BTreeMap::new();
    for list in lists {
        map.insert(list.voice(), check(list)?);
    }
    Ok(RuleResult::ByVoice(map))
}

fn each_pair<F>(voices: &Voices, check: F) -> RuleResult
where
    F: Fn(&NoteList, &NoteList) -> Vec<Finding>,
{
    RuleResult::ByPair(
        voices
            .pairs()
            .into_iter()
            .map(|(a, b)| (pair_of(a, b), check(a, b)))
            .collect(),
    )
}

fn each_pair_grouped<F>(voices: &Voices, check: F) -> RuleResult
where
    F: Fn(&NoteList, &NoteList) -> Vec<Vec<Finding>>,
{
    RuleResult::GroupedByPair(
        voices
            .pairs()
            .into_iter()
            .map(|(a, b)| (pair_of(a, b), check(a, b)))
            .collect(),
    )
}

// ---------------------------------------------------------------------------
// Evaluation
// ---------------------------------------------------------------------------

/// Analyze `composition` under the rules of `species`.
pub fn evaluate(
    species: Species,
    composition: &Composition,
    config: &AnalysisConfig,
) -> Result<Report, AnalysisError> {
    log::info!(
        "Analyzing {} ({} voices) as {}",
        composition.title.as_deref().unwrap_or("untitled composition"),
        composition.voices_with_content().len(),
        species
    );

    let report = match species {
        Species::First => first_species(composition, config)?,
        Species::Second => second_species(composition, config)?,
        Species::Third | Species::Fourth => Report::new(),
    };

    log::info!(
        "{}: {} rule(s) checked, {} violation(s)",
        species,
        report.len(),
        report.violation_count()
    );
    Ok(report)
}

/// The first voice, in priority order, written entirely in whole notes.
pub fn find_cantus_firmus(
    composition: &Composition,
    config: &AnalysisConfig,
) -> Result<Option<VoiceName>, AnalysisError> {
    let voices = Voices::build(composition, config)?;
    Ok(cantus_of(&voices))
}

fn cantus_of(voices: &Voices) -> Option<VoiceName> {
    let whole = Ratio::one();
    voices
        .lists
        .iter()
        .find(|l| l.nodes().iter().all(|n| n.duration == whole))
        .map(NoteList::voice)
}

/// Rules shared by both species, in the form first species checks them.
fn common_rules(
    report: &mut Report,
    composition: &Composition,
    voices: &Voices,
    config: &AnalysisConfig,
) -> Result<(), AnalysisError> {
    let key = composition.key;
    let high = voices.high();
    let low = voices.low();

    report.insert(
        RuleId::HighVoiceBeginningError,
        one_voice(high, rules::starts_with_tonic_or_fifth(high, &key)),
    );
    report.insert(
        RuleId::HighVoiceEndingError,
        one_voice(high, rules::ends_with_leading_tone_tonic(high, &key)?),
    );
    report.insert(
        RuleId::LowVoiceBeginningError,
        one_voice(low, rules::starts_with_tonic(low, &key)),
    );

    report.insert(
        RuleId::HorizontalErrors,
        each_voice(&voices.lists, rules::illegal_horizontal_intervals),
    );
    report.insert(
        RuleId::IndirectHorizontalErrors,
        each_voice(&voices.lists, rules::illegal_indirect_horizontal_intervals),
    );
    report.insert(
        RuleId::TurnaroundErrors,
        each_voice(&voices.lists, rules::missed_leap_turnarounds),
    );
    report.insert(
        RuleId::AccidentalErrors,
        each_voice(&voices.lists, |l| rules::accidentals(l, &key)),
    );

    report.insert(
        RuleId::ParallelErrors,
        each_pair_grouped(voices, rules::illegal_parallel_intervals),
    );
    let max_run = config.max_consecutive_parallels;
    report.insert(
        RuleId::ConsecutiveParallelErrors,
        each_pair_grouped(voices, |a, b| rules::illegal_consecutive_parallels(a, b, max_run)),
    );
    report.insert(
        RuleId::HighPointErrors,
        each_pair(voices, rules::coinciding_high_points),
    );
    report.insert(
        RuleId::DirectMotionErrors,
        each_pair(voices, rules::illegal_direct_motion),
    );
    Ok(())
}

fn first_species(composition: &Composition, config: &AnalysisConfig) -> Result<Report, AnalysisError> {
    let voices = Voices::build(composition, config)?;
    let mut report = Report::new();
    common_rules(&mut report, composition, &voices, config)?;

    report.insert(
        RuleId::AlignmentErrors,
        RuleResult::Alignment(
            voices
                .pairs()
                .into_iter()
                .map(|(a, b)| (pair_of(a, b), all_notes_line_up(a, b)))
                .collect(),
        ),
    );
    let spacing = config.voice_crossing_spacing;
    report.insert(
        RuleId::VoiceCrossingErrors,
        each_pair(&voices, |a, b| rules::voice_crossings(a, b, spacing)),
    );
    report.insert(
        RuleId::VerticalIntervalErrors,
        each_pair(&voices, rules::illegal_vertical_intervals),
    );
    Ok(report)
}

fn second_species(composition: &Composition, config: &AnalysisConfig) -> Result<Report, AnalysisError> {
    let voices = Voices::build(composition, config)?;
    let mut report = Report::new();

    let Some(cantus) = cantus_of(&voices) else {
        log::info!("No voice is written entirely in whole notes; skipping second species rules");
        report.insert(RuleId::CantusFirmus, RuleResult::Cantus(None));
        return Ok(report);
    };
    log::debug!("Cantus firmus: {}", cantus);
    report.insert(RuleId::CantusFirmus, RuleResult::Cantus(Some(cantus)));

    common_rules(&mut report, composition, &voices, config)?;

    let counterpoint: Vec<&NoteList> = voices.lists.iter().filter(|l| l.voice() != cantus).collect();

    report.insert(
        RuleId::InvalidRests,
        each_voice(counterpoint.iter().copied(), rules::invalid_rests),
    );
    report.insert(
        RuleId::InvalidDurations,
        each_voice_checked(counterpoint.iter().copied(), rules::invalid_durations)?,
    );
    report.insert(
        RuleId::RepeatedNotes,
        each_voice(&voices.lists, rules::repeated_notes),
    );
    report.insert(
        RuleId::WeakHorizontalErrors,
        each_voice(&voices.lists, rules::leaps_to_weak_beats),
    );
    report.insert(
        RuleId::StrongBeatHorizontals,
        each_voice(&voices.lists, rules::illegal_strong_beat_horizontal_intervals),
    );
    report.insert(
        RuleId::ParallelDownbeatErrors,
        each_pair_grouped(&voices, rules::illegal_downbeat_parallels),
    );

    report.insert(
        RuleId::VerticalIntervalErrors,
        each_pair(&voices, rules::illegal_second_species_verticals),
    );
    let spacing = config.voice_crossing_spacing;
    report.insert(
        RuleId::VoiceCrossingErrors,
        each_pair(&voices, |a, b| {
            rules::voice_crossings_allowing_weak_unisons(a, b, spacing)
        }),
    );
    Ok(report)
}
