// Individual counterpoint rules.
//
// Each function checks one rule for one voice or one pair of voices and
// returns the violations as `Finding`s (empty = rule satisfied). The species
// evaluator in `species.rs` decides which rules apply and how their results
// are combined; nothing here knows about species.
//
// Pair rules take the higher voice first. Rules that need a minimum amount of
// music (an ending needs two notes) return `AnalysisError::InsufficientData`
// instead of guessing.

use crate::error::AnalysisError;
use crate::harmonic::{
    VerticalInterval, coincident_maxima, direct_motion, parallel_motion, vertical_intervals,
    voice_crossing,
};
use crate::interval::{
    Interval, MELODIC_CONSONANCES, PARALLEL_CONSONANCES, PERFECT_CONSONANCES,
    VERTICAL_CONSONANCES,
};
use crate::melodic::{
    MelodicInterval, horizontal_intervals, indirect_horizontal_intervals,
    strong_beat_horizontal_intervals,
};
use crate::note_list::{NoteId, NoteList, Onset};
use crate::pitch::Key;
use crate::ratio::Ratio;
use crate::report::{Finding, RuleId};
use std::collections::BTreeSet;

/// Smallest leap that must be followed by a turnaround step (a perfect fifth).
const TURNAROUND_LEAP: u8 = 7;

/// Leaps larger than this (a perfect fifth) must land on a downbeat.
const MAX_WEAK_BEAT_LEAP: u8 = 7;

fn is_step(from: i32, to: i32) -> bool {
    (1..=2).contains(&(to - from).abs())
}

fn outline(list: &NoteList, (interval, from, to): MelodicInterval) -> Finding {
    Finding::Outline {
        interval,
        from: list[from],
        to: list[to],
    }
}

fn verticals(group: Vec<VerticalInterval>) -> Vec<Finding> {
    group
        .into_iter()
        .map(|(interval, onset)| Finding::Vertical { interval, onset })
        .collect()
}

// ---------------------------------------------------------------------------
// Single-voice rules
// ---------------------------------------------------------------------------

/// The first note, if its pitch class is not one of `allowed`.
fn first_note_not_in(list: &NoteList, allowed: &[i32]) -> Vec<Finding> {
    list.get_first_actual_note()
        .map(|id| list[id])
        .filter(|node| node.pitch.is_some_and(|p| !allowed.contains(&p.pitch_class())))
        .map(Finding::Note)
        .into_iter()
        .collect()
}

/// The voice must open on the tonic or the dominant.
pub fn starts_with_tonic_or_fifth(list: &NoteList, key: &Key) -> Vec<Finding> {
    first_note_not_in(list, &[key.tonic_class(), key.dominant_class()])
}

/// The voice must open on the tonic.
pub fn starts_with_tonic(list: &NoteList, key: &Key) -> Vec<Finding> {
    first_note_not_in(list, &[key.tonic_class()])
}

/// The voice must close leading tone to tonic, rising by a semitone. Reports
/// the final two notes otherwise.
pub fn ends_with_leading_tone_tonic(
    list: &NoteList,
    key: &Key,
) -> Result<Vec<Finding>, AnalysisError> {
    let insufficient = || AnalysisError::InsufficientData {
        voice: list.voice(),
        rule: RuleId::HighVoiceEndingError,
    };
    let last = list.get_last_actual_note().ok_or_else(insufficient)?;
    let penultimate = list.prev_actual_note(last).ok_or_else(insufficient)?;
    let (Some(final_pitch), Some(leading)) = (list[last].pitch, list[penultimate].pitch) else {
        return Err(insufficient());
    };

    let resolves = final_pitch.pitch_class() == key.tonic_class()
        && leading.pitch_class() == key.leading_tone_class()
        && final_pitch.midi() - leading.midi() == 1;
    if resolves {
        return Ok(Vec::new());
    }
    Ok(vec![Finding::Outline {
        interval: Interval::between(Some(&leading), Some(&final_pitch)),
        from: list[penultimate],
        to: list[last],
    }])
}

/// Melodic intervals outside the allowed set, located at the landing note.
pub fn illegal_horizontal_intervals(list: &NoteList) -> Vec<Finding> {
    horizontal_intervals(list)
        .into_iter()
        .filter(|(interval, _, _)| !interval.is_in(&MELODIC_CONSONANCES))
        .map(|(interval, _, to)| Finding::Leap {
            interval,
            note: list[to],
        })
        .collect()
}

/// Spans between melodic extremes outside the allowed set.
pub fn illegal_indirect_horizontal_intervals(list: &NoteList) -> Vec<Finding> {
    indirect_horizontal_intervals(list)
        .into_iter()
        .filter(|(interval, _, _)| !interval.is_in(&MELODIC_CONSONANCES))
        .map(|m| outline(list, m))
        .collect()
}

/// Downbeat-to-downbeat intervals outside the allowed set.
pub fn illegal_strong_beat_horizontal_intervals(list: &NoteList) -> Vec<Finding> {
    strong_beat_horizontal_intervals(list)
        .into_iter()
        .filter(|(interval, _, _)| !interval.is_in(&MELODIC_CONSONANCES))
        .map(|m| outline(list, m))
        .collect()
}

/// Leaps of a fifth or more not followed by a step back. A leap into the
/// final note has nothing to turn around and is not reported.
pub fn missed_leap_turnarounds(list: &NoteList) -> Vec<Finding> {
    let mut missed = Vec::new();
    for (interval, from, to) in horizontal_intervals(list) {
        if interval.semitones().is_none_or(|s| s < TURNAROUND_LEAP) {
            continue;
        }
        let Some(after) = list.next_actual_note(to) else {
            continue;
        };
        let (Some(a), Some(b), Some(c)) = (list[from].midi(), list[to].midi(), list[after].midi())
        else {
            continue;
        };
        let turns = is_step(b, c) && (c - b).signum() == -(b - a).signum();
        if !turns {
            missed.push(Finding::Note(list[to]));
        }
    }
    missed
}

/// Notes not spelled in the key.
pub fn accidentals(list: &NoteList, key: &Key) -> Vec<Finding> {
    list.actual_notes()
        .filter(|(_, n)| n.pitch.is_some_and(|p| !key.contains(&p)))
        .map(|(_, n)| Finding::Note(*n))
        .collect()
}

/// Consecutive actual notes of the same pitch.
pub fn repeated_notes(list: &NoteList) -> Vec<Finding> {
    horizontal_intervals(list)
        .into_iter()
        .filter(|(interval, _, _)| interval.is_perfect_unison())
        .map(|(_, from, to)| Finding::Repeat {
            from: list[from],
            to: list[to],
        })
        .collect()
}

/// Leaps larger than a fifth that land on a weak beat.
pub fn leaps_to_weak_beats(list: &NoteList) -> Vec<Finding> {
    horizontal_intervals(list)
        .into_iter()
        .filter(|(interval, _, to)| {
            interval.semitones().is_some_and(|s| s > MAX_WEAK_BEAT_LEAP)
                && !list[*to].onset.is_downbeat()
        })
        .map(|(interval, _, to)| Finding::Leap {
            interval,
            note: list[to],
        })
        .collect()
}

/// Rests anywhere but the opening of the voice.
pub fn invalid_rests(list: &NoteList) -> Vec<Finding> {
    list.iter()
        .skip(1)
        .filter(|(_, n)| n.is_rest())
        .map(|(_, n)| Finding::Note(*n))
        .collect()
}

/// Second-species rhythm: half notes throughout, a whole or half note before
/// the end and a whole note to finish.
pub fn invalid_durations(list: &NoteList) -> Result<Vec<Finding>, AnalysisError> {
    let nodes = list.nodes();
    if nodes.len() < 2 {
        return Err(AnalysisError::InsufficientData {
            voice: list.voice(),
            rule: RuleId::InvalidDurations,
        });
    }
    let whole = Ratio::one();
    let half = Ratio::from(2);
    let penultimate = nodes.len() - 2;

    let invalid = nodes
        .iter()
        .enumerate()
        .filter(|&(i, n)| {
            if i < penultimate {
                n.duration != half
            } else if i == penultimate {
                n.duration != half && n.duration != whole
            } else {
                n.duration != whole
            }
        })
        .map(|(_, n)| Finding::Note(*n))
        .collect();
    Ok(invalid)
}

// ---------------------------------------------------------------------------
// Voice-pair rules
// ---------------------------------------------------------------------------

/// Parallel runs of any class other than thirds and sixths. Any repetition
/// counts: a run of two is already a violation.
pub fn illegal_parallel_intervals(a: &NoteList, b: &NoteList) -> Vec<Vec<Finding>> {
    parallel_motion(a, b, |_, _| true)
        .into_iter()
        .filter(|group| !group[0].0.is_in(&PARALLEL_CONSONANCES))
        .map(verticals)
        .collect()
}

/// Parallel runs of any class longer than `max_run`.
pub fn illegal_consecutive_parallels(a: &NoteList, b: &NoteList, max_run: usize) -> Vec<Vec<Finding>> {
    parallel_motion(a, b, |_, _| true)
        .into_iter()
        .filter(|group| group.len() > max_run)
        .map(verticals)
        .collect()
}

/// Forbidden parallel classes repeated across consecutive downbeats.
pub fn illegal_downbeat_parallels(a: &NoteList, b: &NoteList) -> Vec<Vec<Finding>> {
    parallel_motion(a, b, |_, onset| onset.is_downbeat())
        .into_iter()
        .filter(|group| !group[0].0.is_in(&PARALLEL_CONSONANCES))
        .map(verticals)
        .collect()
}

/// Intervals outside the vertical consonances at every shared onset. A rest
/// against a note has no harmony and is reported too.
pub fn dissonances(a: &NoteList, b: &NoteList) -> Vec<VerticalInterval> {
    vertical_intervals(a, b)
        .into_iter()
        .filter(|(interval, _)| !interval.is_in(&VERTICAL_CONSONANCES))
        .collect()
}

pub fn illegal_vertical_intervals(a: &NoteList, b: &NoteList) -> Vec<Finding> {
    verticals(dissonances(a, b))
}

/// Onset of a voice's first actual note.
fn entry(list: &NoteList) -> Option<Onset> {
    list.get_first_actual_note().map(|id| list[id].onset)
}

/// Second-species vertical errors: dissonances other than weak-beat passing
/// notes, and other than the silence before both voices have entered.
pub fn illegal_second_species_verticals(a: &NoteList, b: &NoteList) -> Vec<Finding> {
    let legal = legal_dissonances(a, b);
    let both_entered = entry(a).max(entry(b));
    verticals(
        dissonances(a, b)
            .into_iter()
            .filter(|(_, onset)| !legal.contains(onset))
            .filter(|(interval, onset)| {
                *interval != Interval::NoInterval || both_entered.is_none_or(|e| *onset >= e)
            })
            .collect(),
    )
}

/// Weak-beat dissonances treated as passing notes: every voice that attacks
/// at the dissonance is approached and left by step.
pub fn legal_dissonances(a: &NoteList, b: &NoteList) -> BTreeSet<Onset> {
    let stepwise = |list: &NoteList, id: NoteId| -> bool {
        let (Some(prev), Some(next)) = (list.prev_actual_note(id), list.next_actual_note(id)) else {
            return false;
        };
        match (list[prev].midi(), list[id].midi(), list[next].midi()) {
            (Some(p), Some(c), Some(n)) => is_step(p, c) && is_step(c, n),
            _ => false,
        }
    };

    dissonances(a, b)
        .into_iter()
        .filter(|(interval, _)| *interval != Interval::NoInterval)
        .map(|(_, onset)| onset)
        .filter(|onset| !onset.is_downbeat())
        .filter(|onset| {
            let movers: Vec<(&NoteList, NoteId)> = [a, b]
                .into_iter()
                .filter_map(|list| list.get(*onset).map(|id| (list, id)))
                .filter(|(list, id)| !list[*id].is_rest())
                .collect();
            !movers.is_empty() && movers.iter().all(|&(list, id)| stepwise(list, id))
        })
        .collect()
}

/// Perfect consonances reached by similar motion.
pub fn illegal_direct_motion(a: &NoteList, b: &NoteList) -> Vec<Finding> {
    direct_motion(a, b)
        .into_iter()
        .filter(|(interval, _)| interval.is_in(&PERFECT_CONSONANCES))
        .map(|(interval, onset)| Finding::Vertical { interval, onset })
        .collect()
}

/// Melodic high points shared by both voices.
pub fn coinciding_high_points(a: &NoteList, b: &NoteList) -> Vec<Finding> {
    coincident_maxima(a, b)
        .into_iter()
        .map(Finding::Onset)
        .collect()
}

fn crossing_findings(upper: &NoteList, lower: &NoteList, pairs: &[(NoteId, NoteId)]) -> Vec<Finding> {
    pairs
        .iter()
        .map(|&(u, l)| Finding::Crossing {
            upper: upper[u],
            lower: lower[l],
        })
        .collect()
}

/// Crossings and overlaps within `spacing` notes.
pub fn voice_crossings(upper: &NoteList, lower: &NoteList, spacing: usize) -> Vec<Finding> {
    let pairs = voice_crossing(upper, lower, spacing, |_| true);
    crossing_findings(upper, lower, &pairs)
}

/// Crossings within `spacing` notes, minus weak-beat perfect unisons.
pub fn voice_crossings_allowing_weak_unisons(
    upper: &NoteList,
    lower: &NoteList,
    spacing: usize,
) -> Vec<Finding> {
    let allowed: BTreeSet<(NoteId, NoteId)> =
        voice_crossing(upper, lower, 1, |n| !n.onset.is_downbeat())
            .into_iter()
            .filter(|&(u, l)| {
                Interval::between(upper.pitch(u), lower.pitch(l)).is_perfect_unison()
            })
            .collect();
    let pairs: Vec<(NoteId, NoteId)> = voice_crossing(upper, lower, spacing, |_| true)
        .into_iter()
        .filter(|pair| !allowed.contains(pair))
        .collect();
    crossing_findings(upper, lower, &pairs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::composition::{Meter, VoiceLine, VoiceName};
    use crate::pitch::Pitch;

    fn list_of(voice: VoiceName, events: &[(Option<&str>, i64)]) -> NoteList {
        let events: Vec<(Option<Pitch>, Ratio)> = events
            .iter()
            .map(|&(p, d)| (p.map(|s| s.parse().unwrap()), Ratio::from(d)))
            .collect();
        let line = VoiceLine::from_durations(voice, Meter::common_time(), &events).unwrap();
        NoteList::new(voice, &line).unwrap()
    }

    fn whole(voice: VoiceName, names: &[&str]) -> NoteList {
        let events: Vec<_> = names.iter().map(|n| (Some(*n), 1)).collect();
        list_of(voice, &events)
    }

    fn halves(voice: VoiceName, names: &[Option<&str>]) -> NoteList {
        let events: Vec<_> = names.iter().map(|n| (*n, 2)).collect();
        list_of(voice, &events)
    }

    fn note_bars(findings: &[Finding]) -> Vec<usize> {
        findings
            .iter()
            .filter_map(|f| match f {
                Finding::Note(n) => Some(n.onset.bar),
                Finding::Leap { note, .. } => Some(note.onset.bar),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_beginnings() {
        let key = Key::c_major();
        let on_fifth = whole(VoiceName::Soprano, &["G4", "A4"]);
        assert!(starts_with_tonic_or_fifth(&on_fifth, &key).is_empty());
        assert_eq!(starts_with_tonic(&on_fifth, &key).len(), 1);

        let on_third = whole(VoiceName::Soprano, &["E4", "D4"]);
        assert_eq!(starts_with_tonic_or_fifth(&on_third, &key).len(), 1);
    }

    #[test]
    fn test_beginning_skips_leading_rest() {
        let key = Key::c_major();
        let list = halves(VoiceName::Soprano, &[None, Some("C5"), Some("D5"), Some("C5")]);
        assert!(starts_with_tonic(&list, &key).is_empty());
    }

    #[test]
    fn test_ending_leading_tone_to_tonic() {
        let key = Key::c_major();
        let good = whole(VoiceName::Soprano, &["D5", "B4", "C5"]);
        assert!(ends_with_leading_tone_tonic(&good, &key).unwrap().is_empty());

        let from_above = whole(VoiceName::Soprano, &["C5", "D5", "C5"]);
        assert_eq!(ends_with_leading_tone_tonic(&from_above, &key).unwrap().len(), 1);

        // Leading tone an octave away does not resolve by step.
        let displaced = whole(VoiceName::Soprano, &["B3", "C5"]);
        assert_eq!(ends_with_leading_tone_tonic(&displaced, &key).unwrap().len(), 1);
    }

    #[test]
    fn test_ending_needs_two_notes() {
        let key = Key::c_major();
        let single = whole(VoiceName::Alto, &["C4"]);
        assert_eq!(
            ends_with_leading_tone_tonic(&single, &key),
            Err(AnalysisError::InsufficientData {
                voice: VoiceName::Alto,
                rule: RuleId::HighVoiceEndingError
            })
        );
    }

    #[test]
    fn test_illegal_horizontal() {
        let list = whole(VoiceName::Soprano, &["C4", "B4", "A4", "D4", "E4"]);
        // C4-B4 is a seventh, A4-D4 a fifth.
        assert_eq!(note_bars(&illegal_horizontal_intervals(&list)), vec![1]);
    }

    #[test]
    fn test_illegal_indirect() {
        // Stepwise rise spanning a seventh.
        let list = whole(VoiceName::Soprano, &["C4", "D4", "E4", "F4", "G4", "A4", "B4", "A4"]);
        let findings = illegal_indirect_horizontal_intervals(&list);
        assert_eq!(findings.len(), 1);
        match &findings[0] {
            Finding::Outline { interval, from, to } => {
                assert_eq!(interval.shorthand(), "7");
                assert_eq!(from.onset.bar, 0);
                assert_eq!(to.onset.bar, 6);
            }
            other => panic!("unexpected finding {:?}", other),
        }
    }

    #[test]
    fn test_strong_beat_tritone() {
        let list = halves(
            VoiceName::Soprano,
            &[Some("F4"), Some("G4"), Some("A4"), Some("B4"), Some("B4"), Some("A4")],
        );
        // Downbeats F4, A4, B4: F4-A4 fine, A4-B4 fine.
        assert!(illegal_strong_beat_horizontal_intervals(&list).is_empty());
        let list = halves(
            VoiceName::Soprano,
            &[Some("F4"), Some("A4"), Some("B4"), Some("A4")],
        );
        assert_eq!(illegal_strong_beat_horizontal_intervals(&list).len(), 1);
    }

    #[test]
    fn test_turnarounds() {
        let good = whole(VoiceName::Soprano, &["C4", "G4", "F4"]);
        assert!(missed_leap_turnarounds(&good).is_empty());

        let same_direction = whole(VoiceName::Soprano, &["C4", "G4", "A4"]);
        assert_eq!(note_bars(&missed_leap_turnarounds(&same_direction)), vec![1]);

        let leap_back = whole(VoiceName::Soprano, &["C4", "G4", "E4"]);
        assert_eq!(note_bars(&missed_leap_turnarounds(&leap_back)), vec![1]);

        let final_leap = whole(VoiceName::Soprano, &["D4", "C4", "G4"]);
        assert!(missed_leap_turnarounds(&final_leap).is_empty());
    }

    #[test]
    fn test_accidentals() {
        let key = Key::c_major();
        let list = whole(VoiceName::Soprano, &["C4", "F#4", "G4", "Bb4"]);
        assert_eq!(note_bars(&accidentals(&list, &key)), vec![1, 3]);
    }

    #[test]
    fn test_repeated_notes() {
        let list = halves(VoiceName::Soprano, &[Some("C5"), Some("C5"), Some("D5"), Some("D4")]);
        let repeats = repeated_notes(&list);
        assert_eq!(repeats.len(), 1);
    }

    #[test]
    fn test_leaps_to_weak_beats() {
        // Sixth up onto the weak half of bar 0.
        let list = halves(VoiceName::Soprano, &[Some("C4"), Some("A4"), Some("G4"), Some("F4")]);
        assert_eq!(leaps_to_weak_beats(&list).len(), 1);
        // Sixth onto a downbeat is fine.
        let list = halves(VoiceName::Soprano, &[Some("D4"), Some("C4"), Some("A4"), Some("G4")]);
        assert!(leaps_to_weak_beats(&list).is_empty());
        // A fifth is not larger than a fifth.
        let list = halves(VoiceName::Soprano, &[Some("C4"), Some("G4"), Some("F4"), Some("E4")]);
        assert!(leaps_to_weak_beats(&list).is_empty());
    }

    #[test]
    fn test_invalid_rests() {
        let list = halves(VoiceName::Soprano, &[None, Some("C5"), None, Some("B4")]);
        let rests = invalid_rests(&list);
        assert_eq!(rests.len(), 1);
        match &rests[0] {
            Finding::Note(n) => assert_eq!(n.onset.bar, 1),
            other => panic!("unexpected finding {:?}", other),
        }
    }

    #[test]
    fn test_invalid_durations_final_quarter() {
        let list = list_of(
            VoiceName::Soprano,
            &[
                (Some("C5"), 2),
                (Some("B4"), 2),
                (Some("A4"), 2),
                (Some("B4"), 2),
                (Some("C5"), 4),
            ],
        );
        let invalid = invalid_durations(&list).unwrap();
        assert_eq!(invalid.len(), 1);
        match &invalid[0] {
            Finding::Note(n) => {
                assert_eq!(n.onset.bar, 2);
                assert_eq!(n.duration, Ratio::from(4));
            }
            other => panic!("unexpected finding {:?}", other),
        }
    }

    #[test]
    fn test_invalid_durations_needs_two_nodes() {
        let list = whole(VoiceName::Soprano, &["C5"]);
        assert!(invalid_durations(&list).is_err());
    }

    #[test]
    fn test_parallel_fifths_twice_is_illegal() {
        let a = whole(VoiceName::Soprano, &["G4", "A4", "C5"]);
        let b = whole(VoiceName::Alto, &["C4", "D4", "A4"]);
        let groups = illegal_parallel_intervals(&a, &b);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].len(), 2);
    }

    #[test]
    fn test_parallel_thirds_allowed_up_to_limit() {
        let a = whole(VoiceName::Soprano, &["E4", "F#4", "G#4", "A#4", "B4"]);
        let b = whole(VoiceName::Alto, &["C4", "D4", "E4", "F#4", "E4"]);
        assert!(illegal_parallel_intervals(&a, &b).is_empty());
        let runs = illegal_consecutive_parallels(&a, &b, 3);
        assert_eq!(runs.len(), 1);
        assert_eq!(runs[0].len(), 4);
        assert!(illegal_consecutive_parallels(&a, &b, 4).is_empty());
    }

    #[test]
    fn test_downbeat_parallels() {
        let a = halves(VoiceName::Soprano, &[Some("G4"), Some("E4"), Some("A4"), Some("F4")]);
        let b = whole(VoiceName::Alto, &["C4", "D4"]);
        assert_eq!(illegal_downbeat_parallels(&a, &b).len(), 1);
    }

    #[test]
    fn test_vertical_dissonance() {
        let a = whole(VoiceName::Soprano, &["C5", "B4", "C5"]);
        let b = whole(VoiceName::Alto, &["C4", "A4", "E4"]);
        // B4 over A4 is a second.
        let findings = illegal_vertical_intervals(&a, &b);
        assert_eq!(findings.len(), 1);
    }

    #[test]
    fn test_rest_against_note_has_no_harmony() {
        let a = list_of(VoiceName::Soprano, &[(Some("E5"), 1), (None, 1), (Some("C5"), 1)]);
        let b = whole(VoiceName::Alto, &["C4", "D4", "C4"]);
        let findings = illegal_vertical_intervals(&a, &b);
        assert_eq!(findings.len(), 1, "findings: {:?}", findings);
        match &findings[0] {
            Finding::Vertical { interval, onset } => {
                assert_eq!(*interval, Interval::NoInterval);
                assert_eq!(*onset, Onset::new(1, Ratio::zero()));
            }
            other => panic!("expected a vertical finding, got {:?}", other),
        }
    }

    #[test]
    fn test_opening_rest_excused_in_second_species() {
        let a = halves(
            VoiceName::Soprano,
            &[None, Some("G4"), Some("E4"), Some("D4"), Some("C4"), Some("E4")],
        );
        let b = whole(VoiceName::Alto, &["C4", "C4", "C4"]);
        assert_eq!(illegal_vertical_intervals(&a, &b).len(), 2);
        // D4 over C4 is a passing second and the opening rest is excused.
        assert!(illegal_second_species_verticals(&a, &b).is_empty());
    }

    #[test]
    fn test_later_rest_not_excused_in_second_species() {
        let a = halves(VoiceName::Soprano, &[None, Some("E4"), None, Some("E4")]);
        let b = whole(VoiceName::Alto, &["C4", "C4"]);
        let findings = illegal_second_species_verticals(&a, &b);
        assert_eq!(findings.len(), 1, "findings: {:?}", findings);
        assert!(matches!(
            findings[0],
            Finding::Vertical { interval: Interval::NoInterval, onset } if onset == Onset::new(1, Ratio::zero())
        ));
    }

    #[test]
    fn test_passing_dissonance_is_legal() {
        // E4 D4 C4 over a held C4: D4 is a passing second on the weak beat.
        let a = halves(VoiceName::Soprano, &[Some("E4"), Some("D4"), Some("C4"), Some("E4")]);
        let b = whole(VoiceName::Alto, &["C4", "C4"]);
        let legal = legal_dissonances(&a, &b);
        assert_eq!(legal.len(), 1);
        assert!(legal.contains(&Onset::new(0, Ratio::new(1, 2))));
    }

    #[test]
    fn test_leaped_dissonance_is_not_legal() {
        let a = halves(VoiceName::Soprano, &[Some("G4"), Some("D4"), Some("C4"), Some("E4")]);
        let b = whole(VoiceName::Alto, &["C4", "C4"]);
        assert!(legal_dissonances(&a, &b).is_empty());
        assert_eq!(dissonances(&a, &b).len(), 1);
    }

    #[test]
    fn test_direct_motion_to_fifth() {
        let a = whole(VoiceName::Soprano, &["E4", "A4"]);
        let b = whole(VoiceName::Alto, &["C4", "D4"]);
        assert_eq!(illegal_direct_motion(&a, &b).len(), 1);
        // Direct motion into a sixth is fine.
        let a = whole(VoiceName::Soprano, &["E4", "B4"]);
        assert!(illegal_direct_motion(&a, &b).is_empty());
    }

    #[test]
    fn test_weak_unison_crossing_allowed() {
        let upper = halves(VoiceName::Soprano, &[Some("E4"), Some("C4"), Some("E4"), Some("F4")]);
        let lower = whole(VoiceName::Alto, &["C4", "D4"]);
        assert_eq!(voice_crossings(&upper, &lower, 1).len(), 1);
        assert!(voice_crossings_allowing_weak_unisons(&upper, &lower, 1).is_empty());
    }

    #[test]
    fn test_downbeat_unison_crossing_not_allowed() {
        let upper = whole(VoiceName::Soprano, &["E4", "D4"]);
        let lower = whole(VoiceName::Alto, &["C4", "D4"]);
        assert_eq!(voice_crossings_allowing_weak_unisons(&upper, &lower, 1).len(), 1);
    }
}
