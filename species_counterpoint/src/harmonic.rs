// Harmonic feature extraction: two-voice views over a pair of `NoteList`s.
//
// Everything here is keyed by onset. `note_onsets` merges the attack times of
// both voices; at each of those instants the sounding note of each voice is
// found with `get_note_playing_at`, so a held whole note in one voice pairs
// with every half note moving against it.
//
// By convention the first list is the higher voice of the pair.

use crate::interval::Interval;
use crate::melodic::{directions, local_maxima};
use crate::note_list::{NoteId, NoteList, NoteNode, Onset};
use std::collections::{BTreeMap, BTreeSet};

/// A vertical interval at an onset.
pub type VerticalInterval = (Interval, Onset);

/// Rhythmic alignment between two voices.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Alignment {
    /// Nodes of the first voice with an exact counterpart in the second.
    pub matched: usize,
    /// Nodes of the first voice with no node of the same onset and length in
    /// the second.
    pub unmatched_a: Vec<NoteNode>,
    /// And the reverse.
    pub unmatched_b: Vec<NoteNode>,
}

impl Alignment {
    pub fn is_aligned(&self) -> bool {
        self.unmatched_a.is_empty() && self.unmatched_b.is_empty()
    }
}

/// Time-ordered, de-duplicated union of the onsets of both voices.
pub fn note_onsets(a: &NoteList, b: &NoteList) -> Vec<Onset> {
    let onsets: BTreeSet<Onset> = a
        .nodes()
        .iter()
        .chain(b.nodes())
        .map(|n| n.onset)
        .collect();
    onsets.into_iter().collect()
}

/// The interval between whatever each voice is sounding at every onset.
pub fn vertical_intervals(a: &NoteList, b: &NoteList) -> Vec<VerticalInterval> {
    note_onsets(a, b)
        .into_iter()
        .map(|onset| {
            let pa = a.get_note_playing_at(onset).and_then(|id| a.pitch(id));
            let pb = b.get_note_playing_at(onset).and_then(|id| b.pitch(id));
            (Interval::between(pa, pb), onset)
        })
        .collect()
}

/// Each voice's melodic direction at every onset; 0 for a voice with no
/// attack at that instant.
pub fn combined_directions(a: &NoteList, b: &NoteList) -> Vec<(i8, i8, Onset)> {
    let dirs_a: BTreeMap<Onset, i8> = directions(a).into_iter().map(|(d, o)| (o, d)).collect();
    let dirs_b: BTreeMap<Onset, i8> = directions(b).into_iter().map(|(d, o)| (o, d)).collect();
    note_onsets(a, b)
        .into_iter()
        .map(|onset| {
            (
                dirs_a.get(&onset).copied().unwrap_or(0),
                dirs_b.get(&onset).copied().unwrap_or(0),
                onset,
            )
        })
        .collect()
}

/// Runs of at least two consecutive vertical intervals with the same class,
/// taken from the intervals that pass `filter`. `NoInterval` never joins a
/// run.
pub fn parallel_motion<F>(a: &NoteList, b: &NoteList, filter: F) -> Vec<Vec<VerticalInterval>>
where
    F: Fn(&Interval, &Onset) -> bool,
{
    let mut groups = Vec::new();
    let mut run: Vec<VerticalInterval> = Vec::new();

    for (interval, onset) in vertical_intervals(a, b) {
        if !filter(&interval, &onset) {
            continue;
        }
        let continues = run.last().is_some_and(|(prev, _)| prev.same_class(&interval));
        if !continues {
            if run.len() >= 2 {
                groups.push(std::mem::take(&mut run));
            }
            run.clear();
        }
        if interval != Interval::NoInterval {
            run.push((interval, onset));
        }
    }
    if run.len() >= 2 {
        groups.push(run);
    }
    groups
}

/// Vertical intervals reached with both voices moving in the same direction.
pub fn direct_motion(a: &NoteList, b: &NoteList) -> Vec<VerticalInterval> {
    vertical_intervals(a, b)
        .into_iter()
        .zip(combined_directions(a, b))
        .filter(|(_, (da, db, _))| *da != 0 && da == db)
        .map(|(vertical, _)| vertical)
        .collect()
}

/// The actual note sounding in `list` at `onset` (or the last one before it,
/// if the voice is resting) plus earlier actual notes, `count` in total.
fn sounding_and_previous(list: &NoteList, onset: Onset, count: usize) -> Vec<NoteId> {
    let mut found = Vec::with_capacity(count);
    let mut current = list.get_note_playing_at(onset).and_then(|id| {
        if list[id].is_rest() {
            list.prev_actual_note(id)
        } else {
            Some(id)
        }
    });
    while let Some(id) = current {
        if found.len() == count {
            break;
        }
        found.push(id);
        current = list.prev_actual_note(id);
    }
    found
}

/// Pairs `(upper note, lower note)` where the lower voice reaches or passes
/// the upper one. Each qualifying note is compared with the other voice's
/// note sounding at its onset and that note's `note_spacing - 1`
/// predecessors. Both voices are scanned; each pair appears once.
pub fn voice_crossing<F>(
    upper: &NoteList,
    lower: &NoteList,
    note_spacing: usize,
    note_filter: F,
) -> Vec<(NoteId, NoteId)>
where
    F: Fn(&NoteNode) -> bool,
{
    let spacing = note_spacing.max(1);
    let mut crossings = BTreeSet::new();

    for (low_id, low) in lower.actual_notes().filter(|(_, n)| note_filter(*n)) {
        for up_id in sounding_and_previous(upper, low.onset, spacing) {
            if let (Some(l), Some(u)) = (low.midi(), upper[up_id].midi())
                && l >= u
            {
                crossings.insert((up_id, low_id));
            }
        }
    }

    for (up_id, up) in upper.actual_notes().filter(|(_, n)| note_filter(*n)) {
        for low_id in sounding_and_previous(lower, up.onset, spacing) {
            if let (Some(u), Some(l)) = (up.midi(), lower[low_id].midi())
                && u <= l
            {
                crossings.insert((up_id, low_id));
            }
        }
    }

    let mut pairs: Vec<(NoteId, NoteId)> = crossings.into_iter().collect();
    pairs.sort_by_key(|&(u, l)| upper[u].onset.max(lower[l].onset));
    pairs
}

/// Match nodes (rests included) by identical onset and length.
pub fn all_notes_line_up(a: &NoteList, b: &NoteList) -> Alignment {
    let key = |n: &NoteNode| (n.onset, n.end_beat());
    let keys_a: BTreeSet<_> = a.nodes().iter().map(key).collect();
    let keys_b: BTreeSet<_> = b.nodes().iter().map(key).collect();

    let mut alignment = Alignment::default();
    for node in a.nodes() {
        if keys_b.contains(&key(node)) {
            alignment.matched += 1;
        } else {
            alignment.unmatched_a.push(*node);
        }
    }
    alignment.unmatched_b = b
        .nodes()
        .iter()
        .filter(|n| !keys_a.contains(&key(*n)))
        .copied()
        .collect();
    alignment
}

/// Onsets that are melodic high points in both voices.
pub fn coincident_maxima(a: &NoteList, b: &NoteList) -> Vec<Onset> {
    let maxima_b: BTreeSet<Onset> = local_maxima(b).into_iter().collect();
    local_maxima(a)
        .into_iter()
        .filter(|o| maxima_b.contains(o))
        .collect()
}
