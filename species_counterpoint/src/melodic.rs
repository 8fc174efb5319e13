// Melodic feature extraction: single-voice views over a `NoteList`.
//
// - `directions`: contour sign per node, with rests transparent (the note
//   after a rest is compared with the note before it).
// - `local_maxima` / `local_minima`: turning points of the contour,
//   including the boundary extremes at the start and end of the melody.
// - `horizontal_intervals`: consecutive actual notes.
// - `indirect_horizontal_intervals`: spans between consecutive extremes that
//   are not already adjacent notes.
// - `strong_beat_horizontal_intervals`: downbeat to downbeat.
//
// Interval triples are `(interval, from, to)` with node ids into the list,
// so rule code can report either end.

use crate::interval::Interval;
use crate::note_list::{NoteId, NoteList, Onset};

/// An interval between two nodes of one voice.
pub type MelodicInterval = (Interval, NoteId, NoteId);

/// Direction of each node relative to the previous actual note: +1 up,
/// -1 down, 0 for repeats, rests and the first note.
pub fn directions(list: &NoteList) -> Vec<(i8, Onset)> {
    list.iter()
        .map(|(id, node)| {
            let dir = match (node.midi(), list.prev_actual_note(id).and_then(|p| list[p].midi())) {
                (Some(cur), Some(prev)) => (cur - prev).signum() as i8,
                _ => 0,
            };
            (dir, node.onset)
        })
        .collect()
}

/// Non-zero directions with the id of the node that moved.
fn moves(list: &NoteList) -> Vec<(i8, NoteId)> {
    directions(list)
        .into_iter()
        .enumerate()
        .filter(|(_, (dir, _))| *dir != 0)
        .map(|(i, (dir, _))| (dir, NoteId(i)))
        .collect()
}

/// Turning points where the contour changes from `toward` to its opposite.
/// With `toward = 1` these are maxima.
fn extrema(list: &NoteList, toward: i8) -> Vec<Onset> {
    let moves = moves(list);
    let mut found = Vec::new();

    let (Some(&(first_dir, _)), Some(&(last_dir, _))) = (moves.first(), moves.last()) else {
        return found;
    };

    // Melody starts by moving away: its first note was the extreme.
    if first_dir == -toward
        && let Some(first) = list.get_first_actual_note()
    {
        found.push(list[first].onset);
    }

    for pair in moves.windows(2) {
        let (dir, id) = pair[0];
        let (next_dir, _) = pair[1];
        if dir == toward && next_dir == -toward {
            found.push(list[id].onset);
        }
    }

    // Melody ends having moved toward the extreme.
    if last_dir == toward
        && let Some(last) = list.get_last_actual_note()
    {
        found.push(list[last].onset);
    }

    found
}

/// Onsets of local melodic high points.
pub fn local_maxima(list: &NoteList) -> Vec<Onset> {
    extrema(list, 1)
}

/// Onsets of local melodic low points.
pub fn local_minima(list: &NoteList) -> Vec<Onset> {
    extrema(list, -1)
}

/// Interval from every actual note to the next actual note.
pub fn horizontal_intervals(list: &NoteList) -> Vec<MelodicInterval> {
    list.actual_notes()
        .filter_map(|(id, _)| {
            let next = list.next_actual_note(id)?;
            Some((Interval::between(list.pitch(id), list.pitch(next)), id, next))
        })
        .collect()
}

/// Intervals spanned between consecutive melodic extremes, skipping pairs of
/// adjacent notes.
pub fn indirect_horizontal_intervals(list: &NoteList) -> Vec<MelodicInterval> {
    let mut extremes = local_maxima(list);
    extremes.extend(local_minima(list));
    extremes.sort();
    extremes.dedup();

    extremes
        .windows(2)
        .filter_map(|pair| {
            let from = list.get(pair[0])?;
            let to = list.get(pair[1])?;
            if list.next_actual_note(from) == Some(to) {
                return None;
            }
            Some((Interval::between(list.pitch(from), list.pitch(to)), from, to))
        })
        .collect()
}

/// Intervals between consecutive downbeat notes.
pub fn strong_beat_horizontal_intervals(list: &NoteList) -> Vec<MelodicInterval> {
    let downbeats: Vec<NoteId> = list
        .actual_notes()
        .filter(|(_, n)| n.onset.is_downbeat())
        .map(|(id, _)| id)
        .collect();

    downbeats
        .windows(2)
        .map(|pair| {
            (
                Interval::between(list.pitch(pair[0]), list.pitch(pair[1])),
                pair[0],
                pair[1],
            )
        })
        .collect()
}
