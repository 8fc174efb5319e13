// Temporal note model: one voice as a contiguous sequence of timed nodes.
//
// A `NoteList` is built once per analysis from a `VoiceLine` and is read-only
// afterward. Nodes live in a single `Vec` (an arena) addressed by `NoteId`;
// predecessor/successor links are index arithmetic, and the "actual note"
// accessors scan past rests. Construction synthesizes rests for every gap so
// that time inside the voice is covered without holes: a gap before an event
// becomes a rest of duration `1/gap`, and so does the unfilled tail of every
// bar except the last.
//
// Onsets are exact `(bar, beat)` pairs (beat in whole notes), which makes
// them usable as keys for aligning independently timed voices.

use crate::composition::{Meter, VoiceLine, VoiceName};
use crate::error::AnalysisError;
use crate::pitch::Pitch;
use crate::ratio::Ratio;
use std::fmt;
use std::ops::Index;

/// The instant a node starts: bar index and offset into the bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Onset {
    pub bar: usize,
    pub beat: Ratio,
}

impl Onset {
    pub fn new(bar: usize, beat: Ratio) -> Self {
        Onset { bar, beat }
    }

    /// True on the first beat of a bar.
    pub fn is_downbeat(&self) -> bool {
        self.beat.is_zero()
    }
}

impl fmt::Display for Onset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.bar + 1, self.beat)
    }
}

/// Index of a node inside its `NoteList`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NoteId(pub usize);

/// A note or rest with its position and duration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NoteNode {
    pub pitch: Option<Pitch>,
    pub onset: Onset,
    /// Divisor of a whole note (synthesized rests may be fractional).
    pub duration: Ratio,
}

impl NoteNode {
    pub fn is_rest(&self) -> bool {
        self.pitch.is_none()
    }

    pub fn midi(&self) -> Option<i32> {
        self.pitch.map(|p| p.midi())
    }

    /// Elapsed length in whole notes.
    pub fn length(&self) -> Ratio {
        self.duration.recip()
    }

    /// Beat offset at which the node stops sounding (same bar).
    pub fn end_beat(&self) -> Ratio {
        self.onset.beat + self.length()
    }

    /// Display label: pitch name, or "rest".
    pub fn label(&self) -> String {
        match self.pitch {
            Some(p) => p.to_string(),
            None => "rest".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct NoteList {
    voice: VoiceName,
    meter: Meter,
    nodes: Vec<NoteNode>,
}

impl NoteList {
    /// Build the node sequence for one voice, filling gaps with rests.
    pub fn new(voice: VoiceName, line: &VoiceLine) -> Result<NoteList, AnalysisError> {
        let bar_length = line.meter.bar_length();
        let last_bar = line.bars.len().saturating_sub(1);
        let mut nodes = Vec::new();

        for (bar, events) in line.bars.iter().enumerate() {
            let mut cursor = Ratio::zero();
            for event in events {
                if event.beat < cursor || !event.duration.is_positive() {
                    return Err(AnalysisError::MalformedVoice { voice, bar });
                }
                if event.beat > cursor {
                    nodes.push(NoteNode {
                        pitch: None,
                        onset: Onset::new(bar, cursor),
                        duration: (event.beat - cursor).recip(),
                    });
                }
                nodes.push(NoteNode {
                    pitch: event.pitch,
                    onset: Onset::new(bar, event.beat),
                    duration: event.duration,
                });
                cursor = event.end();
            }
            if bar != last_bar && cursor < bar_length {
                nodes.push(NoteNode {
                    pitch: None,
                    onset: Onset::new(bar, cursor),
                    duration: (bar_length - cursor).recip(),
                });
            }
        }

        log::debug!("{}: built note list with {} nodes", voice, nodes.len());
        Ok(NoteList {
            voice,
            meter: line.meter,
            nodes,
        })
    }

    pub fn voice(&self) -> VoiceName {
        self.voice
    }

    pub fn meter(&self) -> Meter {
        self.meter
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn nodes(&self) -> &[NoteNode] {
        &self.nodes
    }

    pub fn node(&self, id: NoteId) -> Option<&NoteNode> {
        self.nodes.get(id.0)
    }

    /// Nodes in time order with their ids.
    pub fn iter(&self) -> impl Iterator<Item = (NoteId, &NoteNode)> {
        self.nodes.iter().enumerate().map(|(i, n)| (NoteId(i), n))
    }

    /// Non-rest nodes in time order.
    pub fn actual_notes(&self) -> impl Iterator<Item = (NoteId, &NoteNode)> {
        self.iter().filter(|(_, n)| !n.is_rest())
    }

    /// The node starting exactly at `onset`.
    pub fn get(&self, onset: Onset) -> Option<NoteId> {
        self.nodes.iter().position(|n| n.onset == onset).map(NoteId)
    }

    /// The node sounding at `onset`: same bar, started at or before it and
    /// not yet finished.
    pub fn get_note_playing_at(&self, onset: Onset) -> Option<NoteId> {
        self.nodes
            .iter()
            .position(|n| {
                n.onset.bar == onset.bar && n.onset.beat <= onset.beat && onset.beat < n.end_beat()
            })
            .map(NoteId)
    }

    pub fn next(&self, id: NoteId) -> Option<NoteId> {
        let i = id.0 + 1;
        (i < self.nodes.len()).then_some(NoteId(i))
    }

    pub fn prev(&self, id: NoteId) -> Option<NoteId> {
        id.0.checked_sub(1).map(NoteId)
    }

    /// The next node that is not a rest.
    pub fn next_actual_note(&self, id: NoteId) -> Option<NoteId> {
        let start = id.0 + 1;
        self.nodes
            .get(start..)?
            .iter()
            .position(|n| !n.is_rest())
            .map(|offset| NoteId(start + offset))
    }

    /// The previous node that is not a rest.
    pub fn prev_actual_note(&self, id: NoteId) -> Option<NoteId> {
        self.nodes
            .get(..id.0.min(self.nodes.len()))?
            .iter()
            .rposition(|n| !n.is_rest())
            .map(NoteId)
    }

    pub fn get_first_actual_note(&self) -> Option<NoteId> {
        self.nodes.iter().position(|n| !n.is_rest()).map(NoteId)
    }

    pub fn get_last_actual_note(&self) -> Option<NoteId> {
        self.nodes.iter().rposition(|n| !n.is_rest()).map(NoteId)
    }

    /// Pitch of a node, `None` for rests and unknown ids.
    pub fn pitch(&self, id: NoteId) -> Option<&Pitch> {
        self.node(id).and_then(|n| n.pitch.as_ref())
    }
}

impl Index<NoteId> for NoteList {
    type Output = NoteNode;

    fn index(&self, id: NoteId) -> &NoteNode {
        &self.nodes[id.0]
    }
}
