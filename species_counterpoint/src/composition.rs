// The composition: named voices of timed notes sharing a key and meter.
//
// This is the analyzer's input format. Each `VoiceLine` is a list of bars, and
// each bar a list of `NoteEvent`s positioned by their beat offset inside the
// bar (a fraction of a whole note, 0 = downbeat). Gaps between events are
// legal here; `NoteList` fills them with rests when it is built.
//
// Voices can be assembled two ways:
// - `VoiceLine::from_durations` packs (pitch-or-rest, duration) pairs into
//   bars back to back, the way exercises are written by hand.
// - `VoiceLine::from_timed` places events at absolute positions, the way
//   decoded MIDI arrives.
//
// `validate` performs every input check up front and returns the complete
// list of problems; analysis only runs on a composition with none.

use crate::error::ValidationError;
use crate::pitch::{Key, Pitch};
use crate::ratio::Ratio;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Voice names, declared from highest to lowest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum VoiceName {
    Soprano = 0,
    Alto = 1,
    Tenor = 2,
    Bass = 3,
}

impl VoiceName {
    pub const ALL: [VoiceName; 4] = [
        VoiceName::Soprano,
        VoiceName::Alto,
        VoiceName::Tenor,
        VoiceName::Bass,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn as_str(self) -> &'static str {
        match self {
            VoiceName::Soprano => "Soprano",
            VoiceName::Alto => "Alto",
            VoiceName::Tenor => "Tenor",
            VoiceName::Bass => "Bass",
        }
    }
}

impl fmt::Display for VoiceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VoiceName {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        VoiceName::ALL
            .into_iter()
            .find(|v| v.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ValidationError::UnknownVoice(s.to_string()))
    }
}

/// A time signature: `beats` per bar of `unit` notes (4/4, 3/4, 2/2, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Meter {
    pub beats: u32,
    pub unit: u32,
}

impl Meter {
    pub fn new(beats: u32, unit: u32) -> Self {
        Meter { beats, unit }
    }

    pub fn common_time() -> Self {
        Meter::new(4, 4)
    }

    /// Bar length as a fraction of a whole note.
    pub fn bar_length(&self) -> Ratio {
        Ratio::new(self.beats as i64, self.unit.max(1) as i64)
    }

    /// Simple meters only: a power-of-two unit and a beat count that is not
    /// a compound grouping (6, 9, 12, ...).
    pub fn is_simple(&self) -> bool {
        self.beats > 0
            && self.unit.is_power_of_two()
            && self.unit <= 16
            && (self.beats <= 4 || self.beats % 3 != 0)
    }

    /// Display beat number (1-based, in units of the meter's beat) for a
    /// beat offset in whole notes.
    pub fn beat_number(&self, beat: Ratio) -> f64 {
        (beat * Ratio::from(self.unit as i64)).to_f64() + 1.0
    }
}

impl Default for Meter {
    fn default() -> Self {
        Meter::common_time()
    }
}

impl fmt::Display for Meter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.beats, self.unit)
    }
}

/// A note or rest placed inside a bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NoteEvent {
    /// Offset from the start of the bar, in whole notes.
    pub beat: Ratio,
    /// Divisor of a whole note: 1 = whole, 2 = half, 4 = quarter.
    pub duration: Ratio,
    /// `None` for a rest.
    pub pitch: Option<Pitch>,
}

impl NoteEvent {
    pub fn new(beat: Ratio, duration: Ratio, pitch: Option<Pitch>) -> Self {
        NoteEvent {
            beat,
            duration,
            pitch,
        }
    }

    /// Elapsed length in whole notes.
    pub fn length(&self) -> Ratio {
        self.duration.recip()
    }

    pub fn end(&self) -> Ratio {
        self.beat + self.length()
    }
}

/// One voice's music, bar by bar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoiceLine {
    pub meter: Meter,
    pub bars: Vec<Vec<NoteEvent>>,
}

impl VoiceLine {
    pub fn new(meter: Meter) -> Self {
        VoiceLine {
            meter,
            bars: Vec::new(),
        }
    }

    /// Pack consecutive (pitch-or-rest, duration divisor) pairs into bars.
    /// A note that does not fit in the remainder of its bar is rejected.
    pub fn from_durations(
        voice: VoiceName,
        meter: Meter,
        events: &[(Option<Pitch>, Ratio)],
    ) -> Result<VoiceLine, ValidationError> {
        let bar_length = meter.bar_length();
        let mut line = VoiceLine::new(meter);
        let mut bar: Vec<NoteEvent> = Vec::new();
        let mut cursor = Ratio::zero();

        for &(pitch, duration) in events {
            if !duration.is_positive() {
                return Err(ValidationError::InvalidDuration { voice, duration });
            }
            let event = NoteEvent::new(cursor, duration, pitch);
            if event.end() > bar_length {
                return Err(ValidationError::NoteCrossesBarline {
                    voice,
                    bar: line.bars.len(),
                });
            }
            cursor = event.end();
            bar.push(event);
            if cursor == bar_length {
                line.bars.push(std::mem::take(&mut bar));
                cursor = Ratio::zero();
            }
        }
        if !bar.is_empty() {
            line.bars.push(bar);
        }
        Ok(line)
    }

    /// Place events given as (absolute start, length, pitch-or-rest), both in
    /// whole notes from the start of the piece. Gaps are left for `NoteList`
    /// to fill; a note that crosses a barline is rejected.
    pub fn from_timed(
        voice: VoiceName,
        meter: Meter,
        events: &[(Ratio, Ratio, Option<Pitch>)],
    ) -> Result<VoiceLine, ValidationError> {
        let bar_length = meter.bar_length();
        let mut line = VoiceLine::new(meter);
        for &(start, length, pitch) in events {
            if !length.is_positive() {
                return Err(ValidationError::InvalidDuration {
                    voice,
                    duration: length.recip(),
                });
            }
            let bar = (start / bar_length).floor().max(0) as usize;
            let beat = start - bar_length * Ratio::from(bar as i64);
            if beat + length > bar_length {
                return Err(ValidationError::NoteCrossesBarline { voice, bar });
            }
            while line.bars.len() <= bar {
                line.bars.push(Vec::new());
            }
            line.bars[bar].push(NoteEvent::new(beat, length.recip(), pitch));
        }
        Ok(line)
    }

    /// True if at least one event is a pitched note.
    pub fn has_content(&self) -> bool {
        self.events().any(|e| e.pitch.is_some())
    }

    pub fn events(&self) -> impl Iterator<Item = &NoteEvent> {
        self.bars.iter().flatten()
    }

    /// Events paired with their bar index.
    pub fn events_with_bar(&self) -> impl Iterator<Item = (usize, &NoteEvent)> {
        self.bars
            .iter()
            .enumerate()
            .flat_map(|(bar, events)| events.iter().map(move |e| (bar, e)))
    }
}

/// A complete exercise: up to four named voices in one key and meter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Composition {
    pub title: Option<String>,
    pub key: Key,
    pub meter: Meter,
    pub voices: BTreeMap<VoiceName, VoiceLine>,
}

impl Composition {
    pub fn new(key: Key, meter: Meter) -> Self {
        Composition {
            title: None,
            key,
            meter,
            voices: BTreeMap::new(),
        }
    }

    /// Build a composition from (voice, melody) pairs written as
    /// (pitch-or-rest, duration divisor).
    pub fn from_melodies(
        key: Key,
        meter: Meter,
        melodies: &[(VoiceName, Vec<(Option<Pitch>, Ratio)>)],
    ) -> Result<Composition, ValidationError> {
        let mut composition = Composition::new(key, meter);
        for (voice, melody) in melodies {
            let line = VoiceLine::from_durations(*voice, meter, melody)?;
            composition.voices.insert(*voice, line);
        }
        Ok(composition)
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Voices holding at least one pitched note, highest first.
    pub fn voices_with_content(&self) -> Vec<VoiceName> {
        self.voices
            .iter()
            .filter(|(_, line)| line.has_content())
            .map(|(name, _)| *name)
            .collect()
    }

    pub fn voice(&self, name: VoiceName) -> Option<&VoiceLine> {
        self.voices.get(&name)
    }
}

/// Check a composition before analysis. Returns every problem found; an
/// empty list means the composition can be analyzed.
pub fn validate(composition: &Composition) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if !composition.meter.is_simple() {
        errors.push(ValidationError::UnsupportedMeter(composition.meter));
    }

    let active = composition.voices_with_content();
    if !(2..=4).contains(&active.len()) {
        errors.push(ValidationError::WrongVoiceCount(active.len()));
    }

    let expected_bars = active
        .first()
        .and_then(|v| composition.voice(*v))
        .map(|line| line.bars.len());

    for voice in &active {
        let Some(line) = composition.voice(*voice) else {
            continue;
        };
        if line.meter != composition.meter {
            errors.push(ValidationError::MeterMismatch {
                voice: *voice,
                expected: composition.meter,
                found: line.meter,
            });
        }
        if let Some(expected) = expected_bars
            && line.bars.len() != expected
        {
            errors.push(ValidationError::BarCountMismatch {
                voice: *voice,
                expected,
                found: line.bars.len(),
            });
        }
        errors.extend(validate_bars(*voice, line));
    }

    errors
}

/// Per-bar checks: positive durations, sorted non-overlapping events, and
/// nothing extending past the barline.
fn validate_bars(voice: VoiceName, line: &VoiceLine) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    let bar_length = line.meter.bar_length();
    for (bar, events) in line.bars.iter().enumerate() {
        let mut cursor = Ratio::zero();
        for event in events {
            if !event.duration.is_positive() {
                errors.push(ValidationError::InvalidDuration {
                    voice,
                    duration: event.duration,
                });
                continue;
            }
            if event.beat < cursor {
                errors.push(ValidationError::OverlappingNotes { voice, bar });
            }
            if event.end() > bar_length {
                errors.push(ValidationError::NoteCrossesBarline { voice, bar });
            }
            cursor = event.end();
        }
    }
    errors
}
