// Spelled pitches and major keys.
//
// A `Pitch` keeps its letter name and accidental rather than just a MIDI
// number, because two of the counterpoint rules depend on spelling: interval
// quality (an augmented fourth and a diminished fifth are the same six
// semitones) and key membership (F# belongs to G major, Gb does not).
//
// Octaves follow scientific pitch notation (C4 = middle C = MIDI 60). Pitch
// names are accepted in the exercise-file form "C-4" as well as the compact
// "C4"; accidentals are '#' and 'b', doubled for double sharps and flats.
//
// `Key` models major keys only. Its scale is derived from the tonic by
// stacking the major-scale step pattern onto consecutive letters, so every
// key (including ones like C# major with seven sharps) spells its degrees
// correctly.

use crate::error::PitchError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Semitone offsets of the major scale degrees from the tonic.
pub const MAJOR_SCALE: [i32; 7] = [0, 2, 4, 5, 7, 9, 11];

/// Letter names, in diatonic order starting from C.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Letter {
    C,
    D,
    E,
    F,
    G,
    A,
    B,
}

impl Letter {
    pub const ALL: [Letter; 7] = [
        Letter::C,
        Letter::D,
        Letter::E,
        Letter::F,
        Letter::G,
        Letter::A,
        Letter::B,
    ];

    /// Diatonic step within the octave (C = 0 .. B = 6).
    pub fn step(self) -> i32 {
        self as i32
    }

    /// Pitch class of the natural note.
    pub fn natural_class(self) -> i32 {
        MAJOR_SCALE[self as usize]
    }

    pub fn from_step(step: i32) -> Letter {
        Letter::ALL[step.rem_euclid(7) as usize]
    }

    pub fn from_char(c: char) -> Option<Letter> {
        match c.to_ascii_uppercase() {
            'C' => Some(Letter::C),
            'D' => Some(Letter::D),
            'E' => Some(Letter::E),
            'F' => Some(Letter::F),
            'G' => Some(Letter::G),
            'A' => Some(Letter::A),
            'B' => Some(Letter::B),
            _ => None,
        }
    }

    pub fn as_char(self) -> char {
        ['C', 'D', 'E', 'F', 'G', 'A', 'B'][self as usize]
    }
}

/// Render an accidental as '#'/'b' characters.
fn accidental_suffix(accidental: i8) -> String {
    if accidental >= 0 {
        "#".repeat(accidental as usize)
    } else {
        "b".repeat(accidental.unsigned_abs() as usize)
    }
}

/// Parse a leading letter plus accidentals, returning the rest of the input.
fn parse_letter_and_accidental(s: &str) -> Option<(Letter, i8, &str)> {
    let mut chars = s.chars();
    let letter = Letter::from_char(chars.next()?)?;
    let rest = chars.as_str();
    let sharps = rest.chars().take_while(|&c| c == '#').count();
    let flats = rest.chars().take_while(|&c| c == 'b').count();
    if sharps > 2 || flats > 2 {
        return None;
    }
    let accidental = sharps as i8 - flats as i8;
    Some((letter, accidental, &rest[sharps + flats..]))
}

/// A spelled pitch: letter, accidental (-2..=2) and octave.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Pitch {
    pub letter: Letter,
    pub accidental: i8,
    pub octave: i8,
}

impl Pitch {
    pub fn new(letter: Letter, accidental: i8, octave: i8) -> Self {
        Pitch {
            letter,
            accidental,
            octave,
        }
    }

    /// MIDI note number (C4 = 60). B#3 and C4 share a number.
    pub fn midi(&self) -> i32 {
        12 * (self.octave as i32 + 1) + self.letter.natural_class() + self.accidental as i32
    }

    pub fn pitch_class(&self) -> i32 {
        self.midi().rem_euclid(12)
    }

    /// Absolute diatonic position, used to count interval numbers.
    pub fn diatonic_step(&self) -> i32 {
        self.octave as i32 * 7 + self.letter.step()
    }
}

impl fmt::Display for Pitch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}{}",
            self.letter.as_char(),
            accidental_suffix(self.accidental),
            self.octave
        )
    }
}

impl FromStr for Pitch {
    type Err = PitchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || PitchError::InvalidPitch(s.to_string());
        let (letter, accidental, rest) = parse_letter_and_accidental(s.trim()).ok_or_else(invalid)?;
        let digits = rest.strip_prefix('-').unwrap_or(rest);
        if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
            return Err(invalid());
        }
        let octave: i8 = digits.parse().map_err(|_| invalid())?;
        if octave > 9 {
            return Err(invalid());
        }
        Ok(Pitch::new(letter, accidental, octave))
    }
}

/// Sharp spellings for pitch classes outside the key.
const CHROMATIC_SPELLINGS: [(Letter, i8); 12] = [
    (Letter::C, 0),
    (Letter::C, 1),
    (Letter::D, 0),
    (Letter::D, 1),
    (Letter::E, 0),
    (Letter::F, 0),
    (Letter::F, 1),
    (Letter::G, 0),
    (Letter::G, 1),
    (Letter::A, 0),
    (Letter::A, 1),
    (Letter::B, 0),
];

/// A major key, identified by its tonic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Key {
    pub tonic: Letter,
    pub accidental: i8,
}

impl Key {
    pub fn major(tonic: Letter, accidental: i8) -> Self {
        Key { tonic, accidental }
    }

    pub fn c_major() -> Self {
        Key::major(Letter::C, 0)
    }

    /// The seven scale degrees as (letter, accidental), tonic first.
    pub fn scale(&self) -> [(Letter, i8); 7] {
        let tonic_class = self.tonic_class();
        let mut degrees = [(Letter::C, 0); 7];
        for (i, degree) in degrees.iter_mut().enumerate() {
            let letter = Letter::from_step(self.tonic.step() + i as i32);
            let target = (tonic_class + MAJOR_SCALE[i]).rem_euclid(12);
            let mut accidental = (target - letter.natural_class()).rem_euclid(12);
            if accidental > 6 {
                accidental -= 12;
            }
            *degree = (letter, accidental as i8);
        }
        degrees
    }

    pub fn tonic_class(&self) -> i32 {
        (self.tonic.natural_class() + self.accidental as i32).rem_euclid(12)
    }

    pub fn dominant_class(&self) -> i32 {
        (self.tonic_class() + 7).rem_euclid(12)
    }

    pub fn leading_tone_class(&self) -> i32 {
        (self.tonic_class() + 11).rem_euclid(12)
    }

    /// Whether the pitch is spelled as a degree of this key.
    pub fn contains(&self, pitch: &Pitch) -> bool {
        self.scale()
            .iter()
            .any(|&(letter, accidental)| letter == pitch.letter && accidental == pitch.accidental)
    }

    /// 1-based scale degree of a pitch spelled in this key.
    pub fn degree(&self, pitch: &Pitch) -> Option<usize> {
        self.scale()
            .iter()
            .position(|&(letter, accidental)| letter == pitch.letter && accidental == pitch.accidental)
            .map(|i| i + 1)
    }

    /// Spell a MIDI note number: scale degrees use the key's spelling, other
    /// pitch classes use sharps.
    pub fn spell(&self, midi: u8) -> Pitch {
        let midi = midi as i32;
        let pc = midi.rem_euclid(12);
        let (letter, accidental) = self
            .scale()
            .into_iter()
            .find(|&(letter, accidental)| {
                (letter.natural_class() + accidental as i32).rem_euclid(12) == pc
            })
            .unwrap_or(CHROMATIC_SPELLINGS[pc as usize]);
        // The octave belongs to the letter, so Cb5 sounds as MIDI 71.
        let octave = (midi - letter.natural_class() - accidental as i32).div_euclid(12) - 1;
        Pitch::new(letter, accidental, octave as i8)
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{} major",
            self.tonic.as_char(),
            accidental_suffix(self.accidental)
        )
    }
}

impl FromStr for Key {
    type Err = PitchError;

    /// Accepts "C", "Bb", "F# major" and "Eb maj". Minor and modal names are
    /// rejected with `UnsupportedMode`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let (letter, accidental, rest) = parse_letter_and_accidental(trimmed)
            .ok_or_else(|| PitchError::InvalidKey(s.to_string()))?;
        match rest.trim().to_lowercase().as_str() {
            "" | "major" | "maj" => Ok(Key::major(letter, accidental)),
            "m" | "min" | "minor" | "dorian" | "phrygian" | "lydian" | "mixolydian"
            | "aeolian" | "locrian" => Err(PitchError::UnsupportedMode(s.to_string())),
            _ => Err(PitchError::InvalidKey(s.to_string())),
        }
    }
}
