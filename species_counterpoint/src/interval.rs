// Interval values between two pitches.
//
// An interval is measured from the lower pitch to the higher one, so
// direction never matters. Its class is a diatonic number (1 = unison ..
// 7 = seventh) plus a quality; compound intervals reduce to their simple
// class and carry the distance separately. A pairing that involves a rest
// produces `Interval::NoInterval`, which never matches any consonance set and
// never joins a parallel run.
//
// Two renderings are provided: the compact shorthand used when grouping
// (`1`, `b3`, `#4`, `b5`, ...) and the classical names shown to users
// (`P1`, `m3`, `aug4`, `dim5`, ...).

use crate::pitch::{MAJOR_SCALE, Pitch};
use std::fmt;

/// Interval quality. Augmented and diminished carry their degree (1 for
/// plain augmented/diminished, 2 for doubly).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Quality {
    Perfect,
    Major,
    Minor,
    Augmented(u8),
    Diminished(u8),
}

/// A simple interval class: number 1..=7 and quality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IntervalClass {
    pub number: u8,
    pub quality: Quality,
}

impl IntervalClass {
    pub const UNISON: IntervalClass = IntervalClass::new(1, Quality::Perfect);
    pub const MINOR_SECOND: IntervalClass = IntervalClass::new(2, Quality::Minor);
    pub const MAJOR_SECOND: IntervalClass = IntervalClass::new(2, Quality::Major);
    pub const MINOR_THIRD: IntervalClass = IntervalClass::new(3, Quality::Minor);
    pub const MAJOR_THIRD: IntervalClass = IntervalClass::new(3, Quality::Major);
    pub const PERFECT_FOURTH: IntervalClass = IntervalClass::new(4, Quality::Perfect);
    pub const PERFECT_FIFTH: IntervalClass = IntervalClass::new(5, Quality::Perfect);
    pub const MINOR_SIXTH: IntervalClass = IntervalClass::new(6, Quality::Minor);
    pub const MAJOR_SIXTH: IntervalClass = IntervalClass::new(6, Quality::Major);

    pub const fn new(number: u8, quality: Quality) -> Self {
        IntervalClass { number, quality }
    }

    fn is_perfect_type(number: u8) -> bool {
        matches!(number, 1 | 4 | 5)
    }

    /// Classify two pitches, lower first by (MIDI number, diatonic step).
    pub fn between(a: &Pitch, b: &Pitch) -> IntervalClass {
        let (lower, upper) = if (a.midi(), a.diatonic_step()) <= (b.midi(), b.diatonic_step()) {
            (a, b)
        } else {
            (b, a)
        };
        let number = (upper.diatonic_step() - lower.diatonic_step()).rem_euclid(7) + 1;
        let semitones = (upper.midi() - lower.midi()).rem_euclid(12);
        let mut delta = (semitones - MAJOR_SCALE[(number - 1) as usize]).rem_euclid(12);
        if delta > 5 {
            delta -= 12;
        }
        let number = number as u8;
        let quality = if Self::is_perfect_type(number) {
            match delta {
                0 => Quality::Perfect,
                d if d > 0 => Quality::Augmented(d as u8),
                d => Quality::Diminished((-d) as u8),
            }
        } else {
            match delta {
                0 => Quality::Major,
                -1 => Quality::Minor,
                d if d > 0 => Quality::Augmented(d as u8),
                d => Quality::Diminished((-d - 1) as u8),
            }
        };
        IntervalClass { number, quality }
    }

    /// Jazz-style shorthand: `1`, `b2`, `2`, `#4`, `b5`, ...
    pub fn shorthand(&self) -> String {
        let prefix = match self.quality {
            Quality::Perfect | Quality::Major => String::new(),
            Quality::Minor => "b".to_string(),
            Quality::Augmented(n) => "#".repeat(n as usize),
            Quality::Diminished(n) if Self::is_perfect_type(self.number) => "b".repeat(n as usize),
            Quality::Diminished(n) => "b".repeat(n as usize + 1),
        };
        format!("{}{}", prefix, self.number)
    }

    /// Classical name: `P1`, `m2`, `M3`, `aug4`, `dim5`, ...
    pub fn classical_name(&self) -> String {
        match self.quality {
            Quality::Perfect => format!("P{}", self.number),
            Quality::Major => format!("M{}", self.number),
            Quality::Minor => format!("m{}", self.number),
            Quality::Augmented(n) => format!("{}aug{}", "doubly-".repeat(n as usize - 1), self.number),
            Quality::Diminished(n) => format!("{}dim{}", "doubly-".repeat(n as usize - 1), self.number),
        }
    }
}

/// Classes allowed between consecutive notes, between melodic extremes and
/// between consecutive strong beats: steps, consonant leaps and unisons.
pub const MELODIC_CONSONANCES: [IntervalClass; 9] = [
    IntervalClass::UNISON,
    IntervalClass::MINOR_SECOND,
    IntervalClass::MAJOR_SECOND,
    IntervalClass::MINOR_THIRD,
    IntervalClass::MAJOR_THIRD,
    IntervalClass::PERFECT_FOURTH,
    IntervalClass::PERFECT_FIFTH,
    IntervalClass::MINOR_SIXTH,
    IntervalClass::MAJOR_SIXTH,
];

/// Classes allowed between simultaneously sounding voices.
pub const VERTICAL_CONSONANCES: [IntervalClass; 7] = [
    IntervalClass::UNISON,
    IntervalClass::MINOR_THIRD,
    IntervalClass::MAJOR_THIRD,
    IntervalClass::PERFECT_FOURTH,
    IntervalClass::PERFECT_FIFTH,
    IntervalClass::MINOR_SIXTH,
    IntervalClass::MAJOR_SIXTH,
];

/// The only classes that may repeat in parallel motion.
pub const PARALLEL_CONSONANCES: [IntervalClass; 4] = [
    IntervalClass::MINOR_THIRD,
    IntervalClass::MAJOR_THIRD,
    IntervalClass::MINOR_SIXTH,
    IntervalClass::MAJOR_SIXTH,
];

/// Perfect consonances that may not be approached by direct motion.
pub const PERFECT_CONSONANCES: [IntervalClass; 2] =
    [IntervalClass::UNISON, IntervalClass::PERFECT_FIFTH];

/// The interval between two (possibly resting) notes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Interval {
    /// At least one side is a rest or nothing is sounding.
    NoInterval,
    Between {
        class: IntervalClass,
        /// Absolute distance in semitones.
        semitones: u8,
    },
}

impl Interval {
    pub fn between(a: Option<&Pitch>, b: Option<&Pitch>) -> Interval {
        match (a, b) {
            (Some(a), Some(b)) => Interval::Between {
                class: IntervalClass::between(a, b),
                semitones: (a.midi() - b.midi()).unsigned_abs().min(u8::MAX as u32) as u8,
            },
            _ => Interval::NoInterval,
        }
    }

    pub fn class(&self) -> Option<IntervalClass> {
        match self {
            Interval::Between { class, .. } => Some(*class),
            Interval::NoInterval => None,
        }
    }

    pub fn semitones(&self) -> Option<u8> {
        match self {
            Interval::Between { semitones, .. } => Some(*semitones),
            Interval::NoInterval => None,
        }
    }

    /// Whole octaves spanned.
    pub fn octaves(&self) -> Option<u8> {
        self.semitones().map(|s| s / 12)
    }

    /// Same interval class, ignoring octaves. `NoInterval` matches nothing.
    pub fn same_class(&self, other: &Interval) -> bool {
        match (self.class(), other.class()) {
            (Some(a), Some(b)) => a == b,
            _ => false,
        }
    }

    /// Whether the class is one of `set`. `NoInterval` is in no set.
    pub fn is_in(&self, set: &[IntervalClass]) -> bool {
        self.class().is_some_and(|c| set.contains(&c))
    }

    /// True for a unison with no octave displacement.
    pub fn is_perfect_unison(&self) -> bool {
        matches!(self, Interval::Between { class, semitones: 0 } if *class == IntervalClass::UNISON)
    }

    pub fn shorthand(&self) -> String {
        match self.class() {
            Some(c) => c.shorthand(),
            None => " ".to_string(),
        }
    }

    pub fn classical_name(&self) -> String {
        match self.class() {
            Some(c) => c.classical_name(),
            None => "no harmony".to_string(),
        }
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.classical_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn iv(a: &str, b: &str) -> Interval {
        let a: Pitch = a.parse().unwrap();
        let b: Pitch = b.parse().unwrap();
        Interval::between(Some(&a), Some(&b))
    }

    #[test]
    fn test_direction_is_ignored() {
        assert_eq!(iv("C4", "E4"), iv("E4", "C4"));
        assert_eq!(iv("C4", "E4").class(), Some(IntervalClass::MAJOR_THIRD));
    }

    #[test]
    fn test_compound_reduces_to_class() {
        let tenth = iv("C3", "E4");
        assert_eq!(tenth.class(), Some(IntervalClass::MAJOR_THIRD));
        assert_eq!(tenth.octaves(), Some(1));
        assert_eq!(tenth.semitones(), Some(16));
        assert!(tenth.same_class(&iv("D4", "F#4")));
    }

    #[test]
    fn test_spelling_decides_quality() {
        assert_eq!(iv("F4", "B4").shorthand(), "#4");
        assert_eq!(iv("B3", "F4").shorthand(), "b5");
        assert_eq!(iv("F4", "B4").classical_name(), "aug4");
        assert_eq!(iv("B3", "F4").classical_name(), "dim5");
        assert_eq!(iv("C4", "D#4").shorthand(), "#2");
        assert_eq!(iv("C4", "Eb4").shorthand(), "b3");
    }

    #[test]
    fn test_shorthand_names() {
        assert_eq!(iv("C4", "C4").shorthand(), "1");
        assert_eq!(iv("C4", "C5").shorthand(), "1");
        assert_eq!(iv("E4", "F4").shorthand(), "b2");
        assert_eq!(iv("C4", "G4").shorthand(), "5");
        assert_eq!(iv("E4", "C5").shorthand(), "b6");
        assert_eq!(iv("C4", "Bb4").shorthand(), "b7");
        assert_eq!(iv("C4", "B4").shorthand(), "7");
    }

    #[test]
    fn test_classical_names() {
        assert_eq!(iv("C4", "C4").classical_name(), "P1");
        assert_eq!(iv("B4", "C5").classical_name(), "m2");
        assert_eq!(iv("C4", "D4").classical_name(), "M2");
        assert_eq!(iv("C4", "A4").classical_name(), "M6");
        assert_eq!(Interval::NoInterval.classical_name(), "no harmony");
    }

    #[test]
    fn test_rest_yields_no_interval() {
        let c: Pitch = "C4".parse().unwrap();
        let none = Interval::between(Some(&c), None);
        assert_eq!(none, Interval::NoInterval);
        assert!(!none.same_class(&Interval::NoInterval));
        assert!(!none.is_in(&VERTICAL_CONSONANCES));
    }

    #[test]
    fn test_consonance_sets() {
        assert!(iv("C4", "E4").is_in(&PARALLEL_CONSONANCES));
        assert!(!iv("C4", "G4").is_in(&PARALLEL_CONSONANCES));
        assert!(iv("C4", "G4").is_in(&PERFECT_CONSONANCES));
        assert!(!iv("C4", "D4").is_in(&VERTICAL_CONSONANCES));
        assert!(iv("C4", "D4").is_in(&MELODIC_CONSONANCES));
        assert!(!iv("C4", "B4").is_in(&MELODIC_CONSONANCES));
        assert!(!iv("F4", "B4").is_in(&MELODIC_CONSONANCES));
    }

    #[test]
    fn test_perfect_unison() {
        assert!(iv("G4", "G4").is_perfect_unison());
        assert!(!iv("G3", "G4").is_perfect_unison());
        assert!(!iv("G4", "A4").is_perfect_unison());
    }

    #[test]
    fn test_enharmonic_unison_is_diminished_second() {
        let class = iv("B#3", "C4").class().unwrap();
        assert_eq!(class.number, 2);
        assert_eq!(class.quality, Quality::Diminished(1));
        assert_eq!(class.shorthand(), "bb2");
    }
}
