// Error types for the counterpoint analyzer.
//
// Two tiers. `ValidationError` covers problems with the input composition
// (voice count, voice names, bar and meter mismatches, malformed notes) and is
// always collected into a list so the caller can report every problem at
// once before aborting. `AnalysisError` covers compositions that validate but
// are unsuitable for a particular rule, e.g. a voice too short to have an
// ending. Rule violations themselves are never errors; they are data in the
// `Report` (see `report.rs`).
//
// The remaining enums wrap I/O and decoding failures of the adapters
// (`midi.rs`, `lilypond.rs`, `config.rs`, `exercise.rs`).

use crate::composition::{Meter, VoiceName};
use crate::ratio::Ratio;
use crate::report::RuleId;

/// Failure to parse a pitch or key name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PitchError {
    #[error("invalid pitch name: {0:?}")]
    InvalidPitch(String),

    #[error("invalid key name: {0:?}")]
    InvalidKey(String),

    #[error("only major keys are supported, got {0:?}")]
    UnsupportedMode(String),
}

/// An input-validation failure, detected before any analysis runs.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("expected between 2 and 4 voices with notes, found {0}")]
    WrongVoiceCount(usize),

    #[error("unrecognized voice name {0:?} (expected Soprano, Alto, Tenor or Bass)")]
    UnknownVoice(String),

    #[error("{voice} has {found} bars but {expected} were expected")]
    BarCountMismatch {
        voice: VoiceName,
        expected: usize,
        found: usize,
    },

    #[error("{voice} is in {found} but the composition is in {expected}")]
    MeterMismatch {
        voice: VoiceName,
        expected: Meter,
        found: Meter,
    },

    #[error("{0} is not a supported simple meter")]
    UnsupportedMeter(Meter),

    #[error("note in {voice} at mm. {} crosses the barline", .bar + 1)]
    NoteCrossesBarline { voice: VoiceName, bar: usize },

    #[error("{voice} has overlapping or unsorted notes in mm. {}", .bar + 1)]
    OverlappingNotes { voice: VoiceName, bar: usize },

    #[error("invalid note duration {duration} in {voice}")]
    InvalidDuration { voice: VoiceName, duration: Ratio },

    #[error("unsupported species {0} (expected 1-4)")]
    UnsupportedSpecies(u8),

    #[error(transparent)]
    Pitch(#[from] PitchError),
}

/// A composition that passed validation but cannot be analyzed as asked.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AnalysisError {
    #[error("{voice} has too few notes to check {rule}")]
    InsufficientData { voice: VoiceName, rule: RuleId },

    #[error("{voice} has unsorted or overlapping notes in mm. {}", .bar + 1)]
    MalformedVoice { voice: VoiceName, bar: usize },

    #[error("at least two voices with notes are required, found {0}")]
    TooFewVoices(usize),

    #[error("composition failed validation with {} error(s)", .0.len())]
    Invalid(Vec<ValidationError>),
}

/// Error type for MIDI decoding and encoding.
#[derive(Debug, thiserror::Error)]
pub enum MidiError {
    #[error("MIDI parse error: {0}")]
    Parse(#[from] midly::Error),

    #[error("SMPTE timecode timing is not supported")]
    UnsupportedTiming,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Error type for loading an `AnalysisConfig`.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Error type for loading exercises.
#[derive(Debug, thiserror::Error)]
pub enum ExerciseError {
    #[error("unknown built-in exercise {0:?}")]
    UnknownBuiltin(String),

    #[error("exercise has {} validation error(s)", .0.len())]
    Invalid(Vec<ValidationError>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Error type for typesetting through the external `lilypond` binary.
#[derive(Debug, thiserror::Error)]
pub enum TypesetError {
    #[error("failed to run {command:?}: {source}")]
    Spawn {
        command: String,
        source: std::io::Error,
    },

    #[error("{command} exited with {status}: {stderr}")]
    Failed {
        command: String,
        status: std::process::ExitStatus,
        stderr: String,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
