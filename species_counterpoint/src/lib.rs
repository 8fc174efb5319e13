// Species Counterpoint Analyzer
//
// Checks two- to four-voice vocal exercises (Soprano, Alto, Tenor, Bass)
// against the rules of first and second species counterpoint and produces a
// structured report of violations. Compositions come from JSON exercise files,
// built-in examples, or MIDI files, and can be written back out as MIDI or
// LilyPond for listening and engraving.
//
// Architecture:
// - ratio.rs: Exact rational arithmetic for beats and durations
// - pitch.rs: Spelled pitches, letters and major keys
// - interval.rs: Interval classes, qualities and the allowed-interval sets
// - composition.rs: Voices, meters, bars of note events, input validation
// - note_list.rs: Per-voice arena of timed nodes with rest synthesis and
//   onset lookups ("what sounds at this instant")
// - melodic.rs: Contour, local extrema and melodic interval extraction
// - harmonic.rs: Vertical intervals, parallel/direct motion, voice crossing
//   and rhythmic alignment between two voices
// - rules.rs: Individual counterpoint rules over one voice or a voice pair
// - species.rs: Species rule catalogues assembled into a `Report`
// - report.rs: Rule identifiers, findings and the per-rule result shapes
// - standardize.rs: Report flattening into printable error records
// - config.rs: Tunable analysis settings (voice priority, limits)
// - exercise.rs: JSON exercise format and built-in exercises
// - midi.rs: MIDI import/export
// - lilypond.rs: LilyPond output and PNG engraving
// - error.rs: Error types
//
// Analysis is pure and synchronous: each call builds its own note lists from
// a read-only composition.

pub mod composition;
pub mod config;
pub mod error;
pub mod exercise;
pub mod harmonic;
pub mod interval;
pub mod lilypond;
pub mod melodic;
pub mod midi;
pub mod note_list;
pub mod pitch;
pub mod ratio;
pub mod report;
pub mod rules;
pub mod species;
pub mod standardize;

use composition::{Composition, validate};
use config::AnalysisConfig;
use error::AnalysisError;
use report::Report;
use species::Species;

/// Validate a composition and evaluate it under the rules of `species`.
pub fn analyze(
    composition: &Composition,
    species: Species,
    config: &AnalysisConfig,
) -> Result<Report, AnalysisError> {
    let errors = validate(composition);
    if !errors.is_empty() {
        return Err(AnalysisError::Invalid(errors));
    }
    species::evaluate(species, composition, config)
}
