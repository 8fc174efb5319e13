// Exercise files: compositions written as JSON, plus the built-in examples.
//
// An exercise names its key, meter and (optionally) species, and gives each
// voice as a list of `[pitch, duration]` pairs, where pitch is a name such as
// "C-5" or "Bb4" (null for a rest) and duration is the divisor of a whole
// note (1 = whole, 2 = half, 4 = quarter):
//
//   { "title": "First species",
//     "key": "C", "meter": [4, 4], "species": 1,
//     "melodies": { "Soprano": [["C-5", 1], ["B-4", 1]],
//                   "Alto":    [["C-4", 1], ["G-4", 1]] } }
//
// Converting to a `Composition` collects every voice, pitch and packing
// problem rather than stopping at the first.

use crate::composition::{Composition, Meter, VoiceLine, VoiceName};
use crate::error::{ExerciseError, ValidationError};
use crate::pitch::{Key, Pitch};
use crate::ratio::Ratio;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Names accepted by `builtin`.
pub const BUILTINS: [&str; 3] = ["first_species", "second_species", "cantus_firmus"];

fn default_key() -> String {
    "C".to_string()
}

fn default_meter() -> [u32; 2] {
    [4, 4]
}

/// One note or rest as written in an exercise file.
pub type WrittenNote = (Option<String>, u32);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExerciseFile {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default = "default_key")]
    pub key: String,
    #[serde(default = "default_meter")]
    pub meter: [u32; 2],
    #[serde(default)]
    pub species: Option<u8>,
    pub melodies: BTreeMap<String, Vec<WrittenNote>>,
}

impl ExerciseFile {
    pub fn from_json(data: &str) -> Result<Self, ExerciseError> {
        Ok(serde_json::from_str(data)?)
    }

    pub fn load(path: &Path) -> Result<Self, ExerciseError> {
        let data = std::fs::read_to_string(path)?;
        Self::from_json(&data)
    }

    pub fn to_json(&self) -> Result<String, ExerciseError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Build the composition, reporting every problem found.
    pub fn to_composition(&self) -> Result<Composition, ExerciseError> {
        let mut errors = Vec::new();
        let meter = Meter::new(self.meter[0], self.meter[1]);
        let key = match self.key.parse::<Key>() {
            Ok(key) => key,
            Err(e) => {
                errors.push(ValidationError::from(e));
                Key::c_major()
            }
        };

        let mut composition = Composition::new(key, meter);
        composition.title = self.title.clone();

        for (name, notes) in &self.melodies {
            let voice = match name.parse::<VoiceName>() {
                Ok(voice) => voice,
                Err(e) => {
                    errors.push(e);
                    continue;
                }
            };
            match parse_melody(voice, meter, notes) {
                Ok(line) => {
                    composition.voices.insert(voice, line);
                }
                Err(mut problems) => errors.append(&mut problems),
            }
        }

        if errors.is_empty() {
            Ok(composition)
        } else {
            Err(ExerciseError::Invalid(errors))
        }
    }
}

fn parse_melody(
    voice: VoiceName,
    meter: Meter,
    notes: &[WrittenNote],
) -> Result<VoiceLine, Vec<ValidationError>> {
    let mut errors = Vec::new();
    let mut events = Vec::with_capacity(notes.len());
    for (name, duration) in notes {
        let pitch = match name.as_deref().map(str::parse::<Pitch>) {
            None => None,
            Some(Ok(pitch)) => Some(pitch),
            Some(Err(e)) => {
                errors.push(ValidationError::from(e));
                continue;
            }
        };
        if *duration == 0 {
            errors.push(ValidationError::InvalidDuration {
                voice,
                duration: Ratio::zero(),
            });
            continue;
        }
        events.push((pitch, Ratio::from(*duration as i64)));
    }
    if !errors.is_empty() {
        return Err(errors);
    }
    VoiceLine::from_durations(voice, meter, &events).map_err(|e| vec![e])
}

// ---------------------------------------------------------------------------
// Built-in exercises
// ---------------------------------------------------------------------------

fn notes(names: &[&str], duration: u32) -> Vec<WrittenNote> {
    names
        .iter()
        .map(|n| (Some(n.to_string()), duration))
        .collect()
}

fn exercise(title: &str, species: u8, melodies: Vec<(&str, Vec<WrittenNote>)>) -> ExerciseFile {
    ExerciseFile {
        title: Some(title.to_string()),
        key: default_key(),
        meter: default_meter(),
        species: Some(species),
        melodies: melodies
            .into_iter()
            .map(|(voice, notes)| (voice.to_string(), notes))
            .collect(),
    }
}

/// A built-in exercise by name (see `BUILTINS`).
pub fn builtin(name: &str) -> Result<ExerciseFile, ExerciseError> {
    match name {
        "first_species" => Ok(exercise(
            "First species in three voices",
            1,
            vec![
                (
                    "Soprano",
                    notes(
                        &["C-5", "B-4", "A-4", "B-4", "C-5", "D-5", "D-5", "E-5", "B-4", "C-5"],
                        1,
                    ),
                ),
                (
                    "Alto",
                    notes(
                        &["E-4", "G-4", "F-4", "G-4", "E-4", "B-4", "A-4", "A-4", "G-4", "E-4"],
                        1,
                    ),
                ),
                (
                    "Bass",
                    notes(
                        &["C-3", "D-3", "F-3", "E-3", "A-3", "G-3", "F-3", "E-3", "D-3", "C-3"],
                        1,
                    ),
                ),
            ],
        )),
        "second_species" => {
            let mut soprano: Vec<WrittenNote> = vec![(None, 2)];
            soprano.extend(notes(
                &[
                    "C-5", "G-4", "A-4", "B-4", "G-4", "A-4", "B-4", "C-5", "B-4", "C-5", "E-5",
                    "F-5", "E-5", "D-5", "C-5", "B-4", "D-5", "C-5", "G-4", "A-4", "B-4",
                ],
                2,
            ));
            soprano.extend(notes(&["C-5"], 1));
            Ok(exercise(
                "Second species against an alto cantus firmus",
                2,
                vec![
                    ("Soprano", soprano),
                    (
                        "Alto",
                        notes(
                            &[
                                "C-4", "E-4", "G-4", "F-4", "E-4", "C-4", "A-4", "F-4", "G-4",
                                "E-4", "D-4", "C-4",
                            ],
                            1,
                        ),
                    ),
                ],
            ))
        }
        "cantus_firmus" => Ok(exercise(
            "Counterpoint above a cantus firmus",
            1,
            vec![
                (
                    "Soprano",
                    notes(
                        &["C-5", "B-4", "A-4", "B-4", "C-5", "D-5", "D-5", "E-5", "B-4", "C-5"],
                        1,
                    ),
                ),
                (
                    "Alto",
                    notes(
                        &["C-4", "D-4", "F-4", "E-4", "A-4", "G-4", "F-4", "E-4", "D-4", "C-4"],
                        1,
                    ),
                ),
            ],
        )),
        other => Err(ExerciseError::UnknownBuiltin(other.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::composition::validate;

    #[test]
    fn test_parse_json_with_defaults() {
        let json = r#"{
            "melodies": {
                "Soprano": [["G-4", 1], ["C-5", 1]],
                "alto": [[null, 2], ["E-4", 2], ["C-4", 1]]
            }
        }"#;
        let file = ExerciseFile::from_json(json).unwrap();
        assert_eq!(file.key, "C");
        assert_eq!(file.meter, [4, 4]);
        assert_eq!(file.species, None);

        let composition = file.to_composition().unwrap();
        assert_eq!(composition.voices_with_content(), vec![VoiceName::Soprano, VoiceName::Alto]);
        let alto = composition.voice(VoiceName::Alto).unwrap();
        assert_eq!(alto.bars.len(), 2);
        assert!(alto.bars[0][0].pitch.is_none());
    }

    #[test]
    fn test_collects_every_problem() {
        let json = r#"{
            "key": "A minor",
            "melodies": {
                "Baritone": [["C-4", 1]],
                "Soprano": [["H-4", 1], ["C-5", 0]]
            }
        }"#;
        let file = ExerciseFile::from_json(json).unwrap();
        match file.to_composition() {
            Err(ExerciseError::Invalid(errors)) => assert_eq!(errors.len(), 4, "{:?}", errors),
            other => panic!("expected validation errors, got {:?}", other),
        }
    }

    #[test]
    fn test_note_across_barline() {
        let json = r#"{ "melodies": { "Soprano": [["C-5", 2], ["D-5", 1]] } }"#;
        let file = ExerciseFile::from_json(json).unwrap();
        assert!(matches!(
            file.to_composition(),
            Err(ExerciseError::Invalid(ref e)) if matches!(e[0], ValidationError::NoteCrossesBarline { .. })
        ));
    }

    #[test]
    fn test_builtins_are_valid() {
        for name in BUILTINS {
            let composition = builtin(name).unwrap().to_composition().unwrap();
            assert!(validate(&composition).is_empty(), "{} should validate", name);
        }
    }

    #[test]
    fn test_builtin_json_roundtrip() {
        let file = builtin("second_species").unwrap();
        let restored = ExerciseFile::from_json(&file.to_json().unwrap()).unwrap();
        assert_eq!(restored, file);
    }

    #[test]
    fn test_unknown_builtin() {
        assert!(matches!(builtin("fifth_species"), Err(ExerciseError::UnknownBuiltin(_))));
    }
}
