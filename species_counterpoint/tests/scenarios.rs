// End-to-end analysis scenarios.
//
// Each test builds a complete composition (programmatically, from one of the
// JSON files under data/, or through a MIDI round trip) and runs it through
// the public `analyze` entry point, checking the findings a student would see
// for a handful of classic situations: a correct two-voice exercise over a
// cantus firmus, a single vertical dissonance, a second-species line that
// ends on the wrong note value, and a simultaneous voice crossing.

use species_counterpoint::analyze;
use species_counterpoint::composition::{Composition, Meter, VoiceName};
use species_counterpoint::config::AnalysisConfig;
use species_counterpoint::error::{AnalysisError, ValidationError};
use species_counterpoint::exercise::{ExerciseFile, builtin};
use species_counterpoint::midi::{read_midi, write_midi};
use species_counterpoint::note_list::Onset;
use species_counterpoint::pitch::{Key, Pitch};
use species_counterpoint::ratio::Ratio;
use species_counterpoint::report::{Finding, RuleId, RuleResult, VoicePair};
use species_counterpoint::species::Species;
use species_counterpoint::standardize::{cantus_line, render_report, standardize};
use std::path::PathBuf;

const SOPRANO_LINE: [&str; 10] = ["C5", "B4", "A4", "B4", "C5", "D5", "D5", "E5", "B4", "C5"];
const CANTUS: [&str; 10] = ["C4", "D4", "F4", "E4", "A4", "G4", "F4", "E4", "D4", "C4"];

/// Helper: a melody of equal note values.
fn melody(names: &[&str], duration: i64) -> Vec<(Option<Pitch>, Ratio)> {
    names
        .iter()
        .map(|n| (Some(n.parse().unwrap()), Ratio::from(duration)))
        .collect()
}

/// Helper: a C major, common-time composition from whole-note voices.
fn whole_notes(voices: &[(VoiceName, &[&str])]) -> Composition {
    let melodies: Vec<_> = voices
        .iter()
        .map(|(voice, names)| (*voice, melody(names, 1)))
        .collect();
    Composition::from_melodies(Key::c_major(), Meter::common_time(), &melodies).unwrap()
}

fn data_file(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("data").join(name)
}

fn soprano_alto() -> VoicePair {
    VoicePair::new(VoiceName::Soprano, VoiceName::Alto)
}

#[test]
fn cantus_firmus_scenario_is_clean_where_it_should_be() {
    let composition = whole_notes(&[
        (VoiceName::Soprano, &SOPRANO_LINE),
        (VoiceName::Alto, &CANTUS),
    ]);
    let report = analyze(&composition, Species::First, &AnalysisConfig::default()).unwrap();

    // First species never searches for a cantus firmus.
    assert_eq!(cantus_line(&report), None);

    // C5 opens the high voice, C4 the low voice, and B4 -> C5 closes it.
    assert!(report.voice_findings(RuleId::HighVoiceBeginningError, VoiceName::Soprano).is_empty());
    assert!(report.voice_findings(RuleId::LowVoiceBeginningError, VoiceName::Alto).is_empty());
    assert!(report.voice_findings(RuleId::HighVoiceEndingError, VoiceName::Soprano).is_empty());

    // Every simultaneity is an octave, fifth, third or sixth.
    assert!(
        report.pair_findings(RuleId::VerticalIntervalErrors, soprano_alto()).is_empty(),
        "unexpected vertical errors: {:?}",
        report.pair_findings(RuleId::VerticalIntervalErrors, soprano_alto())
    );

    // Same rhythm in both voices.
    match report.get(RuleId::AlignmentErrors) {
        Some(RuleResult::Alignment(map)) => {
            let alignment = &map[&soprano_alto()];
            assert!(alignment.unmatched_a.is_empty() && alignment.unmatched_b.is_empty());
            assert_eq!(alignment.matched, 10);
        }
        other => panic!("expected alignment result, got {:?}", other),
    }
}

#[test]
fn single_dissonance_is_reported_at_its_onset() {
    let mut alto = CANTUS;
    alto[4] = "B4"; // C5 over B4: a minor second
    let composition = whole_notes(&[(VoiceName::Soprano, &SOPRANO_LINE), (VoiceName::Alto, &alto)]);
    let report = analyze(&composition, Species::First, &AnalysisConfig::default()).unwrap();

    let findings = report.pair_findings(RuleId::VerticalIntervalErrors, soprano_alto());
    assert_eq!(findings.len(), 1, "findings: {:?}", findings);
    match &findings[0] {
        Finding::Vertical { interval, onset } => {
            assert_eq!(*onset, Onset::new(4, Ratio::zero()));
            assert_eq!(interval.classical_name(), "m2");
        }
        other => panic!("expected a vertical finding, got {:?}", other),
    }

    let lines = render_report(&report, composition.meter, true);
    assert!(
        lines.iter().any(|l| l.contains("mm. 5") && l.contains("m2")),
        "rendered report should locate the dissonance: {:#?}",
        lines
    );
}

#[test]
fn rest_against_a_note_is_reported_as_no_harmony() {
    let soprano: Vec<(Option<Pitch>, Ratio)> = vec![
        (Some("E5".parse().unwrap()), Ratio::from(1)),
        (None, Ratio::from(1)),
        (Some("C5".parse().unwrap()), Ratio::from(1)),
    ];
    let composition = Composition::from_melodies(
        Key::c_major(),
        Meter::common_time(),
        &[(VoiceName::Soprano, soprano), (VoiceName::Alto, melody(&["C4", "D4", "C4"], 1))],
    )
    .unwrap();
    let report = analyze(&composition, Species::First, &AnalysisConfig::default()).unwrap();

    let findings = report.pair_findings(RuleId::VerticalIntervalErrors, soprano_alto());
    assert_eq!(findings.len(), 1, "findings: {:?}", findings);
    let lines = render_report(&report, composition.meter, false);
    assert!(
        lines.iter().any(|l| l.contains("no harmony at mm. 2")),
        "rendered report should name the missing harmony: {:#?}",
        lines
    );
}

#[test]
fn second_species_final_quarter_note_is_the_only_bad_duration() {
    let mut file = builtin("second_species").unwrap();
    let soprano = file.melodies.get_mut("Soprano").unwrap();
    let last = soprano.len() - 1;
    soprano[last].1 = 4;

    let composition = file.to_composition().unwrap();
    let report = analyze(&composition, Species::Second, &AnalysisConfig::default()).unwrap();
    assert_eq!(report.cantus_firmus(), Some(VoiceName::Alto));
    assert_eq!(cantus_line(&report).as_deref(), Some("Cantus firmus: Alto"));

    let findings = report.voice_findings(RuleId::InvalidDurations, VoiceName::Soprano);
    assert_eq!(findings.len(), 1, "findings: {:?}", findings);
    match &findings[0] {
        Finding::Note(node) => {
            assert_eq!(node.duration, Ratio::from(4));
            assert_eq!(node.onset, Onset::new(11, Ratio::zero()));
        }
        other => panic!("expected a note finding, got {:?}", other),
    }
    assert!(report.voice_findings(RuleId::InvalidRests, VoiceName::Soprano).is_empty());
}

#[test]
fn simultaneous_crossing_is_reported_once() {
    let composition = whole_notes(&[
        (VoiceName::Soprano, &["E5", "D5", "C5"]),
        (VoiceName::Alto, &["C4", "F5", "A4"]),
    ]);
    let config = AnalysisConfig {
        voice_crossing_spacing: 1,
        ..Default::default()
    };
    let report = analyze(&composition, Species::First, &config).unwrap();
    let findings = report.pair_findings(RuleId::VoiceCrossingErrors, soprano_alto());
    assert_eq!(findings.len(), 1, "findings: {:?}", findings);
    match &findings[0] {
        Finding::Crossing { upper, lower } => {
            assert_eq!(upper.label(), "D5");
            assert_eq!(lower.label(), "F5");
        }
        other => panic!("expected a crossing, got {:?}", other),
    }

    // Looking one note back also catches the F5 above the soprano's E5 and
    // the soprano's C5 under the F5.
    let report = analyze(&composition, Species::First, &AnalysisConfig::default()).unwrap();
    assert_eq!(
        report.pair_findings(RuleId::VoiceCrossingErrors, soprano_alto()).len(),
        3
    );
}

#[test]
fn invalid_input_is_rejected_before_analysis() {
    let mut composition = whole_notes(&[
        (VoiceName::Soprano, &SOPRANO_LINE),
        (VoiceName::Alto, &CANTUS[..9]),
    ]);
    match analyze(&composition, Species::First, &AnalysisConfig::default()) {
        Err(AnalysisError::Invalid(errors)) => assert!(
            errors
                .iter()
                .any(|e| matches!(e, ValidationError::BarCountMismatch { .. })),
            "errors: {:?}",
            errors
        ),
        other => panic!("expected validation failure, got {:?}", other),
    }

    composition.voices.remove(&VoiceName::Alto);
    assert!(matches!(
        analyze(&composition, Species::First, &AnalysisConfig::default()),
        Err(AnalysisError::Invalid(_))
    ));
}

#[test]
fn exercise_file_matches_programmatic_composition() {
    let file = ExerciseFile::load(&data_file("cantus_firmus.json")).unwrap();
    assert_eq!(file.species, Some(1));
    let from_file = file.to_composition().unwrap();

    let built = whole_notes(&[
        (VoiceName::Soprano, &SOPRANO_LINE),
        (VoiceName::Alto, &CANTUS),
    ]);
    assert_eq!(from_file.voices, built.voices);

    let config = AnalysisConfig::default();
    assert_eq!(
        analyze(&from_file, Species::First, &config).unwrap(),
        analyze(&built, Species::First, &config).unwrap()
    );
}

#[test]
fn second_species_exercise_in_g_with_config_file() {
    let config = AnalysisConfig::load(&data_file("analysis_config.json")).unwrap();
    assert_eq!(config.voice_crossing_spacing, 1);
    assert!(!config.show_rule_text);

    let file = ExerciseFile::load(&data_file("second_species_g.json")).unwrap();
    let species = Species::try_from(file.species.unwrap()).unwrap();
    let composition = file.to_composition().unwrap();
    let report = analyze(&composition, species, &config).unwrap();

    assert_eq!(report.cantus_firmus(), Some(VoiceName::Bass));
    assert!(report.voice_findings(RuleId::InvalidDurations, VoiceName::Tenor).is_empty());
    assert!(report.voice_findings(RuleId::InvalidRests, VoiceName::Tenor).is_empty());
    // Opens on the dominant after a half rest, closes F#4 -> G4 by semitone.
    assert!(report.voice_findings(RuleId::HighVoiceBeginningError, VoiceName::Tenor).is_empty());
    assert!(report.voice_findings(RuleId::HighVoiceEndingError, VoiceName::Tenor).is_empty());

    let lines = render_report(&report, composition.meter, config.show_rule_text);
    assert!(lines.iter().all(|l| !l.starts_with("Rule:")));
}

#[test]
fn midi_round_trip_preserves_the_analysis() {
    let composition = builtin("first_species").unwrap().to_composition().unwrap();
    let bytes = write_midi(&composition).unwrap();
    let (restored, problems) = read_midi(&bytes).unwrap();
    assert!(problems.is_empty(), "problems: {:?}", problems);

    let config = AnalysisConfig::default();
    let original = analyze(&composition, Species::First, &config).unwrap();
    let reread = analyze(&restored, Species::First, &config).unwrap();
    assert_eq!(standardize(&original), standardize(&reread));
}

#[test]
fn four_voice_first_species_checks_every_pair() {
    let composition = whole_notes(&[
        (VoiceName::Soprano, &["E5", "D5", "C5"]),
        (VoiceName::Alto, &["C5", "B4", "G4"]),
        (VoiceName::Tenor, &["G4", "G4", "E4"]),
        (VoiceName::Bass, &["C3", "G3", "C3"]),
    ]);
    let report = analyze(&composition, Species::First, &AnalysisConfig::default()).unwrap();
    match report.get(RuleId::VerticalIntervalErrors) {
        Some(RuleResult::ByPair(map)) => assert_eq!(map.len(), 6),
        other => panic!("expected per-pair result, got {:?}", other),
    }
    // The outer voices frame the beginning and ending rules.
    match report.get(RuleId::LowVoiceBeginningError) {
        Some(RuleResult::ByVoice(map)) => assert!(map.contains_key(&VoiceName::Bass)),
        other => panic!("expected per-voice result, got {:?}", other),
    }
}
