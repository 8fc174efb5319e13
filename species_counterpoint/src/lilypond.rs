// LilyPond sheet music output for compositions.
//
// Converts a Composition into a LilyPond (.ly) source file: one staff per
// voice inside a ChoirStaff, with the composition's key and meter in a shared
// `global` block. Pitches are written absolute (not \relative) and spelled
// exactly as in the composition, so an F# stays `fis` and a Gb stays `ges`.
//
// Durations are measured in thirty-second notes and decomposed greedily into
// power-of-two values (optionally dotted) joined with ties. Notes never cross
// barlines (validation rejects that), so each bar is rendered on its own and
// gaps inside a bar become rests. Bars are separated with `|` bar checks.
//
// `render_png` runs the external `lilypond` binary on a written file.

use crate::composition::{Composition, Meter, VoiceLine, VoiceName};
use crate::error::TypesetError;
use crate::pitch::{Key, Pitch};
use crate::ratio::Ratio;
use std::fmt::Write;
use std::path::Path;
use std::process::Command;

/// Smallest representable duration, as a divisor of a whole note.
const UNITS_PER_WHOLE: i64 = 32;

/// A valid LilyPond duration: length in thirty-second notes and its text.
const DURATION_TABLE: [(usize, &str); 10] = [
    (32, "1"),  // whole note
    (24, "2."), // dotted half
    (16, "2"),  // half note
    (12, "4."), // dotted quarter
    (8, "4"),   // quarter note
    (6, "8."),  // dotted eighth
    (4, "8"),   // eighth note
    (3, "16."), // dotted sixteenth
    (2, "16"),  // sixteenth note
    (1, "32"),  // thirty-second note
];

/// Environment variable naming the LilyPond executable.
pub const LILYPOND_ENV: &str = "COUNTERPOINT_LILYPOND";

fn accidental_suffix(accidental: i8) -> String {
    if accidental >= 0 {
        "is".repeat(accidental as usize)
    } else {
        "es".repeat(accidental.unsigned_abs() as usize)
    }
}

/// A pitch in LilyPond absolute notation.
///
/// LilyPond's `c` with no octave marks is C3 (MIDI 48). Each `'` raises one
/// octave, each `,` lowers one octave.
pub fn pitch_to_ly(pitch: &Pitch) -> String {
    let mut result = pitch.letter.as_char().to_ascii_lowercase().to_string();
    result.push_str(&accidental_suffix(pitch.accidental));
    let octave = pitch.octave as i32 - 3;
    if octave > 0 {
        result.push_str(&"'".repeat(octave as usize));
    } else if octave < 0 {
        result.push_str(&",".repeat(octave.unsigned_abs() as usize));
    }
    result
}

/// The `\key` command for a major key.
pub fn key_to_ly(key: &Key) -> String {
    format!(
        "\\key {}{} \\major",
        key.tonic.as_char().to_ascii_lowercase(),
        accidental_suffix(key.accidental)
    )
}

/// Decompose a duration (in thirty-second notes) into LilyPond duration
/// strings, largest first. Multiple parts are connected with ties.
///
/// For example: 20 = "2" + "8" (half note tied to eighth note).
pub fn decompose_duration(mut units: usize) -> Vec<&'static str> {
    let mut parts = Vec::new();
    for &(value, name) in &DURATION_TABLE {
        while units >= value {
            parts.push(name);
            units -= value;
        }
    }
    parts
}

/// Length in thirty-second notes. Lengths finer than that are truncated.
fn to_units(length: Ratio) -> usize {
    let units = length * Ratio::from(UNITS_PER_WHOLE);
    if !units.is_integer() {
        log::warn!("Duration {} cannot be notated exactly; truncating", length);
    }
    units.floor().max(0) as usize
}

fn push_note(out: &mut String, name: &str, units: usize) {
    let parts = decompose_duration(units);
    for (i, dur) in parts.iter().enumerate() {
        if !out.is_empty() && !out.ends_with(' ') {
            out.push(' ');
        }
        let _ = write!(out, "{}{}", name, dur);
        if name != "r" && i + 1 < parts.len() {
            out.push('~');
        }
    }
}

/// Render a single voice's music as a LilyPond music expression.
fn render_voice_music(line: &VoiceLine, meter: Meter) -> String {
    let bar_length = meter.bar_length();
    let mut out = String::new();

    for (bar, events) in line.bars.iter().enumerate() {
        if bar > 0 {
            out.push_str(" |");
        }
        let mut cursor = Ratio::zero();
        for event in events {
            if event.beat > cursor {
                push_note(&mut out, "r", to_units(event.beat - cursor));
            }
            let name = match &event.pitch {
                Some(pitch) => pitch_to_ly(pitch),
                None => "r".to_string(),
            };
            push_note(&mut out, &name, to_units(event.length()));
            cursor = event.end();
        }
        if cursor < bar_length {
            push_note(&mut out, "r", to_units(bar_length - cursor));
        }
    }
    out
}

fn clef(voice: VoiceName) -> &'static str {
    match voice {
        VoiceName::Soprano | VoiceName::Alto => "treble",
        VoiceName::Tenor => "\"treble_8\"",
        VoiceName::Bass => "bass",
    }
}

/// Generate a complete LilyPond file for a composition.
pub fn composition_to_lilypond(composition: &Composition) -> String {
    let mut ly = String::new();

    ly.push_str("\\version \"2.24.0\"\n\n");

    let title = composition.title.as_deref().unwrap_or("Counterpoint exercise");
    let _ = write!(
        ly,
        "\\header {{\n  title = \"{}\"\n  subtitle = \"{}\"\n}}\n\n",
        title.replace('"', "\\\""),
        composition.key
    );

    let _ = write!(
        ly,
        "global = {{\n  {} \\time {}\n}}\n\n",
        key_to_ly(&composition.key),
        composition.meter
    );

    for (voice, line) in &composition.voices {
        let music = render_voice_music(line, composition.meter);
        let _ = write!(
            ly,
            "{} = \\absolute {{\n  \\global\n  {}\n}}\n\n",
            voice.as_str().to_lowercase(),
            music
        );
    }

    ly.push_str("\\score {\n  \\new ChoirStaff <<\n");
    for voice in composition.voices.keys() {
        let _ = write!(
            ly,
            "    \\new Staff = \"{0}\" \\with {{ instrumentName = \"{0}\" }} {{\n      \\clef {1}\n      \\{2}\n    }}\n",
            voice.as_str(),
            clef(*voice),
            voice.as_str().to_lowercase()
        );
    }
    ly.push_str("  >>\n");
    ly.push_str("  \\layout { }\n");
    ly.push_str("  \\midi { }\n");
    ly.push_str("}\n");

    ly
}

/// Write a LilyPond file for a composition.
pub fn write_lilypond(composition: &Composition, path: &Path) -> Result<(), std::io::Error> {
    std::fs::write(path, composition_to_lilypond(composition))
}

/// Engrave `ly_path` to PNG. LilyPond appends the extension itself, so
/// `png_path` names the output without relying on it having one.
pub fn render_png(ly_path: &Path, png_path: &Path) -> Result<(), TypesetError> {
    let command = std::env::var(LILYPOND_ENV).unwrap_or_else(|_| "lilypond".to_string());
    let stem = png_path.with_extension("");
    log::info!("Typesetting {} with {}", ly_path.display(), command);

    let output = Command::new(&command)
        .arg("--png")
        .arg("-o")
        .arg(&stem)
        .arg(ly_path)
        .output()
        .map_err(|source| TypesetError::Spawn {
            command: command.clone(),
            source,
        })?;

    if !output.status.success() {
        return Err(TypesetError::Failed {
            command,
            status: output.status,
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        });
    }
    Ok(())
}
