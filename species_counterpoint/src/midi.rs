// MIDI input and output for compositions.
//
// Reading: each track whose name is a voice name ("Soprano", "alto", ...)
// becomes that voice; its note-on/note-off pairs become timed events placed
// into bars by `VoiceLine::from_timed`. The first time signature and key
// signature found anywhere in the file set the composition's meter and key
// (4/4 and C major if absent), and pitches are spelled in that key. Problems
// that make the file unusable as an exercise (unknown track names, minor
// keys, notes across barlines) are returned as `ValidationError`s next to the
// partial composition; content that is merely ignored is logged.
//
// Writing: SMF Format 1 with a tempo/meta track followed by one named track
// per voice, choir aahs (program 52), one channel per voice.

use crate::composition::{Composition, Meter, VoiceLine, VoiceName};
use crate::error::{MidiError, PitchError, ValidationError};
use crate::pitch::{Key, Letter};
use crate::ratio::Ratio;
use midly::{
    Format, Header, MetaMessage, MidiMessage, Smf, Timing, Track, TrackEvent, TrackEventKind,
    num::{u4, u7, u15, u24, u28},
};
use std::collections::BTreeMap;
use std::path::Path;

/// Ticks per quarter note in MIDI output.
const TICKS_PER_QUARTER: u16 = 480;

/// Playback tempo of written files, in quarter notes per minute.
const TEMPO_BPM: u32 = 72;

/// General MIDI choir aahs.
const CHOIR_PROGRAM: u8 = 52;

const NOTE_VELOCITY: u8 = 80;

/// The major key with `fifths` sharps (negative = flats).
fn key_from_fifths(fifths: i8) -> Key {
    let fifths = fifths as i32;
    let letter = Letter::from_step(4 * fifths);
    let class = (7 * fifths).rem_euclid(12);
    let mut accidental = (class - letter.natural_class()).rem_euclid(12);
    if accidental > 6 {
        accidental -= 12;
    }
    Key::major(letter, accidental as i8)
}

/// Number of sharps (negative = flats) in a key signature, if the key has a
/// standard one.
fn fifths_of(key: &Key) -> Option<i8> {
    (-7..=7).find(|&f| key_from_fifths(f) == *key)
}

// ---------------------------------------------------------------------------
// Reading
// ---------------------------------------------------------------------------

/// One track's notes in ticks, plus its name.
#[derive(Default)]
struct TrackNotes {
    name: Option<String>,
    /// (start tick, end tick, MIDI key)
    notes: Vec<(u64, u64, u8)>,
}

fn collect_track(
    track: &Track<'_>,
    meter: &mut Option<Meter>,
    fifths: &mut Option<(i8, bool)>,
) -> TrackNotes {
    let mut collected = TrackNotes::default();
    let mut current_tick: u64 = 0;
    let mut sounding: Option<(u8, u64)> = None;

    for event in track {
        current_tick += event.delta.as_int() as u64;
        match event.kind {
            TrackEventKind::Meta(MetaMessage::TrackName(bytes)) => {
                collected.name = Some(String::from_utf8_lossy(bytes).trim().to_string());
            }
            TrackEventKind::Meta(MetaMessage::TimeSignature(numer, denom_pow, _, _)) => {
                let found = Meter::new(numer as u32, 1u32 << denom_pow.min(6));
                if meter.is_none() {
                    *meter = Some(found);
                } else if *meter != Some(found) {
                    log::warn!("Ignoring time signature change to {} at tick {}", found, current_tick);
                }
            }
            TrackEventKind::Meta(MetaMessage::KeySignature(sharps, minor)) => {
                if fifths.is_none() {
                    *fifths = Some((sharps, minor));
                } else if *fifths != Some((sharps, minor)) {
                    log::warn!("Ignoring key signature change at tick {}", current_tick);
                }
            }
            TrackEventKind::Midi { message, .. } => match message {
                MidiMessage::NoteOn { key, vel } if vel.as_int() > 0 => {
                    if let Some((held, start)) = sounding.take() {
                        log::warn!(
                            "Overlapping notes at tick {}; ending note {} early",
                            current_tick,
                            held
                        );
                        collected.notes.push((start, current_tick, held));
                    }
                    sounding = Some((key.as_int(), current_tick));
                }
                MidiMessage::NoteOn { key, .. } | MidiMessage::NoteOff { key, .. } => {
                    if let Some((held, start)) = sounding
                        && held == key.as_int()
                    {
                        collected.notes.push((start, current_tick, held));
                        sounding = None;
                    }
                }
                _ => {}
            },
            _ => {}
        }
    }
    if let Some((held, _)) = sounding {
        log::warn!("Note {} is never released; dropping it", held);
    }
    collected
}

/// Decode a Standard MIDI File into a composition. The returned errors
/// describe everything that keeps the result from being a valid exercise.
pub fn read_midi(data: &[u8]) -> Result<(Composition, Vec<ValidationError>), MidiError> {
    let smf = Smf::parse(data)?;
    let Timing::Metrical(tpb) = smf.header.timing else {
        return Err(MidiError::UnsupportedTiming);
    };
    let ticks_per_whole = tpb.as_int() as i64 * 4;

    let mut meter = None;
    let mut fifths = None;
    let tracks: Vec<TrackNotes> = smf
        .tracks
        .iter()
        .map(|t| collect_track(t, &mut meter, &mut fifths))
        .collect();

    let mut errors = Vec::new();
    let meter = meter.unwrap_or_default();
    let key = match fifths {
        None => Key::c_major(),
        Some((_, true)) => {
            errors.push(ValidationError::Pitch(PitchError::UnsupportedMode(
                "minor key signature".to_string(),
            )));
            Key::c_major()
        }
        Some((sharps, false)) => key_from_fifths(sharps),
    };

    let mut composition = Composition::new(key, meter);
    for track in tracks {
        if track.notes.is_empty() {
            continue;
        }
        let Some(name) = track.name else {
            log::warn!("Ignoring unnamed track with {} notes", track.notes.len());
            continue;
        };
        let voice = match name.parse::<VoiceName>() {
            Ok(voice) => voice,
            Err(e) => {
                errors.push(e);
                continue;
            }
        };
        if composition.voices.contains_key(&voice) {
            log::warn!("Ignoring second {} track", voice);
            continue;
        }
        let events: Vec<_> = track
            .notes
            .iter()
            .map(|&(start, end, midi_key)| {
                (
                    Ratio::new(start as i64, ticks_per_whole),
                    Ratio::new((end - start) as i64, ticks_per_whole),
                    Some(key.spell(midi_key)),
                )
            })
            .collect();
        match VoiceLine::from_timed(voice, meter, &events) {
            Ok(line) => {
                composition.voices.insert(voice, line);
            }
            Err(e) => errors.push(e),
        }
    }

    log::debug!(
        "Read MIDI: {} voices in {} ({}), {} problem(s)",
        composition.voices.len(),
        key,
        meter,
        errors.len()
    );
    Ok((composition, errors))
}

/// Read and decode a MIDI file.
pub fn read_midi_file(path: &Path) -> Result<(Composition, Vec<ValidationError>), MidiError> {
    let data = std::fs::read(path)?;
    read_midi(&data)
}

// ---------------------------------------------------------------------------
// Writing
// ---------------------------------------------------------------------------

fn meta(delta: u32, message: MetaMessage<'static>) -> TrackEvent<'static> {
    TrackEvent {
        delta: u28::new(delta),
        kind: TrackEventKind::Meta(message),
    }
}

fn midi_event(delta: u32, channel: u4, message: MidiMessage) -> TrackEvent<'static> {
    TrackEvent {
        delta: u28::new(delta),
        kind: TrackEventKind::Midi { channel, message },
    }
}

fn to_ticks(whole_notes: Ratio) -> u32 {
    let ticks_per_whole = TICKS_PER_QUARTER as i64 * 4;
    (whole_notes * Ratio::from(ticks_per_whole)).floor().max(0) as u32
}

/// Convert a composition to an in-memory SMF.
pub fn composition_to_smf(composition: &Composition) -> Smf<'static> {
    let mut smf = Smf::new(Header::new(
        Format::Parallel,
        Timing::Metrical(u15::new(TICKS_PER_QUARTER)),
    ));

    // Track 0: tempo, meter and key
    let mut tempo_track: Track<'static> = Vec::new();
    tempo_track.push(meta(0, MetaMessage::Tempo(u24::new(60_000_000 / TEMPO_BPM))));
    let meter = composition.meter;
    tempo_track.push(meta(
        0,
        MetaMessage::TimeSignature(
            meter.beats.min(255) as u8,
            meter.unit.max(1).trailing_zeros() as u8,
            24,
            8,
        ),
    ));
    match fifths_of(&composition.key) {
        Some(f) => tempo_track.push(meta(0, MetaMessage::KeySignature(f, false))),
        None => log::warn!("{} has no standard key signature; omitting it", composition.key),
    }
    tempo_track.push(meta(0, MetaMessage::EndOfTrack));
    smf.tracks.push(tempo_track);

    let bar_length = meter.bar_length();
    for (voice, line) in &composition.voices {
        let channel = u4::new(voice.index() as u8);
        let mut track: Track<'static> = Vec::new();
        track.push(meta(0, MetaMessage::TrackName(voice.as_str().as_bytes())));
        track.push(midi_event(
            0,
            channel,
            MidiMessage::ProgramChange {
                program: u7::new(CHOIR_PROGRAM),
            },
        ));

        let mut last_event_tick: u32 = 0;
        for (bar, event) in line.events_with_bar() {
            let Some(pitch) = event.pitch else {
                continue;
            };
            let start = bar_length * Ratio::from(bar as i64) + event.beat;
            let start_tick = to_ticks(start);
            let end_tick = to_ticks(start + event.length());
            let key = u7::new(pitch.midi().clamp(0, 127) as u8);

            track.push(midi_event(
                start_tick.saturating_sub(last_event_tick),
                channel,
                MidiMessage::NoteOn {
                    key,
                    vel: u7::new(NOTE_VELOCITY),
                },
            ));
            track.push(midi_event(
                end_tick.saturating_sub(start_tick),
                channel,
                MidiMessage::NoteOff {
                    key,
                    vel: u7::new(0),
                },
            ));
            last_event_tick = end_tick;
        }

        track.push(meta(0, MetaMessage::EndOfTrack));
        smf.tracks.push(track);
    }

    smf
}

/// Encode a composition as Standard MIDI File bytes.
pub fn write_midi(composition: &Composition) -> Result<Vec<u8>, MidiError> {
    let smf = composition_to_smf(composition);
    let mut buf = Vec::new();
    smf.write_std(&mut buf)?;
    Ok(buf)
}

/// Encode a composition and write it to a file.
pub fn write_midi_file(composition: &Composition, path: &Path) -> Result<(), MidiError> {
    let buf = write_midi(composition)?;
    std::fs::write(path, &buf)?;
    Ok(())
}

/// Pitched-note count per voice.
pub fn note_counts(composition: &Composition) -> BTreeMap<VoiceName, usize> {
    composition
        .voices
        .iter()
        .map(|(voice, line)| (*voice, line.events().filter(|e| e.pitch.is_some()).count()))
        .collect()
}
