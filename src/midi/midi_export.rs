//! Standard MIDI File (SMF) export.
//!
//! Encodes a compiled [`Score`] with `midly`. Running status, variable-length
//! quantities and chunk framing are left to the encoder.
//!
//! # Format Details
//!
//! Exports as SMF Format 1 (multi-track) with:
//! - Track 0: tempo, time signature and key signature meta events
//! - Tracks 1-N: one track per instrument with its name, program change
//!   (omitted on the drum channel) and note data

use super::score::Score;
use super::track::Track;
use crate::error::{MidiGenError, Result};
use crate::theory::{Ticks, TimeConverter};
use midly::num::{u15, u24, u28, u4, u7};
use midly::{Format, Header, MetaMessage, MidiMessage, Smf, Timing, TrackEvent, TrackEventKind};
use std::fs;
use std::path::Path;

/// Largest delta time a track event can carry.
const MAX_DELTA: Ticks = 0x0FFF_FFFF;

/// Largest tempo value a tempo meta event can carry.
const MAX_MICROSECONDS_PER_QUARTER: u32 = 0xFF_FFFF;

/// Represents an event at an absolute tick, before delta encoding.
struct TimedEvent<'a> {
    tick: Ticks,
    /// Orders events at the same tick (lower = first). Note-offs sort before
    /// note-ons so a repeated pitch is released before it is struck again.
    priority: u8,
    kind: TrackEventKind<'a>,
}

impl<'a> TimedEvent<'a> {
    fn new(tick: Ticks, priority: u8, kind: TrackEventKind<'a>) -> Self {
        Self {
            tick,
            priority,
            kind,
        }
    }
}

/// Sorts events and converts absolute ticks to delta times.
fn into_track_events(mut events: Vec<TimedEvent<'_>>) -> Result<Vec<TrackEvent<'_>>> {
    events.sort_by(|a, b| a.tick.cmp(&b.tick).then(a.priority.cmp(&b.priority)));

    let mut last_tick = 0;
    events
        .into_iter()
        .map(|event| {
            let delta = event.tick - last_tick;
            if delta > MAX_DELTA {
                return Err(MidiGenError::Export(format!(
                    "gap of {} ticks exceeds the maximum delta time",
                    delta
                )));
            }
            last_tick = event.tick;
            Ok(TrackEvent {
                delta: u28::new(delta as u32),
                kind: event.kind,
            })
        })
        .collect()
}

fn conductor_track(score: &Score) -> Result<Vec<TrackEvent<'static>>> {
    if score.tempo() == 0 {
        return Err(MidiGenError::Export("tempo must be positive".to_string()));
    }
    let microseconds = TimeConverter::bpm_to_microseconds_per_quarter(score.tempo());
    if microseconds > MAX_MICROSECONDS_PER_QUARTER {
        return Err(MidiGenError::Export(format!(
            "tempo {} BPM is too slow to encode",
            score.tempo()
        )));
    }

    let time_signature = score.time_signature();
    let mut events = vec![
        TimedEvent::new(
            0,
            0,
            TrackEventKind::Meta(MetaMessage::Tempo(u24::new(microseconds))),
        ),
        // 24 MIDI clocks per metronome click, 8 thirty-seconds per quarter
        TimedEvent::new(
            0,
            1,
            TrackEventKind::Meta(MetaMessage::TimeSignature(
                time_signature.numerator(),
                time_signature.denominator_power(),
                24,
                8,
            )),
        ),
    ];
    if let Some((accidentals, minor)) = score.key().signature() {
        events.push(TimedEvent::new(
            0,
            2,
            TrackEventKind::Meta(MetaMessage::KeySignature(accidentals, minor)),
        ));
    }
    events.push(TimedEvent::new(
        score.duration_ticks(),
        255,
        TrackEventKind::Meta(MetaMessage::EndOfTrack),
    ));

    into_track_events(events)
}

fn instrument_track(track: &Track) -> Result<Vec<TrackEvent<'_>>> {
    let channel = u4::new(track.channel());
    let mut events = vec![TimedEvent::new(
        0,
        0,
        TrackEventKind::Meta(MetaMessage::TrackName(track.name().as_bytes())),
    )];

    if !track.is_drum_track() {
        events.push(TimedEvent::new(
            0,
            1,
            TrackEventKind::Midi {
                channel,
                message: MidiMessage::ProgramChange {
                    program: u7::new(track.program()),
                },
            },
        ));
    }

    for note in track.notes() {
        let key = u7::new(note.pitch());
        // a zero-length note must still be struck before it is released
        let off_priority = if note.duration() == 0 { 30 } else { 10 };
        events.push(TimedEvent::new(
            note.time(),
            20,
            TrackEventKind::Midi {
                channel,
                message: MidiMessage::NoteOn {
                    key,
                    vel: u7::new(note.velocity()),
                },
            },
        ));
        events.push(TimedEvent::new(
            note.end_time(),
            off_priority,
            TrackEventKind::Midi {
                channel,
                message: MidiMessage::NoteOff {
                    key,
                    vel: u7::new(0),
                },
            },
        ));
    }

    events.push(TimedEvent::new(
        track.duration_ticks(),
        255,
        TrackEventKind::Meta(MetaMessage::EndOfTrack),
    ));

    into_track_events(events)
}

/// Builds an in-memory Standard MIDI File from a score.
///
/// # Errors
///
/// `Export` when the tempo is zero or too slow for a tempo event, or when
/// two consecutive events are further apart than a delta time can express.
pub fn to_smf(score: &Score) -> Result<Smf<'_>> {
    let division = u15::new(score.ticks_per_quarter_note() as u16);
    let mut smf = Smf::new(Header::new(Format::Parallel, Timing::Metrical(division)));

    smf.tracks.push(conductor_track(score)?);
    for track in score.tracks() {
        smf.tracks.push(instrument_track(track)?);
    }
    Ok(smf)
}

/// Encodes a score as Standard MIDI File bytes.
pub fn to_bytes(score: &Score) -> Result<Vec<u8>> {
    let smf = to_smf(score)?;
    let mut bytes = Vec::new();
    smf.write(&mut bytes)
        .map_err(|e| MidiGenError::Export(e.to_string()))?;
    Ok(bytes)
}

/// Exports a score to a Standard MIDI File.
///
/// # Errors
///
/// Returns `Export` if encoding fails or the file cannot be written.
pub fn export_to_midi<P: AsRef<Path>>(score: &Score, path: P) -> Result<()> {
    let bytes = to_bytes(score)?;
    fs::write(path.as_ref(), bytes).map_err(|e| {
        MidiGenError::Export(format!("cannot write {}: {}", path.as_ref().display(), e))
    })
}
