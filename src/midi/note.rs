//! MIDI note and chord representation.
//!
//! A note represents a single MIDI note-on/note-off pair with timing,
//! pitch, velocity, and duration information. A chord groups notes that
//! start together.

use crate::error::{MidiGenError, Result};
use crate::theory::Ticks;
use serde::Serialize;

/// Represents a single MIDI note with timing and dynamics.
///
/// Notes are immutable values: every transformation returns a new note, and
/// two notes with the same fields are equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Note {
    /// MIDI note number (0-127). 60 = Middle C (C4).
    pitch: u8,

    /// Note velocity (0-127). 0 is silent, 127 is maximum.
    velocity: u8,

    /// Duration in ticks.
    duration: Ticks,

    /// Start time in ticks from the beginning of the track.
    time: Ticks,
}

pub(super) fn check_midi_range(what: &'static str, value: i64) -> Result<u8> {
    if (0..=127).contains(&value) {
        Ok(value as u8)
    } else {
        Err(MidiGenError::OutOfRange { what, value })
    }
}

impl Note {
    /// Creates a new note with the given parameters.
    ///
    /// # Arguments
    ///
    /// * `pitch` - MIDI note number (0-127)
    /// * `velocity` - Note velocity (0-127)
    /// * `duration` - Duration in ticks
    /// * `time` - Start position in ticks
    ///
    /// # Errors
    ///
    /// `OutOfRange` when pitch or velocity exceeds 127.
    ///
    /// # Examples
    ///
    /// ```
    /// use midigen::midi::Note;
    ///
    /// // Middle C, quarter note at beat 1, medium velocity
    /// let note = Note::new(60, 100, 480, 0).unwrap();
    /// assert_eq!(note.end_time(), 480);
    /// assert!(Note::new(128, 100, 480, 0).is_err());
    /// ```
    pub fn new(pitch: u8, velocity: u8, duration: Ticks, time: Ticks) -> Result<Self> {
        Ok(Self {
            pitch: check_midi_range("Pitch", pitch as i64)?,
            velocity: check_midi_range("Velocity", velocity as i64)?,
            duration,
            time,
        })
    }

    /// Like [`Note::new`] but takes a signed pitch, as produced by interval
    /// arithmetic that may fall below zero.
    pub fn from_pitch(pitch: i64, velocity: u8, duration: Ticks, time: Ticks) -> Result<Self> {
        let pitch = check_midi_range("Pitch", pitch)?;
        Self::new(pitch, velocity, duration, time)
    }

    pub fn pitch(&self) -> u8 {
        self.pitch
    }

    pub fn velocity(&self) -> u8 {
        self.velocity
    }

    pub fn duration(&self) -> Ticks {
        self.duration
    }

    pub fn time(&self) -> Ticks {
        self.time
    }

    /// Returns the end tick of this note (time + duration).
    pub fn end_time(&self) -> Ticks {
        self.time.saturating_add(self.duration)
    }

    /// Returns the note transposed by a number of semitones.
    ///
    /// # Errors
    ///
    /// `OutOfRange` if the new pitch leaves 0-127.
    pub fn transposed(&self, semitones: i32) -> Result<Self> {
        let pitch = check_midi_range("Pitch", self.pitch as i64 + semitones as i64)?;
        Ok(Self { pitch, ..*self })
    }

    /// Returns the note moved to a new start time.
    pub fn with_time(&self, time: Ticks) -> Self {
        Self { time, ..*self }
    }
}

/// Notes that sound together. All members share one start time; members are
/// kept sorted by pitch so two chords with the same notes compare equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Chord {
    notes: Vec<Note>,
}

impl Chord {
    /// Creates a chord from notes that all start at the same tick.
    ///
    /// # Errors
    ///
    /// `EmptyChord` for no notes, `ChordTimeMismatch` when start times differ.
    pub fn new(mut notes: Vec<Note>) -> Result<Self> {
        let first = notes.first().ok_or(MidiGenError::EmptyChord)?.time;
        if let Some(stray) = notes.iter().find(|n| n.time != first) {
            return Err(MidiGenError::ChordTimeMismatch(first, stray.time));
        }
        notes.sort_by_key(|n| (n.pitch, n.velocity, n.duration));
        Ok(Self { notes })
    }

    /// Builds a chord from pitches sharing velocity, duration and time.
    pub fn from_pitches(
        pitches: &[u8],
        velocity: u8,
        duration: Ticks,
        time: Ticks,
    ) -> Result<Self> {
        let notes = pitches
            .iter()
            .map(|&pitch| Note::new(pitch, velocity, duration, time))
            .collect::<Result<Vec<_>>>()?;
        Self::new(notes)
    }

    /// Returns the member notes, lowest pitch first.
    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    pub fn time(&self) -> Ticks {
        self.notes[0].time
    }

    /// Longest member duration.
    pub fn duration(&self) -> Ticks {
        self.notes.iter().map(|n| n.duration).max().unwrap_or(0)
    }

    pub fn pitches(&self) -> Vec<u8> {
        self.notes.iter().map(|n| n.pitch).collect()
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    /// Returns the chord transposed by a number of semitones.
    pub fn transposed(&self, semitones: i32) -> Result<Self> {
        let notes = self
            .notes
            .iter()
            .map(|n| n.transposed(semitones))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { notes })
    }
}
