//! MIDI track representation.
//!
//! A track contains the notes of one instrument, assigned to a specific MIDI
//! channel and program. Tracks are produced by the compiler and owned by the
//! score; no two instruments share a track.

use super::channel_pool::{DRUM_CHANNEL, MIDI_CHANNELS};
use super::note::{check_midi_range, Chord, Note};
use crate::compose::{Arpeggio, Melody};
use crate::error::{MidiGenError, Result};
use crate::theory::Ticks;
use serde::Serialize;

/// Represents a single MIDI track containing notes.
///
/// Notes within a track are sorted by start time. Notes with the same start
/// time keep the order in which they were added.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Track {
    /// Human-readable name for the track, usually the instrument name.
    name: String,

    /// MIDI channel (0-15). Channel 9 is reserved for drums in General MIDI.
    channel: u8,

    /// MIDI program number (0-127). Determines the instrument sound.
    program: u8,

    /// Collection of notes in this track, sorted by time.
    notes: Vec<Note>,
}

impl Track {
    /// Creates a new, empty track.
    ///
    /// # Arguments
    ///
    /// * `name` - Display name for the track
    /// * `channel` - MIDI channel (0-15)
    /// * `program` - General MIDI program number (0-127)
    ///
    /// # Errors
    ///
    /// `OutOfRange` for a channel above 15 or a program above 127.
    pub fn new(name: impl Into<String>, channel: u8, program: u8) -> Result<Self> {
        if channel >= MIDI_CHANNELS {
            return Err(MidiGenError::OutOfRange {
                what: "Channel",
                value: channel as i64,
            });
        }
        Ok(Self {
            name: name.into(),
            channel,
            program: check_midi_range("Program", program as i64)?,
            notes: Vec::new(),
        })
    }

    /// Creates a drum track on channel 9.
    pub fn new_drum_track(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            channel: DRUM_CHANNEL,
            program: 0,
            notes: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn channel(&self) -> u8 {
        self.channel
    }

    pub fn program(&self) -> u8 {
        self.program
    }

    pub fn is_drum_track(&self) -> bool {
        self.channel == DRUM_CHANNEL
    }

    /// Adds a note to the track, maintaining sorted order by time.
    pub fn add_note(&mut self, note: Note) {
        // after any notes with the same start
        let pos = self.notes.partition_point(|n| n.time() <= note.time());
        self.notes.insert(pos, note);
    }

    /// Adds every note of a chord.
    pub fn add_chord(&mut self, chord: &Chord) {
        for &note in chord.notes() {
            self.add_note(note);
        }
    }

    /// Adds every note of a melody.
    pub fn add_melody(&mut self, melody: &Melody) {
        for &note in melody.notes() {
            self.add_note(note);
        }
    }

    /// Expands an arpeggio and adds the resulting notes.
    ///
    /// # Errors
    ///
    /// Propagates `EmptyChord` / `InvalidDelay` from the expansion.
    pub fn add_arpeggio(&mut self, arpeggio: &Arpeggio) -> Result<()> {
        for note in arpeggio.expand()? {
            self.add_note(note);
        }
        Ok(())
    }

    /// Returns all notes in the track (sorted by time).
    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    /// Returns the total duration of the track in ticks.
    /// This is the end tick of the last-sounding note.
    pub fn duration_ticks(&self) -> Ticks {
        self.notes.iter().map(|n| n.end_time()).max().unwrap_or(0)
    }

    pub fn note_count(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compose::ArpeggioPattern;

    fn note(pitch: u8, duration: Ticks, time: Ticks) -> Note {
        Note::new(pitch, 100, duration, time).unwrap()
    }

    #[test]
    fn test_track_creation() {
        let track = Track::new("Piano", 0, 0).unwrap();
        assert_eq!(track.name(), "Piano");
        assert_eq!(track.channel(), 0);
        assert_eq!(track.program(), 0);
        assert!(!track.is_drum_track());
        assert!(Track::new_drum_track("Kit").is_drum_track());
    }

    #[test]
    fn test_track_rejects_bad_channel_and_program() {
        assert!(matches!(
            Track::new("Piano", 16, 0),
            Err(MidiGenError::OutOfRange { what: "Channel", value: 16 })
        ));
        assert!(matches!(
            Track::new("Piano", 0, 128),
            Err(MidiGenError::OutOfRange { what: "Program", value: 128 })
        ));
        assert_eq!(Track::new("Strings", 15, 127).unwrap().program(), 127);
    }

    #[test]
    fn test_add_notes_sorted() {
        let mut track = Track::new("Test", 0, 0).unwrap();
        track.add_note(note(60, 240, 480)); // Beat 2
        track.add_note(note(62, 240, 0)); // Beat 1
        track.add_note(note(64, 240, 960)); // Beat 3
        track.add_note(note(59, 240, 480));

        let times: Vec<Ticks> = track.notes().iter().map(|n| n.time()).collect();
        assert_eq!(times, vec![0, 480, 480, 960]);
        // same-time notes keep insertion order
        assert_eq!(track.notes()[1].pitch(), 60);
        assert_eq!(track.notes()[2].pitch(), 59);
    }

    #[test]
    fn test_duration() {
        let mut track = Track::new("Test", 0, 0).unwrap();
        assert_eq!(track.duration_ticks(), 0);

        track.add_note(note(60, 480, 0));
        assert_eq!(track.duration_ticks(), 480);

        track.add_note(note(62, 480, 960));
        assert_eq!(track.duration_ticks(), 1440);
    }

    #[test]
    fn test_add_chord_and_arpeggio() {
        let mut track = Track::new("Test", 0, 0).unwrap();
        let chord = Chord::from_pitches(&[60, 64, 67], 90, 480, 0).unwrap();
        track.add_chord(&chord);
        assert_eq!(track.note_count(), 3);

        let arpeggio = Arpeggio::from_chord(&chord, ArpeggioPattern::Ascending, 120, 2);
        track.add_arpeggio(&arpeggio).unwrap();
        assert_eq!(track.note_count(), 9);

        let empty = Arpeggio::new(vec![], ArpeggioPattern::Ascending, 120, 1);
        assert!(track.add_arpeggio(&empty).is_err());
    }
}
