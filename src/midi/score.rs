//! Compiled multi-track score.
//!
//! A score is what the compiler hands to the Standard MIDI File encoder:
//! global tempo, meter and key, plus one track per instrument.

use super::midi_export;
use super::track::Track;
use crate::error::Result;
use crate::theory::{Key, Ticks, TimeConverter, TimeSignature};
use midly::Smf;
use serde::Serialize;
use std::path::Path;

/// The compiled output of a song.
///
/// Tracks appear in the order instruments were registered. Each track is
/// owned by the score and never shared with another instrument.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Score {
    /// Tempo in beats per minute.
    tempo: u32,

    key: Key,

    /// Resolution and meter used to lay out every track.
    #[serde(flatten)]
    converter: TimeConverter,

    tracks: Vec<Track>,
}

impl Score {
    /// Creates an empty score.
    ///
    /// # Arguments
    ///
    /// * `tempo` - Tempo in beats per minute
    /// * `key` - Key written to the key-signature meta event
    /// * `converter` - Resolution and time signature of the score
    pub fn new(tempo: u32, key: Key, converter: TimeConverter) -> Self {
        Self {
            tempo,
            key,
            converter,
            tracks: Vec::new(),
        }
    }

    pub fn tempo(&self) -> u32 {
        self.tempo
    }

    pub fn key(&self) -> &Key {
        &self.key
    }

    pub fn time_signature(&self) -> TimeSignature {
        self.converter.time_signature()
    }

    pub fn ticks_per_quarter_note(&self) -> u32 {
        self.converter.ticks_per_quarter_note()
    }

    pub fn converter(&self) -> &TimeConverter {
        &self.converter
    }

    /// Returns all tracks in registration order.
    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    /// Returns the track for an instrument, if it has been compiled.
    pub fn track(&self, name: &str) -> Option<&Track> {
        self.tracks.iter().find(|t| t.name() == name)
    }

    pub fn track_count(&self) -> usize {
        self.tracks.len()
    }

    /// Puts a track into the score. A track with the same name is replaced
    /// where it stands; otherwise the track is appended.
    pub(crate) fn set_track(&mut self, track: Track) {
        match self.tracks.iter_mut().find(|t| t.name() == track.name()) {
            Some(existing) => *existing = track,
            None => self.tracks.push(track),
        }
    }

    /// Returns the end tick of the last-sounding note across all tracks.
    pub fn duration_ticks(&self) -> Ticks {
        self.tracks
            .iter()
            .map(|t| t.duration_ticks())
            .max()
            .unwrap_or(0)
    }

    /// Returns the total duration in seconds at the score's tempo.
    pub fn duration_seconds(&self) -> f64 {
        self.converter
            .ticks_to_seconds(self.duration_ticks(), self.tempo)
    }

    /// Calculates the measure and beat for a given tick position.
    ///
    /// Beats count in the time signature's beat unit, so 6/8 has six beats
    /// of an eighth note each.
    ///
    /// # Returns
    ///
    /// Tuple of (measure, beat, tick_within_beat); measure and beat are 1-indexed
    pub fn tick_to_position(&self, tick: Ticks) -> (u64, u64, Ticks) {
        let ticks_per_measure = self.converter.ticks_per_measure().max(1);
        let ticks_per_beat = self
            .converter
            .ticks_per_beat(self.time_signature())
            .max(1);

        let measure = tick / ticks_per_measure + 1;
        let tick_in_measure = tick % ticks_per_measure;
        let beat = tick_in_measure / ticks_per_beat + 1;
        let tick_in_beat = tick_in_measure % ticks_per_beat;

        (measure, beat, tick_in_beat)
    }

    /// Builds an in-memory Standard MIDI File borrowing this score's track names.
    ///
    /// # Errors
    ///
    /// `Export` when the tempo cannot be encoded or a delta time overflows.
    pub fn to_smf(&self) -> Result<Smf<'_>> {
        midi_export::to_smf(self)
    }

    /// Writes the score to a `.mid` file.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        midi_export::export_to_midi(self, path)
    }

    /// Serializes the score to pretty-printed JSON.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
