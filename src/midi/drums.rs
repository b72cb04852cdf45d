//! Drum kits: percussion hits addressed by General MIDI drum name.

use super::catalog::{GeneralMidi, InstrumentCatalog};
use super::note::Note;
use crate::error::{MidiGenError, Result};
use crate::theory::{Rhythm, Ticks};
use serde::Serialize;

/// A collection of percussion hits destined for the drum channel.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DrumKit {
    hits: Vec<Note>,
}

impl DrumKit {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds one hit looked up in the General MIDI percussion map.
    ///
    /// # Errors
    ///
    /// `UnknownDrumName` when `name` is not a GM drum, `OutOfRange` for a
    /// velocity above 127.
    pub fn add_drum(
        &mut self,
        name: &str,
        velocity: u8,
        duration: Ticks,
        time: Ticks,
    ) -> Result<()> {
        self.add_drum_from(&GeneralMidi, name, velocity, duration, time)
    }

    /// Like [`add_drum`](Self::add_drum) with a caller-supplied catalog.
    pub fn add_drum_from<C: InstrumentCatalog + ?Sized>(
        &mut self,
        catalog: &C,
        name: &str,
        velocity: u8,
        duration: Ticks,
        time: Ticks,
    ) -> Result<()> {
        let key = catalog
            .drum_key(name)
            .ok_or_else(|| MidiGenError::UnknownDrumName(name.to_string()))?;
        self.hits.push(Note::new(key, velocity, duration, time)?);
        Ok(())
    }

    /// Plays `name` on every hit of `rhythm`, looped from `start` for `span`
    /// ticks. Each hit lasts as long as its run of `x` steps.
    pub fn add_pattern(
        &mut self,
        name: &str,
        rhythm: &Rhythm,
        velocity: u8,
        start: Ticks,
        span: Ticks,
    ) -> Result<()> {
        for (time, duration) in rhythm.hits(start, span) {
            self.add_drum(name, velocity, duration, time)?;
        }
        Ok(())
    }

    /// The hits in the order they were added.
    pub fn hits(&self) -> &[Note] {
        &self.hits
    }

    pub fn len(&self) -> usize {
        self.hits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }
}
