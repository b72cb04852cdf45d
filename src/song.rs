//! Songs: the declarative description a compiler turns into tracks.
//!
//! A song knows its key, tempo, meter, sections and instrument names. It
//! carries no channels, programs or ticks; those belong to
//! [`MidiCompiler`](crate::compiler::MidiCompiler).

use crate::compiler::MidiCompiler;
use crate::error::Result;
use crate::midi::Track;
use crate::theory::{ChordProgression, Key, Rhythm, TimeSignature, DEFAULT_TEMPO};
use serde::Serialize;
use std::path::Path;

/// A named stretch of the song with one chord progression.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Section {
    name: String,

    /// Length in measures.
    length: u32,

    chord_progression: ChordProgression,

    /// When set, chords are re-struck on this rhythm's hits instead of
    /// sounding once for their whole length.
    rhythm: Option<Rhythm>,
}

impl Section {
    /// Creates a section, parsing `progression` (e.g. `"I-V-vi-IV"`).
    ///
    /// # Errors
    ///
    /// Any parse error from [`ChordProgression::parse`].
    pub fn new(name: impl Into<String>, length: u32, progression: &str) -> Result<Self> {
        Ok(Self::from_progression(
            name,
            length,
            ChordProgression::parse(progression)?,
        ))
    }

    pub fn from_progression(
        name: impl Into<String>,
        length: u32,
        chord_progression: ChordProgression,
    ) -> Self {
        Self {
            name: name.into(),
            length,
            chord_progression,
            rhythm: None,
        }
    }

    pub fn with_rhythm(mut self, rhythm: Rhythm) -> Self {
        self.rhythm = Some(rhythm);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn length(&self) -> u32 {
        self.length
    }

    pub fn chord_progression(&self) -> &ChordProgression {
        &self.chord_progression
    }

    pub fn rhythm(&self) -> Option<&Rhythm> {
        self.rhythm.as_ref()
    }
}

/// A complete piece: global settings, sections in play order and the
/// instruments that perform them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Song {
    key: Key,
    tempo: u32,
    time_signature: TimeSignature,
    sections: Vec<Section>,
    /// Instrument names in registration order, without duplicates.
    instruments: Vec<String>,
}

impl Song {
    /// Creates an empty song in 4/4.
    pub fn new(key: Key, tempo: u32) -> Self {
        Self {
            key,
            tempo,
            time_signature: TimeSignature::COMMON,
            sections: Vec::new(),
            instruments: Vec::new(),
        }
    }

    pub fn with_time_signature(mut self, time_signature: TimeSignature) -> Self {
        self.time_signature = time_signature;
        self
    }

    /// Appends a section to the end of the song.
    pub fn add_section(&mut self, section: Section) -> &mut Self {
        self.sections.push(section);
        self
    }

    /// Registers an instrument by General MIDI name. Adding a name twice
    /// keeps its first position. Names are checked when the song is compiled.
    pub fn add_instrument(&mut self, name: impl Into<String>) -> &mut Self {
        let name = name.into();
        if !self.instruments.contains(&name) {
            self.instruments.push(name);
        }
        self
    }

    pub fn key(&self) -> &Key {
        &self.key
    }

    pub fn tempo(&self) -> u32 {
        self.tempo
    }

    pub fn time_signature(&self) -> TimeSignature {
        self.time_signature
    }

    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    pub fn instruments(&self) -> &[String] {
        &self.instruments
    }

    /// Total length of all sections in measures.
    pub fn total_measures(&self) -> u64 {
        self.sections.iter().map(|s| s.length as u64).sum()
    }

    /// Compiles one instrument and returns its track.
    ///
    /// # Errors
    ///
    /// `UnknownInstrument` when the catalog has no such instrument, plus any
    /// error from compiling the song's progressions.
    #[deprecated(note = "use MidiCompiler::compile_instrument instead")]
    pub fn generate(&self, instrument: &str, octave: i8) -> Result<Track> {
        tracing::warn!(
            instrument,
            "Song::generate is deprecated; use MidiCompiler::compile_instrument"
        );
        let mut compiler = MidiCompiler::new(self)?;
        compiler.add_instrument(instrument)?;
        compiler.compile_instrument(instrument, octave).cloned()
    }

    /// Compiles every instrument and writes a `.mid` file.
    #[deprecated(note = "use MidiCompiler::compile and Score::save instead")]
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        tracing::warn!("Song::save is deprecated; use MidiCompiler::compile and Score::save");
        let mut compiler = MidiCompiler::new(self)?;
        compiler.compile()?.save(path)
    }
}

impl Default for Song {
    fn default() -> Self {
        Self::new(Key::default(), DEFAULT_TEMPO)
    }
}
