//! Compiler settings and the JSON song-file format.
//!
//! A song file describes a whole song in one document:
//!
//! ```json
//! {
//!   "key": "A",
//!   "mode": "minor",
//!   "tempo": 96,
//!   "time_signature": { "numerator": 4, "denominator": 4 },
//!   "sections": [
//!     { "name": "Verse", "length": 8, "progression": "i-VI-III-VII" },
//!     { "name": "Chorus", "length": 4, "progression": "iv v i", "rhythm": "tresillo" }
//!   ],
//!   "instruments": [
//!     { "name": "Acoustic Grand Piano" },
//!     { "name": "Acoustic Bass", "octave": 2 }
//!   ],
//!   "drums": [
//!     { "drum": "Bass Drum 1", "rhythm": "four_on_the_floor" },
//!     { "drum": "Closed Hi Hat", "rhythm": { "pattern": "x.x.", "step": 120 }, "velocity": 60 }
//!   ]
//! }
//! ```
//!
//! Everything is checked by the same constructors the library API uses, so a
//! file that parses always describes a valid song.

use crate::compiler::MidiCompiler;
use crate::error::{MidiGenError, Result};
use crate::midi::{DrumKit, Score, DEFAULT_VELOCITY, REFERENCE_OCTAVE};
use crate::song::{Section, Song};
use crate::theory::{
    Key, Rhythm, TimeConverter, TimeSignature, DEFAULT_STEP, DEFAULT_TEMPO,
    DEFAULT_TICKS_PER_QUARTER,
};
use serde::{Deserialize, Serialize};

/// Name of the drum track built from a song file's `drums` entries.
pub const DRUM_TRACK_NAME: &str = "Drums";

/// Settings that shape compiled output without being part of the music.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompilerConfig {
    /// MIDI resolution.
    pub ticks_per_quarter_note: u32,

    /// Velocity of every chord note.
    pub velocity: u8,

    /// Octave the key's chords are voiced in. Instruments placed in this
    /// octave sound at the resolved pitches; each octave away shifts by 12.
    pub reference_octave: i8,

    /// Meter for song files that do not give one.
    pub time_signature: TimeSignature,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            ticks_per_quarter_note: DEFAULT_TICKS_PER_QUARTER,
            velocity: DEFAULT_VELOCITY,
            reference_octave: REFERENCE_OCTAVE,
            time_signature: TimeSignature::COMMON,
        }
    }
}

/// A rhythm given either by library name / literal pattern, or in full.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum RhythmSpec {
    /// `"tresillo"` or `"x..x..x."`, stepping in sixteenths.
    Named(String),
    Full(Rhythm),
}

impl RhythmSpec {
    /// # Errors
    ///
    /// `InvalidRhythm` when the name is neither in the library nor a valid pattern.
    pub fn to_rhythm(&self) -> Result<Rhythm> {
        match self {
            RhythmSpec::Named(name) => Rhythm::from_library(name, DEFAULT_STEP)
                .or_else(|_| Rhythm::new(name, DEFAULT_STEP)),
            RhythmSpec::Full(rhythm) => Ok(rhythm.clone()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SectionSpec {
    pub name: String,
    /// Length in measures.
    pub length: u32,
    pub progression: String,
    #[serde(default)]
    pub rhythm: Option<RhythmSpec>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct InstrumentSpec {
    pub name: String,
    /// Defaults to the reference octave.
    #[serde(default)]
    pub octave: Option<i8>,
}

/// One drum played on a rhythm across the whole song.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DrumSpec {
    pub drum: String,
    pub rhythm: RhythmSpec,
    #[serde(default = "default_drum_velocity")]
    pub velocity: u8,
}

fn default_drum_velocity() -> u8 {
    100
}

fn default_mode() -> String {
    "major".to_string()
}

fn default_tempo() -> u32 {
    DEFAULT_TEMPO
}

/// A song as written in a JSON song file.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SongFile {
    /// Tonic name such as `"C"`, `"F#"` or `"Bb"`.
    pub key: String,
    #[serde(default = "default_mode")]
    pub mode: String,
    #[serde(default = "default_tempo")]
    pub tempo: u32,
    #[serde(default)]
    pub time_signature: Option<TimeSignature>,
    pub sections: Vec<SectionSpec>,
    #[serde(default)]
    pub instruments: Vec<InstrumentSpec>,
    #[serde(default)]
    pub drums: Vec<DrumSpec>,
}

impl SongFile {
    /// Parses a song file.
    ///
    /// # Errors
    ///
    /// `Config` for malformed JSON, missing fields, or values rejected while
    /// deserializing (an invalid time signature, for instance).
    pub fn parse(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| MidiGenError::Config(e.to_string()))
    }

    /// Builds the declarative song. `config` supplies the meter when the file
    /// has none.
    pub fn build_song(&self, config: &CompilerConfig) -> Result<Song> {
        let key = Key::new(&self.key, &self.mode)?;
        let mut song = Song::new(key, self.tempo)
            .with_time_signature(self.time_signature.unwrap_or(config.time_signature));

        for spec in &self.sections {
            let mut section = Section::new(spec.name.as_str(), spec.length, &spec.progression)?;
            if let Some(rhythm) = &spec.rhythm {
                section = section.with_rhythm(rhythm.to_rhythm()?);
            }
            song.add_section(section);
        }
        for instrument in &self.instruments {
            song.add_instrument(instrument.name.as_str());
        }
        Ok(song)
    }

    /// Lays the drum entries over the whole length of `song`.
    fn build_drums(&self, song: &Song, converter: &TimeConverter) -> Result<DrumKit> {
        let span = converter.measures_to_ticks(song.total_measures());
        let mut kit = DrumKit::new();
        for spec in &self.drums {
            kit.add_pattern(&spec.drum, &spec.rhythm.to_rhythm()?, spec.velocity, 0, span)?;
        }
        Ok(kit)
    }

    /// Builds and compiles the song.
    pub fn compile(&self, config: CompilerConfig) -> Result<Score> {
        let song = self.build_song(&config)?;
        let mut compiler = MidiCompiler::with_config(&song, config)?;

        for instrument in &self.instruments {
            let octave = instrument.octave.unwrap_or(config.reference_octave);
            compiler.add_instrument_in_octave(&instrument.name, octave)?;
        }
        if !self.drums.is_empty() {
            let kit = self.build_drums(&song, compiler.converter())?;
            compiler.add_drums(DRUM_TRACK_NAME, kit);
        }

        compiler.compile()?;
        Ok(compiler.into_score())
    }
}
