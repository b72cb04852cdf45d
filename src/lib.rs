//! midigen - compiles songs written in music-theory terms into MIDI.
//!
//! A [`Song`] names a key, a tempo, sections with Roman-numeral chord
//! progressions and the instruments that play them. [`MidiCompiler`] resolves
//! the progressions with voice leading, lays them out in ticks and produces a
//! [`Score`] of per-instrument tracks that can be written as a Standard MIDI
//! File.
//!
//! The building blocks are public too: [`theory`] holds scales, keys, chords,
//! progressions and time conversion, [`compose`] generates melodies and
//! arpeggios, and [`midi`] holds notes, tracks and the file encoder.

pub mod compiler;
pub mod compose;
pub mod config;
pub mod error;
pub mod midi;
pub mod song;
pub mod theory;

// Re-export commonly used types
pub use compiler::MidiCompiler;
pub use config::{CompilerConfig, SongFile};
pub use error::{MidiGenError, Result};
pub use midi::{Chord, Note, Score, Track};
pub use song::{Section, Song};
