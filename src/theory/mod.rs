//! Music theory: time, scales, keys, chords, progressions and rhythms.

pub mod chord;
mod key;
mod progression;
mod rhythm;
mod scale;
mod time;

pub use chord::{Accidental, ChordQuality, ChordSymbol, NamedChord};
pub use key::Key;
pub use progression::{ChordProgression, ProgressionStep, TimedChord, MAX_EXPLICIT_BEATS};
pub use rhythm::{Rhythm, RhythmEvent, DEFAULT_STEP, RHYTHM_LIBRARY};
pub use scale::{Scale, ScaleType};
pub use time::{
    Ticks, TimeConverter, TimeSignature, DEFAULT_TEMPO, DEFAULT_TICKS_PER_QUARTER,
    MAX_TICKS_PER_QUARTER,
};
