//! Error types for song compilation.
//!
//! Every failure is local and synchronous: the pipeline is pure, so the same
//! inputs always fail the same way and nothing here is retryable.

use thiserror::Error;

/// Errors produced anywhere in the theory, composition, or compilation layers.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MidiGenError {
    /// Time signature with a zero numerator or a denominator that is not a power of two.
    #[error("Invalid time signature {numerator}/{denominator}")]
    InvalidTimeSignature { numerator: u8, denominator: u8 },

    /// Ticks per quarter note outside 1..=32767.
    #[error("Invalid resolution: {0} ticks per quarter note")]
    InvalidResolution(u32),

    /// Scale degrees are 1-based.
    #[error("Invalid scale degree {0}: degrees start at 1")]
    InvalidDegree(i32),

    #[error("Cannot parse Roman numeral '{0}'")]
    InvalidRomanNumeral(String),

    #[error("Unknown chord quality '{0}'")]
    UnknownChordQuality(String),

    /// Two positional sequences that must be zipped have different lengths.
    #[error("Length mismatch: {left} {what} vs {right}")]
    LengthMismatch {
        what: &'static str,
        left: usize,
        right: usize,
    },

    /// Pitch or velocity outside the MIDI range 0..=127.
    #[error("{what} {value} is outside the MIDI range 0-127")]
    OutOfRange { what: &'static str, value: i64 },

    #[error("Chord has no notes")]
    EmptyChord,

    #[error("Invalid arpeggio delay {0}: must be non-negative")]
    InvalidDelay(i64),

    #[error("Unknown instrument '{0}'")]
    UnknownInstrument(String),

    #[error("Unknown drum name '{0}'")]
    UnknownDrumName(String),

    #[error("Unknown note duration '{0}'")]
    UnknownNoteDuration(String),

    #[error("Invalid note name '{0}'")]
    InvalidNoteName(String),

    #[error("Melody has no notes")]
    EmptyMelody,

    #[error("Pitch {0} is not in the scale")]
    NotInScale(u8),

    #[error("Invalid key '{tonic} {mode}'")]
    InvalidKey { tonic: String, mode: String },

    #[error("Unknown scale type '{0}'")]
    UnknownScaleType(String),

    #[error("Invalid progression: {0}")]
    InvalidProgression(String),

    /// Notes passed to a chord do not share a start time.
    #[error("Chord notes start at different times ({0} and {1})")]
    ChordTimeMismatch(u64, u64),

    #[error("Invalid rhythm pattern '{0}'")]
    InvalidRhythm(String),

    /// All 15 melodic channels are allocated.
    #[error("Cannot add instrument '{0}': all 15 melodic channels are in use")]
    ChannelExhausted(String),

    #[error("MIDI export failed: {0}")]
    Export(String),

    /// A song file could not be parsed.
    #[error("Invalid song file: {0}")]
    Config(String),
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, MidiGenError>;

impl MidiGenError {
    pub(crate) fn pitch_out_of_range(value: i64) -> Self {
        MidiGenError::OutOfRange {
            what: "Pitch",
            value,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = MidiGenError::InvalidTimeSignature {
            numerator: 3,
            denominator: 5,
        };
        assert_eq!(err.to_string(), "Invalid time signature 3/5");

        let err = MidiGenError::LengthMismatch {
            what: "degrees",
            left: 4,
            right: 3,
        };
        assert_eq!(err.to_string(), "Length mismatch: 4 degrees vs 3");

        let err = MidiGenError::pitch_out_of_range(130);
        assert_eq!(err.to_string(), "Pitch 130 is outside the MIDI range 0-127");
    }
}
