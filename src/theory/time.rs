//! Conversion between musical time (measures, beats, note values) and ticks.
//!
//! All arithmetic is done on exact rationals. The only rounding happens when a
//! rational tick count is turned into an integer, and that rounding is
//! half-up: 0.5 ticks becomes 1.

use crate::error::{MidiGenError, Result};
use num_rational::Ratio;
use serde::{Deserialize, Serialize};

/// Absolute or relative time in MIDI ticks.
pub type Ticks = u64;

/// Ticks per quarter note used when nothing else is configured.
pub const DEFAULT_TICKS_PER_QUARTER: u32 = 480;

/// Largest resolution expressible in a metrical SMF header (15 bits).
pub const MAX_TICKS_PER_QUARTER: u32 = 0x7FFF;

/// Default tempo in beats per minute.
pub const DEFAULT_TEMPO: u32 = 120;

/// Base note values expressed in quarter notes.
const NOTE_VALUES: [(&str, u64, u64); 6] = [
    ("whole", 4, 1),
    ("half", 2, 1),
    ("quarter", 1, 1),
    ("eighth", 1, 2),
    ("sixteenth", 1, 4),
    ("thirty_second", 1, 8),
];

#[derive(Deserialize)]
struct RawTimeSignature {
    numerator: u8,
    denominator: u8,
}

/// A time signature such as 4/4 or 6/8.
///
/// The denominator is always a power of two and the numerator is never zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawTimeSignature")]
pub struct TimeSignature {
    numerator: u8,
    denominator: u8,
}

impl TimeSignature {
    /// Common time.
    pub const COMMON: TimeSignature = TimeSignature {
        numerator: 4,
        denominator: 4,
    };

    /// Creates a validated time signature.
    ///
    /// # Errors
    ///
    /// `InvalidTimeSignature` when the numerator is zero or the denominator
    /// is not a power of two.
    pub fn new(numerator: u8, denominator: u8) -> Result<Self> {
        if numerator == 0 || !denominator.is_power_of_two() {
            return Err(MidiGenError::InvalidTimeSignature {
                numerator,
                denominator,
            });
        }
        Ok(Self {
            numerator,
            denominator,
        })
    }

    pub fn numerator(&self) -> u8 {
        self.numerator
    }

    pub fn denominator(&self) -> u8 {
        self.denominator
    }

    /// The denominator as a power of two (4 -> 2, 8 -> 3), as SMF stores it.
    pub fn denominator_power(&self) -> u8 {
        self.denominator.trailing_zeros() as u8
    }

    /// Length of one measure counted in quarter notes (3/4 -> 3, 6/8 -> 3).
    pub fn quarters_per_measure(&self) -> Ratio<u64> {
        Ratio::new(self.numerator as u64 * 4, self.denominator as u64)
    }
}

impl Default for TimeSignature {
    fn default() -> Self {
        Self::COMMON
    }
}

impl TryFrom<RawTimeSignature> for TimeSignature {
    type Error = MidiGenError;

    fn try_from(raw: RawTimeSignature) -> Result<Self> {
        TimeSignature::new(raw.numerator, raw.denominator)
    }
}

impl std::fmt::Display for TimeSignature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.numerator, self.denominator)
    }
}

/// Converts between ticks and musical units for one resolution and a default
/// time signature. Cheap to copy and never mutated after construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TimeConverter {
    ticks_per_quarter_note: u32,
    time_signature: TimeSignature,
}

impl TimeConverter {
    /// Creates a converter with the given resolution and a 4/4 default signature.
    ///
    /// # Errors
    ///
    /// `InvalidResolution` when `ticks_per_quarter_note` is zero or does not
    /// fit the 15-bit SMF division field.
    pub fn new(ticks_per_quarter_note: u32) -> Result<Self> {
        if ticks_per_quarter_note == 0 || ticks_per_quarter_note > MAX_TICKS_PER_QUARTER {
            return Err(MidiGenError::InvalidResolution(ticks_per_quarter_note));
        }
        Ok(Self {
            ticks_per_quarter_note,
            time_signature: TimeSignature::COMMON,
        })
    }

    /// Returns a copy using `time_signature` as the default for measure conversions.
    pub fn with_time_signature(mut self, time_signature: TimeSignature) -> Self {
        self.time_signature = time_signature;
        self
    }

    pub fn ticks_per_quarter_note(&self) -> u32 {
        self.ticks_per_quarter_note
    }

    pub fn time_signature(&self) -> TimeSignature {
        self.time_signature
    }

    /// Rounds a rational quarter-note count to ticks, half-up.
    fn quarters_to_ticks(&self, quarters: Ratio<u64>) -> Ticks {
        (quarters * self.ticks_per_quarter_note as u64)
            .round()
            .to_integer()
    }

    /// Converts measures in the default time signature to ticks.
    ///
    /// ```
    /// use midigen::theory::TimeConverter;
    ///
    /// let tc = TimeConverter::default();
    /// assert_eq!(tc.measures_to_ticks(1u64), 1920);
    /// ```
    pub fn measures_to_ticks(&self, measures: impl Into<Ratio<u64>>) -> Ticks {
        self.measures_to_ticks_in(measures, self.time_signature)
    }

    /// Converts measures in an explicit time signature to ticks:
    /// `measures * numerator * (4 / denominator) * ticks_per_quarter_note`.
    pub fn measures_to_ticks_in(
        &self,
        measures: impl Into<Ratio<u64>>,
        time_signature: TimeSignature,
    ) -> Ticks {
        self.quarters_to_ticks(measures.into() * time_signature.quarters_per_measure())
    }

    /// Converts quarter-note beats to ticks.
    pub fn beats_to_ticks(&self, beats: impl Into<Ratio<u64>>) -> Ticks {
        self.quarters_to_ticks(beats.into())
    }

    /// Exact inverse of [`beats_to_ticks`](Self::beats_to_ticks).
    pub fn ticks_to_beats(&self, ticks: Ticks) -> Ratio<u64> {
        Ratio::new(ticks, self.ticks_per_quarter_note as u64)
    }

    /// Exact inverse of [`measures_to_ticks`](Self::measures_to_ticks).
    pub fn ticks_to_measures(&self, ticks: Ticks) -> Ratio<u64> {
        self.ticks_to_measures_in(ticks, self.time_signature)
    }

    pub fn ticks_to_measures_in(&self, ticks: Ticks, time_signature: TimeSignature) -> Ratio<u64> {
        self.ticks_to_beats(ticks) / time_signature.quarters_per_measure()
    }

    /// Ticks in one measure of the default time signature.
    pub fn ticks_per_measure(&self) -> Ticks {
        self.measures_to_ticks(1u64)
    }

    /// Ticks in one beat of `time_signature` (an eighth note in 6/8).
    pub fn ticks_per_beat(&self, time_signature: TimeSignature) -> Ticks {
        self.quarters_to_ticks(Ratio::new(4, time_signature.denominator() as u64))
    }

    /// Looks up the length of a named note value.
    ///
    /// Accepts `whole`, `half`, `quarter`, `eighth`, `sixteenth` and
    /// `thirty_second`, each optionally prefixed with `dotted_` (x1.5) or
    /// `triplet_` (x2/3).
    ///
    /// # Errors
    ///
    /// `UnknownNoteDuration` for any other name.
    pub fn note_duration(&self, name: &str) -> Result<Ticks> {
        let (base, modifier) = if let Some(rest) = name.strip_prefix("dotted_") {
            (rest, Ratio::new(3, 2))
        } else if let Some(rest) = name.strip_prefix("triplet_") {
            (rest, Ratio::new(2, 3))
        } else {
            (name, Ratio::from_integer(1))
        };

        NOTE_VALUES
            .iter()
            .find(|(value_name, _, _)| *value_name == base)
            .map(|&(_, numer, denom)| self.quarters_to_ticks(Ratio::new(numer, denom) * modifier))
            .ok_or_else(|| MidiGenError::UnknownNoteDuration(name.to_string()))
    }

    /// Converts ticks to seconds at a tempo in beats per minute.
    pub fn ticks_to_seconds(&self, ticks: Ticks, tempo: u32) -> f64 {
        let beats = ticks as f64 / self.ticks_per_quarter_note as f64;
        beats * 60.0 / tempo.max(1) as f64
    }

    /// BPM to the microseconds-per-quarter value carried by MIDI tempo events.
    pub fn bpm_to_microseconds_per_quarter(bpm: u32) -> u32 {
        60_000_000 / bpm.max(1)
    }

    pub fn microseconds_per_quarter_to_bpm(microseconds: u32) -> f64 {
        60_000_000.0 / microseconds.max(1) as f64
    }
}

impl Default for TimeConverter {
    fn default() -> Self {
        Self {
            ticks_per_quarter_note: DEFAULT_TICKS_PER_QUARTER,
            time_signature: TimeSignature::COMMON,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_measures_to_ticks() {
        let tc = TimeConverter::default();
        assert_eq!(tc.measures_to_ticks(1u64), 1920);
        assert_eq!(tc.measures_to_ticks(8u64), 15360);

        let three_four = TimeSignature::new(3, 4).unwrap();
        assert_eq!(tc.measures_to_ticks_in(1u64, three_four), 1440);

        let six_eight = TimeSignature::new(6, 8).unwrap();
        assert_eq!(tc.measures_to_ticks_in(2u64, six_eight), 2880);
    }

    #[test]
    fn test_fractional_measures_round_half_up() {
        // 1/3 of a measure at 100 tpq: 400/3 = 133.33 -> 133
        let tc = TimeConverter::new(100).unwrap();
        assert_eq!(tc.measures_to_ticks(Ratio::new(1, 3)), 133);
        // 7/8 beat at 4 tpq: 3.5 -> 4
        let tc = TimeConverter::new(4).unwrap();
        assert_eq!(tc.beats_to_ticks(Ratio::new(7, 8)), 4);
    }

    #[test]
    fn test_round_trip_is_exact() {
        let tc = TimeConverter::default();
        for measures in 0u64..64 {
            let ticks = tc.measures_to_ticks(measures);
            assert_eq!(tc.ticks_to_measures(ticks), Ratio::from_integer(measures));
        }
        for beats in 0u64..64 {
            let ticks = tc.beats_to_ticks(beats);
            assert_eq!(tc.ticks_to_beats(ticks), Ratio::from_integer(beats));
        }
        let half = Ratio::new(1, 2);
        assert_eq!(tc.ticks_to_measures(tc.measures_to_ticks(half)), half);

        let seven_eight = TimeSignature::new(7, 8).unwrap();
        let ticks = tc.measures_to_ticks_in(5u64, seven_eight);
        assert_eq!(
            tc.ticks_to_measures_in(ticks, seven_eight),
            Ratio::from_integer(5)
        );
    }

    #[test]
    fn test_note_durations() {
        let tc = TimeConverter::new(480).unwrap();
        assert_eq!(tc.note_duration("quarter").unwrap(), 480);
        assert_eq!(tc.note_duration("whole").unwrap(), 1920);
        assert_eq!(tc.note_duration("thirty_second").unwrap(), 60);
        assert_eq!(tc.note_duration("dotted_quarter").unwrap(), 720);
        assert_eq!(tc.note_duration("dotted_half").unwrap(), 1440);
        assert_eq!(tc.note_duration("triplet_eighth").unwrap(), 160);
        assert_eq!(tc.note_duration("triplet_quarter").unwrap(), 320);
        assert!(matches!(
            tc.note_duration("crotchet"),
            Err(MidiGenError::UnknownNoteDuration(_))
        ));
    }

    #[test]
    fn test_invalid_time_signatures() {
        assert!(TimeSignature::new(4, 3).is_err());
        assert!(TimeSignature::new(0, 4).is_err());
        assert!(TimeSignature::new(5, 0).is_err());
        assert!(TimeSignature::new(5, 16).is_ok());
        assert_eq!(TimeSignature::new(6, 8).unwrap().denominator_power(), 3);
    }

    #[test]
    fn test_invalid_resolution() {
        assert!(matches!(
            TimeConverter::new(0),
            Err(MidiGenError::InvalidResolution(0))
        ));
        assert!(TimeConverter::new(40_000).is_err());
    }

    #[test]
    fn test_ticks_per_beat() {
        let tc = TimeConverter::default();
        assert_eq!(tc.ticks_per_beat(TimeSignature::COMMON), 480);
        assert_eq!(tc.ticks_per_beat(TimeSignature::new(6, 8).unwrap()), 240);
        assert_eq!(tc.ticks_per_measure(), 1920);
    }

    #[test]
    fn test_tempo_conversions() {
        assert_eq!(TimeConverter::bpm_to_microseconds_per_quarter(120), 500_000);
        assert!((TimeConverter::microseconds_per_quarter_to_bpm(500_000) - 120.0).abs() < 1e-9);

        let tc = TimeConverter::default();
        assert!((tc.ticks_to_seconds(480, 120) - 0.5).abs() < 0.001);
    }

    #[test]
    fn test_time_signature_deserialize_validates() {
        let sig: TimeSignature =
            serde_json::from_str(r#"{"numerator": 3, "denominator": 4}"#).unwrap();
        assert_eq!(sig, TimeSignature::new(3, 4).unwrap());
        assert!(serde_json::from_str::<TimeSignature>(r#"{"numerator": 3, "denominator": 6}"#)
            .is_err());
    }
}
