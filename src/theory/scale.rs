//! Scale types and degree-to-pitch mapping.

use crate::error::{MidiGenError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Every scale the engine knows, identified by its interval pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScaleType {
    Major,
    Minor,
    HarmonicMinor,
    MelodicMinor,
    MajorPentatonic,
    MinorPentatonic,
    Blues,
    Ionian,
    Dorian,
    Phrygian,
    Lydian,
    Mixolydian,
    Aeolian,
    Locrian,
    WholeTone,
    /// Half-whole octatonic.
    Diminished,
    Chromatic,
}

impl ScaleType {
    pub const ALL: [ScaleType; 17] = [
        ScaleType::Major,
        ScaleType::Minor,
        ScaleType::HarmonicMinor,
        ScaleType::MelodicMinor,
        ScaleType::MajorPentatonic,
        ScaleType::MinorPentatonic,
        ScaleType::Blues,
        ScaleType::Ionian,
        ScaleType::Dorian,
        ScaleType::Phrygian,
        ScaleType::Lydian,
        ScaleType::Mixolydian,
        ScaleType::Aeolian,
        ScaleType::Locrian,
        ScaleType::WholeTone,
        ScaleType::Diminished,
        ScaleType::Chromatic,
    ];

    /// Semitone offsets from the root, ascending, starting at 0.
    pub fn intervals(self) -> &'static [u8] {
        match self {
            ScaleType::Major | ScaleType::Ionian => &[0, 2, 4, 5, 7, 9, 11],
            ScaleType::Minor | ScaleType::Aeolian => &[0, 2, 3, 5, 7, 8, 10],
            ScaleType::HarmonicMinor => &[0, 2, 3, 5, 7, 8, 11],
            ScaleType::MelodicMinor => &[0, 2, 3, 5, 7, 9, 11],
            ScaleType::MajorPentatonic => &[0, 2, 4, 7, 9],
            ScaleType::MinorPentatonic => &[0, 3, 5, 7, 10],
            ScaleType::Blues => &[0, 3, 5, 6, 7, 10],
            ScaleType::Dorian => &[0, 2, 3, 5, 7, 9, 10],
            ScaleType::Phrygian => &[0, 1, 3, 5, 7, 8, 10],
            ScaleType::Lydian => &[0, 2, 4, 6, 7, 9, 11],
            ScaleType::Mixolydian => &[0, 2, 4, 5, 7, 9, 10],
            ScaleType::Locrian => &[0, 1, 3, 5, 6, 8, 10],
            ScaleType::WholeTone => &[0, 2, 4, 6, 8, 10],
            ScaleType::Diminished => &[0, 1, 3, 4, 6, 7, 9, 10],
            ScaleType::Chromatic => &[0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11],
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ScaleType::Major => "major",
            ScaleType::Minor => "minor",
            ScaleType::HarmonicMinor => "harmonic_minor",
            ScaleType::MelodicMinor => "melodic_minor",
            ScaleType::MajorPentatonic => "major_pentatonic",
            ScaleType::MinorPentatonic => "minor_pentatonic",
            ScaleType::Blues => "blues",
            ScaleType::Ionian => "ionian",
            ScaleType::Dorian => "dorian",
            ScaleType::Phrygian => "phrygian",
            ScaleType::Lydian => "lydian",
            ScaleType::Mixolydian => "mixolydian",
            ScaleType::Aeolian => "aeolian",
            ScaleType::Locrian => "locrian",
            ScaleType::WholeTone => "whole_tone",
            ScaleType::Diminished => "diminished",
            ScaleType::Chromatic => "chromatic",
        }
    }

    /// Parses a scale name, ignoring case and treating spaces and hyphens
    /// as underscores ("Harmonic Minor", "whole-tone").
    pub fn from_name(name: &str) -> Result<Self> {
        let normalized = name.trim().to_lowercase().replace([' ', '-'], "_");
        ScaleType::ALL
            .into_iter()
            .find(|scale_type| scale_type.name() == normalized)
            .ok_or_else(|| MidiGenError::UnknownScaleType(name.to_string()))
    }

    /// Seven-tone scales, the only ones a key can be built on.
    pub fn is_heptatonic(self) -> bool {
        self.intervals().len() == 7
    }
}

impl fmt::Display for ScaleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ScaleType {
    type Err = MidiGenError;

    fn from_str(s: &str) -> Result<Self> {
        ScaleType::from_name(s)
    }
}

/// A scale rooted on a concrete MIDI pitch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Scale {
    root: u8,
    scale_type: ScaleType,
}

impl Scale {
    /// Middle-C major, the default key's scale.
    pub const C_MAJOR: Scale = Scale {
        root: 60,
        scale_type: ScaleType::Major,
    };

    /// Builds a scale on `root`.
    ///
    /// # Errors
    ///
    /// `OutOfRange` when `root` is above 127.
    pub fn build(root: u8, scale_type: ScaleType) -> Result<Self> {
        if root > 127 {
            return Err(MidiGenError::pitch_out_of_range(root as i64));
        }
        Ok(Self { root, scale_type })
    }

    pub fn root(&self) -> u8 {
        self.root
    }

    pub fn scale_type(&self) -> ScaleType {
        self.scale_type
    }

    pub fn intervals(&self) -> &'static [u8] {
        self.scale_type.intervals()
    }

    /// Number of tones per octave.
    pub fn len(&self) -> usize {
        self.intervals().len()
    }

    pub fn is_empty(&self) -> bool {
        self.intervals().is_empty()
    }

    /// Maps a 1-based degree to a pitch. Degrees past the scale length wrap
    /// into higher octaves, so degree 8 of a major scale is the root plus 12.
    ///
    /// ```
    /// use midigen::theory::{Scale, ScaleType};
    ///
    /// let c_major = Scale::build(60, ScaleType::Major).unwrap();
    /// assert_eq!(c_major.degree_to_pitch(1).unwrap(), 60);
    /// assert_eq!(c_major.degree_to_pitch(8).unwrap(), 72);
    /// ```
    ///
    /// # Errors
    ///
    /// `InvalidDegree` for degrees below 1, `OutOfRange` when the pitch would
    /// exceed 127.
    pub fn degree_to_pitch(&self, degree: i32) -> Result<u8> {
        if degree < 1 {
            return Err(MidiGenError::InvalidDegree(degree));
        }
        let len = self.len() as i64;
        let zero_based = degree as i64 - 1;
        let octave = zero_based / len;
        let interval = self.intervals()[(zero_based % len) as usize] as i64;

        let pitch = self.root as i64 + 12 * octave + interval;
        if pitch > 127 {
            return Err(MidiGenError::pitch_out_of_range(pitch));
        }
        Ok(pitch as u8)
    }

    /// The scale's tones within one octave of the root, capped at 127.
    pub fn pitches(&self) -> Vec<u8> {
        self.intervals()
            .iter()
            .map(|&interval| self.root as u16 + interval as u16)
            .filter(|&pitch| pitch <= 127)
            .map(|pitch| pitch as u8)
            .collect()
    }

    /// Every scale tone in `low..=high`, ascending.
    pub fn pitches_in_range(&self, low: u8, high: u8) -> Vec<u8> {
        (low..=high.min(127)).filter(|&p| self.contains(p)).collect()
    }

    /// Pitch-class membership: any octave of a scale tone counts.
    pub fn contains(&self, pitch: u8) -> bool {
        let pitch_class = (pitch as i32 - self.root as i32).rem_euclid(12) as u8;
        self.intervals().contains(&pitch_class)
    }

    /// Moves `pitch` to the nearest scale tone inside 0..=127. When two tones
    /// are equally close the lower one wins.
    pub fn snap(&self, pitch: u8) -> u8 {
        let pitch = pitch.min(127);
        for offset in 0..=12u8 {
            if let Some(lower) = pitch.checked_sub(offset) {
                if self.contains(lower) {
                    return lower;
                }
            }
            let upper = pitch.saturating_add(offset);
            if upper <= 127 && self.contains(upper) {
                return upper;
            }
        }
        pitch
    }
}

impl Default for Scale {
    fn default() -> Self {
        Self::C_MAJOR
    }
}
