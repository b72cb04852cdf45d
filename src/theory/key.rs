//! Musical keys: a tonic name plus a seven-tone mode.

use super::scale::{Scale, ScaleType};
use crate::error::{MidiGenError, Result};
use crate::midi::{pitch_class_offset, REFERENCE_OCTAVE};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Sharps (positive) or flats (negative) for major keys by tonic spelling.
const MAJOR_SIGNATURES: [(&str, i8); 15] = [
    ("C", 0),
    ("G", 1),
    ("D", 2),
    ("A", 3),
    ("E", 4),
    ("B", 5),
    ("F#", 6),
    ("C#", 7),
    ("F", -1),
    ("Bb", -2),
    ("Eb", -3),
    ("Ab", -4),
    ("Db", -5),
    ("Gb", -6),
    ("Cb", -7),
];

const MINOR_SIGNATURES: [(&str, i8); 15] = [
    ("A", 0),
    ("E", 1),
    ("B", 2),
    ("F#", 3),
    ("C#", 4),
    ("G#", 5),
    ("D#", 6),
    ("A#", 7),
    ("D", -1),
    ("G", -2),
    ("C", -3),
    ("F", -4),
    ("Bb", -5),
    ("Eb", -6),
    ("Ab", -7),
];

#[derive(Deserialize)]
struct RawKey {
    tonic: String,
    #[serde(default = "default_mode")]
    mode: String,
}

fn default_mode() -> String {
    "major".to_string()
}

/// A key such as C major, A minor or D dorian.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawKey")]
pub struct Key {
    tonic: String,
    mode: ScaleType,
    #[serde(skip)]
    scale: Scale,
}

impl Key {
    /// Creates a key from a tonic name ("C", "F#", "Bb") and a mode name.
    ///
    /// The mode is `major`, `minor`, or the name of any seven-tone scale.
    ///
    /// # Errors
    ///
    /// `InvalidKey` when the tonic does not parse or the mode is not a
    /// seven-tone scale.
    pub fn new(tonic: &str, mode: &str) -> Result<Self> {
        let invalid = || MidiGenError::InvalidKey {
            tonic: tonic.to_string(),
            mode: mode.to_string(),
        };

        let tonic = tonic.trim();
        if tonic.chars().count() > 2 {
            return Err(invalid());
        }
        let offset = pitch_class_offset(tonic).ok_or_else(invalid)?;
        let mode_type = ScaleType::from_name(mode).map_err(|_| invalid())?;
        if !mode_type.is_heptatonic() {
            return Err(invalid());
        }

        let root = (REFERENCE_OCTAVE as i32 + 1) * 12 + offset;
        let scale = Scale::build(root as u8, mode_type)?;
        let mut normalized = tonic.to_string();
        normalized[..1].make_ascii_uppercase();
        Ok(Self {
            tonic: normalized,
            mode: mode_type,
            scale,
        })
    }

    pub fn major(tonic: &str) -> Result<Self> {
        Self::new(tonic, "major")
    }

    pub fn minor(tonic: &str) -> Result<Self> {
        Self::new(tonic, "minor")
    }

    pub fn tonic(&self) -> &str {
        &self.tonic
    }

    pub fn mode(&self) -> ScaleType {
        self.mode
    }

    /// Tonic in the reference octave, where C is 60. Not wrapped: B#
    /// gives 72 and Cb gives 59.
    pub fn tonic_pitch(&self) -> u8 {
        self.scale.root()
    }

    /// The key's scale rooted on [`tonic_pitch`](Self::tonic_pitch).
    pub fn scale(&self) -> Scale {
        self.scale
    }

    /// Key signature as (sharps or negative flats, is_minor), for keys whose
    /// spelling appears on the circle of fifths. Modal keys have none.
    pub fn signature(&self) -> Option<(i8, bool)> {
        let (table, minor) = match self.mode {
            ScaleType::Major | ScaleType::Ionian => (&MAJOR_SIGNATURES, false),
            ScaleType::Minor | ScaleType::Aeolian => (&MINOR_SIGNATURES, true),
            _ => return None,
        };
        table
            .iter()
            .find(|(name, _)| *name == self.tonic)
            .map(|&(_, accidentals)| (accidentals, minor))
    }
}

impl Default for Key {
    fn default() -> Self {
        Self {
            tonic: "C".to_string(),
            mode: ScaleType::Major,
            scale: Scale::C_MAJOR,
        }
    }
}

impl TryFrom<RawKey> for Key {
    type Error = MidiGenError;

    fn try_from(raw: RawKey) -> Result<Self> {
        Key::new(&raw.tonic, &raw.mode)
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.tonic, self.mode)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tonic_pitch() {
        assert_eq!(Key::major("C").unwrap().tonic_pitch(), 60);
        assert_eq!(Key::minor("A").unwrap().tonic_pitch(), 69);
        assert_eq!(Key::major("Bb").unwrap().tonic_pitch(), 70);
        assert_eq!(Key::major("f#").unwrap().tonic(), "F#");
        assert_eq!(Key::major("B#").unwrap().tonic_pitch(), 72);
        assert_eq!(Key::default(), Key::major("C").unwrap());
    }

    #[test]
    fn test_scale_from_key() {
        let scale = Key::minor("A").unwrap().scale();
        assert_eq!(scale.pitches(), vec![69, 71, 72, 74, 76, 77, 79]);

        let dorian = Key::new("D", "dorian").unwrap().scale();
        assert_eq!(dorian.scale_type(), ScaleType::Dorian);
        assert_eq!(dorian.root(), 62);
    }

    #[test]
    fn test_invalid_keys() {
        assert!(matches!(Key::major("H"), Err(MidiGenError::InvalidKey { .. })));
        assert!(matches!(Key::new("C", "blues"), Err(MidiGenError::InvalidKey { .. })));
        assert!(matches!(Key::new("C", "bogus"), Err(MidiGenError::InvalidKey { .. })));
        assert!(Key::major("").is_err());
        assert!(Key::major("Cbb").is_err());
    }

    #[test]
    fn test_signature() {
        assert_eq!(Key::major("C").unwrap().signature(), Some((0, false)));
        assert_eq!(Key::major("Eb").unwrap().signature(), Some((-3, false)));
        assert_eq!(Key::minor("E").unwrap().signature(), Some((1, true)));
        assert_eq!(Key::new("D", "dorian").unwrap().signature(), None);
    }

    #[test]
    fn test_deserialize() {
        let key: Key = serde_json::from_str(r#"{"tonic": "G"}"#).unwrap();
        assert_eq!(key, Key::major("G").unwrap());
        assert!(serde_json::from_str::<Key>(r#"{"tonic": "G", "mode": "blues"}"#).is_err());
    }
}
