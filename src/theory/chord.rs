//! Chord qualities, Roman-numeral chord symbols and voice leading.
//!
//! A Roman-numeral token such as `bVII7` or `viio` is parsed into a
//! [`ChordSymbol`]; [`resolve`] then turns it into concrete pitches within a
//! scale, optionally choosing the inversion closest to the previous chord.

use super::scale::Scale;
use super::time::Ticks;
use crate::error::{MidiGenError, Result};
use crate::midi::{pitch_class_offset, Chord};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChordQuality {
    Major,
    Minor,
    Diminished,
    Augmented,
    Suspended2,
    Suspended4,
    Power,
    Sixth,
    MinorSixth,
    Dominant7,
    Major7,
    Minor7,
    MinorMajor7,
    Diminished7,
    HalfDiminished7,
    Augmented7,
    Dominant9,
    Major9,
    Minor9,
    Add9,
    MinorAdd9,
    Dominant11,
    Minor11,
    Dominant13,
    Minor13,
}

/// Suffixes accepted after a note name in chord symbols like `Am7` or `Bbmaj9`.
const NAMED_QUALITIES: [(&str, ChordQuality); 37] = [
    ("", ChordQuality::Major),
    ("maj", ChordQuality::Major),
    ("M", ChordQuality::Major),
    ("m", ChordQuality::Minor),
    ("min", ChordQuality::Minor),
    ("-", ChordQuality::Minor),
    ("dim", ChordQuality::Diminished),
    ("°", ChordQuality::Diminished),
    ("aug", ChordQuality::Augmented),
    ("+", ChordQuality::Augmented),
    ("sus2", ChordQuality::Suspended2),
    ("sus4", ChordQuality::Suspended4),
    ("sus", ChordQuality::Suspended4),
    ("5", ChordQuality::Power),
    ("6", ChordQuality::Sixth),
    ("m6", ChordQuality::MinorSixth),
    ("7", ChordQuality::Dominant7),
    ("maj7", ChordQuality::Major7),
    ("M7", ChordQuality::Major7),
    ("m7", ChordQuality::Minor7),
    ("min7", ChordQuality::Minor7),
    ("-7", ChordQuality::Minor7),
    ("mM7", ChordQuality::MinorMajor7),
    ("dim7", ChordQuality::Diminished7),
    ("°7", ChordQuality::Diminished7),
    ("m7b5", ChordQuality::HalfDiminished7),
    ("ø", ChordQuality::HalfDiminished7),
    ("aug7", ChordQuality::Augmented7),
    ("9", ChordQuality::Dominant9),
    ("maj9", ChordQuality::Major9),
    ("m9", ChordQuality::Minor9),
    ("add9", ChordQuality::Add9),
    ("madd9", ChordQuality::MinorAdd9),
    ("11", ChordQuality::Dominant11),
    ("m11", ChordQuality::Minor11),
    ("13", ChordQuality::Dominant13),
    ("m13", ChordQuality::Minor13),
];

impl ChordQuality {
    /// Semitone offsets from the chord root, ascending.
    pub fn intervals(self) -> &'static [u8] {
        match self {
            ChordQuality::Major => &[0, 4, 7],
            ChordQuality::Minor => &[0, 3, 7],
            ChordQuality::Diminished => &[0, 3, 6],
            ChordQuality::Augmented => &[0, 4, 8],
            ChordQuality::Suspended2 => &[0, 2, 7],
            ChordQuality::Suspended4 => &[0, 5, 7],
            ChordQuality::Power => &[0, 7],
            ChordQuality::Sixth => &[0, 4, 7, 9],
            ChordQuality::MinorSixth => &[0, 3, 7, 9],
            ChordQuality::Dominant7 => &[0, 4, 7, 10],
            ChordQuality::Major7 => &[0, 4, 7, 11],
            ChordQuality::Minor7 => &[0, 3, 7, 10],
            ChordQuality::MinorMajor7 => &[0, 3, 7, 11],
            ChordQuality::Diminished7 => &[0, 3, 6, 9],
            ChordQuality::HalfDiminished7 => &[0, 3, 6, 10],
            ChordQuality::Augmented7 => &[0, 4, 8, 10],
            ChordQuality::Dominant9 => &[0, 4, 7, 10, 14],
            ChordQuality::Major9 => &[0, 4, 7, 11, 14],
            ChordQuality::Minor9 => &[0, 3, 7, 10, 14],
            ChordQuality::Add9 => &[0, 4, 7, 14],
            ChordQuality::MinorAdd9 => &[0, 3, 7, 14],
            ChordQuality::Dominant11 => &[0, 4, 7, 10, 14, 17],
            ChordQuality::Minor11 => &[0, 3, 7, 10, 14, 17],
            ChordQuality::Dominant13 => &[0, 4, 7, 10, 14, 21],
            ChordQuality::Minor13 => &[0, 3, 7, 10, 14, 21],
        }
    }

    /// Looks up the suffix of a named chord (`m7` in `Am7`). Case matters:
    /// `M7` is major seventh, `m7` is minor seventh.
    pub fn from_name(suffix: &str) -> Result<Self> {
        NAMED_QUALITIES
            .iter()
            .find(|(name, _)| *name == suffix)
            .map(|&(_, quality)| quality)
            .ok_or_else(|| MidiGenError::UnknownChordQuality(suffix.to_string()))
    }

    /// Interprets the suffix of a Roman numeral. The numeral's case picks the
    /// major or minor variant where the suffix alone is ambiguous. Suffixes
    /// are case-insensitive apart from `M7`, `M9` and `mM7`.
    fn from_roman_suffix(suffix: &str, uppercase: bool) -> Result<Self> {
        let by_case = |major, minor| if uppercase { major } else { minor };
        let quality = match suffix {
            "M7" => ChordQuality::Major7,
            "M9" => ChordQuality::Major9,
            "mM7" => ChordQuality::MinorMajor7,
            _ => match suffix.to_lowercase().as_str() {
                "" => by_case(ChordQuality::Major, ChordQuality::Minor),
                "7" => by_case(ChordQuality::Dominant7, ChordQuality::Minor7),
                "9" => by_case(ChordQuality::Dominant9, ChordQuality::Minor9),
                "11" => by_case(ChordQuality::Dominant11, ChordQuality::Minor11),
                "13" => by_case(ChordQuality::Dominant13, ChordQuality::Minor13),
                "6" => by_case(ChordQuality::Sixth, ChordQuality::MinorSixth),
                "add9" => by_case(ChordQuality::Add9, ChordQuality::MinorAdd9),
                "maj7" | "δ" | "δ7" => ChordQuality::Major7,
                "maj9" => ChordQuality::Major9,
                "minmaj7" => ChordQuality::MinorMajor7,
                "dim" | "°" | "o" => ChordQuality::Diminished,
                "dim7" | "°7" | "o7" => ChordQuality::Diminished7,
                "ø" | "ø7" | "m7b5" => ChordQuality::HalfDiminished7,
                "aug" | "+" => ChordQuality::Augmented,
                "aug7" | "+7" => ChordQuality::Augmented7,
                "sus2" => ChordQuality::Suspended2,
                "sus4" | "sus" => ChordQuality::Suspended4,
                "5" => ChordQuality::Power,
                _ => return Err(MidiGenError::UnknownChordQuality(suffix.to_string())),
            },
        };
        Ok(quality)
    }
}

/// Chromatic alteration written before a Roman numeral.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Accidental {
    #[default]
    Natural,
    Flat,
    Sharp,
}

impl Accidental {
    pub fn semitones(self) -> i32 {
        match self {
            Accidental::Natural => 0,
            Accidental::Flat => -1,
            Accidental::Sharp => 1,
        }
    }
}

const NUMERALS: [&str; 7] = ["I", "II", "III", "IV", "V", "VI", "VII"];

/// A parsed Roman-numeral chord such as `V7`, `ii` or `bVII`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ChordSymbol {
    token: String,
    degree: u8,
    quality: ChordQuality,
    accidental: Accidental,
    uppercase: bool,
}

impl ChordSymbol {
    /// Parses one Roman-numeral token.
    ///
    /// ```
    /// use midigen::theory::{ChordQuality, ChordSymbol};
    ///
    /// let symbol = ChordSymbol::parse("bVII7").unwrap();
    /// assert_eq!(symbol.degree(), 7);
    /// assert_eq!(symbol.quality(), ChordQuality::Dominant7);
    /// assert!(symbol.is_lowered());
    /// ```
    ///
    /// # Errors
    ///
    /// `InvalidRomanNumeral` when no numeral I-VII can be read,
    /// `UnknownChordQuality` when the suffix is not recognised.
    pub fn parse(token: &str) -> Result<Self> {
        let invalid = || MidiGenError::InvalidRomanNumeral(token.to_string());
        let token = token.trim();

        let (accidental, rest) = if let Some(rest) = token.strip_prefix(['b', '♭']) {
            (Accidental::Flat, rest)
        } else if let Some(rest) = token.strip_prefix(['#', '♯']) {
            (Accidental::Sharp, rest)
        } else {
            (Accidental::Natural, token)
        };

        let numeral_len = rest
            .find(|c: char| !matches!(c, 'I' | 'V' | 'i' | 'v'))
            .unwrap_or(rest.len());
        let (numeral, suffix) = rest.split_at(numeral_len);
        if numeral.is_empty() {
            return Err(invalid());
        }

        let uppercase = numeral.chars().all(|c| c.is_ascii_uppercase());
        let lowercase = numeral.chars().all(|c| c.is_ascii_lowercase());
        if !uppercase && !lowercase {
            return Err(invalid());
        }
        let degree = NUMERALS
            .iter()
            .position(|n| n.eq_ignore_ascii_case(numeral))
            .ok_or_else(invalid)?;

        Ok(Self {
            token: token.to_string(),
            degree: degree as u8 + 1,
            quality: ChordQuality::from_roman_suffix(suffix, uppercase)?,
            accidental,
            uppercase,
        })
    }

    /// The token as written, without surrounding whitespace.
    pub fn token(&self) -> &str {
        &self.token
    }

    /// Scale degree 1-7.
    pub fn degree(&self) -> u8 {
        self.degree
    }

    pub fn quality(&self) -> ChordQuality {
        self.quality
    }

    pub fn accidental(&self) -> Accidental {
        self.accidental
    }

    pub fn is_uppercase(&self) -> bool {
        self.uppercase
    }

    /// Root a semitone below the diatonic degree, as in `bVI`.
    pub fn is_lowered(&self) -> bool {
        self.accidental == Accidental::Flat
    }

    /// Any chromatic alteration marks the chord as borrowed from another mode.
    pub fn is_borrowed(&self) -> bool {
        self.accidental != Accidental::Natural
    }
}

impl FromStr for ChordSymbol {
    type Err = MidiGenError;

    fn from_str(s: &str) -> Result<Self> {
        ChordSymbol::parse(s)
    }
}

impl fmt::Display for ChordSymbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.token)
    }
}

/// A chord named by its root letter, such as `F#m7` or `Bbmaj9`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct NamedChord {
    root_offset: i32,
    quality: ChordQuality,
}

impl NamedChord {
    /// # Errors
    ///
    /// `InvalidNoteName` when the root letter is missing or unknown,
    /// `UnknownChordQuality` when the suffix is not recognised.
    pub fn parse(symbol: &str) -> Result<Self> {
        let symbol = symbol.trim();
        let mut root_end = symbol.chars().next().map_or(0, char::len_utf8);
        if symbol[root_end..].starts_with(['#', 'b', '♯', '♭']) {
            let accidental_len = symbol[root_end..].chars().next().map_or(0, char::len_utf8);
            root_end += accidental_len;
        }

        let root_offset = pitch_class_offset(&symbol[..root_end])
            .ok_or_else(|| MidiGenError::InvalidNoteName(symbol.to_string()))?;
        let quality = ChordQuality::from_name(&symbol[root_end..])?;
        Ok(Self {
            root_offset,
            quality,
        })
    }

    pub fn quality(&self) -> ChordQuality {
        self.quality
    }

    /// Root-position pitches with the root in `octave` (C4 = 60).
    ///
    /// # Errors
    ///
    /// `OutOfRange` when any tone leaves 0-127.
    pub fn pitches(&self, octave: i8) -> Result<Vec<u8>> {
        let root = (octave as i32 + 1) * 12 + self.root_offset;
        stack(root, self.quality)
    }
}

impl FromStr for NamedChord {
    type Err = MidiGenError;

    fn from_str(s: &str) -> Result<Self> {
        NamedChord::parse(s)
    }
}

fn stack(root: i32, quality: ChordQuality) -> Result<Vec<u8>> {
    quality
        .intervals()
        .iter()
        .map(|&interval| {
            let pitch = root + interval as i32;
            u8::try_from(pitch)
                .ok()
                .filter(|&p| p <= 127)
                .ok_or_else(|| MidiGenError::pitch_out_of_range(pitch as i64))
        })
        .collect()
}

/// Root pitch of `symbol` in `scale`, including any accidental.
pub fn root_pitch(scale: &Scale, symbol: &ChordSymbol) -> Result<i32> {
    let diatonic = scale.degree_to_pitch(symbol.degree() as i32)? as i32;
    Ok(diatonic + symbol.accidental().semitones())
}

/// Root-position pitches of `symbol` in `scale`.
pub fn root_position(scale: &Scale, symbol: &ChordSymbol) -> Result<Vec<u8>> {
    stack(root_pitch(scale, symbol)?, symbol.quality())
}

/// All rotations of `tones`: rotation k moves the lowest k tones up an
/// octave. Rotations that would leave the MIDI range are omitted.
pub fn inversions(tones: &[u8]) -> Vec<Vec<u8>> {
    (0..tones.len())
        .filter_map(|k| {
            let mut voicing: Vec<u8> = tones[k..].to_vec();
            for &tone in &tones[..k] {
                voicing.push(tone.checked_add(12).filter(|&p| p <= 127)?);
            }
            Some(voicing)
        })
        .collect()
}

/// Sum over `candidate` of the distance from each pitch to the nearest pitch
/// of `previous`. Zero when `previous` is empty.
pub fn voice_leading_distance(candidate: &[u8], previous: &[u8]) -> u32 {
    if previous.is_empty() {
        return 0;
    }
    candidate
        .iter()
        .map(|&pitch| {
            previous
                .iter()
                .map(|&p| (pitch as i32 - p as i32).unsigned_abs())
                .min()
                .unwrap_or(0)
        })
        .sum()
}

/// Resolves `symbol` to pitches in `scale`.
///
/// Without a previous chord the root position is returned. With one, every
/// inversion at its own octave and one octave lower is tried and the voicing
/// with the smallest [`voice_leading_distance`] wins. Ties go to root
/// position, then to the fewest rotated tones.
pub fn resolve(scale: &Scale, symbol: &ChordSymbol, previous: Option<&[u8]>) -> Result<Vec<u8>> {
    let root = root_position(scale, symbol)?;
    let previous = match previous {
        Some(previous) if !previous.is_empty() => previous,
        _ => return Ok(root),
    };

    let candidates = inversions(&root).into_iter().flat_map(|voicing| {
        let lowered: Option<Vec<u8>> = voicing.iter().map(|p| p.checked_sub(12)).collect();
        std::iter::once(voicing).chain(lowered)
    });

    let best = candidates
        .enumerate()
        .min_by_key(|(index, candidate)| (voice_leading_distance(candidate, previous), *index))
        .map(|(_, candidate)| candidate);
    Ok(best.unwrap_or(root))
}

/// Like [`resolve`], but returns a [`Chord`] of notes starting at `time`,
/// voice-led from the pitches of `previous`.
pub fn resolve_chord(
    scale: &Scale,
    symbol: &ChordSymbol,
    previous: Option<&Chord>,
    velocity: u8,
    duration: Ticks,
    time: Ticks,
) -> Result<Chord> {
    let previous = previous.map(Chord::pitches);
    let pitches = resolve(scale, symbol, previous.as_deref())?;
    Chord::from_pitches(&pitches, velocity, duration, time)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::theory::ScaleType;

    fn c_major() -> Scale {
        Scale::build(60, ScaleType::Major).unwrap()
    }

    #[test]
    fn test_parse_case_sets_quality() {
        assert_eq!(ChordSymbol::parse("I").unwrap().quality(), ChordQuality::Major);
        assert_eq!(ChordSymbol::parse("vi").unwrap().quality(), ChordQuality::Minor);
        assert_eq!(ChordSymbol::parse("V7").unwrap().quality(), ChordQuality::Dominant7);
        assert_eq!(ChordSymbol::parse("ii7").unwrap().quality(), ChordQuality::Minor7);
        assert_eq!(ChordSymbol::parse("IVmaj7").unwrap().quality(), ChordQuality::Major7);
        assert_eq!(ChordSymbol::parse("viio").unwrap().quality(), ChordQuality::Diminished);
        assert_eq!(ChordSymbol::parse("viiø7").unwrap().quality(), ChordQuality::HalfDiminished7);
        assert_eq!(ChordSymbol::parse("Vsus4").unwrap().quality(), ChordQuality::Suspended4);
        assert_eq!(ChordSymbol::parse("ii11").unwrap().quality(), ChordQuality::Minor11);
        assert_eq!(ChordSymbol::parse("V13").unwrap().quality(), ChordQuality::Dominant13);
        assert_eq!(ChordSymbol::parse("iii").unwrap().degree(), 3);
    }

    #[test]
    fn test_suffix_case() {
        assert_eq!(ChordSymbol::parse("IMaj7").unwrap().quality(), ChordQuality::Major7);
        assert_eq!(ChordSymbol::parse("viiDim").unwrap().quality(), ChordQuality::Diminished);
        assert_eq!(ChordSymbol::parse("VSUS4").unwrap().quality(), ChordQuality::Suspended4);
        assert_eq!(ChordSymbol::parse("IM7").unwrap().quality(), ChordQuality::Major7);
        assert_eq!(ChordSymbol::parse("imM7").unwrap().quality(), ChordQuality::MinorMajor7);
        assert_eq!(ChordSymbol::parse("ii7").unwrap().quality(), ChordQuality::Minor7);
    }

    #[test]
    fn test_parse_accidentals() {
        let flat_six = ChordSymbol::parse("bVI").unwrap();
        assert_eq!(flat_six.degree(), 6);
        assert!(flat_six.is_lowered());
        assert!(flat_six.is_borrowed());

        let sharp_four = ChordSymbol::parse("#iv").unwrap();
        assert!(!sharp_four.is_lowered());
        assert!(sharp_four.is_borrowed());

        assert!(!ChordSymbol::parse("IV").unwrap().is_borrowed());
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(
            ChordSymbol::parse("Ixyz"),
            Err(MidiGenError::UnknownChordQuality(s)) if s == "xyz"
        ));
        assert!(matches!(
            ChordSymbol::parse("VIII"),
            Err(MidiGenError::InvalidRomanNumeral(_))
        ));
        assert!(matches!(
            ChordSymbol::parse("Iv"),
            Err(MidiGenError::InvalidRomanNumeral(_))
        ));
        assert!(matches!(
            ChordSymbol::parse("X"),
            Err(MidiGenError::InvalidRomanNumeral(_))
        ));
        assert!(ChordSymbol::parse("").is_err());
    }

    #[test]
    fn test_root_position() {
        let scale = c_major();
        let v7 = ChordSymbol::parse("V7").unwrap();
        assert_eq!(root_position(&scale, &v7).unwrap(), vec![67, 71, 74, 77]);

        let flat_seven = ChordSymbol::parse("bVII").unwrap();
        assert_eq!(root_position(&scale, &flat_seven).unwrap(), vec![70, 74, 77]);

        let vi = ChordSymbol::parse("vi").unwrap();
        assert_eq!(resolve(&scale, &vi, None).unwrap(), vec![69, 72, 76]);
    }

    #[test]
    fn test_inversions() {
        assert_eq!(
            inversions(&[60, 64, 67]),
            vec![vec![60, 64, 67], vec![64, 67, 72], vec![67, 72, 76]]
        );
        assert_eq!(inversions(&[118, 120, 125]).len(), 1);
    }

    #[test]
    fn test_voice_leading_picks_minimum() {
        let scale = c_major();
        let previous = vec![60, 64, 67];
        let iv = ChordSymbol::parse("IV").unwrap();
        let voiced = resolve(&scale, &iv, Some(&previous)).unwrap();
        // F/C: C stays, E->F, G->A
        assert_eq!(voiced, vec![60, 65, 69]);

        let root = root_position(&scale, &iv).unwrap();
        let best = voice_leading_distance(&voiced, &previous);
        for candidate in inversions(&root) {
            assert!(best <= voice_leading_distance(&candidate, &previous));
        }
    }

    #[test]
    fn test_one_to_five_moves_least() {
        let scale = c_major();
        let one = ChordSymbol::parse("I").unwrap();
        let tonic = resolve_chord(&scale, &one, None, 80, 480, 0).unwrap();
        let five = ChordSymbol::parse("V").unwrap();
        let dominant = resolve_chord(&scale, &five, Some(&tonic), 80, 480, 480).unwrap();

        // G/B: C->B, E->D, G stays
        assert_eq!(dominant.pitches(), vec![59, 62, 67]);
        assert_eq!(dominant.time(), 480);

        let previous = tonic.pitches();
        let chosen = voice_leading_distance(&dominant.pitches(), &previous);
        for candidate in inversions(&root_position(&scale, &five).unwrap()) {
            assert!(chosen <= voice_leading_distance(&candidate, &previous));
        }
    }

    #[test]
    fn test_voice_leading_tie_prefers_root_position() {
        let scale = c_major();
        let previous = vec![60, 64, 67];
        let i = ChordSymbol::parse("I").unwrap();
        assert_eq!(resolve(&scale, &i, Some(&previous)).unwrap(), previous);
    }

    #[test]
    fn test_voice_leading_distance() {
        assert_eq!(voice_leading_distance(&[60, 64, 67], &[]), 0);
        assert_eq!(voice_leading_distance(&[60, 65, 69], &[60, 64, 67]), 3);
    }

    #[test]
    fn test_named_chords() {
        let g7 = NamedChord::parse("G7").unwrap();
        assert_eq!(g7.pitches(3).unwrap(), vec![55, 59, 62, 65]);
        assert_eq!(NamedChord::parse("Dm").unwrap().pitches(3).unwrap(), vec![50, 53, 57]);
        assert_eq!(
            NamedChord::parse("Bbmaj7").unwrap().pitches(3).unwrap(),
            vec![58, 62, 65, 69]
        );
        assert_eq!(NamedChord::parse("F#").unwrap().pitches(3).unwrap(), vec![54, 58, 61]);
        assert!(matches!(
            NamedChord::parse("Hm"),
            Err(MidiGenError::InvalidNoteName(_))
        ));
        assert!(matches!(
            NamedChord::parse("Cxyz"),
            Err(MidiGenError::UnknownChordQuality(_))
        ));
        assert!(NamedChord::parse("C").unwrap().pitches(10).is_err());
    }
}
