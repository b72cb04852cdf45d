//! Chord progressions written as Roman-numeral strings.
//!
//! `"I-V-vi-IV"`, `"ii7 V7 | Imaj7"` and `"I:2, IV:1, V:1"` are all valid.
//! Tokens are separated by `-`, `,`, `|` or whitespace; a `:beats` suffix
//! gives a token an explicit length in quarter-note beats.

use super::chord::{self, ChordSymbol};
use super::scale::Scale;
use super::time::{Ticks, TimeConverter};
use crate::error::{MidiGenError, Result};
use num_rational::Ratio;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

const SEPARATORS: [char; 3] = ['-', ',', '|'];

/// Largest numerator or denominator accepted in a `:beats` suffix.
pub const MAX_EXPLICIT_BEATS: u64 = 4096;

/// One chord of a progression with its optional explicit length.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressionStep {
    symbol: ChordSymbol,
    beats: Option<Ratio<u64>>,
}

impl ProgressionStep {
    pub fn symbol(&self) -> &ChordSymbol {
        &self.symbol
    }

    /// Explicit length in quarter-note beats, if one was written.
    pub fn beats(&self) -> Option<Ratio<u64>> {
        self.beats
    }
}

/// A parsed progression. Serializes back to its source text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ChordProgression {
    source: String,
    steps: Vec<ProgressionStep>,
}

/// A chord placed in time with its voiced pitches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimedChord {
    symbol: ChordSymbol,
    start: Ticks,
    duration: Ticks,
    pitches: Vec<u8>,
}

impl TimedChord {
    pub fn symbol(&self) -> &ChordSymbol {
        &self.symbol
    }

    pub fn start(&self) -> Ticks {
        self.start
    }

    pub fn duration(&self) -> Ticks {
        self.duration
    }

    pub fn end(&self) -> Ticks {
        self.start + self.duration
    }

    pub fn pitches(&self) -> &[u8] {
        &self.pitches
    }
}

impl ChordProgression {
    /// Parses a progression string.
    ///
    /// # Errors
    ///
    /// `InvalidProgression` for an empty string or a malformed `:beats`
    /// suffix; chord tokens report their own parse errors.
    pub fn parse(text: &str) -> Result<Self> {
        let steps = text
            .split(|c: char| c.is_whitespace() || SEPARATORS.contains(&c))
            .filter(|token| !token.is_empty())
            .map(parse_step)
            .collect::<Result<Vec<_>>>()?;

        if steps.is_empty() {
            return Err(MidiGenError::InvalidProgression(format!(
                "'{}' contains no chords",
                text
            )));
        }
        Ok(Self {
            source: text.trim().to_string(),
            steps,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn steps(&self) -> &[ProgressionStep] {
        &self.steps
    }

    pub fn symbols(&self) -> impl Iterator<Item = &ChordSymbol> {
        self.steps.iter().map(|step| &step.symbol)
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Splits `span` ticks among the steps. Steps with explicit beats get
    /// exactly that length; the rest share what remains evenly, and the last
    /// of them absorbs whatever integer division leaves over.
    ///
    /// # Errors
    ///
    /// `InvalidProgression` when the explicit lengths exceed `span`, or when
    /// every step is explicit and together they do not fill `span`.
    pub fn step_durations(&self, converter: &TimeConverter, span: Ticks) -> Result<Vec<Ticks>> {
        let explicit: Vec<Option<Ticks>> = self
            .steps
            .iter()
            .map(|step| step.beats.map(|beats| converter.beats_to_ticks(beats)))
            .collect();

        let explicit_total = explicit
            .iter()
            .flatten()
            .try_fold(0 as Ticks, |total, &ticks| total.checked_add(ticks));
        let remaining = explicit_total
            .and_then(|total| span.checked_sub(total))
            .ok_or_else(|| {
                MidiGenError::InvalidProgression(format!(
                    "'{}' is longer than the section's {} ticks",
                    self.source, span
                ))
            })?;

        let Some(last_implicit) = explicit.iter().rposition(Option::is_none) else {
            if remaining > 0 {
                return Err(MidiGenError::InvalidProgression(format!(
                    "'{}' leaves {} of the section's {} ticks unfilled",
                    self.source, remaining, span
                )));
            }
            return Ok(explicit.into_iter().flatten().collect());
        };

        let implicit_count = explicit.iter().filter(|ticks| ticks.is_none()).count() as Ticks;
        let share = remaining / implicit_count;
        let mut durations: Vec<Ticks> = explicit
            .into_iter()
            .map(|ticks| ticks.unwrap_or(share))
            .collect();
        durations[last_implicit] += remaining - share * implicit_count;
        Ok(durations)
    }

    /// Voices and places every chord within `span` ticks starting at `start`.
    ///
    /// `previous` is the voicing that sounded before this progression; the
    /// returned chords continue the voice leading from it.
    pub fn schedule(
        &self,
        scale: &Scale,
        converter: &TimeConverter,
        start: Ticks,
        span: Ticks,
        previous: Option<&[u8]>,
    ) -> Result<Vec<TimedChord>> {
        let durations = self.step_durations(converter, span)?;
        let mut timed = Vec::with_capacity(self.steps.len());
        let mut time = start;
        let mut previous: Option<Vec<u8>> = previous.map(<[u8]>::to_vec);

        for (step, duration) in self.steps.iter().zip(durations) {
            let pitches = chord::resolve(scale, &step.symbol, previous.as_deref())?;
            previous = Some(pitches.clone());
            timed.push(TimedChord {
                symbol: step.symbol.clone(),
                start: time,
                duration,
                pitches,
            });
            time += duration;
        }
        Ok(timed)
    }
}

fn parse_step(token: &str) -> Result<ProgressionStep> {
    let (symbol, beats) = match token.split_once(':') {
        Some((symbol, beats)) => {
            let beats = Ratio::<u64>::from_str(beats)
                .ok()
                .filter(|beats| *beats > Ratio::from_integer(0))
                .filter(|beats| {
                    *beats.numer() <= MAX_EXPLICIT_BEATS && *beats.denom() <= MAX_EXPLICIT_BEATS
                })
                .ok_or_else(|| {
                    MidiGenError::InvalidProgression(format!("bad duration in '{}'", token))
                })?;
            (symbol, Some(beats))
        }
        None => (token, None),
    };
    Ok(ProgressionStep {
        symbol: ChordSymbol::parse(symbol)?,
        beats,
    })
}

impl FromStr for ChordProgression {
    type Err = MidiGenError;

    fn from_str(s: &str) -> Result<Self> {
        ChordProgression::parse(s)
    }
}

impl TryFrom<String> for ChordProgression {
    type Error = MidiGenError;

    fn try_from(text: String) -> Result<Self> {
        ChordProgression::parse(&text)
    }
}

impl From<ChordProgression> for String {
    fn from(progression: ChordProgression) -> String {
        progression.source
    }
}

impl fmt::Display for ChordProgression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::theory::{ChordQuality, ScaleType, MAX_TICKS_PER_QUARTER};

    #[test]
    fn test_parse_pop_progression() {
        let progression = ChordProgression::parse("I-V-vi-IV").unwrap();
        let degrees: Vec<u8> = progression.symbols().map(|s| s.degree()).collect();
        assert_eq!(degrees, vec![1, 5, 6, 4]);
        let qualities: Vec<ChordQuality> = progression.symbols().map(|s| s.quality()).collect();
        assert_eq!(
            qualities,
            vec![
                ChordQuality::Major,
                ChordQuality::Major,
                ChordQuality::Minor,
                ChordQuality::Major
            ]
        );
    }

    #[test]
    fn test_mixed_separators() {
        let progression = ChordProgression::parse(" ii7 V7 | Imaj7,vi ").unwrap();
        assert_eq!(progression.len(), 4);
        assert_eq!(progression.source(), "ii7 V7 | Imaj7,vi");
    }

    #[test]
    fn test_invalid_progressions() {
        assert!(matches!(
            ChordProgression::parse(""),
            Err(MidiGenError::InvalidProgression(_))
        ));
        assert!(matches!(
            ChordProgression::parse(" - | "),
            Err(MidiGenError::InvalidProgression(_))
        ));
        assert!(matches!(
            ChordProgression::parse("I:x"),
            Err(MidiGenError::InvalidProgression(_))
        ));
        assert!(matches!(
            ChordProgression::parse("I:0"),
            Err(MidiGenError::InvalidProgression(_))
        ));
        assert!(matches!(
            ChordProgression::parse("I:18446744073709551615 V"),
            Err(MidiGenError::InvalidProgression(_))
        ));
        assert!(matches!(
            ChordProgression::parse("I:1/99999 V"),
            Err(MidiGenError::InvalidProgression(_))
        ));
        assert!(ChordProgression::parse("I:4096 V:1/4096").is_ok());
        assert!(matches!(
            ChordProgression::parse("I-Q"),
            Err(MidiGenError::InvalidRomanNumeral(_))
        ));
    }

    #[test]
    fn test_even_split_with_remainder() {
        let tc = TimeConverter::default();
        let progression = ChordProgression::parse("I-IV-V").unwrap();
        assert_eq!(progression.step_durations(&tc, 1000).unwrap(), vec![333, 333, 334]);
        let durations = progression.step_durations(&tc, 7680).unwrap();
        assert_eq!(durations, vec![2560, 2560, 2560]);
    }

    #[test]
    fn test_explicit_durations() {
        let tc = TimeConverter::default();
        let progression = ChordProgression::parse("I:2 IV V:1").unwrap();
        // 1 measure of 4/4 = 1920: I gets 960, V gets 480, IV the remaining 480
        assert_eq!(progression.step_durations(&tc, 1920).unwrap(), vec![960, 480, 480]);

        let half_beat = ChordProgression::parse("I:1/2 V").unwrap();
        assert_eq!(half_beat.step_durations(&tc, 1920).unwrap(), vec![240, 1680]);

        let too_long = ChordProgression::parse("I:4 V:4").unwrap();
        assert!(matches!(
            too_long.step_durations(&tc, 1920),
            Err(MidiGenError::InvalidProgression(_))
        ));
    }

    #[test]
    fn test_explicit_steps_keep_their_length() {
        let tc = TimeConverter::default();
        // the leftover tick goes to IV, the last step without beats
        let progression = ChordProgression::parse("I IV V:1").unwrap();
        assert_eq!(progression.step_durations(&tc, 1921).unwrap(), vec![720, 721, 480]);

        let all_explicit = ChordProgression::parse("I:2 V:2").unwrap();
        assert_eq!(all_explicit.step_durations(&tc, 1920).unwrap(), vec![960, 960]);
        let short = ChordProgression::parse("I:1 V:1").unwrap();
        assert!(matches!(
            short.step_durations(&tc, 1920),
            Err(MidiGenError::InvalidProgression(_))
        ));
    }

    #[test]
    fn test_largest_explicit_length_does_not_overflow() {
        let tc = TimeConverter::new(MAX_TICKS_PER_QUARTER).unwrap();
        let progression = ChordProgression::parse("I:4096 V:4096 IV").unwrap();
        assert!(matches!(
            progression.step_durations(&tc, 1920),
            Err(MidiGenError::InvalidProgression(_))
        ));
    }

    #[test]
    fn test_schedule_places_and_voices() {
        let tc = TimeConverter::default();
        let scale = Scale::build(60, ScaleType::Major).unwrap();
        let progression = ChordProgression::parse("I-IV").unwrap();
        let chords = progression.schedule(&scale, &tc, 1920, 3840, None).unwrap();

        assert_eq!(chords.len(), 2);
        assert_eq!(chords[0].start(), 1920);
        assert_eq!(chords[0].pitches(), &[60, 64, 67]);
        assert_eq!(chords[1].start(), 3840);
        assert_eq!(chords[1].end(), 5760);
        assert_eq!(chords[1].pitches(), &[60, 65, 69]);
    }

    #[test]
    fn test_schedule_continues_from_previous() {
        let tc = TimeConverter::default();
        let scale = Scale::build(60, ScaleType::Major).unwrap();
        let progression = ChordProgression::parse("IV").unwrap();
        let chords = progression
            .schedule(&scale, &tc, 0, 1920, Some(&[60, 64, 67]))
            .unwrap();
        assert_eq!(chords[0].pitches(), &[60, 65, 69]);
    }

    #[test]
    fn test_serde_as_string() {
        let progression: ChordProgression = serde_json::from_str(r#""I-V-vi-IV""#).unwrap();
        assert_eq!(progression.len(), 4);
        assert_eq!(serde_json::to_string(&progression).unwrap(), r#""I-V-vi-IV""#);
        assert!(serde_json::from_str::<ChordProgression>(r#""""#).is_err());
    }
}
