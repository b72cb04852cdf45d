//! Step-sequencer rhythms written as `x` (hit) and `.` (rest) strings.

use super::time::Ticks;
use crate::error::{MidiGenError, Result};
use serde::{Deserialize, Serialize};

/// Step length used when none is given: a sixteenth note at 480 tpq.
pub const DEFAULT_STEP: Ticks = 120;

/// Named patterns, sixteen or eight steps long.
pub const RHYTHM_LIBRARY: [(&str, &str); 5] = [
    ("four_on_the_floor", "x...x...x...x..."),
    ("son_clave", "x..x..x.x..x..x."),
    ("tresillo", "x.xx.xx."),
    ("eighth_notes", "x.x.x.x.x.x.x.x."),
    ("quarter_notes", "x...x...x...x..."),
];

/// A run of identical steps: consecutive `x`s merge into one long hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RhythmEvent {
    pub is_hit: bool,
    pub duration: Ticks,
}

#[derive(Deserialize)]
struct RawRhythm {
    pattern: String,
    #[serde(default = "default_step")]
    step: Ticks,
}

fn default_step() -> Ticks {
    DEFAULT_STEP
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawRhythm")]
pub struct Rhythm {
    pattern: String,
    step: Ticks,
}

impl Rhythm {
    /// # Errors
    ///
    /// `InvalidRhythm` when the pattern is empty, contains anything other
    /// than `x` and `.`, or the step length is zero.
    pub fn new(pattern: &str, step: Ticks) -> Result<Self> {
        let valid = !pattern.is_empty() && pattern.chars().all(|c| c == 'x' || c == '.');
        if !valid || step == 0 {
            return Err(MidiGenError::InvalidRhythm(pattern.to_string()));
        }
        Ok(Self {
            pattern: pattern.to_string(),
            step,
        })
    }

    /// A pattern from [`RHYTHM_LIBRARY`].
    pub fn from_library(name: &str, step: Ticks) -> Result<Self> {
        let (_, pattern) = RHYTHM_LIBRARY
            .iter()
            .find(|(entry, _)| *entry == name)
            .ok_or_else(|| MidiGenError::InvalidRhythm(name.to_string()))?;
        Rhythm::new(pattern, step)
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn step(&self) -> Ticks {
        self.step
    }

    pub fn total_duration(&self) -> Ticks {
        self.pattern.len() as Ticks * self.step
    }

    /// Run-length encodes the pattern into alternating hits and rests.
    pub fn events(&self) -> Vec<RhythmEvent> {
        let mut events: Vec<RhythmEvent> = Vec::new();
        for c in self.pattern.chars() {
            let is_hit = c == 'x';
            match events.last_mut() {
                Some(last) if last.is_hit == is_hit => last.duration += self.step,
                _ => events.push(RhythmEvent {
                    is_hit,
                    duration: self.step,
                }),
            }
        }
        events
    }

    /// Hits as (start, duration) pairs, looping the pattern from `start`
    /// for `span` ticks. A hit running past the end is shortened to fit.
    pub fn hits(&self, start: Ticks, span: Ticks) -> Vec<(Ticks, Ticks)> {
        let events = self.events();
        let end = start + span;
        let mut hits = Vec::new();
        let mut time = start;

        while time < end {
            for event in &events {
                if time >= end {
                    break;
                }
                if event.is_hit {
                    hits.push((time, event.duration.min(end - time)));
                }
                time += event.duration;
            }
        }
        hits
    }
}

impl TryFrom<RawRhythm> for Rhythm {
    type Error = MidiGenError;

    fn try_from(raw: RawRhythm) -> Result<Self> {
        Rhythm::new(&raw.pattern, raw.step)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hit_lengths(rhythm: &Rhythm) -> Vec<(bool, Ticks)> {
        rhythm.events().iter().map(|e| (e.is_hit, e.duration)).collect()
    }

    #[test]
    fn test_events_alternate() {
        let rhythm = Rhythm::new("x.x.", 120).unwrap();
        assert_eq!(rhythm.total_duration(), 480);
        let events = hit_lengths(&rhythm);
        assert_eq!(events, vec![(true, 120), (false, 120), (true, 120), (false, 120)]);
    }

    #[test]
    fn test_consecutive_steps_merge() {
        let rhythm = Rhythm::new("xx..xx", 100).unwrap();
        let events = hit_lengths(&rhythm);
        assert_eq!(events, vec![(true, 200), (false, 200), (true, 200)]);

        let rest = Rhythm::new("....", 120).unwrap();
        assert_eq!(rest.events().len(), 1);
        assert!(rest.hits(0, 1920).is_empty());
    }

    #[test]
    fn test_invalid_patterns() {
        assert!(matches!(Rhythm::new("", 120), Err(MidiGenError::InvalidRhythm(_))));
        assert!(matches!(Rhythm::new("x-x-", 120), Err(MidiGenError::InvalidRhythm(_))));
        assert!(Rhythm::new("x...", 0).is_err());
        assert!(Rhythm::from_library("bossa", 120).is_err());
    }

    #[test]
    fn test_library() {
        let rhythm = Rhythm::from_library("four_on_the_floor", 120).unwrap();
        assert_eq!(rhythm.total_duration(), 16 * 120);
        for (name, _) in RHYTHM_LIBRARY {
            assert!(Rhythm::from_library(name, DEFAULT_STEP).is_ok());
        }
    }

    #[test]
    fn test_hits_loop_and_clip() {
        let rhythm = Rhythm::new("x...", 120).unwrap();
        assert_eq!(
            rhythm.hits(960, 1920),
            vec![(960, 120), (1440, 120), (1920, 120), (2400, 120)]
        );

        let long = Rhythm::new("xxx.", 120).unwrap();
        assert_eq!(long.hits(0, 600), vec![(0, 360), (480, 120)]);
    }

    #[test]
    fn test_deserialize_default_step() {
        let rhythm: Rhythm = serde_json::from_str(r#"{"pattern": "x.x."}"#).unwrap();
        assert_eq!(rhythm.step(), DEFAULT_STEP);
        assert!(serde_json::from_str::<Rhythm>(r#"{"pattern": "abc"}"#).is_err());
    }
}
