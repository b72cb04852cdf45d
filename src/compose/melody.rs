//! Monophonic melodies and the generators that build them.

use crate::error::{MidiGenError, Result};
use crate::midi::{name_to_note, Note, DEFAULT_VELOCITY};
use crate::theory::{Scale, Ticks, TimeConverter};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::Serialize;
use std::ops::Index;
use tracing::debug;

/// Short rhythm tokens accepted by [`MelodyGenerator::from_degrees`].
const RHYTHM_ALIASES: [(&str, &str); 8] = [
    ("w", "whole"),
    ("h", "half"),
    ("q", "quarter"),
    ("e", "eighth"),
    ("s", "sixteenth"),
    ("dh", "dotted_half"),
    ("dq", "dotted_quarter"),
    ("de", "dotted_eighth"),
];

/// An ordered, monophonic sequence of notes.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct Melody {
    notes: Vec<Note>,
}

impl Melody {
    pub fn new(notes: Vec<Note>) -> Self {
        Self { notes }
    }

    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    pub fn into_notes(self) -> Vec<Note> {
        self.notes
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Note> {
        self.notes.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Note> {
        self.notes.iter()
    }

    pub fn pitches(&self) -> Vec<u8> {
        self.notes.iter().map(|n| n.pitch()).collect()
    }

    pub fn start_time(&self) -> Ticks {
        self.notes.iter().map(|n| n.time()).min().unwrap_or(0)
    }

    pub fn end_time(&self) -> Ticks {
        self.notes.iter().map(|n| n.end_time()).max().unwrap_or(0)
    }

    /// Span from the first onset to the last release.
    pub fn duration(&self) -> Ticks {
        self.end_time() - self.start_time()
    }

    /// A new melody shifted by `semitones`.
    ///
    /// # Errors
    ///
    /// `OutOfRange` if any pitch would leave 0-127.
    pub fn transpose(&self, semitones: i32) -> Result<Melody> {
        let notes = self
            .notes
            .iter()
            .map(|n| n.transposed(semitones))
            .collect::<Result<Vec<_>>>()?;
        Ok(Melody { notes })
    }

    /// Retrograde: the melody played backwards over the same span.
    ///
    /// Each note is mirrored inside `[start, end]`, so a note that ended at
    /// the very end now starts at the very start. Rests are mirrored too,
    /// and reversing twice gives back the original melody.
    pub fn reverse(&self) -> Melody {
        let start = self.start_time();
        let end = self.end_time();
        let notes = self
            .notes
            .iter()
            .rev()
            .map(|n| n.with_time(start + end - n.end_time()))
            .collect();
        Melody { notes }
    }
}

impl Index<usize> for Melody {
    type Output = Note;

    fn index(&self, index: usize) -> &Note {
        &self.notes[index]
    }
}

impl<'a> IntoIterator for &'a Melody {
    type Item = &'a Note;
    type IntoIter = std::slice::Iter<'a, Note>;

    fn into_iter(self) -> Self::IntoIter {
        self.notes.iter()
    }
}

/// Note lengths for [`MelodyGenerator::from_note_names`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Durations {
    /// The same length for every note.
    Uniform(Ticks),
    /// One length per note, matched by position.
    Each(Vec<Ticks>),
}

/// Builds melodies. Notes are laid end to end from `start_time`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MelodyGenerator {
    converter: TimeConverter,
    velocity: u8,
    start_time: Ticks,
    step: Ticks,
}

impl MelodyGenerator {
    /// A generator with velocity 80, starting at tick 0, with quarter-note
    /// steps for the scale-based modes.
    pub fn new(converter: TimeConverter) -> Self {
        Self {
            converter,
            velocity: DEFAULT_VELOCITY,
            start_time: 0,
            step: converter.ticks_per_quarter_note() as Ticks,
        }
    }

    pub fn with_velocity(mut self, velocity: u8) -> Self {
        self.velocity = velocity;
        self
    }

    pub fn with_start_time(mut self, start_time: Ticks) -> Self {
        self.start_time = start_time;
        self
    }

    /// Note length used by [`from_scale_pattern`](Self::from_scale_pattern)
    /// and [`random_walk`](Self::random_walk).
    pub fn with_step(mut self, step: Ticks) -> Self {
        self.step = step;
        self
    }

    fn lay_out(&self, pitches: impl IntoIterator<Item = (u8, Ticks)>) -> Result<Melody> {
        let mut time = self.start_time;
        let mut notes = Vec::new();
        for (pitch, duration) in pitches {
            notes.push(Note::new(pitch, self.velocity, duration, time)?);
            time += duration;
        }
        Ok(Melody { notes })
    }

    /// Builds a melody from whitespace-separated note names like `"C4 E4 G4"`.
    ///
    /// # Errors
    ///
    /// `EmptyMelody` for blank input, `InvalidNoteName` for an unknown name,
    /// `LengthMismatch` when per-note durations do not match the note count.
    pub fn from_note_names(&self, text: &str, durations: Durations) -> Result<Melody> {
        let names: Vec<&str> = text.split_whitespace().collect();
        if names.is_empty() {
            return Err(MidiGenError::EmptyMelody);
        }

        let durations = match durations {
            Durations::Uniform(ticks) => vec![ticks; names.len()],
            Durations::Each(ticks) if ticks.len() == names.len() => ticks,
            Durations::Each(ticks) => {
                return Err(MidiGenError::LengthMismatch {
                    what: "notes",
                    left: names.len(),
                    right: ticks.len(),
                })
            }
        };

        let pitches = names
            .iter()
            .map(|name| {
                name_to_note(name).ok_or_else(|| MidiGenError::InvalidNoteName(name.to_string()))
            })
            .collect::<Result<Vec<_>>>()?;
        self.lay_out(pitches.into_iter().zip(durations))
    }

    /// Builds a melody from 1-based scale degrees and a rhythm string such as
    /// `"q q h"` or `"quarter dotted_eighth sixteenth"`.
    ///
    /// # Errors
    ///
    /// `EmptyMelody` for no degrees, `LengthMismatch` when the rhythm count
    /// differs from the degree count, `UnknownNoteDuration` for a bad token,
    /// and the scale's own `InvalidDegree` / `OutOfRange`.
    pub fn from_degrees(&self, scale: &Scale, degrees: &[i32], rhythms: &str) -> Result<Melody> {
        if degrees.is_empty() {
            return Err(MidiGenError::EmptyMelody);
        }
        let tokens: Vec<&str> = rhythms.split_whitespace().collect();
        if tokens.len() != degrees.len() {
            return Err(MidiGenError::LengthMismatch {
                what: "degrees",
                left: degrees.len(),
                right: tokens.len(),
            });
        }

        let durations = tokens
            .iter()
            .map(|token| self.rhythm_ticks(token))
            .collect::<Result<Vec<_>>>()?;
        let pitches = degrees
            .iter()
            .map(|&degree| scale.degree_to_pitch(degree))
            .collect::<Result<Vec<_>>>()?;
        self.lay_out(pitches.into_iter().zip(durations))
    }

    fn rhythm_ticks(&self, token: &str) -> Result<Ticks> {
        let token = token.to_lowercase();
        let name = RHYTHM_ALIASES
            .iter()
            .find(|(alias, _)| *alias == token)
            .map_or(token.as_str(), |&(_, name)| name);
        self.converter.note_duration(name)
    }

    /// Builds a melody from 0-based indices into the scale's one-octave
    /// pitches, shifted by whole octaves.
    ///
    /// ```
    /// use midigen::compose::MelodyGenerator;
    /// use midigen::theory::{Scale, ScaleType, TimeConverter};
    ///
    /// let scale = Scale::build(60, ScaleType::Major).unwrap();
    /// let generator = MelodyGenerator::new(TimeConverter::default());
    /// let melody = generator.from_scale_pattern(&scale, &[0, 2, 4, 2, 0], 0).unwrap();
    /// assert_eq!(melody.pitches(), vec![60, 64, 67, 64, 60]);
    /// ```
    pub fn from_scale_pattern(
        &self,
        scale: &Scale,
        pattern: &[usize],
        octave_shift: i32,
    ) -> Result<Melody> {
        if pattern.is_empty() {
            return Err(MidiGenError::EmptyMelody);
        }
        let pitches = scale.pitches();
        let shifted = pattern
            .iter()
            .map(|&index| {
                let pitch = pitches
                    .get(index)
                    .ok_or(MidiGenError::InvalidDegree(index as i32))?;
                let shifted = *pitch as i64 + 12 * octave_shift as i64;
                u8::try_from(shifted)
                    .ok()
                    .filter(|&p| p <= 127)
                    .ok_or_else(|| MidiGenError::pitch_out_of_range(shifted))
            })
            .collect::<Result<Vec<_>>>()?;
        self.lay_out(shifted.into_iter().map(|pitch| (pitch, self.step)))
    }

    /// A seeded random walk through `scale`.
    ///
    /// The first note is `start_pitch`. Each following note moves by a step
    /// drawn uniformly from `-max_interval..=max_interval` semitones (zero
    /// included). A step past either end of the MIDI range is reflected back
    /// inside it, and the result is snapped to the nearest scale tone, the
    /// lower one on a tie. The same arguments always give the same melody.
    ///
    /// # Errors
    ///
    /// `NotInScale` when `start_pitch` is not a tone of `scale`.
    pub fn random_walk(
        &self,
        start_pitch: u8,
        length: usize,
        scale: &Scale,
        max_interval: u8,
        seed: u64,
    ) -> Result<Melody> {
        if start_pitch > 127 {
            return Err(MidiGenError::pitch_out_of_range(start_pitch as i64));
        }
        if !scale.contains(start_pitch) {
            return Err(MidiGenError::NotInScale(start_pitch));
        }

        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let max_interval = max_interval as i32;
        let mut pitch = start_pitch;
        let mut pitches = Vec::with_capacity(length);

        for _ in 0..length {
            pitches.push(pitch);
            let step: i32 = rng.gen_range(-max_interval..=max_interval);
            pitch = scale.snap(reflect(pitch as i32 + step));
        }

        debug!(seed, length, start_pitch, "generated random walk");
        self.lay_out(pitches.into_iter().map(|pitch| (pitch, self.step)))
    }
}

impl Default for MelodyGenerator {
    fn default() -> Self {
        Self::new(TimeConverter::default())
    }
}

/// Folds a pitch back into 0..=127 by mirroring at the range ends.
fn reflect(mut pitch: i32) -> u8 {
    loop {
        if pitch < 0 {
            pitch = -pitch;
        } else if pitch > 127 {
            pitch = 254 - pitch;
        } else {
            return pitch as u8;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::theory::ScaleType;

    fn c_major() -> Scale {
        Scale::build(60, ScaleType::Major).unwrap()
    }

    #[test]
    fn test_from_note_names_uniform() {
        let generator = MelodyGenerator::default();
        let melody = generator.from_note_names("C4 E4 G4 C5", Durations::Uniform(480)).unwrap();
        assert_eq!(melody.len(), 4);
        assert_eq!(melody.pitches(), vec![60, 64, 67, 72]);
        let times: Vec<Ticks> = melody.iter().map(|n| n.time()).collect();
        assert_eq!(times, vec![0, 480, 960, 1440]);
        assert_eq!(melody[3].velocity(), DEFAULT_VELOCITY);
    }

    #[test]
    fn test_from_note_names_each() {
        let generator = MelodyGenerator::default().with_start_time(100);
        let melody = generator
            .from_note_names("C4 Eb4 G4", Durations::Each(vec![480, 240, 960]))
            .unwrap();
        let times: Vec<Ticks> = melody.iter().map(|n| n.time()).collect();
        assert_eq!(times, vec![100, 580, 820]);
        assert_eq!(melody.duration(), 1680);
        assert_eq!(melody[1].pitch(), 63);
    }

    #[test]
    fn test_from_note_names_errors() {
        let generator = MelodyGenerator::default();
        assert_eq!(
            generator.from_note_names("  ", Durations::Uniform(480)),
            Err(MidiGenError::EmptyMelody)
        );
        assert!(matches!(
            generator.from_note_names("C4 X9", Durations::Uniform(480)),
            Err(MidiGenError::InvalidNoteName(name)) if name == "X9"
        ));
        assert!(matches!(
            generator.from_note_names("C4 E4", Durations::Each(vec![480])),
            Err(MidiGenError::LengthMismatch { left: 2, right: 1, .. })
        ));
    }

    #[test]
    fn test_from_degrees() {
        let generator = MelodyGenerator::default();
        let melody = generator
            .from_degrees(&c_major(), &[1, 3, 5, 8], "q e dq h")
            .unwrap();
        assert_eq!(melody.pitches(), vec![60, 64, 67, 72]);
        let durations: Vec<Ticks> = melody.iter().map(|n| n.duration()).collect();
        assert_eq!(durations, vec![480, 240, 720, 960]);

        let long_names = generator
            .from_degrees(&c_major(), &[1, 2], "triplet_eighth SIXTEENTH")
            .unwrap();
        assert_eq!(long_names[0].duration(), 160);
        assert_eq!(long_names[1].duration(), 120);
    }

    #[test]
    fn test_from_degrees_errors() {
        let generator = MelodyGenerator::default();
        assert!(matches!(
            generator.from_degrees(&c_major(), &[1, 2, 3, 4], "q q q"),
            Err(MidiGenError::LengthMismatch { what: "degrees", left: 4, right: 3 })
        ));
        assert_eq!(
            generator.from_degrees(&c_major(), &[1, 0], "q q"),
            Err(MidiGenError::InvalidDegree(0))
        );
        assert!(matches!(
            generator.from_degrees(&c_major(), &[1], "quaver"),
            Err(MidiGenError::UnknownNoteDuration(_))
        ));
    }

    #[test]
    fn test_from_scale_pattern() {
        let generator = MelodyGenerator::default().with_step(240);
        let melody = generator
            .from_scale_pattern(&c_major(), &[0, 2, 4], -1)
            .unwrap();
        assert_eq!(melody.pitches(), vec![48, 52, 55]);
        assert_eq!(melody.duration(), 720);
        assert!(generator.from_scale_pattern(&c_major(), &[7], 0).is_err());
        assert!(generator.from_scale_pattern(&c_major(), &[0], 6).is_err());
    }

    #[test]
    fn test_random_walk_is_reproducible() {
        let generator = MelodyGenerator::default();
        let scale = c_major();
        let first = generator.random_walk(60, 16, &scale, 3, 42).unwrap();
        let second = generator.random_walk(60, 16, &scale, 3, 42).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.len(), 16);
        assert_eq!(first[0].pitch(), 60);

        let other = generator.random_walk(60, 16, &scale, 3, 7).unwrap();
        assert_ne!(first.pitches(), other.pitches());
    }

    #[test]
    fn test_random_walk_stays_in_scale_and_range() {
        let generator = MelodyGenerator::default();
        let scale = Scale::build(120, ScaleType::MajorPentatonic).unwrap();
        let melody = generator.random_walk(124, 200, &scale, 12, 1).unwrap();
        for note in &melody {
            assert!(scale.contains(note.pitch()));
            assert!(note.pitch() <= 127);
        }

        let low = Scale::build(0, ScaleType::Minor).unwrap();
        let melody = generator.random_walk(0, 200, &low, 12, 9).unwrap();
        assert!(melody.iter().all(|n| low.contains(n.pitch())));
    }

    #[test]
    fn test_random_walk_rejects_foreign_start() {
        let generator = MelodyGenerator::default();
        assert_eq!(
            generator.random_walk(61, 8, &c_major(), 3, 42),
            Err(MidiGenError::NotInScale(61))
        );
    }

    #[test]
    fn test_reflect() {
        assert_eq!(reflect(-3), 3);
        assert_eq!(reflect(130), 124);
        assert_eq!(reflect(64), 64);
        assert_eq!(reflect(382), 126);
    }

    #[test]
    fn test_transpose_round_trip() {
        let generator = MelodyGenerator::default();
        let melody = generator.from_note_names("C4 D4 E4 G4", Durations::Uniform(240)).unwrap();
        let back = melody.transpose(5).unwrap().transpose(-5).unwrap();
        assert_eq!(back, melody);
        assert!(matches!(
            melody.transpose(100),
            Err(MidiGenError::OutOfRange { .. })
        ));
    }

    #[test]
    fn test_reverse_mirrors_in_time() {
        let generator = MelodyGenerator::default();
        let melody = generator
            .from_note_names("C4 E4 G4", Durations::Each(vec![480, 240, 960]))
            .unwrap();
        let reversed = melody.reverse();
        assert_eq!(reversed.pitches(), vec![67, 64, 60]);
        let times: Vec<Ticks> = reversed.iter().map(|n| n.time()).collect();
        assert_eq!(times, vec![0, 960, 1200]);
        assert_eq!(reversed.duration(), melody.duration());
        assert_eq!(reversed.reverse(), melody);
        assert_eq!(Melody::default().reverse(), Melody::default());
    }
}
