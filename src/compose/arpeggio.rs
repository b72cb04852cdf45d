//! Arpeggios: a chord's notes played one after another in a pattern.

use crate::error::{MidiGenError, Result};
use crate::midi::{Chord, Note};
use crate::theory::Ticks;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArpeggioPattern {
    /// Lowest to highest.
    #[default]
    Ascending,
    /// Highest to lowest.
    Descending,
    /// Up then back down, without repeating the top or bottom note.
    Alternating,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Arpeggio {
    notes: Vec<Note>,
    pattern: ArpeggioPattern,
    delay: i64,
    loops: u32,
}

impl Arpeggio {
    /// Describes an arpeggio. Nothing is validated until [`expand`](Self::expand).
    pub fn new(notes: Vec<Note>, pattern: ArpeggioPattern, delay: i64, loops: u32) -> Self {
        Self {
            notes,
            pattern,
            delay,
            loops,
        }
    }

    pub fn from_chord(chord: &Chord, pattern: ArpeggioPattern, delay: i64, loops: u32) -> Self {
        Self::new(chord.notes().to_vec(), pattern, delay, loops)
    }

    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    pub fn pattern(&self) -> ArpeggioPattern {
        self.pattern
    }

    pub fn delay(&self) -> i64 {
        self.delay
    }

    pub fn loops(&self) -> u32 {
        self.loops
    }

    /// The order notes are played in during one loop.
    fn cycle(&self) -> Vec<Note> {
        let mut ascending = self.notes.clone();
        ascending.sort_by_key(|n| n.pitch());

        match self.pattern {
            ArpeggioPattern::Ascending => ascending,
            ArpeggioPattern::Descending => {
                ascending.reverse();
                ascending
            }
            ArpeggioPattern::Alternating => {
                let len = ascending.len();
                let inner_descent: Vec<Note> = if len > 2 {
                    ascending[1..len - 1].iter().rev().copied().collect()
                } else {
                    Vec::new()
                };
                ascending.extend(inner_descent);
                ascending
            }
        }
    }

    /// Expands into timed notes.
    ///
    /// The i-th emitted note starts at `first + i * delay`, where `first` is
    /// the earliest start among the source notes. Pitch, velocity and
    /// duration come from the source note.
    ///
    /// ```
    /// use midigen::compose::{Arpeggio, ArpeggioPattern};
    /// use midigen::midi::Chord;
    ///
    /// let chord = Chord::from_pitches(&[60, 64, 67, 71], 90, 120, 0).unwrap();
    /// let notes = Arpeggio::from_chord(&chord, ArpeggioPattern::Ascending, 120, 4)
    ///     .expand()
    ///     .unwrap();
    /// assert_eq!(notes.len(), 16);
    /// ```
    ///
    /// # Errors
    ///
    /// `EmptyChord` when there are no notes, `InvalidDelay` when the delay
    /// is negative.
    pub fn expand(&self) -> Result<Vec<Note>> {
        if self.notes.is_empty() {
            return Err(MidiGenError::EmptyChord);
        }
        if self.delay < 0 {
            return Err(MidiGenError::InvalidDelay(self.delay));
        }

        let first = self.notes.iter().map(|n| n.time()).min().unwrap_or(0);
        let delay = self.delay as Ticks;
        let cycle = self.cycle();

        Ok(cycle
            .iter()
            .cycle()
            .take(cycle.len() * self.loops as usize)
            .enumerate()
            .map(|(i, note)| note.with_time(first + i as Ticks * delay))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seventh_chord(time: Ticks) -> Vec<Note> {
        [67, 60, 71, 64]
            .iter()
            .map(|&p| Note::new(p, 90, 100, time).unwrap())
            .collect()
    }

    #[test]
    fn test_ascending_four_loops() {
        let arpeggio = Arpeggio::new(seventh_chord(0), ArpeggioPattern::Ascending, 120, 4);
        let notes = arpeggio.expand().unwrap();
        assert_eq!(notes.len(), 16);
        for pair in notes.windows(2) {
            assert_eq!(pair[1].time() - pair[0].time(), 120);
        }
        let first_loop: Vec<u8> = notes[..4].iter().map(|n| n.pitch()).collect();
        assert_eq!(first_loop, vec![60, 64, 67, 71]);
        assert_eq!(notes[4].pitch(), 60);
    }

    #[test]
    fn test_descending_starts_at_chord_time() {
        let arpeggio = Arpeggio::new(seventh_chord(960), ArpeggioPattern::Descending, 60, 1);
        let notes = arpeggio.expand().unwrap();
        let pitches: Vec<u8> = notes.iter().map(|n| n.pitch()).collect();
        assert_eq!(pitches, vec![71, 67, 64, 60]);
        assert_eq!(notes[0].time(), 960);
        assert_eq!(notes[3].time(), 1140);
    }

    #[test]
    fn test_alternating_skips_repeated_endpoints() {
        let arpeggio = Arpeggio::new(seventh_chord(0), ArpeggioPattern::Alternating, 120, 2);
        let pitches: Vec<u8> = arpeggio.expand().unwrap().iter().map(|n| n.pitch()).collect();
        assert_eq!(
            pitches,
            vec![60, 64, 67, 71, 67, 64, 60, 64, 67, 71, 67, 64]
        );

        let dyad: Vec<Note> = [60, 67].iter().map(|&p| Note::new(p, 90, 100, 0).unwrap()).collect();
        let arpeggio = Arpeggio::new(dyad, ArpeggioPattern::Alternating, 120, 3);
        assert_eq!(arpeggio.expand().unwrap().len(), 6);
    }

    #[test]
    fn test_zero_delay_stacks_notes() {
        let arpeggio = Arpeggio::new(seventh_chord(240), ArpeggioPattern::Ascending, 0, 1);
        assert!(arpeggio.expand().unwrap().iter().all(|n| n.time() == 240));
    }

    #[test]
    fn test_errors() {
        let empty = Arpeggio::new(Vec::new(), ArpeggioPattern::Ascending, 120, 1);
        assert_eq!(empty.expand(), Err(MidiGenError::EmptyChord));

        let backwards = Arpeggio::new(seventh_chord(0), ArpeggioPattern::Ascending, -10, 1);
        assert_eq!(backwards.expand(), Err(MidiGenError::InvalidDelay(-10)));
    }
}
