//! Melodic material built on top of the theory layer: melodies and arpeggios.

mod arpeggio;
mod melody;

pub use arpeggio::{Arpeggio, ArpeggioPattern};
pub use melody::{Durations, Melody, MelodyGenerator};
