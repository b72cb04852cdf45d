//! MIDI channel allocation.
//!
//! MIDI has 16 channels (0-15). General MIDI reserves channel 9 for
//! percussion, which leaves 15 channels for melodic instruments.

use crate::error::{MidiGenError, Result};
use std::collections::{BTreeMap, BTreeSet};

/// The General MIDI percussion channel (the "10th channel").
pub const DRUM_CHANNEL: u8 = 9;

/// Number of channels in a MIDI stream.
pub const MIDI_CHANNELS: u8 = 16;

/// Hands out melodic channels to instruments, lowest first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelPool {
    available: BTreeSet<u8>,
    allocated: BTreeMap<String, u8>,
}

impl ChannelPool {
    pub fn new() -> Self {
        Self {
            available: (0..MIDI_CHANNELS).filter(|&c| c != DRUM_CHANNEL).collect(),
            allocated: BTreeMap::new(),
        }
    }

    /// Allocates a channel for an instrument. Asking again for the same
    /// instrument returns the channel it already holds.
    ///
    /// # Errors
    ///
    /// `ChannelExhausted` when all 15 melodic channels are taken.
    pub fn allocate(&mut self, instrument: &str) -> Result<u8> {
        if let Some(&channel) = self.allocated.get(instrument) {
            return Ok(channel);
        }
        let channel = self
            .available
            .pop_first()
            .ok_or_else(|| MidiGenError::ChannelExhausted(instrument.to_string()))?;
        self.allocated.insert(instrument.to_string(), channel);
        Ok(channel)
    }

    /// Returns an instrument's channel to the pool. Unknown names are ignored.
    pub fn release(&mut self, instrument: &str) {
        if let Some(channel) = self.allocated.remove(instrument) {
            self.available.insert(channel);
        }
    }

    /// Melodic channels still free.
    pub fn available_count(&self) -> usize {
        self.available.len()
    }
}

impl Default for ChannelPool {
    fn default() -> Self {
        Self::new()
    }
}
