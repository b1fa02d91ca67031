//! Filter history arena.
//!
//! One `[f32; 3]` slot per (channel, scale, note), stored flat so that moving
//! between notes and scales is instantaneous and channels never share state.

use alloc::boxed::Box;
use alloc::vec;

use crate::{NUM_CHANNELS, NUM_FILTS, NUM_SCALES};

pub type Slot = [f32; 3];

const SLOTS_PER_CHANNEL: usize = NUM_SCALES * NUM_FILTS;

#[derive(Debug, Clone)]
pub struct FilterHistory {
    slots: Box<[Slot]>,
}

impl Default for FilterHistory {
    fn default() -> Self {
        Self::new()
    }
}

impl FilterHistory {
    pub fn new() -> Self {
        Self {
            slots: vec![[0.0; 3]; NUM_CHANNELS * SLOTS_PER_CHANNEL].into_boxed_slice(),
        }
    }

    #[inline]
    fn index(channel: usize, scale: usize, note: usize) -> usize {
        let channel = channel.min(NUM_CHANNELS - 1);
        let scale = scale.min(NUM_SCALES - 1);
        let note = note.min(NUM_FILTS - 1);

        channel * SLOTS_PER_CHANNEL + scale * NUM_FILTS + note
    }

    #[inline]
    pub fn slot(&self, channel: usize, scale: usize, note: usize) -> &Slot {
        &self.slots[Self::index(channel, scale, note)]
    }

    #[inline]
    pub fn slot_mut(&mut self, channel: usize, scale: usize, note: usize) -> &mut Slot {
        &mut self.slots[Self::index(channel, scale, note)]
    }

    /// All slots of a channel.
    pub fn channel(&self, channel: usize) -> &[Slot] {
        let start = channel.min(NUM_CHANNELS - 1) * SLOTS_PER_CHANNEL;
        &self.slots[start..start + SLOTS_PER_CHANNEL]
    }

    /// Zeroes every slot of a channel.
    pub fn clear_channel(&mut self, channel: usize) {
        let start = channel.min(NUM_CHANNELS - 1) * SLOTS_PER_CHANNEL;
        self.slots[start..start + SLOTS_PER_CHANNEL].fill([0.0; 3]);
    }

    pub fn clear(&mut self) {
        self.slots.fill([0.0; 3]);
    }
}
