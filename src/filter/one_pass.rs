//! Single max-Q resonator with resonance gain compensation.

// Based on MIT-licensed code (c) Dan Green (danngreen1@gmail.com) and Hugo Paris (hugoplho@gmail.com)

use super::history::{FilterHistory, Slot};
use super::{glide_voct, input_clipped, resonance_coefficient, resonate, Block, FilterOut};
use crate::{NUM_CHANNELS, NUM_SAMPLES};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OnePassCoefficients {
    /// Pole radius.
    pub c0: f32,
    /// Frequency coefficient.
    pub c1: f32,
    /// Input gain.
    pub c2: f32,
}

impl OnePassCoefficients {
    pub fn new(q: f32, c1: f32, freq_scale: f32) -> Self {
        let c0 = resonance_coefficient(q, freq_scale);
        let c2 = (0.003 * c1 - 0.1 * c0 + 0.102) * ((4096.0 - q) / 1024.0 + 1.04);

        Self { c0, c1, c2 }
    }

    /// Filters `input` into `out`. Returns `true` if any input sample clipped.
    #[inline]
    pub fn process(&self, state: &mut Slot, input: &[i32], out: &mut [f32]) -> bool {
        let mut clipped = false;

        for (&x, out) in input.iter().zip(out.iter_mut()) {
            clipped |= input_clipped(x);
            *out = resonate(state, self.c0, self.c1, self.c2, x as f32);
        }

        clipped
    }
}

pub(crate) fn render(
    block: &Block,
    history: &mut FilterHistory,
    filter_out: &mut FilterOut,
    voct: &mut [f32; NUM_CHANNELS],
) -> bool {
    let mut clipped = false;

    for channel in 0..NUM_CHANNELS {
        let q = block.controls.q(channel);
        let input: &[i32; NUM_SAMPLES] = &block.input[channel];

        let note = block.channels[channel].note;
        let scale = block.channels[channel].scale;
        let c1 = block.frequency(channel, scale, note);

        clipped |= OnePassCoefficients::new(q, c1, block.freq_scale).process(
            history.slot_mut(channel, scale, note),
            input,
            &mut filter_out[channel],
        );

        voct[channel] = c1;

        if block.controls.morphing(channel) {
            let (note, scale) = block.controls.fadeto(channel);
            let c1 = block.frequency(channel, scale, note);

            OnePassCoefficients::new(q, c1, block.freq_scale).process(
                history.slot_mut(channel, scale, note),
                input,
                &mut filter_out[channel + NUM_CHANNELS],
            );

            glide_voct(&mut voct[channel], c1, block.controls, channel);
        } else {
            filter_out[channel + NUM_CHANNELS].fill(0.0);
        }
    }

    clipped
}
