//! Bandpass with coefficients blended from precomputed tables.
//!
//! Each note carries a low-Q and a high-Q coefficient triple. The frequency
//! nudge blends toward the next note's triples, then the resonance blends
//! from the low-Q toward the high-Q set along a logarithmic curve.

// Based on MIT-licensed code (c) Dan Green (danngreen1@gmail.com) and Hugo Paris (hugoplho@gmail.com)

use super::coefficients::BpreTriples;
use super::history::{FilterHistory, Slot};
use super::{glide_voct, input_clipped, Block, FilterOut};
use crate::resources::lut::log_4096;
use crate::resources::scales::BPRE_COEFFICIENTS;
use crate::utils::{crossfade, lookup_f};
use crate::{NUM_CHANNELS, NUM_FILTS};

/// Resonance above which the high-Q triple is used alone.
const HIGH_Q_THRESHOLD: f32 = 4065.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BpreCoefficients {
    /// Input gain.
    pub c0: f32,
    /// Feedback of the older output sample.
    pub c1: f32,
    /// Feedback of the newer output sample.
    pub c2: f32,
}

impl BpreCoefficients {
    /// Blends the triples of a note and its upper neighbour by `nudge` and
    /// the low-Q and high-Q sets by the resonance `q`.
    pub fn new(note: &BpreTriples, next: &BpreTriples, nudge: f32, q: f32) -> Self {
        let nudge = nudge_fraction(nudge);
        let resonance = resonance_fraction(q);

        let c: [f32; BPRE_COEFFICIENTS] = core::array::from_fn(|i| {
            let lo = crossfade(note.lo[i], next.lo[i], nudge);
            let hi = crossfade(note.hi[i], next.hi[i], nudge);
            crossfade(lo, hi, resonance)
        });

        Self {
            c0: c[0],
            c1: c[1],
            c2: c[2],
        }
    }

    /// Filters `input` into `out`. Returns `true` if any input sample clipped.
    #[inline]
    pub fn process(&self, state: &mut Slot, input: &[i32], out: &mut [f32]) -> bool {
        let mut clipped = false;

        for (&x, out) in input.iter().zip(out.iter_mut()) {
            clipped |= input_clipped(x);

            let older = state[0];
            state[0] = state[1];

            let iir = x as f32 * self.c0 - self.c1 * older - self.c2 * state[0];
            state[1] = iir;

            *out = iir - older;
        }

        clipped
    }
}

/// Fraction of the way toward the next note, snapped at both ends.
#[inline]
pub fn nudge_fraction(nudge: f32) -> f32 {
    if nudge < 0.002 {
        0.0
    } else if nudge > 0.998 {
        1.0
    } else {
        nudge
    }
}

/// Share of the high-Q triple for a resonance value.
#[inline]
pub fn resonance_fraction(q: f32) -> f32 {
    if q > HIGH_Q_THRESHOLD {
        1.0
    } else {
        lookup_f(log_4096(), q)
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
        let note = block.channels[channel].note;
        let scale = block.channels[channel].scale;

        clipped |= run(block, channel, scale, note, history, &mut filter_out[channel]);

        voct[channel] = tuning(block, channel, scale, note);

        if block.controls.morphing(channel) {
            let (note, scale) = block.controls.fadeto(channel);

            run(
                block,
                channel,
                scale,
                note,
                history,
                &mut filter_out[channel + NUM_CHANNELS],
            );

            let target = tuning(block, channel, scale, note);
            glide_voct(&mut voct[channel], target, block.controls, channel);
        } else {
            filter_out[channel + NUM_CHANNELS].fill(0.0);
        }
    }

    clipped
}

fn tuning(block: &Block, channel: usize, scale: usize, note: usize) -> f32 {
    block
        .store
        .bpre_tuning(block.channels[channel].scale_bank, scale, note)
}

fn run(
    block: &Block,
    channel: usize,
    scale: usize,
    note: usize,
    history: &mut FilterHistory,
    out: &mut [f32],
) -> bool {
    let bank = block.channels[channel].scale_bank;
    let next_note = (note + 1).min(NUM_FILTS);

    let coefficients = BpreCoefficients::new(
        &block.store.bpre(bank, scale, note),
        &block.store.bpre(bank, scale, next_note),
        block.controls.freq_nudge[channel],
        block.controls.q(channel),
    );

    coefficients.process(
        history.slot_mut(channel, scale, note),
        &block.input[channel],
        out,
    )
}
