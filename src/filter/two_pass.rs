//! Two cascaded max-Q resonators.
//!
//! The first pass runs at up to twice the resonance, the second at a fixed
//! moderate resonance that only rises at the very top of the range. The
//! output crossfades from the first pass alone to the (inverted) second pass
//! alone as the resonance moves through the crossfade region.

// Based on MIT-licensed code (c) Dan Green (danngreen1@gmail.com) and Hugo Paris (hugoplho@gmail.com)

use super::history::FilterHistory;
use super::{
    glide_voct, input_clipped, resonance_coefficient, resonate, Block, FilterOut,
    CROSSFADE_MAX, CROSSFADE_MIN, CROSSFADE_WIDTH, Q_MAX,
};
use crate::resources::lut::{twopass_calibration, CALIBRATION_GAIN};
use crate::utils::lookup;
use crate::{NUM_CHANNELS, NUM_SAMPLES};

/// Second-pass resonance below the top of the control range.
const Q_B_REST: f32 = 1000.0;

/// Resonance at which the second pass starts to sharpen.
const Q_B_KNEE: f32 = 3900.0;

/// Offset of the calibration table index.
const CALIBRATION_OFFSET: f32 = 900.0;

/// Resonance dependent coefficients of both passes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TwoPassResonance {
    /// Pole radius of the first pass.
    pub c0_a: f32,
    /// Pole radius of the second pass.
    pub c0: f32,
    /// Level of the first pass in the output.
    pub ratio_a: f32,
    /// Calibrated input gain of the second pass.
    pub ratio_b: f32,
}

impl TwoPassResonance {
    pub fn new(q: f32, freq_scale: f32) -> Self {
        let q_a = (q * 2.0).min(Q_MAX);
        let q_b = if q < Q_B_KNEE {
            Q_B_REST
        } else {
            Q_B_REST + (q - Q_B_KNEE) * 15.0
        };

        let ratio_a = if q < CROSSFADE_MIN {
            1.0
        } else if q > CROSSFADE_MAX {
            0.0
        } else {
            1.0 - (q - CROSSFADE_MIN) / CROSSFADE_WIDTH
        };

        let calibration = lookup(
            twopass_calibration(),
            (q_b - CALIBRATION_OFFSET) as usize,
        );

        Self {
            c0_a: resonance_coefficient(q_a, freq_scale),
            c0: resonance_coefficient(q_b, freq_scale),
            ratio_a,
            ratio_b: (1.0 - ratio_a) * CALIBRATION_GAIN / calibration,
        }
    }

    /// Input gains `(c2_a, c2)` of both passes at frequency coefficient `c1`.
    #[inline]
    pub fn amplitudes(&self, c1: f32) -> (f32, f32) {
        let c2_a = 0.003 * c1 - 0.1 * self.c0_a + 0.102;
        let c2 = (0.003 * c1 - 0.1 * self.c0 + 0.102) * self.ratio_b;

        (c2_a, c2)
    }
}

/// Runs one block. Returns `true` if any input sample clipped.
pub(crate) fn render(
    block: &Block,
    history_a: &mut FilterHistory,
    history_b: &mut FilterHistory,
    filter_out: &mut FilterOut,
    voct: &mut [f32; NUM_CHANNELS],
) -> bool {
    let mut clipped = false;

    for channel in 0..NUM_CHANNELS {
        let resonance = TwoPassResonance::new(block.controls.q(channel), block.freq_scale);
        let input = &block.input[channel];

        let note = block.channels[channel].note;
        let scale = block.channels[channel].scale;
        let c1 = block.frequency(channel, scale, note);

        clipped |= run(
            &resonance,
            c1,
            input,
            history_a.slot_mut(channel, scale, note),
            history_b.slot_mut(channel, scale, note),
            &mut filter_out[channel],
        );

        voct[channel] = c1;

        if block.controls.morphing(channel) {
            let (note, scale) = block.controls.fadeto(channel);
            let c1 = block.frequency(channel, scale, note);

            run(
                &resonance,
                c1,
                input,
                history_a.slot_mut(channel, scale, note),
                history_b.slot_mut(channel, scale, note),
                &mut filter_out[channel + NUM_CHANNELS],
            );

            glide_voct(&mut voct[channel], c1, block.controls, channel);
        } else {
            filter_out[channel + NUM_CHANNELS].fill(0.0);
        }
    }

    clipped
}

fn run(
    resonance: &TwoPassResonance,
    c1: f32,
    input: &[i32; NUM_SAMPLES],
    state_a: &mut [f32; 3],
    state_b: &mut [f32; 3],
    out: &mut [f32; NUM_SAMPLES],
) -> bool {
    let (c2_a, c2) = resonance.amplitudes(c1);
    let mut clipped = false;

    for (&x, out) in input.iter().zip(out.iter_mut()) {
        clipped |= input_clipped(x);

        let a = resonate(state_a, resonance.c0_a, c1, c2_a, x as f32);
        let b = resonate(state_b, resonance.c0, c1, c2, a);

        // The second pass is inverted to avoid phase cancellation.
        *out = resonance.ratio_a * a - b;
    }

    clipped
}
