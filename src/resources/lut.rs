//! Resonance lookup tables.
//!
//! All three tables are indexed by a resonance control value on the 12-bit
//! `0..4095` scale (or an offset of it) and read through clamped lookups.

// Based on MIT-licensed code (c) Dan Green (danngreen1@gmail.com) and Hugo Paris (hugoplho@gmail.com)

use spin::Once;

#[allow(unused_imports)]
use num_traits::float::Float;

pub const LUT_SIZE: usize = 4096;

/// Entries in the two-pass calibration table. Indexed by `q_b - 900`, where
/// `q_b` spans `1000..=3925`.
pub const TWOPASS_CALIBRATION_SIZE: usize = 3380;

/// Calibration value at the resting second-pass resonance (`q_b = 1000`).
/// Dividing by a table entry yields the second-pass gain correction.
pub const CALIBRATION_GAIN: f32 = 43801543.68;

/// Resonance values at which the decay time curve is anchored.
const DECAY_INDEX_MIN: f32 = 200.0;
const DECAY_INDEX_MAX: f32 = 3125.0;

/// Decay times in seconds at the two anchors.
const DECAY_MIN: f32 = 0.01;
const DECAY_MAX: f32 = 4.0;

/// Resting resonance of the second pass.
const Q_B_REST: f32 = 1000.0;

static EXP_4096: Once<[f32; LUT_SIZE]> = Once::new();
static LOG_4096: Once<[f32; LUT_SIZE]> = Once::new();
static TWOPASS_CALIBRATION: Once<[f32; TWOPASS_CALIBRATION_SIZE]> = Once::new();

/// Decay time in seconds reached at table index `i`. Exponential between the
/// anchors, extrapolated beyond them.
fn decay_time(i: f32) -> f32 {
    let position = (i - DECAY_INDEX_MIN) / (DECAY_INDEX_MAX - DECAY_INDEX_MIN);
    DECAY_MIN * (DECAY_MAX / DECAY_MIN).powf(position)
}

/// Exponential resonance table.
///
/// Entry `i` is `10 * 2 / (decay * 96000)`, so that
/// `c0 = 1 - EXP[i] / (10 / freq_scale)` is the pole radius giving that decay
/// time at the internal rate. Strictly decreasing and positive.
pub fn exp_4096() -> &'static [f32; LUT_SIZE] {
    EXP_4096.call_once(|| core::array::from_fn(|i| 20.0 / (decay_time(i as f32) * 96000.0)))
}

/// Logarithmic resonance fraction, rising from `0.0` at index 0 to `1.0` at
/// the last index.
pub fn log_4096() -> &'static [f32; LUT_SIZE] {
    LOG_4096.call_once(|| {
        let norm = 1.0 / (LUT_SIZE as f32).ln();
        core::array::from_fn(|i| (1.0 + i as f32).ln() * norm)
    })
}

/// Second-pass gain calibration.
///
/// The second pass gains roughly `1 / (1 - c0)` as its resonance rises. Each
/// entry is [`CALIBRATION_GAIN`] scaled by that gain relative to the resting
/// resonance, so `CALIBRATION_GAIN / entry` keeps the passband level constant.
pub fn twopass_calibration() -> &'static [f32; TWOPASS_CALIBRATION_SIZE] {
    TWOPASS_CALIBRATION.call_once(|| {
        let exp = exp_4096();
        let rest = exp[exp_index(Q_B_REST)];
        core::array::from_fn(|i| {
            let q_b = (i + 900) as f32;
            CALIBRATION_GAIN * rest / exp[exp_index(q_b)]
        })
    })
}

/// Position in [`exp_4096`] for a resonance value.
#[inline]
pub fn exp_index(q: f32) -> usize {
    let index = q / 1.4 + DECAY_INDEX_MIN;
    if index > 0.0 {
        (index as usize).min(LUT_SIZE - 1)
    } else {
        0
    }
}
