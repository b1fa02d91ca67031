//! Blends primary and morph target outputs into the block output.

// Based on MIT-licensed code (c) Dan Green (danngreen1@gmail.com) and Hugo Paris (hugoplho@gmail.com)

#[allow(unused_imports)]
use num_traits::float::Float;

use super::{BlockOutput, ControlFrame, FilterOut, CLIP_LEVEL};
use crate::utils::crossfade;
use crate::NUM_CHANNELS;

/// Blended sample of a channel at position `i`.
#[inline]
fn blend(filter_out: &FilterOut, pos: f32, channel: usize, i: usize) -> f32 {
    let primary = filter_out[channel][i];

    if pos == 0.0 {
        primary
    } else {
        crossfade(primary, filter_out[channel + NUM_CHANNELS][i], pos)
    }
}

/// Writes the level-scaled blend of every channel to `output.out`, and the
/// envelope preload and level diagnostic derived from its first sample.
pub fn compose(filter_out: &FilterOut, controls: &ControlFrame, output: &mut BlockOutput) {
    for channel in 0..NUM_CHANNELS {
        let pos = controls.morph_pos[channel];
        let level = controls.channel_level[channel];

        for (i, out) in output.out[channel].iter_mut().enumerate() {
            *out = blend(filter_out, pos, channel, i) * level;
        }

        let first = blend(filter_out, pos, channel, 0);
        output.env_preload[channel] = first.abs();
        output.channel_level[channel] = (first * level).abs() / CLIP_LEVEL;
    }
}
