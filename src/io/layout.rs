//! Stream layouts between host channels and the six engine channels.

// Based on MIT-licensed code (c) Dan Green (danngreen1@gmail.com) and Hugo Paris (hugoplho@gmail.com)

use crate::filter::OutputBlock;
use crate::{MAX_12BIT, NUM_CHANNELS, NUM_SAMPLES};

/// Host output layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputMode {
    /// All six channels summed into one stream.
    #[default]
    Mono,
    /// Even samples of the channel sum on stream 0, odd samples on stream 1.
    Stereo,
    /// One stream per channel.
    Hexa,
}

impl OutputMode {
    pub fn streams(&self) -> usize {
        match self {
            OutputMode::Mono => 1,
            OutputMode::Stereo => 2,
            OutputMode::Hexa => NUM_CHANNELS,
        }
    }
}

/// Input stream layout, derived from the number of connected host channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InputLayout {
    /// Two streams, each feeding every other channel.
    #[default]
    Pair,
    /// Three streams, each feeding two adjacent channels.
    Triple,
    /// One stream per channel.
    Hexa,
}

impl InputLayout {
    pub fn from_channel_count(count: usize) -> Self {
        match count {
            0..=2 => InputLayout::Pair,
            3 => InputLayout::Triple,
            _ => InputLayout::Hexa,
        }
    }

    pub fn streams(&self) -> usize {
        match self {
            InputLayout::Pair => 2,
            InputLayout::Triple => 3,
            InputLayout::Hexa => NUM_CHANNELS,
        }
    }

    /// Engine channels fed by `stream`.
    pub fn targets(&self, stream: usize) -> impl Iterator<Item = usize> {
        let (start, stride, count) = match self {
            InputLayout::Pair => (stream, 2, 3),
            InputLayout::Triple => (stream * 2, 1, 2),
            InputLayout::Hexa => (stream, 1, 1),
        };

        (0..count)
            .map(move |i| start + i * stride)
            .filter(|&channel| channel < NUM_CHANNELS)
    }
}

/// Where the sample for an input stream comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamSource {
    /// The noise source.
    Noise,
    /// A host input channel.
    Channel(usize),
}

impl StreamSource {
    /// Source of `stream` when `count` host channels are connected. A mono
    /// input feeds every stream, four or five inputs wrap around.
    pub fn for_stream(stream: usize, count: usize) -> Self {
        match count {
            0 => StreamSource::Noise,
            1 => StreamSource::Channel(0),
            _ => StreamSource::Channel(stream % count),
        }
    }
}

/// Folds the engine output into output streams, normalized to full scale.
/// Streams the mode does not use are zeroed.
pub fn fold(
    mode: OutputMode,
    block: &OutputBlock,
    streams: &mut [[f32; NUM_SAMPLES]; NUM_CHANNELS],
) {
    for stream in streams.iter_mut() {
        stream.fill(0.0);
    }

    for (channel, samples) in block.iter().enumerate() {
        for (i, &sample) in samples.iter().enumerate() {
            let value = sample / MAX_12BIT;

            match mode {
                OutputMode::Mono => streams[0][i] += value,
                OutputMode::Stereo => streams[i & 1][i] += value,
                OutputMode::Hexa => streams[channel][i] = value,
            }
        }
    }
}
