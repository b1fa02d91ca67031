//! Rate-converting audio I/O.
//!
//! The host delivers one frame per tick at its own sample rate. Frames are
//! queued per input stream, converted to the internal rate a block at a time,
//! quantized to the signed 12-bit range and fanned out to the six engine
//! channels. The engine output is folded into the output streams, converted
//! back to the host rate and handed out one frame per tick.

// Based on MIT-licensed code (c) Dan Green (danngreen1@gmail.com) and Hugo Paris (hugoplho@gmail.com)

pub mod layout;
pub mod noise;
pub mod resampler;
pub mod ring_buffer;

use alloc::boxed::Box;

use log::debug;

use self::layout::{fold, InputLayout, OutputMode, StreamSource};
use self::noise::{noise, InputSource, NoiseColor};
use self::resampler::Resampler;
use self::ring_buffer::RingBuffer;
use crate::error::Error;
use crate::filter::{InputBlock, OutputBlock};
use crate::{CpuMode, MAX_12BIT, MIN_12BIT, NUM_CHANNELS, NUM_SAMPLES};

/// Samples each stream can queue on either side.
pub const RING_CAPACITY: usize = 512;

/// Voltage of a full scale sample on the host side.
pub const VOLTAGE_SCALE: f32 = 5.0;

/// I/O settings.
#[derive(Debug, Clone, PartialEq)]
pub struct IoConfig {
    /// Host sample rate in Hz. Default is `48000.0`.
    pub host_sample_rate: f32,

    /// Internal rate selection. Default is [`CpuMode::Low`].
    pub cpu_mode: CpuMode,

    /// Output stream layout. Default is [`OutputMode::Mono`].
    pub output_mode: OutputMode,

    /// Noise fed to the engine while no input is connected. Default is
    /// [`NoiseColor::Pink`].
    pub noise_color: NoiseColor,

    /// Seed of the noise source.
    pub noise_seed: u32,
}

impl Default for IoConfig {
    fn default() -> Self {
        Self {
            host_sample_rate: 48000.0,
            cpu_mode: CpuMode::default(),
            output_mode: OutputMode::default(),
            noise_color: NoiseColor::default(),
            noise_seed: 0x21,
        }
    }
}

/// Progress of the block cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PipelineState {
    /// Waiting for the output to drain and enough input to queue up.
    #[default]
    AwaitingInput,
    /// Converting queued input to the internal rate.
    Resampling,
    /// Engine running on the converted block.
    EngineProcess,
    /// Folding and converting the engine output to the host rate.
    Recompose,
    /// Output queued, handed out one frame per tick.
    AwaitingOutputDrain,
}

#[derive(Debug, Clone)]
struct InputStream {
    ring: RingBuffer<f32, RING_CAPACITY>,
    resampler: Resampler,
    block: [f32; NUM_SAMPLES],
}

#[derive(Debug, Clone)]
struct OutputStream {
    ring: RingBuffer<f32, RING_CAPACITY>,
    resampler: Resampler,
}

#[derive(Debug, Clone)]
pub struct AudioIo {
    config: IoConfig,
    input_layout: InputLayout,
    input_channels: usize,
    inputs: [InputStream; NUM_CHANNELS],
    outputs: [OutputStream; NUM_CHANNELS],
    noise: Box<dyn InputSource>,
    engine_in: InputBlock,
    engine_out: OutputBlock,
    staging: [[f32; NUM_SAMPLES]; NUM_CHANNELS],
    frame: [f32; NUM_CHANNELS],
    state: PipelineState,
}

impl Default for AudioIo {
    fn default() -> Self {
        Self::new(IoConfig::default())
    }
}

impl AudioIo {
    /// Creates the pipeline. An unsupported host rate is replaced by the
    /// default.
    pub fn new(mut config: IoConfig) -> Self {
        if validate_rate(config.host_sample_rate).is_err() {
            config.host_sample_rate = IoConfig::default().host_sample_rate;
        }

        let host_rate = config.host_sample_rate;
        let internal_rate = config.cpu_mode.internal_sample_rate();

        Self {
            input_layout: InputLayout::default(),
            input_channels: 0,
            inputs: core::array::from_fn(|_| InputStream {
                ring: RingBuffer::new(),
                resampler: Resampler::new(host_rate, internal_rate),
                block: [0.0; NUM_SAMPLES],
            }),
            outputs: core::array::from_fn(|_| OutputStream {
                ring: RingBuffer::new(),
                resampler: Resampler::new(internal_rate, host_rate),
            }),
            noise: noise(config.noise_color, config.noise_seed),
            engine_in: [[0; NUM_SAMPLES]; NUM_CHANNELS],
            engine_out: [[0.0; NUM_SAMPLES]; NUM_CHANNELS],
            staging: [[0.0; NUM_SAMPLES]; NUM_CHANNELS],
            frame: [0.0; NUM_CHANNELS],
            state: PipelineState::default(),
            config,
        }
    }

    /// Flushes all queued audio and restarts the block cycle.
    pub fn reset(&mut self) {
        for stream in self.inputs.iter_mut() {
            stream.ring.clear();
            stream.resampler.reset();
        }
        self.reset_outputs();
        self.noise = noise(self.config.noise_color, self.config.noise_seed);
        self.frame = [0.0; NUM_CHANNELS];
        self.state = PipelineState::AwaitingInput;
    }

    fn reset_outputs(&mut self) {
        for stream in self.outputs.iter_mut() {
            stream.ring.clear();
            stream.resampler.reset();
        }
    }

    pub fn config(&self) -> &IoConfig {
        &self.config
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    pub fn input_layout(&self) -> InputLayout {
        self.input_layout
    }

    pub fn host_sample_rate(&self) -> f32 {
        self.config.host_sample_rate
    }

    /// Changes the host rate, applied from the next tick on. Rates too high
    /// for a block of input to fit the input rings are rejected.
    pub fn set_host_sample_rate(&mut self, sample_rate: f32) -> Result<(), Error> {
        validate_rate(sample_rate)?;

        if sample_rate != self.config.host_sample_rate {
            debug!("host sample rate change to {sample_rate} Hz");
            self.config.host_sample_rate = sample_rate;
        }

        Ok(())
    }

    pub fn set_cpu_mode(&mut self, cpu_mode: CpuMode) {
        if cpu_mode != self.config.cpu_mode {
            debug!("internal sample rate change to {} Hz", cpu_mode.internal_sample_rate());
            self.config.cpu_mode = cpu_mode;
        }
    }

    pub fn output_mode(&self) -> OutputMode {
        self.config.output_mode
    }

    /// Changes the output layout. Queued output is discarded.
    pub fn set_output_mode(&mut self, output_mode: OutputMode) {
        if output_mode != self.config.output_mode {
            debug!("output mode change to {output_mode:?}");
            self.config.output_mode = output_mode;
            self.reset_outputs();
        }
    }

    pub fn set_noise_color(&mut self, noise_color: NoiseColor) {
        if noise_color != self.config.noise_color {
            self.config.noise_color = noise_color;
            self.noise = noise(noise_color, self.config.noise_seed);
        }
    }

    /// Processes one host frame.
    ///
    /// `input` holds one voltage per connected host input channel. `engine`
    /// is called whenever a block is due. One voltage per active output
    /// stream is written to `output`, the remaining entries are zeroed. The
    /// previous frame is repeated while no output is ready.
    ///
    /// Returns the number of active output streams.
    pub fn tick<F>(&mut self, input: &[f32], output: &mut [f32; NUM_CHANNELS], engine: F) -> usize
    where
        F: FnOnce(&InputBlock, &mut OutputBlock),
    {
        self.update_input_layout(input.len());
        self.update_rates();
        self.populate_input(input);

        if self.outputs[0].ring.is_empty() {
            if self.input_ready() {
                self.process_block(engine);
            } else {
                self.state = PipelineState::AwaitingInput;
            }
        }

        self.pop_output(output)
    }

    fn update_input_layout(&mut self, channels: usize) {
        if channels == self.input_channels {
            return;
        }

        let layout = InputLayout::from_channel_count(channels);
        debug!("{channels} input channels connected, {layout:?} layout");

        if layout != self.input_layout {
            for stream in self.inputs.iter_mut() {
                stream.ring.clear();
                stream.resampler.reset();
            }
        }

        self.input_channels = channels;
        self.input_layout = layout;
    }

    fn update_rates(&mut self) {
        let host_rate = self.config.host_sample_rate;
        let internal_rate = self.config.cpu_mode.internal_sample_rate();

        for stream in self.inputs.iter_mut() {
            stream.resampler.set_rates(host_rate, internal_rate);
        }
        for stream in self.outputs.iter_mut() {
            stream.resampler.set_rates(internal_rate, host_rate);
        }
    }

    fn populate_input(&mut self, input: &[f32]) {
        for stream in 0..self.input_layout.streams() {
            if self.inputs[stream].ring.is_full() {
                continue;
            }

            let sample = match StreamSource::for_stream(stream, input.len()) {
                StreamSource::Noise => self.noise.next(),
                StreamSource::Channel(channel) => input[channel] / VOLTAGE_SCALE,
            };

            self.inputs[stream].ring.push(sample);
        }
    }

    fn input_ready(&self) -> bool {
        self.inputs[..self.input_layout.streams()]
            .iter()
            .all(|stream| stream.ring.len() >= stream.resampler.required_input(NUM_SAMPLES))
    }

    fn process_block<F>(&mut self, engine: F)
    where
        F: FnOnce(&InputBlock, &mut OutputBlock),
    {
        self.state = PipelineState::Resampling;

        for (index, stream) in self.inputs[..self.input_layout.streams()]
            .iter_mut()
            .enumerate()
        {
            let InputStream {
                ring,
                resampler,
                block,
            } = stream;

            let (consumed, _) = resampler.process(ring.as_slice(), block);
            ring.consume(consumed);

            for (i, &sample) in block.iter().enumerate() {
                let value = quantize(sample);
                for channel in self.input_layout.targets(index) {
                    self.engine_in[channel][i] = value;
                }
            }
        }

        self.state = PipelineState::EngineProcess;
        engine(&self.engine_in, &mut self.engine_out);

        self.state = PipelineState::Recompose;
        fold(self.config.output_mode, &self.engine_out, &mut self.staging);

        let mut scratch = [0.0; RING_CAPACITY];

        for (stream, staged) in self.outputs[..self.config.output_mode.streams()]
            .iter_mut()
            .zip(self.staging.iter())
        {
            let free = stream.ring.free();
            let (_, produced) = stream.resampler.process(staged, &mut scratch[..free]);
            stream.ring.extend(&scratch[..produced]);
        }

        self.state = PipelineState::AwaitingOutputDrain;
    }

    fn pop_output(&mut self, output: &mut [f32; NUM_CHANNELS]) -> usize {
        let streams = self.config.output_mode.streams();
        let active = &mut self.outputs[..streams];

        if active.iter().all(|stream| !stream.ring.is_empty()) {
            for (frame, stream) in self.frame.iter_mut().zip(active.iter_mut()) {
                *frame = stream.ring.pop().unwrap_or_default() * VOLTAGE_SCALE;
            }
        }

        for (i, out) in output.iter_mut().enumerate() {
            *out = if i < streams { self.frame[i] } else { 0.0 };
        }

        if self.outputs[0].ring.is_empty() {
            self.state = PipelineState::AwaitingInput;
        }

        streams
    }
}

/// Scales a normalized sample to the signed 12-bit range, truncating.
#[inline]
pub fn quantize(sample: f32) -> i32 {
    (sample * MAX_12BIT).clamp(MIN_12BIT, MAX_12BIT) as i32
}

/// Accepts finite positive host rates whose input for one block, at the
/// lower internal rate, fits an input ring.
fn validate_rate(sample_rate: f32) -> Result<(), Error> {
    let step = sample_rate / CpuMode::Low.internal_sample_rate();
    let queued = step * (NUM_SAMPLES + 1) as f32 + 2.0;

    if sample_rate.is_finite() && sample_rate > 0.0 && queued <= RING_CAPACITY as f32 {
        Ok(())
    } else {
        Err(Error::InvalidSampleRate(sample_rate))
    }
}
