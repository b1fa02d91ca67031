//! Six-channel resonant filter engine.
//!
//! Each block the engine turns a [`ControlFrame`] and [`NUM_SAMPLES`] input
//! samples per channel into filtered output using one of three algorithms:
//! - *Two-pass:* two cascaded max-Q resonators, crossfaded by resonance.
//! - *One-pass:* a single max-Q resonator with resonance gain compensation.
//! - *Bpre:* a bandpass whose coefficients are blended from low-Q and high-Q
//!   tables.
//!
//! Every algorithm also renders a morph target (the fade-to note and scale)
//! for channels whose morph position is non-zero, which the compositor blends
//! with the primary output.

// Based on MIT-licensed code (c) Dan Green (danngreen1@gmail.com) and Hugo Paris (hugoplho@gmail.com)

pub mod bpre;
pub mod coefficients;
pub mod history;
pub mod morph;
pub mod one_pass;
pub mod two_pass;

use log::debug;

use self::coefficients::CoefficientStore;
use self::history::{FilterHistory, Slot};
use crate::error::Error;
use crate::resources::lut::{exp_4096, exp_index};
use crate::resources::scales::presets;
use crate::{
    CpuMode, NUM_CHANNELS, NUM_FILTS, NUM_SAMPLES, NUM_SCALEBANKS, NUM_SCALES, USER_SCALE_BANK,
};

/// Largest frequency coefficient, about 20 kHz at the internal rate. Keeps
/// the resonators stable.
pub const F_MAX: f32 = 1.30899581;

/// Resonance below which the two-pass output is the first pass alone.
pub const CROSSFADE_MIN: f32 = 2000.0;

/// Resonance above which the two-pass output is the second pass alone.
pub const CROSSFADE_MAX: f32 = 3800.0;

pub const CROSSFADE_WIDTH: f32 = CROSSFADE_MAX - CROSSFADE_MIN;

/// Input level at which the clip indicator lights.
pub const INPUT_CLIP_LEVEL: u32 = 1950;

/// Output level the channel level diagnostic is normalized to.
pub const CLIP_LEVEL: f32 = 2047.0;

/// Resonance range of the control inputs.
pub const Q_MAX: f32 = 4095.0;

/// Engine input, one row of samples per channel.
pub type InputBlock = [[i32; NUM_SAMPLES]; NUM_CHANNELS];

/// Engine output, one row of samples per channel.
pub type OutputBlock = [[f32; NUM_SAMPLES]; NUM_CHANNELS];

/// Raw filter outputs. Rows `0..6` are the primary filters, rows `6..12` the
/// morph targets.
pub type FilterOut = [[f32; NUM_SAMPLES]; NUM_CHANNELS * 2];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FilterAlgorithm {
    /// Two cascaded max-Q resonators, crossfaded by resonance.
    #[default]
    TwoPass,
    /// Single max-Q resonator.
    OnePass,
    /// Bandpass blended between low-Q and high-Q tables.
    Bpre,
}

/// Note selection of one channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Channel {
    /// Note index in the range from `0` to `NUM_FILTS - 1`.
    pub note: usize,

    /// Scale index in the range from `0` to `NUM_SCALES - 1`.
    pub scale: usize,

    /// Bank index in the range from `0` to `NUM_SCALEBANKS - 1`.
    pub scale_bank: usize,

    /// Locked channels ignore bank changes.
    pub lock: bool,

    /// Resonance lock, read by the control layer that maps resonance.
    pub q_lock: bool,
}

impl Channel {
    /// Default selection of a channel: notes spread evenly around the ring.
    pub fn with_index(channel: usize) -> Self {
        Self {
            note: (channel * 3 + 2).min(NUM_FILTS - 1),
            scale: 0,
            scale_bank: 0,
            lock: false,
            q_lock: false,
        }
    }

    fn clamp(&mut self) {
        self.note = self.note.min(NUM_FILTS - 1);
        self.scale = self.scale.min(NUM_SCALES - 1);
        self.scale_bank = self.scale_bank.min(NUM_SCALEBANKS - 1);
    }
}

/// Control values for one block.
#[derive(Debug, Clone, PartialEq)]
pub struct ControlFrame {
    /// Resonance in the range from `0.0` to `4095.0`. Default is `2048.0`.
    pub q: [f32; NUM_CHANNELS],

    /// Frequency fine tune multiplier. Default is `1.0`. The bpre algorithm
    /// reads it as the fraction of the way toward the next note instead.
    pub freq_nudge: [f32; NUM_CHANNELS],

    /// Frequency transpose multiplier. Default is `1.0`.
    pub freq_shift: [f32; NUM_CHANNELS],

    /// Morph position in the range from `0.0` to `1.0`. Default is `0.0`.
    pub morph_pos: [f32; NUM_CHANNELS],

    /// Note the channel morphs toward.
    pub fadeto_note: [usize; NUM_CHANNELS],

    /// Scale the channel morphs toward.
    pub fadeto_scale: [usize; NUM_CHANNELS],

    /// Output level in the range from `0.0` to `1.0`. Default is `1.0`.
    pub channel_level: [f32; NUM_CHANNELS],

    /// Glide the pitch output along with the morph.
    pub glide: bool,
}

impl Default for ControlFrame {
    fn default() -> Self {
        Self {
            q: [2048.0; NUM_CHANNELS],
            freq_nudge: [1.0; NUM_CHANNELS],
            freq_shift: [1.0; NUM_CHANNELS],
            morph_pos: [0.0; NUM_CHANNELS],
            fadeto_note: core::array::from_fn(|i| Channel::with_index(i).note),
            fadeto_scale: [0; NUM_CHANNELS],
            channel_level: [1.0; NUM_CHANNELS],
            glide: false,
        }
    }
}

impl ControlFrame {
    /// Resonance of a channel, clamped to the control range.
    #[inline]
    pub(crate) fn q(&self, channel: usize) -> f32 {
        let q = self.q[channel];
        if q > 0.0 {
            q.min(Q_MAX)
        } else {
            0.0
        }
    }

    #[inline]
    pub(crate) fn morphing(&self, channel: usize) -> bool {
        self.morph_pos[channel] != 0.0
    }

    #[inline]
    pub(crate) fn fadeto(&self, channel: usize) -> (usize, usize) {
        (
            self.fadeto_note[channel].min(NUM_FILTS - 1),
            self.fadeto_scale[channel].min(NUM_SCALES - 1),
        )
    }
}

/// Everything the engine hands back after a block.
#[derive(Debug, Clone, PartialEq)]
pub struct BlockOutput {
    /// Level-scaled output samples.
    pub out: OutputBlock,

    /// Envelope follower preload, the magnitude of the first blended sample.
    pub env_preload: [f32; NUM_CHANNELS],

    /// Pitch output as a frequency coefficient.
    pub voct: [f32; NUM_CHANNELS],

    /// First output sample relative to [`CLIP_LEVEL`].
    pub channel_level: [f32; NUM_CHANNELS],

    /// At least one input sample reached [`INPUT_CLIP_LEVEL`].
    pub input_clip: bool,
}

impl Default for BlockOutput {
    fn default() -> Self {
        Self {
            out: [[0.0; NUM_SAMPLES]; NUM_CHANNELS],
            env_preload: [0.0; NUM_CHANNELS],
            voct: [0.0; NUM_CHANNELS],
            channel_level: [0.0; NUM_CHANNELS],
            input_clip: false,
        }
    }
}

/// Read-only inputs shared by the algorithms for one block.
pub(crate) struct Block<'a> {
    pub controls: &'a ControlFrame,
    pub input: &'a InputBlock,
    pub channels: &'a [Channel; NUM_CHANNELS],
    pub store: &'a CoefficientStore,
    pub freq_scale: f32,
}

impl Block<'_> {
    /// Max-Q frequency coefficient of a note on a channel, with the channel's
    /// trims applied and clamped to [`F_MAX`].
    #[inline]
    pub fn frequency(&self, channel: usize, scale: usize, note: usize) -> f32 {
        let c1 = self
            .store
            .maxq(self.channels[channel].scale_bank, scale, note)
            * self.controls.freq_nudge[channel]
            * self.controls.freq_shift[channel]
            * self.freq_scale;

        c1.min(F_MAX)
    }
}

/// Pole radius for a resonance value: `1 - EXP[q / 1.4 + 200] / (10 / freq_scale)`.
#[inline]
pub fn resonance_coefficient(q: f32, freq_scale: f32) -> f32 {
    1.0 - exp_4096()[exp_index(q)] / (10.0 / freq_scale)
}

/// Max-Q two-pole resonator step.
///
/// `h2 = c0·h1 + c1·h0 − c2·x; h0 = h0 − c1·h2; h1 = h2`, returns `h1`.
#[inline]
pub fn resonate(state: &mut Slot, c0: f32, c1: f32, c2: f32, x: f32) -> f32 {
    state[2] = (c0 * state[1] + c1 * state[0]) - c2 * x;
    state[0] -= c1 * state[2];
    state[1] = state[2];

    state[1]
}

#[inline]
pub(crate) fn input_clipped(x: i32) -> bool {
    x.unsigned_abs() >= INPUT_CLIP_LEVEL
}

/// Pitch output moved toward the morph target when gliding.
#[inline]
pub(crate) fn glide_voct(voct: &mut f32, target: f32, controls: &ControlFrame, channel: usize) {
    if controls.glide {
        let pos = controls.morph_pos[channel];
        *voct = *voct * (1.0 - pos) + target * pos;
    }
}

#[derive(Debug, Clone)]
pub struct Filter {
    channels: [Channel; NUM_CHANNELS],
    old_scale_bank: [usize; NUM_CHANNELS],

    algorithm: FilterAlgorithm,
    new_algorithm: FilterAlgorithm,
    algorithm_changed: bool,
    user_scale_changed: bool,

    freq_scale: f32,
    store: CoefficientStore,

    history_a: FilterHistory,
    history_b: FilterHistory,
    filter_out: FilterOut,
}

impl Default for Filter {
    fn default() -> Self {
        Self::new(CpuMode::default())
    }
}

impl Filter {
    pub fn new(cpu_mode: CpuMode) -> Self {
        let channels = core::array::from_fn(Channel::with_index);

        Self {
            channels,
            old_scale_bank: channels.map(|channel| channel.scale_bank),
            algorithm: FilterAlgorithm::default(),
            new_algorithm: FilterAlgorithm::default(),
            algorithm_changed: false,
            user_scale_changed: false,
            freq_scale: cpu_mode.freq_scale(),
            store: CoefficientStore::new(),
            history_a: FilterHistory::new(),
            history_b: FilterHistory::new(),
            filter_out: [[0.0; NUM_SAMPLES]; NUM_CHANNELS * 2],
        }
    }

    /// Restores the default channel selections and clears all filter state.
    /// A pending algorithm change is dropped. The user scale keeps its
    /// contents.
    pub fn reset(&mut self) {
        self.channels = core::array::from_fn(Channel::with_index);
        self.old_scale_bank = self.channels.map(|channel| channel.scale_bank);
        self.new_algorithm = self.algorithm;
        self.algorithm_changed = false;
        self.user_scale_changed = false;
        self.history_a.clear();
        self.history_b.clear();
    }

    pub fn channels(&self) -> &[Channel; NUM_CHANNELS] {
        &self.channels
    }

    pub fn channels_mut(&mut self) -> &mut [Channel; NUM_CHANNELS] {
        &mut self.channels
    }

    /// Moves every unlocked channel to `bank`.
    pub fn change_bank(&mut self, bank: usize) {
        debug!("bank change to {bank}");

        for channel in self.channels.iter_mut().filter(|channel| !channel.lock) {
            channel.scale_bank = bank;
        }
    }

    pub fn algorithm(&self) -> FilterAlgorithm {
        self.algorithm
    }

    /// Selects the algorithm used from the next block on.
    pub fn set_algorithm(&mut self, algorithm: FilterAlgorithm) {
        if self.new_algorithm != algorithm {
            debug!("filter algorithm change to {algorithm:?}");
            self.algorithm_changed = true;
            self.new_algorithm = algorithm;
        }
    }

    pub fn set_cpu_mode(&mut self, cpu_mode: CpuMode) {
        self.freq_scale = cpu_mode.freq_scale();
    }

    pub fn freq_scale(&self) -> f32 {
        self.freq_scale
    }

    pub fn coefficient_store(&self) -> &CoefficientStore {
        &self.store
    }

    /// Stages a user scale, swapped in at the next block.
    pub fn stage_user_scale(&mut self, coefficients: &[f32]) -> Result<(), Error> {
        self.store.user_scale_mut().stage(coefficients)
    }

    /// Restores the factory user scale at the next block.
    pub fn set_default_user_scale(&mut self) -> Result<(), Error> {
        self.stage_user_scale(&presets()[USER_SCALE_BANK].c_maxq)
    }

    /// First-pass history, the only history of one-pass and bpre.
    pub fn history_a(&self) -> &FilterHistory {
        &self.history_a
    }

    /// Second-pass history of the two-pass algorithm.
    pub fn history_b(&self) -> &FilterHistory {
        &self.history_b
    }

    /// Clamps the selections and clears the history of every channel whose
    /// bank changed, or of all channels when the algorithm or the user scale
    /// changed.
    fn process_scale_bank(&mut self) {
        for (i, channel) in self.channels.iter_mut().enumerate() {
            channel.clamp();

            if channel.scale_bank != self.old_scale_bank[i]
                || self.algorithm_changed
                || self.user_scale_changed
            {
                self.old_scale_bank[i] = channel.scale_bank;
                self.history_a.clear_channel(i);
                self.history_b.clear_channel(i);
            }
        }
    }

    pub fn process_audio_block(
        &mut self,
        controls: &ControlFrame,
        input: &InputBlock,
        output: &mut BlockOutput,
    ) {
        if self.algorithm_changed {
            self.algorithm = self.new_algorithm;
        }

        if self.store.user_scale_mut().take_update() {
            debug!(
                "user scale version {} swapped in",
                self.store.user_scale().version()
            );
            self.user_scale_changed = true;
        }

        self.process_scale_bank();

        let block = Block {
            controls,
            input,
            channels: &self.channels,
            store: &self.store,
            freq_scale: self.freq_scale,
        };

        output.input_clip = match self.algorithm {
            FilterAlgorithm::TwoPass => two_pass::render(
                &block,
                &mut self.history_a,
                &mut self.history_b,
                &mut self.filter_out,
                &mut output.voct,
            ),
            FilterAlgorithm::OnePass => one_pass::render(
                &block,
                &mut self.history_a,
                &mut self.filter_out,
                &mut output.voct,
            ),
            FilterAlgorithm::Bpre => bpre::render(
                &block,
                &mut self.history_a,
                &mut self.filter_out,
                &mut output.voct,
            ),
        };

        morph::compose(&self.filter_out, controls, output);

        self.algorithm_changed = false;
        self.user_scale_changed = false;
    }
}
