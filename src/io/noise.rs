//! Noise sources fed to the engine while no input is connected.

use alloc::boxed::Box;
use core::fmt::Debug;

use dyn_clone::DynClone;

use crate::utils::random::Random;

/// Per-sample signal source, normalized to `-1.0..=1.0`.
pub trait InputSource: DynClone + Debug {
    fn next(&mut self) -> f32;
}

dyn_clone::clone_trait_object!(InputSource);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NoiseColor {
    Brown,
    #[default]
    Pink,
    White,
}

/// Creates a seeded noise source of the given color.
pub fn noise(color: NoiseColor, seed: u32) -> Box<dyn InputSource> {
    match color {
        NoiseColor::Brown => Box::new(BrownNoise::new(seed)),
        NoiseColor::Pink => Box::new(PinkNoise::new(seed)),
        NoiseColor::White => Box::new(WhiteNoise::new(seed)),
    }
}

#[derive(Debug, Clone)]
pub struct WhiteNoise {
    random: Random,
}

impl WhiteNoise {
    pub fn new(seed: u32) -> Self {
        Self {
            random: Random::new(seed),
        }
    }
}

impl InputSource for WhiteNoise {
    #[inline]
    fn next(&mut self) -> f32 {
        self.random.get_bipolar()
    }
}

const PINK_ROWS: usize = 16;

/// Voss-McCartney pink noise. Row `k` is redrawn every `2^k` samples.
#[derive(Debug, Clone)]
pub struct PinkNoise {
    random: Random,
    rows: [f32; PINK_ROWS],
    running_sum: f32,
    counter: u32,
}

impl PinkNoise {
    pub fn new(seed: u32) -> Self {
        Self {
            random: Random::new(seed),
            rows: [0.0; PINK_ROWS],
            running_sum: 0.0,
            counter: 0,
        }
    }
}

impl InputSource for PinkNoise {
    #[inline]
    fn next(&mut self) -> f32 {
        self.counter = self.counter.wrapping_add(1);
        let changed = (self.counter.trailing_zeros() as usize + 1).min(PINK_ROWS);

        for row in &mut self.rows[..changed] {
            self.running_sum -= *row;
            *row = self.random.get_bipolar();
            self.running_sum += *row;
        }

        self.running_sum / PINK_ROWS as f32
    }
}

/// Integrated white noise, bounded to the normalized range.
#[derive(Debug, Clone)]
pub struct BrownNoise {
    random: Random,
    state: f32,
}

impl BrownNoise {
    pub fn new(seed: u32) -> Self {
        Self {
            random: Random::new(seed),
            state: 0.0,
        }
    }
}

impl InputSource for BrownNoise {
    #[inline]
    fn next(&mut self) -> f32 {
        self.state = (self.state + 0.02 * self.random.get_bipolar()).clamp(-1.0, 1.0);
        self.state
    }
}
