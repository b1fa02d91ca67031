#![doc = include_str!("../README.md")]
#![cfg_attr(not(test), no_std)]

extern crate alloc;

pub mod error;
pub mod filter;
pub mod io;
pub mod resources;
pub mod utils;
pub mod voice;

pub use error::Error;

/// Number of independent filter channels.
pub const NUM_CHANNELS: usize = 6;

/// Number of selectable notes (filters) per scale.
pub const NUM_FILTS: usize = 20;

/// Number of scales per bank.
pub const NUM_SCALES: usize = 11;

/// Notes stored per scale in the coefficient tables. One more than
/// [`NUM_FILTS`] so the frequency nudge can always reach the next note.
pub const NUM_SCALENOTES: usize = NUM_FILTS + 1;

/// Frequency coefficients in one bank.
pub const NUM_BANKNOTES: usize = NUM_SCALES * NUM_SCALENOTES;

/// Number of banks, including the user scale bank at the last index.
pub const NUM_SCALEBANKS: usize = 20;

/// Index of the user scale bank.
pub const USER_SCALE_BANK: usize = NUM_SCALEBANKS - 1;

/// Samples per engine block at the internal rate.
pub const NUM_SAMPLES: usize = 32;

/// Full scale of the signed 12-bit engine input.
pub const MAX_12BIT: f32 = 2047.0;

/// Negative full scale of the signed 12-bit engine input.
pub const MIN_12BIT: f32 = -2048.0;

/// Internal rate the coefficient tables are computed for.
pub const REFERENCE_SAMPLE_RATE: f32 = 96000.0;

/// Processing quality. Selects the internal rate the engine runs at and the
/// frequency scale that keeps the tables in tune at that rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CpuMode {
    /// 96 kHz internal rate.
    High,
    /// 48 kHz internal rate.
    #[default]
    Low,
}

impl CpuMode {
    /// Internal sample rate in Hz.
    pub fn internal_sample_rate(&self) -> f32 {
        match self {
            CpuMode::High => REFERENCE_SAMPLE_RATE,
            CpuMode::Low => REFERENCE_SAMPLE_RATE / 2.0,
        }
    }

    /// Multiplier applied to table frequencies and decay rates.
    pub fn freq_scale(&self) -> f32 {
        REFERENCE_SAMPLE_RATE / self.internal_sample_rate()
    }
}
