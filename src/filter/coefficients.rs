//! Coefficient store.
//!
//! Read-only access to the preset banks plus the user scale overlay at
//! [`USER_SCALE_BANK`]. Every lookup clamps its bank, scale and note so that
//! stale or corrupted selections can never index out of bounds.

// Based on MIT-licensed code (c) Dan Green (danngreen1@gmail.com) and Hugo Paris (hugoplho@gmail.com)

use alloc::boxed::Box;
use alloc::vec;

use crate::error::Error;
use crate::resources::scales::{presets, ScaleBank, BPRE_COEFFICIENTS};
use crate::{NUM_BANKNOTES, NUM_SCALEBANKS, NUM_SCALENOTES, NUM_SCALES, USER_SCALE_BANK};

/// Low-Q and high-Q blended-table triples of one note.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BpreTriples {
    pub lo: [f32; BPRE_COEFFICIENTS],
    pub hi: [f32; BPRE_COEFFICIENTS],
}

/// Mutable bank of max-Q frequency coefficients.
///
/// Writers stage a complete scale with [`UserScale::stage`]. The engine swaps
/// it in at the next block boundary, so a block never sees a half-written
/// scale.
#[derive(Debug, Clone)]
pub struct UserScale {
    active: Box<[f32]>,
    pending: Box<[f32]>,
    updated: bool,
    version: u32,
}

impl UserScale {
    pub fn new() -> Self {
        let factory = &presets()[USER_SCALE_BANK].c_maxq;

        Self {
            active: Box::from(factory.as_slice()),
            pending: vec![0.0; NUM_BANKNOTES].into_boxed_slice(),
            updated: false,
            version: 0,
        }
    }

    /// Stages a new scale. It becomes audible at the next block boundary.
    pub fn stage(&mut self, coefficients: &[f32]) -> Result<(), Error> {
        if coefficients.len() != NUM_BANKNOTES {
            return Err(Error::UserScaleLength {
                expected: NUM_BANKNOTES,
                actual: coefficients.len(),
            });
        }

        self.pending.copy_from_slice(coefficients);
        self.updated = true;

        Ok(())
    }

    /// Whether a staged scale is waiting to be swapped in.
    pub fn is_pending(&self) -> bool {
        self.updated
    }

    /// Swaps a staged scale in. Returns `true` if there was one.
    pub(crate) fn take_update(&mut self) -> bool {
        if !self.updated {
            return false;
        }

        core::mem::swap(&mut self.active, &mut self.pending);
        self.updated = false;
        self.version = self.version.wrapping_add(1);

        true
    }

    /// Coefficients the engine currently reads.
    pub fn coefficients(&self) -> &[f32] {
        &self.active
    }

    /// Number of staged scales swapped in so far.
    pub fn version(&self) -> u32 {
        self.version
    }
}

impl Default for UserScale {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone)]
pub struct CoefficientStore {
    presets: &'static [ScaleBank],
    user_scale: UserScale,
}

impl Default for CoefficientStore {
    fn default() -> Self {
        Self::new()
    }
}

impl CoefficientStore {
    pub fn new() -> Self {
        Self {
            presets: presets(),
            user_scale: UserScale::new(),
        }
    }

    /// Max-Q frequency coefficient. The user bank reads the overlay.
    #[inline]
    pub fn maxq(&self, bank: usize, scale: usize, note: usize) -> f32 {
        let (bank, index) = clamp_index(bank, scale, note);

        if bank == USER_SCALE_BANK {
            self.user_scale.active[index]
        } else {
            self.presets[bank].c_maxq[index]
        }
    }

    /// Reference frequency coefficient of the blended-table filters. Always
    /// reads the preset tables, the overlay only holds max-Q coefficients.
    #[inline]
    pub fn bpre_tuning(&self, bank: usize, scale: usize, note: usize) -> f32 {
        let (bank, index) = clamp_index(bank, scale, note);
        self.presets[bank].c_maxq[index]
    }

    /// Blended-table triples of a note. The user bank falls back to the
    /// factory tables stored at its index.
    #[inline]
    pub fn bpre(&self, bank: usize, scale: usize, note: usize) -> BpreTriples {
        let (bank, index) = clamp_index(bank, scale, note);
        let preset = &self.presets[bank];
        let start = index * BPRE_COEFFICIENTS;
        let mut triples = BpreTriples {
            lo: [0.0; BPRE_COEFFICIENTS],
            hi: [0.0; BPRE_COEFFICIENTS],
        };
        triples
            .lo
            .copy_from_slice(&preset.c_bpre_lo[start..start + BPRE_COEFFICIENTS]);
        triples
            .hi
            .copy_from_slice(&preset.c_bpre_hi[start..start + BPRE_COEFFICIENTS]);

        triples
    }

    /// Name of a preset bank.
    pub fn bank_name(&self, bank: usize) -> &'static str {
        self.presets[bank.min(NUM_SCALEBANKS - 1)].name
    }

    pub fn user_scale(&self) -> &UserScale {
        &self.user_scale
    }

    pub fn user_scale_mut(&mut self) -> &mut UserScale {
        &mut self.user_scale
    }
}

#[inline]
fn clamp_index(bank: usize, scale: usize, note: usize) -> (usize, usize) {
    let bank = bank.min(NUM_SCALEBANKS - 1);
    let scale = scale.min(NUM_SCALES - 1);
    let note = note.min(NUM_SCALENOTES - 1);

    (bank, scale * NUM_SCALENOTES + note)
}
