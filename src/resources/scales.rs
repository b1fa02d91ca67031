//! Scale preset banks.
//!
//! Every bank holds [`NUM_SCALES`] scales of [`NUM_SCALENOTES`] notes. Notes
//! are laid out scale-major: entry `scale * NUM_SCALENOTES + note`. Each note
//! carries
//! - a max-Q frequency coefficient `2π f / 96000`, and
//! - a low-Q and a high-Q bandpass triple `[gain, r², -2 r cos θ]` for the
//!   blended-table filter.
//!
//! The banks are generated from tuning descriptions the first time they are
//! requested. The last bank is the factory content of the user scale.

use alloc::vec::Vec;
use core::f32::consts::PI;

use spin::Once;

#[allow(unused_imports)]
use num_traits::float::Float;

use crate::utils::cents_to_ratio;
use crate::{NUM_BANKNOTES, NUM_SCALEBANKS, NUM_SCALENOTES, NUM_SCALES, REFERENCE_SAMPLE_RATE};

/// Coefficients per note in the blended-table triples.
pub const BPRE_COEFFICIENTS: usize = 3;

/// Resonance of the low-Q blended-table coefficients.
const BPRE_LOW_Q: f32 = 2.5;

/// Resonance of the high-Q blended-table coefficients.
const BPRE_HIGH_Q: f32 = 220.0;

/// Extra gain of the high-Q coefficients over a unity peak.
const BPRE_HIGH_Q_MAKEUP: f32 = 4.0;

/// Highest frequency written to the blended-table triples.
const BPRE_MAX_FREQUENCY: f32 = 20000.0;

#[derive(Debug, Clone, Copy)]
enum Tuning {
    /// Degrees of one period, in cents above the root.
    Degrees { cents: &'static [f32], period: f32 },
    /// Equal steps of the given size in cents.
    Equal(f32),
    /// Integer multiples of the root.
    Harmonics,
}

#[derive(Debug, Clone, Copy)]
struct BankDefinition {
    name: &'static str,
    tuning: Tuning,
    root: f32,
    /// Degrees between adjacent notes of a scale.
    note_stride: usize,
    /// Degrees between the roots of adjacent scales.
    scale_stride: usize,
}

const OCTAVE: f32 = 1200.0;
const TRITAVE: f32 = 1901.955;

const JUST_MAJOR: [f32; 7] = [0.0, 203.91, 386.31, 498.04, 701.96, 884.36, 1088.27];
const JUST_MINOR: [f32; 7] = [0.0, 203.91, 315.64, 498.04, 701.96, 813.69, 1017.6];
const PYTHAGOREAN: [f32; 7] = [0.0, 203.91, 407.82, 498.04, 701.96, 905.87, 1109.78];
const INDIAN_PENTATONIC: [f32; 5] = [0.0, 203.91, 386.31, 701.96, 884.36];
const SHRUTIS: [f32; 22] = [
    0.0, 90.22, 111.73, 182.4, 203.91, 294.13, 315.64, 386.31, 407.82, 498.04, 519.55, 590.22,
    611.73, 701.96, 792.18, 813.69, 884.36, 905.87, 996.09, 1017.6, 1088.27, 1109.78,
];
const PELOG: [f32; 7] = [0.0, 120.0, 270.0, 540.0, 670.0, 785.0, 950.0];
const SLENDRO: [f32; 5] = [0.0, 231.0, 474.0, 717.0, 955.0];

const BANKS: [BankDefinition; NUM_SCALEBANKS] = [
    bank("Western just major", degrees(&JUST_MAJOR, OCTAVE), 65.41, 1, 1),
    bank("Western just minor", degrees(&JUST_MINOR, OCTAVE), 65.41, 1, 1),
    bank("Twelve tone chromatic", Tuning::Equal(100.0), 130.81, 1, 1),
    bank("Whole tone", Tuning::Equal(200.0), 65.41, 1, 1),
    bank("Pythagorean", degrees(&PYTHAGOREAN, OCTAVE), 65.41, 1, 1),
    bank("Indian pentatonic", degrees(&INDIAN_PENTATONIC, OCTAVE), 73.42, 1, 1),
    bank("Shrutis", degrees(&SHRUTIS, OCTAVE), 130.81, 1, 2),
    bank("Gamelan pelog", degrees(&PELOG, OCTAVE), 98.0, 1, 1),
    bank("Gamelan slendro", degrees(&SLENDRO, OCTAVE), 98.0, 1, 1),
    bank("Quarter tones", Tuning::Equal(50.0), 130.81, 2, 2),
    bank("17 tone equal", Tuning::Equal(OCTAVE / 17.0), 65.41, 2, 1),
    bank("19 tone equal", Tuning::Equal(OCTAVE / 19.0), 65.41, 2, 1),
    bank("22 tone equal", Tuning::Equal(OCTAVE / 22.0), 65.41, 2, 2),
    bank("31 tone equal", Tuning::Equal(OCTAVE / 31.0), 65.41, 3, 2),
    bank("Bohlen-Pierce", Tuning::Equal(TRITAVE / 13.0), 65.41, 1, 1),
    bank("Carlos alpha", Tuning::Equal(77.965), 65.41, 2, 2),
    bank("Carlos beta", Tuning::Equal(63.833), 65.41, 2, 2),
    bank("Carlos gamma", Tuning::Equal(35.099), 65.41, 4, 3),
    bank("Harmonic series", Tuning::Harmonics, 55.0, 1, 1),
    bank("User", degrees(&JUST_MAJOR, OCTAVE), 130.81, 1, 1),
];

const fn degrees(cents: &'static [f32], period: f32) -> Tuning {
    Tuning::Degrees { cents, period }
}

const fn bank(
    name: &'static str,
    tuning: Tuning,
    root: f32,
    note_stride: usize,
    scale_stride: usize,
) -> BankDefinition {
    BankDefinition {
        name,
        tuning,
        root,
        note_stride,
        scale_stride,
    }
}

impl BankDefinition {
    fn frequency(&self, scale: usize, note: usize) -> f32 {
        let degree = scale * self.scale_stride + note * self.note_stride;

        match self.tuning {
            Tuning::Degrees { cents, period } => {
                let octave = (degree / cents.len()) as f32;
                self.root * cents_to_ratio(octave * period + cents[degree % cents.len()])
            }
            Tuning::Equal(step) => self.root * cents_to_ratio(degree as f32 * step),
            Tuning::Harmonics => self.root * (degree + 1) as f32,
        }
    }
}

/// One bank of scale coefficients.
#[derive(Debug, Clone)]
pub struct ScaleBank {
    pub name: &'static str,
    /// Max-Q frequency coefficients.
    pub c_maxq: [f32; NUM_BANKNOTES],
    /// High-Q blended-table triples.
    pub c_bpre_hi: [f32; NUM_BANKNOTES * BPRE_COEFFICIENTS],
    /// Low-Q blended-table triples.
    pub c_bpre_lo: [f32; NUM_BANKNOTES * BPRE_COEFFICIENTS],
}

impl ScaleBank {
    fn generate(definition: &BankDefinition) -> Self {
        let mut bank = Self {
            name: definition.name,
            c_maxq: [0.0; NUM_BANKNOTES],
            c_bpre_hi: [0.0; NUM_BANKNOTES * BPRE_COEFFICIENTS],
            c_bpre_lo: [0.0; NUM_BANKNOTES * BPRE_COEFFICIENTS],
        };

        for scale in 0..NUM_SCALES {
            for note in 0..NUM_SCALENOTES {
                let index = scale * NUM_SCALENOTES + note;
                let frequency = definition.frequency(scale, note);
                bank.c_maxq[index] = 2.0 * PI * frequency / REFERENCE_SAMPLE_RATE;

                let triple = index * BPRE_COEFFICIENTS;
                bank.c_bpre_lo[triple..triple + BPRE_COEFFICIENTS]
                    .copy_from_slice(&bandpass(frequency, BPRE_LOW_Q, 1.0));
                bank.c_bpre_hi[triple..triple + BPRE_COEFFICIENTS].copy_from_slice(&bandpass(
                    frequency,
                    BPRE_HIGH_Q,
                    BPRE_HIGH_Q_MAKEUP,
                ));
            }
        }

        bank
    }
}

/// Two-pole bandpass with zeros at DC and Nyquist, as `[gain, r², -2 r cos θ]`.
/// The gain gives a peak of `makeup` at the centre frequency.
fn bandpass(frequency: f32, q: f32, makeup: f32) -> [f32; BPRE_COEFFICIENTS] {
    let frequency = frequency.min(BPRE_MAX_FREQUENCY);
    let bandwidth = frequency / q;
    let r = (-PI * bandwidth / REFERENCE_SAMPLE_RATE).exp();
    let theta = 2.0 * PI * frequency / REFERENCE_SAMPLE_RATE;
    let r2 = r * r;

    [0.5 * (1.0 - r2) * makeup, r2, -2.0 * r * theta.cos()]
}

static PRESETS: Once<Vec<ScaleBank>> = Once::new();

/// All preset banks, [`NUM_SCALEBANKS`] of them.
pub fn presets() -> &'static [ScaleBank] {
    PRESETS.call_once(|| BANKS.iter().map(ScaleBank::generate).collect())
}
