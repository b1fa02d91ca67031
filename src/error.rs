//! Error type for the few operations that can reject their input.
//!
//! The audio path never fails. Out-of-range control values are clamped, and
//! ring buffer over- or underruns are handled as flow control.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// A user scale must hold exactly one coefficient per bank note.
    #[error("user scale needs {expected} coefficients, got {actual}")]
    UserScaleLength { expected: usize, actual: usize },

    /// Host rates must be finite, positive and low enough for one block of
    /// input to fit the input rings.
    #[error("invalid sample rate {0} Hz")]
    InvalidSampleRate(f32),
}
