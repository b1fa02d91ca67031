//! Resources definitions.
//!
//! Lookup tables are derived from closed-form curves on first use and shared
//! by every engine instance afterwards.

pub mod lut;
pub mod scales;
