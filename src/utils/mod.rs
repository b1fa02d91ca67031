//! Utility functions shared by the filter engine and the I/O pipeline.

pub mod random;

#[allow(unused_imports)]
use num_traits::float::Float;

/// Reads `table[index]` with the index clamped to the table bounds.
#[inline]
pub fn lookup(table: &[f32], index: usize) -> f32 {
    table[index.min(table.len() - 1)]
}

/// Reads a table at a floating point position, truncated towards zero and
/// clamped to the table bounds. Negative and NaN positions read entry 0.
#[inline]
pub fn lookup_f(table: &[f32], index: f32) -> f32 {
    let index = if index > 0.0 { index as usize } else { 0 };
    lookup(table, index)
}

#[inline]
pub fn crossfade(a: f32, b: f32, fade: f32) -> f32 {
    a + (b - a) * fade
}

/// Converts a pitch offset in cents to a frequency ratio.
#[inline]
pub fn cents_to_ratio(cents: f32) -> f32 {
    (cents / 1200.0).exp2()
}
