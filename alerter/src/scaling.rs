//! Giga/nano conversions for token amounts

pub const GIGA: u128 = 1_000_000_000;
pub const NANO: f64 = 1e-9;

/// Converts a configured amount of whole tokens into base units
pub fn scale_to_giga(amount: u64) -> u128 {
    u128::from(amount) * GIGA
}

/// Converts base units into whole tokens, rounded to 3 decimals for display
pub fn scale_to_nano(amount: u128) -> f64 {
    round_to(amount as f64 * NANO, 3)
}

pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}
