/// Decimal places kept in classified values.
pub const VALUE_DECIMALS: i32 = 6;

/// Parse a lab result as a number, tolerating surrounding whitespace and
/// thousands separators. Non-finite values are rejected.
pub fn parse_lenient_f64(raw: &str) -> Option<f64> {
    let cleaned = raw.trim().replace(',', "");
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse::<f64>().ok().filter(|value| value.is_finite())
}

/// Round half away from zero to `decimals` places.
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let scale = 10f64.powi(decimals);
    let rounded = (value * scale).round() / scale;
    if rounded.is_finite() { rounded } else { value }
}
