//! Unit Registry: dimensional conversion to canonical SI units.
//!
//! Conversion is plain multiplication in double precision against a closed,
//! case-insensitive table of factors. SI base units (kilograms, meters) are
//! the pivot so that composing conversions never loses precision beyond
//! floating-point rounding.

/// Mass conversion factors to kilograms, matched case-insensitively.
const MASS_FACTORS: &[(&str, f64)] = &[
    ("kg", 1.0),
    ("kilogram", 1.0),
    ("kilograms", 1.0),
    ("g", 0.001),
    ("gram", 0.001),
    ("grams", 0.001),
    ("mg", 0.000_001),
    ("lb", 0.453_592_37),
    ("lbs", 0.453_592_37),
    ("pound", 0.453_592_37),
    ("pounds", 0.453_592_37),
    ("oz", 0.028_349_523_125),
    ("ounce", 0.028_349_523_125),
    ("ounces", 0.028_349_523_125),
    ("ton", 1_000.0),
    ("tonne", 1_000.0),
    ("t", 1_000.0),
];

/// Length conversion factors to meters, matched case-insensitively.
const LENGTH_FACTORS: &[(&str, f64)] = &[
    ("m", 1.0),
    ("meter", 1.0),
    ("meters", 1.0),
    ("metre", 1.0),
    ("metres", 1.0),
    ("cm", 0.01),
    ("centimeter", 0.01),
    ("centimeters", 0.01),
    ("mm", 0.001),
    ("millimeter", 0.001),
    ("millimeters", 0.001),
    ("km", 1_000.0),
    ("kilometer", 1_000.0),
    ("kilometers", 1_000.0),
    ("ft", 0.304_8),
    ("foot", 0.304_8),
    ("feet", 0.304_8),
    ("in", 0.025_4),
    ("inch", 0.025_4),
    ("inches", 0.025_4),
    ("yd", 0.914_4),
    ("yard", 0.914_4),
    ("yards", 0.914_4),
    ("mi", 1_609.344),
    ("mile", 1_609.344),
    ("miles", 1_609.344),
];

fn lookup(table: &[(&str, f64)], unit: &str) -> Option<f64> {
    let needle = unit.trim().to_ascii_lowercase();
    table
        .iter()
        .find(|(name, _)| *name == needle)
        .map(|(_, factor)| *factor)
}

/// Convert `value` (in `unit`) to kilograms. `Ok(None)` never happens;
/// an unknown unit is `Err(unknown_unit_string)`.
pub fn normalize_mass(value: f64, unit: &str) -> Result<f64, String> {
    lookup(MASS_FACTORS, unit)
        .map(|factor| value * factor)
        .ok_or_else(|| format!("unknown_mass_unit:{unit}"))
}

/// Convert `value` (in `unit`) to meters.
pub fn normalize_length(value: f64, unit: &str) -> Result<f64, String> {
    lookup(LENGTH_FACTORS, unit)
        .map(|factor| value * factor)
        .ok_or_else(|| format!("unknown_length_unit:{unit}"))
}
