//! Kubernetes resource quantity parser.
//!
//! Supports the forms accepted by the API server:
//! - Plain numbers: `2`, `0.5`
//! - Decimal SI suffixes: `250m`, `100n`, `1k`, `2G`
//! - Binary suffixes: `128Mi`, `1Gi`
//! - Exponents: `129e6`, `1E3`

use thiserror::Error;

/// Error type for quantity parsing failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid quantity '{input}'")]
pub struct QuantityParseError {
    pub input: String,
}

const MEBIBYTE: f64 = 1024.0 * 1024.0;

/// Parses a quantity into base units (cores for CPU, bytes for memory).
pub fn parse_quantity(input: &str) -> Result<f64, QuantityParseError> {
    let s = input.trim();
    let err = || QuantityParseError {
        input: input.to_string(),
    };

    let split = s
        .find(|c: char| !(c.is_ascii_digit() || c == '.' || c == '+' || c == '-'))
        .unwrap_or(s.len());
    let (number, suffix) = s.split_at(split);
    if number.is_empty() || number == "+" || number == "-" {
        return Err(err());
    }
    let value: f64 = number.parse().map_err(|_| err())?;
    let multiplier = suffix_multiplier(suffix).ok_or_else(err)?;
    Ok(value * multiplier)
}

fn suffix_multiplier(suffix: &str) -> Option<f64> {
    let m = match suffix {
        "" => 1.0,
        "n" => 1e-9,
        "u" => 1e-6,
        "m" => 1e-3,
        "k" => 1e3,
        "M" => 1e6,
        "G" => 1e9,
        "T" => 1e12,
        "P" => 1e15,
        "E" => 1e18,
        "Ki" => 1024.0,
        "Mi" => MEBIBYTE,
        "Gi" => MEBIBYTE * 1024.0,
        "Ti" => MEBIBYTE * 1024.0 * 1024.0,
        "Pi" => MEBIBYTE * 1024.0 * 1024.0 * 1024.0,
        "Ei" => MEBIBYTE * 1024.0 * 1024.0 * 1024.0 * 1024.0,
        _ => {
            let exp = suffix
                .strip_prefix('e')
                .or_else(|| suffix.strip_prefix('E'))?;
            let exp: i32 = exp.parse().ok()?;
            10f64.powi(exp)
        }
    };
    Some(m)
}

/// CPU quantity in millicores, rounded up like the API server does.
pub fn cpu_millis(input: &str) -> Result<u64, QuantityParseError> {
    let cores = parse_quantity(input)?;
    Ok(round_up(cores * 1000.0) as u64)
}

/// Memory quantity in whole MiB.
pub fn mem_mebibytes(input: &str) -> Result<u64, QuantityParseError> {
    let bytes = round_up(parse_quantity(input)?);
    Ok((bytes / MEBIBYTE).floor() as u64)
}

/// Ceiling that ignores floating-point noise from suffix scaling.
fn round_up(value: f64) -> f64 {
    let nearest = value.round();
    let rounded = if (value - nearest).abs() < 1e-6 {
        nearest
    } else {
        value.ceil()
    };
    rounded.max(0.0)
}
