//! Human-readable byte sizes.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

const DIVISOR: f64 = 1024.0;

/// Binary size units, from kibibytes to pebibytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SizeUnit {
    /// 1024 bytes
    K,
    /// 1024 K
    M,
    /// 1024 M
    G,
    /// 1024 G
    T,
    /// 1024 T
    P,
}

impl SizeUnit {
    /// All units in ascending order.
    pub const ALL: [SizeUnit; 5] = [
        SizeUnit::K,
        SizeUnit::M,
        SizeUnit::G,
        SizeUnit::T,
        SizeUnit::P,
    ];

    /// Decimal places used when formatting a value in this unit.
    pub fn precision(self) -> usize {
        match self {
            SizeUnit::P => 1,
            _ => 0,
        }
    }

    /// The unit letter.
    pub fn symbol(self) -> char {
        match self {
            SizeUnit::K => 'K',
            SizeUnit::M => 'M',
            SizeUnit::G => 'G',
            SizeUnit::T => 'T',
            SizeUnit::P => 'P',
        }
    }

    /// Power of 1024 this unit represents.
    pub fn exponent(self) -> i32 {
        match self {
            SizeUnit::K => 1,
            SizeUnit::M => 2,
            SizeUnit::G => 3,
            SizeUnit::T => 4,
            SizeUnit::P => 5,
        }
    }
}

impl fmt::Display for SizeUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

impl FromStr for SizeUnit {
    type Err = Error;

    /// Accepts `K`, `KB` or `KiB` style spellings, case-insensitively.
    fn from_str(s: &str) -> Result<Self> {
        let upper = s.trim().to_ascii_uppercase();
        let letter = upper
            .strip_suffix("IB")
            .or_else(|| upper.strip_suffix('B'))
            .unwrap_or(&upper);

        match letter {
            "K" => Ok(SizeUnit::K),
            "M" => Ok(SizeUnit::M),
            "G" => Ok(SizeUnit::G),
            "T" => Ok(SizeUnit::T),
            "P" => Ok(SizeUnit::P),
            _ => Err(Error::invalid_value(format!("unknown size unit '{s}'"))),
        }
    }
}

/// Converts a byte count into a short human-readable string such as `5G`.
///
/// The value is scaled to the largest unit that keeps it below 1024, or
/// scaling stops early at `target_unit` when that unit is reached first.
/// Values are rounded half away from zero: no decimals up to `T`, one decimal
/// for `P`.
///
/// # Errors
///
/// Returns [`Error::InvalidValue`] for negative input, or when the value is
/// still 1024P or more.
pub fn bytes_to_human(in_bytes: i64, target_unit: Option<SizeUnit>) -> Result<String> {
    if in_bytes < 0 {
        return Err(Error::invalid_value("number must be non-negative"));
    }

    #[allow(clippy::cast_precision_loss)]
    let mut size = in_bytes as f64;

    for unit in SizeUnit::ALL {
        size /= DIVISOR;
        if size < DIVISOR || Some(unit) == target_unit {
            let precision = unit.precision();
            #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
            let factor = 10f64.powi(precision as i32);
            let rounded = (size * factor).round() / factor;
            return Ok(format!("{rounded:.precision$}{unit}"));
        }
    }

    Err(Error::invalid_value("number too large"))
}
