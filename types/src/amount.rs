//! Stake amounts.
//!
//! The chain reports stake as a fixed-point integer in base units; operators
//! think in display units (1 display unit = 10^9 base units). Amounts are kept
//! in base units so comparisons never touch floating point, and thresholds
//! written in display units are converted exactly.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::TypesError;

/// Number of fractional decimal digits between base and display units.
pub const STAKE_DECIMALS: u32 = 9;

/// Base units per display unit.
pub const STAKE_UNIT: u64 = 10u64.pow(STAKE_DECIMALS);

/// A stake amount in base units.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct StakeAmount(u64);

impl StakeAmount {
    pub const ZERO: Self = Self(0);

    pub fn from_base_units(raw: u64) -> Self {
        Self(raw)
    }

    /// Whole display units, e.g. `from_display_units(100)` = 100.0.
    pub fn from_display_units(whole: u64) -> Option<Self> {
        whole.checked_mul(STAKE_UNIT).map(Self)
    }

    pub fn base_units(&self) -> u64 {
        self.0
    }

    /// Parse a decimal string in display units ("100", "0.5", "12.000000001").
    pub fn parse_display(s: &str) -> Result<Self, TypesError> {
        let s = s.trim();
        let invalid = || TypesError::InvalidAmount(s.to_string());

        let (whole, frac) = match s.split_once('.') {
            Some((w, f)) => (w, f),
            None => (s, ""),
        };
        if whole.is_empty() && frac.is_empty() {
            return Err(invalid());
        }
        if !whole.bytes().all(|b| b.is_ascii_digit()) || !frac.bytes().all(|b| b.is_ascii_digit())
        {
            return Err(invalid());
        }
        if frac.len() > STAKE_DECIMALS as usize {
            return Err(invalid());
        }

        let whole: u64 = if whole.is_empty() {
            0
        } else {
            whole.parse().map_err(|_| invalid())?
        };
        let frac_units: u64 = if frac.is_empty() {
            0
        } else {
            let scale = 10u64.pow(STAKE_DECIMALS - frac.len() as u32);
            frac.parse::<u64>().map_err(|_| invalid())? * scale
        };

        whole
            .checked_mul(STAKE_UNIT)
            .and_then(|w| w.checked_add(frac_units))
            .map(Self)
            .ok_or_else(invalid)
    }

    /// Render in display units with all nine fractional digits.
    pub fn to_display_string(&self) -> String {
        format!(
            "{}.{:0width$}",
            self.0 / STAKE_UNIT,
            self.0 % STAKE_UNIT,
            width = STAKE_DECIMALS as usize
        )
    }
}

impl fmt::Display for StakeAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_display_string())
    }
}

impl FromStr for StakeAmount {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_display(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_whole_and_fractional_display_units() {
        assert_eq!(
            StakeAmount::parse_display("100").unwrap().base_units(),
            100 * STAKE_UNIT
        );
        assert_eq!(
            StakeAmount::parse_display("0.5").unwrap().base_units(),
            STAKE_UNIT / 2
        );
        assert_eq!(
            StakeAmount::parse_display("12.000000001").unwrap().base_units(),
            12 * STAKE_UNIT + 1
        );
        assert_eq!(StakeAmount::parse_display(".25").unwrap().base_units(), STAKE_UNIT / 4);
    }

    #[test]
    fn rejects_malformed_amounts() {
        for bad in ["", ".", "-1", "1.0000000001", "abc", "1e9", "1.2.3"] {
            assert!(StakeAmount::parse_display(bad).is_err(), "{bad} should fail");
        }
    }

    #[test]
    fn rejects_overflow() {
        assert!(StakeAmount::parse_display("99999999999999999999").is_err());
    }

    #[test]
    fn display_renders_nine_decimals() {
        let amount = StakeAmount::from_base_units(150 * STAKE_UNIT + 42);
        assert_eq!(amount.to_string(), "150.000000042");
    }

    #[test]
    fn ordering_follows_base_units() {
        let min = StakeAmount::from_display_units(100).unwrap();
        assert!(StakeAmount::from_display_units(150).unwrap() >= min);
        assert!(StakeAmount::from_base_units(100 * STAKE_UNIT - 1) < min);
    }
}
