//! Link data rates and serialization delay.

use serde::Serialize;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

const NANOS_PER_SEC: u128 = 1_000_000_000;

/// A link data rate in bits per second.
///
/// Parses unit strings such as `"500bps"`, `"5kbps"`,
/// `"10Mbps"`, `"1Gbps"`. Units are decimal (1 Mbps = 1 000 000 bps).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct DataRate(u64);

/// Errors parsing a [`DataRate`] string.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseDataRateError {
    /// The numeric part was missing or not an integer.
    #[error("invalid data rate value in {0:?}")]
    InvalidValue(String),

    /// The unit suffix was not one of bps, kbps, Mbps, Gbps.
    #[error("unknown data rate unit in {0:?}")]
    UnknownUnit(String),

    /// The rate was zero or overflowed a u64.
    #[error("data rate out of range: {0:?}")]
    OutOfRange(String),
}

impl DataRate {
    /// Create a rate from bits per second.
    pub const fn from_bps(bps: u64) -> Self {
        Self(bps)
    }

    /// Create a rate from kilobits per second.
    pub const fn from_kbps(kbps: u64) -> Self {
        Self(kbps * 1_000)
    }

    /// Create a rate from megabits per second.
    pub const fn from_mbps(mbps: u64) -> Self {
        Self(mbps * 1_000_000)
    }

    /// Create a rate from gigabits per second.
    pub const fn from_gbps(gbps: u64) -> Self {
        Self(gbps * 1_000_000_000)
    }

    /// Bits per second.
    pub const fn bps(self) -> u64 {
        self.0
    }

    /// Whether this rate can carry traffic at all.
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// Time needed to clock `bytes` onto the medium at this rate.
    ///
    /// Computed in integer nanoseconds and rounded up, so the result is
    /// identical on every platform. A zero rate yields `Duration::MAX`.
    pub fn transmission_time(self, bytes: u64) -> Duration {
        if self.0 == 0 {
            return Duration::MAX;
        }
        let bits = u128::from(bytes) * 8;
        let rate = u128::from(self.0);
        let nanos = (bits * NANOS_PER_SEC).div_ceil(rate);
        match u64::try_from(nanos) {
            Ok(nanos) => Duration::from_nanos(nanos),
            Err(_) => Duration::MAX,
        }
    }
}

impl fmt::Display for DataRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let bps = self.0;
        if bps >= 1_000_000_000 && bps % 1_000_000_000 == 0 {
            write!(f, "{}Gbps", bps / 1_000_000_000)
        } else if bps >= 1_000_000 && bps % 1_000_000 == 0 {
            write!(f, "{}Mbps", bps / 1_000_000)
        } else if bps >= 1_000 && bps % 1_000 == 0 {
            write!(f, "{}kbps", bps / 1_000)
        } else {
            write!(f, "{bps}bps")
        }
    }
}

impl FromStr for DataRate {
    type Err = ParseDataRateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let split = trimmed
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(trimmed.len());
        let (value, unit) = trimmed.split_at(split);

        let value: u64 = value
            .parse()
            .map_err(|_| ParseDataRateError::InvalidValue(s.to_string()))?;

        let multiplier: u64 = match unit {
            "bps" | "b/s" => 1,
            "kbps" | "Kbps" | "kb/s" => 1_000,
            "Mbps" | "mbps" | "Mb/s" => 1_000_000,
            "Gbps" | "gbps" | "Gb/s" => 1_000_000_000,
            _ => return Err(ParseDataRateError::UnknownUnit(s.to_string())),
        };

        match value.checked_mul(multiplier) {
            Some(0) | None => Err(ParseDataRateError::OutOfRange(s.to_string())),
            Some(bps) => Ok(Self(bps)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_scenario_rates() {
        assert_eq!("10Mbps".parse(), Ok(DataRate::from_mbps(10)));
        assert_eq!("100Mbps".parse(), Ok(DataRate::from_mbps(100)));
        assert_eq!("5kbps".parse(), Ok(DataRate::from_kbps(5)));
        assert_eq!("1Gbps".parse(), Ok(DataRate::from_gbps(1)));
        assert_eq!("500bps".parse(), Ok(DataRate::from_bps(500)));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(matches!(
            "fastbps".parse::<DataRate>(),
            Err(ParseDataRateError::InvalidValue(_))
        ));
        assert!(matches!(
            "10Tbps".parse::<DataRate>(),
            Err(ParseDataRateError::UnknownUnit(_))
        ));
        assert!(matches!(
            "0Mbps".parse::<DataRate>(),
            Err(ParseDataRateError::OutOfRange(_))
        ));
    }

    #[test]
    fn test_display_picks_largest_exact_unit() {
        assert_eq!(DataRate::from_mbps(10).to_string(), "10Mbps");
        assert_eq!(DataRate::from_bps(1_500).to_string(), "1500bps");
        assert_eq!(DataRate::from_kbps(1_500).to_string(), "1500kbps");
    }

    #[test]
    fn test_transmission_time() {
        // 1024 bytes at 10 Mbps = 8192 bits / 10^7 bps = 819.2 µs
        let rate = DataRate::from_mbps(10);
        assert_eq!(rate.transmission_time(1024), Duration::from_nanos(819_200));

        // 1 byte at 3 bps = 8/3 s, rounded up to the next nanosecond
        let rate = DataRate::from_bps(3);
        assert_eq!(
            rate.transmission_time(1),
            Duration::from_nanos(2_666_666_667)
        );
    }

    #[test]
    fn test_zero_rate_never_finishes() {
        assert_eq!(DataRate::from_bps(0).transmission_time(1), Duration::MAX);
    }
}
