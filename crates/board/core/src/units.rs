//! Fixed-point score representation.
//!
//! Scores travel over the wire and live in storage as integer milli-units
//! (thousandths of a second of remaining time). Keeping them integral avoids
//! float drift in equality checks, which tie detection depends on.

use core::fmt;
use core::ops::{Add, AddAssign, Sub};

/// Frames per second of the game simulation.
pub const FRAME_RATE: i64 = 60;

/// A score in milli-units (3 implied decimal places).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct Millis(pub i64);

impl Millis {
    pub const ZERO: Self = Self(0);

    pub const fn new(raw: i64) -> Self {
        Self(raw)
    }

    /// Builds a value from whole seconds.
    pub const fn from_secs(secs: i64) -> Self {
        Self(secs * 1000)
    }

    pub const fn raw(self) -> i64 {
        self.0
    }

    pub fn as_secs_f64(self) -> f64 {
        self.0 as f64 / 1000.0
    }

    /// Converts to whole frames, rounding half away from zero.
    pub fn to_frames(self) -> i64 {
        (self.0 as f64 * FRAME_RATE as f64 / 1000.0).round() as i64
    }

    pub const fn abs_diff(self, other: Self) -> Self {
        Self((self.0 - other.0).abs())
    }
}

impl fmt::Display for Millis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{}{}.{:03}", sign, abs / 1000, abs % 1000)
    }
}

impl Add for Millis {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl AddAssign for Millis {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

impl Sub for Millis {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self(self.0 - rhs.0)
    }
}

impl core::iter::Sum for Millis {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_keeps_three_decimals() {
        assert_eq!(Millis(84_125).to_string(), "84.125");
        assert_eq!(Millis(5).to_string(), "0.005");
        assert_eq!(Millis(-42).to_string(), "-0.042");
    }

    #[test]
    fn test_frames_round_to_nearest() {
        assert_eq!(Millis::from_secs(90).to_frames(), 5400);
        assert_eq!(Millis(16).to_frames(), 1);
        assert_eq!(Millis(8).to_frames(), 0);
    }
}
