//! Half-point score arithmetic.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A tournament score counted in half points.
///
/// Serialized as a decimal number (`1.5`) so exported documents read
/// naturally; stored internally as an integer so draws never accumulate
/// floating-point drift.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "f64", try_from = "f64")]
pub struct Score(u32);

impl Score {
    pub const ZERO: Score = Score(0);
    pub const DRAW: Score = Score(1);
    pub const WIN: Score = Score(2);

    pub fn from_half_points(half_points: u32) -> Self {
        Self(half_points)
    }

    pub fn half_points(self) -> u32 {
        self.0
    }

    pub fn as_f64(self) -> f64 {
        f64::from(self.0) / 2.0
    }

    /// Add a signed number of half points, flooring at zero.
    pub fn shifted(self, half_points: i32) -> Self {
        Self(self.0.saturating_add_signed(half_points))
    }
}

impl From<Score> for f64 {
    fn from(score: Score) -> Self {
        score.as_f64()
    }
}

impl TryFrom<f64> for Score {
    type Error = String;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        let doubled = value * 2.0;
        if !doubled.is_finite() || doubled < 0.0 || doubled.fract() != 0.0 {
            return Err(format!("score must be a non-negative multiple of 0.5, got {}", value));
        }
        Ok(Self(doubled as u32))
    }
}

impl fmt::Display for Score {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0 % 2 == 0 {
            write!(f, "{}", self.0 / 2)
        } else {
            write!(f, "{}.5", self.0 / 2)
        }
    }
}
