// SPDX-License-Identifier: MIT OR Apache-2.0
//! Easing curves applied to a wait's progress ratio.

use serde::{Deserialize, Serialize};

/// Easing curve mapping a progress ratio in `[0, 1]` onto `[0, 1]`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Easing {
    /// Identity
    #[default]
    Linear,
    /// `t * t`, slow start
    Quadratic,
    /// `sqrt(t)`, fast start
    Sqrt,
}

impl Easing {
    /// Apply the curve to a ratio, clamping it to `[0, 1]` first
    pub fn apply(self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Self::Linear => t,
            Self::Quadratic => t * t,
            Self::Sqrt => t.sqrt(),
        }
    }

    /// Interpolate between `from` and `to`.
    ///
    /// A ratio of one yields `to` exactly.
    pub fn interpolate(self, from: f32, to: f32, t: f32) -> f32 {
        if t >= 1.0 {
            return to;
        }
        self.apply(t) * (to - from) + from
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_curves() {
        assert_eq!(Easing::Linear.apply(0.25), 0.25);
        assert_eq!(Easing::Quadratic.apply(0.5), 0.25);
        assert_eq!(Easing::Sqrt.apply(0.25), 0.5);
    }

    #[test]
    fn test_ratio_is_clamped() {
        assert_eq!(Easing::Linear.apply(-1.0), 0.0);
        assert_eq!(Easing::Quadratic.apply(3.0), 1.0);
    }

    #[test]
    fn test_interpolate_hits_endpoints() {
        assert_eq!(Easing::Quadratic.interpolate(200.0, -137.3, 1.0), -137.3);
        assert_eq!(Easing::Sqrt.interpolate(1.0, 0.5, 0.0), 1.0);
        assert_eq!(Easing::Linear.interpolate(0.0, 150.0, 0.5), 75.0);
    }
}
