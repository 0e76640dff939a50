//! Scalar and vector math for the arena simulation.
//!
//! Positions are measured in field units with the y axis pointing down,
//! matching the renderer's pixel coordinates. Headings are compass
//! degrees: 0 points up the screen, 90 points right, and angles wrap
//! into `[0, 360)`.

use serde::{Deserialize, Serialize};

/// Tolerance below which a vector is treated as having no direction.
pub const EPSILON: f64 = 1e-9;

/// 2D vector in field units.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec2 {
    /// X coordinate.
    pub x: f64,
    /// Y coordinate.
    pub y: f64,
}

impl Vec2 {
    /// Zero vector.
    pub const ZERO: Self = Self { x: 0.0, y: 0.0 };

    /// Create a new vector.
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Dot product of two vectors.
    #[must_use]
    pub fn dot(self, other: Self) -> f64 {
        self.x * other.x + self.y * other.y
    }

    /// Squared length of the vector.
    #[must_use]
    pub fn length_squared(self) -> f64 {
        self.dot(self)
    }

    /// Length of the vector.
    #[must_use]
    pub fn length(self) -> f64 {
        self.length_squared().sqrt()
    }

    /// Euclidean distance to another point.
    #[must_use]
    pub fn distance(self, other: Self) -> f64 {
        (other - self).length()
    }

    /// Squared distance (avoids sqrt for comparisons).
    #[must_use]
    pub fn distance_squared(self, other: Self) -> f64 {
        (other - self).length_squared()
    }

    /// Normalize to unit length. Vectors shorter than [`EPSILON`]
    /// have no meaningful direction and come back as zero.
    #[must_use]
    pub fn normalize(self) -> Self {
        let len = self.length();
        if len < EPSILON {
            return Self::ZERO;
        }
        Self::new(self.x / len, self.y / len)
    }
}

impl std::ops::Add for Vec2 {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl std::ops::Sub for Vec2 {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl std::ops::Mul<f64> for Vec2 {
    type Output = Self;

    fn mul(self, rhs: f64) -> Self::Output {
        Self::new(self.x * rhs, self.y * rhs)
    }
}

/// Unit vector for a compass heading in degrees.
///
/// Heading 0 points up (negative y), 90 points right, and so on
/// clockwise. This is the convention every moving thing in the arena
/// uses for `alpha`.
#[must_use]
pub fn heading_vector(alpha_deg: f64) -> Vec2 {
    let rad = (alpha_deg - 90.0).to_radians();
    Vec2::new(rad.cos(), rad.sin())
}

/// Clamp a value into the symmetric interval `[-limit, limit]`.
///
/// Every kinematic quantity (acceleration, velocity, turn rate) is
/// bounded this way by the owning agent's body parameters.
#[must_use]
pub fn clamp_symmetric(value: f64, limit: f64) -> f64 {
    value.clamp(-limit, limit)
}

/// Wrap an angle in degrees into `[0, 360)`.
#[must_use]
pub fn wrap_degrees(deg: f64) -> f64 {
    deg.rem_euclid(360.0)
}
