use serde::{Deserialize, Serialize};

/// How coordinate deltas wrap around the edges of the unit torus.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WrapMode {
    /// Each axis wraps on its own: the shorter of the direct and wrap-around delta.
    #[default]
    Independent,
    /// Only the x delta wraps; the y delta is always the direct distance.
    /// Matches populations generated by the earlier web build of this model.
    Legacy,
}

/// Shorter of the direct and wrap-around distance between two coordinates in `[0, 1)`.
#[inline(always)]
pub fn wrap_delta(a: f64, b: f64) -> f64 {
    let d = (a - b).abs();
    if d > 1.0 - d { 1.0 - d } else { d }
}

/// A point on the unit square.
#[derive(Debug, Copy, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f64,
    pub y: f64,
}

impl Vec2 {
    /// Creates a new Vec2.
    #[inline(always)]
    pub fn new(x: f64, y: f64) -> Self {
        Vec2 { x, y }
    }

    /// Squared Euclidean distance without any wrapping.
    #[inline(always)]
    pub fn distance_squared(&self, other: Vec2) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx * dx + dy * dy
    }

    /// Squared distance on the unit torus.
    #[inline(always)]
    pub fn toroidal_distance_squared(&self, other: Vec2, wrap: WrapMode) -> f64 {
        let dx = wrap_delta(self.x, other.x);
        let dy = match wrap {
            WrapMode::Independent => wrap_delta(self.y, other.y),
            WrapMode::Legacy => (self.y - other.y).abs(),
        };
        dx * dx + dy * dy
    }

    /// True if both coordinates lie in `[0, 1)`.
    pub fn in_unit_square(&self) -> bool {
        (0.0..1.0).contains(&self.x) && (0.0..1.0).contains(&self.y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wrap_delta_takes_short_way_round() {
        assert!((wrap_delta(0.01, 0.99) - 0.02).abs() < 1e-12);
        assert!((wrap_delta(0.2, 0.4) - 0.2).abs() < 1e-12);
        assert_eq!(wrap_delta(0.0, 0.5), 0.5);
    }

    #[test]
    fn legacy_mode_only_wraps_x() {
        let a = Vec2::new(0.5, 0.01);
        let b = Vec2::new(0.5, 0.99);
        let independent = a.toroidal_distance_squared(b, WrapMode::Independent);
        let legacy = a.toroidal_distance_squared(b, WrapMode::Legacy);
        assert!((independent - 0.0004).abs() < 1e-12);
        assert!((legacy - 0.98 * 0.98).abs() < 1e-12);

        let c = Vec2::new(0.01, 0.5);
        let d = Vec2::new(0.99, 0.5);
        assert_eq!(
            c.toroidal_distance_squared(d, WrapMode::Independent),
            c.toroidal_distance_squared(d, WrapMode::Legacy)
        );
        assert!(c.distance_squared(d) > 0.9);
    }

    #[test]
    fn unit_square_bounds() {
        assert!(Vec2::new(0.0, 0.999).in_unit_square());
        assert!(!Vec2::new(1.0, 0.5).in_unit_square());
        assert!(!Vec2::new(0.5, -0.1).in_unit_square());
    }
}
