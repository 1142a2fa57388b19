//! Distance-to-target scoring.
//!
//! A trial succeeds only when the final pointer position lands on or inside
//! the target rectangle: the success criterion is exact zero distance, not a
//! tolerance band.

use serde::{Deserialize, Serialize};

/// Axis-aligned target region, described by its center and size.
///
/// Never mutated after trial generation; used only for distance computation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TargetRect {
    pub center_x: f64,
    pub center_y: f64,
    pub width: f64,
    pub height: f64,
}

impl TargetRect {
    pub fn new(center_x: f64, center_y: f64, width: f64, height: f64) -> Self {
        Self { center_x, center_y, width, height }
    }

    /// Left, right, top and bottom edges as (xmin, xmax, ymin, ymax).
    pub fn edges(&self) -> (f64, f64, f64, f64) {
        (
            self.center_x - self.width / 2.0,
            self.center_x + self.width / 2.0,
            self.center_y - self.height / 2.0,
            self.center_y + self.height / 2.0,
        )
    }
}

/// Euclidean distance from `point` to the closest point of `rect`.
///
/// Exactly 0 when the point lies on or inside the boundary (inclusive).
/// Computed from independently clamped per-axis offsets.
pub fn distance_to_rect(rect: &TargetRect, point: (f64, f64)) -> f64 {
    let (xmin, xmax, ymin, ymax) = rect.edges();
    let (x, y) = point;

    let dx = (xmin - x).max(0.0).max(x - xmax);
    let dy = (ymin - y).max(0.0).max(y - ymax);

    (dx * dx + dy * dy).sqrt()
}

/// Strict containment success predicate.
pub fn is_hit(rect: &TargetRect, point: (f64, f64)) -> bool {
    distance_to_rect(rect, point) == 0.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_center_is_distance_zero() {
        let rect = TargetRect::new(100.0, 100.0, 40.0, 30.0);
        assert_eq!(distance_to_rect(&rect, (100.0, 100.0)), 0.0);
        assert!(is_hit(&rect, (100.0, 100.0)));
    }

    #[test]
    fn test_boundary_is_inclusive() {
        let rect = TargetRect::new(100.0, 100.0, 40.0, 30.0);
        // Right edge and a corner
        assert_eq!(distance_to_rect(&rect, (120.0, 100.0)), 0.0);
        assert_eq!(distance_to_rect(&rect, (80.0, 85.0)), 0.0);
    }

    #[test]
    fn test_distance_right_of_rect() {
        let rect = TargetRect::new(100.0, 100.0, 40.0, 30.0);
        // 100px right of center, half-width 20 -> 80px past the edge
        assert_eq!(distance_to_rect(&rect, (200.0, 100.0)), 80.0);
        assert!(!is_hit(&rect, (200.0, 100.0)));
    }

    #[test]
    fn test_distance_diagonal() {
        let rect = TargetRect::new(0.0, 0.0, 20.0, 20.0);
        // 3-4-5 triangle from the (10, 10) corner
        assert_eq!(distance_to_rect(&rect, (13.0, 14.0)), 5.0);
    }

    #[test]
    fn test_distance_symmetric_under_reflection() {
        let rect = TargetRect::new(100.0, 50.0, 40.0, 30.0);
        let point = (170.0, 90.0);

        let mirrored_x = TargetRect::new(-rect.center_x, rect.center_y, rect.width, rect.height);
        let mirrored_y = TargetRect::new(rect.center_x, -rect.center_y, rect.width, rect.height);

        let d = distance_to_rect(&rect, point);
        assert_eq!(distance_to_rect(&mirrored_x, (-point.0, point.1)), d);
        assert_eq!(distance_to_rect(&mirrored_y, (point.0, -point.1)), d);
    }
}
