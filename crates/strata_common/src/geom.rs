//! Integer rectangle geometry in database units.

use serde::{Deserialize, Serialize};

/// An axis-aligned rectangle in database units.
///
/// Coordinates are inclusive-min, exclusive-max is *not* assumed: a `Rect`
/// is the closed box `[xmin, xmax] × [ymin, ymax]`. Used for the die area,
/// region rectangles, and power-stripe shapes.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub struct Rect {
    /// Left edge.
    pub xmin: i64,
    /// Bottom edge.
    pub ymin: i64,
    /// Right edge.
    pub xmax: i64,
    /// Top edge.
    pub ymax: i64,
}

impl Rect {
    /// Creates a rectangle from its corner coordinates.
    pub fn new(xmin: i64, ymin: i64, xmax: i64, ymax: i64) -> Self {
        Self {
            xmin,
            ymin,
            xmax,
            ymax,
        }
    }

    /// The degenerate empty rectangle, the identity for [`union`](Self::union).
    pub const EMPTY: Rect = Rect {
        xmin: i64::MAX,
        ymin: i64::MAX,
        xmax: i64::MIN,
        ymax: i64::MIN,
    };

    /// Returns the width of the rectangle (zero if degenerate).
    pub fn width(&self) -> i64 {
        self.xmax.saturating_sub(self.xmin).max(0)
    }

    /// Returns the height of the rectangle (zero if degenerate).
    pub fn height(&self) -> i64 {
        self.ymax.saturating_sub(self.ymin).max(0)
    }

    /// Returns `true` if this rectangle has no area.
    pub fn is_empty(&self) -> bool {
        self.xmin >= self.xmax || self.ymin >= self.ymax
    }

    /// Returns `true` if the point lies inside or on the boundary.
    pub fn contains_point(&self, x: i64, y: i64) -> bool {
        x >= self.xmin && x <= self.xmax && y >= self.ymin && y <= self.ymax
    }

    /// Returns `true` if `other` lies entirely inside this rectangle.
    pub fn contains_rect(&self, other: &Rect) -> bool {
        other.xmin >= self.xmin
            && other.xmax <= self.xmax
            && other.ymin >= self.ymin
            && other.ymax <= self.ymax
    }

    /// Returns `true` if the two rectangles share any area or boundary.
    pub fn intersects(&self, other: &Rect) -> bool {
        self.xmin <= other.xmax
            && other.xmin <= self.xmax
            && self.ymin <= other.ymax
            && other.ymin <= self.ymax
    }

    /// Returns the smallest rectangle covering both rectangles.
    pub fn union(&self, other: &Rect) -> Rect {
        Rect {
            xmin: self.xmin.min(other.xmin),
            ymin: self.ymin.min(other.ymin),
            xmax: self.xmax.max(other.xmax),
            ymax: self.ymax.max(other.ymax),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dimensions() {
        let r = Rect::new(10, 20, 110, 50);
        assert_eq!(r.width(), 100);
        assert_eq!(r.height(), 30);
        assert!(!r.is_empty());
    }

    #[test]
    fn empty_rect() {
        assert!(Rect::EMPTY.is_empty());
        assert_eq!(Rect::EMPTY.width(), 0);
        assert_eq!(Rect::EMPTY.height(), 0);
    }

    #[test]
    fn contains_point_boundary() {
        let r = Rect::new(0, 0, 10, 10);
        assert!(r.contains_point(0, 0));
        assert!(r.contains_point(10, 10));
        assert!(r.contains_point(5, 5));
        assert!(!r.contains_point(11, 5));
        assert!(!r.contains_point(5, -1));
    }

    #[test]
    fn contains_rect_nested() {
        let outer = Rect::new(0, 0, 100, 100);
        let inner = Rect::new(10, 10, 90, 90);
        assert!(outer.contains_rect(&inner));
        assert!(!inner.contains_rect(&outer));
        assert!(outer.contains_rect(&outer));
    }

    #[test]
    fn intersects_and_disjoint() {
        let a = Rect::new(0, 0, 10, 10);
        let b = Rect::new(5, 5, 15, 15);
        let c = Rect::new(20, 20, 30, 30);
        assert!(a.intersects(&b));
        assert!(!a.intersects(&c));
        // Touching edges count as intersecting.
        let d = Rect::new(10, 0, 20, 10);
        assert!(a.intersects(&d));
    }

    #[test]
    fn union_covers_both() {
        let a = Rect::new(0, 0, 10, 10);
        let b = Rect::new(20, -5, 30, 5);
        let u = a.union(&b);
        assert_eq!(u, Rect::new(0, -5, 30, 10));
        assert_eq!(Rect::EMPTY.union(&a), a);
    }

    #[test]
    fn serde_roundtrip() {
        let r = Rect::new(-3, 4, 7, 9);
        let json = serde_json::to_string(&r).unwrap();
        let back: Rect = serde_json::from_str(&json).unwrap();
        assert_eq!(r, back);
    }
}
