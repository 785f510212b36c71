//! Geometry shared by the display resolver, region mapper and overlay.
//!
//! Floating-point types are device-independent units (DIP), the space that
//! pointer and window APIs report. `CropRect` is the only pixel-space type.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn offset(self, dx: f64, dy: f64) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }
}

/// Axis-aligned rectangle. Display bounds use desktop space, where the
/// origin is physical and the extent is DIP.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }

    pub fn origin(&self) -> Point {
        Point::new(self.x, self.y)
    }

    /// Half-open containment: the right and bottom edges belong to the
    /// neighbouring display, so adjacent monitors never both claim a point.
    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.x && p.x < self.x + self.width && p.y >= self.y && p.y < self.y + self.height
    }

    /// Distance from `p` to the closest point of this rectangle (0 inside).
    pub fn distance_to(&self, p: Point) -> f64 {
        let dx = (self.x - p.x).max(p.x - (self.x + self.width)).max(0.0);
        let dy = (self.y - p.y).max(p.y - (self.y + self.height)).max(0.0);
        dx.hypot(dy)
    }
}

/// A rectangle dragged on the overlay, in the overlay's local DIP space.
///
/// Always normalized: built from the two drag endpoints with min/abs, so
/// width and height are never negative whichever way the user dragged.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SelectionRect {
    x: f64,
    y: f64,
    width: f64,
    height: f64,
}

impl SelectionRect {
    pub fn from_points(start: Point, end: Point) -> Self {
        Self {
            x: start.x.min(end.x),
            y: start.y.min(end.y),
            width: (end.x - start.x).abs(),
            height: (end.y - start.y).abs(),
        }
    }

    /// Build from an origin and a (possibly negative) extent.
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self::from_points(Point::new(x, y), Point::new(x + width, y + height))
    }

    pub fn x(&self) -> f64 {
        self.x
    }

    pub fn y(&self) -> f64 {
        self.y
    }

    pub fn width(&self) -> f64 {
        self.width
    }

    pub fn height(&self) -> f64 {
        self.height
    }

    /// True when both sides reach `min` DIP. Anything smaller is a click,
    /// not a selection.
    pub fn meets_minimum(&self, min: f64) -> bool {
        self.width >= min && self.height >= min
    }
}

/// Pixel-space crop rectangle against a captured frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CropRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl CropRect {
    /// True when the rectangle lies entirely inside a `frame_width` x `frame_height` frame.
    pub fn fits_within(&self, frame_width: u32, frame_height: u32) -> bool {
        u64::from(self.x) + u64::from(self.width) <= u64::from(frame_width)
            && u64::from(self.y) + u64::from(self.height) <= u64::from(frame_height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drag_direction_does_not_change_selection() {
        let a = Point::new(300.0, 250.0);
        let b = Point::new(100.0, 100.0);
        let down_right = SelectionRect::from_points(b, a);
        let up_left = SelectionRect::from_points(a, b);
        assert_eq!(down_right, up_left);
        assert_eq!(up_left.x(), 100.0);
        assert_eq!(up_left.width(), 200.0);
        assert_eq!(up_left.height(), 150.0);
    }

    #[test]
    fn mixed_diagonal_drags_normalize() {
        let up_right = SelectionRect::from_points(Point::new(10.0, 90.0), Point::new(60.0, 20.0));
        let down_left = SelectionRect::from_points(Point::new(60.0, 20.0), Point::new(10.0, 90.0));
        assert_eq!(up_right, down_left);
        assert!(up_right.width() >= 0.0 && up_right.height() >= 0.0);
    }

    #[test]
    fn negative_extent_is_normalized() {
        let rect = SelectionRect::new(50.0, 50.0, -20.0, -30.0);
        assert_eq!((rect.x(), rect.y()), (30.0, 20.0));
        assert_eq!((rect.width(), rect.height()), (20.0, 30.0));
    }

    #[test]
    fn minimum_applies_to_each_side() {
        assert!(SelectionRect::new(0.0, 0.0, 5.0, 5.0).meets_minimum(5.0));
        assert!(!SelectionRect::new(0.0, 0.0, 4.9, 200.0).meets_minimum(5.0));
        assert!(!SelectionRect::new(0.0, 0.0, 200.0, 0.0).meets_minimum(5.0));
    }

    #[test]
    fn rect_contains_is_half_open() {
        let r = Rect::new(0.0, 0.0, 1920.0, 1080.0);
        assert!(r.contains(Point::new(0.0, 0.0)));
        assert!(r.contains(Point::new(1919.5, 1079.0)));
        assert!(!r.contains(Point::new(1920.0, 10.0)));
    }

    #[test]
    fn distance_is_zero_inside_and_euclidean_outside() {
        let r = Rect::new(0.0, 0.0, 100.0, 100.0);
        assert_eq!(r.distance_to(Point::new(50.0, 50.0)), 0.0);
        assert_eq!(r.distance_to(Point::new(110.0, 50.0)), 10.0);
        assert_eq!(r.distance_to(Point::new(103.0, 104.0)), 5.0);
    }
}
