use glam::DVec2;
use serde::{Deserialize, Serialize};

/// Immutable 2D point. Coordinates are in pixels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const ORIGIN: Point = Point { x: 0.0, y: 0.0 };

    #[inline]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance(self, other: Point) -> f64 {
        DVec2::from(self).distance(other.into())
    }

    /// Linear interpolation towards `other`; `t = 0` yields `self`.
    pub fn lerp(self, other: Point, t: f64) -> Point {
        DVec2::from(self).lerp(other.into(), t).into()
    }

    /// Angle in radians of the vector from `self` to `other`.
    pub fn angle_to(self, other: Point) -> f64 {
        (other.y - self.y).atan2(other.x - self.x)
    }
}

impl From<DVec2> for Point {
    fn from(value: DVec2) -> Self {
        Self::new(value.x, value.y)
    }
}

impl From<Point> for DVec2 {
    fn from(value: Point) -> Self {
        DVec2::new(value.x, value.y)
    }
}

/// Axis aligned rectangle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Half-open containment: the right and bottom edges are outside.
    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.x
            && point.y >= self.y
            && point.x < self.x + self.width
            && point.y < self.y + self.height
    }

    pub fn center(&self) -> Point {
        Point::new(self.x + self.width * 0.5, self.y + self.height * 0.5)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rect_excludes_far_edges() {
        let rect = Rect::new(10.0, 10.0, 20.0, 20.0);
        assert!(rect.contains(Point::new(10.0, 10.0)));
        assert!(rect.contains(Point::new(29.9, 29.9)));
        assert!(!rect.contains(Point::new(30.0, 15.0)));
        assert!(!rect.contains(Point::new(9.9, 15.0)));
    }

    #[test]
    fn lerp_and_angle() {
        let a = Point::new(0.0, 0.0);
        let b = Point::new(10.0, 0.0);
        assert_eq!(a.lerp(b, 0.5), Point::new(5.0, 0.0));
        assert_eq!(a.angle_to(Point::new(0.0, 1.0)), std::f64::consts::FRAC_PI_2);
        assert_eq!(a.distance(b), 10.0);
    }
}
