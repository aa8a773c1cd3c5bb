//! Parametric paths built from line, quadratic and cubic segments.
//!
//! A [`Path`] is assembled incrementally between [`Path::begin_path`] and
//! [`Path::end_path`]. Any other mutation is rejected. Evaluation maps a
//! parameter `t` in `[0, 1]` onto the whole path, giving every segment a share of
//! `t` proportional to its arc length so the position is continuous across
//! segment boundaries.

use serde::{Deserialize, Serialize};

use crate::{Point, Result, StagehandError};

/// Number of chords used to approximate the length of curved segments.
const CURVE_LENGTH_STEPS: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum PathSegment {
    Line {
        from: Point,
        to: Point,
    },
    Quadric {
        from: Point,
        control: Point,
        to: Point,
    },
    Cubic {
        from: Point,
        control1: Point,
        control2: Point,
        to: Point,
    },
}

impl PathSegment {
    pub fn start(&self) -> Point {
        match *self {
            Self::Line { from, .. } | Self::Quadric { from, .. } | Self::Cubic { from, .. } => {
                from
            }
        }
    }

    pub fn end(&self) -> Point {
        match *self {
            Self::Line { to, .. } | Self::Quadric { to, .. } | Self::Cubic { to, .. } => to,
        }
    }

    pub fn point_at(&self, t: f64) -> Point {
        let t = t.clamp(0.0, 1.0);
        match *self {
            Self::Line { from, to } => from.lerp(to, t),
            Self::Quadric { from, control, to } => {
                let u = 1.0 - t;
                Point::new(
                    u * u * from.x + 2.0 * u * t * control.x + t * t * to.x,
                    u * u * from.y + 2.0 * u * t * control.y + t * t * to.y,
                )
            }
            Self::Cubic {
                from,
                control1,
                control2,
                to,
            } => {
                let u = 1.0 - t;
                let a = u * u * u;
                let b = 3.0 * u * u * t;
                let c = 3.0 * u * t * t;
                let d = t * t * t;
                Point::new(
                    a * from.x + b * control1.x + c * control2.x + d * to.x,
                    a * from.y + b * control1.y + c * control2.y + d * to.y,
                )
            }
        }
    }

    /// First derivative with respect to the segment parameter.
    fn derivative_at(&self, t: f64) -> (f64, f64) {
        let t = t.clamp(0.0, 1.0);
        match *self {
            Self::Line { from, to } => (to.x - from.x, to.y - from.y),
            Self::Quadric { from, control, to } => {
                let u = 1.0 - t;
                (
                    2.0 * u * (control.x - from.x) + 2.0 * t * (to.x - control.x),
                    2.0 * u * (control.y - from.y) + 2.0 * t * (to.y - control.y),
                )
            }
            Self::Cubic {
                from,
                control1,
                control2,
                to,
            } => {
                let u = 1.0 - t;
                (
                    3.0 * u * u * (control1.x - from.x)
                        + 6.0 * u * t * (control2.x - control1.x)
                        + 3.0 * t * t * (to.x - control2.x),
                    3.0 * u * u * (control1.y - from.y)
                        + 6.0 * u * t * (control2.y - control1.y)
                        + 3.0 * t * t * (to.y - control2.y),
                )
            }
        }
    }

    /// Direction of travel in radians at `t`.
    pub fn tangent_at(&self, t: f64) -> f64 {
        let (dx, dy) = self.derivative_at(t);
        if dx == 0.0 && dy == 0.0 {
            return self.start().angle_to(self.end());
        }
        dy.atan2(dx)
    }

    pub fn length(&self) -> f64 {
        match *self {
            Self::Line { from, to } => from.distance(to),
            _ => {
                let mut length = 0.0;
                let mut previous = self.start();
                for step in 1..=CURVE_LENGTH_STEPS {
                    let next = self.point_at(step as f64 / CURVE_LENGTH_STEPS as f64);
                    length += previous.distance(next);
                    previous = next;
                }
                length
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PathState {
    #[default]
    Empty,
    Building,
    Finished,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Path {
    segments: Vec<PathSegment>,
    lengths: Vec<f64>,
    start: Point,
    cursor: Point,
    state: PathState,
}

impl Path {
    pub fn new() -> Self {
        Self::default()
    }

    /// Convenience constructor for a finished straight path.
    pub fn linear(x0: f64, y0: f64, x1: f64, y1: f64) -> Self {
        let mut path = Self::new();
        path.push(PathSegment::Line {
            from: Point::new(x0, y0),
            to: Point::new(x1, y1),
        });
        path.start = Point::new(x0, y0);
        path.cursor = Point::new(x1, y1);
        path.state = PathState::Finished;
        path
    }

    pub fn state(&self) -> PathState {
        self.state
    }

    pub fn is_building(&self) -> bool {
        self.state == PathState::Building
    }

    /// Starts a new construction at `(x, y)`, discarding any previous segments.
    pub fn begin_path(&mut self, x: f64, y: f64) -> Result<&mut Self> {
        if self.is_building() {
            return Err(StagehandError::construction(
                "begin_path called while the path is already being built",
            ));
        }
        self.segments.clear();
        self.lengths.clear();
        self.start = Point::new(x, y);
        self.cursor = self.start;
        self.state = PathState::Building;
        Ok(self)
    }

    pub fn add_line_to(&mut self, x: f64, y: f64) -> Result<&mut Self> {
        self.ensure_building("add_line_to")?;
        let to = Point::new(x, y);
        self.push(PathSegment::Line {
            from: self.cursor,
            to,
        });
        Ok(self)
    }

    pub fn add_quadric_to(&mut self, cx: f64, cy: f64, x: f64, y: f64) -> Result<&mut Self> {
        self.ensure_building("add_quadric_to")?;
        self.push(PathSegment::Quadric {
            from: self.cursor,
            control: Point::new(cx, cy),
            to: Point::new(x, y),
        });
        Ok(self)
    }

    pub fn add_cubic_to(
        &mut self,
        c1x: f64,
        c1y: f64,
        c2x: f64,
        c2y: f64,
        x: f64,
        y: f64,
    ) -> Result<&mut Self> {
        self.ensure_building("add_cubic_to")?;
        self.push(PathSegment::Cubic {
            from: self.cursor,
            control1: Point::new(c1x, c1y),
            control2: Point::new(c2x, c2y),
            to: Point::new(x, y),
        });
        Ok(self)
    }

    /// Adds a straight segment back to the start point.
    pub fn close_path(&mut self) -> Result<&mut Self> {
        self.ensure_building("close_path")?;
        let start = self.start;
        self.add_line_to(start.x, start.y)
    }

    pub fn end_path(&mut self) -> Result<&mut Self> {
        self.ensure_building("end_path")?;
        self.state = PathState::Finished;
        Ok(self)
    }

    /// Replaces the contents with a single finished line segment.
    pub fn set_linear(&mut self, x0: f64, y0: f64, x1: f64, y1: f64) -> Result<&mut Self> {
        if self.is_building() {
            return Err(StagehandError::construction(
                "set_linear called while the path is being built",
            ));
        }
        *self = Self::linear(x0, y0, x1, y1);
        Ok(self)
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    pub fn segment_count(&self) -> usize {
        self.segments.len()
    }

    pub fn length(&self) -> f64 {
        self.lengths.iter().sum()
    }

    pub fn start_point(&self) -> Point {
        self.start
    }

    pub fn end_point(&self) -> Point {
        self.cursor
    }

    /// Position at normalised parameter `t`; values outside `[0, 1]` are clamped.
    pub fn position_at(&self, t: f64) -> Point {
        match self.locate(t) {
            Some((segment, local)) => segment.point_at(local),
            None => self.start,
        }
    }

    /// Direction of travel in radians at normalised parameter `t`.
    pub fn tangent_at(&self, t: f64) -> f64 {
        match self.locate(t) {
            Some((segment, local)) => segment.tangent_at(local),
            None => 0.0,
        }
    }

    fn locate(&self, t: f64) -> Option<(&PathSegment, f64)> {
        let first = self.segments.first()?;
        let total = self.length();
        if total <= 0.0 {
            return Some((first, 0.0));
        }

        let t = t.clamp(0.0, 1.0);
        if t >= 1.0 {
            return self
                .segments
                .iter()
                .zip(&self.lengths)
                .rev()
                .find(|(_, &length)| length > 0.0)
                .map(|(segment, _)| (segment, 1.0));
        }

        let target = t * total;
        let mut travelled = 0.0;
        let mut last = (first, 0.0);
        for (segment, &length) in self.segments.iter().zip(&self.lengths) {
            if length <= 0.0 {
                continue;
            }
            if travelled + length >= target {
                return Some((segment, (target - travelled) / length));
            }
            travelled += length;
            last = (segment, 1.0);
        }
        Some(last)
    }

    fn push(&mut self, segment: PathSegment) {
        self.lengths.push(segment.length());
        self.cursor = segment.end();
        self.segments.push(segment);
    }

    fn ensure_building(&self, operation: &str) -> Result<()> {
        if self.is_building() {
            Ok(())
        } else {
            Err(StagehandError::construction(format!(
                "{operation} called outside begin_path/end_path"
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    fn square() -> Path {
        let mut path = Path::new();
        path.begin_path(0.0, 0.0)
            .unwrap()
            .add_line_to(100.0, 0.0)
            .unwrap()
            .add_line_to(100.0, 100.0)
            .unwrap()
            .add_line_to(0.0, 100.0)
            .unwrap()
            .close_path()
            .unwrap()
            .end_path()
            .unwrap();
        path
    }

    #[test]
    fn mutation_outside_bracket_fails() {
        let mut path = Path::new();
        assert!(matches!(
            path.add_line_to(1.0, 1.0),
            Err(StagehandError::Construction(_))
        ));
        assert!(path.end_path().is_err());

        let mut path = square();
        assert!(path.add_quadric_to(0.0, 0.0, 1.0, 1.0).is_err());
        assert_eq!(path.segment_count(), 4);
    }

    #[test]
    fn begin_twice_fails_and_set_linear_requires_idle() {
        let mut path = Path::new();
        path.begin_path(0.0, 0.0).unwrap();
        assert!(path.begin_path(1.0, 1.0).is_err());
        assert!(path.set_linear(0.0, 0.0, 1.0, 1.0).is_err());
        path.end_path().unwrap();
        path.set_linear(0.0, 0.0, 10.0, 0.0).unwrap();
        assert_eq!(path.state(), PathState::Finished);
        assert_eq!(path.segment_count(), 1);
    }

    #[test]
    fn evaluation_is_length_weighted() {
        let path = square();
        assert_relative_eq!(path.length(), 400.0);
        assert_eq!(path.position_at(0.0), Point::new(0.0, 0.0));
        assert_eq!(path.position_at(0.25), Point::new(100.0, 0.0));
        assert_eq!(path.position_at(0.5), Point::new(100.0, 100.0));
        let p = path.position_at(0.375);
        assert_relative_eq!(p.x, 100.0);
        assert_relative_eq!(p.y, 50.0);
        assert_eq!(path.position_at(1.0), Point::new(0.0, 0.0));
        assert_eq!(path.position_at(7.0), path.position_at(1.0));
    }

    #[test]
    fn evaluation_is_continuous_across_segments() {
        let mut path = Path::new();
        path.begin_path(0.0, 0.0)
            .unwrap()
            .add_quadric_to(50.0, 100.0, 100.0, 0.0)
            .unwrap()
            .add_line_to(200.0, 0.0)
            .unwrap()
            .add_cubic_to(250.0, 50.0, 300.0, -50.0, 350.0, 0.0)
            .unwrap()
            .end_path()
            .unwrap();

        let steps = 2000;
        let max_jump = path.length() / steps as f64 * 3.0;
        let mut previous = path.position_at(0.0);
        for step in 1..=steps {
            let next = path.position_at(step as f64 / steps as f64);
            assert!(previous.distance(next) <= max_jump);
            previous = next;
        }
        assert_eq!(previous, Point::new(350.0, 0.0));
    }

    #[test]
    fn empty_path_evaluates_to_start() {
        assert_eq!(Path::new().position_at(0.5), Point::ORIGIN);
        let mut path = Path::new();
        path.begin_path(3.0, 4.0).unwrap();
        assert_eq!(path.position_at(0.5), Point::new(3.0, 4.0));
    }

    #[test]
    fn tangent_follows_direction() {
        let path = Path::linear(0.0, 0.0, 0.0, 10.0);
        assert_relative_eq!(path.tangent_at(0.5), std::f64::consts::FRAC_PI_2);
    }
}
