//! Geometric utility functions for 2D vector math, distances and world bounds.

use geo::algorithm::Distance;
use geo::{Euclidean, Line, Point};
use ndarray::Array1;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Creates a 2D vector.
pub fn vec2(x: f32, y: f32) -> Array1<f32> {
    Array1::from_vec(vec![x, y])
}

/// Creates the zero vector.
pub fn zero() -> Array1<f32> {
    Array1::zeros(2)
}

/// Euclidean length of a vector.
pub fn magnitude(v: &Array1<f32>) -> f32 {
    v.dot(v).sqrt()
}

/// Squared distance between two points.
pub fn distance_sq(a: &Array1<f32>, b: &Array1<f32>) -> f32 {
    let dx = a[0] - b[0];
    let dy = a[1] - b[1];
    dx * dx + dy * dy
}

/// Returns the unit vector pointing along `v`, or the zero vector if `v` has no length.
pub fn normalized(v: &Array1<f32>) -> Array1<f32> {
    let len = magnitude(v);
    if len > f32::EPSILON { v / len } else { zero() }
}

/// Scales `v` to length `len`, keeping its direction.
pub fn set_magnitude(v: &Array1<f32>, len: f32) -> Array1<f32> {
    normalized(v) * len
}

/// Clamps the length of `v` to at most `max`.
pub fn limit(v: Array1<f32>, max: f32) -> Array1<f32> {
    let len = magnitude(&v);
    if len > max && len > 0.0 { v * (max / len) } else { v }
}

/// Returns `true` if both components are finite.
pub fn is_finite(v: &Array1<f32>) -> bool {
    v.iter().all(|c| c.is_finite())
}

/// Draws a uniformly distributed unit vector.
pub fn random_unit(rng: &mut impl Rng) -> Array1<f32> {
    let angle = rng.random_range(0.0..std::f32::consts::TAU);
    vec2(angle.cos(), angle.sin())
}

/// Calculates the minimum distance between a line segment and a circle center.
///
/// # Arguments
///
/// * `line_start` - Starting point of the line segment
/// * `line_end` - Ending point of the line segment
/// * `circle_center` - Center point of the circle
///
/// # Returns
///
/// The minimum Euclidean distance from the circle center to the line segment.
pub fn line_circle_distance(
    line_start: &Array1<f32>,
    line_end: &Array1<f32>,
    circle_center: &Array1<f32>,
) -> f32 {
    let p = Point::new(circle_center[0], circle_center[1]);
    let line = Line::new(
        Point::new(line_start[0], line_start[1]),
        Point::new(line_end[0], line_end[1]),
    );
    Euclidean.distance(&p, &line)
}

/// Rectangular world extent `[0, width] x [0, height]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WorldBounds {
    /// World width in world units.
    pub width: f32,
    /// World height in world units.
    pub height: f32,
}

impl WorldBounds {
    /// Creates bounds of the given size.
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// Returns `true` if `pos` lies inside the closed world rectangle.
    pub fn contains(&self, pos: &Array1<f32>) -> bool {
        (0.0..=self.width).contains(&pos[0]) && (0.0..=self.height).contains(&pos[1])
    }

    /// Center of the world.
    pub fn center(&self) -> Array1<f32> {
        vec2(self.width / 2.0, self.height / 2.0)
    }

    /// Draws a uniformly distributed point inside the world.
    pub fn random_point(&self, rng: &mut impl Rng) -> Array1<f32> {
        vec2(
            rng.random_range(0.0..=self.width),
            rng.random_range(0.0..=self.height),
        )
    }

    /// Clamps a point into the world rectangle.
    pub fn clamp(&self, pos: &mut Array1<f32>) {
        pos[0] = pos[0].clamp(0.0, self.width);
        pos[1] = pos[1].clamp(0.0, self.height);
    }

    /// Clamps `pos` into the world and reflects the matching velocity
    /// component so the agent heads back inside.
    pub fn contain(&self, pos: &mut Array1<f32>, vel: &mut Array1<f32>) {
        let extents = [self.width, self.height];
        for axis in 0..2 {
            if pos[axis] < 0.0 {
                pos[axis] = 0.0;
                vel[axis] = vel[axis].abs();
            } else if pos[axis] > extents[axis] {
                pos[axis] = extents[axis];
                vel[axis] = -vel[axis].abs();
            }
        }
    }
}
