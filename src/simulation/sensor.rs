//! Ray sensors mounted on a car.
//!
//! A sensor is a ray that starts at the car center and points at a fixed
//! angle relative to the car's heading. Its endpoints are re-derived from the
//! car pose every tick; only the relative angle and length are persistent.

use ndarray::Array1;
use serde::{Deserialize, Serialize};

use super::geometric_utils::distance_from_line;
use super::locatable::Locatable;

/// A single ray sensor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sensor {
    /// Angle offset from the car heading, in radians.
    pub relative_theta: f32,
    /// Ray length.
    pub length: f32,
    /// Whether the ray hit something during the last sensing pass.
    #[serde(skip)]
    pub tripped: bool,
    /// Absolute angle of the ray after the last update.
    #[serde(skip)]
    pub theta: f32,
    /// Ray start point (the car center).
    #[serde(skip, default = "origin")]
    pub start: Array1<f32>,
    /// Ray end point.
    #[serde(skip, default = "origin")]
    pub end: Array1<f32>,
}

fn origin() -> Array1<f32> {
    Array1::zeros(2)
}

impl Sensor {
    /// Creates an untripped sensor with both endpoints at the origin.
    pub fn new(relative_theta: f32, length: f32) -> Self {
        Self {
            relative_theta,
            length,
            tripped: false,
            theta: relative_theta,
            start: origin(),
            end: origin(),
        }
    }

    /// Lays out `count` sensors evenly across `spread` radians, centered on
    /// the heading. A single sensor points straight ahead.
    pub fn fan(count: usize, spread: f32, length: f32) -> Vec<Self> {
        if count == 1 {
            return vec![Self::new(0.0, length)];
        }

        let separation = spread / (count as f32 - 1.0);
        let first = -spread / 2.0;
        (0..count)
            .map(|i| Self::new(first + i as f32 * separation, length))
            .collect()
    }

    /// Re-derives the ray endpoints from the car pose.
    pub fn update(&mut self, car_x: f32, car_y: f32, car_heading: f32) {
        self.theta = car_heading + self.relative_theta;
        self.start[0] = car_x;
        self.start[1] = car_y;
        self.end[0] = car_x + self.length * self.theta.cos();
        self.end[1] = car_y + self.length * self.theta.sin();
    }

    /// Cheap approximate ray/disc intersection.
    ///
    /// The obstacle center must lie within `radius` of the infinite line
    /// through the ray and strictly inside the ray's bounding box grown by
    /// `radius` on every side.
    pub fn detects(&self, obstacle: &impl Locatable) -> bool {
        let disc = obstacle.disc();
        let r = disc.radius;

        let on_line = distance_from_line(&self.start, &self.end, &disc.pos) <= r;

        let x_min = self.start[0].min(self.end[0]) - r;
        let x_max = self.start[0].max(self.end[0]) + r;
        let y_min = self.start[1].min(self.end[1]) - r;
        let y_max = self.start[1].max(self.end[1]) + r;
        let in_x = x_min < disc.x() && disc.x() < x_max;
        let in_y = y_min < disc.y() && disc.y() < y_max;

        on_line && in_x && in_y
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulation::obstacle::Obstacle;
    use geo::algorithm::Distance;
    use geo::{Euclidean, Line, Point};

    /// Exact distance from the obstacle center to the ray segment.
    fn segment_distance(sensor: &Sensor, obstacle: &Obstacle) -> f32 {
        let line = Line::new(
            Point::new(sensor.start[0], sensor.start[1]),
            Point::new(sensor.end[0], sensor.end[1]),
        );
        Euclidean.distance(&Point::new(obstacle.disc.x(), obstacle.disc.y()), &line)
    }

    fn sensor_at_origin(relative_theta: f32, length: f32) -> Sensor {
        let mut sensor = Sensor::new(relative_theta, length);
        sensor.update(0.0, 0.0, 0.0);
        sensor
    }

    #[test]
    fn detects_obstacle_on_ray() {
        let sensor = sensor_at_origin(0.0, 65.0);
        assert!(sensor.detects(&Obstacle::new(30.0, 0.0, 5.0)));
        assert!(!sensor.detects(&Obstacle::new(100.0, 0.0, 5.0)));
    }

    #[test]
    fn detects_every_point_along_the_ray() {
        for theta in [-1.2_f32, -0.4, 0.0, 0.7, 1.5, 3.0] {
            let sensor = sensor_at_origin(theta, 80.0);
            for step in 1..8 {
                let t = step as f32 * 10.0;
                let obstacle = Obstacle::new(t * theta.cos(), t * theta.sin(), 5.0);
                assert!(sensor.detects(&obstacle), "theta {theta}, t {t}");
            }
        }
    }

    #[test]
    fn bounding_box_edge_is_exclusive() {
        // Center sits exactly `radius` past the ray end: on the line but on
        // the box boundary.
        let sensor = sensor_at_origin(0.0, 50.0);
        assert!(!sensor.detects(&Obstacle::new(55.0, 0.0, 5.0)));
        assert!(sensor.detects(&Obstacle::new(54.9, 0.0, 5.0)));
    }

    #[test]
    fn approximation_accepts_box_corners() {
        // Near the end of the ray, off to the side: inside the grown box and
        // within `radius` of the line, but past the segment end.
        let sensor = sensor_at_origin(0.0, 50.0);
        let obstacle = Obstacle::new(54.0, 4.0, 5.0);
        assert!(sensor.detects(&obstacle));
        assert!(segment_distance(&sensor, &obstacle) > obstacle.disc.radius);
    }

    #[test]
    fn fan_is_symmetric_about_heading() {
        let sensors = Sensor::fan(7, std::f32::consts::FRAC_PI_2, 80.0);
        assert_eq!(sensors.len(), 7);
        assert!((sensors[0].relative_theta + std::f32::consts::FRAC_PI_4).abs() < 1e-6);
        assert!(sensors[3].relative_theta.abs() < 1e-6);
        assert!((sensors[6].relative_theta - std::f32::consts::FRAC_PI_4).abs() < 1e-6);
    }
}
