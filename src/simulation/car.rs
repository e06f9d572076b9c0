//! Cars: the agents that steer around obstacles.
//!
//! A car sits at a fixed x while the track scrolls past it. Each tick it
//! moves vertically along its heading, recasts its sensors against nearby
//! obstacles and lets its brain pick a steering action.

use std::path::Path;

use ndarray::Array1;
use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use super::brain::{Brain, Steering};
use super::locatable::{Disc, Locatable, collides};
use super::obstacle::Obstacle;
use super::params::Params;
use super::sensor::Sensor;
use super::spatial::ObstacleIndex;
use super::weights::{WeightBundle, WeightsError};

/// Slack added to the pruning radius so obstacles grazing a sensor tip are
/// still tested.
pub const PRUNE_FUDGE: f32 = 3.0;

/// Raised when rejection sampling cannot produce a car that passes the
/// sanity check.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SanityError {
    /// Every attempt produced a network that turns with no input.
    #[error("no sane network found after {attempts} attempts")]
    Exhausted {
        /// Number of candidates tried.
        attempts: usize,
    },
}

/// Outcome of one sensing pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Perception {
    /// Every sensor was tested against the nearby obstacles.
    Sensed,
    /// A sensor reached past the track edge; the heading was mirrored and the
    /// remaining sensors were not tested.
    Reflected {
        /// Index of the sensor that crossed the edge.
        sensor: usize,
    },
}

/// A car with ray sensors and a steering network.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Car {
    /// Identifier, unique within a run.
    pub id: usize,
    /// Position and collision radius.
    pub disc: Disc,
    /// Heading in radians; 0 points down the track.
    pub heading: f32,
    /// Speed magnitude per tick.
    pub speed: f32,
    /// Heading change per steering action.
    pub steering_increment: f32,
    /// Angle covered by the sensor fan.
    pub sensor_spread: f32,
    /// Length of every sensor ray.
    pub sensor_length: f32,
    /// Sensors, ordered from the leftmost ray.
    pub sensors: Vec<Sensor>,
    /// Steering network.
    pub brain: Brain,
    /// Distance travelled down the track.
    pub fitness: f32,
    /// Cleared on collision or when leaving the track.
    pub alive: bool,
}

impl Car {
    /// Assembles a car at the start position with the given brain and sensor
    /// geometry. The sensor count comes from the brain's input size.
    pub fn new(
        id: usize,
        params: &Params,
        brain: Brain,
        sensor_spread: f32,
        sensor_length: f32,
        steering_increment: f32,
    ) -> Self {
        let sensors = Sensor::fan(brain.input_size(), sensor_spread, sensor_length);
        let mut car = Self {
            id,
            disc: Disc::new(params.car_x(), params.car_y(), params.car_radius),
            heading: 0.0,
            speed: params.car_speed,
            steering_increment,
            sensor_spread,
            sensor_length,
            sensors,
            brain,
            fitness: 0.0,
            alive: true,
        };
        car.update_sensors();
        car
    }

    /// Creates a car with random weights and the default sensor geometry.
    ///
    /// The network is not checked; see [`Car::new_sane`].
    pub fn new_random(rng: &mut impl Rng, id: usize, params: &Params) -> Self {
        let brain = Brain::new(rng, &params.layer_sizes(), params.weight_scale);
        Self::new(
            id,
            params,
            brain,
            params.sensor_spread,
            params.sensor_length,
            params.steering_increment,
        )
    }

    /// Creates a random car whose network keeps straight with nothing in sight.
    pub fn new_sane(rng: &mut impl Rng, id: usize, params: &Params) -> Result<Self, SanityError> {
        for attempt in 1..=params.max_sanity_attempts {
            let car = Self::new_random(rng, id, params);
            if car.brain.is_sane() {
                debug!(id, attempt, "fresh car accepted");
                return Ok(car);
            }
        }
        Err(SanityError::Exhausted {
            attempts: params.max_sanity_attempts,
        })
    }

    /// A deterministic car that always passes the sanity check.
    pub fn known_good(id: usize, params: &Params) -> Self {
        Self::new(
            id,
            params,
            Brain::known_good(&params.layer_sizes()),
            params.sensor_spread,
            params.sensor_length,
            params.steering_increment,
        )
    }

    /// Rebuilds a car from a stored weight bundle.
    pub fn from_bundle(
        id: usize,
        params: &Params,
        bundle: WeightBundle,
    ) -> Result<Self, WeightsError> {
        bundle.validate()?;
        Ok(Self::new(
            id,
            params,
            Brain::from_weights(bundle.layers),
            bundle.sensor_spread,
            bundle.sensor_length,
            params.steering_increment,
        ))
    }

    /// Loads the bundle for the configured sensor count from `weights_dir`,
    /// falling back to random weights when there is no directory or the
    /// bundle cannot be used.
    pub fn load_or_random(
        rng: &mut impl Rng,
        id: usize,
        params: &Params,
        weights_dir: Option<&Path>,
    ) -> Self {
        let Some(dir) = weights_dir else {
            return Self::new_random(rng, id, params);
        };

        match WeightBundle::load(dir, params.num_sensors)
            .and_then(|bundle| Self::from_bundle(id, params, bundle))
        {
            Ok(car) => {
                debug!(id, dir = %dir.display(), "loaded weight bundle");
                car
            }
            Err(e) => {
                warn!(id, error = %e, "weight bundle unavailable, using random weights");
                Self::new_random(rng, id, params)
            }
        }
    }

    /// Snapshot of this car's weights and sensor geometry.
    pub fn to_bundle(&self) -> WeightBundle {
        WeightBundle::from_car(self)
    }

    /// Produces a mutated child.
    ///
    /// Weights are perturbed until the child passes the sanity check, at most
    /// `params.max_sanity_attempts` times. The steering increment and sensor
    /// geometry are then perturbed once and clamped to their ranges.
    pub fn mutated(
        &self,
        rng: &mut impl Rng,
        id: usize,
        params: &Params,
    ) -> Result<Self, SanityError> {
        for attempt in 1..=params.max_sanity_attempts {
            let mut brain = self.brain.clone();
            brain.mutate(rng, params.weight_mutation);
            if !brain.is_sane() {
                continue;
            }

            let steering_increment = perturb(
                rng,
                self.steering_increment,
                params.steering_mutation,
                params.steering_range,
            );
            let sensor_spread = perturb(
                rng,
                self.sensor_spread,
                params.spread_mutation,
                params.spread_range,
            );
            let sensor_length = perturb(
                rng,
                self.sensor_length,
                params.length_mutation,
                params.length_range,
            );
            debug!(parent = self.id, id, attempt, "mutation accepted");
            return Ok(Self::new(
                id,
                params,
                brain,
                sensor_spread,
                sensor_length,
                steering_increment,
            ));
        }
        Err(SanityError::Exhausted {
            attempts: params.max_sanity_attempts,
        })
    }

    /// Puts the car back at the start line, keeping brain and geometry.
    pub fn reset(&mut self, id: usize, params: &Params) {
        self.id = id;
        self.disc = Disc::new(params.car_x(), params.car_y(), params.car_radius);
        self.heading = 0.0;
        self.speed = params.car_speed;
        self.fitness = 0.0;
        self.alive = true;
        for sensor in &mut self.sensors {
            sensor.tripped = false;
        }
        self.update_sensors();
    }

    /// Horizontal velocity; the track scrolls by this much.
    pub fn vx(&self) -> f32 {
        self.speed * self.heading.cos()
    }

    /// Vertical velocity.
    pub fn vy(&self) -> f32 {
        self.speed * self.heading.sin()
    }

    /// Moves the car vertically along its heading and re-poses the sensors.
    pub fn advance(&mut self) {
        let vy = self.vy();
        self.disc_mut().pos[1] += vy;
        self.update_sensors();
    }

    /// Re-derives every sensor ray from the current pose.
    pub fn update_sensors(&mut self) {
        let (x, y, heading) = (self.disc.x(), self.disc.y(), self.heading);
        for sensor in &mut self.sensors {
            sensor.update(x, y, heading);
        }
    }

    /// Applies a steering action.
    pub fn steer(&mut self, steering: Steering) {
        match steering {
            Steering::Left => self.heading -= self.steering_increment,
            Steering::Right => self.heading += self.steering_increment,
            Steering::Center => {
                let step = self.heading.abs().min(self.steering_increment);
                self.heading -= step * self.heading.signum();
            }
        }
        self.update_sensors();
    }

    /// Mirrors the heading about the track direction.
    pub fn reflect(&mut self) {
        self.heading = -self.heading;
        self.update_sensors();
    }

    /// Radius within which an obstacle center may be reachable by a sensor,
    /// not counting the obstacle's own radius.
    pub fn sensor_reach(&self) -> f32 {
        self.disc.radius + self.sensor_length + PRUNE_FUDGE
    }

    /// Indices of obstacles close enough for a sensor to reach.
    pub fn possible_obstacles(
        &self,
        obstacles: &[Obstacle],
        index: &ObstacleIndex,
    ) -> Vec<usize> {
        let reach = self.sensor_reach();
        index
            .query(self.pos(), reach + index.max_radius())
            .into_iter()
            .map(|(_, i)| i)
            .filter(|&i| {
                let disc = &obstacles[i].disc;
                self.disc.center_distance(disc) <= reach + disc.radius
            })
            .collect()
    }

    /// Recasts every sensor against the obstacles.
    ///
    /// Sensors are tested in order, each cleared just before its test. A
    /// sensor whose tip lies outside `[0, track_height]` mirrors the heading
    /// and ends the pass; later sensors keep their previous reading.
    ///
    /// # Arguments
    ///
    /// * `obstacles` - All obstacles on the track
    /// * `track_height` - Vertical extent of the track
    /// * `index` - Optional pre-built index over `obstacles` (if None, builds internally)
    pub fn sense(
        &mut self,
        obstacles: &[Obstacle],
        track_height: f32,
        index: Option<&ObstacleIndex>,
    ) -> Perception {
        let nearby = match index {
            Some(index) => self.possible_obstacles(obstacles, index),
            None => self.possible_obstacles(obstacles, &ObstacleIndex::build(obstacles)),
        };

        for i in 0..self.sensors.len() {
            self.sensors[i].tripped = false;
            let tip_y = self.sensors[i].end[1];
            if tip_y < 0.0 || tip_y > track_height {
                self.reflect();
                return Perception::Reflected { sensor: i };
            }

            let sensor = &self.sensors[i];
            let hit = nearby.iter().any(|&j| sensor.detects(&obstacles[j]));
            self.sensors[i].tripped = hit;
        }

        Perception::Sensed
    }

    /// Tripped flags as network input: 1.0 for tripped, 0.0 otherwise.
    pub fn tripped_sensors(&self) -> Array1<f32> {
        self.sensors
            .iter()
            .map(|s| if s.tripped { 1.0 } else { 0.0 })
            .collect()
    }

    /// Runs the network on the current sensor readings.
    pub fn decide(&self) -> Steering {
        self.brain.decide(&self.tripped_sensors())
    }

    /// One full control step: move, sense, then steer on the current
    /// readings. A reflected pass still steers afterwards.
    pub fn drive(
        &mut self,
        obstacles: &[Obstacle],
        track_height: f32,
        index: Option<&ObstacleIndex>,
    ) -> Perception {
        self.advance();
        let perception = self.sense(obstacles, track_height, index);
        let steering = self.decide();
        self.steer(steering);
        perception
    }

    /// Returns `true` if the car touches the obstacle.
    pub fn collides_with(&self, obstacle: &Obstacle) -> bool {
        collides(self, obstacle)
    }

    /// Returns `true` if the car center has left the track vertically.
    pub fn out_of_bounds(&self, track_height: f32) -> bool {
        let y = self.disc.y();
        y < 0.0 || y > track_height
    }
}

impl Locatable for Car {
    fn disc(&self) -> &Disc {
        &self.disc
    }

    fn disc_mut(&mut self) -> &mut Disc {
        &mut self.disc
    }
}

/// Adds uniform noise in `[-magnitude, magnitude]` and clamps to `range`.
fn perturb(rng: &mut impl Rng, value: f32, magnitude: f32, range: (f32, f32)) -> f32 {
    let m = magnitude.abs();
    (value + rng.random_range(-m..=m)).clamp(range.0, range.1)
}
