use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::brain::Steering;

/// Errors raised when loading or validating [`Params`].
#[derive(Debug, Error)]
pub enum ParamsError {
    /// The parameter file could not be read.
    #[error("failed to read params: {0}")]
    Io(#[from] std::io::Error),
    /// The parameter file is not valid JSON for [`Params`].
    #[error("failed to parse params: {0}")]
    Json(#[from] serde_json::Error),
    /// The parameters describe an impossible simulation.
    #[error("invalid params: {0}")]
    Invalid(&'static str),
}

/// Simulation parameters shared by the solo run and the evolution driver.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Params {
    /// Track width; obstacles spawn at this x.
    pub track_width: f32,
    /// Track height; cars die outside `[0, track_height]`.
    pub track_height: f32,
    /// Ticks between obstacle spawns.
    pub obstacle_interval: u32,
    /// Smallest obstacle radius (inclusive).
    pub obstacle_min_radius: u32,
    /// Largest obstacle radius (inclusive).
    pub obstacle_max_radius: u32,
    /// Car speed magnitude per tick.
    pub car_speed: f32,
    /// Car collision radius.
    pub car_radius: f32,
    /// Number of ray sensors per car.
    pub num_sensors: usize,
    /// Default angle covered by the sensor fan, in radians.
    pub sensor_spread: f32,
    /// Default sensor ray length.
    pub sensor_length: f32,
    /// Default heading change per steering action, in radians.
    pub steering_increment: f32,
    /// Hidden layer size.
    pub hidden_size: usize,
    /// Scale of the uniform distribution for fresh weights.
    pub weight_scale: f32,
    /// Cars per generation.
    pub num_cars: usize,
    /// Live population size at which the generation is reseeded.
    pub reproduction_threshold: usize,
    /// Mutated children produced per surviving car.
    pub offspring_per_survivor: usize,
    /// Magnitude of uniform weight noise on mutation.
    pub weight_mutation: f32,
    /// Magnitude of steering increment noise on mutation.
    pub steering_mutation: f32,
    /// Magnitude of sensor spread noise on mutation.
    pub spread_mutation: f32,
    /// Magnitude of sensor length noise on mutation.
    pub length_mutation: f32,
    /// Allowed steering increment range after mutation.
    pub steering_range: (f32, f32),
    /// Allowed sensor spread range after mutation.
    pub spread_range: (f32, f32),
    /// Allowed sensor length range after mutation.
    pub length_range: (f32, f32),
    /// Rejection-sampling budget before falling back to a known-good car.
    pub max_sanity_attempts: usize,
}

impl Default for Params {
    fn default() -> Self {
        Self {
            track_width: 800.0,
            track_height: 600.0,
            obstacle_interval: 8,
            obstacle_min_radius: 5,
            obstacle_max_radius: 10,
            car_speed: 3.0,
            car_radius: 10.0,
            num_sensors: 7,
            sensor_spread: std::f32::consts::FRAC_PI_2,
            sensor_length: 80.0,
            steering_increment: 0.2,
            hidden_size: 4,
            weight_scale: 1.0,
            num_cars: 30,
            reproduction_threshold: 3,
            offspring_per_survivor: 5,
            weight_mutation: 0.1,
            steering_mutation: 0.02,
            spread_mutation: 0.1,
            length_mutation: 5.0,
            steering_range: (0.05, 0.5),
            spread_range: (0.2, std::f32::consts::PI),
            length_range: (20.0, 200.0),
            max_sanity_attempts: 1000,
        }
    }
}

impl Params {
    /// Network layer sizes: sensors → hidden → steering units.
    pub fn layer_sizes(&self) -> [usize; 3] {
        [self.num_sensors, self.hidden_size, Steering::COUNT]
    }

    /// Where cars sit horizontally. The track scrolls past this column.
    pub fn car_x(&self) -> f32 {
        self.track_width / 4.0
    }

    /// Vertical start position of every car.
    pub fn car_y(&self) -> f32 {
        self.track_height / 2.0
    }

    /// Rejects parameter sets the simulation cannot run with.
    pub fn validate(&self) -> Result<(), ParamsError> {
        if self.num_sensors < 2 {
            return Err(ParamsError::Invalid("num_sensors must be at least 2"));
        }
        if self.hidden_size == 0 {
            return Err(ParamsError::Invalid("hidden_size must be positive"));
        }
        if self.track_width <= 0.0 || self.track_height <= 0.0 {
            return Err(ParamsError::Invalid("track dimensions must be positive"));
        }
        if self.obstacle_interval == 0 {
            return Err(ParamsError::Invalid("obstacle_interval must be positive"));
        }
        if self.obstacle_min_radius > self.obstacle_max_radius {
            return Err(ParamsError::Invalid(
                "obstacle_min_radius exceeds obstacle_max_radius",
            ));
        }
        if self.num_cars == 0 {
            return Err(ParamsError::Invalid("num_cars must be positive"));
        }
        if self.reproduction_threshold >= self.num_cars {
            return Err(ParamsError::Invalid(
                "reproduction_threshold must be below num_cars",
            ));
        }
        if self.max_sanity_attempts == 0 {
            return Err(ParamsError::Invalid("max_sanity_attempts must be positive"));
        }
        if !(self.weight_scale > 0.0 && self.weight_scale.is_finite()) {
            return Err(ParamsError::Invalid("weight_scale must be positive and finite"));
        }
        for (lo, hi) in [self.steering_range, self.spread_range, self.length_range] {
            if !(lo.is_finite() && hi.is_finite()) {
                return Err(ParamsError::Invalid("mutation range bounds must be finite"));
            }
            if lo > hi {
                return Err(ParamsError::Invalid("mutation range is inverted"));
            }
        }
        Ok(())
    }

    /// Loads parameters from a JSON file. Missing fields take their defaults.
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self, ParamsError> {
        let json = std::fs::read_to_string(path)?;
        let params: Self = serde_json::from_str(&json)?;
        params.validate()?;
        Ok(params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(Params::default().validate().is_ok());
        assert_eq!(Params::default().layer_sizes(), [7, 4, 3]);
    }

    #[test]
    fn threshold_must_leave_room_to_die() {
        let params = Params {
            num_cars: 3,
            reproduction_threshold: 3,
            ..Params::default()
        };
        assert!(matches!(params.validate(), Err(ParamsError::Invalid(_))));
    }

    #[test]
    fn weight_scale_must_be_positive() {
        for weight_scale in [0.0, -1.0, f32::NAN, f32::INFINITY] {
            let params = Params {
                weight_scale,
                ..Params::default()
            };
            assert!(matches!(params.validate(), Err(ParamsError::Invalid(_))));
        }
    }

    #[test]
    fn mutation_ranges_must_be_finite() {
        let params = Params {
            spread_range: (f32::NAN, 1.0),
            ..Params::default()
        };
        assert!(matches!(params.validate(), Err(ParamsError::Invalid(_))));

        let params = Params {
            length_range: (20.0, f32::NAN),
            ..Params::default()
        };
        assert!(matches!(params.validate(), Err(ParamsError::Invalid(_))));
    }

    #[test]
    fn zero_weight_scale_file_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("params.json");
        std::fs::write(&path, r#"{ "weight_scale": 0.0 }"#).unwrap();
        assert!(matches!(
            Params::load_from_file(&path),
            Err(ParamsError::Invalid(_))
        ));
    }

    #[test]
    fn partial_json_falls_back_to_defaults() {
        let params: Params = serde_json::from_str(r#"{ "num_cars": 12 }"#).unwrap();
        assert_eq!(params.num_cars, 12);
        assert_eq!(params.num_sensors, 7);
    }
}
