//! On-disk weight bundles.
//!
//! A bundle stores a car's network weights together with its sensor geometry.
//! Bundles are keyed by sensor count: a directory holds at most one bundle per
//! count, named `weights_<count>.json`.

use std::path::{Path, PathBuf};

use ndarray::Array2;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::brain::Steering;
use super::car::Car;

/// Errors raised while reading or writing a weight bundle.
#[derive(Debug, Error)]
pub enum WeightsError {
    /// The bundle file could not be read or written.
    #[error("weight bundle i/o failed: {0}")]
    Io(#[from] std::io::Error),
    /// The bundle file is not valid JSON.
    #[error("weight bundle is malformed: {0}")]
    Json(#[from] serde_json::Error),
    /// The bundle was written for a different number of sensors.
    #[error("weight bundle is for {found} sensors, expected {expected}")]
    SensorCountMismatch {
        /// Sensor count the caller asked for.
        expected: usize,
        /// Sensor count recorded in the bundle.
        found: usize,
    },
    /// The matrices do not chain from the sensors to the steering outputs.
    #[error("weight matrix {layer} has an incompatible shape")]
    Shape {
        /// Index of the first offending matrix.
        layer: usize,
    },
}

/// Network weights plus the sensor geometry they were trained with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightBundle {
    /// Number of sensors; the first matrix has this many rows.
    pub sensor_count: usize,
    /// Angle covered by the sensor fan, in radians.
    pub sensor_spread: f32,
    /// Sensor ray length.
    pub sensor_length: f32,
    /// Weight matrices, input side first.
    pub layers: Vec<Array2<f32>>,
}

impl WeightBundle {
    /// Captures a car's weights and sensor geometry.
    pub fn from_car(car: &Car) -> Self {
        Self {
            sensor_count: car.sensors.len(),
            sensor_spread: car.sensor_spread,
            sensor_length: car.sensor_length,
            layers: car.brain.weights(),
        }
    }

    /// File name of the bundle for `sensor_count` sensors.
    pub fn file_name(sensor_count: usize) -> String {
        format!("weights_{sensor_count}.json")
    }

    /// Full path of the bundle for `sensor_count` sensors inside `dir`.
    pub fn path_in(dir: &Path, sensor_count: usize) -> PathBuf {
        dir.join(Self::file_name(sensor_count))
    }

    /// Checks that the matrices chain from `sensor_count` inputs to the
    /// steering outputs.
    pub fn validate(&self) -> Result<(), WeightsError> {
        let mut expected_rows = self.sensor_count;
        for (layer, weights) in self.layers.iter().enumerate() {
            if weights.nrows() != expected_rows || weights.ncols() == 0 {
                return Err(WeightsError::Shape { layer });
            }
            expected_rows = weights.ncols();
        }
        if self.layers.is_empty() || expected_rows != Steering::COUNT {
            return Err(WeightsError::Shape {
                layer: self.layers.len().saturating_sub(1),
            });
        }
        Ok(())
    }

    /// Writes the bundle into `dir`, creating the directory if needed.
    ///
    /// Returns the path written.
    pub fn save(&self, dir: &Path) -> Result<PathBuf, WeightsError> {
        self.validate()?;
        std::fs::create_dir_all(dir)?;
        let path = Self::path_in(dir, self.sensor_count);
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(&path, json)?;
        Ok(path)
    }

    /// Reads the bundle for `sensor_count` sensors from `dir`.
    pub fn load(dir: &Path, sensor_count: usize) -> Result<Self, WeightsError> {
        let json = std::fs::read_to_string(Self::path_in(dir, sensor_count))?;
        let bundle: Self = serde_json::from_str(&json)?;
        if bundle.sensor_count != sensor_count {
            return Err(WeightsError::SensorCountMismatch {
                expected: sensor_count,
                found: bundle.sensor_count,
            });
        }
        bundle.validate()?;
        Ok(bundle)
    }
}
