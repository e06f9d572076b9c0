//! Commands issued by whatever front end drives a simulation.
//!
//! Key and pointer dispatch live outside this crate; a front end translates
//! its input events into [`Command`]s and hands them to the running driver.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::info;

use super::brain::Steering;
use super::car::Car;
use super::weights::WeightsError;

/// A user action.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Command {
    /// Steer the controlled car by hand.
    Steer(Steering),
    /// Pause or resume the tick loop.
    TogglePause,
    /// Scroll the viewport horizontally.
    Pan(f32),
    /// Export the weights of the live car under a point in screen space.
    ExportAt {
        /// Screen x.
        x: f32,
        /// Screen y.
        y: f32,
    },
}

/// What a command did.
#[derive(Debug, Clone, PartialEq)]
pub enum CommandOutcome {
    /// The command changed driver state.
    Applied,
    /// A weight bundle was written to this path.
    Exported(PathBuf),
    /// The command had no effect in the current driver or state.
    Ignored,
}

/// Pause flag and viewport offset shared by both drivers.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Controls {
    /// When set, ticks are skipped.
    pub paused: bool,
    /// Horizontal viewport offset in world units.
    pub viewport_offset: f32,
}

impl Controls {
    /// Converts a screen point to world coordinates.
    pub fn screen_to_world(&self, x: f32, y: f32) -> (f32, f32) {
        (x + self.viewport_offset, y)
    }

    /// Applies the commands that only touch the controls.
    pub fn apply(&mut self, command: Command) -> CommandOutcome {
        match command {
            Command::TogglePause => {
                self.paused = !self.paused;
                info!(paused = self.paused, "pause toggled");
                CommandOutcome::Applied
            }
            Command::Pan(dx) => {
                self.viewport_offset += dx;
                CommandOutcome::Applied
            }
            Command::Steer(_) | Command::ExportAt { .. } => CommandOutcome::Ignored,
        }
    }
}

/// Index of the first live car whose disc contains the world point.
pub fn car_at(cars: &[Car], x: f32, y: f32) -> Option<usize> {
    cars.iter().position(|car| car.alive && car.disc.contains(x, y))
}

/// Writes the bundle of the live car under `(x, y)` into `weights_dir`.
pub fn export_car_at(
    cars: &[Car],
    x: f32,
    y: f32,
    weights_dir: Option<&Path>,
) -> Result<CommandOutcome, WeightsError> {
    let (Some(dir), Some(i)) = (weights_dir, car_at(cars, x, y)) else {
        return Ok(CommandOutcome::Ignored);
    };

    let path = cars[i].to_bundle().save(dir)?;
    info!(car = cars[i].id, path = %path.display(), "exported weights");
    Ok(CommandOutcome::Exported(path))
}
