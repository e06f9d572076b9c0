//! Single-car obstacle avoidance run.
//!
//! One car drives until it hits an obstacle or leaves the track. The score is
//! the distance the track scrolled.

use std::path::PathBuf;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::info;

use super::car::Car;
use super::commands::{self, Command, CommandOutcome, Controls};
use super::obstacle::ObstacleColor;
use super::params::Params;
use super::track::Track;
use super::weights::WeightsError;

/// State of a solo run after a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoloStatus {
    /// The car is still driving.
    Running,
    /// The tick was skipped.
    Paused,
    /// The car crashed or left the track.
    GameOver,
}

/// A single car on the track.
pub struct SoloRun {
    /// Simulation parameters.
    pub params: Params,
    /// Track and obstacles.
    pub track: Track,
    /// The car.
    pub car: Car,
    /// Accumulated scroll distance.
    pub score: f32,
    /// Set once the car is dead.
    pub game_over: bool,
    /// Pause flag and viewport.
    pub controls: Controls,
    weights_dir: Option<PathBuf>,
    rng: ChaCha8Rng,
}

impl SoloRun {
    /// Starts a run. The car loads its weights from `weights_dir` when a
    /// matching bundle exists.
    pub fn new(params: Params, seed: u64, weights_dir: Option<PathBuf>) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let car = Car::load_or_random(&mut rng, 0, &params, weights_dir.as_deref());
        let track = Track::new(&params);

        Self {
            params,
            track,
            car,
            score: 0.0,
            game_over: false,
            controls: Controls::default(),
            weights_dir,
            rng,
        }
    }

    /// Advances the run by one tick.
    ///
    /// The track scrolls by the car's horizontal velocity and obstacles that
    /// touch the car end the run; otherwise the car moves, senses and steers.
    pub fn step(&mut self) -> SoloStatus {
        if self.game_over {
            return SoloStatus::GameOver;
        }
        if self.controls.paused {
            return SoloStatus::Paused;
        }

        let world_vx = self.car.vx();
        self.score += world_vx;
        self.track.tick(&mut self.rng, &self.params, world_vx);

        if let Some(hit) = self
            .track
            .obstacles
            .iter_mut()
            .find(|o| self.car.collides_with(o))
        {
            hit.color = ObstacleColor::Orange;
            return self.finish("collision");
        }

        self.car.drive(&self.track.obstacles, self.track.height, None);
        if self.car.out_of_bounds(self.track.height) {
            return self.finish("left the track");
        }

        SoloStatus::Running
    }

    /// Steps until the run ends or `max_ticks` ticks have passed.
    ///
    /// Returns the number of ticks simulated.
    pub fn run(&mut self, max_ticks: u64) -> u64 {
        let mut ticks = 0;
        while ticks < max_ticks && self.step() == SoloStatus::Running {
            ticks += 1;
        }
        ticks
    }

    /// Applies a front-end command.
    pub fn apply_command(&mut self, command: Command) -> Result<CommandOutcome, WeightsError> {
        match command {
            Command::Steer(steering) if !self.game_over => {
                self.car.steer(steering);
                Ok(CommandOutcome::Applied)
            }
            Command::ExportAt { x, y } => {
                let (x, y) = self.controls.screen_to_world(x, y);
                commands::export_car_at(
                    std::slice::from_ref(&self.car),
                    x,
                    y,
                    self.weights_dir.as_deref(),
                )
            }
            other => Ok(self.controls.apply(other)),
        }
    }

    fn finish(&mut self, cause: &str) -> SoloStatus {
        self.game_over = true;
        self.car.alive = false;
        info!(cause, score = self.score, ticks = self.track.ticks, "game over");
        SoloStatus::GameOver
    }
}
