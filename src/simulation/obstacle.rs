//! Disc-shaped obstacles that scroll toward the cars.

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::locatable::{Disc, Locatable};

/// Cosmetic color tag carried for whatever renders the track.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ObstacleColor {
    /// Default obstacle color.
    Blue,
    /// Highlighted, e.g. the obstacle that ended a run.
    Orange,
}

/// A static disc in world space.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Obstacle {
    /// Position and radius.
    pub disc: Disc,
    /// Color tag.
    pub color: ObstacleColor,
}

impl Obstacle {
    /// Creates an obstacle centered at `(x, y)`.
    pub fn new(x: f32, y: f32, radius: f32) -> Self {
        Self {
            disc: Disc::new(x, y, radius),
            color: ObstacleColor::Blue,
        }
    }

    /// Creates an obstacle at `x` with a random height in `[0, height]` and a
    /// random integer radius in `[min_radius, max_radius]`.
    pub fn new_random(
        rng: &mut impl Rng,
        x: f32,
        height: f32,
        min_radius: u32,
        max_radius: u32,
    ) -> Self {
        let y = rng.random_range(0..=height.max(0.0) as u32) as f32;
        let radius = rng.random_range(min_radius..=max_radius) as f32;
        Self::new(x, y, radius)
    }

    /// Drifts the obstacle left by the world's relative velocity.
    pub fn drift(&mut self, world_vx: f32) {
        self.disc_mut().pos[0] -= world_vx;
    }
}

impl Locatable for Obstacle {
    fn disc(&self) -> &Disc {
        &self.disc
    }

    fn disc_mut(&mut self) -> &mut Disc {
        &mut self.disc
    }
}
