//! The scrolling track: bounds, obstacles and their spawn cadence.

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::obstacle::Obstacle;
use super::params::Params;
use super::spatial::ObstacleIndex;

/// Obstacles and the clock that spawns them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Track {
    /// Horizontal extent; obstacles spawn at this x.
    pub width: f32,
    /// Vertical extent.
    pub height: f32,
    /// Obstacles currently on the track, oldest first.
    pub obstacles: Vec<Obstacle>,
    /// Ticks since the last spawn.
    pub spawn_timer: u32,
    /// Total ticks elapsed.
    pub ticks: u64,
}

impl Track {
    /// Creates an empty track.
    pub fn new(params: &Params) -> Self {
        Self {
            width: params.track_width,
            height: params.track_height,
            obstacles: Vec::new(),
            spawn_timer: 0,
            ticks: 0,
        }
    }

    /// Removes every obstacle and restarts the spawn clock.
    pub fn clear(&mut self) {
        self.obstacles.clear();
        self.spawn_timer = 0;
    }

    /// Advances the track one tick.
    ///
    /// Every `obstacle_interval` ticks a new obstacle spawns at the right
    /// edge. All obstacles then drift left by `world_vx`, and those that
    /// reached the left edge are dropped.
    pub fn tick(&mut self, rng: &mut impl Rng, params: &Params, world_vx: f32) {
        self.ticks += 1;
        self.spawn_timer += 1;
        if self.spawn_timer >= params.obstacle_interval {
            self.spawn_timer = 0;
            self.obstacles.push(Obstacle::new_random(
                rng,
                self.width,
                self.height,
                params.obstacle_min_radius,
                params.obstacle_max_radius,
            ));
        }

        for obstacle in &mut self.obstacles {
            obstacle.drift(world_vx);
        }
        self.obstacles.retain(|o| o.disc.x() > 0.0);
    }

    /// Builds a spatial index over the current obstacles.
    pub fn index(&self) -> ObstacleIndex {
        ObstacleIndex::build(&self.obstacles)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn spawns_on_interval_and_culls_at_left_edge() {
        let params = Params::default();
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let mut track = Track::new(&params);

        for _ in 0..params.obstacle_interval - 1 {
            track.tick(&mut rng, &params, 3.0);
        }
        assert!(track.obstacles.is_empty());

        track.tick(&mut rng, &params, 3.0);
        assert_eq!(track.obstacles.len(), 1);
        let spawned = &track.obstacles[0];
        assert!((spawned.disc.x() - (params.track_width - 3.0)).abs() < 1e-4);
        assert!((5.0..=10.0).contains(&spawned.disc.radius));
        assert!((0.0..=params.track_height).contains(&spawned.disc.y()));

        // A fast enough scroll pushes everything off the track.
        track.tick(&mut rng, &params, params.track_width);
        assert!(track.obstacles.is_empty());
    }
}
