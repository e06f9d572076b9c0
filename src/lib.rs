//! # Swerve - Obstacle Avoidance with Evolved Steering Networks
//!
//! Cars on a scrolling track steer around obstacles using ray sensors and a
//! small feed-forward network. A population of cars can be evolved by
//! mutating the networks of the cars that survive longest.
//!
//! ## Features
//!
//! - Ray sensors with a cheap approximate ray/disc test
//! - Two-layer sigmoid networks with argmax steering
//! - Solo runs and a population driver that reseeds by mutation
//! - Seeded, reproducible randomness
//! - Weight bundles saved to and loaded from disk
//!
//! ## Core Modules
//!
//! - [`simulation::car`] - Cars, sensing and steering
//! - [`simulation::brain`] - Neural network implementation
//! - [`simulation::evolution`] - Population driver
//! - [`simulation::solo`] - Single-car run
//! - [`simulation::weights`] - Weight bundle persistence

/// Core simulation logic and data structures.
pub mod simulation {
    /// Steering networks.
    pub mod brain;
    /// Cars: pose, sensors, brain and control step.
    pub mod car;
    /// Front-end commands (steer, pause, pan, export).
    pub mod commands;
    /// Population driver with mutation-based reseeding.
    pub mod evolution;
    /// Geometric utility functions for distance calculations.
    pub mod geometric_utils;
    /// Positioned discs shared by cars and obstacles.
    ///
    /// The [`locatable::Locatable`] trait is implemented by every entity that
    /// occupies a disc on the track (Car, Obstacle).
    pub mod locatable;
    /// Obstacles drifting along the track.
    pub mod obstacle;
    /// Simulation parameters.
    pub mod params;
    /// Top-k selection and permutation helpers.
    pub mod selection;
    /// Ray sensors.
    pub mod sensor;
    /// Single-car obstacle avoidance run.
    pub mod solo;
    /// KD-tree index over obstacles.
    pub mod spatial;
    /// The scrolling track.
    pub mod track;
    /// On-disk weight bundles.
    pub mod weights;
}
