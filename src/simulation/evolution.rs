//! Survival of the fittest: many cars on one track, reseeded by mutation.
//!
//! Every tick all live cars drive; cars that crash or leave the track are
//! removed. Once the population has shrunk to the reproduction threshold the
//! survivors are ranked by fitness, carried into the next generation together
//! with their mutated children, and the rest of the generation is filled with
//! fresh random cars. Every car entering a generation passes the sanity check
//! of [`Brain::is_sane`](super::brain::Brain::is_sane).

use std::path::PathBuf;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::car::Car;
use super::commands::{self, Command, CommandOutcome, Controls};
use super::params::Params;
use super::selection::top_k_by;
use super::track::Track;
use super::weights::{WeightBundle, WeightsError};

/// Where the current generation is in its life cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GenerationState {
    /// More cars alive than the reproduction threshold.
    Alive,
    /// The population reached the threshold and is about to be reseeded.
    BelowThreshold,
    /// A new generation was seeded during the last tick.
    Reseeded,
}

/// Why a car was removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeathCause {
    /// Touched an obstacle.
    Collision,
    /// Left the track vertically.
    OutOfBounds,
}

/// Record of a removed car.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CarDeath {
    /// Car identifier.
    pub id: usize,
    /// Fitness at the time of death.
    pub fitness: f32,
    /// Track tick of the death.
    pub tick: u64,
    /// What killed it.
    pub cause: DeathCause,
}

/// Summary of a finished generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationSummary {
    /// Generation number.
    pub generation: u32,
    /// Ticks the generation lasted.
    pub ticks: u64,
    /// Best fitness among cars of the generation, dead or alive. `None` when
    /// the generation had no cars at all.
    pub best_fitness: Option<f32>,
    /// Cars that survived to reproduce.
    pub survivors: usize,
    /// Cars replaced by the known-good fallback.
    pub fallbacks: usize,
}

/// Population driver.
pub struct Evolution {
    /// Simulation parameters.
    pub params: Params,
    /// Track and obstacles.
    pub track: Track,
    /// Live cars.
    pub cars: Vec<Car>,
    /// Current generation, starting at 1.
    pub generation: u32,
    /// Life cycle state after the last tick.
    pub state: GenerationState,
    /// Cars removed during the current generation.
    pub graveyard: Vec<CarDeath>,
    /// One entry per finished generation.
    pub history: Vec<GenerationSummary>,
    /// Pause flag and viewport.
    pub controls: Controls,
    generation_start: u64,
    fallbacks: usize,
    next_id: usize,
    weights_dir: Option<PathBuf>,
    rng: ChaCha8Rng,
}

impl Evolution {
    /// Seeds the first generation.
    ///
    /// The first car loads a stored bundle from `weights_dir` when one exists
    /// and passes the sanity check; all other cars are random.
    pub fn new(params: Params, seed: u64, weights_dir: Option<PathBuf>) -> Self {
        let mut evolution = Self {
            track: Track::new(&params),
            cars: Vec::with_capacity(params.num_cars),
            generation: 1,
            state: GenerationState::Alive,
            graveyard: Vec::new(),
            history: Vec::new(),
            controls: Controls::default(),
            generation_start: 0,
            fallbacks: 0,
            next_id: 0,
            weights_dir,
            rng: ChaCha8Rng::seed_from_u64(seed),
            params,
        };

        if let Some(dir) = evolution.weights_dir.clone() {
            let id = evolution.next_id();
            match WeightBundle::load(&dir, evolution.params.num_sensors)
                .and_then(|bundle| Car::from_bundle(id, &evolution.params, bundle))
            {
                Ok(car) if car.brain.is_sane() => {
                    debug!(id, dir = %dir.display(), "loaded weight bundle");
                    evolution.cars.push(car);
                }
                Ok(_) => warn!(id, "stored weights fail the sanity check, discarding"),
                Err(e) => warn!(id, error = %e, "weight bundle unavailable, seeding randomly"),
            }
        }
        while evolution.cars.len() < evolution.params.num_cars {
            let car = evolution.spawn_sane();
            evolution.cars.push(car);
        }

        info!(cars = evolution.cars.len(), "first generation seeded");
        evolution
    }

    /// Horizontal velocity of the fastest live car; the track scrolls by it.
    pub fn world_vx(&self) -> f32 {
        self.cars.iter().map(Car::vx).reduce(f32::max).unwrap_or(0.0)
    }

    /// Advances the simulation by one tick.
    pub fn step(&mut self) -> GenerationState {
        if self.controls.paused {
            return self.state;
        }
        self.state = GenerationState::Alive;

        let world_vx = self.world_vx();
        self.track.tick(&mut self.rng, &self.params, world_vx);

        let index = self.track.index();
        let height = self.track.height;
        let tick = self.track.ticks;
        for car in &mut self.cars {
            car.drive(&self.track.obstacles, height, Some(&index));
            car.fitness += car.vx();

            let cause = if car.out_of_bounds(height) {
                Some(DeathCause::OutOfBounds)
            } else if index
                .query(&car.disc.pos, car.disc.radius + index.max_radius())
                .iter()
                .any(|&(_, i)| car.collides_with(&self.track.obstacles[i]))
            {
                Some(DeathCause::Collision)
            } else {
                None
            };

            if let Some(cause) = cause {
                car.alive = false;
                self.graveyard.push(CarDeath {
                    id: car.id,
                    fitness: car.fitness,
                    tick,
                    cause,
                });
            }
        }

        let before = self.cars.len();
        self.cars.retain(|car| car.alive);
        if self.cars.len() < before {
            debug!(
                removed = before - self.cars.len(),
                alive = self.cars.len(),
                "cars removed"
            );
        }

        if self.cars.len() <= self.params.reproduction_threshold {
            self.state = GenerationState::BelowThreshold;
            self.reseed();
            self.state = GenerationState::Reseeded;
        }
        self.state
    }

    /// Steps until `generations` more generations have been seeded or
    /// `max_ticks` ticks have passed. Returns the number of ticks simulated.
    pub fn run(&mut self, generations: u32, max_ticks: u64) -> u64 {
        let target = self.generation + generations;
        let mut ticks = 0;
        while self.generation < target && ticks < max_ticks {
            self.step();
            ticks += 1;
        }
        ticks
    }

    /// Replaces the population with the next generation.
    ///
    /// The best `reproduction_threshold` live cars survive; each contributes
    /// `offspring_per_survivor` mutated children, and fresh random cars fill
    /// the generation up to exactly `num_cars`.
    pub fn reseed(&mut self) {
        let n = self.params.num_cars;
        let live = std::mem::take(&mut self.cars);
        let survivors = top_k_by(live, self.params.reproduction_threshold, |car| car.fitness);

        let best_fitness = survivors
            .iter()
            .map(|car| car.fitness)
            .chain(self.graveyard.iter().map(|death| death.fitness))
            .reduce(f32::max);
        self.history.push(GenerationSummary {
            generation: self.generation,
            ticks: self.track.ticks - self.generation_start,
            best_fitness,
            survivors: survivors.len(),
            fallbacks: self.fallbacks,
        });
        info!(
            generation = self.generation,
            best_fitness = ?best_fitness,
            survivors = survivors.len(),
            "generation finished"
        );

        let mut next = Vec::with_capacity(n);
        for survivor in &survivors {
            if next.len() == n {
                break;
            }
            if !survivor.brain.is_sane() {
                continue;
            }
            let mut car = survivor.clone();
            car.reset(self.next_id(), &self.params);
            next.push(car);
        }

        'parents: for parent in &survivors {
            for _ in 0..self.params.offspring_per_survivor {
                if next.len() >= n {
                    break 'parents;
                }
                let child = self.mutate_or_fallback(parent);
                next.push(child);
            }
        }

        while next.len() < n {
            let car = self.spawn_sane();
            next.push(car);
        }

        self.cars = next;
        self.graveyard.clear();
        self.track.clear();
        self.generation += 1;
        self.generation_start = self.track.ticks;
        self.fallbacks = 0;
    }

    /// Applies a front-end command.
    ///
    /// Steering is manual only in the solo run and is ignored here.
    pub fn apply_command(&mut self, command: Command) -> Result<CommandOutcome, WeightsError> {
        match command {
            Command::ExportAt { x, y } => {
                let (x, y) = self.controls.screen_to_world(x, y);
                commands::export_car_at(&self.cars, x, y, self.weights_dir.as_deref())
            }
            other => Ok(self.controls.apply(other)),
        }
    }

    /// Live car with the highest fitness.
    pub fn best_car(&self) -> Option<&Car> {
        self.cars
            .iter()
            .max_by(|a, b| a.fitness.total_cmp(&b.fitness))
    }

    fn next_id(&mut self) -> usize {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn spawn_sane(&mut self) -> Car {
        let id = self.next_id();
        Car::new_sane(&mut self.rng, id, &self.params).unwrap_or_else(|e| {
            warn!(id, error = %e, "falling back to known-good car");
            self.fallbacks += 1;
            Car::known_good(id, &self.params)
        })
    }

    fn mutate_or_fallback(&mut self, parent: &Car) -> Car {
        let id = self.next_id();
        parent
            .mutated(&mut self.rng, id, &self.params)
            .unwrap_or_else(|e| {
                warn!(parent = parent.id, id, error = %e, "falling back to known-good car");
                self.fallbacks += 1;
                Car::known_good(id, &self.params)
            })
    }
}
