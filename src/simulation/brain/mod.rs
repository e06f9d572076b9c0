//! Feed-forward network that turns tripped sensors into a steering action.
//!
//! The network is a stack of sigmoid [`Mlp`] layers without biases. Cars use
//! two layers (sensors → hidden → three steering units); the action is the
//! argmax of the last layer.

use ndarray::{Array1, Array2};
use rand::Rng;
use serde::{Deserialize, Serialize};

pub mod mlp;

pub use mlp::{Mlp, sigmoid};

/// Discrete steering policy chosen by the network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Steering {
    /// Turn counter-clockwise by the steering increment.
    Left,
    /// Straighten out toward the track direction.
    Center,
    /// Turn clockwise by the steering increment.
    Right,
}

impl Steering {
    /// Number of output units a steering network needs.
    pub const COUNT: usize = 3;

    /// Maps an output unit index to an action.
    pub fn from_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(Self::Left),
            1 => Some(Self::Center),
            2 => Some(Self::Right),
            _ => None,
        }
    }

    /// Output unit index of this action.
    pub fn index(self) -> usize {
        match self {
            Self::Left => 0,
            Self::Center => 1,
            Self::Right => 2,
        }
    }
}

/// Index of the first maximal element. Empty input returns 0.
pub fn argmax(values: &Array1<f32>) -> usize {
    let mut best = 0;
    for (i, &v) in values.iter().enumerate() {
        if v > values[best] {
            best = i;
        }
    }
    best
}

/// A multi-layer perceptron neural network.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Brain {
    /// Ordered layers from input to output.
    pub layers: Vec<Mlp>,
}

impl Brain {
    /// Creates a new brain with weights uniform in `[-scale, scale)`.
    pub fn new(rng: &mut impl Rng, layer_sizes: &[usize], scale: f32) -> Self {
        let layers = layer_sizes
            .windows(2)
            .map(|pair| Mlp::new_random(rng, pair[0], pair[1], scale))
            .collect();

        Self { layers }
    }

    /// Builds a brain from raw weight matrices, input side first.
    pub fn from_weights(weights: Vec<Array2<f32>>) -> Self {
        Self {
            layers: weights.into_iter().map(Mlp::from_weights).collect(),
        }
    }

    /// A steering brain that prefers [`Steering::Center`] whenever no sensor
    /// is tripped.
    ///
    /// Every layer but the last is zero, so the final hidden layer always
    /// reads 0.5 per unit; the last layer then favors the center unit.
    pub fn known_good(layer_sizes: &[usize]) -> Self {
        let depth = layer_sizes.len().saturating_sub(1);
        let layers = layer_sizes
            .windows(2)
            .enumerate()
            .map(|(i, pair)| {
                let mut weights = Array2::zeros((pair[0], pair[1]));
                if i + 1 == depth {
                    weights.fill(-1.0);
                    if pair[1] > Steering::Center.index() {
                        weights.column_mut(Steering::Center.index()).fill(1.0);
                    }
                }
                Mlp::from_weights(weights)
            })
            .collect();

        Self { layers }
    }

    /// Number of inputs expected by the first layer.
    pub fn input_size(&self) -> usize {
        self.layers.first().map_or(0, Mlp::input_size)
    }

    /// Number of outputs produced by the last layer.
    pub fn output_size(&self) -> usize {
        self.layers.last().map_or(0, Mlp::output_size)
    }

    /// Layer sizes from input to output.
    pub fn layer_sizes(&self) -> Vec<usize> {
        let mut sizes = vec![self.input_size()];
        sizes.extend(self.layers.iter().map(Mlp::output_size));
        sizes
    }

    /// Runs a forward pass through all layers.
    #[inline]
    pub fn think(&self, inputs: &Array1<f32>) -> Array1<f32> {
        let mut output = inputs.clone();
        for layer in &self.layers {
            output = layer.forward(&output);
        }
        output
    }

    /// Picks the steering action with the strongest output.
    ///
    /// Ties resolve to the lowest index.
    pub fn decide(&self, inputs: &Array1<f32>) -> Steering {
        Steering::from_index(argmax(&self.think(inputs))).unwrap_or(Steering::Center)
    }

    /// With nothing in sight the car must not turn on its own.
    pub fn is_sane(&self) -> bool {
        self.output_size() == Steering::COUNT
            && self.decide(&Array1::zeros(self.input_size())) == Steering::Center
    }

    /// Mutates all layers in the brain.
    pub fn mutate(&mut self, rng: &mut impl Rng, mutation_scale: f32) {
        for layer in &mut self.layers {
            layer.mutate(rng, mutation_scale);
        }
    }

    /// Copies of the raw weight matrices, input side first.
    pub fn weights(&self) -> Vec<Array2<f32>> {
        self.layers.iter().map(|l| l.weights.clone()).collect()
    }
}
