//! Multi-layer perceptron layer.

use ndarray::{Array1, Array2};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Standard logistic function.
#[inline]
pub fn sigmoid(x: f32) -> f32 {
    1.0 / (1.0 + (-x).exp())
}

/// A single fully connected layer of a multi-layer perceptron.
///
/// There is no bias term; a zero input always maps to `sigmoid(0) = 0.5` on
/// every unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mlp {
    /// Weight matrix (`input_size` × `output_size`).
    pub weights: Array2<f32>,
}

impl Mlp {
    /// Wraps an existing weight matrix.
    pub fn from_weights(weights: Array2<f32>) -> Self {
        Self { weights }
    }

    /// Creates a new layer with weights drawn uniformly from `[-scale, scale)`.
    pub fn new_random(
        rng: &mut impl Rng,
        input_size: usize,
        output_size: usize,
        scale: f32,
    ) -> Self {
        Self {
            weights: Array2::from_shape_fn((input_size, output_size), |_| {
                rng.random_range(-scale..scale)
            }),
        }
    }

    /// Number of inputs the layer expects.
    pub fn input_size(&self) -> usize {
        self.weights.nrows()
    }

    /// Number of outputs the layer produces.
    pub fn output_size(&self) -> usize {
        self.weights.ncols()
    }

    /// Performs forward pass with sigmoid activation: `sigmoid(inputs · W)`.
    #[inline]
    pub fn forward(&self, inputs: &Array1<f32>) -> Array1<f32> {
        let mut output = inputs.dot(&self.weights);
        output.mapv_inplace(sigmoid);
        output
    }

    /// Mutates weights by adding uniform noise in `[-mutation_scale, mutation_scale]`.
    pub fn mutate(&mut self, rng: &mut impl Rng, mutation_scale: f32) {
        let m = mutation_scale.abs();
        self.weights.mapv_inplace(|w| w + rng.random_range(-m..=m));
    }
}
