//! Positioned discs and the trait for entities built around one.
//!
//! Cars and obstacles both embed a [`Disc`]; collision checks are free
//! functions over anything [`Locatable`].

use ndarray::Array1;
use serde::{Deserialize, Serialize};

use super::geometric_utils::distance;

/// A circle with a center position in world space.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Disc {
    /// Center position `[x, y]`.
    pub pos: Array1<f32>,
    /// Radius.
    pub radius: f32,
}

impl Disc {
    /// Creates a disc centered at `(x, y)`.
    pub fn new(x: f32, y: f32, radius: f32) -> Self {
        Self {
            pos: Array1::from_vec(vec![x, y]),
            radius,
        }
    }

    /// Horizontal coordinate of the center.
    #[inline]
    pub fn x(&self) -> f32 {
        self.pos[0]
    }

    /// Vertical coordinate of the center.
    #[inline]
    pub fn y(&self) -> f32 {
        self.pos[1]
    }

    /// Distance between the two centers.
    pub fn center_distance(&self, other: &Disc) -> f32 {
        distance(self.x() - other.x(), self.y() - other.y())
    }

    /// Returns `true` if `(x, y)` lies inside or on the disc.
    pub fn contains(&self, x: f32, y: f32) -> bool {
        distance(self.x() - x, self.y() - y) <= self.radius
    }
}

/// Trait for entities that occupy a disc in the world.
pub trait Locatable {
    /// Returns the entity's disc.
    fn disc(&self) -> &Disc;

    /// Returns the entity's disc mutably.
    fn disc_mut(&mut self) -> &mut Disc;

    /// Returns a reference to the entity's position.
    fn pos(&self) -> &Array1<f32> {
        &self.disc().pos
    }
}

/// Returns `true` if the two discs touch or overlap.
pub fn collides(a: &impl Locatable, b: &impl Locatable) -> bool {
    let (a, b) = (a.disc(), b.disc());
    a.center_distance(b) <= a.radius + b.radius
}
