//! Spatial indexing for obstacle pruning.
//!
//! Cars only test their sensors against obstacles a sensor could possibly
//! reach. The index answers those radius queries with a KD-tree.

use kdtree::KdTree;
use kdtree::distance::squared_euclidean;
use ndarray::Array1;
use tracing::warn;

use super::locatable::Locatable;
use super::obstacle::Obstacle;

/// Type alias for 2D spatial KD-tree used for efficient neighbor queries.
pub type Tree2D = KdTree<f32, usize, Vec<f32>>;

/// Result of a spatial radius query.
pub type SpatialQueryResult = Vec<(f32, usize)>;

/// KD-tree over obstacle centers.
pub struct ObstacleIndex {
    tree: Tree2D,
    /// Largest radius among indexed obstacles.
    max_radius: f32,
}

impl ObstacleIndex {
    /// Builds an index over the current obstacle list.
    ///
    /// Obstacles with a non-finite center cannot be indexed; they are skipped
    /// and will never trip a sensor.
    pub fn build(obstacles: &[Obstacle]) -> Self {
        let mut tree = KdTree::with_capacity(2, obstacles.len().max(1));
        let mut max_radius = 0.0_f32;
        for (i, obstacle) in obstacles.iter().enumerate() {
            match tree.add(obstacle.pos().to_vec(), i) {
                Ok(()) => max_radius = max_radius.max(obstacle.disc.radius),
                Err(e) => warn!(index = i, error = ?e, "skipping obstacle in spatial index"),
            }
        }
        Self { tree, max_radius }
    }

    /// Largest obstacle radius in the index.
    pub fn max_radius(&self) -> f32 {
        self.max_radius
    }

    /// Number of indexed obstacles.
    pub fn len(&self) -> usize {
        self.tree.size()
    }

    /// Returns `true` if no obstacle is indexed.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Query obstacle centers within a radius.
    ///
    /// # Arguments
    ///
    /// * `pos` - Center position for the query
    /// * `radius` - Search radius (will be squared internally)
    ///
    /// # Returns
    ///
    /// Vector of (`distance_squared`, index) pairs, sorted by index.
    pub fn query(&self, pos: &Array1<f32>, radius: f32) -> SpatialQueryResult {
        if self.is_empty() {
            return Vec::new();
        }
        let mut hits: SpatialQueryResult = self
            .tree
            .within(&pos.to_vec(), radius.powi(2), &squared_euclidean)
            .unwrap_or_default()
            .into_iter()
            .map(|(dist, &idx)| (dist, idx))
            .collect();
        hits.sort_unstable_by_key(|&(_, idx)| idx);
        hits
    }
}
