//! Storage axis order of a tile relative to the global volume.

use crate::error::GeometryError;

/// Permutation and per-axis reflection describing how a file's native
/// dimensions map onto the canonical global dimensions.
///
/// Local dimension `i` of the file runs along global dimension
/// `dim_order[i]`, in decreasing global direction when `dim_flip[i]` is set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Axis {
    dim_order: Vec<usize>,
    dim_flip: Vec<bool>,
    reverse_dim_order: Vec<usize>,
}

impl Axis {
    /// Create an axis from a permutation and flip flags.
    pub fn new(dim_order: Vec<usize>, dim_flip: Vec<bool>) -> Result<Self, GeometryError> {
        if dim_order.len() != dim_flip.len() {
            return Err(GeometryError::DimensionMismatch {
                expected: dim_order.len(),
                actual: dim_flip.len(),
            });
        }

        let n = dim_order.len();
        let mut reverse_dim_order = vec![usize::MAX; n];
        for (local, &global) in dim_order.iter().enumerate() {
            if global >= n || reverse_dim_order[global] != usize::MAX {
                return Err(GeometryError::InvalidPermutation(condense(&dim_order, &dim_flip)));
            }
            reverse_dim_order[global] = local;
        }

        Ok(Self {
            dim_order,
            dim_flip,
            reverse_dim_order,
        })
    }

    /// The identity axis: file dimensions match global dimensions.
    pub fn identity(num_dims: usize) -> Self {
        Self {
            dim_order: (0..num_dims).collect(),
            dim_flip: vec![false; num_dims],
            reverse_dim_order: (0..num_dims).collect(),
        }
    }

    /// Decode a condensed axis vector.
    ///
    /// Each entry is a global dimension numbered from 1, negated when the
    /// local dimension runs against the global direction.
    pub fn from_condensed(condensed: &[i32]) -> Result<Self, GeometryError> {
        if condensed.contains(&0) {
            return Err(GeometryError::ZeroAxis(condensed.to_vec()));
        }
        let dim_order = condensed
            .iter()
            .map(|d| d.unsigned_abs() as usize - 1)
            .collect();
        let dim_flip = condensed.iter().map(|&d| d < 0).collect();
        Self::new(dim_order, dim_flip)
            .map_err(|_| GeometryError::InvalidPermutation(condensed.to_vec()))
    }

    /// Encode as a condensed axis vector.
    pub fn to_condensed(&self) -> Vec<i32> {
        condense(&self.dim_order, &self.dim_flip)
    }

    pub fn num_dims(&self) -> usize {
        self.dim_order.len()
    }

    pub fn dim_order(&self) -> &[usize] {
        &self.dim_order
    }

    pub fn dim_flip(&self) -> &[bool] {
        &self.dim_flip
    }

    /// Inverse permutation: `reverse_dim_order[dim_order[i]] == i`.
    pub fn reverse_dim_order(&self) -> &[usize] {
        &self.reverse_dim_order
    }

    pub fn is_identity(&self) -> bool {
        self.dim_flip.iter().all(|f| !f) && self.dim_order.iter().enumerate().all(|(i, &d)| i == d)
    }

    /// Reorder a per-dimension vector from global to local order.
    pub fn to_local_order<T: Clone>(&self, global: &[T]) -> Vec<T> {
        self.dim_order.iter().map(|&d| global[d].clone()).collect()
    }

    /// Reorder a per-dimension vector from local to global order.
    pub fn to_global_order<T: Clone>(&self, local: &[T]) -> Vec<T> {
        self.reverse_dim_order
            .iter()
            .map(|&d| local[d].clone())
            .collect()
    }
}

fn condense(dim_order: &[usize], dim_flip: &[bool]) -> Vec<i32> {
    dim_order
        .iter()
        .zip(dim_flip)
        .map(|(&dim, &flip)| {
            let one_based = dim as i32 + 1;
            if flip {
                -one_based
            } else {
                one_based
            }
        })
        .collect()
}
