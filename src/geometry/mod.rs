//! Coordinate geometry shared by tiles and the streaming engine.
//!
//! - [`Axis`] describes a file's native dimension order and reflections
//! - [`CoordinateTransformer`] moves boxes and voxel buffers between a tile's
//!   local frame and the global frame
//! - [`Region`] is a box given by its start corner and size
//! - [`LineStarts`] enumerates the start of every line along dimension 0

mod axis;
mod transform;

pub use axis::Axis;
pub use transform::CoordinateTransformer;

/// A box in some coordinate frame, given by its start corner and size.
///
/// Sizes may be zero or negative after intersection, meaning the box is empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Region {
    pub start: Vec<i64>,
    pub size: Vec<i64>,
}

impl Region {
    pub fn new(start: Vec<i64>, size: Vec<i64>) -> Self {
        Self { start, size }
    }

    /// Region starting at the origin.
    pub fn from_size(size: &[usize]) -> Self {
        Self {
            start: vec![0; size.len()],
            size: size.iter().map(|&s| s as i64).collect(),
        }
    }

    pub fn num_dims(&self) -> usize {
        self.start.len()
    }

    /// Exclusive end corner.
    pub fn end(&self) -> Vec<i64> {
        self.start
            .iter()
            .zip(&self.size)
            .map(|(s, n)| s + n)
            .collect()
    }

    /// True if any dimension has no extent.
    pub fn is_empty(&self) -> bool {
        self.size.iter().any(|&n| n <= 0)
    }

    /// Intersection with another region in the same frame.
    pub fn intersect(&self, other: &Region) -> Region {
        let start: Vec<i64> = self
            .start
            .iter()
            .zip(&other.start)
            .map(|(&a, &b)| a.max(b))
            .collect();
        let size = self
            .end()
            .iter()
            .zip(other.end())
            .zip(&start)
            .map(|((&a, b), s)| a.min(b) - s)
            .collect();
        Region { start, size }
    }

    /// True if the voxel lies inside this region.
    pub fn contains(&self, voxel: &[i64]) -> bool {
        voxel
            .iter()
            .zip(self.start.iter().zip(&self.size))
            .all(|(&v, (&s, &n))| v >= s && v < s + n)
    }

    /// Sizes as unsigned extents; empty dimensions become zero.
    pub fn extent(&self) -> Vec<usize> {
        self.size.iter().map(|&n| n.max(0) as usize).collect()
    }
}

/// Iterator over the start coordinate of every line along dimension 0 of an
/// array of the given size.
///
/// Yields one coordinate per combination of the indices of dimensions
/// `1..N`, dimension 1 varying fastest. The dimension 0 entry is always 0.
/// An array with any zero-length dimension has no lines.
#[derive(Debug, Clone)]
pub struct LineStarts {
    size: Vec<usize>,
    next: Option<Vec<usize>>,
}

impl LineStarts {
    pub fn new(size: &[usize]) -> Self {
        let next = if size.is_empty() || size.contains(&0) {
            None
        } else {
            Some(vec![0; size.len()])
        };
        Self {
            size: size.to_vec(),
            next,
        }
    }
}

impl Iterator for LineStarts {
    type Item = Vec<usize>;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next.take()?;

        let mut following = current.clone();
        let mut dim = 1;
        loop {
            if dim >= self.size.len() {
                break;
            }
            following[dim] += 1;
            if following[dim] < self.size[dim] {
                self.next = Some(following);
                break;
            }
            following[dim] = 0;
            dim += 1;
        }

        Some(current)
    }
}
