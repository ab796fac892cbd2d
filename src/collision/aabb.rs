// Defines an Axis-Aligned Bounding Box of any dimension.

use crate::shapes::Shape;

/// Half-width added to an axis with zero extent.
pub const DEGENERATE_EPSILON: f64 = 1e-9;

/// An Axis-Aligned Bounding Box defined by its minimum and maximum corner points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb<const D: usize> {
    pub min: [f64; D],
    pub max: [f64; D],
}

impl<const D: usize> Aabb<D> {
    /// Creates a new AABB, swapping coordinates so that `min <= max` per axis.
    pub fn new(min: [f64; D], max: [f64; D]) -> Self {
        let mut aabb = Aabb { min, max };
        for i in 0..D {
            aabb.min[i] = min[i].min(max[i]);
            aabb.max[i] = min[i].max(max[i]);
        }
        aabb
    }

    /// Inverted box that any `merge` replaces.
    pub fn empty() -> Self {
        Aabb {
            min: [f64::INFINITY; D],
            max: [f64::NEG_INFINITY; D],
        }
    }

    /// Box of `center ± half`. Axes with zero extent are widened by
    /// [`DEGENERATE_EPSILON`] so every box has a positive extent.
    pub fn from_center_half(center: [f64; D], half: [f64; D]) -> Self {
        let mut min = [0.0; D];
        let mut max = [0.0; D];
        for i in 0..D {
            let h = if half[i] > 0.0 { half[i] } else { DEGENERATE_EPSILON };
            min[i] = center[i] - h;
            max[i] = center[i] + h;
        }
        Aabb { min, max }
    }

    /// Bounding box of `shape` placed at `center`.
    pub fn from_shape(center: [f64; D], shape: &Shape) -> Self {
        Self::from_center_half(center, shape.half_extents::<D>())
    }

    /// Checks if this AABB overlaps with another AABB on every axis.
    /// Touching boxes count as overlapping.
    #[inline]
    pub fn overlaps(&self, other: &Aabb<D>) -> bool {
        (0..D).all(|i| self.min[i] <= other.max[i] && self.max[i] >= other.min[i])
    }

    /// Merges another AABB into this one, expanding this AABB to contain both.
    pub fn merge(&mut self, other: &Aabb<D>) {
        for i in 0..D {
            self.min[i] = self.min[i].min(other.min[i]);
            self.max[i] = self.max[i].max(other.max[i]);
        }
    }

    /// Smallest box containing both inputs.
    pub fn union(&self, other: &Aabb<D>) -> Self {
        let mut merged = *self;
        merged.merge(other);
        merged
    }

    pub fn center(&self) -> [f64; D] {
        let mut c = [0.0; D];
        for (i, v) in c.iter_mut().enumerate() {
            *v = 0.5 * (self.min[i] + self.max[i]);
        }
        c
    }

    /// Sum of the extents over all axes. Unlike the volume this stays
    /// meaningful for boxes that are flat along some axis.
    pub fn margin(&self) -> f64 {
        (0..D).map(|i| (self.max[i] - self.min[i]).max(0.0)).sum()
    }

    pub fn is_finite(&self) -> bool {
        self.min.iter().chain(self.max.iter()).all(|v| v.is_finite())
    }
}
