//! Collider handles and the per-step AABB builder.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::collision::Aabb;
use crate::error::Result;
use crate::objects::{Body, Obstacle};

/// Type tag of a collider taking part in the broad phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ColliderKind {
    Body,
    CircleObstacle,
    RectObstacle,
}

impl ColliderKind {
    pub fn is_body(self) -> bool {
        matches!(self, ColliderKind::Body)
    }
}

/// Identifies a collider: its type tag plus its index in the owning array
/// (bodies for `Body`, obstacles otherwise).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ColliderRef {
    pub kind: ColliderKind,
    pub index: usize,
}

/// Bounding boxes and handles of every collider for one step.
///
/// Slot `k` of `aabbs` belongs to `handles[k]`. Bodies occupy the first
/// slots in body order, obstacles follow in obstacle order.
#[derive(Debug, Clone, Default)]
pub struct ColliderSet {
    pub aabbs: Vec<Aabb<2>>,
    pub handles: Vec<ColliderRef>,
}

impl ColliderSet {
    /// AABB builder: one box per body and per obstacle from their current
    /// position and shape.
    pub fn build(bodies: &[Body], obstacles: &[Obstacle], parallel: bool) -> Result<Self> {
        let total = bodies.len() + obstacles.len();
        let mut aabbs = Vec::new();
        aabbs.try_reserve_exact(total)?;
        let mut handles = Vec::new();
        handles.try_reserve_exact(total)?;

        if parallel {
            aabbs.par_extend(bodies.par_iter().map(Body::aabb));
            aabbs.par_extend(obstacles.par_iter().map(Obstacle::aabb));
        } else {
            aabbs.extend(bodies.iter().map(Body::aabb));
            aabbs.extend(obstacles.iter().map(Obstacle::aabb));
        }

        handles.extend((0..bodies.len()).map(|index| ColliderRef { kind: ColliderKind::Body, index }));
        handles.extend(
            obstacles
                .iter()
                .enumerate()
                .map(|(index, obstacle)| ColliderRef { kind: obstacle.kind(), index }),
        );

        Ok(Self { aabbs, handles })
    }

    pub fn len(&self) -> usize {
        self.aabbs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.aabbs.is_empty()
    }
}
