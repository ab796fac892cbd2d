//! Overlap-pair enumeration over an [`Lbvh`].

use crate::collision::lbvh::{Lbvh, NodeKind};
use crate::collision::{Aabb, ColliderKind, ColliderRef};
use crate::error::Result;

/// Collider slots `(i, j)` with `i < j` whose boxes overlap on every axis.
pub type OverlapPair = (usize, usize);

/// Walks the tree with an explicit stack of node pairs and returns every
/// pair of leaves whose boxes overlap, each exactly once.
///
/// The walk starts from the root's two children against each other and each
/// of them against itself. A self-pair of an internal node expands into its
/// children against each other and themselves; a cross pair expands the
/// internal side with the larger box (both children against the other node).
/// Every expansion strictly shrinks the pair, so the walk terminates, and each
/// leaf pair is reachable from exactly one path.
///
/// Pairs of two obstacles are dropped: obstacles never move and never collide
/// with each other.
pub fn enumerate_pairs<const D: usize>(bvh: &Lbvh<D>) -> Result<Vec<OverlapPair>> {
    let mut pairs = Vec::new();
    let Some(root) = bvh.root() else {
        return Ok(pairs);
    };
    let Some((left, right)) = bvh.node(root).children() else {
        return Ok(pairs);
    };

    // Skewed trees can hold up to O(N) pending pairs
    let mut stack: Vec<(usize, usize)> = Vec::new();
    stack.try_reserve(bvh.len())?;
    stack.push((left, left));
    stack.push((right, right));
    stack.push((left, right));

    while let Some((a, b)) = stack.pop() {
        let na = bvh.node(a);
        if a == b {
            if let (NodeKind::Internal { left, right }, true) = (na.kind, na.has_body) {
                stack.push((left, left));
                stack.push((right, right));
                stack.push((left, right));
            }
            continue;
        }

        let nb = bvh.node(b);
        if !(na.has_body || nb.has_body) || !na.aabb.overlaps(&nb.aabb) {
            continue;
        }

        match (na.kind, nb.kind) {
            (NodeKind::Leaf { collider: ca, kind: ka }, NodeKind::Leaf { collider: cb, kind: kb }) => {
                if ca == cb || !(ka.is_body() || kb.is_body()) {
                    continue;
                }
                pairs.push(if ca < cb { (ca, cb) } else { (cb, ca) });
            }
            (NodeKind::Internal { left, right }, NodeKind::Leaf { .. }) => {
                stack.push((left, b));
                stack.push((right, b));
            }
            (NodeKind::Leaf { .. }, NodeKind::Internal { left, right }) => {
                stack.push((a, left));
                stack.push((a, right));
            }
            (NodeKind::Internal { left: al, right: ar }, NodeKind::Internal { left: bl, right: br }) => {
                if na.aabb.margin() >= nb.aabb.margin() {
                    stack.push((al, b));
                    stack.push((ar, b));
                } else {
                    stack.push((a, bl));
                    stack.push((a, br));
                }
            }
        }
    }

    Ok(pairs)
}

/// O(n²) reference enumeration with the same filtering as [`enumerate_pairs`].
/// Pairs come out sorted.
pub fn brute_force_pairs<const D: usize>(aabbs: &[Aabb<D>], kinds: &[ColliderKind]) -> Vec<OverlapPair> {
    let mut pairs = Vec::new();
    for i in 0..aabbs.len() {
        for j in (i + 1)..aabbs.len() {
            if !(kinds[i].is_body() || kinds[j].is_body()) {
                continue;
            }
            if aabbs[i].overlaps(&aabbs[j]) {
                pairs.push((i, j));
            }
        }
    }
    pairs
}

/// Overlap pairs split by the type tags of their colliders.
///
/// Indices refer to the owning arrays: body pairs hold two body indices with
/// the smaller first, obstacle pairs hold `(body, obstacle)`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PairSet {
    pub body_body: Vec<(usize, usize)>,
    pub body_circle: Vec<(usize, usize)>,
    pub body_rect: Vec<(usize, usize)>,
}

impl PairSet {
    pub fn partition(pairs: &[OverlapPair], handles: &[ColliderRef]) -> Self {
        let mut set = PairSet::default();
        for &(a, b) in pairs {
            let (ha, hb) = (handles[a], handles[b]);
            match (ha.kind, hb.kind) {
                (ColliderKind::Body, ColliderKind::Body) => {
                    set.body_body.push((ha.index.min(hb.index), ha.index.max(hb.index)));
                }
                (ColliderKind::Body, ColliderKind::CircleObstacle) => set.body_circle.push((ha.index, hb.index)),
                (ColliderKind::CircleObstacle, ColliderKind::Body) => set.body_circle.push((hb.index, ha.index)),
                (ColliderKind::Body, ColliderKind::RectObstacle) => set.body_rect.push((ha.index, hb.index)),
                (ColliderKind::RectObstacle, ColliderKind::Body) => set.body_rect.push((hb.index, ha.index)),
                _ => {}
            }
        }
        set
    }

    pub fn len(&self) -> usize {
        self.body_body.len() + self.body_circle.len() + self.body_rect.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
