//! Linear Bounding Volume Hierarchy built from Morton-sorted leaves.
//!
//! The tree lives in a flat arena of `2N - 1` nodes: leaves occupy
//! `0..N` in Morton order and internal node `k` lives at `N + k`. Internal
//! nodes are linked with the longest-common-prefix method (Karras 2012),
//! which needs only index arithmetic over the sorted keys, so every internal
//! node can be linked independently. Bounds are then refit children-first.
//!
//! The tree is rebuilt from scratch each step; nothing survives across steps.

use rayon::prelude::*;

use crate::collision::morton::encode_centers;
use crate::collision::{Aabb, ColliderKind};
use crate::error::Result;

/// What a node holds besides its bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    /// Collider slot (index into the build input) and its type tag.
    Leaf { collider: usize, kind: ColliderKind },
    Internal { left: usize, right: usize },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Node<const D: usize> {
    /// Union of every descendant leaf box.
    pub aabb: Aabb<D>,
    /// `None` only for the root.
    pub parent: Option<usize>,
    pub kind: NodeKind,
    /// Whether any leaf below is a body. Obstacle-only subtrees never
    /// produce pairs among themselves.
    pub has_body: bool,
}

impl<const D: usize> Node<D> {
    pub fn is_leaf(&self) -> bool {
        matches!(self.kind, NodeKind::Leaf { .. })
    }

    pub fn children(&self) -> Option<(usize, usize)> {
        match self.kind {
            NodeKind::Internal { left, right } => Some((left, right)),
            NodeKind::Leaf { .. } => None,
        }
    }
}

/// Flat, index-linked bounding volume hierarchy.
#[derive(Debug, Clone)]
pub struct Lbvh<const D: usize> {
    nodes: Vec<Node<D>>,
    leaf_count: usize,
    root: Option<usize>,
}

/// Shape statistics of a built tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LbvhStats {
    pub node_count: usize,
    pub leaf_count: usize,
    pub internal_count: usize,
    /// Edges on the longest root-to-leaf path.
    pub max_depth: usize,
}

/// Length of the common prefix of sorted keys `i` and `j`, or -1 when `j`
/// is out of range. Equal keys fall back to the prefix of their indices, so
/// the (key, index) pairs form a strict total order.
#[inline]
fn delta(keys: &[u64], i: usize, j: isize) -> i32 {
    if j < 0 || j as usize >= keys.len() {
        return -1;
    }
    let j = j as usize;
    let (a, b) = (keys[i], keys[j]);
    if a == b {
        64 + ((i ^ j) as u64).leading_zeros() as i32
    } else {
        (a ^ b).leading_zeros() as i32
    }
}

/// Children of internal node `i` as arena indices.
///
/// Finds the sorted-key range `[first, last]` covered by the node and the
/// split position `gamma` inside it; each side is a leaf when it covers a
/// single key, otherwise the internal node at the split.
fn link_internal(keys: &[u64], i: usize) -> (usize, usize) {
    let n = keys.len();
    let ii = i as isize;

    // Direction of the range
    let d: isize = if delta(keys, i, ii + 1) > delta(keys, i, ii - 1) { 1 } else { -1 };

    // Upper bound for the range length, then binary search for the other end
    let delta_min = delta(keys, i, ii - d);
    let mut l_max: isize = 2;
    while delta(keys, i, ii + l_max * d) > delta_min {
        l_max *= 2;
    }
    let mut l: isize = 0;
    let mut t = l_max / 2;
    while t >= 1 {
        if delta(keys, i, ii + (l + t) * d) > delta_min {
            l += t;
        }
        t /= 2;
    }
    let j = ii + l * d;

    // Split position: last index sharing more than the node's prefix with i
    let delta_node = delta(keys, i, j);
    let mut s: isize = 0;
    let mut divisor: isize = 2;
    loop {
        let t = (l + divisor - 1) / divisor;
        if delta(keys, i, ii + (s + t) * d) > delta_node {
            s += t;
        }
        if t <= 1 {
            break;
        }
        divisor *= 2;
    }
    let gamma = (ii + s * d + d.min(0)) as usize;

    let first = ii.min(j) as usize;
    let last = ii.max(j) as usize;
    let left = if first == gamma { gamma } else { n + gamma };
    let right = if last == gamma + 1 { gamma + 1 } else { n + gamma + 1 };
    (left, right)
}

impl<const D: usize> Lbvh<D> {
    /// Tree with no nodes; pair enumeration over it yields nothing.
    pub fn empty() -> Self {
        Self { nodes: Vec::new(), leaf_count: 0, root: None }
    }

    /// Builds the hierarchy over `aabbs`, tagging leaf `k` with `kinds[k]`.
    ///
    /// `bounds` is the world box used to normalize Morton keys; centers
    /// outside it are clamped. Identical inputs produce identical trees.
    pub fn build(aabbs: &[Aabb<D>], kinds: &[ColliderKind], bounds: &Aabb<D>, parallel: bool) -> Result<Self> {
        debug_assert_eq!(aabbs.len(), kinds.len(), "one type tag per AABB");
        let n = aabbs.len();
        if n == 0 {
            return Ok(Self::empty());
        }

        // 1. Keys, and a permutation sorting them with ties broken by index
        let keys = encode_centers(aabbs, bounds, parallel);
        let mut order: Vec<usize> = Vec::new();
        order.try_reserve_exact(n)?;
        order.extend(0..n);
        if parallel {
            order.par_sort_unstable_by_key(|&c| (keys[c], c));
        } else {
            order.sort_unstable_by_key(|&c| (keys[c], c));
        }
        let sorted_keys: Vec<u64> = order.iter().map(|&c| keys[c]).collect();

        // 2. Leaves in sorted order
        let mut nodes = Vec::new();
        nodes.try_reserve_exact(2 * n - 1)?;
        nodes.extend(order.iter().map(|&c| Node {
            aabb: aabbs[c],
            parent: None,
            kind: NodeKind::Leaf { collider: c, kind: kinds[c] },
            has_body: kinds[c].is_body(),
        }));

        if n == 1 {
            return Ok(Self { nodes, leaf_count: 1, root: Some(0) });
        }

        // 3. Internal nodes, each linked on its own
        let links: Vec<(usize, usize)> = if parallel {
            (0..n - 1).into_par_iter().map(|i| link_internal(&sorted_keys, i)).collect()
        } else {
            (0..n - 1).map(|i| link_internal(&sorted_keys, i)).collect()
        };
        for &(left, right) in &links {
            nodes.push(Node {
                aabb: Aabb::empty(),
                parent: None,
                kind: NodeKind::Internal { left, right },
                has_body: false,
            });
        }
        for (i, &(left, right)) in links.iter().enumerate() {
            nodes[left].parent = Some(n + i);
            nodes[right].parent = Some(n + i);
        }

        // Internal node 0 always covers the whole key range
        let root = n;
        debug_assert!(nodes[root].parent.is_none());

        let mut bvh = Self { nodes, leaf_count: n, root: Some(root) };
        bvh.refit()?;
        Ok(bvh)
    }

    /// Recomputes internal bounds as the union of their children, visiting
    /// children before parents (reverse pre-order from the root).
    fn refit(&mut self) -> Result<()> {
        let Some(root) = self.root else {
            return Ok(());
        };
        let mut preorder = Vec::new();
        preorder.try_reserve_exact(self.nodes.len())?;
        let mut stack = vec![root];
        while let Some(node) = stack.pop() {
            preorder.push(node);
            if let Some((left, right)) = self.nodes[node].children() {
                stack.push(left);
                stack.push(right);
            }
        }
        for &node in preorder.iter().rev() {
            if let Some((left, right)) = self.nodes[node].children() {
                let (l, r) = (&self.nodes[left], &self.nodes[right]);
                let aabb = l.aabb.union(&r.aabb);
                let has_body = l.has_body || r.has_body;
                let n = &mut self.nodes[node];
                n.aabb = aabb;
                n.has_body = has_body;
            }
        }
        Ok(())
    }

    pub fn nodes(&self) -> &[Node<D>] {
        &self.nodes
    }

    pub fn node(&self, index: usize) -> &Node<D> {
        &self.nodes[index]
    }

    pub fn root(&self) -> Option<usize> {
        self.root
    }

    pub fn leaf_count(&self) -> usize {
        self.leaf_count
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Collider slots in Morton order (leaf `k` holds `sorted_colliders()[k]`).
    pub fn sorted_colliders(&self) -> impl Iterator<Item = usize> + '_ {
        self.nodes[..self.leaf_count].iter().filter_map(|node| match node.kind {
            NodeKind::Leaf { collider, .. } => Some(collider),
            NodeKind::Internal { .. } => None,
        })
    }

    pub fn stats(&self) -> LbvhStats {
        let mut max_depth = 0;
        if let Some(root) = self.root {
            let mut stack = vec![(root, 0usize)];
            while let Some((node, depth)) = stack.pop() {
                max_depth = max_depth.max(depth);
                if let Some((left, right)) = self.nodes[node].children() {
                    stack.push((left, depth + 1));
                    stack.push((right, depth + 1));
                }
            }
        }
        LbvhStats {
            node_count: self.nodes.len(),
            leaf_count: self.leaf_count,
            internal_count: self.nodes.len() - self.leaf_count,
            max_depth,
        }
    }
}
