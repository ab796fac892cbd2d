pub mod aabb;
pub mod collider;
pub mod contact;
pub mod detection;
pub mod lbvh;
pub mod morton;
pub mod pairs;

// Re-export key types
pub use aabb::Aabb;
pub use collider::{ColliderKind, ColliderRef, ColliderSet};
pub use contact::{BoundarySide, Contact, ContactKind, Penetration};
pub use lbvh::{Lbvh, LbvhStats, Node, NodeKind};
pub use pairs::{brute_force_pairs, enumerate_pairs, OverlapPair, PairSet};
