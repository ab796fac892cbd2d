//! Broad- and narrow-phase collision core for 2D circular bodies against
//! static circle and rectangle obstacles.
//!
//! Each step rebuilds a linear BVH from Morton-ordered AABBs, enumerates the
//! overlapping leaf pairs, and resolves contacts with restitution, friction
//! and positional correction.

pub mod math;
pub mod common;
pub mod shapes;
pub mod objects;
pub mod collision;
pub mod world;
pub mod error;

// Re-export key types for easier use
pub use math::vec2::Vec2;
pub use common::{CombineRule, Material};
pub use shapes::{Circle, Rect, Shape};
pub use objects::{Body, Obstacle};
pub use collision::{Aabb, Lbvh, PairSet, Contact, ContactKind};
pub use world::{CollisionWorld, Resolver, SolverConfig, StepReport};
pub use error::{CollisionError, Result};
