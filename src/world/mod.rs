pub mod collision_world;
pub mod config;
pub mod resolver;

pub use collision_world::{ColliderCounts, CollisionWorld, StepReport};
pub use config::SolverConfig;
pub use resolver::Resolver;
