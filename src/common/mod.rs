pub mod material;

pub use material::{CombineRule, Material};
