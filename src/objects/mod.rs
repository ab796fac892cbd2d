pub mod body;
pub mod obstacle;

pub use body::Body;
pub use obstacle::Obstacle;
