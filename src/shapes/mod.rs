pub mod circle;
pub mod rectangle;

use serde::{Deserialize, Serialize};

pub use circle::Circle;
pub use rectangle::Rect;

/// Closed set of collider geometries.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Shape {
    Circle(Circle),
    Rect(Rect),
}

impl Shape {
    /// Half extents of the shape's bounding box in `D` dimensions.
    ///
    /// Circles extend by their radius on every axis; rectangles only span the
    /// first two axes and are flat beyond them.
    pub fn half_extents<const D: usize>(&self) -> [f64; D] {
        let mut half = [0.0; D];
        match self {
            Shape::Circle(circle) => half.fill(circle.radius),
            Shape::Rect(rect) => {
                let [hw, hh] = rect.half_extents();
                if D > 0 {
                    half[0] = hw;
                }
                if D > 1 {
                    half[1] = hh;
                }
            }
        }
        half
    }

    pub(crate) fn validate(&self) -> Option<&'static str> {
        match self {
            Shape::Circle(circle) => circle.validate(),
            Shape::Rect(rect) => rect.validate(),
        }
    }
}
