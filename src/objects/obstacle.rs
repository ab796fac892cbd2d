use serde::{Deserialize, Serialize};

use crate::collision::{Aabb, ColliderKind};
use crate::common::Material;
use crate::math::vec2::Vec2;
use crate::shapes::{Circle, Rect, Shape};

/// A static collider. Obstacles never move and absorb no impulse.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Obstacle {
    pub position: Vec2,
    pub shape: Shape,
    pub material: Material,
}

impl Obstacle {
    pub fn circle(position: Vec2, radius: f64) -> Self {
        Self {
            position,
            shape: Shape::Circle(Circle::new(radius)),
            material: Material::default(),
        }
    }

    pub fn rect(position: Vec2, width: f64, height: f64) -> Self {
        Self {
            position,
            shape: Shape::Rect(Rect::new(width, height)),
            material: Material::default(),
        }
    }

    pub fn with_material(mut self, material: Material) -> Self {
        self.material = material;
        self
    }

    pub fn kind(&self) -> ColliderKind {
        match self.shape {
            Shape::Circle(_) => ColliderKind::CircleObstacle,
            Shape::Rect(_) => ColliderKind::RectObstacle,
        }
    }

    pub fn aabb(&self) -> Aabb<2> {
        Aabb::from_shape(self.position.to_array(), &self.shape)
    }

    pub(crate) fn validate(&self) -> Option<&'static str> {
        if !self.position.is_finite() {
            return Some("position must be finite");
        }
        self.shape.validate().or_else(|| self.material.validate())
    }
}
