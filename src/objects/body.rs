use serde::{Deserialize, Serialize};

use crate::collision::Aabb;
use crate::common::Material;
use crate::math::vec2::Vec2;
use crate::shapes::{Circle, Shape};

/// A dynamic circular body. The collision core reads its geometry and
/// writes back its position and velocity.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Body {
    pub position: Vec2,
    pub velocity: Vec2,
    pub radius: f64,
    pub mass: f64,
    pub material: Material,
}

impl Body {
    /// Creates a body at rest at the origin with the default material.
    pub fn new(mass: f64, radius: f64) -> Self {
        Self {
            position: Vec2::ZERO,
            velocity: Vec2::ZERO,
            radius,
            mass,
            material: Material::default(),
        }
    }

    pub fn with_position(mut self, position: Vec2) -> Self {
        self.position = position;
        self
    }

    pub fn with_velocity(mut self, velocity: Vec2) -> Self {
        self.velocity = velocity;
        self
    }

    pub fn with_material(mut self, material: Material) -> Self {
        self.material = material;
        self
    }

    pub fn inv_mass(&self) -> f64 {
        1.0 / self.mass
    }

    pub fn shape(&self) -> Shape {
        Shape::Circle(Circle { radius: self.radius })
    }

    /// World-space bounding box of the body.
    pub fn aabb(&self) -> Aabb<2> {
        Aabb::from_shape(self.position.to_array(), &self.shape())
    }

    pub fn kinetic_energy(&self) -> f64 {
        0.5 * self.mass * self.velocity.magnitude_squared()
    }

    /// Returns the reason this body breaks the caller contract, if any.
    pub(crate) fn validate(&self) -> Option<&'static str> {
        if !self.position.is_finite() {
            return Some("position must be finite");
        }
        if !self.velocity.is_finite() {
            return Some("velocity must be finite");
        }
        if !(self.mass > 0.0 && self.mass.is_finite()) {
            return Some("mass must be finite and positive");
        }
        self.shape().validate().or_else(|| self.material.validate())
    }
}
