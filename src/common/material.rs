//! Defines physical material properties.

use serde::{Deserialize, Serialize};

/// Represents the physical properties of a collider affecting collisions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Material {
    /// Coefficient of restitution (bounciness). Range [0, 1].
    /// 0 = perfectly inelastic (no bounce), 1 = perfectly elastic.
    pub restitution: f64,
    /// Coulomb friction coefficient. Range [0, 1].
    pub friction: f64,
}

impl Material {
    /// Creates a new material, clamping both coefficients to [0, 1].
    pub fn new(restitution: f64, friction: f64) -> Self {
        Material {
            restitution: restitution.clamp(0.0, 1.0),
            friction: friction.clamp(0.0, 1.0),
        }
    }

    /// Frictionless material with the given restitution.
    pub fn frictionless(restitution: f64) -> Self {
        Self::new(restitution, 0.0)
    }

    /// Returns the reason this material is unusable, if any.
    pub(crate) fn validate(&self) -> Option<&'static str> {
        if !(0.0..=1.0).contains(&self.restitution) {
            return Some("restitution must be within [0, 1]");
        }
        if !(0.0..=1.0).contains(&self.friction) {
            return Some("friction must be within [0, 1]");
        }
        None
    }
}

impl Default for Material {
    /// Default material properties (moderate restitution, moderate friction).
    fn default() -> Self {
        Material {
            restitution: 0.2,
            friction: 0.5,
        }
    }
}

/// How two coefficients are merged into one for a contact.
///
/// `Average` is the documented behavior; the other rules exist for
/// per-scene tuning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CombineRule {
    #[default]
    Average,
    Min,
    Max,
    GeometricMean,
}

impl CombineRule {
    pub fn combine(self, a: f64, b: f64) -> f64 {
        match self {
            CombineRule::Average => (a + b) * 0.5,
            CombineRule::Min => a.min(b),
            CombineRule::Max => a.max(b),
            CombineRule::GeometricMean => (a * b).sqrt(),
        }
    }
}
