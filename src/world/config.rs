//! Tunables for contact resolution.

use serde::{Deserialize, Serialize};

use crate::common::CombineRule;

/// Settings consumed by the [`Resolver`](crate::world::Resolver).
///
/// Missing fields take their default when deserialized, so a scene file
/// only needs to name what it changes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    /// Apply tangential friction impulses after the normal impulse.
    pub friction_enabled: bool,
    /// Fraction of the penetration removed per step.
    pub correction_percent: f64,
    /// Penetration tolerated without positional correction.
    pub correction_slop: f64,
    /// How two bodies' restitution coefficients combine.
    pub restitution_rule: CombineRule,
    /// How the friction coefficients of a body and what it touches combine.
    pub friction_rule: CombineRule,
    /// Spread per-collider and per-pair work over the rayon pool.
    /// Results are identical either way.
    pub parallel: bool,
}

impl SolverConfig {
    const POSITIONAL_CORRECTION_PERCENT: f64 = 1.0;
    const POSITIONAL_CORRECTION_SLOP: f64 = 0.0;

    pub(crate) fn validate(&self) -> Option<&'static str> {
        if !(0.0..=1.0).contains(&self.correction_percent) {
            return Some("correction_percent must be within [0, 1]");
        }
        if !(self.correction_slop >= 0.0 && self.correction_slop.is_finite()) {
            return Some("correction_slop must be finite and non-negative");
        }
        None
    }
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            friction_enabled: true,
            correction_percent: Self::POSITIONAL_CORRECTION_PERCENT,
            correction_slop: Self::POSITIONAL_CORRECTION_SLOP,
            restitution_rule: CombineRule::Average,
            friction_rule: CombineRule::Average,
            parallel: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SolverConfig::default();
        assert!(config.friction_enabled);
        assert!(config.parallel);
        assert_eq!(config.correction_percent, 1.0);
        assert_eq!(config.correction_slop, 0.0);
        assert_eq!(config.restitution_rule, CombineRule::Average);
    }

    #[test]
    fn test_validate_correction_settings() {
        assert!(SolverConfig::default().validate().is_none());
        let edge = SolverConfig { correction_percent: 0.0, correction_slop: 0.01, ..SolverConfig::default() };
        assert!(edge.validate().is_none());

        for percent in [f64::NAN, -0.1, 1.5, f64::INFINITY] {
            let config = SolverConfig { correction_percent: percent, ..SolverConfig::default() };
            assert!(config.validate().is_some());
        }
        for slop in [f64::NAN, -0.01, f64::INFINITY] {
            let config = SolverConfig { correction_slop: slop, ..SolverConfig::default() };
            assert!(config.validate().is_some());
        }
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: SolverConfig =
            serde_json::from_str(r#"{ "friction_enabled": false, "friction_rule": "geometric_mean" }"#).unwrap();
        assert!(!config.friction_enabled);
        assert_eq!(config.friction_rule, CombineRule::GeometricMean);
        assert_eq!(config.restitution_rule, CombineRule::Average);
        assert_eq!(config.correction_percent, 1.0);
        assert!(config.parallel);
    }
}
