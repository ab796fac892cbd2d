use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Circle {
    pub radius: f64,
}

impl Circle {
    pub fn new(radius: f64) -> Self {
        assert!(radius >= 0.0, "Circle radius cannot be negative");
        Self { radius }
    }

    pub(crate) fn validate(&self) -> Option<&'static str> {
        if self.radius >= 0.0 && self.radius.is_finite() {
            None
        } else {
            Some("radius must be finite and non-negative")
        }
    }
}
