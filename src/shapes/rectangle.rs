use serde::{Deserialize, Serialize};

/// Axis-aligned rectangle, centered on its owner's position.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(width: f64, height: f64) -> Self {
        assert!(width >= 0.0 && height >= 0.0, "Rect dimensions cannot be negative");
        Self { width, height }
    }

    pub fn half_extents(&self) -> [f64; 2] {
        [self.width * 0.5, self.height * 0.5]
    }

    pub(crate) fn validate(&self) -> Option<&'static str> {
        let ok = |v: f64| v >= 0.0 && v.is_finite();
        if ok(self.width) && ok(self.height) {
            None
        } else {
            Some("width and height must be finite and non-negative")
        }
    }
}
