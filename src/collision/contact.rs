use serde::{Deserialize, Serialize};

use crate::math::vec2::Vec2;

/// Raw overlap between two shapes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Penetration {
    /// Unit contact normal.
    pub normal: Vec2,
    /// Overlap along the normal, never negative.
    pub depth: f64,
}

/// One of the four walls of the world box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BoundarySide {
    Left,
    Right,
    Bottom,
    Top,
}

impl BoundarySide {
    pub const ALL: [BoundarySide; 4] = [
        BoundarySide::Left,
        BoundarySide::Right,
        BoundarySide::Bottom,
        BoundarySide::Top,
    ];

    /// Normal pointing from the wall into the world.
    pub fn inward_normal(self) -> Vec2 {
        match self {
            BoundarySide::Left => Vec2::new(1.0, 0.0),
            BoundarySide::Right => Vec2::new(-1.0, 0.0),
            BoundarySide::Bottom => Vec2::new(0.0, 1.0),
            BoundarySide::Top => Vec2::new(0.0, -1.0),
        }
    }
}

/// What a body touched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContactKind {
    Boundary(BoundarySide),
    Body { other: usize },
    CircleObstacle { obstacle: usize },
    RectObstacle { obstacle: usize },
}

/// A contact found during one step. Contacts do not persist across steps.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Contact {
    /// Index of the body the contact belongs to.
    pub body: usize,
    pub kind: ContactKind,
    /// For body pairs, points from `body` toward `other`. Otherwise points
    /// away from the wall or obstacle, toward the body.
    pub normal: Vec2,
    pub depth: f64,
    /// False when the shapes overlap but were already separating, so no
    /// impulse or correction was applied.
    pub resolved: bool,
}
