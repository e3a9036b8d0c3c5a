//! Edge types for neighborhood views.
//!
//! Only three directions exist. Direct neighbors of the center are tagged
//! by which side of the relationship they sit on; anything further out is
//! `Indirect` and does not describe a real edge.

use chainguard_core::EntityId;
use serde::{Deserialize, Serialize};

/// How a neighbor relates to the center of a view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeDirection {
    /// The center has an edge to this neighbor.
    Outgoing,

    /// This neighbor has an edge to the center.
    Incoming,

    /// Reached in two or more hops. The emitted edge is synthetic and
    /// always drawn from the center.
    Indirect,
}

impl std::fmt::Display for EdgeDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Outgoing => "outgoing",
            Self::Incoming => "incoming",
            Self::Indirect => "indirect",
        };
        write!(f, "{}", s)
    }
}

/// An edge in a neighborhood view, in real-id space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassifiedEdge {
    pub source: EntityId,
    pub target: EntityId,
    pub direction: EdgeDirection,
}

impl ClassifiedEdge {
    pub fn outgoing(center: EntityId, neighbor: EntityId) -> Self {
        Self {
            source: center,
            target: neighbor,
            direction: EdgeDirection::Outgoing,
        }
    }

    pub fn incoming(center: EntityId, neighbor: EntityId) -> Self {
        Self {
            source: neighbor,
            target: center,
            direction: EdgeDirection::Incoming,
        }
    }

    pub fn indirect(center: EntityId, neighbor: EntityId) -> Self {
        Self {
            source: center,
            target: neighbor,
            direction: EdgeDirection::Indirect,
        }
    }
}
