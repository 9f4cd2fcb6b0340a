//! Match configuration: board shape and live-piece capacity.

use super::types::Shape;
use derive_getters::Getters;
use serde::{Deserialize, Serialize};
use tracing::{instrument, warn};

/// Live pieces allowed on the compact board before eviction starts.
pub const COMPACT_CAPACITY: usize = 6;

/// Live pieces allowed in the volume before eviction starts.
pub const VOLUMETRIC_CAPACITY: usize = 18;

/// Immutable rules for one match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Getters, Serialize, Deserialize)]
pub struct Ruleset {
    /// Board geometry.
    #[getter(copy)]
    shape: Shape,
    /// Maximum simultaneous pieces across both players.
    #[getter(copy)]
    capacity: usize,
}

impl Ruleset {
    /// The 3x3 ruleset.
    pub fn compact() -> Self {
        Self {
            shape: Shape::Compact,
            capacity: COMPACT_CAPACITY,
        }
    }

    /// The 3x3x3 ruleset.
    pub fn volumetric() -> Self {
        Self {
            shape: Shape::Volumetric,
            capacity: VOLUMETRIC_CAPACITY,
        }
    }

    /// Default ruleset for a shape.
    pub fn for_shape(shape: Shape) -> Self {
        match shape {
            Shape::Compact => Self::compact(),
            Shape::Volumetric => Self::volumetric(),
        }
    }

    /// Overrides the capacity.
    ///
    /// Clamped to `1..cell_count` so at least one cell is always free.
    #[instrument]
    pub fn with_capacity(self, capacity: usize) -> Self {
        let max = self.shape.cell_count() - 1;
        let clamped = capacity.clamp(1, max);
        if clamped != capacity {
            warn!(requested = capacity, clamped, "Capacity out of range");
        }
        Self {
            capacity: clamped,
            ..self
        }
    }
}

impl Default for Ruleset {
    fn default() -> Self {
        Self::compact()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_per_shape() {
        assert_eq!(Ruleset::for_shape(Shape::Compact).capacity(), 6);
        assert_eq!(Ruleset::for_shape(Shape::Volumetric).capacity(), 18);
    }

    #[test]
    fn test_capacity_is_clamped() {
        assert_eq!(Ruleset::compact().with_capacity(0).capacity(), 1);
        assert_eq!(Ruleset::compact().with_capacity(9).capacity(), 8);
        assert_eq!(Ruleset::volumetric().with_capacity(20).capacity(), 20);
    }
}
