//! Pairing of a core and a coil into the component being designed.

use crate::core_geometry::Core;
use crate::winding::Coil;

/// A magnetic component: a core paired with a coil, carrying a stable,
/// human-readable reference name.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Magnetic {
    /// Human-readable reference name, e.g. "T1".
    pub reference: String,
    /// The core.
    pub core: Core,
    /// The coil wound on the core.
    pub coil: Coil,
}

impl Magnetic {
    /// Build a new, unprocessed magnetic component.
    pub fn new(reference: impl Into<String>, core: Core, coil: Coil) -> Self {
        Magnetic {
            reference: reference.into(),
            core,
            coil,
        }
    }
}
