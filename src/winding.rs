/*!
Coil description: windings, their turns, and the lookups the winding-loss
engine uses to aggregate turn losses into layers, sections and windings.
*/

use crate::error::{MagneticsError, Result};

/// Which side of isolation a winding sits on.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum IsolationSide {
    Primary,
    Secondary,
    Tertiary,
    Quaternary,
    Other(String),
}

/// Wire construction, which selects the skin/proximity-effect field model.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Wire {
    /// Solid round wire of the given diameter, meters.
    Round { diameter: f64 },
    /// Solid rectangular wire, `(width, height)`, meters.
    Rectangular { width: f64, height: f64 },
    /// A single foil turn, `(width, thickness)`, meters.
    Foil { width: f64, thickness: f64 },
    /// Litz bundle of `strand_count` round strands of `strand_diameter`, meters.
    Litz {
        strand_count: usize,
        strand_diameter: f64,
    },
}

impl Wire {
    /// Conducting cross-sectional area, square meters.
    pub fn cross_section(&self) -> f64 {
        match self {
            Wire::Round { diameter } => std::f64::consts::PI * (diameter / 2.0).powi(2),
            Wire::Rectangular { width, height } => width * height,
            Wire::Foil { width, thickness } => width * thickness,
            Wire::Litz {
                strand_count,
                strand_diameter,
            } => *strand_count as f64 * std::f64::consts::PI * (strand_diameter / 2.0).powi(2),
        }
    }
}

/// A single physical turn within the coil, as tracked by the winding-loss engine.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Turn {
    /// Index of the winding this turn belongs to.
    pub winding_index: usize,
    /// Index of the layer this turn belongs to.
    pub layer_index: usize,
    /// Index of the section this turn belongs to.
    pub section_index: usize,
    /// Length of this turn, meters (the mean-length-per-turn for its radius).
    pub length: f64,
    /// Wire used for this turn.
    pub wire: Wire,
}

/// One electrical winding of the coil.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Winding {
    pub name: String,
    pub number_turns: usize,
    pub number_parallels: usize,
    pub wire: Wire,
    pub isolation_side: IsolationSide,
}

/// Physical layout and turns of the full coil.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Coil {
    pub windings: Vec<Winding>,
    pub turns: Vec<Turn>,
}

impl Coil {
    /// Turns ratio of every winding relative to the first (primary) winding.
    pub fn turns_ratios(&self) -> Result<Vec<f64>> {
        let primary_turns = self
            .windings
            .first()
            .ok_or_else(|| MagneticsError::missing_data("coil has no windings"))?
            .number_turns as f64;
        if primary_turns == 0.0 {
            return Err(MagneticsError::invalid_input(
                "primary winding has zero turns",
            ));
        }
        Ok(self
            .windings
            .iter()
            .map(|winding| primary_turns / winding.number_turns as f64)
            .collect())
    }

    /// Indices into [`Self::turns`] belonging to winding `winding_index`.
    pub fn turns_indexes_by_winding(&self, winding_index: usize) -> Vec<usize> {
        self.turns
            .iter()
            .enumerate()
            .filter(|(_, turn)| turn.winding_index == winding_index)
            .map(|(index, _)| index)
            .collect()
    }

    /// Indices into [`Self::turns`] belonging to `(winding_index, section_index)`.
    pub fn turns_indexes_by_section(&self, winding_index: usize, section_index: usize) -> Vec<usize> {
        self.turns
            .iter()
            .enumerate()
            .filter(|(_, turn)| {
                turn.winding_index == winding_index && turn.section_index == section_index
            })
            .map(|(index, _)| index)
            .collect()
    }

    /// Indices into [`Self::turns`] belonging to `(winding_index, section_index, layer_index)`.
    pub fn turns_indexes_by_layer(
        &self,
        winding_index: usize,
        section_index: usize,
        layer_index: usize,
    ) -> Vec<usize> {
        self.turns
            .iter()
            .enumerate()
            .filter(|(_, turn)| {
                turn.winding_index == winding_index
                    && turn.section_index == section_index
                    && turn.layer_index == layer_index
            })
            .map(|(index, _)| index)
            .collect()
    }

    /// Total physical turn count across all windings, used for quick-mode thresholding.
    pub fn total_physical_turns(&self) -> usize {
        self.turns.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_winding_coil() -> Coil {
        let primary = Winding {
            name: "primary".to_string(),
            number_turns: 10,
            number_parallels: 1,
            wire: Wire::Round { diameter: 0.5e-3 },
            isolation_side: IsolationSide::Primary,
        };
        let secondary = Winding {
            name: "secondary".to_string(),
            number_turns: 5,
            number_parallels: 1,
            wire: Wire::Round { diameter: 0.7e-3 },
            isolation_side: IsolationSide::Secondary,
        };
        let mut turns = Vec::new();
        for i in 0..10 {
            turns.push(Turn {
                winding_index: 0,
                layer_index: 0,
                section_index: 0,
                length: 0.03,
                wire: primary.wire,
            });
            let _ = i;
        }
        for i in 0..5 {
            turns.push(Turn {
                winding_index: 1,
                layer_index: 0,
                section_index: 0,
                length: 0.03,
                wire: secondary.wire,
            });
            let _ = i;
        }
        Coil {
            windings: vec![primary, secondary],
            turns,
        }
    }

    #[test]
    fn turns_ratios_relative_to_primary() {
        let coil = two_winding_coil();
        let ratios = coil.turns_ratios().unwrap();
        assert_eq!(ratios[0], 1.0);
        assert_eq!(ratios[1], 2.0);
    }

    #[test]
    fn turns_indexes_by_winding_partitions_correctly() {
        let coil = two_winding_coil();
        assert_eq!(coil.turns_indexes_by_winding(0).len(), 10);
        assert_eq!(coil.turns_indexes_by_winding(1).len(), 5);
    }

    #[test]
    fn wire_cross_section_for_round_wire() {
        let wire = Wire::Round { diameter: 2.0 };
        assert!((wire.cross_section() - std::f64::consts::PI).abs() < 1e-9);
    }
}
