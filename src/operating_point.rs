/*!
Operating points: per-winding excitations (current, voltage, magnetizing
current, flux density) plus the ambient conditions they were taken under.
*/

use crate::error::{MagneticsError, Result};
use crate::waveform::Signal;

/// Ambient operating conditions for a single [`OperatingPoint`].
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Conditions {
    /// Ambient temperature, Celsius.
    pub ambient_temperature: f64,
    /// Cooling coefficient (e.g. forced-air velocity, m/s), if any.
    pub cooling: Option<f64>,
}

/// Excitation of a single winding at a given operating point.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct OperatingPointExcitation {
    /// Switching/fundamental frequency, hertz.
    pub frequency: f64,
    /// Winding current.
    pub current: Option<Signal>,
    /// Winding voltage.
    pub voltage: Option<Signal>,
    /// Magnetizing current (may be derived rather than measured).
    pub magnetizing_current: Option<Signal>,
    /// Magnetic flux density seen by the core due to this winding.
    pub magnetic_flux_density: Option<Signal>,
}

/// One full operating point: an excitation per winding plus ambient conditions.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct OperatingPoint {
    /// Excitation of each winding, in winding order.
    pub excitations_per_winding: Vec<OperatingPointExcitation>,
    /// Ambient conditions this point was taken (or is to be evaluated) under.
    pub conditions: Conditions,
    /// Optional human-readable name, e.g. "full load".
    pub name: Option<String>,
}

impl OperatingPoint {
    /// Excitation of the winding at `winding_index`.
    pub fn excitation(&self, winding_index: usize) -> Result<&OperatingPointExcitation> {
        self.excitations_per_winding
            .get(winding_index)
            .ok_or_else(|| {
                MagneticsError::missing_data(format!(
                    "operating point has no excitation for winding {winding_index}"
                ))
            })
    }
}

/// Isolation side requirement and target turns ratios between windings.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DesignRequirements {
    /// Target turns ratio of each winding relative to the primary.
    pub turns_ratios: Vec<f64>,
    /// Target magnetizing inductance range `(minimum, nominal, maximum)`, henries.
    pub magnetizing_inductance: (f64, f64, f64),
    /// Isolation side of each winding, parallel to `turns_ratios`.
    pub isolation_sides: Vec<crate::winding::IsolationSide>,
    /// Converter topology this magnetic serves, if declared.
    pub topology: Option<String>,
    /// Maximum outer dimensions `(width, height, depth)`, meters.
    pub maximum_dimensions: Option<(f64, f64, f64)>,
    /// Minimum impedance at the fundamental, ohms.
    pub minimum_impedance: Option<f64>,
}

/// Top-level inputs to the magnetics design/analysis stack.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Inputs {
    /// Electrical and mechanical design requirements.
    pub design_requirements: DesignRequirements,
    /// Operating points to evaluate the component at.
    pub operating_points: Vec<OperatingPoint>,
}

impl Inputs {
    /// The first operating point, which callers use as the nominal design point.
    pub fn nominal_operating_point(&self) -> Result<&OperatingPoint> {
        self.operating_points
            .first()
            .ok_or_else(|| MagneticsError::missing_data("inputs carry no operating points"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn excitation_errors_for_out_of_range_winding() {
        let point = OperatingPoint {
            excitations_per_winding: vec![OperatingPointExcitation::default()],
            conditions: Conditions {
                ambient_temperature: 25.0,
                cooling: None,
            },
            name: None,
        };
        assert!(point.excitation(0).is_ok());
        let error = point.excitation(1).unwrap_err();
        assert_eq!(error.code(), "MISSING_DATA");
    }

    #[test]
    fn nominal_operating_point_requires_at_least_one() {
        let inputs = Inputs {
            design_requirements: DesignRequirements {
                turns_ratios: vec![1.0],
                magnetizing_inductance: (1e-6, 1e-6, 1e-6),
                isolation_sides: vec![crate::winding::IsolationSide::Primary],
                topology: None,
                maximum_dimensions: None,
                minimum_impedance: None,
            },
            operating_points: Vec::new(),
        };
        assert!(inputs.nominal_operating_point().is_err());
    }
}
