/*!
Thermal solver: steady-state temperature rise from total dissipated losses.

Grounded on spec.md §4.7 and the Maniktala empirical thermal-resistance model
named in §6's configuration table (`coreTemperature: MANIKTALA`).
*/

use crate::config::ThermalResistanceModelKind;
use crate::core_geometry::Core;
use crate::error::{MagneticsError, Result};

/// Result of a thermal solve: resistance, rise and absolute temperature.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ThermalOutput {
    /// Thermal resistance used, kelvin per watt.
    pub thermal_resistance: f64,
    /// Temperature rise above ambient, kelvin.
    pub temperature_rise: f64,
    /// Absolute steady-state temperature, Celsius (`ambient + rise`).
    pub temperature: f64,
    /// Name of the model that produced `thermal_resistance`, or "datasheet"
    /// when the core's processed description already carried one.
    pub method_used: &'static str,
}

/// Thermal resistance of `core`, kelvin per watt.
///
/// Uses the core's own `processed_description.thermal_resistance` if
/// present (a manufacturer-supplied value takes precedence over any model);
/// otherwise falls back to `model`.
pub fn thermal_resistance(core: &Core, model: ThermalResistanceModelKind) -> Result<f64> {
    let processed = core
        .processed_description
        .as_ref()
        .ok_or_else(|| MagneticsError::core_not_processed("thermal_resistance"))?;

    if let Some(value) = processed.thermal_resistance {
        return Ok(value);
    }

    let effective_volume = processed.effective_volume;
    if effective_volume <= 0.0 {
        return Err(MagneticsError::invalid_input(
            "thermal_resistance requires a positive effective volume",
        ));
    }

    let value = match model {
        ThermalResistanceModelKind::Maniktala => 53.0 * effective_volume.powf(-0.54),
    };
    if value.is_nan() || !value.is_finite() {
        return Err(MagneticsError::calculation_nan("thermal_resistance"));
    }
    Ok(value)
}

/// Steady-state temperature rise above ambient, kelvin, for total dissipated
/// power `total_losses` watts.
pub fn temperature_rise(core: &Core, total_losses: f64, model: ThermalResistanceModelKind) -> Result<f64> {
    let resistance = thermal_resistance(core, model)?;
    let rise = resistance * total_losses;
    if rise.is_nan() {
        return Err(MagneticsError::calculation_nan("temperature_rise"));
    }
    Ok(rise)
}

/// Full thermal solve: rise plus absolute temperature given `ambient_temperature`, Celsius.
pub fn solve(
    core: &Core,
    total_losses: f64,
    ambient_temperature: f64,
    model: ThermalResistanceModelKind,
) -> Result<ThermalOutput> {
    let processed = core
        .processed_description
        .as_ref()
        .ok_or_else(|| MagneticsError::core_not_processed("thermal::solve"))?;
    let method_used = if processed.thermal_resistance.is_some() {
        "datasheet"
    } else {
        match model {
            ThermalResistanceModelKind::Maniktala => "maniktala",
        }
    };
    let resistance = thermal_resistance(core, model)?;
    let rise = resistance * total_losses;
    if rise.is_nan() {
        return Err(MagneticsError::calculation_nan("thermal::solve"));
    }
    Ok(ThermalOutput {
        thermal_resistance: resistance,
        temperature_rise: rise,
        temperature: ambient_temperature + rise,
        method_used,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_geometry::{
        Core, CoreShapeDataOrName, CoreType, ProcessedDescription,
    };
    use crate::material::CoreMaterialDataOrName;
    use approx::assert_abs_diff_eq;

    fn processed_core(effective_volume: f64, thermal_resistance: Option<f64>) -> Core {
        let mut core = Core::new(
            CoreShapeDataOrName::Named("PQ 28/20".to_string()),
            CoreMaterialDataOrName::Named("N87".to_string()),
            1,
            CoreType::TwoPieceSet,
            Vec::new(),
        )
        .unwrap();
        core.processed_description = Some(ProcessedDescription {
            effective_length: 0.056,
            effective_area: 85.3e-6,
            minimum_area: 85.3e-6,
            effective_volume,
            outer_bounding_box: (0.03, 0.02, 0.022),
            columns: Vec::new(),
            winding_windows: Vec::new(),
            thermal_resistance,
        });
        core
    }

    #[test]
    fn maniktala_model_matches_closed_form() {
        let core = processed_core(4.51e-7, None);
        let resistance =
            thermal_resistance(&core, ThermalResistanceModelKind::Maniktala).unwrap();
        let expected = 53.0 * 4.51e-7_f64.powf(-0.54);
        assert_abs_diff_eq!(resistance, expected, epsilon = 1e-6);
    }

    #[test]
    fn datasheet_thermal_resistance_takes_precedence() {
        let core = processed_core(4.51e-7, Some(12.5));
        let resistance =
            thermal_resistance(&core, ThermalResistanceModelKind::Maniktala).unwrap();
        assert_abs_diff_eq!(resistance, 12.5, epsilon = 1e-12);
    }

    #[test]
    fn solve_adds_ambient_to_rise() {
        let core = processed_core(4.51e-7, Some(10.0));
        let output = solve(&core, 2.0, 25.0, ThermalResistanceModelKind::Maniktala).unwrap();
        assert_abs_diff_eq!(output.temperature_rise, 20.0, epsilon = 1e-9);
        assert_abs_diff_eq!(output.temperature, 45.0, epsilon = 1e-9);
        assert_eq!(output.method_used, "datasheet");
    }

    #[test]
    fn unprocessed_core_fails() {
        let core = Core::new(
            CoreShapeDataOrName::Named("PQ 28/20".to_string()),
            CoreMaterialDataOrName::Named("N87".to_string()),
            1,
            CoreType::TwoPieceSet,
            Vec::new(),
        )
        .unwrap();
        let error = thermal_resistance(&core, ThermalResistanceModelKind::Maniktala).unwrap_err();
        assert_eq!(error.code(), "CORE_NOT_PROCESSED");
    }
}
