/*!
Reluctance engine: ungapped core reluctance and per-gap reluctance, fringing
factor and storable magnetic energy under a choice of gap models.
*/

pub mod models;

use crate::config::ReluctanceModelKind;
use crate::constants::Constants;
use crate::core_geometry::{ColumnType, CoreGap, GapShape, ProcessedDescription};
use crate::error::{MagneticsError, Result};

/// Result of evaluating a single gap's reluctance.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AirGapReluctanceOutput {
    /// Gap reluctance, ampere-turns per weber.
    pub reluctance: f64,
    /// Fringing factor, always >= 1.
    pub fringing_factor: f64,
    /// Maximum magnetic energy the gap can store before flux saturates, joules.
    pub maximum_storable_magnetic_energy: f64,
    /// Name of the model that produced this result.
    pub method_used: &'static str,
}

/// Input bundle shared by every gap reluctance model.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GapInput {
    /// Gap length, meters.
    pub length: f64,
    /// Gap cross-section area, square meters.
    pub area: f64,
    /// Cross-section `(width, depth)`, meters.
    pub section_dimensions: (f64, f64),
    /// Distance to the closest normal surface, meters.
    pub distance_closest_normal_surface: f64,
    /// Cross-section shape.
    pub shape: GapShape,
}

impl GapInput {
    fn from_gap(gap: &CoreGap) -> Result<Self> {
        let length = gap.length;
        let area = gap
            .area
            .ok_or_else(|| MagneticsError::missing_data("gap has no resolved area"))?;
        let section_dimensions = gap.section_dimensions.ok_or_else(|| {
            MagneticsError::missing_data("gap has no resolved section_dimensions")
        })?;
        let distance_closest_normal_surface =
            gap.distance_closest_normal_surface.ok_or_else(|| {
                MagneticsError::missing_data("gap has no resolved distance_closest_normal_surface")
            })?;
        if distance_closest_normal_surface < 0.0 {
            return Err(MagneticsError::gap_invalid_dimensions(format!(
                "distance_closest_normal_surface is negative: {distance_closest_normal_surface}"
            )));
        }
        let shape = gap
            .shape
            .ok_or_else(|| MagneticsError::missing_data("gap has no resolved shape"))?;
        Ok(GapInput {
            length,
            area,
            section_dimensions,
            distance_closest_normal_surface,
            shape,
        })
    }
}

/// Compute the reluctance contribution of a single [`CoreGap`] under `model`.
pub fn gap_reluctance(
    gap: &CoreGap,
    model: ReluctanceModelKind,
    constants: &Constants,
) -> Result<AirGapReluctanceOutput> {
    if gap.length == 0.0 {
        return Ok(AirGapReluctanceOutput {
            reluctance: 0.0,
            fringing_factor: 1.0,
            maximum_storable_magnetic_energy: 0.0,
            method_used: "zero_length",
        });
    }
    let input = GapInput::from_gap(gap)?;
    let result = match model {
        ReluctanceModelKind::Zhang => models::zhang(&input, constants),
        ReluctanceModelKind::Partridge => models::partridge(&input, constants),
        ReluctanceModelKind::EffectiveArea => models::effective_area(&input, constants),
        ReluctanceModelKind::EffectiveLength => models::effective_length(&input, constants),
        ReluctanceModelKind::Muehlethaler => models::muehlethaler(&input, constants),
        ReluctanceModelKind::Stenglein => models::stenglein(&input, constants),
        ReluctanceModelKind::Balakrishnan => models::balakrishnan(&input, constants),
        ReluctanceModelKind::Classic => models::classic(&input, constants),
    }?;
    if result.reluctance.is_nan() || result.fringing_factor.is_nan() {
        return Err(MagneticsError::calculation_nan("gap_reluctance"));
    }
    Ok(result)
}

/// Ungapped core reluctance: `R = effective_length / (mu_absolute * effective_area)`.
pub fn ungapped_core_reluctance(
    processed: &ProcessedDescription,
    mu_absolute: f64,
) -> Result<f64> {
    if mu_absolute <= 0.0 || processed.effective_area <= 0.0 {
        return Err(MagneticsError::invalid_input(
            "ungapped_core_reluctance requires positive permeability and area",
        ));
    }
    let value = processed.effective_length / (mu_absolute * processed.effective_area);
    if value.is_nan() {
        return Err(MagneticsError::calculation_nan("ungapped_core_reluctance"));
    }
    Ok(value)
}

/// Combine all of a core's gaps into a single gapping reluctance: central
/// column gaps add in series, lateral column gaps add in parallel.
pub fn gapping_reluctance(
    processed: &ProcessedDescription,
    gapping: &[CoreGap],
    model: ReluctanceModelKind,
    constants: &Constants,
) -> Result<(f64, Vec<AirGapReluctanceOutput>)> {
    let mut per_gap = Vec::with_capacity(gapping.len());
    let mut central_sum = 0.0;
    let mut lateral_inverse_sum = 0.0;
    let mut any_lateral = false;

    for gap in gapping {
        let output = gap_reluctance(gap, model, constants)?;
        let is_central = gap
            .coordinates
            .map(|coordinates| coordinates.x.abs() < 1e-9 && coordinates.z.abs() < 1e-9)
            .unwrap_or(true);
        let column_type = processed
            .columns
            .iter()
            .find(|column| {
                gap.coordinates
                    .map(|gap_coordinates| {
                        (column.coordinates.x - gap_coordinates.x).abs() < 1e-6
                            && (column.coordinates.z - gap_coordinates.z).abs() < 1e-6
                    })
                    .unwrap_or(is_central)
            })
            .map(|column| column.column_type)
            .unwrap_or(ColumnType::Central);

        match column_type {
            ColumnType::Central => central_sum += output.reluctance,
            ColumnType::Lateral => {
                any_lateral = true;
                if output.reluctance > 0.0 {
                    lateral_inverse_sum += 1.0 / output.reluctance;
                }
            }
        }
        per_gap.push(output);
    }

    let lateral_total = if any_lateral && lateral_inverse_sum > 0.0 {
        1.0 / lateral_inverse_sum
    } else {
        0.0
    };

    Ok((central_sum + lateral_total, per_gap))
}
