/*!
Core geometry: functional description (shape, material, gapping) plus the
cached, derived "processed" geometry every physical model actually consumes.
*/

use crate::error::{MagneticsError, Result};
use crate::material::CoreMaterialDataOrName;

/// Physical shape of a core gap's cross section.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum GapShape {
    /// Circular cross section (toroids, round center-posts).
    Round,
    /// Rectangular cross section.
    Rectangular,
}

/// How a gap was created.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum GapType {
    /// A spacer or shim inserted to add length.
    Additive,
    /// Ground away from the core halves.
    Subtractive,
    /// The uncontrolled gap left by a manufacturing mating surface.
    Residual,
}

/// A 3-vector in core-local space; the y-axis is the column axis.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Coordinates {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

/// A single air gap along a column.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CoreGap {
    /// How the gap was created.
    pub gap_type: GapType,
    /// Gap length, meters; strictly non-negative.
    pub length: f64,
    /// Position of the gap's center, if already placed.
    pub coordinates: Option<Coordinates>,
    /// Cross-sectional shape, if already resolved.
    pub shape: Option<GapShape>,
    /// Cross section area, square meters, if already resolved.
    pub area: Option<f64>,
    /// `(width, depth)` of the gap's cross section, if already resolved.
    pub section_dimensions: Option<(f64, f64)>,
    /// Distance to the closest surface normal to the column axis, meters.
    pub distance_closest_normal_surface: Option<f64>,
    /// Distance to the closest surface parallel to the column axis, meters.
    pub distance_closest_parallel_surface: Option<f64>,
}

impl CoreGap {
    /// Build a gap with only its type and length set; the rest is filled by processing.
    pub fn new(gap_type: GapType, length: f64) -> Result<Self> {
        if length < 0.0 {
            return Err(MagneticsError::invalid_input(
                "gap length must be non-negative",
            ));
        }
        Ok(CoreGap {
            gap_type,
            length,
            coordinates: None,
            shape: None,
            area: None,
            section_dimensions: None,
            distance_closest_normal_surface: None,
            distance_closest_parallel_surface: None,
        })
    }

    /// Whether this gap's placement is fully resolved: processing needs to
    /// run [`distribute_gaps`] otherwise.
    pub fn is_placed(&self) -> bool {
        self.coordinates.is_some() && self.distance_closest_normal_surface.is_some()
    }
}

/// Whether a gap's distance to the closest normal surface is non-negative.
///
/// Grounded on spec §4.3's processing invariant: a negative distance is
/// infeasible and the caller must treat it as such (drop the candidate).
pub fn process_gap(gap: &CoreGap) -> bool {
    match gap.distance_closest_normal_surface {
        Some(distance) => distance >= 0.0,
        None => true,
    }
}

/// Column role within the winding window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ColumnType {
    /// The central (wound) column.
    Central,
    /// A lateral (return) column.
    Lateral,
}

/// One of the core's physical columns, as derived by processing.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ColumnElement {
    pub column_type: ColumnType,
    pub area: f64,
    pub width: f64,
    pub depth: f64,
    pub height: f64,
    pub coordinates: Coordinates,
    pub shape: GapShape,
}

/// One rectangular winding window available for coil placement.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WindingWindowElement {
    pub area: f64,
    pub width: f64,
    pub height: f64,
}

/// Derived geometry cached on a [`Core`] after the first call that needs it.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ProcessedDescription {
    /// Effective magnetic path length, meters.
    pub effective_length: f64,
    /// Effective cross-sectional area, square meters.
    pub effective_area: f64,
    /// Minimum cross-sectional area along the path, square meters.
    pub minimum_area: f64,
    /// Effective magnetic volume, cubic meters.
    pub effective_volume: f64,
    /// Outer bounding box `(width, height, depth)`, meters.
    pub outer_bounding_box: (f64, f64, f64),
    /// Columns, central and lateral.
    pub columns: Vec<ColumnElement>,
    /// Winding windows available for the coil.
    pub winding_windows: Vec<WindingWindowElement>,
    /// Thermal resistance, K/W, if supplied directly rather than modeled.
    pub thermal_resistance: Option<f64>,
}

/// A named or inlined core shape family, resolved externally by the shape lookup.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CoreShapeDataOrName {
    /// Name to be resolved via the shape lookup.
    Named(String),
    /// Inline shape dimensions, keyed by manufacturer dimension name (e.g. "A", "B", "C").
    Inline {
        family: String,
        dimensions: std::collections::BTreeMap<String, f64>,
    },
}

/// How the core's two (or more) halves are arranged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CoreType {
    Toroidal,
    TwoPieceSet,
    PieceAndPlate,
    ClosedShape,
}

/// A magnetic core: shape, material and gapping, plus cached derived geometry.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Core {
    pub shape: CoreShapeDataOrName,
    pub material: CoreMaterialDataOrName,
    pub number_stacks: usize,
    pub core_type: CoreType,
    pub gapping: Vec<CoreGap>,
    pub processed_description: Option<ProcessedDescription>,
}

impl Core {
    /// Build an unprocessed core from its functional description.
    pub fn new(
        shape: CoreShapeDataOrName,
        material: CoreMaterialDataOrName,
        number_stacks: usize,
        core_type: CoreType,
        gapping: Vec<CoreGap>,
    ) -> Result<Self> {
        if number_stacks < 1 {
            return Err(MagneticsError::invalid_input(
                "number_stacks must be at least 1",
            ));
        }
        Ok(Core {
            shape,
            material,
            number_stacks,
            core_type,
            gapping,
            processed_description: None,
        })
    }

    /// Effective length, meters. Fails with [`MagneticsError::CoreNotProcessed`]
    /// if the core has not been processed yet.
    pub fn effective_length(&self) -> Result<f64> {
        self.processed()
            .map(|description| description.effective_length)
    }

    /// Effective area, square meters, already scaled by `number_stacks` in processing.
    pub fn effective_area(&self) -> Result<f64> {
        self.processed().map(|description| description.effective_area)
    }

    /// Effective volume, cubic meters.
    pub fn effective_volume(&self) -> Result<f64> {
        self.processed().map(|description| description.effective_volume)
    }

    fn processed(&self) -> Result<&ProcessedDescription> {
        self.processed_description
            .as_ref()
            .ok_or_else(|| MagneticsError::core_not_processed("core has not been processed"))
    }
}

/// Lazily attach a processed description to `core`, returning both the
/// (possibly unchanged) core and a view of the processed geometry.
///
/// Mirrors the original stack's cyclic/lazy processing, expressed instead as
/// an explicit `(core_with_processed, processed_view)` pair rather than
/// mutating `core` through a `RefCell` or similar interior-mutability shim.
pub fn processed(
    mut core: Core,
    build: impl FnOnce(&Core) -> Result<ProcessedDescription>,
) -> Result<(Core, ProcessedDescription)> {
    if let Some(description) = core.processed_description.clone() {
        return Ok((core, description));
    }
    let description = build(&core)?;
    core.processed_description = Some(description.clone());
    Ok((core, description))
}

/// Distribute gaps lacking explicit placement along the columns: non-residual
/// gaps go on the central column, evenly spaced; every other column is
/// filled with a residual gap of `residual_gap_length`.
pub fn distribute_gaps(
    gapping: &[CoreGap],
    column_count: usize,
    residual_gap_length: f64,
) -> Result<Vec<CoreGap>> {
    if column_count == 0 {
        return Err(MagneticsError::invalid_input(
            "distribute_gaps requires at least one column",
        ));
    }
    let central: Vec<&CoreGap> = gapping
        .iter()
        .filter(|gap| gap.gap_type != GapType::Residual)
        .collect();

    let mut result = Vec::with_capacity(column_count.max(central.len()));
    for gap in central {
        let mut placed = gap.clone();
        placed.coordinates.get_or_insert(Coordinates {
            x: 0.0,
            y: 0.0,
            z: 0.0,
        });
        result.push(placed);
    }
    for _ in 0..column_count.saturating_sub(1) {
        let mut residual = CoreGap::new(GapType::Residual, residual_gap_length)?;
        residual.distance_closest_normal_surface = Some(f64::INFINITY);
        result.push(residual);
    }
    Ok(result)
}
