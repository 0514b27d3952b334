//! Physical and numerical constants shared across the model stack.
//!
//! Mirrors the layout of `OpenMagnetics::Constants` (`original_source`):
//! a small bag of SI-valued knobs that every physical model reads from.

/// SI-value of the vacuum magnetic permeability (4π·10⁻⁷ H/m), unitless.
///
/// Based on the former ampere definition used until 2019; the deviation
/// introduced by the redefined ampere is within measurement uncertainty and
/// is ignored here, same as `stem_material::VACUUM_PERMEABILITY_UNITLESS`.
pub const VACUUM_PERMEABILITY_UNITLESS: f64 = 4.0 * std::f64::consts::PI * 1e-7;

lazy_static::lazy_static! {
    /// SI-value of the vacuum magnetic permeability with units.
    pub static ref VACUUM_PERMEABILITY: uom::si::f64::MagneticPermeability =
        uom::si::f64::MagneticPermeability::new::<uom::si::magnetic_permeability::henry_per_meter>(
            VACUUM_PERMEABILITY_UNITLESS,
        );
}

/// Tunable numeric constants referenced throughout the physical-model stack.
///
/// Grouped into a single struct (rather than scattered free constants) the
/// way `OpenMagnetics::Constants` bundles them, since several of these values
/// are configuration points rather than universal constants (e.g. the
/// minimum residual gap depends on what the manufacturer can reliably mill).
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Constants {
    /// Vacuum magnetic permeability, unitless (H/m).
    pub vacuum_permeability: f64,
    /// Minimum length of a residual (uncontrolled) air gap, meters.
    pub residual_gap: f64,
    /// Fraction by which a spacer gap is allowed to protrude past the core window.
    pub spacer_protruding_percentage: f64,
    /// Step size used when sweeping magnetic field strength in the Roshen model, A/m.
    pub roshen_magnetic_field_strength_step: f64,
    /// Lower bound on a distributed gap segment's fringing factor.
    pub minimum_distributed_fringing_factor: f64,
    /// Upper bound on a distributed gap segment's fringing factor.
    pub maximum_distributed_fringing_factor: f64,
    /// Initial step used by the binary-search gap-length solver, meters.
    pub initial_gap_length_for_searching: f64,
}

impl Default for Constants {
    fn default() -> Self {
        Self {
            vacuum_permeability: VACUUM_PERMEABILITY_UNITLESS,
            residual_gap: 5e-6,
            spacer_protruding_percentage: 0.1,
            roshen_magnetic_field_strength_step: 1.0,
            minimum_distributed_fringing_factor: 1.01,
            maximum_distributed_fringing_factor: 1.15,
            initial_gap_length_for_searching: 1e-3,
        }
    }
}
