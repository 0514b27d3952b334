//! Model selection and tunables consumed by every solver in the stack.

/// Gap reluctance model to use when computing an air gap's reluctance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ReluctanceModelKind {
    /// Zhang's model.
    Zhang,
    /// Partridge's model.
    Partridge,
    /// Effective-area model (treats the gap as a simple prism).
    EffectiveArea,
    /// Effective-length model.
    EffectiveLength,
    /// Muehlethaler's model.
    Muehlethaler,
    /// Stenglein's model.
    Stenglein,
    /// Balakrishnan's model.
    Balakrishnan,
    /// The classic (Schwarz-Christoffel derived) model.
    Classic,
}

/// Core-loss model to use when computing volumetric or total core losses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CoreLossesModelKind {
    /// Steinmetz equation.
    Steinmetz,
    /// Improved generalized Steinmetz equation.
    Igse,
    /// Modified Steinmetz equation.
    Mse,
    /// Natural Steinmetz equation.
    Nse,
    /// Albach's model.
    Albach,
    /// Barg's model (with duty-cycle correction).
    Barg,
    /// Roshen's model (hysteresis + eddy + excess losses).
    Roshen,
    /// Loss-factor model (via complex permeability).
    LossFactor,
    /// Manufacturer-proprietary closed-form equation.
    Proprietary,
}

/// Thermal resistance model to use when computing steady-state temperature rise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ThermalResistanceModelKind {
    /// Maniktala's empirical model, `R_th = 53 * V_eff^(-0.54)`.
    Maniktala,
}

/// Model selection and tunables consumed by every solver in the stack.
///
/// There is no file or CLI parsing here; a caller builds this directly or
/// starts from [`Configuration::default`].
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Configuration {
    /// Which core-loss model to apply.
    pub core_losses_model: CoreLossesModelKind,
    /// Which gap reluctance model to apply.
    pub gap_reluctance_model: ReluctanceModelKind,
    /// Which thermal resistance model to apply.
    pub core_temperature_model: ThermalResistanceModelKind,
    /// Minimum relative harmonic amplitude (relative to the fundamental) kept
    /// when building a loss-relevant harmonic spectrum.
    pub harmonic_amplitude_threshold: f64,
    /// Double `harmonic_amplitude_threshold` for windings whose physical
    /// turn count exceeds [`Self::quick_mode_many_turns_threshold`].
    pub harmonic_amplitude_threshold_quick_mode: bool,
    /// Physical-turn-count cutoff above which quick mode doubles the
    /// harmonic amplitude threshold.
    pub quick_mode_many_turns_threshold: usize,
    /// Number of points sampled when standardizing an input waveform; must
    /// be a power of two, at least 1024.
    pub inputs_number_points_sampled_waveforms: usize,
    /// Whether the magnetizing-inductance solver should add the winding's
    /// own air-cored (solenoid) inductance to the core contribution.
    pub magnetizing_inductance_include_air_inductance: bool,
    /// Whether gap reluctance calculations should account for fringing flux.
    pub magnetic_field_include_fringing: bool,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            core_losses_model: CoreLossesModelKind::Steinmetz,
            gap_reluctance_model: ReluctanceModelKind::Zhang,
            core_temperature_model: ThermalResistanceModelKind::Maniktala,
            harmonic_amplitude_threshold: 5e-3,
            harmonic_amplitude_threshold_quick_mode: false,
            quick_mode_many_turns_threshold: 100,
            inputs_number_points_sampled_waveforms: 1024,
            magnetizing_inductance_include_air_inductance: false,
            magnetic_field_include_fringing: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_documented_values() {
        let config = Configuration::default();
        assert_eq!(config.gap_reluctance_model, ReluctanceModelKind::Zhang);
        assert_eq!(config.core_losses_model, CoreLossesModelKind::Steinmetz);
        assert!((config.harmonic_amplitude_threshold - 5e-3).abs() < f64::EPSILON);
        assert_eq!(config.inputs_number_points_sampled_waveforms, 1024);
    }
}
