/*!
Winding-loss engine: ohmic, skin-effect and proximity-effect losses per turn,
aggregated up through layers, sections and windings, plus the effective-
resistance and resistance-matrix queries built on top of it.

Skin and proximity effects are both derived from Dowell's two-term layer
formula (`stem_material`'s core-loss fitter supplied the `argmin`/Nelder-Mead
idiom this module's neighbours use, but the field model itself comes from the
classical multi-layer transformer-winding literature): the skin term uses the
conductor's own field-penetration ratio, the proximity term folds in the
number of conductor layers the external field has already crossed. This
sidesteps a full per-turn 2-D field solve, which is explicitly out of scope.
*/

use crate::config::Configuration;
use crate::error::{MagneticsError, Result};
use crate::waveform::{self, Harmonics, Signal, Waveform};
use crate::winding::{Coil, Turn, Wire};
use crate::operating_point::OperatingPointExcitation;

const COPPER_RESISTIVITY_20C: f64 = 1.68e-8;
const COPPER_TEMPERATURE_COEFFICIENT: f64 = 0.00393;
const VACUUM_PERMEABILITY_UNITLESS: f64 = crate::constants::VACUUM_PERMEABILITY_UNITLESS;

/// Copper resistivity at `temperature`, Celsius, ohm*meter.
fn copper_resistivity(temperature: f64) -> f64 {
    COPPER_RESISTIVITY_20C * (1.0 + COPPER_TEMPERATURE_COEFFICIENT * (temperature - 20.0))
}

fn skin_depth(resistivity: f64, frequency: f64) -> f64 {
    if frequency <= 0.0 {
        return f64::INFINITY;
    }
    (resistivity / (std::f64::consts::PI * frequency * VACUUM_PERMEABILITY_UNITLESS)).sqrt()
}

/// The wire dimension the field penetrates: diameter for round and litz
/// strands, the height perpendicular to the field for rectangular wire, and
/// thickness for foil.
fn wire_field_dimension(wire: &Wire) -> f64 {
    match wire {
        Wire::Round { diameter } => *diameter,
        Wire::Rectangular { height, .. } => *height,
        Wire::Foil { thickness, .. } => *thickness,
        Wire::Litz { strand_diameter, .. } => *strand_diameter,
    }
}

/// Dowell's `(F_skin, F_proximity)` pair: both are excess-resistance factors
/// relative to `R_dc` (i.e. 0 at DC), as functions of the penetration ratio
/// `xi` and the number of conductor layers `m` the field has already crossed.
fn dowell_factors(dimension: f64, delta: f64, layer_number: f64) -> (f64, f64) {
    if !delta.is_finite() || delta <= 0.0 {
        return (0.0, 0.0);
    }
    let xi = (dimension / delta) * (std::f64::consts::PI / 4.0).sqrt();
    if xi < 1e-6 {
        return (0.0, 0.0);
    }
    let skin = xi * ((2.0 * xi).sinh() + (2.0 * xi).sin()) / ((2.0 * xi).cosh() - (2.0 * xi).cos())
        - 1.0;
    let proximity = (2.0 * (layer_number.powi(2) - 1.0) / 3.0) * xi * (xi.sinh() - xi.sin())
        / (xi.cosh() + xi.cos());
    (skin.max(0.0), proximity.max(0.0))
}

/// Per-harmonic loss values alongside the frequencies they were evaluated at.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct HarmonicLosses {
    pub per_harmonic: Vec<f64>,
    pub frequencies: Vec<f64>,
}

impl HarmonicLosses {
    fn sum(&self) -> f64 {
        self.per_harmonic.iter().sum()
    }

    fn combine(&self, other: &HarmonicLosses) -> HarmonicLosses {
        if self.per_harmonic.is_empty() {
            return other.clone();
        }
        if other.per_harmonic.is_empty() {
            return self.clone();
        }
        let per_harmonic = self
            .per_harmonic
            .iter()
            .zip(other.per_harmonic.iter())
            .map(|(a, b)| a + b)
            .collect();
        HarmonicLosses {
            per_harmonic,
            frequencies: self.frequencies.clone(),
        }
    }
}

/// Loss breakdown of a turn, layer, section or winding.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LossBreakdown {
    pub ohmic_losses: f64,
    pub skin_effect_losses: HarmonicLosses,
    pub proximity_effect_losses: HarmonicLosses,
}

impl LossBreakdown {
    /// Total losses this breakdown accounts for, watts.
    pub fn total(&self) -> f64 {
        self.ohmic_losses + self.skin_effect_losses.sum() + self.proximity_effect_losses.sum()
    }

    fn combine(&self, other: &LossBreakdown) -> LossBreakdown {
        LossBreakdown {
            ohmic_losses: self.ohmic_losses + other.ohmic_losses,
            skin_effect_losses: self.skin_effect_losses.combine(&other.skin_effect_losses),
            proximity_effect_losses: self
                .proximity_effect_losses
                .combine(&other.proximity_effect_losses),
        }
    }
}

fn combine_turns(indexes: &[usize], per_turn: &[LossBreakdown]) -> LossBreakdown {
    indexes
        .iter()
        .fold(LossBreakdown::default(), |accumulated, &index| {
            accumulated.combine(&per_turn[index])
        })
}

/// Result of a full winding-loss calculation.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WindingLossesOutput {
    pub winding_losses: f64,
    pub winding_losses_per_turn: Vec<LossBreakdown>,
    pub winding_losses_per_layer: Vec<LossBreakdown>,
    pub winding_losses_per_section: Vec<LossBreakdown>,
    pub winding_losses_per_winding: Vec<LossBreakdown>,
}

fn turn_loss_breakdown(
    turn: &Turn,
    harmonics: &Harmonics,
    rms_current: f64,
    resistivity: f64,
) -> Result<LossBreakdown> {
    let area = turn.wire.cross_section();
    if area <= 0.0 {
        return Err(MagneticsError::invalid_input(
            "turn wire has non-positive cross-section",
        ));
    }
    let r_dc = resistivity * turn.length / area;
    let ohmic_losses = r_dc * rms_current.powi(2);

    let dimension = wire_field_dimension(&turn.wire);
    let layer_number = (turn.layer_index + 1) as f64;

    let mut frequencies = Vec::new();
    let mut skin_per_harmonic = Vec::new();
    let mut proximity_per_harmonic = Vec::new();
    for harmonic in harmonics.harmonics.iter().skip(1) {
        let delta = skin_depth(resistivity, harmonic.frequency);
        let (skin_factor, proximity_factor) = dowell_factors(dimension, delta, layer_number);
        let harmonic_rms = harmonic.amplitude / std::f64::consts::SQRT_2;
        frequencies.push(harmonic.frequency);
        skin_per_harmonic.push(r_dc * skin_factor * harmonic_rms.powi(2));
        proximity_per_harmonic.push(r_dc * proximity_factor * harmonic_rms.powi(2));
    }

    Ok(LossBreakdown {
        ohmic_losses,
        skin_effect_losses: HarmonicLosses {
            per_harmonic: skin_per_harmonic,
            frequencies: frequencies.clone(),
        },
        proximity_effect_losses: HarmonicLosses {
            per_harmonic: proximity_per_harmonic,
            frequencies,
        },
    })
}

fn unique_in_order<T: PartialEq + Clone>(values: impl Iterator<Item = T>) -> Vec<T> {
    let mut seen = Vec::new();
    for value in values {
        if !seen.contains(&value) {
            seen.push(value);
        }
    }
    seen
}

/// Compute winding losses for `coil` given one excitation per winding.
///
/// Each excitation's `current` waveform is standardized and thresholded
/// independently, so windings driven at different frequencies or duty
/// cycles are handled correctly; aggregation across the layer/section/
/// winding hierarchy always re-sums the same per-turn array rather than
/// summing already-aggregated levels.
pub fn winding_losses(
    coil: &Coil,
    excitations: &[OperatingPointExcitation],
    temperature: f64,
    config: &Configuration,
) -> Result<WindingLossesOutput> {
    if excitations.len() != coil.windings.len() {
        return Err(MagneticsError::invalid_input(
            "excitation count must match the number of windings",
        ));
    }
    let minimum_exponent = (config.inputs_number_points_sampled_waveforms as u32).trailing_zeros();
    let resistivity = copper_resistivity(temperature);
    let many_turns = coil.total_physical_turns() > config.quick_mode_many_turns_threshold;
    let threshold = if config.harmonic_amplitude_threshold_quick_mode && many_turns {
        config.harmonic_amplitude_threshold * 2.0
    } else {
        config.harmonic_amplitude_threshold
    };

    let mut per_turn: Vec<Option<LossBreakdown>> = vec![None; coil.turns.len()];
    for (winding_index, excitation) in excitations.iter().enumerate() {
        let current = excitation
            .current
            .as_ref()
            .and_then(|signal| signal.waveform.as_ref())
            .ok_or_else(|| {
                MagneticsError::missing_data(format!(
                    "winding {winding_index} has no current waveform"
                ))
            })?;
        let standardized =
            waveform::standardize_waveform(current, excitation.frequency, minimum_exponent)?;
        let harmonics = waveform::calculate_harmonics_data(&standardized, excitation.frequency)?
            .thresholded(threshold);
        let stats = waveform::processed(&standardized);

        for turn_index in coil.turns_indexes_by_winding(winding_index) {
            let breakdown =
                turn_loss_breakdown(&coil.turns[turn_index], &harmonics, stats.rms, resistivity)?;
            per_turn[turn_index] = Some(breakdown);
        }
    }

    let per_turn: Vec<LossBreakdown> = per_turn
        .into_iter()
        .enumerate()
        .map(|(index, entry)| {
            entry.ok_or_else(|| {
                MagneticsError::missing_data(format!(
                    "turn {index} belongs to a winding with no excitation"
                ))
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let layer_keys = unique_in_order(
        coil.turns
            .iter()
            .map(|turn| (turn.winding_index, turn.section_index, turn.layer_index)),
    );
    let winding_losses_per_layer = layer_keys
        .iter()
        .map(|&(w, s, l)| combine_turns(&coil.turns_indexes_by_layer(w, s, l), &per_turn))
        .collect();

    let section_keys =
        unique_in_order(coil.turns.iter().map(|turn| (turn.winding_index, turn.section_index)));
    let winding_losses_per_section = section_keys
        .iter()
        .map(|&(w, s)| combine_turns(&coil.turns_indexes_by_section(w, s), &per_turn))
        .collect();

    let winding_losses_per_winding: Vec<LossBreakdown> = (0..coil.windings.len())
        .map(|w| combine_turns(&coil.turns_indexes_by_winding(w), &per_turn))
        .collect();

    let total = per_turn.iter().map(LossBreakdown::total).sum();

    Ok(WindingLossesOutput {
        winding_losses: total,
        winding_losses_per_turn: per_turn,
        winding_losses_per_layer,
        winding_losses_per_section,
        winding_losses_per_winding,
    })
}

fn sinusoidal_current_excitation(frequency: f64, amplitude_rms: f64) -> Result<OperatingPointExcitation> {
    let samples = 64;
    let period = 1.0 / frequency;
    let peak = amplitude_rms * std::f64::consts::SQRT_2;
    let time: Vec<f64> = (0..samples).map(|i| period * i as f64 / samples as f64).collect();
    let data: Vec<f64> = time
        .iter()
        .map(|t| peak * (2.0 * std::f64::consts::PI * frequency * t).sin())
        .collect();
    let waveform = Waveform::new(time, data)?;
    Ok(OperatingPointExcitation {
        frequency,
        current: Some(Signal {
            waveform: Some(waveform),
            harmonics: None,
            processed: None,
        }),
        voltage: None,
        magnetizing_current: None,
        magnetic_flux_density: None,
    })
}

/// Virtual unit-RMS test: drives `winding_index` with 1 A RMS at `frequency`
/// and every other winding with the corresponding current reflected through
/// the coil's turns ratios (so the excitation is MMF-consistent), then
/// divides total losses by I^2 to get that winding's effective resistance.
pub fn effective_resistance(
    coil: &Coil,
    winding_index: usize,
    frequency: f64,
    temperature: f64,
    config: &Configuration,
) -> Result<f64> {
    let ratios = coil.turns_ratios()?;
    if winding_index >= coil.windings.len() {
        return Err(MagneticsError::missing_data(format!(
            "no winding at index {winding_index}"
        )));
    }
    let excitations = build_reflected_excitations(&ratios, &[(winding_index, 1.0)], frequency)?;
    let output = winding_losses(coil, &excitations, temperature, config)?;
    Ok(output.winding_losses)
}

fn build_reflected_excitations(
    ratios: &[f64],
    driven: &[(usize, f64)],
    frequency: f64,
) -> Result<Vec<OperatingPointExcitation>> {
    let mut excitations = Vec::with_capacity(ratios.len());
    for index in 0..ratios.len() {
        let mut amplitude = 0.0;
        for &(driven_index, driven_amplitude) in driven {
            if ratios[driven_index] == 0.0 {
                return Err(MagneticsError::invalid_input(
                    "turns ratio is zero, cannot reflect excitation",
                ));
            }
            amplitude += driven_amplitude * ratios[index] / ratios[driven_index];
        }
        excitations.push(sinusoidal_current_excitation(frequency, amplitude)?);
    }
    Ok(excitations)
}

/// Resistance matrix of `coil` at `frequency` and `temperature`: diagonal
/// entries are [`effective_resistance`], off-diagonal entries come from
/// pair-excitation and the identity `2*R_ij = (P_ij - R_ii - R_jj)/I^2`.
pub fn resistance_matrix(
    coil: &Coil,
    frequency: f64,
    temperature: f64,
    config: &Configuration,
) -> Result<Vec<Vec<f64>>> {
    let n = coil.windings.len();
    let ratios = coil.turns_ratios()?;
    let mut diagonal = Vec::with_capacity(n);
    for i in 0..n {
        diagonal.push(effective_resistance(coil, i, frequency, temperature, config)?);
    }

    let mut matrix = vec![vec![0.0; n]; n];
    for i in 0..n {
        matrix[i][i] = diagonal[i];
    }
    for i in 0..n {
        for j in (i + 1)..n {
            let excitations =
                build_reflected_excitations(&ratios, &[(i, 1.0), (j, 1.0)], frequency)?;
            let output = winding_losses(coil, &excitations, temperature, config)?;
            let r_ij = (output.winding_losses - diagonal[i] - diagonal[j]) / 2.0;
            matrix[i][j] = r_ij;
            matrix[j][i] = r_ij;
        }
    }
    Ok(matrix)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::winding::{IsolationSide, Winding};
    use approx::assert_abs_diff_eq;

    fn single_winding_coil(turns: usize, diameter: f64) -> Coil {
        let winding = Winding {
            name: "primary".to_string(),
            number_turns: turns,
            number_parallels: 1,
            wire: Wire::Round { diameter },
            isolation_side: IsolationSide::Primary,
        };
        let turn_entries = (0..turns)
            .map(|_| Turn {
                winding_index: 0,
                layer_index: 0,
                section_index: 0,
                length: 0.03,
                wire: Wire::Round { diameter },
            })
            .collect();
        Coil {
            windings: vec![winding],
            turns: turn_entries,
        }
    }

    #[test]
    fn ohmic_losses_match_closed_form_at_low_frequency() {
        let coil = single_winding_coil(10, 1.0e-3);
        let excitation = sinusoidal_current_excitation(100.0, 1.0).unwrap();
        let config = Configuration::default();
        let output = winding_losses(&coil, &[excitation], 20.0, &config).unwrap();

        let wire = Wire::Round { diameter: 1.0e-3 };
        let r_dc_per_turn = copper_resistivity(20.0) * 0.03 / wire.cross_section();
        let expected_ohmic = r_dc_per_turn * 1.0_f64.powi(2) * 10.0;
        let ohmic_total: f64 = output
            .winding_losses_per_turn
            .iter()
            .map(|breakdown| breakdown.ohmic_losses)
            .sum();
        assert_abs_diff_eq!(ohmic_total, expected_ohmic, epsilon = expected_ohmic * 0.05);
    }

    #[test]
    fn aggregation_matches_the_sum_of_turns() {
        let coil = single_winding_coil(4, 0.5e-3);
        let excitation = sinusoidal_current_excitation(100_000.0, 2.0).unwrap();
        let config = Configuration::default();
        let output = winding_losses(&coil, &[excitation], 25.0, &config).unwrap();

        let from_turns: f64 = output
            .winding_losses_per_turn
            .iter()
            .map(LossBreakdown::total)
            .sum();
        assert_abs_diff_eq!(output.winding_losses, from_turns, epsilon = from_turns * 1e-9 + 1e-12);
        assert_eq!(output.winding_losses_per_winding.len(), 1);
        assert_abs_diff_eq!(
            output.winding_losses_per_winding[0].total(),
            from_turns,
            epsilon = from_turns * 1e-9 + 1e-12
        );
    }

    #[test]
    fn effective_resistance_recovers_total_loss_for_sinusoidal_excitation() {
        let coil = single_winding_coil(8, 0.8e-3);
        let config = Configuration::default();
        let resistance = effective_resistance(&coil, 0, 50_000.0, 25.0, &config).unwrap();

        let excitation = sinusoidal_current_excitation(50_000.0, 1.0).unwrap();
        let output = winding_losses(&coil, &[excitation], 25.0, &config).unwrap();
        assert_abs_diff_eq!(resistance, output.winding_losses, epsilon = output.winding_losses * 1e-9 + 1e-12);
    }

    #[test]
    fn mismatched_excitation_count_is_invalid_input() {
        let coil = single_winding_coil(4, 0.5e-3);
        let config = Configuration::default();
        let error = winding_losses(&coil, &[], 25.0, &config).unwrap_err();
        assert_eq!(error.code(), "INVALID_INPUT");
    }
}
