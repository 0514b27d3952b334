/*!
Magnetizing-inductance solver: the coupled fixed point `L = N^2 / R(mu(H_dc(L)))`,
plus the derived turns and gap solvers built on top of it.

Grounded on spec.md §4.4. The outer loop refines `L`, the inner loop refines
permeability against the DC bias that `L` itself implies through the
magnetizing current - mirroring the original stack's nested
`calculate_magnetizing_inductance` / `calculate_inductance_and_flux_density`
iteration rather than a single closed-form solve, since gapped-core
permeability is itself a function of the operating point.
*/

use crate::config::{Configuration, ReluctanceModelKind};
use crate::constants::Constants;
use crate::core_geometry::{Core, CoreGap, GapType, ProcessedDescription};
use crate::error::{MagneticsError, Result};
use crate::material::{self, CoreMaterial};
use crate::operating_point::OperatingPointExcitation;
use crate::reluctance::{self, AirGapReluctanceOutput};
use crate::waveform::{self, Signal, Waveform};

/// Origin of a [`MagnetizingInductanceOutput`]: whether it came from the
/// iterative solver or was supplied directly by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Origin {
    /// Computed by [`solve`].
    Simulation,
    /// Supplied by the caller (e.g. a measured value).
    Specification,
}

/// Result of solving the magnetizing inductance fixed point.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MagnetizingInductanceOutput {
    /// Solved magnetizing inductance, henries.
    pub magnetizing_inductance: f64,
    /// Total core reluctance (ungapped + gapping), ampere-turns per weber.
    pub core_reluctance: f64,
    /// Ungapped core reluctance alone.
    pub ungapped_core_reluctance: f64,
    /// Gapping reluctance alone.
    pub gapping_reluctance: f64,
    /// Per-gap reluctance results, in gapping order.
    pub reluctance_per_gap: Vec<AirGapReluctanceOutput>,
    /// Largest fringing factor across all gaps.
    pub maximum_fringing_factor: f64,
    /// Sum of each gap's maximum storable magnetic energy, joules.
    pub maximum_storable_magnetic_energy_gapping: f64,
    /// Name of the solving method used.
    pub method_used: &'static str,
    /// Whether this came from the solver or was supplied directly.
    pub origin: Origin,
}

const INNER_MAX_ITERATIONS: u32 = 10;
const OUTER_MAX_ITERATIONS: u32 = 100;
const INNER_CONVERGENCE_DELTA_MU: f64 = 1.0;
const OUTER_CONVERGENCE_RELATIVE: f64 = 0.01;

/// Bundle of everything [`solve`] needs beyond the core and its geometry.
pub struct SolveInputs<'a> {
    pub material: &'a CoreMaterial,
    pub temperature: f64,
    pub number_turns: usize,
    pub frequency: f64,
    /// Pre-shaped excitation of the winding whose magnetizing inductance is being solved.
    pub excitation: &'a OperatingPointExcitation,
    pub minimum_waveform_exponent: u32,
}

/// Reluctance of the whole core (ungapped + gapping) at absolute permeability `mu_absolute`.
fn total_core_reluctance(
    processed: &ProcessedDescription,
    gapping: &[CoreGap],
    mu_absolute: f64,
    model: ReluctanceModelKind,
    constants: &Constants,
) -> Result<(f64, f64, f64, Vec<AirGapReluctanceOutput>)> {
    let ungapped = reluctance::ungapped_core_reluctance(processed, mu_absolute)?;
    let (gapping_reluctance, per_gap) =
        reluctance::gapping_reluctance(processed, gapping, model, constants)?;
    Ok((ungapped + gapping_reluctance, ungapped, gapping_reluctance, per_gap))
}

/// Derive the DC bias `H_dc` (the offset of `H(t) = B(t) * R * A_eff / N`) and
/// the standardized `B(t)` waveform for the given magnetizing current.
///
/// When the fundamental harmonic amplitude is below `switching_frequency`'s
/// bin, the bias is clipped to the largest harmonic below the switching
/// frequency instead of the raw mean, per spec.md §4.4 step 2a.
fn flux_density_and_bias(
    magnetizing_current: &Waveform,
    number_turns: f64,
    reluctance: f64,
    effective_area: f64,
    frequency: f64,
    minimum_exponent: u32,
) -> Result<(Waveform, f64)> {
    let standardized = waveform::standardize_waveform(magnetizing_current, frequency, minimum_exponent)?;
    let time = standardized.time.clone();
    let data: Vec<f64> = standardized
        .data
        .iter()
        .map(|&current| (number_turns * current) / (effective_area * reluctance))
        .collect();
    let b_waveform = Waveform::new(time, data)?;
    let stats = waveform::processed(&b_waveform);

    let harmonics = waveform::calculate_harmonics_data(&b_waveform, frequency)?;
    let below_switching: Vec<_> = harmonics
        .harmonics
        .iter()
        .filter(|harmonic| harmonic.frequency > 0.0 && harmonic.frequency <= frequency)
        .collect();
    let fundamental_amplitude = harmonics.harmonics.get(1).map(|h| h.amplitude).unwrap_or(0.0);

    let h_dc = if fundamental_amplitude < stats.offset.abs() * 1e-3 && !below_switching.is_empty() {
        below_switching
            .iter()
            .map(|h| h.amplitude)
            .fold(0.0_f64, f64::max)
    } else {
        stats.offset
    };
    Ok((b_waveform, h_dc))
}

/// Derive the magnetizing current waveform from `excitation` for one inner-loop pass.
///
/// Handles the three cases named in spec.md §4.4 step 2a: a directly
/// supplied current, an already-known magnetizing current, or a
/// voltage-driven winding (integrated via `i_m = (1/L) * int v dt`).
fn derive_magnetizing_current(
    excitation: &OperatingPointExcitation,
    inductance: f64,
    minimum_exponent: u32,
) -> Result<Waveform> {
    if let Some(signal) = &excitation.magnetizing_current {
        return waveform_of(signal, excitation.frequency, minimum_exponent);
    }
    if let Some(signal) = &excitation.current {
        return waveform_of(signal, excitation.frequency, minimum_exponent);
    }
    if let Some(signal) = &excitation.voltage {
        let voltage = waveform_of(signal, excitation.frequency, minimum_exponent)?;
        return integrate_voltage(&voltage, inductance);
    }
    Err(MagneticsError::missing_data(
        "operating point excitation has no current, magnetizing_current or voltage signal",
    ))
}

fn waveform_of(signal: &Signal, frequency: f64, minimum_exponent: u32) -> Result<Waveform> {
    let waveform = signal
        .waveform
        .as_ref()
        .ok_or_else(|| MagneticsError::missing_data("signal has no sampled waveform"))?;
    waveform::standardize_waveform(waveform, frequency, minimum_exponent)
}

/// `i_m(t) = (1/L) * integral of v dt`, integrated cumulatively over one period.
fn integrate_voltage(voltage: &Waveform, inductance: f64) -> Result<Waveform> {
    if inductance <= 0.0 {
        return Err(MagneticsError::invalid_input(
            "integrate_voltage requires a positive inductance",
        ));
    }
    let n = voltage.len();
    let mut data = Vec::with_capacity(n);
    let mut accumulator = 0.0;
    data.push(0.0);
    for index in 1..n {
        let dt = voltage.time[index] - voltage.time[index - 1];
        accumulator += voltage.data[index - 1] * dt / inductance;
        data.push(accumulator);
    }
    // Remove any net DC drift so the waveform is genuinely periodic.
    let mean = data.iter().sum::<f64>() / n as f64;
    for value in data.iter_mut() {
        *value -= mean;
    }
    Waveform::new(voltage.time.clone(), data)
}

/// Air-cored (solenoid) inductance contribution of a winding wound on
/// `core_column_area` with `airProportion` of the winding window left
/// uncovered, added when `include_air_inductance` is set.
///
/// Grounded on the original stack's `calculate_inductance_air_solenoid`
/// (supplemented feature #1 in SPEC_FULL.md).
pub fn air_solenoid_inductance(
    number_turns: f64,
    coil_area: f64,
    column_area: f64,
    window_height: f64,
    air_proportion: f64,
    constants: &Constants,
) -> Result<f64> {
    if window_height <= 0.0 {
        return Err(MagneticsError::invalid_input(
            "air_solenoid_inductance requires a positive window height",
        ));
    }
    let value = constants.vacuum_permeability * number_turns.powi(2)
        * (coil_area - column_area * air_proportion)
        / window_height;
    if value.is_nan() {
        return Err(MagneticsError::calculation_nan("air_solenoid_inductance"));
    }
    Ok(value.max(0.0))
}

/// Solve the magnetizing-inductance fixed point for `core`.
///
/// Implements spec.md §4.4's nested loop: the inner loop refines permeability
/// against the DC bias implied by the current reluctance estimate (bounded
/// at 10 iterations); the outer loop refines `L` itself until consecutive
/// estimates differ by less than 1% (bounded at 100 iterations, a soft
/// limit - the last estimate is returned on exhaustion rather than failing).
pub fn solve(
    core: &Core,
    inputs: &SolveInputs,
    config: &Configuration,
    constants: &Constants,
) -> Result<MagnetizingInductanceOutput> {
    let processed = core
        .processed_description
        .as_ref()
        .ok_or_else(|| MagneticsError::core_not_processed("inductance::solve"))?;

    let number_turns = inputs.number_turns as f64;
    if number_turns <= 0.0 {
        return Err(MagneticsError::invalid_input(
            "inductance::solve requires at least one turn",
        ));
    }

    let mut mu = material::initial_permeability(
        inputs.material,
        inputs.temperature,
        None,
        Some(inputs.frequency),
    )?;

    let mut inductance = 0.0;
    let mut core_reluctance = 0.0;
    let mut ungapped = 0.0;
    let mut gapping = 0.0;
    let mut per_gap = Vec::new();

    for _ in 0..OUTER_MAX_ITERATIONS {
        let previous_inductance = inductance;

        for _ in 0..INNER_MAX_ITERATIONS {
            let mu_absolute = mu * constants.vacuum_permeability;
            let (total, ungapped_value, gapping_value, gaps) = total_core_reluctance(
                processed,
                &core.gapping,
                mu_absolute,
                config.gap_reluctance_model,
                constants,
            )?;
            core_reluctance = total;
            ungapped = ungapped_value;
            gapping = gapping_value;
            per_gap = gaps;

            let l_new = number_turns.powi(2) / core_reluctance;

            let magnetizing_current = derive_magnetizing_current(
                inputs.excitation,
                l_new,
                inputs.minimum_waveform_exponent,
            )?;
            let (_b_waveform, h_dc) = flux_density_and_bias(
                &magnetizing_current,
                number_turns,
                core_reluctance,
                processed.effective_area,
                inputs.excitation.frequency,
                inputs.minimum_waveform_exponent,
            )?;

            let mu_new = material::initial_permeability(
                inputs.material,
                inputs.temperature,
                Some(h_dc),
                Some(inputs.frequency),
            )?;

            inductance = l_new;
            let delta_mu = (mu_new - mu).abs();
            mu = mu_new;
            if delta_mu < INNER_CONVERGENCE_DELTA_MU {
                break;
            }
        }

        if previous_inductance > 0.0 {
            let relative_change = (inductance - previous_inductance).abs() / previous_inductance;
            if relative_change < OUTER_CONVERGENCE_RELATIVE {
                break;
            }
        }
    }

    if config.magnetizing_inductance_include_air_inductance {
        if let Some(column) = processed.columns.iter().find(|column| {
            column.column_type == crate::core_geometry::ColumnType::Central
        }) {
            if let Some(window) = processed.winding_windows.first() {
                let air = air_solenoid_inductance(
                    number_turns,
                    window.area,
                    column.area,
                    window.height,
                    0.5,
                    constants,
                )?;
                inductance += air;
            }
        }
    }

    if inductance.is_nan() || core_reluctance.is_nan() {
        return Err(MagneticsError::calculation_nan("inductance::solve"));
    }

    let maximum_fringing_factor = per_gap
        .iter()
        .map(|gap| gap.fringing_factor)
        .fold(1.0_f64, f64::max);
    let maximum_storable_magnetic_energy_gapping = per_gap
        .iter()
        .map(|gap| gap.maximum_storable_magnetic_energy)
        .sum();

    Ok(MagnetizingInductanceOutput {
        magnetizing_inductance: inductance,
        core_reluctance,
        ungapped_core_reluctance: ungapped,
        gapping_reluctance: gapping,
        reluctance_per_gap: per_gap,
        maximum_fringing_factor,
        maximum_storable_magnetic_energy_gapping,
        method_used: "fixed_point_iteration",
        origin: Origin::Simulation,
    })
}

/// Solve for the number of turns required to hit `target_inductance`, given
/// the core's reluctance at permeability `mu_absolute`.
///
/// Inverts step 2 of spec.md §4.4's solver: `N = sqrt(L * R)`. The minimum
/// returned value is 1 turn.
pub fn number_turns_from_inductance(
    processed: &ProcessedDescription,
    gapping: &[CoreGap],
    mu_absolute: f64,
    target_inductance: f64,
    model: ReluctanceModelKind,
    constants: &Constants,
) -> Result<usize> {
    if target_inductance <= 0.0 {
        return Err(MagneticsError::invalid_input(
            "number_turns_from_inductance requires a positive target inductance",
        ));
    }
    let (reluctance, _, _, _) =
        total_core_reluctance(processed, gapping, mu_absolute, model, constants)?;
    let turns = (target_inductance * reluctance).sqrt();
    if turns.is_nan() {
        return Err(MagneticsError::calculation_nan("number_turns_from_inductance"));
    }
    Ok(turns.ceil().max(1.0) as usize)
}

/// How a gap length search should distribute the needed length across
/// segments when multiple gaps are to be adjusted together.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum GappingAdjustmentType {
    /// A single centre-column ground gap.
    Ground,
    /// A single centre-column spacer gap.
    Spacer,
    /// Multiple gaps distributed across the central column's segments.
    Distributed,
}

/// Result of [`gapping_from_turns_and_inductance`].
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GappingSolution {
    /// Resolved gap length(s), meters, one per segment (length 1 unless distributed).
    pub gap_lengths: Vec<f64>,
    /// Reluctance achieved with this gapping, ampere-turns per weber.
    pub achieved_reluctance: f64,
    /// Number of binary-search iterations actually used.
    pub iterations_used: u32,
}

const GAP_SEARCH_MAX_ITERATIONS: u32 = 100;
const GAP_SEARCH_CONVERGENCE_RELATIVE: f64 = 0.001;

/// Binary-search a gap length (or, for [`GappingAdjustmentType::Distributed`],
/// a segment count and per-segment length) so the core's reluctance matches
/// `target_inductance` at `number_turns`, within 0.1% or 100 iterations.
///
/// Distributed gaps additionally grow the segment count whenever a
/// candidate length would push any segment's fringing factor outside
/// `[minimum_distributed_fringing_factor, maximum_distributed_fringing_factor]`.
pub fn gapping_from_turns_and_inductance(
    processed: &ProcessedDescription,
    number_turns: usize,
    target_inductance: f64,
    mu_absolute: f64,
    adjustment_type: GappingAdjustmentType,
    model: ReluctanceModelKind,
    constants: &Constants,
) -> Result<GappingSolution> {
    if target_inductance <= 0.0 || number_turns == 0 {
        return Err(MagneticsError::invalid_input(
            "gapping_from_turns_and_inductance requires a positive inductance and turns count",
        ));
    }
    let target_reluctance = (number_turns as f64).powi(2) / target_inductance;
    let ungapped = reluctance::ungapped_core_reluctance(processed, mu_absolute)?;
    if ungapped >= target_reluctance {
        // Already enough (or too much) reluctance with no gap at all.
        return Ok(GappingSolution {
            gap_lengths: vec![0.0],
            achieved_reluctance: ungapped,
            iterations_used: 0,
        });
    }
    let target_gapping_reluctance = target_reluctance - ungapped;

    let mut segment_count = match adjustment_type {
        GappingAdjustmentType::Distributed => 3usize,
        _ => 1usize,
    };

    let mut low = 0.0_f64;
    let mut high = constants.initial_gap_length_for_searching.max(1e-6);
    let mut iterations = 0;
    let mut achieved = ungapped;
    let mut lengths = vec![high / segment_count as f64; segment_count];

    // Expand `high` until it overshoots the target reluctance.
    for _ in 0..GAP_SEARCH_MAX_ITERATIONS {
        let per_segment = segment_count_length(processed, high, segment_count, model, constants)?;
        if per_segment >= target_gapping_reluctance {
            break;
        }
        high *= 2.0;
    }

    for iteration in 0..GAP_SEARCH_MAX_ITERATIONS {
        iterations = iteration + 1;
        let mid = (low + high) / 2.0;
        let gapping_reluctance = segment_count_length(processed, mid, segment_count, model, constants)?;
        achieved = ungapped + gapping_reluctance;

        let relative_error = (target_gapping_reluctance - gapping_reluctance).abs()
            / target_gapping_reluctance;

        if adjustment_type == GappingAdjustmentType::Distributed {
            let per_segment_length = mid / segment_count as f64;
            let fringing = single_gap_fringing(processed, per_segment_length, model, constants)?;
            if fringing > constants.maximum_distributed_fringing_factor {
                segment_count += 1;
                low = 0.0;
                high = constants.initial_gap_length_for_searching.max(1e-6) * segment_count as f64;
                continue;
            } else if fringing < constants.minimum_distributed_fringing_factor && segment_count > 1 {
                segment_count -= 1;
                low = 0.0;
                high = constants.initial_gap_length_for_searching.max(1e-6) * segment_count.max(1) as f64;
                continue;
            }
        }

        if relative_error < GAP_SEARCH_CONVERGENCE_RELATIVE {
            lengths = vec![mid / segment_count as f64; segment_count];
            break;
        }
        if gapping_reluctance < target_gapping_reluctance {
            low = mid;
        } else {
            high = mid;
        }
        lengths = vec![mid / segment_count as f64; segment_count];
    }

    Ok(GappingSolution {
        gap_lengths: lengths,
        achieved_reluctance: achieved,
        iterations_used: iterations,
    })
}

fn segment_count_length(
    processed: &ProcessedDescription,
    total_length: f64,
    segment_count: usize,
    model: ReluctanceModelKind,
    constants: &Constants,
) -> Result<f64> {
    let per_segment = total_length / segment_count as f64;
    let per_segment_reluctance = single_gap_reluctance(processed, per_segment, model, constants)?;
    Ok(per_segment_reluctance * segment_count as f64)
}

fn single_gap_reluctance(
    processed: &ProcessedDescription,
    length: f64,
    model: ReluctanceModelKind,
    constants: &Constants,
) -> Result<f64> {
    Ok(single_gap_output(processed, length, model, constants)?.reluctance)
}

fn single_gap_fringing(
    processed: &ProcessedDescription,
    length: f64,
    model: ReluctanceModelKind,
    constants: &Constants,
) -> Result<f64> {
    Ok(single_gap_output(processed, length, model, constants)?.fringing_factor)
}

fn single_gap_output(
    processed: &ProcessedDescription,
    length: f64,
    model: ReluctanceModelKind,
    constants: &Constants,
) -> Result<AirGapReluctanceOutput> {
    let central = processed
        .columns
        .iter()
        .find(|column| column.column_type == crate::core_geometry::ColumnType::Central)
        .ok_or_else(|| MagneticsError::missing_data("core has no central column"))?;

    let gap = CoreGap {
        gap_type: GapType::Additive,
        length,
        coordinates: Some(central.coordinates),
        shape: Some(central.shape),
        area: Some(central.area),
        section_dimensions: Some((central.width, central.depth)),
        distance_closest_normal_surface: Some(central.height / 2.0),
        distance_closest_parallel_surface: Some(central.width / 2.0),
    };
    reluctance::gap_reluctance(&gap, model, constants)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_geometry::{ColumnElement, ColumnType, Coordinates, GapShape, WindingWindowElement};
    use crate::material::CoreMaterial;
    use approx::assert_abs_diff_eq;

    fn pq2820_processed() -> ProcessedDescription {
        ProcessedDescription {
            effective_length: 0.0671,
            effective_area: 0.000106,
            minimum_area: 0.000106,
            effective_volume: 7.11e-6,
            outer_bounding_box: (0.03, 0.022, 0.02),
            columns: vec![ColumnElement {
                column_type: ColumnType::Central,
                area: 0.000106,
                width: 0.0116,
                depth: 0.0116,
                height: 0.02,
                coordinates: Coordinates { x: 0.0, y: 0.0, z: 0.0 },
                shape: GapShape::Round,
            }],
            winding_windows: vec![WindingWindowElement {
                area: 0.0002,
                width: 0.01,
                height: 0.02,
            }],
            thermal_resistance: None,
        }
    }

    fn air_material() -> CoreMaterial {
        CoreMaterial {
            name: "air".to_string(),
            initial_permeability: 1.0,
            ..Default::default()
        }
    }

    fn sinusoidal_current_excitation(frequency: f64, peak: f64) -> OperatingPointExcitation {
        let samples = 1024;
        let period = 1.0 / frequency;
        let time: Vec<f64> = (0..samples)
            .map(|i| period * i as f64 / samples as f64)
            .collect();
        let data: Vec<f64> = time
            .iter()
            .map(|t| peak * (2.0 * std::f64::consts::PI * frequency * t).sin())
            .collect();
        OperatingPointExcitation {
            frequency,
            current: Some(Signal {
                waveform: Some(Waveform::new(time, data).unwrap()),
                harmonics: None,
                processed: None,
            }),
            voltage: None,
            magnetizing_current: None,
            magnetic_flux_density: None,
        }
    }

    #[test]
    fn solenoid_formula_matches_air_cored_solver_within_one_percent() {
        let processed = pq2820_processed();
        let mut core = Core::new(
            crate::core_geometry::CoreShapeDataOrName::Named("PQ 28/20".to_string()),
            crate::material::CoreMaterialDataOrName::Named("air".to_string()),
            1,
            crate::core_geometry::CoreType::TwoPieceSet,
            Vec::new(),
        )
        .unwrap();
        core.processed_description = Some(processed.clone());
        let material = air_material();
        let excitation = sinusoidal_current_excitation(100_000.0, 0.1);

        let inputs = SolveInputs {
            material: &material,
            temperature: 25.0,
            number_turns: 20,
            frequency: 100_000.0,
            excitation: &excitation,
            minimum_waveform_exponent: 10,
        };
        let config = Configuration::default();
        let constants = Constants::default();

        let output = solve(&core, &inputs, &config, &constants).unwrap();
        let expected = 20.0_f64.powi(2) * constants.vacuum_permeability * processed.effective_area
            / processed.effective_length;
        let relative_error = (output.magnetizing_inductance - expected).abs() / expected;
        assert!(
            relative_error < 0.01,
            "relative error {relative_error} too large: got {}, expected {expected}",
            output.magnetizing_inductance
        );
    }

    #[test]
    fn solver_is_a_fixed_point() {
        let processed = pq2820_processed();
        let mut core = Core::new(
            crate::core_geometry::CoreShapeDataOrName::Named("PQ 28/20".to_string()),
            crate::material::CoreMaterialDataOrName::Named("air".to_string()),
            1,
            crate::core_geometry::CoreType::TwoPieceSet,
            Vec::new(),
        )
        .unwrap();
        core.processed_description = Some(processed);
        let material = air_material();
        let excitation = sinusoidal_current_excitation(100_000.0, 0.1);
        let inputs = SolveInputs {
            material: &material,
            temperature: 25.0,
            number_turns: 20,
            frequency: 100_000.0,
            excitation: &excitation,
            minimum_waveform_exponent: 10,
        };
        let config = Configuration::default();
        let constants = Constants::default();

        let first = solve(&core, &inputs, &config, &constants).unwrap();
        let second = solve(&core, &inputs, &config, &constants).unwrap();
        let relative_error = (first.magnetizing_inductance - second.magnetizing_inductance).abs()
            / first.magnetizing_inductance;
        assert!(relative_error < 0.01);
    }

    #[test]
    fn number_turns_from_inductance_round_trips_reluctance() {
        let processed = pq2820_processed();
        let mu_absolute = 2000.0 * Constants::default().vacuum_permeability;
        let constants = Constants::default();
        let turns = number_turns_from_inductance(
            &processed,
            &[],
            mu_absolute,
            1e-3,
            ReluctanceModelKind::Zhang,
            &constants,
        )
        .unwrap();
        assert!(turns >= 1);
    }

    #[test]
    fn gapping_solution_converges_within_bounds() {
        let processed = pq2820_processed();
        let mu_absolute = 2000.0 * Constants::default().vacuum_permeability;
        let constants = Constants::default();
        let solution = gapping_from_turns_and_inductance(
            &processed,
            20,
            100e-6,
            mu_absolute,
            GappingAdjustmentType::Ground,
            ReluctanceModelKind::Zhang,
            &constants,
        )
        .unwrap();
        assert!(solution.gap_lengths[0] >= 0.0);
        assert_abs_diff_eq!(
            solution.gap_lengths.iter().sum::<f64>(),
            solution.gap_lengths[0],
            epsilon = 1e-12
        );
    }
}
