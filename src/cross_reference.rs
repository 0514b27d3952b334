/*!
Cross-referencer: ranks substitute cores against a reference core under a
set of weighted, configurable filters, widening each filter's acceptance
window until enough candidates survive.
*/

use std::collections::HashMap;

use crate::config::{Configuration, ReluctanceModelKind};
use crate::constants::Constants;
use crate::core_geometry::Core;
use crate::core_losses::{self, CoreLossesInput};
use crate::error::{MagneticsError, Result};
use crate::magnetic::Magnetic;
use crate::material::{self, CoreMaterial};
use crate::operating_point::OperatingPoint;
use crate::reluctance;
use crate::waveform;

/// Per-filter normalisation and weighting knobs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FilterSettings {
    /// Normalise in log space rather than linear space.
    pub log: bool,
    /// Flip the normalised score (use when a larger raw value is "better").
    pub invert: bool,
    /// Weight this filter contributes to the accumulated rank score.
    pub weight: f64,
}

/// One scoring dimension the cross-referencer can apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScoringFilter {
    /// `1/core_reluctance`, absolute difference from the reference.
    Permeance,
    /// Total winding-window area, absolute difference.
    WindingWindowArea,
    /// Effective cross-sectional area, absolute difference.
    EffectiveArea,
    /// Outer bounding box volume, absolute difference.
    EnvelopingVolume,
    /// Core losses at the reference's operating point; rejects candidates
    /// that would saturate. Deliberately run last (most expensive).
    CoreLossesAndSaturation,
}

/// A pre-filter applied before any scoring, narrowing the candidate pool on
/// cheap, exact criteria rather than weighted distance.
#[derive(Debug, Clone, Default)]
pub struct CandidateFilter {
    /// Keep only candidates whose resolved material name is in this set, if given.
    pub allowed_material_names: Option<Vec<String>>,
    /// Keep only candidates whose outer bounding box fits within these
    /// `(width, height, depth)` maximum dimensions, if given.
    pub maximum_dimensions: Option<(f64, f64, f64)>,
}

fn passes_candidate_filter(candidate: &Magnetic, candidate_material_name: &str, filter: &CandidateFilter) -> bool {
    if let Some(allowed) = &filter.allowed_material_names {
        if !allowed.iter().any(|name| name == candidate_material_name) {
            return false;
        }
    }
    if let Some((max_w, max_h, max_d)) = filter.maximum_dimensions {
        if let Some(processed) = &candidate.core.processed_description {
            let (w, h, d) = processed.outer_bounding_box;
            if w > max_w || h > max_h || d > max_d {
                return false;
            }
        }
    }
    true
}

/// One ranked result.
#[derive(Debug, Clone, PartialEq)]
pub struct RankedCandidate {
    /// The candidate's `reference` name.
    pub reference: String,
    /// Accumulated weighted score in `[0, 1]`; lower is a better match.
    pub score: f64,
}

/// Result of a full cross-reference run.
#[derive(Debug, Clone, PartialEq)]
pub struct CrossReferenceOutput {
    /// Candidates, best match first.
    pub ranked_candidates: Vec<RankedCandidate>,
    /// The `limit` value the search stopped widening at.
    pub limit_reached: f64,
}

fn core_total_reluctance(
    core: &Core,
    material: &CoreMaterial,
    model: ReluctanceModelKind,
    constants: &Constants,
) -> Result<f64> {
    let processed = core
        .processed_description
        .as_ref()
        .ok_or_else(|| MagneticsError::core_not_processed("cross_reference"))?;
    let mu_r = material::initial_permeability(material, 25.0, None, None)?;
    let mu_absolute = mu_r * crate::constants::VACUUM_PERMEABILITY_UNITLESS;
    let ungapped = reluctance::ungapped_core_reluctance(processed, mu_absolute)?;
    let (gapping, _) = reluctance::gapping_reluctance(processed, &core.gapping, model, constants)?;
    Ok(ungapped + gapping)
}

fn winding_window_area(core: &Core) -> Result<f64> {
    let processed = core
        .processed_description
        .as_ref()
        .ok_or_else(|| MagneticsError::core_not_processed("cross_reference"))?;
    Ok(processed.winding_windows.iter().map(|window| window.area).sum())
}

fn enveloping_volume(core: &Core) -> Result<f64> {
    let processed = core
        .processed_description
        .as_ref()
        .ok_or_else(|| MagneticsError::core_not_processed("cross_reference"))?;
    let (width, height, depth) = processed.outer_bounding_box;
    Ok(width * height * depth)
}

/// `P_v`/`B_peak` check plus core-losses score for one candidate against the
/// reference's losses; `None` if the candidate saturates.
fn core_losses_and_saturation_score(
    reference_losses: f64,
    candidate_core: &Core,
    candidate_material: &CoreMaterial,
    operating_point: &OperatingPoint,
    config: &Configuration,
    constants: &Constants,
) -> Result<Option<f64>> {
    let excitation = operating_point.excitation(0)?;
    let b_signal = excitation
        .magnetic_flux_density
        .as_ref()
        .and_then(|signal| signal.waveform.as_ref())
        .ok_or_else(|| MagneticsError::missing_data("operating point has no flux density waveform"))?;
    let minimum_exponent = (config.inputs_number_points_sampled_waveforms as u32).trailing_zeros();
    let standardized = waveform::standardize_waveform(b_signal, excitation.frequency, minimum_exponent)?;
    let stats = waveform::processed(&standardized);
    let b_peak = stats.peak.abs().max((stats.peak_to_peak - stats.peak).abs());

    let saturation = material::saturation_flux_density(candidate_material, 25.0, false)?;
    if b_peak >= saturation {
        return Ok(None);
    }

    let processed = candidate_core
        .processed_description
        .as_ref()
        .ok_or_else(|| MagneticsError::core_not_processed("cross_reference"))?;
    let input = CoreLossesInput {
        material: candidate_material,
        frequency: excitation.frequency,
        magnetic_flux_density: &standardized,
        temperature: operating_point.conditions.ambient_temperature,
        effective_volume: processed.effective_volume,
        column_area: None,
        magnetizing_inductance: None,
        current_rms: None,
    };
    let output = core_losses::core_losses(config.core_losses_model, &input, constants)?;
    Ok(Some((output.core_losses - reference_losses).abs()))
}

/// Widening sequence for `limit`: step 0.25 below 1, 2.5 below 10, 25 above.
fn limit_sequence() -> impl Iterator<Item = f64> {
    std::iter::successors(Some(0.25_f64), |&limit| {
        let step = if limit < 1.0 {
            0.25
        } else if limit < 10.0 {
            2.5
        } else {
            25.0
        };
        Some(limit + step)
    })
}

/// Normalise `raw` scores into `[0, 1]`. A NaN/infinite raw score always maps
/// to the worst value (1.0); a degenerate (`max == min`) distribution
/// collapses every finite score to 1.0 too, since nothing can be preferred.
fn normalize(raw: &[f64], log: bool, invert: bool) -> Vec<f64> {
    let finite: Vec<f64> = raw.iter().copied().filter(|value| value.is_finite()).collect();
    if finite.is_empty() {
        return vec![1.0; raw.len()];
    }
    let transform = |value: f64| if log { value.max(1e-12).ln() } else { value };
    let transformed: Vec<f64> = finite.iter().copied().map(transform).collect();
    let min = transformed.iter().copied().fold(f64::INFINITY, f64::min);
    let max = transformed.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    raw.iter()
        .map(|&value| {
            if !value.is_finite() || !(max > min) {
                return 1.0;
            }
            let mut normalized = (transform(value) - min) / (max - min);
            if invert {
                normalized = 1.0 - normalized;
            }
            normalized.clamp(0.0, 1.0)
        })
        .collect()
}

/// Rank `candidates` against `reference` by the configured filters.
///
/// `candidate_materials` and `reference_material` must already be resolved
/// (the cross-referencer never resolves names itself). `candidates` should
/// not include the reference core; a reference accidentally present in the
/// pool will simply win outright (the universal "self ranks first" property).
pub fn cross_reference(
    reference: &Magnetic,
    reference_material: &CoreMaterial,
    candidates: &[Magnetic],
    candidate_materials: &[CoreMaterial],
    candidate_filter: &CandidateFilter,
    operating_point: &OperatingPoint,
    filters: &[(ScoringFilter, FilterSettings)],
    maximum_number_results: usize,
    config: &Configuration,
    constants: &Constants,
) -> Result<CrossReferenceOutput> {
    if candidates.len() != candidate_materials.len() {
        return Err(MagneticsError::invalid_input(
            "candidates and candidate_materials must have the same length",
        ));
    }

    let mut pool: Vec<usize> = (0..candidates.len())
        .filter(|&index| {
            passes_candidate_filter(&candidates[index], &candidate_materials[index].name, candidate_filter)
        })
        .collect();
    if pool.is_empty() {
        return Ok(CrossReferenceOutput {
            ranked_candidates: Vec::new(),
            limit_reached: 0.0,
        });
    }

    let reference_reluctance =
        core_total_reluctance(&reference.core, reference_material, config.gap_reluctance_model, constants)?;
    let reference_permeance = 1.0 / reference_reluctance.max(f64::MIN_POSITIVE);
    let reference_window_area = winding_window_area(&reference.core).unwrap_or(0.0);
    let reference_effective_area = reference.core.effective_area().unwrap_or(0.0);
    let reference_volume = enveloping_volume(&reference.core).unwrap_or(0.0);
    let reference_losses = {
        let input = CoreLossesInput {
            material: reference_material,
            frequency: operating_point.excitation(0)?.frequency,
            magnetic_flux_density: operating_point
                .excitation(0)?
                .magnetic_flux_density
                .as_ref()
                .and_then(|signal| signal.waveform.as_ref())
                .ok_or_else(|| MagneticsError::missing_data("reference has no flux density waveform"))?,
            temperature: operating_point.conditions.ambient_temperature,
            effective_volume: reference
                .core
                .processed_description
                .as_ref()
                .ok_or_else(|| MagneticsError::core_not_processed("cross_reference"))?
                .effective_volume,
            column_area: None,
            magnetizing_inductance: None,
            current_rms: None,
        };
        core_losses::core_losses(config.core_losses_model, &input, constants)?.core_losses
    };

    // Cheap filters' raw scores, computed once up front and reused across limits.
    let mut raw_scores: HashMap<ScoringFilter, HashMap<usize, f64>> = HashMap::new();
    for &index in &pool {
        let candidate = &candidates[index];
        let material = &candidate_materials[index];

        if let Ok(reluctance) =
            core_total_reluctance(&candidate.core, material, config.gap_reluctance_model, constants)
        {
            let permeance = 1.0 / reluctance.max(f64::MIN_POSITIVE);
            raw_scores
                .entry(ScoringFilter::Permeance)
                .or_default()
                .insert(index, (reference_permeance - permeance).abs());
        }
        if let Ok(area) = winding_window_area(&candidate.core) {
            raw_scores
                .entry(ScoringFilter::WindingWindowArea)
                .or_default()
                .insert(index, (reference_window_area - area).abs());
        }
        if let Ok(area) = candidate.core.effective_area() {
            raw_scores
                .entry(ScoringFilter::EffectiveArea)
                .or_default()
                .insert(index, (reference_effective_area - area).abs());
        }
        if let Ok(volume) = enveloping_volume(&candidate.core) {
            raw_scores
                .entry(ScoringFilter::EnvelopingVolume)
                .or_default()
                .insert(index, (reference_volume - volume).abs());
        }
    }

    let mut ranked_score: HashMap<usize, f64> = pool.iter().map(|&index| (index, 0.0)).collect();
    let mut limit_reached = 0.0;

    for limit in limit_sequence().take(200) {
        limit_reached = limit;
        let mut survivors = pool.clone();
        let mut accumulated: HashMap<usize, f64> = survivors.iter().map(|&index| (index, 0.0)).collect();

        for (filter, settings) in filters {
            if settings.weight == 0.0 {
                continue;
            }
            if *filter == ScoringFilter::CoreLossesAndSaturation {
                continue;
            }
            let Some(scores) = raw_scores.get(filter) else {
                continue;
            };
            let reference_baseline = match filter {
                ScoringFilter::Permeance => reference_permeance,
                ScoringFilter::WindingWindowArea => reference_window_area,
                ScoringFilter::EffectiveArea => reference_effective_area,
                ScoringFilter::EnvelopingVolume => reference_volume,
                ScoringFilter::CoreLossesAndSaturation => unreachable!(),
            }
            .abs()
            .max(f64::MIN_POSITIVE);

            survivors.retain(|index| {
                scores
                    .get(index)
                    .map(|score| score / reference_baseline < limit)
                    .unwrap_or(false)
            });

            let raw: Vec<f64> = survivors.iter().map(|index| scores[index]).collect();
            let normalized = normalize(&raw, settings.log, settings.invert);
            for (survivor_index, value) in survivors.iter().zip(normalized.iter()) {
                *accumulated.entry(*survivor_index).or_insert(0.0) += settings.weight * value;
            }
        }

        if let Some((_, settings)) = filters
            .iter()
            .find(|(filter, _)| *filter == ScoringFilter::CoreLossesAndSaturation)
        {
            let cap = ((maximum_number_results as f64) * 1.1).ceil() as usize;
            survivors.sort_by(|a, b| {
                accumulated[a]
                    .partial_cmp(&accumulated[b])
                    .unwrap_or(std::cmp::Ordering::Equal)
            });
            survivors.truncate(cap.max(maximum_number_results));

            let mut raw = Vec::with_capacity(survivors.len());
            let mut kept = Vec::with_capacity(survivors.len());
            for &index in &survivors {
                match core_losses_and_saturation_score(
                    reference_losses,
                    &candidates[index].core,
                    &candidate_materials[index],
                    operating_point,
                    config,
                    constants,
                ) {
                    Ok(Some(score)) => {
                        let relative = score / reference_losses.abs().max(f64::MIN_POSITIVE);
                        if relative < limit {
                            kept.push(index);
                            raw.push(score);
                        }
                    }
                    Ok(None) => {}
                    Err(_) => {}
                }
            }
            survivors = kept;
            let normalized = normalize(&raw, settings.log, settings.invert);
            for (survivor_index, value) in survivors.iter().zip(normalized.iter()) {
                *accumulated.entry(*survivor_index).or_insert(0.0) += settings.weight * value;
            }
        }

        ranked_score = accumulated;
        if survivors.len() >= maximum_number_results {
            break;
        }
    }

    let mut ranked: Vec<(usize, f64)> = ranked_score.into_iter().collect();
    ranked.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal));
    ranked.truncate(maximum_number_results.max(ranked.len().min(maximum_number_results)));

    let ranked_candidates = ranked
        .into_iter()
        .take(maximum_number_results)
        .map(|(index, score)| RankedCandidate {
            reference: candidates[index].reference.clone(),
            score,
        })
        .collect();

    Ok(CrossReferenceOutput {
        ranked_candidates,
        limit_reached,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_geometry::{Core, CoreShapeDataOrName, CoreType, ProcessedDescription};
    use crate::material::CoreMaterialDataOrName;
    use crate::waveform::{Signal, Waveform};
    use crate::operating_point::{Conditions, OperatingPointExcitation};
    use crate::winding::Coil;

    fn material_with(name: &str, permeability: f64, saturation: f64) -> CoreMaterial {
        CoreMaterial {
            name: name.to_string(),
            initial_permeability: permeability,
            saturation_flux_density_vs_temperature: vec![crate::material::Sample::new(25.0, saturation)],
            steinmetz_coefficients: vec![crate::material::SteinmetzCoefficients {
                k: 16.0,
                alpha: 1.4,
                beta: 2.6,
                ct0: 1.0,
                ct1: 0.0,
                ct2: 0.0,
                frequency_range: (0.0, 1e7),
            }],
            ..Default::default()
        }
    }

    fn core_with(effective_area: f64, effective_volume: f64, window_area: f64) -> Core {
        let mut core = Core::new(
            CoreShapeDataOrName::Named("test".to_string()),
            CoreMaterialDataOrName::Named("N87".to_string()),
            1,
            CoreType::TwoPieceSet,
            Vec::new(),
        )
        .unwrap();
        core.processed_description = Some(ProcessedDescription {
            effective_length: 0.056,
            effective_area,
            minimum_area: effective_area,
            effective_volume,
            outer_bounding_box: (0.028, 0.02, 0.028),
            columns: Vec::new(),
            winding_windows: vec![crate::core_geometry::WindingWindowElement {
                area: window_area,
                width: 0.01,
                height: 0.01,
            }],
            thermal_resistance: None,
        });
        core
    }

    fn sine_b_waveform() -> Signal {
        let samples = 64;
        let frequency = 100_000.0;
        let period = 1.0 / frequency;
        let time: Vec<f64> = (0..samples).map(|i| period * i as f64 / samples as f64).collect();
        let data: Vec<f64> = time
            .iter()
            .map(|t| 0.1 * (2.0 * std::f64::consts::PI * frequency * t).sin())
            .collect();
        Signal {
            waveform: Some(Waveform::new(time, data).unwrap()),
            harmonics: None,
            processed: None,
        }
    }

    fn operating_point_with_flux() -> OperatingPoint {
        OperatingPoint {
            excitations_per_winding: vec![OperatingPointExcitation {
                frequency: 100_000.0,
                current: None,
                voltage: None,
                magnetizing_current: None,
                magnetic_flux_density: Some(sine_b_waveform()),
            }],
            conditions: Conditions {
                ambient_temperature: 25.0,
                cooling: None,
            },
            name: None,
        }
    }

    fn magnetic_with(reference_name: &str, core: Core) -> Magnetic {
        Magnetic::new(reference_name, core, Coil::default())
    }

    #[test]
    fn limit_sequence_matches_the_documented_steps() {
        let first_values: Vec<f64> = limit_sequence().take(9).collect();
        assert_eq!(
            first_values,
            vec![0.25, 0.5, 0.75, 1.0, 3.5, 6.0, 8.5, 11.0, 36.0]
        );
    }

    #[test]
    fn normalize_collapses_degenerate_distributions_to_one() {
        let normalized = normalize(&[5.0, 5.0, 5.0], false, false);
        assert_eq!(normalized, vec![1.0, 1.0, 1.0]);
    }

    #[test]
    fn normalize_maps_nan_to_the_worst_score() {
        let normalized = normalize(&[1.0, f64::NAN, 3.0], false, false);
        assert_eq!(normalized[1], 1.0);
    }

    #[test]
    fn cross_reference_ranks_reference_included_candidate_first() {
        let reference_material = material_with("N87", 2000.0, 0.4);
        let reference = magnetic_with("reference", core_with(85.3e-6, 4.51e-7, 1e-4));

        let candidates = vec![
            magnetic_with("reference", core_with(85.3e-6, 4.51e-7, 1e-4)),
            magnetic_with("far-off", core_with(40.0e-6, 1.0e-7, 0.4e-4)),
        ];
        let candidate_materials = vec![
            material_with("N87", 2000.0, 0.4),
            material_with("N87", 2000.0, 0.4),
        ];

        let filters = vec![
            (
                ScoringFilter::Permeance,
                FilterSettings {
                    log: false,
                    invert: false,
                    weight: 0.5,
                },
            ),
            (
                ScoringFilter::EnvelopingVolume,
                FilterSettings {
                    log: false,
                    invert: false,
                    weight: 0.3,
                },
            ),
            (
                ScoringFilter::EffectiveArea,
                FilterSettings {
                    log: false,
                    invert: false,
                    weight: 0.2,
                },
            ),
        ];

        let operating_point = operating_point_with_flux();
        let config = Configuration::default();
        let constants = Constants::default();

        let output = cross_reference(
            &reference,
            &reference_material,
            &candidates,
            &candidate_materials,
            &CandidateFilter::default(),
            &operating_point,
            &filters,
            2,
            &config,
            &constants,
        )
        .unwrap();

        assert_eq!(output.ranked_candidates.len(), 2);
        assert_eq!(output.ranked_candidates[0].reference, "reference");
        for candidate in &output.ranked_candidates {
            assert!(candidate.score >= 0.0 && candidate.score <= 1.0 + 1e-9);
        }
    }

    #[test]
    fn candidate_filter_drops_disallowed_materials() {
        let reference_material = material_with("N87", 2000.0, 0.4);
        let reference = magnetic_with("reference", core_with(85.3e-6, 4.51e-7, 1e-4));
        let candidates = vec![magnetic_with("other-material", core_with(85.3e-6, 4.51e-7, 1e-4))];
        let candidate_materials = vec![material_with("3C95", 2000.0, 0.4)];

        let filter = CandidateFilter {
            allowed_material_names: Some(vec!["N87".to_string()]),
            maximum_dimensions: None,
        };

        let operating_point = operating_point_with_flux();
        let config = Configuration::default();
        let constants = Constants::default();

        let output = cross_reference(
            &reference,
            &reference_material,
            &candidates,
            &candidate_materials,
            &filter,
            &operating_point,
            &[],
            1,
            &config,
            &constants,
        )
        .unwrap();
        assert!(output.ranked_candidates.is_empty());
    }
}
