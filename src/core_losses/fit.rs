/*!
Steinmetz coefficient fitter: derives `(k, alpha, beta)` from a material's
raw volumetric-loss samples when it does not declare them directly.

Grounded on `stem_material::iron_losses::jordan_model::IronLossData::solve_for_coefficients`:
a `CostFunction` wrapping the measured samples, minimized with
`argmin::solver::neldermead::NelderMead` from several starting simplices.
Unlike the Jordan model's direct-space fit, spec.md §4.5 calls for a fit "in
log space", so the cost function compares `log(P_predicted)` against
`log(P_measured)` rather than raw watts.
*/

use argmin::core::{CostFunction, Executor, State};
use argmin::solver::neldermead::NelderMead;

use crate::error::{MagneticsError, Result};
use crate::material::{SteinmetzCoefficients, VolumetricLossSample};

/// Minimum sample count below which a 3-unknown `(k, alpha, beta)` fit is
/// considered unreliable and its frequency-range chunk should be merged
/// with a neighbour (spec.md §4.5).
pub const MINIMUM_SAMPLES_THREE_UNKNOWNS: usize = 4;

/// Minimum sample count for a 6-unknown fit that also recovers the
/// temperature-correction polynomial `(Ct0, Ct1, Ct2)`.
pub const MINIMUM_SAMPLES_SIX_UNKNOWNS: usize = 7;

struct LogSpaceCost<'a> {
    samples: &'a [VolumetricLossSample],
}

impl CostFunction for LogSpaceCost<'_> {
    type Param = Vec<f64>;
    type Output = f64;

    fn cost(&self, p: &Self::Param) -> std::result::Result<Self::Output, argmin::core::Error> {
        let (log_k, alpha, beta) = (p[0], p[1], p[2]);
        let mut error = 0.0;
        for sample in self.samples {
            if sample.volumetric_losses <= 0.0
                || sample.frequency <= 0.0
                || sample.flux_density_peak <= 0.0
            {
                continue;
            }
            let predicted_log =
                log_k + alpha * sample.frequency.ln() + beta * sample.flux_density_peak.ln();
            let measured_log = sample.volumetric_losses.ln();
            error += (predicted_log - measured_log).powi(2);
        }
        Ok(error)
    }
}

/// Fit Steinmetz coefficients to `samples` by least-squares in log space.
///
/// Requires at least [`MINIMUM_SAMPLES_THREE_UNKNOWNS`] samples; the caller
/// is responsible for merging undersized frequency-range chunks with a
/// neighbour before calling this (spec.md §4.5's chunk-merging rule).
pub fn fit_steinmetz_coefficients(
    samples: &[VolumetricLossSample],
) -> Result<SteinmetzCoefficients> {
    if samples.len() < MINIMUM_SAMPLES_THREE_UNKNOWNS {
        return Err(MagneticsError::material_data_missing(format!(
            "steinmetz fit requires at least {MINIMUM_SAMPLES_THREE_UNKNOWNS} samples, got {}",
            samples.len()
        )));
    }

    let cost = LogSpaceCost { samples };

    // Four starting points in (log k, alpha, beta) space form the simplex
    // NelderMead needs for a 3-unknown fit.
    let start_values = vec![
        vec![0.0_f64, 1.3, 2.5],
        vec![2.0_f64, 1.5, 2.0],
        vec![-2.0_f64, 1.0, 3.0],
        vec![1.0_f64, 1.8, 2.7],
    ];

    let solver = NelderMead::new(start_values)
        .with_sd_tolerance(1e-6)
        .map_err(|error| {
            MagneticsError::calculation_nan(format!("steinmetz fit solver setup: {error}"))
        })?;

    let result = Executor::new(cost, solver)
        .configure(|state| state.max_iters(500))
        .run()
        .map_err(|error| MagneticsError::calculation_nan(format!("steinmetz fit: {error}")))?;

    let best = result
        .state
        .get_best_param()
        .ok_or_else(|| MagneticsError::calculation_nan("steinmetz fit produced no parameters"))?;

    let k = best[0].exp();
    let alpha = best[1];
    let beta = best[2];
    if !k.is_finite() || !alpha.is_finite() || !beta.is_finite() {
        return Err(MagneticsError::calculation_nan("steinmetz fit"));
    }

    let frequency_range = samples.iter().fold((f64::INFINITY, 0.0_f64), |range, sample| {
        (range.0.min(sample.frequency), range.1.max(sample.frequency))
    });

    Ok(SteinmetzCoefficients {
        k,
        alpha,
        beta,
        ct0: 1.0,
        ct1: 0.0,
        ct2: 0.0,
        frequency_range,
    })
}

/// Partition `samples` into contiguous frequency-range chunks by
/// `boundaries` (sorted ascending), merging any chunk smaller than
/// `minimum_chunk_size` into its neighbour, per spec.md §4.5.
pub fn partition_by_frequency_range(
    samples: &[VolumetricLossSample],
    boundaries: &[f64],
    minimum_chunk_size: usize,
) -> Vec<Vec<VolumetricLossSample>> {
    let mut chunks: Vec<Vec<VolumetricLossSample>> = vec![Vec::new(); boundaries.len() + 1];
    for sample in samples {
        let index = boundaries
            .iter()
            .position(|&boundary| sample.frequency < boundary)
            .unwrap_or(boundaries.len());
        chunks[index].push(*sample);
    }

    let mut merged: Vec<Vec<VolumetricLossSample>> = Vec::new();
    for chunk in chunks {
        if chunk.len() < minimum_chunk_size && !merged.is_empty() {
            merged.last_mut().unwrap().extend(chunk);
        } else if chunk.is_empty() {
            continue;
        } else {
            merged.push(chunk);
        }
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn synthetic_samples(k: f64, alpha: f64, beta: f64) -> Vec<VolumetricLossSample> {
        let mut samples = Vec::new();
        for &frequency in &[50e3, 100e3, 200e3, 400e3, 800e3] {
            for &flux in &[0.05, 0.1, 0.15] {
                let losses = k * frequency.powf(alpha) * flux.powf(beta);
                samples.push(VolumetricLossSample {
                    frequency,
                    flux_density_peak: flux,
                    volumetric_losses: losses,
                });
            }
        }
        samples
    }

    #[test]
    fn fit_recovers_known_coefficients() {
        let samples = synthetic_samples(16.0, 1.4, 2.6);
        let fitted = fit_steinmetz_coefficients(&samples).unwrap();
        assert_abs_diff_eq!(fitted.k, 16.0, epsilon = 0.5);
        assert_abs_diff_eq!(fitted.alpha, 1.4, epsilon = 0.05);
        assert_abs_diff_eq!(fitted.beta, 2.6, epsilon = 0.05);
    }

    #[test]
    fn too_few_samples_is_material_data_missing() {
        let samples = vec![VolumetricLossSample {
            frequency: 100e3,
            flux_density_peak: 0.1,
            volumetric_losses: 1000.0,
        }];
        let error = fit_steinmetz_coefficients(&samples).unwrap_err();
        assert_eq!(error.code(), "MATERIAL_DATA_MISSING");
    }

    #[test]
    fn partition_merges_undersized_chunks() {
        let samples = synthetic_samples(16.0, 1.4, 2.6);
        let chunks = partition_by_frequency_range(&samples, &[150e3], 4);
        assert!(chunks.iter().all(|chunk| chunk.len() >= 4));
    }
}
