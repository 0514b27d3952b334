/*!
Core-loss engine: volumetric or mass losses for a material under a given
magnetic flux density excitation, dispatched across the Steinmetz family,
Roshen, loss-factor and proprietary manufacturer models named in spec.md §4.5.
*/

pub mod fit;

use std::collections::HashMap;
use std::sync::Mutex;

use crate::config::CoreLossesModelKind;
use crate::constants::Constants;
use crate::error::{MagneticsError, Result};
use crate::material::{self, CoreMaterial, ProprietaryCoreLossModel, SteinmetzCoefficients};
use crate::waveform::{self, Waveform};

/// Origin of a [`CoreLossesOutput`]: computed, or supplied by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Origin {
    /// Computed by [`core_losses`].
    Simulation,
    /// Supplied by the caller (e.g. a measured value).
    Specification,
}

/// Result of a core-loss calculation.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CoreLossesOutput {
    /// Total core losses, watts (`volumetric_losses * effective_volume`, or
    /// `mass_losses * mass`, depending which model produced the result).
    pub core_losses: f64,
    /// Volumetric loss density, W/m^3, if the model is volumetric.
    pub volumetric_losses: Option<f64>,
    /// Mass loss density, W/kg, if the model is mass-based (Magnetec).
    pub mass_losses: Option<f64>,
    /// Hysteresis component, W/m^3, if the model separates it out (Roshen).
    pub hysteresis_core_losses: Option<f64>,
    /// Eddy-current component, W/m^3, if the model separates it out (Roshen).
    pub eddy_current_core_losses: Option<f64>,
    /// Flux-density waveform the losses were computed from.
    pub magnetic_flux_density: Waveform,
    /// Name of the model used.
    pub method_used: &'static str,
    /// Temperature the losses were evaluated at, Celsius.
    pub temperature: f64,
    /// Whether this came from [`core_losses`] or was supplied directly.
    pub origin: Origin,
}

/// Everything [`core_losses`] needs beyond the material and model choice.
pub struct CoreLossesInput<'a> {
    pub material: &'a CoreMaterial,
    pub frequency: f64,
    /// Standardized, periodic flux-density waveform, tesla.
    pub magnetic_flux_density: &'a Waveform,
    pub temperature: f64,
    pub effective_volume: f64,
    /// Central column cross-section area, required only by the Roshen model's eddy term.
    pub column_area: Option<f64>,
    /// Magnetizing inductance, required only by the loss-factor model.
    pub magnetizing_inductance: Option<f64>,
    /// RMS current, required only by the loss-factor model.
    pub current_rms: Option<f64>,
}

/// Process-wide, append-only cache of Steinmetz coefficients fitted from
/// volumetric-loss samples, keyed by material name.
///
/// Mirrors spec.md §5: a double-fit race across threads is tolerated (it
/// costs a redundant fit, not correctness) since writes are idempotent
/// last-write-wins against the same inputs.
static FITTED_COEFFICIENTS_CACHE: Mutex<Option<HashMap<String, Vec<SteinmetzCoefficients>>>> =
    Mutex::new(None);

fn resolve_steinmetz_coefficients(
    material: &CoreMaterial,
    frequency: f64,
) -> Result<SteinmetzCoefficients> {
    if let Some(entry) = material
        .steinmetz_coefficients
        .iter()
        .find(|entry| frequency >= entry.frequency_range.0 && frequency <= entry.frequency_range.1)
    {
        return Ok(*entry);
    }
    if let Some(entry) = material.steinmetz_coefficients.first() {
        return Ok(*entry);
    }

    let mut guard = FITTED_COEFFICIENTS_CACHE
        .lock()
        .unwrap_or_else(|poison| poison.into_inner());
    let cache = guard.get_or_insert_with(HashMap::new);
    if let Some(fitted) = cache.get(&material.name) {
        if let Some(entry) = fitted
            .iter()
            .find(|entry| frequency >= entry.frequency_range.0 && frequency <= entry.frequency_range.1)
        {
            return Ok(*entry);
        }
        if let Some(entry) = fitted.first() {
            return Ok(*entry);
        }
    }

    if material.volumetric_loss_samples.is_empty() {
        return Err(MagneticsError::material_data_missing(
            "material has neither Steinmetz coefficients nor volumetric-loss samples",
        ));
    }
    let fitted = fit::fit_steinmetz_coefficients(&material.volumetric_loss_samples)?;
    cache
        .entry(material.name.clone())
        .or_insert_with(Vec::new)
        .push(fitted);
    Ok(fitted)
}

fn temperature_factor(coefficients: &SteinmetzCoefficients, temperature: f64) -> f64 {
    (coefficients.ct0 - coefficients.ct1 * temperature + coefficients.ct2 * temperature.powi(2))
        .max(0.0)
}

fn waveform_stats(b_waveform: &Waveform) -> waveform::Processed {
    waveform::processed(b_waveform)
}

/// `P_v = k * f^alpha * B_peak^beta`, with the beta>2 AC-component clause and
/// temperature polynomial applied.
fn steinmetz(coefficients: &SteinmetzCoefficients, frequency: f64, stats: &waveform::Processed, temperature: f64) -> f64 {
    let b_peak = stats.peak.abs().max(stats.peak_to_peak - stats.peak);
    let b_ac = stats.peak_to_peak / 2.0;
    let base = if coefficients.beta > 2.0 {
        coefficients.k
            * frequency.powf(coefficients.alpha)
            * b_peak.powf(coefficients.beta - 2.0)
            * b_ac.powi(2)
    } else {
        coefficients.k * frequency.powf(coefficients.alpha) * b_peak.powf(coefficients.beta)
    };
    base * temperature_factor(coefficients, temperature)
}

/// Numerically integrate `integral_0^2pi |cos(theta)|^alpha dtheta` by Simpson's rule.
fn cos_power_integral(alpha: f64) -> f64 {
    let n = 2000usize;
    let h = 2.0 * std::f64::consts::PI / n as f64;
    let f = |theta: f64| theta.cos().abs().powf(alpha);
    let mut sum = f(0.0) + f(2.0 * std::f64::consts::PI);
    for i in 1..n {
        let theta = i as f64 * h;
        let weight = if i % 2 == 0 { 2.0 } else { 4.0 };
        sum += weight * f(theta);
    }
    sum * h / 3.0
}

fn time_derivative(waveform: &Waveform) -> Vec<(f64, f64)> {
    let n = waveform.len();
    let mut derivative = Vec::with_capacity(n);
    for index in 0..n {
        let next = (index + 1) % n;
        let dt = if next == 0 {
            waveform.time[1] - waveform.time[0]
        } else {
            waveform.time[next] - waveform.time[index]
        };
        let db = waveform.data[next] - waveform.data[index];
        derivative.push((db / dt, dt));
    }
    derivative
}

/// Improved Generalized Steinmetz Equation.
fn igse(
    coefficients: &SteinmetzCoefficients,
    b_waveform: &Waveform,
    frequency: f64,
    temperature: f64,
) -> f64 {
    let stats = waveform_stats(b_waveform);
    let delta_b = stats.peak_to_peak;
    let alpha = coefficients.alpha;
    let beta = coefficients.beta;

    let integral = cos_power_integral(alpha);
    let k_i = coefficients.k
        / ((2.0 * std::f64::consts::PI).powf(alpha - 1.0) * integral * 2.0_f64.powf(beta - alpha));

    let kernel_sum: f64 = time_derivative(b_waveform)
        .iter()
        .map(|(rate, dt)| rate.abs().powf(alpha) * dt)
        .sum();

    k_i * delta_b.powf(beta - alpha) * frequency * kernel_sum * temperature_factor(coefficients, temperature)
}

/// Natural Steinmetz Equation: iGSE with a kernel normalised only by the
/// cosine-power integral (no `2^(beta-alpha)` rescaling).
fn nse(
    coefficients: &SteinmetzCoefficients,
    b_waveform: &Waveform,
    frequency: f64,
    temperature: f64,
) -> f64 {
    let stats = waveform_stats(b_waveform);
    let delta_b = stats.peak_to_peak;
    let alpha = coefficients.alpha;
    let beta = coefficients.beta;

    let integral = cos_power_integral(alpha);
    let k_n = coefficients.k / ((2.0 * std::f64::consts::PI).powf(alpha - 1.0) * integral);

    let kernel_sum: f64 = time_derivative(b_waveform)
        .iter()
        .map(|(rate, dt)| rate.abs().powf(alpha) * dt)
        .sum();

    k_n * delta_b.powf(beta - alpha) * frequency * kernel_sum * temperature_factor(coefficients, temperature)
}

/// Modified Steinmetz Equation: an equivalent sinusoidal frequency derived
/// from the waveform's time-domain slope, then Steinmetz evaluated at it.
fn mse(
    coefficients: &SteinmetzCoefficients,
    b_waveform: &Waveform,
    frequency: f64,
    temperature: f64,
) -> f64 {
    let stats = waveform_stats(b_waveform);
    let delta_b = stats.peak_to_peak;
    if delta_b == 0.0 {
        return 0.0;
    }
    let sum: f64 = time_derivative(b_waveform)
        .iter()
        .map(|(rate, dt)| rate.powi(2) * dt)
        .sum();
    let f_eq = (2.0 / (std::f64::consts::PI.powi(2) * delta_b.powi(2))) * sum;
    steinmetz(coefficients, f_eq, &stats, temperature) * (frequency / f_eq.max(f64::MIN_POSITIVE))
}

/// Albach's model: MSE-style, with the equivalent frequency built from the
/// harmonic spectrum instead of the time-domain slope.
fn albach(
    coefficients: &SteinmetzCoefficients,
    b_waveform: &Waveform,
    frequency: f64,
    temperature: f64,
) -> Result<f64> {
    let stats = waveform_stats(b_waveform);
    let delta_b = stats.peak_to_peak;
    if delta_b == 0.0 {
        return Ok(0.0);
    }
    let harmonics = waveform::calculate_harmonics_data(b_waveform, frequency)?;
    let sum: f64 = harmonics
        .harmonics
        .iter()
        .skip(1)
        .map(|harmonic| (harmonic.frequency * harmonic.amplitude).powi(2))
        .sum();
    let f_eq = (2.0 / (std::f64::consts::PI.powi(2) * delta_b.powi(2))) * sum;
    Ok(steinmetz(coefficients, f_eq, &stats, temperature) * (frequency / f_eq.max(f64::MIN_POSITIVE)))
}

/// Barg's duty-cycle correction factor, linearly interpolated between
/// `(0.1, 1.45)` and `(0.5, 1.0)` and clamped to the endpoints outside that range.
fn barg_duty_factor(duty_cycle: f64) -> f64 {
    let clamped = duty_cycle.clamp(0.1, 0.5);
    let fraction = (clamped - 0.1) / (0.5 - 0.1);
    1.45 + fraction * (1.0 - 1.45)
}

fn barg(
    coefficients: &SteinmetzCoefficients,
    b_waveform: &Waveform,
    frequency: f64,
    temperature: f64,
) -> f64 {
    let stats = waveform_stats(b_waveform);
    let factor = barg_duty_factor(stats.duty_cycle);
    steinmetz(coefficients, frequency, &stats, temperature) * factor
}

/// Roshen's model: hysteresis loop area (built analytically from the
/// branch equation `B(H) = (H+-Hc)/(a+b|H+-Hc|)`), eddy-current and excess terms.
///
/// Returns `(total_volumetric_losses, hysteresis, eddy, excess_folded_into_eddy)`.
fn roshen(
    material: &CoreMaterial,
    b_waveform: &Waveform,
    frequency: f64,
    resistivity: f64,
    column_area: f64,
    roshen_step: f64,
) -> Result<(f64, f64, f64)> {
    let coefficients = material.roshen_coefficients.ok_or_else(|| {
        MagneticsError::material_data_missing("material has no Roshen coefficients")
    })?;
    let stats = waveform_stats(b_waveform);
    let b_peak = stats.peak_to_peak / 2.0;

    if coefficients.b * b_peak >= 1.0 {
        return Err(MagneticsError::invalid_input(
            "Roshen branch coefficients produce a non-physical (non-monotone) B-H curve at this flux density",
        ));
    }

    // H_lower(B) - H_upper(B) = 2*Hc for this branch pair; integrate over
    // the B sweep to get the hysteresis loop area (joules per cubic meter per cycle).
    let steps = ((2.0 * b_peak / roshen_step.max(1e-3)).ceil() as usize).max(8);
    let db = 2.0 * b_peak / steps as f64;
    let mut loop_area = 0.0;
    for i in 0..steps {
        let b = -b_peak + (i as f64 + 0.5) * db;
        let h_lower = b * coefficients.a / (1.0 - b * coefficients.b) + coefficients.coercive_force;
        let h_upper = b * coefficients.a / (1.0 - b * coefficients.b) - coefficients.coercive_force;
        loop_area += (h_lower - h_upper) * db;
    }
    if loop_area < 0.0 {
        return Err(MagneticsError::calculation_nan(
            "roshen hysteresis loop area came out negative",
        ));
    }
    let hysteresis = loop_area * frequency;

    if resistivity <= 0.0 {
        return Err(MagneticsError::invalid_input(
            "roshen model requires a positive resistivity",
        ));
    }

    let derivative = time_derivative(b_waveform);
    let eddy_integral: f64 = derivative.iter().map(|(rate, dt)| rate.powi(2) * dt).sum();
    let eddy = (column_area / (8.0 * std::f64::consts::PI * resistivity)) * frequency * eddy_integral;

    let excess_integral: f64 = derivative
        .iter()
        .map(|(rate, dt)| rate.abs().powf(1.5) * dt)
        .sum();
    let excess = (coefficients.excess_alpha * coefficients.excess_n0 / resistivity)
        .max(0.0)
        .sqrt()
        * frequency
        * excess_integral;

    let total = hysteresis + eddy + excess;
    if total.is_nan() {
        return Err(MagneticsError::calculation_nan("roshen"));
    }
    Ok((total, hysteresis, eddy + excess))
}

/// Loss-factor model: `R_s = tan(delta) * 2*pi*f * L_mag`, `P = R_s * I_rms^2`.
fn loss_factor(material: &CoreMaterial, frequency: f64, inductance: f64, current_rms: f64) -> Result<f64> {
    let (real, imag) = material::complex_permeability(material, frequency)?;
    if real == 0.0 {
        return Err(MagneticsError::calculation_nan("loss_factor"));
    }
    let tan_delta = imag / real;
    let series_resistance = tan_delta * 2.0 * std::f64::consts::PI * frequency * inductance;
    Ok(series_resistance * current_rms.powi(2))
}

fn proprietary_volumetric(model: &ProprietaryCoreLossModel, b_peak: f64, frequency: f64) -> f64 {
    match model {
        ProprietaryCoreLossModel::Micrometals { a, b, c, d } => {
            frequency / (a * b_peak.powf(-3.0) + b * b_peak.powf(-2.3) + c * b_peak.powf(-1.65))
                + d * b_peak.powi(2) * frequency.powi(2)
        }
        ProprietaryCoreLossModel::Magnetics { a, b, c } => {
            let base = a * b_peak.powf(*b) * frequency.powf(*c);
            if *b > 2.0 {
                // Same AC-component clause as the general Steinmetz model.
                a * b_peak.powf(b - 2.0) * b_peak.powi(2) * frequency.powf(*c)
            } else {
                base
            }
        }
        ProprietaryCoreLossModel::Poco { a, b, c } => {
            1000.0
                * (a * (frequency / 1000.0) * (10.0 * b_peak).powf(*b)
                    + c * (10.0 * b_peak * frequency / 1000.0).powi(2))
        }
        ProprietaryCoreLossModel::Tdg { a, b, c, d } => {
            1000.0
                * (10.0 * b_peak).powf(*a)
                * (b * frequency / 1000.0 + c * (frequency / 1000.0).powf(*d))
        }
        ProprietaryCoreLossModel::Magnetec => 0.0,
    }
}

fn magnetec_mass_losses(b_peak: f64, frequency: f64) -> f64 {
    80.0 * (frequency / 1e5).powf(1.8) * (2.0 * b_peak / 0.3).powi(2)
}

/// Compute core losses under `model` for the excitation described by `input`.
pub fn core_losses(
    model: CoreLossesModelKind,
    input: &CoreLossesInput,
    _constants: &Constants,
) -> Result<CoreLossesOutput> {
    let stats = waveform_stats(input.magnetic_flux_density);

    let mut mass_losses = None;
    let mut hysteresis = None;
    let mut eddy = None;
    let method_used;
    let volumetric;

    match model {
        CoreLossesModelKind::Steinmetz => {
            let coefficients = resolve_steinmetz_coefficients(input.material, input.frequency)?;
            volumetric = Some(steinmetz(&coefficients, input.frequency, &stats, input.temperature));
            method_used = "steinmetz";
        }
        CoreLossesModelKind::Igse => {
            let coefficients = resolve_steinmetz_coefficients(input.material, input.frequency)?;
            volumetric = Some(igse(
                &coefficients,
                input.magnetic_flux_density,
                input.frequency,
                input.temperature,
            ));
            method_used = "igse";
        }
        CoreLossesModelKind::Mse => {
            let coefficients = resolve_steinmetz_coefficients(input.material, input.frequency)?;
            volumetric = Some(mse(
                &coefficients,
                input.magnetic_flux_density,
                input.frequency,
                input.temperature,
            ));
            method_used = "mse";
        }
        CoreLossesModelKind::Nse => {
            let coefficients = resolve_steinmetz_coefficients(input.material, input.frequency)?;
            volumetric = Some(nse(
                &coefficients,
                input.magnetic_flux_density,
                input.frequency,
                input.temperature,
            ));
            method_used = "nse";
        }
        CoreLossesModelKind::Albach => {
            let coefficients = resolve_steinmetz_coefficients(input.material, input.frequency)?;
            volumetric = Some(albach(
                &coefficients,
                input.magnetic_flux_density,
                input.frequency,
                input.temperature,
            )?);
            method_used = "albach";
        }
        CoreLossesModelKind::Barg => {
            let coefficients = resolve_steinmetz_coefficients(input.material, input.frequency)?;
            volumetric = Some(barg(
                &coefficients,
                input.magnetic_flux_density,
                input.frequency,
                input.temperature,
            ));
            method_used = "barg";
        }
        CoreLossesModelKind::Roshen => {
            let column_area = input.column_area.ok_or_else(|| {
                MagneticsError::missing_data("roshen model requires a column cross-section area")
            })?;
            let resistivity = material::resistivity(input.material, input.temperature)?;
            let (total, hyst, eddy_total) = roshen(
                input.material,
                input.magnetic_flux_density,
                input.frequency,
                resistivity,
                column_area,
                1.0,
            )?;
            volumetric = Some(total);
            hysteresis = Some(hyst);
            eddy = Some(eddy_total);
            method_used = "roshen";
        }
        CoreLossesModelKind::LossFactor => {
            let inductance = input.magnetizing_inductance.ok_or_else(|| {
                MagneticsError::missing_data("loss_factor model requires a magnetizing inductance")
            })?;
            let current_rms = input.current_rms.ok_or_else(|| {
                MagneticsError::missing_data("loss_factor model requires an RMS current")
            })?;
            let total = loss_factor(input.material, input.frequency, inductance, current_rms)?;
            let output = CoreLossesOutput {
                core_losses: total,
                volumetric_losses: None,
                mass_losses: None,
                hysteresis_core_losses: None,
                eddy_current_core_losses: None,
                magnetic_flux_density: input.magnetic_flux_density.clone(),
                method_used: "loss_factor",
                temperature: input.temperature,
                origin: Origin::Simulation,
            };
            return Ok(output);
        }
        CoreLossesModelKind::Proprietary => {
            let b_peak = stats.peak_to_peak / 2.0;
            match &input.material.proprietary_core_loss_model {
                Some(ProprietaryCoreLossModel::Magnetec) => {
                    let mass = magnetec_mass_losses(b_peak, input.frequency);
                    mass_losses = Some(mass);
                    volumetric = None;
                    method_used = "proprietary_magnetec";
                    let core_losses = mass * input.material.mass_density * input.effective_volume;
                    return Ok(CoreLossesOutput {
                        core_losses,
                        volumetric_losses: volumetric,
                        mass_losses,
                        hysteresis_core_losses: None,
                        eddy_current_core_losses: None,
                        magnetic_flux_density: input.magnetic_flux_density.clone(),
                        method_used,
                        temperature: input.temperature,
                        origin: Origin::Simulation,
                    });
                }
                Some(other) => {
                    volumetric = Some(proprietary_volumetric(other, b_peak, input.frequency));
                    method_used = "proprietary";
                }
                None => {
                    return Err(MagneticsError::material_data_missing(
                        "material has no proprietary core-loss model",
                    ));
                }
            }
        }
    }

    let volumetric_value = volumetric.ok_or_else(|| {
        MagneticsError::calculation_nan("core_losses produced no volumetric loss value")
    })?;
    if volumetric_value.is_nan() {
        return Err(MagneticsError::calculation_nan("core_losses"));
    }
    let core_losses_total = volumetric_value * input.effective_volume;

    Ok(CoreLossesOutput {
        core_losses: core_losses_total,
        volumetric_losses: volumetric,
        mass_losses,
        hysteresis_core_losses: hysteresis,
        eddy_current_core_losses: eddy,
        magnetic_flux_density: input.magnetic_flux_density.clone(),
        method_used,
        temperature: input.temperature,
        origin: Origin::Simulation,
    })
}

/// Invert the Steinmetz model for the frequency that would produce
/// `target_volumetric_losses` at a fixed `b_peak`. Closed form (quadratic in
/// `f`) is not generally available for arbitrary `alpha`, so this performs a
/// bounded bisection search, stopping early once the previous iteration's
/// error exceeds the current one (spec.md §4.5).
pub fn frequency_from_core_losses(
    material: &CoreMaterial,
    target_volumetric_losses: f64,
    b_peak: f64,
    temperature: f64,
) -> Result<f64> {
    if target_volumetric_losses <= 0.0 || b_peak <= 0.0 {
        return Err(MagneticsError::invalid_input(
            "frequency_from_core_losses requires positive targets",
        ));
    }
    let mut low = 1.0_f64;
    let mut high = 10.0e6_f64;
    let coefficients = resolve_steinmetz_coefficients(material, (low * high).sqrt())?;
    let eval = |frequency: f64| -> f64 {
        let base = coefficients.k * frequency.powf(coefficients.alpha) * b_peak.powf(coefficients.beta);
        base * temperature_factor(&coefficients, temperature)
    };

    let mut previous_error = f64::INFINITY;
    for _ in 0..100 {
        let mid = (low + high) / 2.0;
        let value = eval(mid);
        let error = (value - target_volumetric_losses).abs();
        if error > previous_error {
            return Ok(mid);
        }
        previous_error = error;
        if value < target_volumetric_losses {
            low = mid;
        } else {
            high = mid;
        }
        if (high - low) / high < 1e-6 {
            break;
        }
    }
    Ok((low + high) / 2.0)
}

/// Invert the Steinmetz model for the peak flux density that would produce
/// `target_volumetric_losses` at a fixed `frequency`.
pub fn b_peak_from_core_losses(
    material: &CoreMaterial,
    target_volumetric_losses: f64,
    frequency: f64,
    temperature: f64,
) -> Result<f64> {
    if target_volumetric_losses <= 0.0 || frequency <= 0.0 {
        return Err(MagneticsError::invalid_input(
            "b_peak_from_core_losses requires positive targets",
        ));
    }
    let coefficients = resolve_steinmetz_coefficients(material, frequency)?;
    let pre = coefficients.k
        * frequency.powf(coefficients.alpha)
        * temperature_factor(&coefficients, temperature);
    if pre <= 0.0 {
        return Err(MagneticsError::calculation_nan("b_peak_from_core_losses"));
    }
    let value = (target_volumetric_losses / pre).powf(1.0 / coefficients.beta);
    if value.is_nan() {
        return Err(MagneticsError::calculation_nan("b_peak_from_core_losses"));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn sine_b_waveform(samples: usize, frequency: f64, peak: f64) -> Waveform {
        let period = 1.0 / frequency;
        let time: Vec<f64> = (0..samples)
            .map(|i| period * i as f64 / samples as f64)
            .collect();
        let data: Vec<f64> = time
            .iter()
            .map(|t| peak * (2.0 * std::f64::consts::PI * frequency * t).sin())
            .collect();
        Waveform::new(time, data).unwrap()
    }

    fn n87_like_material() -> CoreMaterial {
        CoreMaterial {
            name: "N87".to_string(),
            initial_permeability: 2000.0,
            steinmetz_coefficients: vec![SteinmetzCoefficients {
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

    #[test]
    fn steinmetz_ring_core_scenario_matches_expected_order_of_magnitude() {
        let material = n87_like_material();
        let b_waveform = sine_b_waveform(1024, 100_000.0, 0.1);
        let input = CoreLossesInput {
            material: &material,
            frequency: 100_000.0,
            magnetic_flux_density: &b_waveform,
            temperature: 25.0,
            effective_volume: 4.51e-7,
            column_area: None,
            magnetizing_inductance: None,
            current_rms: None,
        };
        let output =
            core_losses(CoreLossesModelKind::Steinmetz, &input, &Constants::default()).unwrap();
        assert_abs_diff_eq!(output.volumetric_losses.unwrap(), 1730.0, epsilon = 50.0);
        assert_abs_diff_eq!(output.core_losses, 0.78e-3, epsilon = 0.1e-3);
    }

    #[test]
    fn steinmetz_family_reduces_to_steinmetz_for_sinusoidal_excitation() {
        let material = n87_like_material();
        let b_waveform = sine_b_waveform(1024, 100_000.0, 0.1);
        let base_input = |freq, wave: &Waveform| CoreLossesInput {
            material: &material,
            frequency: freq,
            magnetic_flux_density: wave,
            temperature: 25.0,
            effective_volume: 1.0,
            column_area: None,
            magnetizing_inductance: None,
            current_rms: None,
        };
        let steinmetz_output = core_losses(
            CoreLossesModelKind::Steinmetz,
            &base_input(100_000.0, &b_waveform),
            &Constants::default(),
        )
        .unwrap();
        let igse_output = core_losses(
            CoreLossesModelKind::Igse,
            &base_input(100_000.0, &b_waveform),
            &Constants::default(),
        )
        .unwrap();
        let relative_error = (steinmetz_output.volumetric_losses.unwrap()
            - igse_output.volumetric_losses.unwrap())
        .abs()
            / steinmetz_output.volumetric_losses.unwrap();
        assert!(relative_error < 0.15, "relative error {relative_error}");
    }

    #[test]
    fn barg_duty_factor_clamps_outside_the_table_range() {
        assert_abs_diff_eq!(barg_duty_factor(0.0), 1.45, epsilon = 1e-9);
        assert_abs_diff_eq!(barg_duty_factor(1.0), 1.0, epsilon = 1e-9);
        assert_abs_diff_eq!(barg_duty_factor(0.3), 1.225, epsilon = 1e-9);
    }

    #[test]
    fn proprietary_magnetics_matches_steinmetz_form() {
        let mut material = n87_like_material();
        material.proprietary_core_loss_model = Some(ProprietaryCoreLossModel::Magnetics {
            a: 16.0,
            b: 1.4,
            c: 2.6,
        });
        let b_waveform = sine_b_waveform(1024, 100_000.0, 0.1);
        let input = CoreLossesInput {
            material: &material,
            frequency: 100_000.0,
            magnetic_flux_density: &b_waveform,
            temperature: 25.0,
            effective_volume: 4.51e-7,
            column_area: None,
            magnetizing_inductance: None,
            current_rms: None,
        };
        let output =
            core_losses(CoreLossesModelKind::Proprietary, &input, &Constants::default()).unwrap();
        assert!(output.volumetric_losses.unwrap() > 0.0);
    }

    #[test]
    fn missing_coefficients_and_samples_is_material_data_missing() {
        let material = CoreMaterial {
            name: "empty".to_string(),
            ..Default::default()
        };
        let b_waveform = sine_b_waveform(1024, 100_000.0, 0.1);
        let input = CoreLossesInput {
            material: &material,
            frequency: 100_000.0,
            magnetic_flux_density: &b_waveform,
            temperature: 25.0,
            effective_volume: 1.0,
            column_area: None,
            magnetizing_inductance: None,
            current_rms: None,
        };
        let error =
            core_losses(CoreLossesModelKind::Steinmetz, &input, &Constants::default()).unwrap_err();
        assert_eq!(error.code(), "MATERIAL_DATA_MISSING");
    }

    #[test]
    fn core_losses_monotonic_in_temperature_when_polynomial_is_increasing() {
        let mut material = n87_like_material();
        material.steinmetz_coefficients[0].ct1 = -0.01; // losses grow with temperature
        let b_waveform = sine_b_waveform(1024, 100_000.0, 0.1);
        let low_temp_input = CoreLossesInput {
            material: &material,
            frequency: 100_000.0,
            magnetic_flux_density: &b_waveform,
            temperature: 25.0,
            effective_volume: 1.0,
            column_area: None,
            magnetizing_inductance: None,
            current_rms: None,
        };
        let high_temp_input = CoreLossesInput {
            temperature: 80.0,
            ..low_temp_input
        };
        let low = core_losses(CoreLossesModelKind::Steinmetz, &low_temp_input, &Constants::default())
            .unwrap();
        let high =
            core_losses(CoreLossesModelKind::Steinmetz, &high_temp_input, &Constants::default())
                .unwrap();
        assert!(high.volumetric_losses.unwrap() > low.volumetric_losses.unwrap());
    }

    #[test]
    fn frequency_from_core_losses_round_trips_steinmetz() {
        let material = n87_like_material();
        let target = steinmetz(
            &material.steinmetz_coefficients[0],
            100_000.0,
            &waveform::Processed {
                offset: 0.0,
                peak: 0.1,
                peak_to_peak: 0.2,
                rms: 0.0707,
                duty_cycle: 0.5,
            },
            25.0,
        );
        let frequency = frequency_from_core_losses(&material, target, 0.1, 25.0).unwrap();
        assert_abs_diff_eq!(frequency, 100_000.0, epsilon = 100_000.0 * 0.05);
    }
}
