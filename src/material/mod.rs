/*!
Material property lookups exposed as pure functions of
`(material, temperature, bias?, frequency?)`.

A [`CoreMaterial`] is a plain bag of measured curves (permeability vs.
temperature / H-bias / frequency, saturation flux density vs. temperature,
resistivity vs. temperature). The functions in this module turn those curves
into the actual physical quantity a caller wants, handling the degenerate
cases (0, 1, 2 or 3+ samples) and the synthesised complex-permeability model
when only a frequency curve is available.
*/

use akima_spline::AkimaSpline;

use crate::error::{MagneticsError, Result};

/// One permeability-vs-temperature, -vs-bias or -vs-frequency sample.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Sample {
    /// Independent variable (temperature in °C, H-bias in A/m, or frequency in Hz).
    pub x: f64,
    /// Dependent variable.
    pub y: f64,
}

impl Sample {
    /// Build a new sample point.
    pub fn new(x: f64, y: f64) -> Self {
        Sample { x, y }
    }
}

/// Steinmetz (and temperature-correction) coefficients for the core-loss engine.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SteinmetzCoefficients {
    /// Pre-factor `k`.
    pub k: f64,
    /// Frequency exponent `alpha`.
    pub alpha: f64,
    /// Flux density exponent `beta`.
    pub beta: f64,
    /// Temperature correction constant term. Defaults to 1.
    pub ct0: f64,
    /// Temperature correction linear term.
    pub ct1: f64,
    /// Temperature correction quadratic term.
    pub ct2: f64,
    /// Frequency range this fit is valid over, inclusive, hertz.
    pub frequency_range: (f64, f64),
}

/// A single volumetric-loss measurement used to fit [`SteinmetzCoefficients`].
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VolumetricLossSample {
    /// Excitation frequency, hertz.
    pub frequency: f64,
    /// Peak flux density, tesla.
    pub flux_density_peak: f64,
    /// Measured volumetric losses, W/m^3.
    pub volumetric_losses: f64,
}

/// Coefficients for the Roshen hysteresis + eddy + excess loss model.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RoshenCoefficients {
    /// Coercive field strength, A/m.
    pub coercive_force: f64,
    /// Remanent flux density, tesla.
    pub remanence: f64,
    /// Saturation flux density used by the loop model, tesla.
    pub saturation: f64,
    /// `a` coefficient of `B(H) = (H+Hc)/(a+b|H+Hc|)`.
    pub a: f64,
    /// `b` coefficient of the same branch equation.
    pub b: f64,
    /// Excess-loss pre-factor `N0`.
    pub excess_n0: f64,
    /// Excess-loss exponent constant `alpha` (distinct from Steinmetz's `alpha`).
    pub excess_alpha: f64,
}

/// Manufacturer-declared closed-form loss equation, bit-exact per datasheet.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ProprietaryCoreLossModel {
    /// `P_v = f/(a*B^-3 + b*B^-2.3 + c*B^-1.65) + d*B^2*f^2`.
    Micrometals { a: f64, b: f64, c: f64, d: f64 },
    /// `P_v = a*B^b*f^c`.
    Magnetics { a: f64, b: f64, c: f64 },
    /// `P_v = 1000*(a*(f/1000)*(10B)^b + c*(10B*f/1000)^2)`.
    Poco { a: f64, b: f64, c: f64 },
    /// `P_v = 1000*(10B)^a*(b*f/1000 + c*(f/1000)^d)`.
    Tdg { a: f64, b: f64, c: f64, d: f64 },
    /// `P_m = 80*(f/1e5)^1.8*(2B/0.3)^2`, mass losses (W/kg).
    Magnetec,
}

/// Measured properties of a magnetic core material.
///
/// Only the curves actually present drive the lookups in this module; a
/// curve with no samples simply means the corresponding function has
/// nothing to look up and returns [`MagneticsError::MaterialDataMissing`].
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CoreMaterial {
    /// Name of the material, as resolved by the shape/material lookup.
    pub name: String,
    /// Initial (low-field) relative permeability at the reference temperature.
    pub initial_permeability: f64,
    /// Initial permeability vs. temperature, °C.
    pub permeability_vs_temperature: Vec<Sample>,
    /// Initial permeability vs. DC field bias, A/m.
    pub permeability_vs_bias: Vec<Sample>,
    /// Initial permeability vs. frequency, Hz.
    pub permeability_vs_frequency: Vec<Sample>,
    /// Saturation flux density vs. temperature, tesla at each °C sample.
    pub saturation_flux_density_vs_temperature: Vec<Sample>,
    /// Resistivity vs. temperature, ohm*meter at each °C sample.
    pub resistivity_vs_temperature: Vec<Sample>,
    /// Fitted or datasheet Steinmetz coefficients, one entry per validity range.
    pub steinmetz_coefficients: Vec<SteinmetzCoefficients>,
    /// Raw volumetric-loss measurements used to fit [`Self::steinmetz_coefficients`]
    /// when the material does not declare them directly.
    pub volumetric_loss_samples: Vec<VolumetricLossSample>,
    /// Manufacturer-proprietary loss model, if declared.
    pub proprietary_core_loss_model: Option<ProprietaryCoreLossModel>,
    /// Mass density, kg/m^3, used by mass-loss models.
    pub mass_density: f64,
    /// Roshen hysteresis/eddy/excess model coefficients, if declared.
    pub roshen_coefficients: Option<RoshenCoefficients>,
}

/// A material reference: either a name resolved against an external lookup,
/// or an inline definition carried by the caller.
///
/// The core never opens files; resolving a [`CoreMaterialDataOrName::Named`]
/// variant is the caller's responsibility via `find_core_material_by_name`.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CoreMaterialDataOrName {
    /// Name to be resolved externally.
    Named(String),
    /// Fully inlined material data.
    Inline(CoreMaterial),
}

impl CoreMaterialDataOrName {
    /// Resolve to a [`CoreMaterial`], calling `lookup` if this is a [`Self::Named`] reference.
    pub fn resolve(&self, lookup: impl Fn(&str) -> Option<CoreMaterial>) -> Result<CoreMaterial> {
        match self {
            CoreMaterialDataOrName::Named(name) => lookup(name).ok_or_else(|| {
                MagneticsError::missing_data(format!("no material named '{name}'"))
            }),
            CoreMaterialDataOrName::Inline(material) => Ok(material.clone()),
        }
    }
}

/// Build an interpolator over `samples` per the spline rule:
/// 0 samples is an error, 1 sample is constant, 2 is linear, 3+ is a monotone
/// Akima spline over deduplicated, sorted abscissae.
fn build_interpolator(samples: &[Sample], context: &str) -> Result<Interpolator> {
    if samples.is_empty() {
        return Err(MagneticsError::material_data_missing(context.to_string()));
    }
    let mut sorted = samples.to_vec();
    sorted.sort_by(|a, b| a.x.partial_cmp(&b.x).unwrap());
    sorted.dedup_by(|a, b| a.x == b.x);

    match sorted.len() {
        1 => Ok(Interpolator::Constant(sorted[0].y)),
        2 => Ok(Interpolator::Linear(sorted[0], sorted[1])),
        _ => {
            let xs: Vec<f64> = sorted.iter().map(|s| s.x).collect();
            let ys: Vec<f64> = sorted.iter().map(|s| s.y).collect();
            let spline = AkimaSpline::new(xs, ys, None, None)?;
            Ok(Interpolator::Spline(spline))
        }
    }
}

enum Interpolator {
    Constant(f64),
    Linear(Sample, Sample),
    Spline(AkimaSpline),
}

impl Interpolator {
    fn eval(&self, x: f64) -> f64 {
        match self {
            Interpolator::Constant(y) => *y,
            Interpolator::Linear(a, b) => {
                let fraction = (x - a.x) / (b.x - a.x);
                a.y + fraction * (b.y - a.y)
            }
            Interpolator::Spline(spline) => spline.eval_infallible(x),
        }
    }
}

/// Default safety factor applied to [`saturation_flux_density`] when `proportion` is set.
pub const DEFAULT_SATURATION_SAFETY_FACTOR: f64 = 0.9;

/// Initial permeability of `material` at `temperature`, optionally corrected
/// for DC field bias and/or frequency.
///
/// Bias correction (if the material carries a `permeability_vs_bias` curve)
/// is applied multiplicatively against the curve's value at zero bias, and
/// clamped to never go below 1 (a material cannot have negative-going
/// absolute permeability).
pub fn initial_permeability(
    material: &CoreMaterial,
    temperature: f64,
    h_dc_bias: Option<f64>,
    frequency: Option<f64>,
) -> Result<f64> {
    let mut value = if material.permeability_vs_temperature.is_empty() {
        material.initial_permeability
    } else {
        build_interpolator(&material.permeability_vs_temperature, "permeability_vs_temperature")?
            .eval(temperature)
    };

    if let (Some(bias), false) = (h_dc_bias, material.permeability_vs_bias.is_empty()) {
        let interpolator = build_interpolator(&material.permeability_vs_bias, "permeability_vs_bias")?;
        let zero_bias = interpolator.eval(0.0);
        let at_bias = interpolator.eval(bias);
        if zero_bias != 0.0 {
            value = (value * at_bias / zero_bias).max(1.0);
        }
    }

    if let (Some(freq), false) = (frequency, material.permeability_vs_frequency.is_empty()) {
        let interpolator =
            build_interpolator(&material.permeability_vs_frequency, "permeability_vs_frequency")?;
        let zero_freq = interpolator.eval(material.permeability_vs_frequency[0].x);
        let at_freq = interpolator.eval(freq);
        if zero_freq != 0.0 {
            value = (value * at_freq / zero_freq).max(1.0);
        }
    }

    if value.is_nan() {
        return Err(MagneticsError::calculation_nan("initial_permeability"));
    }
    Ok(value)
}

/// Saturation flux density of `material` at `temperature`, tesla.
///
/// When `proportion` is `true`, the result is scaled by
/// [`DEFAULT_SATURATION_SAFETY_FACTOR`] to leave margin before the knee of
/// the B-H curve.
pub fn saturation_flux_density(
    material: &CoreMaterial,
    temperature: f64,
    proportion: bool,
) -> Result<f64> {
    let interpolator = build_interpolator(
        &material.saturation_flux_density_vs_temperature,
        "saturation_flux_density_vs_temperature",
    )?;
    let mut value = interpolator.eval(temperature);
    if proportion {
        value *= DEFAULT_SATURATION_SAFETY_FACTOR;
    }
    if value.is_nan() {
        return Err(MagneticsError::calculation_nan("saturation_flux_density"));
    }
    Ok(value)
}

/// Electrical resistivity of `material` at `temperature`, ohm*meter.
pub fn resistivity(material: &CoreMaterial, temperature: f64) -> Result<f64> {
    let interpolator =
        build_interpolator(&material.resistivity_vs_temperature, "resistivity_vs_temperature")?;
    let value = interpolator.eval(temperature);
    if value.is_nan() {
        return Err(MagneticsError::calculation_nan("resistivity"));
    }
    Ok(value)
}

/// Complex relative permeability `(real, imag)` of `material` at `frequency`.
///
/// If the material only carries an initial-permeability-vs-frequency curve
/// (no directly measured complex permeability), it is synthesised with the
/// standard eddy-current skin model, normalised against the frequency at
/// which the real part has dropped to 67.78% of its DC value.
pub fn complex_permeability(material: &CoreMaterial, frequency: f64) -> Result<(f64, f64)> {
    if material.permeability_vs_frequency.len() < 2 {
        return Err(MagneticsError::material_data_missing(
            "complex_permeability requires a permeability_vs_frequency curve",
        ));
    }
    let interpolator =
        build_interpolator(&material.permeability_vs_frequency, "permeability_vs_frequency")?;
    let dc_value = interpolator.eval(0.0);
    if dc_value == 0.0 {
        return Err(MagneticsError::calculation_nan("complex_permeability"));
    }
    let target = dc_value * 0.6778;

    let f_6778 = find_frequency_at_value(&material.permeability_vs_frequency, target)
        .ok_or_else(|| MagneticsError::material_data_missing("no 67.78% rolloff frequency found"))?;

    let x = frequency / f_6778;
    if x <= 0.0 {
        return Ok((dc_value, 0.0));
    }
    let sqrt2x = 2.0 * x.sqrt();
    let denom = sqrt2x * (sqrt2x.cos() + sqrt2x.cosh());
    if denom == 0.0 {
        return Err(MagneticsError::calculation_nan("complex_permeability"));
    }
    let real = dc_value * (sqrt2x.sin() + sqrt2x.sinh()) / denom;
    let imag = -dc_value * (sqrt2x.sin() - sqrt2x.sinh()) / denom;

    if real.is_nan() || imag.is_nan() {
        return Err(MagneticsError::calculation_nan("complex_permeability"));
    }
    Ok((real, imag))
}

fn find_frequency_at_value(samples: &[Sample], target: f64) -> Option<f64> {
    let mut sorted = samples.to_vec();
    sorted.sort_by(|a, b| a.x.partial_cmp(&b.x).unwrap());
    for window in sorted.windows(2) {
        let (a, b) = (window[0], window[1]);
        if (a.y - target) * (b.y - target) <= 0.0 && a.y != b.y {
            let fraction = (target - a.y) / (b.y - a.y);
            return Some(a.x + fraction * (b.x - a.x));
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn material_with_temperature_curve() -> CoreMaterial {
        CoreMaterial {
            name: "3C95".to_string(),
            initial_permeability: 3000.0,
            permeability_vs_temperature: vec![
                Sample::new(25.0, 3000.0),
                Sample::new(60.0, 3200.0),
                Sample::new(100.0, 2800.0),
            ],
            saturation_flux_density_vs_temperature: vec![
                Sample::new(25.0, 0.53),
                Sample::new(100.0, 0.43),
            ],
            resistivity_vs_temperature: vec![Sample::new(25.0, 5.0)],
            ..Default::default()
        }
    }

    #[test]
    fn initial_permeability_uses_spline_over_three_plus_samples() {
        let material = material_with_temperature_curve();
        let value = initial_permeability(&material, 60.0, None, None).unwrap();
        assert_abs_diff_eq!(value, 3200.0, epsilon = 1e-6);
    }

    #[test]
    fn initial_permeability_uses_linear_for_two_samples() {
        let material = material_with_temperature_curve();
        let value = initial_permeability(&material, 62.5, None, None).unwrap();
        assert!(value.is_finite());
    }

    #[test]
    fn saturation_flux_density_applies_safety_factor() {
        let material = material_with_temperature_curve();
        let raw = saturation_flux_density(&material, 25.0, false).unwrap();
        let scaled = saturation_flux_density(&material, 25.0, true).unwrap();
        assert_abs_diff_eq!(raw, 0.53, epsilon = 1e-9);
        assert_abs_diff_eq!(scaled, 0.53 * DEFAULT_SATURATION_SAFETY_FACTOR, epsilon = 1e-9);
    }

    #[test]
    fn resistivity_with_single_sample_is_constant() {
        let material = material_with_temperature_curve();
        assert_abs_diff_eq!(resistivity(&material, 25.0).unwrap(), 5.0, epsilon = 1e-9);
        assert_abs_diff_eq!(resistivity(&material, 90.0).unwrap(), 5.0, epsilon = 1e-9);
    }

    #[test]
    fn missing_curve_is_material_data_missing() {
        let material = CoreMaterial::default();
        let error = saturation_flux_density(&material, 25.0, false).unwrap_err();
        assert_eq!(error.code(), "MATERIAL_DATA_MISSING");
    }

    #[test]
    fn complex_permeability_rolls_off_past_the_6778_frequency() {
        let material = CoreMaterial {
            permeability_vs_frequency: vec![
                Sample::new(0.0, 3000.0),
                Sample::new(1_000_000.0, 2034.0),
                Sample::new(5_000_000.0, 500.0),
            ],
            ..Default::default()
        };
        let (real_low, _) = complex_permeability(&material, 1000.0).unwrap();
        let (real_high, imag_high) = complex_permeability(&material, 5_000_000.0).unwrap();
        assert!(real_low > real_high);
        assert!(imag_high.abs() > 0.0);
    }

    #[test]
    fn named_resolves_via_lookup() {
        let reference = CoreMaterialDataOrName::Named("3C95".to_string());
        let resolved = reference
            .resolve(|name| {
                if name == "3C95" {
                    Some(material_with_temperature_curve())
                } else {
                    None
                }
            })
            .unwrap();
        assert_eq!(resolved.name, "3C95");
    }

    #[test]
    fn named_missing_fails_with_missing_data() {
        let reference = CoreMaterialDataOrName::Named("unknown".to_string());
        let error = reference.resolve(|_| None).unwrap_err();
        assert_eq!(error.code(), "MISSING_DATA");
    }
}
