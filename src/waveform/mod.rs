/*!
Normalisation and analysis of time-domain signals.

Every downstream physical model (reluctance, inductance, core losses,
winding losses) consumes a common [`Signal`] representation instead of raw
samples, so the rest of the stack never has to special-case "what if the
caller gave us a non-uniform time base".
*/

use rustfft::FftPlanner;
use rustfft::num_complex::Complex64;

use crate::error::{MagneticsError, Result};

/// A raw time-domain sample set: `time[i]` paired with `data[i]`.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Waveform {
    /// Sample times, seconds, strictly increasing, `time[0] == 0`.
    pub time: Vec<f64>,
    /// Sample values, same length as `time`.
    pub data: Vec<f64>,
}

impl Waveform {
    /// Build a waveform, checking the invariants the rest of the stack relies on.
    pub fn new(time: Vec<f64>, data: Vec<f64>) -> Result<Self> {
        if time.len() != data.len() {
            return Err(MagneticsError::invalid_input(format!(
                "waveform time ({}) and data ({}) lengths differ",
                time.len(),
                data.len()
            )));
        }
        if time.len() < 2 {
            return Err(MagneticsError::invalid_input(
                "waveform must have at least 2 samples",
            ));
        }
        if time[0] != 0.0 {
            return Err(MagneticsError::invalid_input(
                "waveform time must start at 0",
            ));
        }
        for window in time.windows(2) {
            if window[1] <= window[0] {
                return Err(MagneticsError::invalid_input(
                    "waveform time must be strictly increasing",
                ));
            }
        }
        Ok(Waveform { time, data })
    }

    /// Number of samples.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether there are no samples (never true for a validly-constructed waveform).
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// One harmonic component of a [`Harmonics`] spectrum.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Harmonic {
    /// Harmonic frequency, `k * fundamental`, hertz.
    pub frequency: f64,
    /// Amplitude (not RMS) of this harmonic.
    pub amplitude: f64,
    /// Phase of this harmonic, radians.
    pub phase: f64,
}

/// Frequency-domain description of a [`Waveform`]: one entry per harmonic, index 0 is DC.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Harmonics {
    /// Harmonics, ordered by increasing frequency, index 0 is DC.
    pub harmonics: Vec<Harmonic>,
}

impl Harmonics {
    /// Drop harmonics whose amplitude is below `threshold` times the fundamental's,
    /// keeping DC and the fundamental regardless.
    pub fn thresholded(&self, threshold: f64) -> Harmonics {
        let fundamental = self
            .harmonics
            .get(1)
            .map(|harmonic| harmonic.amplitude)
            .unwrap_or(0.0);
        if fundamental == 0.0 {
            return self.clone();
        }
        let kept = self
            .harmonics
            .iter()
            .enumerate()
            .filter(|(index, harmonic)| {
                *index < 2 || harmonic.amplitude / fundamental >= threshold
            })
            .map(|(_, harmonic)| *harmonic)
            .collect();
        Harmonics { harmonics: kept }
    }
}

/// Scalar summary statistics of a [`Waveform`], as returned by [`processed`].
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Processed {
    /// Mean value of the samples.
    pub offset: f64,
    /// Maximum sample value.
    pub peak: f64,
    /// `max - min` over the samples.
    pub peak_to_peak: f64,
    /// L2 norm of the samples, normalised by the sample count.
    pub rms: f64,
    /// Fraction of samples at or above the offset.
    pub duty_cycle: f64,
}

/// A signal as carried in `OperatingPointExcitation`: a waveform, its harmonic
/// content, and/or its scalar summary. Any subset may be populated depending
/// on how the caller obtained the excitation.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Signal {
    /// Sampled time-domain waveform, if available.
    pub waveform: Option<Waveform>,
    /// Harmonic decomposition, if available.
    pub harmonics: Option<Harmonics>,
    /// Scalar summary, if available.
    pub processed: Option<Processed>,
}

/// Ensure `waveform` covers exactly one period of `frequency`, has a sample
/// count that is a power of two of at least `2^minimum_exponent`, and a
/// uniform strictly-increasing time base starting at zero.
///
/// `minimum_exponent` is the configured `M` (default 10, i.e. 1024 samples).
pub fn standardize_waveform(
    waveform: &Waveform,
    frequency: f64,
    minimum_exponent: u32,
) -> Result<Waveform> {
    if frequency <= 0.0 {
        return Err(MagneticsError::invalid_input(
            "standardize_waveform requires a positive frequency",
        ));
    }
    let period = 1.0 / frequency;
    let minimum_samples = 1usize << minimum_exponent;
    let target_samples = waveform.len().max(minimum_samples).next_power_of_two();

    let mut time = Vec::with_capacity(target_samples);
    let mut data = Vec::with_capacity(target_samples);
    for index in 0..target_samples {
        let t = period * (index as f64) / (target_samples as f64);
        time.push(t);
        data.push(interpolate_periodic(waveform, period, t));
    }
    Waveform::new(time, data)
}

fn interpolate_periodic(waveform: &Waveform, period: f64, t: f64) -> f64 {
    let n = waveform.time.len();
    if n == 1 {
        return waveform.data[0];
    }
    let wrapped = t.rem_euclid(period);
    match waveform
        .time
        .binary_search_by(|probe| probe.partial_cmp(&wrapped).unwrap())
    {
        Ok(index) => waveform.data[index],
        Err(0) => waveform.data[0],
        Err(index) if index >= n => waveform.data[n - 1],
        Err(index) => {
            let (t0, t1) = (waveform.time[index - 1], waveform.time[index]);
            let (y0, y1) = (waveform.data[index - 1], waveform.data[index]);
            let fraction = (wrapped - t0) / (t1 - t0);
            y0 + fraction * (y1 - y0)
        }
    }
}

/// Real FFT over `sampled_waveform`, returning one harmonic per bin `0..=N/2`.
///
/// Requires `sampled_waveform.len()` to be a power of two; use
/// [`standardize_waveform`] first if it is not already.
pub fn calculate_harmonics_data(sampled_waveform: &Waveform, frequency: f64) -> Result<Harmonics> {
    let n = sampled_waveform.len();
    if n == 0 || (n & (n - 1)) != 0 {
        return Err(MagneticsError::invalid_input(
            "calculate_harmonics_data requires a power-of-two sample count",
        ));
    }

    let mut buffer: Vec<Complex64> = sampled_waveform
        .data
        .iter()
        .map(|&value| Complex64::new(value, 0.0))
        .collect();

    let mut planner = FftPlanner::<f64>::new();
    let fft = planner.plan_fft_forward(n);
    fft.process(&mut buffer);

    let bins = n / 2 + 1;
    let mut harmonics = Vec::with_capacity(bins);
    for (k, bin) in buffer.iter().take(bins).enumerate() {
        let scale = if k == 0 || k == n / 2 { 1.0 } else { 2.0 };
        let amplitude = scale * bin.norm() / (n as f64);
        let phase = bin.arg();
        harmonics.push(Harmonic {
            frequency: (k as f64) * frequency,
            amplitude,
            phase,
        });
    }

    Ok(Harmonics { harmonics })
}

/// Summarise `waveform` into its scalar statistics.
///
/// `is_current_like` selects whether the duty cycle is computed (voltage
/// square waves and switch-node waveforms have a meaningful duty cycle;
/// smoothly varying inductor currents do not, but the fraction above the
/// offset is still well defined and returned regardless).
pub fn processed(waveform: &Waveform) -> Processed {
    let n = waveform.data.len() as f64;
    let offset = waveform.data.iter().sum::<f64>() / n;
    let peak = waveform
        .data
        .iter()
        .cloned()
        .fold(f64::NEG_INFINITY, f64::max);
    let min = waveform.data.iter().cloned().fold(f64::INFINITY, f64::min);
    let peak_to_peak = peak - min;
    let rms = (waveform.data.iter().map(|value| value * value).sum::<f64>() / n).sqrt();
    let above_offset = waveform
        .data
        .iter()
        .filter(|&&value| value >= offset)
        .count();
    let duty_cycle = above_offset as f64 / n;

    Processed {
        offset,
        peak,
        peak_to_peak,
        rms,
        duty_cycle,
    }
}

/// Derive the induced voltage waveform `v = L di/dt` for a winding driven by
/// `current` through magnetizing inductance `inductance`.
///
/// Grounded on the original stack's `calculate_induced_voltage`: differences
/// are taken between consecutive standardized samples and wrapped around the
/// period so the result itself is a valid periodic waveform.
pub fn induced_voltage(current: &Waveform, inductance: f64) -> Result<Waveform> {
    let n = current.len();
    let mut data = Vec::with_capacity(n);
    for index in 0..n {
        let next = (index + 1) % n;
        let dt = if next == 0 {
            current.time[1] - current.time[0]
        } else {
            current.time[next] - current.time[index]
        };
        let di = current.data[next] - current.data[index];
        data.push(inductance * di / dt);
    }
    Waveform::new(current.time.clone(), data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn sine_waveform(samples: usize, frequency: f64, amplitude: f64) -> Waveform {
        let period = 1.0 / frequency;
        let time: Vec<f64> = (0..samples)
            .map(|i| period * (i as f64) / (samples as f64))
            .collect();
        let data: Vec<f64> = time
            .iter()
            .map(|t| amplitude * (2.0 * std::f64::consts::PI * frequency * t).sin())
            .collect();
        Waveform::new(time, data).unwrap()
    }

    #[test]
    fn standardize_waveform_rejects_non_positive_frequency() {
        let waveform = Waveform::new(vec![0.0, 1.0], vec![0.0, 1.0]).unwrap();
        assert!(standardize_waveform(&waveform, 0.0, 10).is_err());
    }

    #[test]
    fn standardize_waveform_produces_power_of_two_samples() {
        let waveform = sine_waveform(100, 1000.0, 1.0);
        let standardized = standardize_waveform(&waveform, 1000.0, 10).unwrap();
        assert_eq!(standardized.len(), 1024);
        assert_eq!(standardized.time[0], 0.0);
    }

    #[test]
    fn calculate_harmonics_data_finds_the_fundamental() {
        let waveform = sine_waveform(1024, 100_000.0, 2.0);
        let harmonics = calculate_harmonics_data(&waveform, 100_000.0).unwrap();
        assert_eq!(harmonics.harmonics.len(), 513);
        assert_abs_diff_eq!(harmonics.harmonics[0].amplitude, 0.0, epsilon = 1e-9);
        assert_abs_diff_eq!(harmonics.harmonics[1].amplitude, 2.0, epsilon = 1e-6);
        assert_abs_diff_eq!(harmonics.harmonics[1].frequency, 100_000.0, epsilon = 1e-6);
    }

    #[test]
    fn calculate_harmonics_data_rejects_non_power_of_two() {
        let waveform = sine_waveform(100, 1000.0, 1.0);
        assert!(calculate_harmonics_data(&waveform, 1000.0).is_err());
    }

    #[test]
    fn processed_reports_peak_and_rms_of_a_sine() {
        let waveform = sine_waveform(1024, 1000.0, 3.0);
        let stats = processed(&waveform);
        assert_abs_diff_eq!(stats.peak, 3.0, epsilon = 1e-3);
        assert_abs_diff_eq!(stats.rms, 3.0 / std::f64::consts::SQRT_2, epsilon = 1e-3);
        assert_abs_diff_eq!(stats.offset, 0.0, epsilon = 1e-9);
    }

    #[test]
    fn thresholded_keeps_dc_and_fundamental() {
        let harmonics = Harmonics {
            harmonics: vec![
                Harmonic {
                    frequency: 0.0,
                    amplitude: 0.1,
                    phase: 0.0,
                },
                Harmonic {
                    frequency: 100.0,
                    amplitude: 1.0,
                    phase: 0.0,
                },
                Harmonic {
                    frequency: 200.0,
                    amplitude: 0.0001,
                    phase: 0.0,
                },
            ],
        };
        let kept = harmonics.thresholded(5e-3);
        assert_eq!(kept.harmonics.len(), 2);
    }

    #[test]
    fn induced_voltage_of_a_ramp_current_is_constant() {
        let time = vec![0.0, 0.25e-6, 0.5e-6, 0.75e-6];
        let data = vec![0.0, 1.0, 2.0, 3.0];
        let current = Waveform::new(time, data).unwrap();
        let voltage = induced_voltage(&current, 1e-3).unwrap();
        assert_abs_diff_eq!(voltage.data[0], 4.0e3, epsilon = 1.0);
        assert_abs_diff_eq!(voltage.data[1], 4.0e3, epsilon = 1.0);
    }
}
