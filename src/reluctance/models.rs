//! Individual gap reluctance model implementations, one function per model.

use crate::constants::Constants;
use crate::core_geometry::GapShape;
use crate::error::Result;

use super::{AirGapReluctanceOutput, GapInput};

fn perimeter(input: &GapInput) -> f64 {
    match input.shape {
        GapShape::Round => std::f64::consts::PI * input.section_dimensions.0,
        GapShape::Rectangular => 2.0 * input.section_dimensions.0 + 2.0 * input.section_dimensions.1,
    }
}

/// Reference flux density used to bound the gap's storable energy when no
/// material saturation value is available at this layer of the stack (the
/// reluctance engine works purely from gap geometry). 0.3 T is a
/// conservative margin below the saturation flux density of common ferrite
/// and powder materials.
const REFERENCE_FLUX_DENSITY: f64 = 0.3;

/// Maximum storable magnetic energy in the gap volume at `REFERENCE_FLUX_DENSITY`,
/// derated by the fringing factor (higher fringing spreads the same flux
/// over more volume, raising the energy the gap can absorb before local
/// saturation at the gap edges).
fn energy(input: &GapInput, fringing_factor: f64, mu0: f64) -> f64 {
    let volume = input.area * input.length;
    0.5 * REFERENCE_FLUX_DENSITY.powi(2) * volume * fringing_factor / mu0
}

/// Zhang's model: internal + fringing reluctance combined in parallel.
pub fn zhang(input: &GapInput, constants: &Constants) -> Result<AirGapReluctanceOutput> {
    let mu0 = constants.vacuum_permeability;
    let internal = input.length / (mu0 * input.area);
    let perimeter = perimeter(input);
    let d_n = input.distance_closest_normal_surface;
    let fringing = std::f64::consts::PI
        / (mu0 * perimeter * ((2.0 * d_n + input.length) / input.length).ln());
    let reluctance = 1.0 / (1.0 / internal + 1.0 / fringing);
    let fringing_factor = input.length / (mu0 * input.area * reluctance);
    Ok(AirGapReluctanceOutput {
        reluctance,
        fringing_factor: fringing_factor.max(1.0),
        maximum_storable_magnetic_energy: energy(input, fringing_factor, mu0),
        method_used: "zhang",
    })
}

fn basic_reluctance(mu0: f64, length: f64, width: f64, height: f64) -> f64 {
    1.0 / (mu0 * (width / (2.0 * length) + (2.0 / std::f64::consts::PI) * (1.0 + (std::f64::consts::PI * height / (4.0 * length)).ln())))
}

/// Muehlethaler's model, built from the basic reluctance function.
pub fn muehlethaler(input: &GapInput, constants: &Constants) -> Result<AirGapReluctanceOutput> {
    let mu0 = constants.vacuum_permeability;
    let (w, d) = input.section_dimensions;
    let length = input.length;
    let d_n = input.distance_closest_normal_surface;

    let reluctance = match input.shape {
        GapShape::Round => {
            let r_b = basic_reluctance(mu0, length / 2.0, w / 2.0, d_n);
            let gamma = r_b / (length / (mu0 * (w / 2.0)));
            gamma.powi(2) * length / (mu0 * std::f64::consts::PI * (w / 2.0).powi(2))
        }
        GapShape::Rectangular => {
            let r_bx = basic_reluctance(mu0, length / 2.0, w / 2.0, d_n);
            let r_by = basic_reluctance(mu0, length / 2.0, d / 2.0, d_n);
            let gamma_x = r_bx / (length / (mu0 * (w / 2.0)));
            let gamma_y = r_by / (length / (mu0 * (d / 2.0)));
            gamma_x * gamma_y * length / (mu0 * w * d)
        }
    };
    let fringing_factor = (length / (mu0 * input.area * reluctance)).max(1.0);
    Ok(AirGapReluctanceOutput {
        reluctance,
        fringing_factor,
        maximum_storable_magnetic_energy: energy(input, fringing_factor, mu0),
        method_used: "muehlethaler",
    })
}

/// Effective-area model: the gap's fringed area is scaled by a geometric factor `k`.
pub fn effective_area(input: &GapInput, constants: &Constants) -> Result<AirGapReluctanceOutput> {
    let mu0 = constants.vacuum_permeability;
    let length = input.length;
    let (w, d) = input.section_dimensions;
    let k = match input.shape {
        GapShape::Round => (1.0 + length / w).powi(2),
        GapShape::Rectangular => (w + length) * (d + length) / (w * d),
    };
    let reluctance = length / (mu0 * input.area * k);
    Ok(AirGapReluctanceOutput {
        reluctance,
        fringing_factor: k.max(1.0),
        maximum_storable_magnetic_energy: energy(input, k.max(1.0), mu0),
        method_used: "effective_area",
    })
}

/// Effective-length model: `k` multiplies `(1+l/w)` and `(1+l/d)` instead of scaling area directly.
pub fn effective_length(input: &GapInput, constants: &Constants) -> Result<AirGapReluctanceOutput> {
    let mu0 = constants.vacuum_permeability;
    let length = input.length;
    let (w, d) = input.section_dimensions;
    let k = match input.shape {
        GapShape::Round => 1.0 + length / w,
        GapShape::Rectangular => (1.0 + length / w) * (1.0 + length / d),
    };
    let reluctance = length / (mu0 * input.area * k);
    Ok(AirGapReluctanceOutput {
        reluctance,
        fringing_factor: k.max(1.0),
        maximum_storable_magnetic_energy: energy(input, k.max(1.0), mu0),
        method_used: "effective_length",
    })
}

/// McLyman's model: `k = 1 + (l/sqrt(A)) * ln(4*D_n/l)`.
pub fn mclyman(input: &GapInput, constants: &Constants) -> Result<AirGapReluctanceOutput> {
    let mu0 = constants.vacuum_permeability;
    let length = input.length;
    let d_n = input.distance_closest_normal_surface;
    let k = 1.0 + (length / input.area.sqrt()) * (4.0 * d_n / length).ln();
    let reluctance = length / (mu0 * input.area * k);
    Ok(AirGapReluctanceOutput {
        reluctance,
        fringing_factor: k.max(1.0),
        maximum_storable_magnetic_energy: energy(input, k.max(1.0), mu0),
        method_used: "mclyman",
    })
}

/// Partridge's model: Schwarz-Christoffel-derived fringing, approximated via McLyman's closed form.
pub fn partridge(input: &GapInput, constants: &Constants) -> Result<AirGapReluctanceOutput> {
    let mut output = mclyman(input, constants)?;
    output.method_used = "partridge";
    Ok(output)
}

/// Stenglein's model: effective-area variant with a perimeter-normalised correction.
pub fn stenglein(input: &GapInput, constants: &Constants) -> Result<AirGapReluctanceOutput> {
    let mu0 = constants.vacuum_permeability;
    let length = input.length;
    let perimeter = perimeter(input);
    let d_n = input.distance_closest_normal_surface;
    let k = 1.0 + (perimeter * length) / (input.area) * (1.0 + (d_n / length).ln().max(0.0));
    let reluctance = length / (mu0 * input.area * k);
    Ok(AirGapReluctanceOutput {
        reluctance,
        fringing_factor: k.max(1.0),
        maximum_storable_magnetic_energy: energy(input, k.max(1.0), mu0),
        method_used: "stenglein",
    })
}

/// Balakrishnan's model: effective-length variant with an empirical `0.72` mixing coefficient.
pub fn balakrishnan(input: &GapInput, constants: &Constants) -> Result<AirGapReluctanceOutput> {
    let mu0 = constants.vacuum_permeability;
    let length = input.length;
    let (w, d) = input.section_dimensions;
    let k = match input.shape {
        GapShape::Round => 1.0 + 0.72 * (length / w),
        GapShape::Rectangular => (1.0 + 0.72 * (length / w)) * (1.0 + 0.72 * (length / d)),
    };
    let reluctance = length / (mu0 * input.area * k);
    Ok(AirGapReluctanceOutput {
        reluctance,
        fringing_factor: k.max(1.0),
        maximum_storable_magnetic_energy: energy(input, k.max(1.0), mu0),
        method_used: "balakrishnan",
    })
}

/// The classic model: no fringing correction at all, `k = 1`.
pub fn classic(input: &GapInput, constants: &Constants) -> Result<AirGapReluctanceOutput> {
    let mu0 = constants.vacuum_permeability;
    let reluctance = input.length / (mu0 * input.area);
    Ok(AirGapReluctanceOutput {
        reluctance,
        fringing_factor: 1.0,
        maximum_storable_magnetic_energy: energy(input, 1.0, mu0),
        method_used: "classic",
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_geometry::GapShape;

    fn round_input(length: f64) -> GapInput {
        GapInput {
            length,
            area: 1.06e-4,
            section_dimensions: (0.0116, 0.0116),
            distance_closest_normal_surface: 0.01,
            shape: GapShape::Round,
        }
    }

    #[test]
    fn classic_model_has_no_fringing() {
        let constants = Constants::default();
        let output = classic(&round_input(0.5e-3), &constants).unwrap();
        assert_eq!(output.fringing_factor, 1.0);
    }

    #[test]
    fn zhang_fringing_factor_exceeds_one_for_finite_distance() {
        let constants = Constants::default();
        let output = zhang(&round_input(0.5e-3), &constants).unwrap();
        assert!(output.fringing_factor > 1.0);
    }

    #[test]
    fn effective_area_and_effective_length_agree_for_round_at_small_gap() {
        let constants = Constants::default();
        let area_model = effective_area(&round_input(0.05e-3), &constants).unwrap();
        let length_model = effective_length(&round_input(0.05e-3), &constants).unwrap();
        assert!((area_model.reluctance - length_model.reluctance).abs() / area_model.reluctance < 0.2);
    }
}
