//! Error taxonomy for the magnetics physical-model stack.
//!
//! Mirrors `stem_material::relative_permeability::InvalidInputData`: a plain
//! enum with a manual [`std::fmt::Display`] impl rather than `thiserror`, one
//! variant per failure kind rather than per call site.

use std::fmt;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, MagneticsError>;

/// A classified failure raised by any model in the stack.
///
/// Each variant corresponds to one of the error kinds a caller needs to
/// branch on; the `context` string carries the offending call site and
/// values so the message is useful without needing a backtrace.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum MagneticsError {
    /// A required material, shape or gap field is absent.
    MissingData {
        /// What was being looked up.
        context: String,
    },
    /// Input failed validation: non-power-of-two waveform length, negative
    /// geometry, turns-ratio count mismatch, etc.
    InvalidInput {
        /// What failed and why.
        context: String,
    },
    /// A spline, reluctance or inductance calculation produced NaN.
    CalculationNanResult {
        /// Which calculation produced the NaN.
        context: String,
    },
    /// A core-derived quantity (effective area, effective length, ...) was
    /// requested before the core had been processed, and processing it now
    /// failed too.
    CoreNotProcessed {
        /// Which derived quantity was requested.
        context: String,
    },
    /// A gap's `distance_closest_normal_surface` came out negative while
    /// distributing a multi-segment gap.
    GapInvalidDimensions {
        /// Which gap and what distance was computed.
        context: String,
    },
    /// The requested model enum is not supported for the given material or
    /// geometry.
    ModelNotAvailable {
        /// Which model was requested and why it cannot be used.
        context: String,
    },
    /// A loss model requires coefficients the material does not carry.
    MaterialDataMissing {
        /// Which coefficients were required.
        context: String,
    },
}

impl MagneticsError {
    /// Short machine-readable code, as named in the error taxonomy.
    pub fn code(&self) -> &'static str {
        match self {
            MagneticsError::MissingData { .. } => "MISSING_DATA",
            MagneticsError::InvalidInput { .. } => "INVALID_INPUT",
            MagneticsError::CalculationNanResult { .. } => "CALCULATION_NAN_RESULT",
            MagneticsError::CoreNotProcessed { .. } => "CORE_NOT_PROCESSED",
            MagneticsError::GapInvalidDimensions { .. } => "GAP_INVALID_DIMENSIONS",
            MagneticsError::ModelNotAvailable { .. } => "MODEL_NOT_AVAILABLE",
            MagneticsError::MaterialDataMissing { .. } => "MATERIAL_DATA_MISSING",
        }
    }

    /// Context string carried by whichever variant this is.
    pub fn context(&self) -> &str {
        match self {
            MagneticsError::MissingData { context }
            | MagneticsError::InvalidInput { context }
            | MagneticsError::CalculationNanResult { context }
            | MagneticsError::CoreNotProcessed { context }
            | MagneticsError::GapInvalidDimensions { context }
            | MagneticsError::ModelNotAvailable { context }
            | MagneticsError::MaterialDataMissing { context } => context,
        }
    }

    /// Build a [`MagneticsError::MissingData`] error with the given context.
    pub fn missing_data(context: impl Into<String>) -> Self {
        MagneticsError::MissingData {
            context: context.into(),
        }
    }

    /// Build a [`MagneticsError::InvalidInput`] error with the given context.
    pub fn invalid_input(context: impl Into<String>) -> Self {
        MagneticsError::InvalidInput {
            context: context.into(),
        }
    }

    /// Build a [`MagneticsError::CalculationNanResult`] error with the given context.
    pub fn calculation_nan(context: impl Into<String>) -> Self {
        MagneticsError::CalculationNanResult {
            context: context.into(),
        }
    }

    /// Build a [`MagneticsError::CoreNotProcessed`] error with the given context.
    pub fn core_not_processed(context: impl Into<String>) -> Self {
        MagneticsError::CoreNotProcessed {
            context: context.into(),
        }
    }

    /// Build a [`MagneticsError::GapInvalidDimensions`] error with the given context.
    pub fn gap_invalid_dimensions(context: impl Into<String>) -> Self {
        MagneticsError::GapInvalidDimensions {
            context: context.into(),
        }
    }

    /// Build a [`MagneticsError::ModelNotAvailable`] error with the given context.
    pub fn model_not_available(context: impl Into<String>) -> Self {
        MagneticsError::ModelNotAvailable {
            context: context.into(),
        }
    }

    /// Build a [`MagneticsError::MaterialDataMissing`] error with the given context.
    pub fn material_data_missing(context: impl Into<String>) -> Self {
        MagneticsError::MaterialDataMissing {
            context: context.into(),
        }
    }
}

impl fmt::Display for MagneticsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code(), self.context())
    }
}

impl std::error::Error for MagneticsError {}

impl From<akima_spline::BuildError> for MagneticsError {
    fn from(value: akima_spline::BuildError) -> Self {
        MagneticsError::CalculationNanResult {
            context: value.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn code_matches_variant() {
        let error = MagneticsError::core_not_processed("get_effective_area");
        assert_eq!(error.code(), "CORE_NOT_PROCESSED");
        assert_eq!(error.context(), "get_effective_area");
    }

    #[test]
    fn display_includes_code_and_context() {
        let error = MagneticsError::invalid_input("waveform length 1000 is not a power of two");
        let rendered = error.to_string();
        assert!(rendered.starts_with("INVALID_INPUT"));
        assert!(rendered.contains("power of two"));
    }
}
