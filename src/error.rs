use thiserror::Error;

/// Error types for the pulsefit-rs library.
#[derive(Error, Debug)]
pub enum PulseFitError {
    /// A cut threshold lies outside the domain of its quality variable.
    #[error("Invalid {cut} cut {value}: {reason}")]
    InvalidCut {
        cut: &'static str,
        value: String,
        reason: String,
    },

    /// Model name not present in the model registry.
    #[error("The model '{0}' is not in the available model list")]
    InvalidModel(String),

    /// Model and peak selection cannot be fitted together.
    #[error("Model '{model}' cannot fit peak selection '{peak}'")]
    IncompatiblePeak { model: String, peak: String },

    /// Malformed phase region.
    #[error("Invalid phase region: {0}")]
    InvalidRegion(String),

    /// Malformed histogram.
    #[error("Invalid histogram: {0}")]
    InvalidHistogram(String),

    /// Any other invalid configuration value.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Energy-dependent cuts requested without an energy binning.
    #[error("Energy-dependent cuts require an energy binning")]
    MissingEnergyBinning,

    /// A cut needs an event column the table does not carry.
    #[error("Event table has no '{0}' column")]
    MissingColumn(&'static str),

    /// Region statistics required by the model are not available.
    #[error("Region statistics for '{0}' are required but missing")]
    MissingRegion(String),

    /// The operation needs a time-ordered event table.
    #[error("Event table is not ordered by time")]
    NotTimeOrdered,

    /// A fit was requested before initial values were estimated.
    #[error("Initial values must be estimated before fitting")]
    NotEstimated,

    /// Error indicating a mismatch in vector or matrix dimensions.
    #[error("Dimension mismatch: {0}")]
    DimensionMismatch(String),

    /// Error indicating the algorithm failed to converge.
    #[error("Algorithm failed to converge: {0}")]
    ConvergenceFailure(String),

    /// Error indicating a singular matrix was encountered.
    #[error("Singular matrix encountered")]
    SingularMatrix,

    /// Error during function evaluation.
    #[error("Function evaluation error: {0}")]
    FunctionEvaluation(String),

    /// I/O error wrapper.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

/// Coarse class of an error, for pipelines that skip bad inputs and continue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Precondition,
    Numerical,
    Io,
}

impl PulseFitError {
    /// Build an [`PulseFitError::InvalidCut`] from any displayable value.
    pub fn invalid_cut(cut: &'static str, value: impl ToString, reason: impl Into<String>) -> Self {
        PulseFitError::InvalidCut {
            cut,
            value: value.to_string(),
            reason: reason.into(),
        }
    }

    /// The class of this error.
    pub fn category(&self) -> ErrorCategory {
        match self {
            PulseFitError::InvalidCut { .. }
            | PulseFitError::InvalidModel(_)
            | PulseFitError::IncompatiblePeak { .. }
            | PulseFitError::InvalidRegion(_)
            | PulseFitError::InvalidHistogram(_)
            | PulseFitError::InvalidConfig(_) => ErrorCategory::Configuration,
            PulseFitError::MissingEnergyBinning
            | PulseFitError::MissingColumn(_)
            | PulseFitError::MissingRegion(_)
            | PulseFitError::NotTimeOrdered
            | PulseFitError::NotEstimated
            | PulseFitError::DimensionMismatch(_) => ErrorCategory::Precondition,
            PulseFitError::ConvergenceFailure(_)
            | PulseFitError::SingularMatrix
            | PulseFitError::FunctionEvaluation(_) => ErrorCategory::Numerical,
            PulseFitError::IoError(_) | PulseFitError::JsonError(_) => ErrorCategory::Io,
        }
    }
}

/// Result type alias for pulsefit-rs operations.
pub type Result<T> = std::result::Result<T, PulseFitError>;
