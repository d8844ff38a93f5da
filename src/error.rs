use thiserror::Error;

/// Why a single solver run did not produce parameters.
///
/// These are local to one candidate window or start index: the range search
/// logs them, leaves the candidate out of the ranking and keeps going.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FitFailure {
    /// A parameter diverged (non-finite or beyond the overflow limit).
    #[error("Parameter overflow during fitting: {0}")]
    Overflow(String),

    /// The optimizer ran out of iterations.
    #[error("Fit did not converge: {0}")]
    NoConvergence(String),

    /// An intermediate value left the model's domain, e.g. a negative base
    /// raised to a fractional power.
    #[error("Invalid value during fitting: {0}")]
    DomainError(String),
}

impl FitFailure {
    /// Short tag used in incident log lines.
    pub fn tag(&self) -> &'static str {
        match self {
            FitFailure::Overflow(_) => "Overflow",
            FitFailure::NoConvergence(_) => "NoConvergence",
            FitFailure::DomainError(_) => "DomainError",
        }
    }
}

/// Error types for the rheofit library.
#[derive(Error, Debug)]
pub enum RheoError {
    /// Shear rate and viscosity columns differ in length.
    #[error("GP and Eta have different lengths ({shear_rate} vs {viscosity})")]
    LengthMismatch { shear_rate: usize, viscosity: usize },

    /// A series with no points.
    #[error("Measurement series is empty")]
    EmptySeries,

    /// No usable flow curve rows in an export file.
    #[error("No flow curve data was found in {0}")]
    NoFlowCurveData(String),

    /// Wrong number of parameters or errors for a model.
    #[error("{model} expects {expected} values, got {actual}")]
    ParameterCount {
        model: String,
        expected: usize,
        actual: usize,
    },

    /// Window indices outside the series or in the wrong order.
    #[error("Invalid window [{first}, {last}] for a series of {len} points")]
    InvalidWindow { first: usize, last: usize, len: usize },

    /// Bounds with min > max, or an initial value outside its bounds.
    #[error("Bounds error: {0}")]
    InvalidBounds(String),

    /// A single fit attempt failed.
    #[error(transparent)]
    Fit(#[from] FitFailure),

    /// No linear window produced a fit.
    #[error("No window produced a linear fit")]
    NoFit,

    /// Every nonlinear start index failed.
    #[error("Unable to find viscosity with the {0} model")]
    NoViscosityFound(String),

    /// Unknown model name in the configuration.
    #[error("Unknown model: {0}")]
    UnknownModel(String),

    /// Unknown sorting method in the configuration.
    #[error("Could not understand the sorting method {0}")]
    UnknownSortingMethod(String),

    /// A setting with an unusable value.
    #[error("Invalid setting {name}: {reason}")]
    InvalidSetting { name: String, reason: String },

    /// Provenance string that does not parse.
    #[error("Malformed provenance: {0}")]
    MalformedProvenance(String),

    /// I/O error wrapper.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// CSV reader error.
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    /// TOML settings error.
    #[error("Settings error: {0}")]
    TomlError(#[from] toml::de::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

impl RheoError {
    /// True for failures of a single solver run.
    pub fn is_fit_failure(&self) -> bool {
        matches!(self, RheoError::Fit(_))
    }

    /// True when a whole search came back empty.
    pub fn is_search_exhaustion(&self) -> bool {
        matches!(self, RheoError::NoFit | RheoError::NoViscosityFound(_))
    }

    /// True for errors caused by the configuration rather than the data.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            RheoError::UnknownModel(_)
                | RheoError::UnknownSortingMethod(_)
                | RheoError::InvalidSetting { .. }
                | RheoError::TomlError(_)
        )
    }
}

/// Result type alias for rheofit operations.
pub type Result<T> = std::result::Result<T, RheoError>;
