//! Domain error types.
//!
//! Windows that fall below the minimum observation count and metrics that are
//! undefined for a window are not errors: the former are dropped, the latter
//! evaluate to NaN.

/// Top-level error type for fundmetrics.
#[derive(Debug, thiserror::Error)]
pub enum FundMetricsError {
    #[error("invalid argument: {reason}")]
    InvalidArgument { reason: String },

    #[error("precondition failed: {reason}")]
    Precondition { reason: String },

    #[error("missing column: {name}")]
    MissingColumn { name: String },

    #[error("data source error: {reason}")]
    DataSource { reason: String },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl FundMetricsError {
    pub fn invalid(reason: impl Into<String>) -> Self {
        FundMetricsError::InvalidArgument {
            reason: reason.into(),
        }
    }

    /// Process exit status for this error class.
    pub fn exit_status(&self) -> u8 {
        match self {
            FundMetricsError::Io(_) => 1,
            FundMetricsError::ConfigParse { .. }
            | FundMetricsError::ConfigMissing { .. }
            | FundMetricsError::ConfigInvalid { .. } => 2,
            FundMetricsError::DataSource { .. } | FundMetricsError::MissingColumn { .. } => 3,
            FundMetricsError::InvalidArgument { .. } | FundMetricsError::Precondition { .. } => 4,
        }
    }
}

impl From<&FundMetricsError> for std::process::ExitCode {
    fn from(err: &FundMetricsError) -> Self {
        std::process::ExitCode::from(err.exit_status())
    }
}
