//! Crate error types.
//!
//! The decision engines themselves never fail; these errors cover loading
//! configuration and bar data around them.

use crate::domain::universe::UniverseError;

/// Top-level error type for factorsig.
#[derive(Debug, thiserror::Error)]
pub enum FactorsigError {
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

    #[error("data error: {reason}")]
    Data { reason: String },

    #[error("no data for {code}")]
    NoData { code: String },

    #[error(transparent)]
    Universe(#[from] UniverseError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl FactorsigError {
    pub(crate) fn invalid(section: &str, key: &str, reason: impl Into<String>) -> Self {
        FactorsigError::ConfigInvalid {
            section: section.to_string(),
            key: key.to_string(),
            reason: reason.into(),
        }
    }
}

impl From<&FactorsigError> for std::process::ExitCode {
    fn from(err: &FactorsigError) -> Self {
        let code: u8 = match err {
            FactorsigError::Io(_) => 1,
            FactorsigError::ConfigParse { .. }
            | FactorsigError::ConfigMissing { .. }
            | FactorsigError::ConfigInvalid { .. }
            | FactorsigError::Universe(_) => 2,
            FactorsigError::Data { .. } => 3,
            FactorsigError::NoData { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}
