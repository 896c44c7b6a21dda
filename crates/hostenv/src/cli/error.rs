//! Error types for the `hostenv` CLI.

use thiserror::Error;

use crate::error::{ConfigError, IdentityError, LoggingError, ServiceNameError};

/// Errors surfaced by the CLI commands.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CliError {
    /// The working directory does not name a hosting identity.
    #[error("identity error: {source}")]
    Identity {
        /// Underlying identity failure.
        #[from]
        #[source]
        source: IdentityError,
    },
    /// The service name could not be resolved.
    #[error("service name error: {source}")]
    ServiceName {
        /// Underlying resolution failure.
        #[from]
        #[source]
        source: ServiceNameError,
    },
    /// The configuration could not be loaded.
    #[error("config error: {source}")]
    Config {
        /// Underlying loader failure.
        #[from]
        #[source]
        source: ConfigError,
    },
    /// The log destination could not be determined.
    #[error("logging error: {source}")]
    Logging {
        /// Underlying logging failure.
        #[from]
        #[source]
        source: LoggingError,
    },
    /// Writing the report failed.
    #[error("failed to write output: {message}")]
    Output {
        /// Description of the I/O error.
        message: String,
    },
}

impl CliError {
    /// Returns `true` when the failure is internal and the process should
    /// abort instead of exiting normally.
    #[must_use]
    pub const fn is_internal(&self) -> bool {
        match self {
            Self::Config { source } => source.is_internal(),
            _ => false,
        }
    }
}

impl From<std::io::Error> for CliError {
    fn from(error: std::io::Error) -> Self {
        Self::Output {
            message: error.to_string(),
        }
    }
}
