//! Error types for the hostenv crate.
//!
//! Every resolver reports failures through one of the enums below. Messages
//! from lower layers are captured as owned strings so the errors stay
//! `Clone + Eq` and can be compared directly in tests.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while deriving an identity from a convention path.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentityError {
    /// The path has fewer segments than the identity variant requires.
    ///
    /// This is the structural sentinel: callers match on it to apply a
    /// default instead of aborting.
    #[error("path '{path}' too short: need >= {required} segments, got {found}")]
    PathTooShort {
        /// Path that was parsed.
        path: String,
        /// Minimum number of segments for the requested identity.
        required: usize,
        /// Number of segments found after trimming separators.
        found: usize,
    },

    /// The working directory of the process could not be obtained.
    #[error("cannot read working directory: {message}")]
    WorkingDirUnavailable {
        /// Description of the underlying I/O error.
        message: String,
    },

    /// The executable path of the process could not be obtained.
    #[error("cannot read executable path: {message}")]
    ExecutableUnavailable {
        /// Description of the underlying I/O error.
        message: String,
    },
}

impl IdentityError {
    /// Returns `true` for the structural "path too short" condition.
    #[must_use]
    pub const fn is_path_too_short(&self) -> bool {
        matches!(self, Self::PathTooShort { .. })
    }
}

/// Errors raised while determining the service name.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ServiceNameError {
    /// The executable path needed for the fallback could not be obtained.
    #[error("cannot determine service name: executable path unavailable: {message}")]
    ExecutableUnavailable {
        /// Description of the underlying I/O error.
        message: String,
    },

    /// The executable base name is empty once the suffix is stripped.
    #[error("cannot determine service name: '{path}' is empty after trimming suffix")]
    Empty {
        /// Executable path the name was derived from.
        path: PathBuf,
    },
}

/// Error raised while decoding a configuration tree into a typed value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct DecodeError {
    message: String,
}

impl DecodeError {
    /// Builds a decode error from any displayable message.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Returns the error message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl serde::de::Error for DecodeError {
    fn custom<T: std::fmt::Display>(msg: T) -> Self {
        Self::new(msg.to_string())
    }
}

/// Errors raised by the layered configuration loader.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// No candidate file exists in any tier of the search order.
    #[error("no configuration file found; searched {}", .searched.join(", "))]
    NotFound {
        /// Locations that were probed, in search order.
        searched: Vec<String>,
    },

    /// A candidate file exists but could not be read.
    #[error("failed to read configuration at '{path}': {message}")]
    Read {
        /// Path to the configuration file.
        path: PathBuf,
        /// Description of the I/O error.
        message: String,
    },

    /// The file content is not valid for its format.
    #[error("invalid configuration syntax in '{path}': {message}")]
    Syntax {
        /// Path to the configuration file.
        path: PathBuf,
        /// Parser error message.
        message: String,
    },

    /// The parsed content does not fit the destination type.
    #[error("cannot decode configuration from '{path}': {source}")]
    Decode {
        /// Path to the configuration file.
        path: PathBuf,
        /// Underlying decode failure.
        #[source]
        source: DecodeError,
    },

    /// The service name needed to build the search paths is unavailable.
    #[error(transparent)]
    ServiceName(#[from] ServiceNameError),

    /// The working directory could not be obtained while resolving the
    /// domain tier.
    ///
    /// This signals a broken process environment rather than a missing file;
    /// see [`ConfigError::is_internal`].
    #[error("internal error resolving domain context: {message}")]
    WorkingDirUnavailable {
        /// Description of the underlying failure.
        message: String,
    },
}

impl ConfigError {
    /// Returns `true` when the error indicates an internal fault that the
    /// top-level caller is expected to treat as fatal.
    #[must_use]
    pub const fn is_internal(&self) -> bool {
        matches!(self, Self::WorkingDirUnavailable { .. })
    }
}

/// Errors raised while setting up log output.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoggingError {
    /// The gateway executable does not lie inside a domain.
    #[error("cannot locate gateway log file: {source}")]
    Identity {
        /// Underlying resolution failure.
        #[from]
        #[source]
        source: IdentityError,
    },

    /// The executable path has no usable file name.
    #[error("executable path '{path}' has no file name")]
    NoFileName {
        /// Offending executable path.
        path: PathBuf,
    },

    /// The log file could not be opened for appending.
    #[error("failed to open log file '{path}': {message}")]
    Open {
        /// Path to the log file.
        path: PathBuf,
        /// Description of the I/O error.
        message: String,
    },

    /// A global subscriber is already installed or could not be built.
    #[error("failed to install tracing subscriber: {message}")]
    Init {
        /// Description of the failure.
        message: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn path_too_short_formats_correctly() {
        let err = IdentityError::PathTooShort {
            path: "/home/pacs".to_owned(),
            required: 3,
            found: 2,
        };
        assert_eq!(
            err.to_string(),
            "path '/home/pacs' too short: need >= 3 segments, got 2"
        );
        assert!(err.is_path_too_short());
    }

    #[test]
    fn working_dir_unavailable_is_not_structural() {
        let err = IdentityError::WorkingDirUnavailable {
            message: "gone".to_owned(),
        };
        assert!(!err.is_path_too_short());
    }

    #[test]
    fn not_found_lists_searched_locations() {
        let err = ConfigError::NotFound {
            searched: vec!["./.api.conf".to_owned(), "$HOME/.api".to_owned()],
        };
        assert_eq!(
            err.to_string(),
            "no configuration file found; searched ./.api.conf, $HOME/.api"
        );
        assert!(!err.is_internal());
    }

    #[test]
    fn working_dir_failure_is_internal() {
        let err = ConfigError::WorkingDirUnavailable {
            message: "No such file or directory".to_owned(),
        };
        assert!(err.is_internal());
    }

    #[test]
    fn service_name_error_passes_through() {
        let err = ConfigError::from(ServiceNameError::Empty {
            path: PathBuf::from("/a/b/.fcgi"),
        });
        assert_eq!(
            err.to_string(),
            "cannot determine service name: '/a/b/.fcgi' is empty after trimming suffix"
        );
    }
}
