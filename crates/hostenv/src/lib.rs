//! Hosting environment resolution for services deployed in a shared hosting
//! layout.
//!
//! Services live below `/home/pacs/<account>/users/<subuser>/doms/<domain>`.
//! This crate derives everything a service needs to know about its place in
//! that layout from the executable path, the working directory and the
//! environment.
//!
//! # Overview
//!
//! The crate supports:
//!
//! - Parsing account, sub-user and domain identities from convention paths
//! - Deriving home, configuration, log and data directories
//! - Resolving the service name from `SERVICE_NAME` or the executable
//! - Detecting FastCGI gateway invocation and the listen mode
//! - Loading layered configuration with type-conversion hooks
//! - Installing a JSON `tracing` subscriber writing to the right place
//!
//! Process locations are read through a [`ProcessProbe`] and environment
//! variables through [`mockable::Env`], so every resolver is a function of
//! its explicit inputs.
//!
//! # Example
//!
//! ```
//! use hostenv::{DomainIdentity, FixedProcess, domain_by_working_dir};
//!
//! let probe = FixedProcess::new()
//!     .with_working_dir("/home/pacs/xyz00/users/foobar/doms/example.com/subs/www");
//! let domain = domain_by_working_dir(&probe).expect("working dir inside a domain");
//!
//! assert_eq!(domain, DomainIdentity::new("xyz00", "foobar", "example.com"));
//! assert_eq!(domain.data_dir(), "/home/pacs/xyz00/users/foobar/doms/example.com/data");
//! ```

pub mod cli;
pub mod config;
mod dirs;
mod error;
mod identity;
mod logging;
mod mode;
mod process;
mod service;

pub use config::{ConfigLoader, ConfigSource, DecodeHooks};
pub use dirs::gateway_log_file;
pub use error::{ConfigError, DecodeError, IdentityError, LoggingError, ServiceNameError};
pub use identity::{DomainIdentity, USER_LABEL_SEPARATOR, UserIdentity, domain_by_working_dir};
pub use logging::{LogTarget, init_logging};
pub use mode::{
    DEFAULT_HTTP_PORT, GATEWAY_DIR_PREFIX, GATEWAY_LISTEN_ENV, ListenMode, is_gateway_invoked,
    is_gateway_path,
};
pub use process::{FixedProcess, OverrideProcess, ProcessProbe, SystemProcess};
pub use service::{GATEWAY_SUFFIX, SERVICE_NAME_ENV, service_name};
