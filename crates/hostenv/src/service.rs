//! Service name resolution.
//!
//! The service name keys the configuration search and the log file name. It
//! comes from `SERVICE_NAME` when set, otherwise from the executable's file
//! name with the gateway suffix removed.

use mockable::Env;
use tracing::debug;

use crate::error::ServiceNameError;
use crate::process::ProcessProbe;

/// Environment variable overriding the derived service name.
pub const SERVICE_NAME_ENV: &str = "SERVICE_NAME";

/// Suffix carried by executables installed for the FastCGI gateway.
pub const GATEWAY_SUFFIX: &str = ".fcgi";

/// Resolves the service name.
///
/// The environment and the executable path are read on every call.
///
/// # Errors
///
/// Returns [`ServiceNameError::ExecutableUnavailable`] when the override is
/// unset and the probe cannot supply the executable path, and
/// [`ServiceNameError::Empty`] when nothing is left after stripping the
/// suffix.
///
/// # Examples
///
/// ```
/// use hostenv::{FixedProcess, service_name};
/// use mockable::MockEnv;
///
/// let mut env = MockEnv::new();
/// env.expect_string().returning(|_| None);
/// let probe = FixedProcess::new().with_executable("/a/b/api.fcgi");
///
/// assert_eq!(service_name(&env, &probe).expect("name"), "api");
/// ```
pub fn service_name<E: Env, P: ProcessProbe>(
    env: &E,
    probe: &P,
) -> Result<String, ServiceNameError> {
    if let Some(name) = env.string(SERVICE_NAME_ENV).filter(|name| !name.is_empty()) {
        debug!(service = %name, "service name taken from {SERVICE_NAME_ENV}");
        return Ok(name);
    }

    let executable = probe
        .executable()
        .map_err(|e| ServiceNameError::ExecutableUnavailable {
            message: e.to_string(),
        })?;
    let name = executable
        .file_name()
        .map(|file_name| strip_gateway_suffix(&file_name.to_string_lossy()).to_owned())
        .unwrap_or_default();
    if name.is_empty() {
        return Err(ServiceNameError::Empty { path: executable });
    }
    Ok(name)
}

pub(crate) fn strip_gateway_suffix(file_name: &str) -> &str {
    file_name.strip_suffix(GATEWAY_SUFFIX).unwrap_or(file_name)
}
