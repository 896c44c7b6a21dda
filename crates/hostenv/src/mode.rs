//! Execution-mode detection.
//!
//! A service is gateway-invoked when the web server's FastCGI gateway starts
//! it from a `fastcgi` or `fastcgi-ssl` directory of a domain. Anything else
//! is a standalone server.

use std::fmt;
use std::path::Path;

use mockable::Env;
use tracing::debug;

use crate::process::ProcessProbe;

/// Directory-name prefix of gateway-invoked executables.
pub const GATEWAY_DIR_PREFIX: &str = "fastcgi";

/// Environment variable carrying an explicit FastCGI listen address.
pub const GATEWAY_LISTEN_ENV: &str = "FCGI_LISTEN";

/// Port a standalone server listens on.
pub const DEFAULT_HTTP_PORT: u16 = 9000;

/// Returns `true` when the parent directory name of `path` starts with
/// [`GATEWAY_DIR_PREFIX`].
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use hostenv::is_gateway_path;
///
/// assert!(is_gateway_path(Path::new("/srv/doms/example.com/fastcgi-ssl/api.fcgi")));
/// assert!(!is_gateway_path(Path::new("/srv/doms/example.com/cgi/api.fcgi")));
/// ```
#[must_use]
pub fn is_gateway_path(path: &Path) -> bool {
    path.parent()
        .and_then(Path::file_name)
        .is_some_and(|dir| dir.to_string_lossy().starts_with(GATEWAY_DIR_PREFIX))
}

/// Returns `true` when the running executable is gateway-invoked.
///
/// A probe failure degrades to `false`.
#[must_use]
pub fn is_gateway_invoked<P: ProcessProbe>(probe: &P) -> bool {
    match probe.executable() {
        Ok(executable) => is_gateway_path(&executable),
        Err(error) => {
            debug!(error = %error, "executable path unavailable; assuming standalone mode");
            false
        }
    }
}

/// How the service should accept requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListenMode {
    /// Serve FastCGI on an explicitly configured address.
    FastCgiSocket(String),
    /// Serve FastCGI on the socket inherited from the gateway.
    FastCgiInherited,
    /// Serve plain HTTP on all interfaces.
    Http {
        /// TCP port to bind.
        port: u16,
    },
}

impl ListenMode {
    /// Selects the listen mode.
    ///
    /// A non-empty [`GATEWAY_LISTEN_ENV`] wins, then gateway invocation,
    /// then plain HTTP on [`DEFAULT_HTTP_PORT`].
    #[must_use]
    pub fn detect<E: Env, P: ProcessProbe>(env: &E, probe: &P) -> Self {
        if let Some(addr) = env
            .string(GATEWAY_LISTEN_ENV)
            .filter(|addr| !addr.is_empty())
        {
            return Self::FastCgiSocket(addr);
        }
        if is_gateway_invoked(probe) {
            return Self::FastCgiInherited;
        }
        Self::Http {
            port: DEFAULT_HTTP_PORT,
        }
    }

    /// Returns `true` for both FastCGI variants.
    #[must_use]
    pub const fn is_fastcgi(&self) -> bool {
        !matches!(self, Self::Http { .. })
    }
}

impl fmt::Display for ListenMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FastCgiSocket(addr) => write!(f, "fastcgi:{addr}"),
            Self::FastCgiInherited => f.write_str("fastcgi:inherited"),
            Self::Http { port } => write!(f, "http:{port}"),
        }
    }
}
