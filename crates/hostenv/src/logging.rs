//! Structured logging bootstrap.
//!
//! Gateway-invoked services have no terminal, so their logs go to a file in
//! the domain's log directory. Standalone services log to stdout. Both emit
//! JSON records filtered by `RUST_LOG` (default `info`).

use std::io;
use std::path::Path;
use std::sync::Mutex;

use camino::Utf8PathBuf;
use cap_std::ambient_authority;
use cap_std::fs::{Dir, File, OpenOptions};
use tracing::{debug, info};
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::{EnvFilter, fmt};

use crate::dirs::gateway_log_file;
use crate::error::LoggingError;
use crate::mode::is_gateway_path;
use crate::process::ProcessProbe;

const DEFAULT_FILTER: &str = "info";

#[cfg(unix)]
const LOG_FILE_MODE: u32 = 0o640;

/// Destination of log records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogTarget {
    /// Standard output.
    Stdout,
    /// Append to a file.
    File(Utf8PathBuf),
}

impl LogTarget {
    /// Picks the target for the running executable.
    ///
    /// Gateway-invoked executables log to [`gateway_log_file`]; everything
    /// else, including a probe that cannot report the executable, logs to
    /// stdout.
    ///
    /// # Errors
    ///
    /// Returns [`LoggingError`] when a gateway executable lies outside a
    /// domain.
    pub fn detect<P: ProcessProbe>(probe: &P) -> Result<Self, LoggingError> {
        let executable = match probe.executable() {
            Ok(path) => path,
            Err(error) => {
                debug!(error = %error, "executable path unavailable; logging to stdout");
                return Ok(Self::Stdout);
            }
        };
        if !is_gateway_path(&executable) {
            return Ok(Self::Stdout);
        }
        gateway_log_file(&executable).map(Self::File)
    }
}

/// Installs the global JSON subscriber and emits a startup record.
///
/// The startup record carries `service` and `version`; later records do not
/// repeat them, so correlate a file's records through that first line.
///
/// # Errors
///
/// Returns [`LoggingError::Open`] when the log file cannot be opened and
/// [`LoggingError::Init`] when a global subscriber is already installed.
pub fn init_logging(service: &str, target: &LogTarget) -> Result<(), LoggingError> {
    let writer = match target {
        LogTarget::Stdout => BoxMakeWriter::new(io::stdout),
        LogTarget::File(path) => {
            let file = open_log_file(path.as_std_path()).map_err(|e| LoggingError::Open {
                path: path.clone().into_std_path_buf(),
                message: e.to_string(),
            })?;
            BoxMakeWriter::new(Mutex::new(file))
        }
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    fmt()
        .with_env_filter(filter)
        .json()
        .with_writer(writer)
        .try_init()
        .map_err(|e| LoggingError::Init {
            message: e.to_string(),
        })?;
    info!(
        service = %service,
        version = env!("CARGO_PKG_VERSION"),
        "logging initialised"
    );
    Ok(())
}

/// Opens `path` for appending, creating it if needed.
fn open_log_file(path: &Path) -> io::Result<File> {
    let parent = path.parent().unwrap_or_else(|| Path::new("."));
    let file_name = path.file_name().ok_or_else(|| {
        io::Error::new(io::ErrorKind::InvalidInput, "log path must include a file name")
    })?;
    let dir = Dir::open_ambient_dir(parent, ambient_authority())?;
    let mut options = OpenOptions::new();
    options.append(true).create(true);
    #[cfg(unix)]
    {
        use cap_std::fs::OpenOptionsExt as _;
        options.mode(LOG_FILE_MODE);
    }
    dir.open_with(file_name, &options)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::FixedProcess;
    use rstest::rstest;
    use std::io::Write as _;
    use tempfile::TempDir;

    #[rstest]
    #[case("/usr/local/bin/api")]
    #[case("/home/pacs/xyz00/users/foobar/doms/example.com/cgi/api.fcgi")]
    fn standalone_logs_to_stdout(#[case] exe: &str) {
        let probe = FixedProcess::new().with_executable(exe);
        assert_eq!(LogTarget::detect(&probe), Ok(LogTarget::Stdout));
    }

    #[rstest]
    fn unknown_executable_logs_to_stdout() {
        assert_eq!(LogTarget::detect(&FixedProcess::new()), Ok(LogTarget::Stdout));
    }

    #[rstest]
    fn gateway_logs_to_domain_file() {
        let probe = FixedProcess::new()
            .with_executable("/home/pacs/xyz00/users/foobar/doms/example.com/fastcgi/api.fcgi");
        assert_eq!(
            LogTarget::detect(&probe),
            Ok(LogTarget::File(Utf8PathBuf::from(
                "/home/pacs/xyz00/users/foobar/doms/example.com/var/api.log"
            )))
        );
    }

    #[rstest]
    fn gateway_outside_domain_is_an_error() {
        let probe = FixedProcess::new().with_executable("/srv/fastcgi/api.fcgi");
        let err = LogTarget::detect(&probe).expect_err("no domain");
        assert!(matches!(err, LoggingError::Identity { .. }), "{err}");
    }

    #[rstest]
    fn log_file_is_appended() {
        let dir = TempDir::new().expect("create temp dir");
        let path = dir.path().join("api.log");
        for line in ["first\n", "second\n"] {
            let mut file = open_log_file(&path).expect("open log file");
            file.write_all(line.as_bytes()).expect("write line");
        }
        let log = Dir::open_ambient_dir(dir.path(), ambient_authority())
            .expect("open temp dir")
            .read_to_string("api.log")
            .expect("read log");
        assert_eq!(log, "first\nsecond\n");
    }

    #[cfg(unix)]
    #[rstest]
    fn log_file_is_not_world_readable() {
        use std::os::unix::fs::PermissionsExt as _;

        let dir = TempDir::new().expect("create temp dir");
        let path = dir.path().join("api.log");
        let file = open_log_file(&path).expect("open log file");
        let mode = file
            .into_std()
            .metadata()
            .expect("metadata")
            .permissions()
            .mode();
        assert_eq!(mode & 0o007, 0);
    }

    #[rstest]
    fn missing_log_directory_is_reported() {
        let dir = TempDir::new().expect("create temp dir");
        let path = Utf8PathBuf::from_path_buf(dir.path().join("absent/api.log"))
            .expect("utf-8 temp path");
        let err = init_logging("api", &LogTarget::File(path)).expect_err("directory is missing");
        assert!(matches!(err, LoggingError::Open { .. }), "{err}");
    }
}
