//! Process location probes.
//!
//! Resolvers never ask the operating system for the executable path or the
//! working directory themselves. They receive a [`ProcessProbe`] instead, so
//! every resolution is a function of its explicit inputs and can be driven
//! from tests or CLI overrides.

use std::io;
use std::path::PathBuf;

/// Source of the two process locations the resolvers depend on.
pub trait ProcessProbe {
    /// Absolute path of the running executable.
    ///
    /// # Errors
    ///
    /// Returns an I/O error when the path cannot be determined.
    fn executable(&self) -> io::Result<PathBuf>;

    /// Current working directory of the process.
    ///
    /// # Errors
    ///
    /// Returns an I/O error when the directory cannot be determined.
    fn working_dir(&self) -> io::Result<PathBuf>;
}

/// Probe backed by the running process.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SystemProcess;

impl ProcessProbe for SystemProcess {
    fn executable(&self) -> io::Result<PathBuf> {
        std::env::current_exe()
    }

    fn working_dir(&self) -> io::Result<PathBuf> {
        std::env::current_dir()
    }
}

/// Probe returning fixed locations.
///
/// A location left unset reports [`io::ErrorKind::NotFound`].
///
/// # Examples
///
/// ```
/// use hostenv::{FixedProcess, ProcessProbe};
///
/// let probe = FixedProcess::new()
///     .with_executable("/home/pacs/xyz00/users/foo/doms/foo.example/fastcgi-ssl/api.fcgi");
/// assert!(probe.executable().is_ok());
/// assert!(probe.working_dir().is_err());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FixedProcess {
    executable: Option<PathBuf>,
    working_dir: Option<PathBuf>,
}

impl FixedProcess {
    /// Creates a probe with neither location set.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            executable: None,
            working_dir: None,
        }
    }

    /// Sets the executable path.
    #[must_use]
    pub fn with_executable(mut self, path: impl Into<PathBuf>) -> Self {
        self.executable = Some(path.into());
        self
    }

    /// Sets the working directory.
    #[must_use]
    pub fn with_working_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(path.into());
        self
    }
}

impl ProcessProbe for FixedProcess {
    fn executable(&self) -> io::Result<PathBuf> {
        self.executable
            .clone()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "executable path not set"))
    }

    fn working_dir(&self) -> io::Result<PathBuf> {
        self.working_dir
            .clone()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "working directory not set"))
    }
}

/// Probe that overlays optional fixed locations on top of another probe.
///
/// Used by the CLI to let `--executable` and `--working-dir` replace the
/// real process values one at a time.
#[derive(Debug, Clone)]
pub struct OverrideProcess<P> {
    inner: P,
    overrides: FixedProcess,
}

impl<P: ProcessProbe> OverrideProcess<P> {
    /// Wraps `inner`, consulting `overrides` first.
    #[must_use]
    pub const fn new(inner: P, overrides: FixedProcess) -> Self {
        Self { inner, overrides }
    }
}

impl<P: ProcessProbe> ProcessProbe for OverrideProcess<P> {
    fn executable(&self) -> io::Result<PathBuf> {
        self.overrides
            .executable
            .clone()
            .map_or_else(|| self.inner.executable(), Ok)
    }

    fn working_dir(&self) -> io::Result<PathBuf> {
        self.overrides
            .working_dir
            .clone()
            .map_or_else(|| self.inner.working_dir(), Ok)
    }
}
