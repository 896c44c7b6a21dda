//! Support for the `hostenv` inspection CLI.
//!
//! The binary parses arguments and delegates to [`run`], so every command
//! can be exercised in tests with an injected environment, probe and output
//! buffer. Reports are `key=value` lines.

mod error;

use std::io::Write;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use mockable::Env;

pub use error::CliError;

use crate::config::ConfigLoader;
use crate::error::IdentityError;
use crate::identity::{DomainIdentity, UserIdentity};
use crate::logging::LogTarget;
use crate::mode::{ListenMode, is_gateway_invoked};
use crate::process::{FixedProcess, OverrideProcess, ProcessProbe};
use crate::service::service_name;

/// `hostenv` command arguments.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "hostenv",
    about = "Inspect the hosting identity, directories and configuration of a service",
    version
)]
pub struct Cli {
    /// Executable path to resolve instead of the running one.
    #[arg(long, value_name = "path", global = true)]
    pub executable: Option<PathBuf>,
    /// Working directory to resolve instead of the current one.
    #[arg(long = "working-dir", value_name = "path", global = true)]
    pub working_dir: Option<PathBuf>,
    /// Report to print.
    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Wraps `system` so the `--executable` and `--working-dir` flags take
    /// precedence over it.
    #[must_use]
    pub fn probe<P: ProcessProbe>(&self, system: P) -> OverrideProcess<P> {
        let mut overrides = FixedProcess::new();
        if let Some(path) = &self.executable {
            overrides = overrides.with_executable(path.clone());
        }
        if let Some(path) = &self.working_dir {
            overrides = overrides.with_working_dir(path.clone());
        }
        OverrideProcess::new(system, overrides)
    }
}

/// Reports offered by the CLI.
#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Account, sub-user and domain of the working directory.
    Identity,
    /// Home, configuration, log and data directories of the working
    /// directory's identity.
    Dirs,
    /// Resolved service name.
    ServiceName,
    /// Gateway detection, listen mode and log destination.
    Mode,
    /// Chosen configuration source and its decoded document.
    Config {
        /// Service name to load instead of the resolved one.
        #[arg(long, value_name = "name")]
        service: Option<String>,
    },
}

/// Identity of the working directory: a domain when the path is deep
/// enough, otherwise the account or sub-user.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Resolved {
    Domain(DomainIdentity),
    User(UserIdentity),
}

impl Resolved {
    const fn user(&self) -> &UserIdentity {
        match self {
            Self::Domain(domain) => domain.user(),
            Self::User(user) => user,
        }
    }
}

/// Executes `command`, writing its report to `out`.
///
/// # Errors
///
/// Returns [`CliError`] when the report cannot be resolved or written.
pub fn run<E, P, W>(command: &Command, env: &E, probe: &P, out: &mut W) -> Result<(), CliError>
where
    E: Env,
    P: ProcessProbe,
    W: Write,
{
    match command {
        Command::Identity => write_identity(&resolve(probe)?, out),
        Command::Dirs => write_dirs(&resolve(probe)?, out),
        Command::ServiceName => {
            writeln!(out, "service={}", service_name(env, probe)?)?;
            Ok(())
        }
        Command::Mode => write_mode(env, probe, out),
        Command::Config { service } => write_config(env, probe, service.as_deref(), out),
    }
}

fn resolve<P: ProcessProbe>(probe: &P) -> Result<Resolved, IdentityError> {
    let cwd = probe
        .working_dir()
        .map_err(|e| IdentityError::WorkingDirUnavailable {
            message: e.to_string(),
        })?;
    let path = cwd.to_string_lossy();
    match DomainIdentity::parse(&path) {
        Ok(domain) => Ok(Resolved::Domain(domain)),
        Err(err) if err.is_path_too_short() => UserIdentity::parse(&path).map(Resolved::User),
        Err(err) => Err(err),
    }
}

fn write_identity<W: Write>(resolved: &Resolved, out: &mut W) -> Result<(), CliError> {
    let user = resolved.user();
    writeln!(out, "account={}", user.account())?;
    writeln!(out, "subuser={}", user.subuser().unwrap_or_default())?;
    writeln!(out, "user={}", user.user_label())?;
    if let Resolved::Domain(domain) = resolved {
        writeln!(out, "domain={}", domain.domain())?;
    }
    Ok(())
}

fn write_dirs<W: Write>(resolved: &Resolved, out: &mut W) -> Result<(), CliError> {
    let user = resolved.user();
    writeln!(out, "home={}", user.home())?;
    writeln!(out, "config_dir={}", user.config_dir())?;
    writeln!(out, "log_dir={}", user.log_dir())?;
    if let Resolved::Domain(domain) = resolved {
        writeln!(out, "domain_config_dir={}", domain.config_dir())?;
        writeln!(out, "domain_log_dir={}", domain.log_dir())?;
        writeln!(out, "domain_data_dir={}", domain.data_dir())?;
    }
    Ok(())
}

fn write_mode<E: Env, P: ProcessProbe, W: Write>(
    env: &E,
    probe: &P,
    out: &mut W,
) -> Result<(), CliError> {
    writeln!(out, "gateway={}", is_gateway_invoked(probe))?;
    writeln!(out, "listen={}", ListenMode::detect(env, probe))?;
    match LogTarget::detect(probe)? {
        LogTarget::Stdout => writeln!(out, "log=stdout")?,
        LogTarget::File(path) => writeln!(out, "log={path}")?,
    }
    Ok(())
}

fn write_config<E: Env, P: ProcessProbe, W: Write>(
    env: &E,
    probe: &P,
    service: Option<&str>,
    out: &mut W,
) -> Result<(), CliError> {
    let mut loader = ConfigLoader::new(env, probe);
    if let Some(name) = service {
        loader = loader.service_name(name);
    }
    let source = loader.locate()?;
    let document = source.parse()?;
    writeln!(out, "source={}", source.path.display())?;
    writeln!(out, "tier={}", source.tier)?;
    writeln!(out, "format={}", source.format)?;
    writeln!(out, "document={document}")?;
    Ok(())
}
