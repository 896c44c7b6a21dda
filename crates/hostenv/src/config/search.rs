//! Search plan for configuration directories.
//!
//! The plan is rebuilt for every load and holds the directories unexpanded.
//! [`find_first`] expands them against the injected environment and returns
//! the first candidate file that exists.

use std::fmt;
use std::path::{Path, PathBuf};

use cap_std::{ambient_authority, fs::Dir};
use mockable::Env;
use tracing::debug;

use crate::identity::DomainIdentity;

/// File names probed in each search directory, in order.
pub const CONFIG_FILE_NAMES: [&str; 5] = [
    "config.json",
    "config.toml",
    "config.yaml",
    "config.yml",
    "config",
];

/// Precedence tier a configuration source was found in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Tier {
    /// `.<service>.conf` in the working directory.
    Local,
    /// `<service>` below the configuration directory of the working
    /// directory's domain.
    Domain,
    /// `.<service>` below `$HOME`.
    Home,
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Local => "local",
            Self::Domain => "domain",
            Self::Home => "home",
        })
    }
}

/// A directory to probe for [`CONFIG_FILE_NAMES`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchDir {
    tier: Tier,
    dir: String,
}

impl SearchDir {
    /// Creates a search directory; `dir` may contain `$VAR` references.
    #[must_use]
    pub fn new(tier: Tier, dir: impl Into<String>) -> Self {
        Self {
            tier,
            dir: dir.into(),
        }
    }

    /// Tier the directory belongs to.
    #[must_use]
    pub const fn tier(&self) -> Tier {
        self.tier
    }

    /// The directory as written, before expansion.
    #[must_use]
    pub fn raw(&self) -> &str {
        &self.dir
    }

    /// The directory with `$VAR` and `${VAR}` references expanded from
    /// `env`. Unknown variables are left in place.
    #[must_use]
    pub fn expand<E: Env>(&self, env: &E) -> PathBuf {
        PathBuf::from(
            shellexpand::env_with_context_no_errors(&self.dir, |key: &str| env.string(key))
                .into_owned(),
        )
    }
}

/// A file chosen by [`find_first`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    /// Tier of the directory the file was found in.
    pub tier: Tier,
    /// Path of the file as seen by the process.
    pub path: PathBuf,
}

/// Builds the directory plan for `service`.
///
/// The domain tier is present only when the working directory resolved to a
/// domain. The home tier is always present.
#[must_use]
pub fn search_dirs(service: &str, domain: Option<&DomainIdentity>) -> Vec<SearchDir> {
    let mut dirs = Vec::with_capacity(2);
    if let Some(domain) = domain {
        dirs.push(SearchDir::new(
            Tier::Domain,
            domain.config_dir().join(service).into_string(),
        ));
    }
    dirs.push(SearchDir::new(Tier::Home, format!("$HOME/.{service}")));
    dirs
}

/// Returns the first existing file of the plan.
///
/// Directories are probed in order, and within each directory the names of
/// [`CONFIG_FILE_NAMES`] in order. Expanded directories are resolved below
/// `root`; one that is still relative after expansion, such as `$HOME/.api`
/// with `HOME` unset, is treated as absent.
#[must_use]
pub fn find_first<E: Env>(dirs: &[SearchDir], env: &E, root: &Path) -> Option<Candidate> {
    dirs.iter().find_map(|search_dir| {
        let expanded = search_dir.expand(env);
        if !expanded.is_absolute() {
            debug!(tier = %search_dir.tier(), dir = %expanded.display(), "search directory unresolved");
            return None;
        }
        let Ok(dir) = Dir::open_ambient_dir(rooted(root, &expanded), ambient_authority()) else {
            debug!(tier = %search_dir.tier(), dir = %expanded.display(), "search directory absent");
            return None;
        };
        CONFIG_FILE_NAMES.iter().find_map(|name| {
            if dir.is_file(name) {
                Some(Candidate {
                    tier: search_dir.tier(),
                    path: expanded.join(name),
                })
            } else {
                debug!(tier = %search_dir.tier(), candidate = %expanded.join(name).display(), "no config file");
                None
            }
        })
    })
}

/// Resolves an absolute `path` below `root`; relative paths are returned
/// unchanged.
pub(crate) fn rooted(root: &Path, path: &Path) -> PathBuf {
    match path.strip_prefix("/") {
        Ok(relative) => root.join(relative),
        Err(_) => path.to_path_buf(),
    }
}
