//! Layered configuration loading.
//!
//! A service's configuration is read from the first source found in this
//! order:
//!
//! 1. `.<service>.conf` in the working directory. When it can be read it is
//!    the only source considered, even if it later fails to parse.
//! 2. `<domain config dir>/<service>/config.*` when the working directory
//!    lies inside a domain.
//! 3. `$HOME/.<service>/config.*`.
//!
//! Within each directory the names of [`CONFIG_FILE_NAMES`] are probed in
//! order. The chosen document is decoded through [`DecodeHooks`], so
//! base64 byte fields, duration strings and comma-separated lists work out
//! of the box.

mod decoder;
mod format;
mod hooks;
mod search;

use std::io;
use std::path::{Path, PathBuf};

use cap_std::{ambient_authority, fs::Dir};
use mockable::Env;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, info, warn};

pub use decoder::decode;
pub use format::Format;
pub use hooks::{
    Base64ToBytes, DecodeHook, DecodeHooks, StringToDuration, StringToSequence, Target,
};
pub use search::{CONFIG_FILE_NAMES, Candidate, SearchDir, Tier, find_first, search_dirs};

use crate::error::ConfigError;
use crate::identity::DomainIdentity;
use crate::process::ProcessProbe;
use crate::service::service_name;

const DEFAULT_ROOT: &str = "/";

/// A configuration file selected by [`ConfigLoader::locate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigSource {
    /// Path of the file as seen by the process.
    pub path: PathBuf,
    /// Tier the file was found in.
    pub tier: Tier,
    /// Syntax used to parse the file.
    pub format: Format,
    /// Raw file contents.
    pub contents: String,
}

impl ConfigSource {
    fn from_bytes(path: PathBuf, tier: Tier, bytes: Vec<u8>) -> Result<Self, ConfigError> {
        let contents = String::from_utf8(bytes).map_err(|e| ConfigError::Syntax {
            path: path.clone(),
            message: format!("not valid UTF-8: {e}"),
        })?;
        Ok(Self {
            format: Format::from_path(&path),
            path,
            tier,
            contents,
        })
    }

    /// Parses the contents into a value tree.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Syntax`] when the contents are not valid for
    /// [`ConfigSource::format`].
    pub fn parse(&self) -> Result<Value, ConfigError> {
        self.format
            .parse(&self.contents)
            .map_err(|message| ConfigError::Syntax {
                path: self.path.clone(),
                message,
            })
    }

    /// Parses the contents and decodes them into `T` through `hooks`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Syntax`] or [`ConfigError::Decode`].
    pub fn decode<T: DeserializeOwned>(&self, hooks: &DecodeHooks) -> Result<T, ConfigError> {
        let value = self.parse()?;
        decode(value, hooks).map_err(|source| ConfigError::Decode {
            path: self.path.clone(),
            source,
        })
    }
}

/// Loader for a service's layered configuration.
///
/// Keys are matched against the destination's serde field names exactly,
/// so `DB_PATH` does not fill a `db_path` field. Use `#[serde(rename)]` or
/// `#[serde(alias)]` to accept other spellings.
///
/// # Examples
///
/// ```no_run
/// use hostenv::SystemProcess;
/// use hostenv::config::ConfigLoader;
/// use mockable::DefaultEnv;
///
/// #[derive(serde::Deserialize)]
/// struct Settings {
///     greeting: String,
/// }
///
/// let env = DefaultEnv::new();
/// let settings: Settings = ConfigLoader::new(&env, &SystemProcess)
///     .load()
///     .expect("configuration should load");
/// println!("{}", settings.greeting);
/// ```
#[derive(Debug)]
pub struct ConfigLoader<'a, E, P> {
    env: &'a E,
    probe: &'a P,
    service: Option<String>,
    hooks: DecodeHooks,
    root: PathBuf,
}

impl<'a, E: Env, P: ProcessProbe> ConfigLoader<'a, E, P> {
    /// Creates a loader with the default hooks, resolving the service name
    /// from `env` and `probe`.
    #[must_use]
    pub fn new(env: &'a E, probe: &'a P) -> Self {
        Self {
            env,
            probe,
            service: None,
            hooks: DecodeHooks::defaults(),
            root: PathBuf::from(DEFAULT_ROOT),
        }
    }

    /// Uses `name` instead of resolving the service name.
    #[must_use]
    pub fn service_name(mut self, name: impl Into<String>) -> Self {
        self.service = Some(name.into());
        self
    }

    /// Replaces the default hooks. An empty list keeps the defaults.
    #[must_use]
    pub fn hooks(mut self, hooks: DecodeHooks) -> Self {
        if !hooks.is_empty() {
            self.hooks = hooks;
        }
        self
    }

    /// Resolves absolute paths below `root` instead of `/`.
    #[must_use]
    pub fn filesystem_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.root = root.into();
        self
    }

    /// Finds and reads the configuration file.
    ///
    /// # Errors
    ///
    /// - [`ConfigError::ServiceName`] when no service name is available.
    /// - [`ConfigError::WorkingDirUnavailable`] when the working directory
    ///   cannot be obtained. This is internal; see
    ///   [`ConfigError::is_internal`].
    /// - [`ConfigError::Read`] when the chosen search-tier file cannot be
    ///   read.
    /// - [`ConfigError::Syntax`] when the chosen file is not valid UTF-8.
    /// - [`ConfigError::NotFound`] when no tier yields a file.
    pub fn locate(&self) -> Result<ConfigSource, ConfigError> {
        let service = match &self.service {
            Some(name) => name.clone(),
            None => service_name(self.env, self.probe)?,
        };
        let cwd = self
            .probe
            .working_dir()
            .map_err(|e| ConfigError::WorkingDirUnavailable {
                message: e.to_string(),
            })?;

        let local = cwd.join(format!(".{service}.conf"));
        if let Some(source) = self.read_local(&local)? {
            info!(service = %service, path = %local.display(), tier = %Tier::Local, "configuration source selected");
            return Ok(source);
        }

        let domain = domain_tier(&cwd);
        let dirs = search_dirs(&service, domain.as_ref());
        let Some(candidate) = find_first(&dirs, self.env, &self.root) else {
            let searched = std::iter::once(local.display().to_string())
                .chain(dirs.iter().map(|dir| dir.expand(self.env).display().to_string()))
                .collect();
            return Err(ConfigError::NotFound { searched });
        };

        let bytes = self
            .read(&candidate.path)
            .map_err(|e| ConfigError::Read {
                path: candidate.path.clone(),
                message: e.to_string(),
            })?;
        info!(service = %service, path = %candidate.path.display(), tier = %candidate.tier, "configuration source selected");
        ConfigSource::from_bytes(candidate.path, candidate.tier, bytes)
    }

    /// Locates the configuration and decodes it into `T`.
    ///
    /// The value is returned only on success; a failed load never yields a
    /// partially filled destination.
    ///
    /// # Errors
    ///
    /// Any error of [`ConfigLoader::locate`], plus [`ConfigError::Syntax`]
    /// and [`ConfigError::Decode`].
    pub fn load<T: DeserializeOwned>(&self) -> Result<T, ConfigError> {
        self.locate()?.decode(&self.hooks)
    }

    /// Reads the local file. Any bytes that can be read make it the only
    /// source; only a file that cannot be opened or read falls through.
    fn read_local(&self, path: &Path) -> Result<Option<ConfigSource>, ConfigError> {
        match self.read(path) {
            Ok(bytes) => ConfigSource::from_bytes(path.to_path_buf(), Tier::Local, bytes).map(Some),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "no local configuration file");
                Ok(None)
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "skipping unreadable local configuration file");
                Ok(None)
            }
        }
    }

    fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        let full = search::rooted(&self.root, path);
        let parent = full.parent().unwrap_or_else(|| Path::new("."));
        let file_name = full.file_name().ok_or_else(|| {
            io::Error::new(io::ErrorKind::InvalidInput, "path must include a file name")
        })?;
        let dir = Dir::open_ambient_dir(parent, ambient_authority())?;
        dir.read(file_name)
    }
}

fn domain_tier(cwd: &Path) -> Option<DomainIdentity> {
    DomainIdentity::parse(&cwd.to_string_lossy())
        .inspect_err(|error| {
            debug!(cwd = %cwd.display(), error = %error, "working directory is outside a domain; skipping domain tier");
        })
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::FixedProcess;
    use mockable::MockEnv;
    use rstest::{fixture, rstest};
    use serde::Deserialize;
    use tempfile::TempDir;

    const DOMAIN_CWD: &str = "/home/pacs/xyz00/users/foobar/doms/example.com/subs/www";
    const HOME: &str = "/home/pacs/xyz00/users/foobar";

    #[derive(Debug, Deserialize, PartialEq)]
    struct Settings {
        greeting: String,
    }

    #[fixture]
    fn root() -> TempDir {
        TempDir::new().expect("create temp root")
    }

    fn env() -> MockEnv {
        let mut env = MockEnv::new();
        env.expect_string()
            .times(0..)
            .returning(|key| (key == "HOME").then(|| HOME.to_owned()));
        env
    }

    fn write(root: &Path, path: &str, contents: impl AsRef<[u8]>) {
        let full = search::rooted(root, Path::new(path));
        let parent = full.parent().expect("file has a parent");
        Dir::create_ambient_dir_all(parent, ambient_authority()).expect("create parent");
        let dir = Dir::open_ambient_dir(parent, ambient_authority()).expect("open parent");
        dir.write(full.file_name().expect("file has a name"), contents)
            .expect("write file");
    }

    fn loader<'a>(
        env: &'a MockEnv,
        probe: &'a FixedProcess,
        root: &TempDir,
    ) -> ConfigLoader<'a, MockEnv, FixedProcess> {
        ConfigLoader::new(env, probe)
            .service_name("api")
            .filesystem_root(root.path())
    }

    #[rstest]
    fn local_file_wins_over_search_tiers(root: TempDir) {
        write(root.path(), &format!("{DOMAIN_CWD}/.api.conf"), "greeting: local\n");
        write(
            root.path(),
            &format!("{HOME}/doms/example.com/etc/api/config.yaml"),
            "greeting: domain\n",
        );
        let env = env();
        let probe = FixedProcess::new().with_working_dir(DOMAIN_CWD);
        let source = loader(&env, &probe, &root).locate().expect("located");
        assert_eq!(source.tier, Tier::Local);
        assert_eq!(
            source.decode::<Settings>(&DecodeHooks::defaults()),
            Ok(Settings {
                greeting: "local".to_owned()
            })
        );
    }

    #[rstest]
    fn invalid_local_file_is_still_the_only_source(root: TempDir) {
        write(root.path(), &format!("{DOMAIN_CWD}/.api.conf"), "greeting: [\n");
        write(
            root.path(),
            &format!("{HOME}/.api/config.yaml"),
            "greeting: home\n",
        );
        let env = env();
        let probe = FixedProcess::new().with_working_dir(DOMAIN_CWD);
        let err = loader(&env, &probe, &root)
            .load::<Settings>()
            .expect_err("local file is invalid");
        assert!(matches!(err, ConfigError::Syntax { .. }), "{err}");
    }

    #[rstest]
    fn non_utf8_local_file_is_still_the_only_source(root: TempDir) {
        write(
            root.path(),
            &format!("{DOMAIN_CWD}/.api.conf"),
            b"greeting: \xff\xfe local\n",
        );
        write(root.path(), &format!("{HOME}/.api/config.yaml"), "greeting: home\n");
        let env = env();
        let probe = FixedProcess::new().with_working_dir(DOMAIN_CWD);
        let err = loader(&env, &probe, &root)
            .locate()
            .expect_err("local file is not UTF-8");
        assert!(
            matches!(err, ConfigError::Syntax { ref path, .. } if path.ends_with(".api.conf")),
            "{err}"
        );
    }

    #[rstest]
    fn unreadable_local_entry_falls_through(root: TempDir) {
        write(root.path(), &format!("{DOMAIN_CWD}/.api.conf/nested"), "greeting: nested\n");
        write(root.path(), &format!("{HOME}/.api/config.yaml"), "greeting: home\n");
        let env = env();
        let probe = FixedProcess::new().with_working_dir(DOMAIN_CWD);
        let source = loader(&env, &probe, &root).locate().expect("located");
        assert_eq!(source.tier, Tier::Home);
    }

    #[rstest]
    #[case("/tmp/build", None)]
    #[case(DOMAIN_CWD, Some("example.com"))]
    fn domain_tier_only_applies_inside_a_domain(#[case] cwd: &str, #[case] expected: Option<&str>) {
        let domain = domain_tier(Path::new(cwd));
        assert_eq!(domain.as_ref().map(DomainIdentity::domain), expected);
    }

    #[rstest]
    fn domain_tier_precedes_home(root: TempDir) {
        write(
            root.path(),
            &format!("{HOME}/doms/example.com/etc/api/config.toml"),
            "greeting = \"domain\"\n",
        );
        write(root.path(), &format!("{HOME}/.api/config.json"), r#"{"greeting": "home"}"#);
        let env = env();
        let probe = FixedProcess::new().with_working_dir(DOMAIN_CWD);
        let source = loader(&env, &probe, &root).locate().expect("located");
        assert_eq!(source.tier, Tier::Domain);
        assert_eq!(source.format, Format::Toml);
    }

    #[rstest]
    fn outside_a_domain_falls_back_to_home(root: TempDir) {
        write(root.path(), &format!("{HOME}/.api/config"), "greeting: home\n");
        let env = env();
        let probe = FixedProcess::new().with_working_dir("/tmp/build");
        let settings: Settings = loader(&env, &probe, &root).load().expect("loads");
        assert_eq!(settings.greeting, "home");
    }

    #[rstest]
    fn nothing_found_lists_every_location(root: TempDir) {
        let env = env();
        let probe = FixedProcess::new().with_working_dir(DOMAIN_CWD);
        let err = loader(&env, &probe, &root).locate().expect_err("nothing to find");
        assert_eq!(
            err,
            ConfigError::NotFound {
                searched: vec![
                    format!("{DOMAIN_CWD}/.api.conf"),
                    format!("{HOME}/doms/example.com/etc/api"),
                    format!("{HOME}/.api"),
                ],
            }
        );
    }

    #[rstest]
    fn missing_working_dir_is_internal(root: TempDir) {
        let env = env();
        let probe = FixedProcess::new();
        let err = loader(&env, &probe, &root).locate().expect_err("no working dir");
        assert!(err.is_internal(), "{err}");
    }

    #[rstest]
    fn service_name_is_resolved_from_executable(root: TempDir) {
        write(root.path(), &format!("{HOME}/.hello/config.yml"), "greeting: hi\n");
        let env = env();
        let probe = FixedProcess::new()
            .with_executable(format!("{HOME}/doms/example.com/fastcgi-ssl/hello.fcgi"))
            .with_working_dir("/tmp");
        let settings: Settings = ConfigLoader::new(&env, &probe)
            .filesystem_root(root.path())
            .load()
            .expect("loads");
        assert_eq!(settings.greeting, "hi");
    }

    #[rstest]
    fn empty_document_decodes_into_defaults(root: TempDir) {
        #[derive(Debug, Default, Deserialize, PartialEq)]
        struct Optional {
            #[serde(default)]
            greeting: Option<String>,
        }
        write(root.path(), &format!("{HOME}/.api/config.yaml"), "");
        let env = env();
        let probe = FixedProcess::new().with_working_dir("/tmp");
        let value: Optional = loader(&env, &probe, &root).load().expect("loads");
        assert_eq!(value, Optional::default());
    }

    #[rstest]
    fn type_mismatch_is_a_decode_error(root: TempDir) {
        write(root.path(), &format!("{HOME}/.api/config.yaml"), "greeting: [1, 2]\n");
        let env = env();
        let probe = FixedProcess::new().with_working_dir("/tmp");
        let err = loader(&env, &probe, &root)
            .load::<Settings>()
            .expect_err("wrong type");
        assert!(matches!(err, ConfigError::Decode { .. }), "{err}");
    }
}
