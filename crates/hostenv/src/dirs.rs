//! Canonical directories of a hosting identity.
//!
//! All directories hang off the identity's home:
//!
//! ```text
//! /home/pacs/<account>                          account home
//! /home/pacs/<account>/users/<subuser>          sub-user home
//! <home>/etc, <home>/var                        config, log
//! <home>/doms/<domain>/{etc,var,data}           domain config, log, data
//! ```

use std::path::Path;

use camino::Utf8PathBuf;

use crate::error::LoggingError;
use crate::identity::{DomainIdentity, UserIdentity};
use crate::service::strip_gateway_suffix;

const PACS_ROOT: &str = "/home/pacs";
const USERS_SEGMENT: &str = "users";
const DOMAINS_SEGMENT: &str = "doms";
const CONFIG_LEAF: &str = "etc";
const LOG_LEAF: &str = "var";
const DATA_LEAF: &str = "data";
const LOG_EXTENSION: &str = "log";

impl UserIdentity {
    /// Home directory of the account or sub-user.
    ///
    /// # Examples
    ///
    /// ```
    /// use hostenv::UserIdentity;
    ///
    /// let pac = UserIdentity::new("xyz00", None);
    /// assert_eq!(pac.home(), "/home/pacs/xyz00");
    ///
    /// let user = UserIdentity::new("xyz00", Some("foobar".to_owned()));
    /// assert_eq!(user.home(), "/home/pacs/xyz00/users/foobar");
    /// ```
    #[must_use]
    pub fn home(&self) -> Utf8PathBuf {
        let account_home = Utf8PathBuf::from(PACS_ROOT).join(self.account());
        match self.subuser() {
            Some(subuser) => account_home.join(USERS_SEGMENT).join(subuser),
            None => account_home,
        }
    }

    /// Configuration directory, `<home>/etc`.
    #[must_use]
    pub fn config_dir(&self) -> Utf8PathBuf {
        self.home().join(CONFIG_LEAF)
    }

    /// Log directory, `<home>/var`.
    #[must_use]
    pub fn log_dir(&self) -> Utf8PathBuf {
        self.home().join(LOG_LEAF)
    }
}

impl DomainIdentity {
    /// Home directory of the owning sub-user.
    #[must_use]
    pub fn home(&self) -> Utf8PathBuf {
        self.user().home()
    }

    /// Domain configuration directory, `<home>/doms/<domain>/etc`.
    ///
    /// # Examples
    ///
    /// ```
    /// use hostenv::DomainIdentity;
    ///
    /// let domain = DomainIdentity::new("xyz00", "foobar", "example.com");
    /// assert_eq!(
    ///     domain.config_dir(),
    ///     "/home/pacs/xyz00/users/foobar/doms/example.com/etc"
    /// );
    /// ```
    #[must_use]
    pub fn config_dir(&self) -> Utf8PathBuf {
        self.domain_root().join(CONFIG_LEAF)
    }

    /// Domain log directory, `<home>/doms/<domain>/var`.
    #[must_use]
    pub fn log_dir(&self) -> Utf8PathBuf {
        self.domain_root().join(LOG_LEAF)
    }

    /// Domain data directory, `<home>/doms/<domain>/data`.
    #[must_use]
    pub fn data_dir(&self) -> Utf8PathBuf {
        self.domain_root().join(DATA_LEAF)
    }

    fn domain_root(&self) -> Utf8PathBuf {
        self.home().join(DOMAINS_SEGMENT).join(self.domain())
    }
}

/// Log file of a gateway-invoked executable.
///
/// The file lives in the log directory of the domain the executable is
/// installed under and is named after the executable, without the `.fcgi`
/// suffix.
///
/// # Errors
///
/// Returns [`LoggingError::Identity`] when the executable is not installed
/// under a domain and [`LoggingError::NoFileName`] when the path has no final
/// component.
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use hostenv::gateway_log_file;
///
/// let log = gateway_log_file(Path::new(
///     "/home/pacs/xyz00/users/example/doms/example.com/fastcgi-ssl/api.fcgi",
/// ))
/// .expect("executable inside a domain");
/// assert_eq!(log, "/home/pacs/xyz00/users/example/doms/example.com/var/api.log");
/// ```
pub fn gateway_log_file(executable: &Path) -> Result<Utf8PathBuf, LoggingError> {
    let domain = DomainIdentity::parse(&executable.to_string_lossy())?;
    let file_name = executable
        .file_name()
        .ok_or_else(|| LoggingError::NoFileName {
            path: executable.to_path_buf(),
        })?
        .to_string_lossy();
    let stem = strip_gateway_suffix(&file_name);
    Ok(domain.log_dir().join(format!("{stem}.{LOG_EXTENSION}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::IdentityError;
    use rstest::rstest;

    fn subuser(name: &str) -> Option<String> {
        Some(name.to_owned())
    }

    #[rstest]
    #[case(UserIdentity::new("xyz00", None), "/home/pacs/xyz00")]
    #[case(UserIdentity::new("xyz00", subuser("example")), "/home/pacs/xyz00/users/example")]
    #[case(
        UserIdentity::new("xyz00", subuser("www.example.com")),
        "/home/pacs/xyz00/users/www.example.com"
    )]
    fn user_home(#[case] user: UserIdentity, #[case] expected: &str) {
        assert_eq!(user.home(), expected);
    }

    #[rstest]
    #[case(UserIdentity::new("xyz00", None), "/home/pacs/xyz00/etc", "/home/pacs/xyz00/var")]
    #[case(
        UserIdentity::new("xyz00", subuser("example")),
        "/home/pacs/xyz00/users/example/etc",
        "/home/pacs/xyz00/users/example/var"
    )]
    #[case(
        UserIdentity::new("xyz00", subuser("www.example.com")),
        "/home/pacs/xyz00/users/www.example.com/etc",
        "/home/pacs/xyz00/users/www.example.com/var"
    )]
    fn user_config_and_log_dirs(
        #[case] user: UserIdentity,
        #[case] config: &str,
        #[case] log: &str,
    ) {
        assert_eq!(user.config_dir(), config);
        assert_eq!(user.log_dir(), log);
    }

    #[rstest]
    #[case("example", "/home/pacs/xyz00/users/example")]
    #[case("www.example.com", "/home/pacs/xyz00/users/www.example.com")]
    fn domain_home_is_user_home(#[case] sub: &str, #[case] expected: &str) {
        let domain = DomainIdentity::new("xyz00", sub, "example.com");
        assert_eq!(domain.home(), expected);
    }

    #[rstest]
    fn domain_dirs_nest_under_doms() {
        let domain = DomainIdentity::new("xyz00", "foobar", "example.com");
        let root = "/home/pacs/xyz00/users/foobar/doms/example.com";
        assert_eq!(domain.config_dir(), format!("{root}/etc"));
        assert_eq!(domain.log_dir(), format!("{root}/var"));
        assert_eq!(domain.data_dir(), format!("{root}/data"));
    }

    #[rstest]
    #[case(
        "/home/pacs/xyz00/users/example/doms/example.com/fastcgi-ssl/api.fcgi",
        "/home/pacs/xyz00/users/example/doms/example.com/var/api.log"
    )]
    #[case(
        "/home/pacs/xyz00/users/example/doms/example.com/fastcgi-ssl/foobar.fcgi",
        "/home/pacs/xyz00/users/example/doms/example.com/var/foobar.log"
    )]
    #[case(
        "/home/pacs/xyz00/users/example/doms/example.com/fastcgi/foobar.fcgi",
        "/home/pacs/xyz00/users/example/doms/example.com/var/foobar.log"
    )]
    fn gateway_log_file_lives_in_domain_log_dir(#[case] exe: &str, #[case] expected: &str) {
        let log = gateway_log_file(Path::new(exe)).expect("executable inside a domain");
        assert_eq!(log, expected);
    }

    #[rstest]
    fn gateway_log_file_requires_domain() {
        let err = gateway_log_file(Path::new("/usr/local/bin/api.fcgi"))
            .expect_err("executable outside a domain");
        assert!(matches!(
            err,
            LoggingError::Identity {
                source: IdentityError::PathTooShort { .. }
            }
        ));
    }
}
