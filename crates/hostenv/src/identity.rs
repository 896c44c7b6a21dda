//! Hosting identities parsed from convention paths.
//!
//! The hosting layout places every service below
//! `/home/pacs/<account>/users/<subuser>/doms/<domain>`. Parsing only counts
//! segments: the fixed prefixes (`home`, `pacs`, `users`, `doms`) are not
//! compared, and the identifying segments are taken verbatim.
//!
//! ```text
//! segment:  0    1    2        3     4         5    6
//!          home/pacs/<account>/users/<subuser>/doms/<domain>/...
//! ```

use crate::error::IdentityError;
use crate::process::ProcessProbe;

const ACCOUNT_INDEX: usize = 2;
const SUBUSER_INDEX: usize = 4;
const DOMAIN_INDEX: usize = 6;

/// Separator placed between account and sub-user in [`UserIdentity::user_label`].
pub const USER_LABEL_SEPARATOR: char = '-';

/// Account-level identity, optionally scoped to a sub-user.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UserIdentity {
    account: String,
    subuser: Option<String>,
}

impl UserIdentity {
    /// Builds an identity from its parts.
    #[must_use]
    pub fn new(account: impl Into<String>, subuser: Option<String>) -> Self {
        Self {
            account: account.into(),
            subuser,
        }
    }

    /// Parses an account identity from a convention path.
    ///
    /// At least three segments are required; the sub-user is present when
    /// the path has five or more.
    ///
    /// # Errors
    ///
    /// Returns [`IdentityError::PathTooShort`] when the path has fewer than
    /// three segments.
    ///
    /// # Examples
    ///
    /// ```
    /// use hostenv::UserIdentity;
    ///
    /// let user = UserIdentity::parse("/home/pacs/xyz00/users/foobar/").expect("valid path");
    /// assert_eq!(user.user_label(), "xyz00-foobar");
    ///
    /// let pac = UserIdentity::parse("/home/pacs/xyz00/users").expect("valid path");
    /// assert_eq!(pac.subuser(), None);
    /// ```
    pub fn parse(path: &str) -> Result<Self, IdentityError> {
        let parts = segments(path);
        let account = required_segment(path, &parts, ACCOUNT_INDEX)?;
        let subuser = parts.get(SUBUSER_INDEX).map(|s| (*s).to_owned());
        Ok(Self::new(account, subuser))
    }

    /// The hosting account identifier.
    #[must_use]
    pub fn account(&self) -> &str {
        &self.account
    }

    /// The sub-user, if the identity is scoped to one.
    #[must_use]
    pub fn subuser(&self) -> Option<&str> {
        self.subuser.as_deref()
    }

    /// Composite label: `account`, or `account-subuser` when a sub-user is
    /// present.
    ///
    /// The separator is not escaped, so distinct identities whose parts
    /// contain `-` can share a label.
    #[must_use]
    pub fn user_label(&self) -> String {
        match &self.subuser {
            Some(subuser) => format!("{}{USER_LABEL_SEPARATOR}{subuser}", self.account),
            None => self.account.clone(),
        }
    }
}

/// Domain-level identity: a named site below an account's sub-user.
///
/// A domain is always nested under a sub-user, so the sub-user of
/// [`DomainIdentity::user`] is always set.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DomainIdentity {
    user: UserIdentity,
    domain: String,
}

impl DomainIdentity {
    /// Builds a domain identity from its parts.
    #[must_use]
    pub fn new(
        account: impl Into<String>,
        subuser: impl Into<String>,
        domain: impl Into<String>,
    ) -> Self {
        Self {
            user: UserIdentity::new(account, Some(subuser.into())),
            domain: domain.into(),
        }
    }

    /// Parses a domain identity from a convention path.
    ///
    /// # Errors
    ///
    /// Returns [`IdentityError::PathTooShort`] when the path has fewer than
    /// seven segments, even if an account or sub-user could be read.
    ///
    /// # Examples
    ///
    /// ```
    /// use hostenv::DomainIdentity;
    ///
    /// let domain = DomainIdentity::parse(
    ///     "/home/pacs/xyz00/users/foobar/doms/example.com/fastcgi-ssl/api.fcgi",
    /// )
    /// .expect("valid path");
    /// assert_eq!(domain.domain(), "example.com");
    /// assert_eq!(domain.user().user_label(), "xyz00-foobar");
    ///
    /// assert!(DomainIdentity::parse("/home/pacs/xyz00/users/foobar/doms").is_err());
    /// ```
    pub fn parse(path: &str) -> Result<Self, IdentityError> {
        let parts = segments(path);
        let domain = required_segment(path, &parts, DOMAIN_INDEX)?;
        let user = UserIdentity::parse(path)?;
        Ok(Self {
            user,
            domain: domain.to_owned(),
        })
    }

    /// The account-level part of the identity.
    #[must_use]
    pub const fn user(&self) -> &UserIdentity {
        &self.user
    }

    /// The domain name.
    #[must_use]
    pub fn domain(&self) -> &str {
        &self.domain
    }
}

/// Resolves the domain identity of the probe's working directory.
///
/// # Errors
///
/// Returns [`IdentityError::WorkingDirUnavailable`] when the probe fails and
/// [`IdentityError::PathTooShort`] when the directory is not inside a domain.
pub fn domain_by_working_dir<P: ProcessProbe>(probe: &P) -> Result<DomainIdentity, IdentityError> {
    let dir = probe
        .working_dir()
        .map_err(|e| IdentityError::WorkingDirUnavailable {
            message: e.to_string(),
        })?;
    DomainIdentity::parse(&dir.to_string_lossy())
}

fn segments(path: &str) -> Vec<&str> {
    let trimmed = path.trim_matches('/');
    if trimmed.is_empty() {
        return Vec::new();
    }
    trimmed.split('/').collect()
}

fn required_segment<'a>(
    path: &str,
    parts: &[&'a str],
    index: usize,
) -> Result<&'a str, IdentityError> {
    parts
        .get(index)
        .copied()
        .ok_or_else(|| IdentityError::PathTooShort {
            path: path.to_owned(),
            required: index + 1,
            found: parts.len(),
        })
}
