//! Host-scoped credentials for release mirrors.
//!
//! Credentials come from `SCIENCE_AUTH_<HOST>_*` environment variables,
//! where `<HOST>` is the upper-cased hostname with `.` and `-` replaced by
//! `_`, falling back to a netrc file:
//!
//! - `SCIENCE_AUTH_<HOST>_BEARER`: a bearer token;
//! - `SCIENCE_AUTH_<HOST>_BASIC_USER` and `SCIENCE_AUTH_<HOST>_BASIC_PASS`.
//!
//! Configuring more than one scheme for a host is an error.

use crate::dirs::BaseDirs;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

/// Prefix shared by every credential environment variable.
pub const AUTH_ENV_PREFIX: &str = "SCIENCE_AUTH_";

/// Credentials sent to one host.
#[derive(Clone, PartialEq, Eq)]
pub enum Credential {
    /// `Authorization: Bearer <token>`.
    Bearer(String),
    /// `Authorization: Basic <base64(user:password)>`.
    Basic {
        /// The user name.
        user: String,
        /// The password.
        password: String,
    },
}

impl Credential {
    /// Return the `Authorization` header value.
    ///
    /// # Examples
    ///
    /// ```
    /// use science_installer::fetch::auth::Credential;
    ///
    /// let basic = Credential::Basic { user: "user".into(), password: "pass".into() };
    /// assert_eq!(basic.header_value(), "Basic dXNlcjpwYXNz");
    /// ```
    #[must_use]
    pub fn header_value(&self) -> String {
        match self {
            Self::Bearer(token) => format!("Bearer {token}"),
            Self::Basic { user, password } => {
                format!("Basic {}", STANDARD.encode(format!("{user}:{password}")))
            }
        }
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bearer(_) => f.write_str("Bearer(<redacted>)"),
            Self::Basic { user, .. } => write!(f, "Basic({user}, <redacted>)"),
        }
    }
}

/// Why the configured credentials for a host cannot be used.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    /// More than one scheme was configured.
    #[error("{scheme} auth was configured for {host} but so was: {others}")]
    Ambiguous {
        /// The hostname.
        host: String,
        /// The scheme chosen first.
        scheme: &'static str,
        /// The other variables set for the host.
        others: String,
    },

    /// A user was configured without a password.
    #[error("basic auth for {host} requires a password in {var}")]
    MissingPassword {
        /// The hostname.
        host: String,
        /// The variable that must be set.
        var: String,
    },

    /// The variable names a scheme the transport cannot send.
    #[error("{var} configures digest auth, which is not supported")]
    UnsupportedScheme {
        /// The offending variable.
        var: String,
    },
}

/// Credential sources captured at startup.
#[derive(Clone, Default)]
pub struct AuthConfig {
    vars: BTreeMap<String, String>,
    netrc: Vec<NetrcEntry>,
}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthConfig")
            .field("vars", &self.vars.keys().collect::<Vec<_>>())
            .field("netrc_entries", &self.netrc.len())
            .finish()
    }
}

impl AuthConfig {
    /// Capture `SCIENCE_AUTH_*` variables and the user's netrc file.
    ///
    /// The netrc file is `$NETRC` when set, otherwise `~/.netrc`. An
    /// unreadable netrc file is ignored.
    #[must_use]
    pub fn from_env(dirs: &dyn BaseDirs) -> Self {
        let netrc_path = std::env::var_os("NETRC")
            .map(PathBuf::from)
            .or_else(|| dirs.home_dir().map(|home| home.join(".netrc")));
        let netrc = netrc_path.and_then(|path| match std::fs::read_to_string(&path) {
            Ok(text) => Some(text),
            Err(e) => {
                log::trace!("not using netrc {}: {e}", path.display());
                None
            }
        });
        let vars = std::env::vars_os()
            .filter_map(|(key, value)| Some((key.into_string().ok()?, value.into_string().ok()?)));
        Self::new(vars, netrc.as_deref())
    }

    /// Build from explicit variables and netrc contents.
    #[must_use]
    pub fn new(vars: impl IntoIterator<Item = (String, String)>, netrc: Option<&str>) -> Self {
        Self {
            vars: vars
                .into_iter()
                .filter(|(key, _)| key.starts_with(AUTH_ENV_PREFIX))
                .collect(),
            netrc: netrc.map(parse_netrc).unwrap_or_default(),
        }
    }

    /// Return the credential to send to the host of `url`, if any.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError`] when the variables for the host are
    /// ambiguous, incomplete, or name an unsupported scheme.
    ///
    /// # Examples
    ///
    /// ```
    /// use science_installer::fetch::auth::{AuthConfig, Credential};
    ///
    /// let vars = [("SCIENCE_AUTH_MIRROR_EXAMPLE_COM_BEARER".to_owned(), "t0k".to_owned())];
    /// let auth = AuthConfig::new(vars, None);
    /// assert_eq!(
    ///     auth.credential_for("https://mirror.example.com/releases/x")?,
    ///     Some(Credential::Bearer("t0k".into()))
    /// );
    /// assert_eq!(auth.credential_for("https://other.example.com/x")?, None);
    /// # Ok::<(), science_installer::fetch::auth::AuthError>(())
    /// ```
    pub fn credential_for(&self, url: &str) -> Result<Option<Credential>, AuthError> {
        let Some(host) = url_host(url) else {
            return Ok(None);
        };
        let prefix = format!("{AUTH_ENV_PREFIX}{}_", normalize_host(&host));
        let mut scoped: BTreeMap<&str, &str> = self
            .vars
            .iter()
            .filter(|(key, _)| key.starts_with(&prefix))
            .map(|(key, value)| (key.as_str(), value.as_str()))
            .collect();
        let bearer_var = format!("{prefix}BEARER");
        let user_var = format!("{prefix}BASIC_USER");
        let pass_var = format!("{prefix}BASIC_PASS");
        let digest_var = format!("{prefix}DIGEST_USER");

        if let Some(token) = scoped.remove(bearer_var.as_str()).filter(|t| !t.is_empty()) {
            ensure_unambiguous(&host, "bearer", &scoped)?;
            return Ok(Some(Credential::Bearer(token.to_owned())));
        }
        if let Some(user) = scoped.remove(user_var.as_str()).filter(|u| !u.is_empty()) {
            let password = scoped
                .remove(pass_var.as_str())
                .filter(|p| !p.is_empty())
                .ok_or_else(|| AuthError::MissingPassword {
                    host: host.clone(),
                    var: pass_var.clone(),
                })?;
            ensure_unambiguous(&host, "basic", &scoped)?;
            return Ok(Some(Credential::Basic {
                user: user.to_owned(),
                password: password.to_owned(),
            }));
        }
        if scoped.contains_key(digest_var.as_str()) {
            return Err(AuthError::UnsupportedScheme { var: digest_var });
        }
        Ok(self.netrc_credential(&host))
    }

    fn netrc_credential(&self, host: &str) -> Option<Credential> {
        let matching = self
            .netrc
            .iter()
            .find(|entry| entry.machine.as_deref() == Some(host))
            .or_else(|| self.netrc.iter().find(|entry| entry.machine.is_none()))?;
        Some(Credential::Basic {
            user: matching.login.clone(),
            password: matching.password.clone(),
        })
    }
}

fn ensure_unambiguous(
    host: &str,
    scheme: &'static str,
    remaining: &BTreeMap<&str, &str>,
) -> Result<(), AuthError> {
    if remaining.is_empty() {
        return Ok(());
    }
    Err(AuthError::Ambiguous {
        host: host.to_owned(),
        scheme,
        others: remaining.keys().copied().collect::<Vec<_>>().join(", "),
    })
}

fn url_host(url: &str) -> Option<String> {
    let uri: ureq::http::Uri = url.parse().ok()?;
    uri.host()
        .filter(|host| !host.is_empty())
        .map(str::to_ascii_lowercase)
}

fn normalize_host(host: &str) -> String {
    host.to_ascii_uppercase().replace(['.', '-'], "_")
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct NetrcEntry {
    /// `None` for the `default` entry.
    machine: Option<String>,
    login: String,
    password: String,
}

/// Parse the `machine`/`default`, `login` and `password` tokens of a
/// netrc file. Macro definitions end the parse.
fn parse_netrc(text: &str) -> Vec<NetrcEntry> {
    let mut entries = Vec::new();
    let mut current: Option<NetrcEntry> = None;
    let mut tokens = text.split_whitespace();
    while let Some(token) = tokens.next() {
        match token {
            "machine" | "default" => {
                entries.extend(current.take());
                let machine = if token == "machine" {
                    tokens.next().map(str::to_ascii_lowercase)
                } else {
                    None
                };
                current = Some(NetrcEntry {
                    machine,
                    ..NetrcEntry::default()
                });
            }
            "login" => {
                if let (Some(entry), Some(value)) = (current.as_mut(), tokens.next()) {
                    value.clone_into(&mut entry.login);
                }
            }
            "password" => {
                if let (Some(entry), Some(value)) = (current.as_mut(), tokens.next()) {
                    value.clone_into(&mut entry.password);
                }
            }
            "account" => {
                tokens.next();
            }
            "macdef" => break,
            _ => {}
        }
    }
    entries.extend(current);
    entries
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    const URL: &str = "https://mirror-1.example.com/releases/latest/download/science";
    const PREFIX: &str = "SCIENCE_AUTH_MIRROR_1_EXAMPLE_COM";

    fn config(vars: &[(&str, &str)], netrc: Option<&str>) -> AuthConfig {
        AuthConfig::new(
            vars.iter()
                .map(|(key, value)| ((*key).to_owned(), (*value).to_owned())),
            netrc,
        )
    }

    #[test]
    fn bearer_token_is_scoped_to_host() {
        let auth = config(&[(format!("{PREFIX}_BEARER").as_str(), "secret")], None);

        assert_eq!(
            auth.credential_for(URL).expect("valid"),
            Some(Credential::Bearer("secret".to_owned()))
        );
        assert_eq!(
            auth.credential_for("https://github.com/a-scie/lift/releases")
                .expect("valid"),
            None
        );
    }

    #[test]
    fn basic_credentials_are_base64_encoded() {
        let auth = config(
            &[
                (format!("{PREFIX}_BASIC_USER").as_str(), "Aladdin"),
                (format!("{PREFIX}_BASIC_PASS").as_str(), "open sesame"),
            ],
            None,
        );

        let credential = auth.credential_for(URL).expect("valid").expect("configured");

        assert_eq!(
            credential.header_value(),
            "Basic QWxhZGRpbjpvcGVuIHNlc2FtZQ=="
        );
    }

    #[test]
    fn basic_user_without_password_is_rejected() {
        let auth = config(&[(format!("{PREFIX}_BASIC_USER").as_str(), "user")], None);

        let err = auth.credential_for(URL).expect_err("missing password");

        assert_eq!(
            err,
            AuthError::MissingPassword {
                host: "mirror-1.example.com".to_owned(),
                var: format!("{PREFIX}_BASIC_PASS"),
            }
        );
    }

    #[test]
    fn two_schemes_for_one_host_are_ambiguous() {
        let auth = config(
            &[
                (format!("{PREFIX}_BEARER").as_str(), "token"),
                (format!("{PREFIX}_BASIC_USER").as_str(), "user"),
            ],
            None,
        );

        let err = auth.credential_for(URL).expect_err("ambiguous");

        assert!(matches!(err, AuthError::Ambiguous { scheme: "bearer", .. }));
        assert!(err.to_string().contains("BASIC_USER"));
    }

    #[test]
    fn digest_auth_is_reported_as_unsupported() {
        let auth = config(&[(format!("{PREFIX}_DIGEST_USER").as_str(), "user")], None);

        assert!(matches!(
            auth.credential_for(URL),
            Err(AuthError::UnsupportedScheme { .. })
        ));
    }

    #[rstest]
    #[case::exact_machine(
        "machine mirror-1.example.com login alice password wonder",
        Some(("alice", "wonder"))
    )]
    #[case::default_entry("default login anon password guest", Some(("anon", "guest")))]
    #[case::machine_wins_over_default(
        "default login anon password guest\nmachine MIRROR-1.example.com\n  login bob\n  password builder",
        Some(("bob", "builder"))
    )]
    #[case::other_machine("machine example.org login eve password x", None)]
    fn netrc_supplies_basic_credentials(
        #[case] netrc: &str,
        #[case] expected: Option<(&str, &str)>,
    ) {
        let auth = config(&[], Some(netrc));

        let credential = auth.credential_for(URL).expect("valid");

        let expected = expected.map(|(user, password)| Credential::Basic {
            user: user.to_owned(),
            password: password.to_owned(),
        });
        assert_eq!(credential, expected);
    }

    #[test]
    fn environment_wins_over_netrc() {
        let auth = config(
            &[(format!("{PREFIX}_BEARER").as_str(), "token")],
            Some("default login anon password guest"),
        );

        assert_eq!(
            auth.credential_for(URL).expect("valid"),
            Some(Credential::Bearer("token".to_owned()))
        );
    }

    #[test]
    fn debug_output_redacts_secrets() {
        let credential = Credential::Basic {
            user: "alice".to_owned(),
            password: "hunter2".to_owned(),
        };
        let rendered = format!("{credential:?}");
        assert!(rendered.contains("alice"));
        assert!(!rendered.contains("hunter2"));
    }

    #[test]
    fn file_urls_carry_no_credentials() {
        let auth = config(&[], Some("default login anon password guest"));
        assert_eq!(auth.credential_for("file:///srv/mirror/science").expect("valid"), None);
    }
}
