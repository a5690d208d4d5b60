//! Production fetcher backed by `ureq`, plus `file://` mirrors.

use super::auth::AuthConfig;
use super::{FetchError, Fetcher};
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use std::fmt;
use std::fs::File;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

const FILE_SCHEME: &str = "file:";

/// Bodies smaller than this finish too quickly for a progress bar.
const PROGRESS_MIN_BYTES: u64 = 64 * 1024;

const PROGRESS_TEMPLATE: &str =
    "{msg:>24} [{bar:30}] {bytes}/{total_bytes} ({bytes_per_sec}, {eta})";

/// Fetches over HTTPS, or from the local filesystem for `file://` URLs.
///
/// # Examples
///
/// ```
/// use science_installer::fetch::HttpFetcher;
///
/// let fetcher = HttpFetcher::new();
/// assert!(fetcher.user_agent().starts_with("science-installer/"));
/// ```
pub struct HttpFetcher {
    agent: ureq::Agent,
    user_agent: String,
    auth: AuthConfig,
    progress: Option<MultiProgress>,
}

impl fmt::Debug for HttpFetcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpFetcher")
            .field("user_agent", &self.user_agent)
            .field("auth", &self.auth)
            .field("progress", &self.progress.is_some())
            .finish_non_exhaustive()
    }
}

impl HttpFetcher {
    /// Build a fetcher that refuses plain-HTTP URLs and follows redirects.
    ///
    /// It sends no credentials and draws no progress bars.
    #[must_use]
    pub fn new() -> Self {
        let config = ureq::Agent::config_builder().https_only(true).build();
        Self {
            agent: ureq::Agent::new_with_config(config),
            user_agent: format!("science-installer/{}", env!("CARGO_PKG_VERSION")),
            auth: AuthConfig::default(),
            progress: None,
        }
    }

    /// Send credentials from `auth` to the hosts they are scoped to.
    #[must_use]
    pub fn with_auth(mut self, auth: AuthConfig) -> Self {
        self.auth = auth;
        self
    }

    /// Draw download progress bars on stderr when `enabled`.
    #[must_use]
    pub fn with_progress(mut self, enabled: bool) -> Self {
        self.progress = enabled.then(MultiProgress::new);
        self
    }

    /// Return the `User-Agent` header value sent with each request.
    #[must_use]
    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    fn fetch_http(&self, url: &str, dest: &Path) -> Result<(), FetchError> {
        let credential = self
            .auth
            .credential_for(url)
            .map_err(|source| FetchError::Auth {
                url: url.to_owned(),
                source,
            })?;
        let mut request = self.agent.get(url).header("User-Agent", &self.user_agent);
        if let Some(credential) = credential {
            log::debug!("sending {credential:?} credentials for {url}");
            request = request.header("Authorization", credential.header_value());
        }
        let response = request.call().map_err(|e| map_ureq_error(url, &e))?;
        let length = response.body().content_length();
        let reader = response.into_body().into_reader();
        let mut file = File::create(dest)?;
        let bar = self.progress_bar(url, length);
        let copied = match &bar {
            Some(bar) => copy_body(url, bar.wrap_read(reader), &mut file),
            None => copy_body(url, reader, &mut file),
        };
        if let Some(bar) = bar {
            bar.finish_and_clear();
        }
        copied?;
        file.flush()?;
        Ok(())
    }

    fn progress_bar(&self, url: &str, length: Option<u64>) -> Option<ProgressBar> {
        let progress = self.progress.as_ref()?;
        let length = length.filter(|len| *len >= PROGRESS_MIN_BYTES)?;
        let bar = progress.add(ProgressBar::new(length));
        if let Ok(style) = ProgressStyle::with_template(PROGRESS_TEMPLATE) {
            bar.set_style(style.progress_chars("=> "));
        }
        let name = url.rsplit('/').next().unwrap_or(url);
        bar.set_message(name.to_owned());
        Some(bar)
    }
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self::new()
    }
}

impl Fetcher for HttpFetcher {
    fn fetch(&self, url: &str, dest: &Path) -> Result<(), FetchError> {
        if url.starts_with(FILE_SCHEME) {
            fetch_file(url, &file_url_path(url)?, dest)
        } else {
            self.fetch_http(url, dest)
        }
    }
}

fn copy_body(url: &str, mut body: impl Read, file: &mut File) -> Result<u64, FetchError> {
    std::io::copy(&mut body, file).map_err(|e| FetchError::Transport {
        url: url.to_owned(),
        reason: e.to_string(),
        timed_out: e.kind() == std::io::ErrorKind::TimedOut,
    })
}

/// Copy a local mirror file, treating absence like an HTTP 404.
fn fetch_file(url: &str, source: &Path, dest: &Path) -> Result<(), FetchError> {
    match std::fs::copy(source, dest) {
        Ok(_) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(FetchError::NotFound {
            url: url.to_owned(),
        }),
        Err(e) => Err(FetchError::Io(e)),
    }
}

/// Decode a `file://` URL into a local path.
fn file_url_path(url: &str) -> Result<PathBuf, FetchError> {
    let invalid = |reason: String| FetchError::Transport {
        url: url.to_owned(),
        reason,
        timed_out: false,
    };
    let parsed = url::Url::parse(url).map_err(|e| invalid(e.to_string()))?;
    parsed
        .to_file_path()
        .map_err(|()| invalid("not a local file URL".to_owned()))
}

/// Map a ureq error to a [`FetchError`].
fn map_ureq_error(url: &str, err: &ureq::Error) -> FetchError {
    match err {
        ureq::Error::StatusCode(404) => FetchError::NotFound {
            url: url.to_owned(),
        },
        ureq::Error::StatusCode(code) => FetchError::Status {
            url: url.to_owned(),
            code: *code,
        },
        ureq::Error::Timeout(_) => FetchError::Transport {
            url: url.to_owned(),
            reason: err.to_string(),
            timed_out: true,
        },
        ureq::Error::Io(io) => FetchError::Transport {
            url: url.to_owned(),
            reason: io.to_string(),
            timed_out: io.kind() == std::io::ErrorKind::TimedOut,
        },
        other => FetchError::Transport {
            url: url.to_owned(),
            reason: other.to_string(),
            timed_out: false,
        },
    }
}
