//! Reference table retrieval.
//!
//! Blocking reqwest client (no Tokio runtime required). The downloaded
//! artifact lives in a temp file that is removed when loading finishes,
//! whether or not it succeeds.

use std::fmt;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use bbb_frame::Frame;
use tracing::{debug, info};

use crate::error::IoError;
use crate::native;

/// Where the reference table comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReferenceSource {
    Url(String),
    Path(PathBuf),
}

impl ReferenceSource {
    /// `http://` and `https://` locations are URLs; anything else is a path.
    pub fn parse(location: &str) -> Self {
        if location.starts_with("http://") || location.starts_with("https://") {
            Self::Url(location.to_string())
        } else {
            Self::Path(PathBuf::from(location))
        }
    }
}

impl fmt::Display for ReferenceSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Url(url) => f.write_str(url),
            Self::Path(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Load the reference table from `source`. `timeout` bounds a download; `None`
/// waits as long as the server keeps the connection open.
pub fn load_reference(
    source: &ReferenceSource,
    timeout: Option<Duration>,
) -> Result<Frame, IoError> {
    match source {
        ReferenceSource::Path(path) => native::load(path),
        ReferenceSource::Url(url) => {
            let tmp = download(url, timeout)?;
            native::load(tmp.path())
        }
    }
}

/// Download `url` into a fresh temp file.
pub fn download(url: &str, timeout: Option<Duration>) -> Result<tempfile::NamedTempFile, IoError> {
    let http = reqwest::blocking::Client::builder()
        .user_agent(format!("bbb-rebuild/{}", env!("CARGO_PKG_VERSION")))
        .timeout(timeout)
        .build()
        .map_err(|e| IoError::Network(e.to_string()))?;

    info!(url, "fetching reference table");
    let mut response = http
        .get(url)
        .send()
        .map_err(|e| IoError::Network(e.to_string()))?;

    let status = response.status().as_u16();
    if !response.status().is_success() {
        let body = response.text().unwrap_or_default();
        return Err(IoError::Http(status, body));
    }

    let mut tmp = tempfile::NamedTempFile::new().map_err(|e| IoError::file(std::env::temp_dir(), e))?;
    let bytes = response
        .copy_to(tmp.as_file_mut())
        .map_err(|e| IoError::Network(e.to_string()))?;
    tmp.as_file_mut().flush().map_err(|e| IoError::file(tmp.path(), e))?;

    debug!(bytes, path = %tmp.path().display(), "reference downloaded");
    Ok(tmp)
}

/// Resolve a path source against `base`, leaving URLs and absolute paths untouched.
pub fn resolve(source: ReferenceSource, base: &Path) -> ReferenceSource {
    match source {
        ReferenceSource::Path(p) if p.is_relative() => ReferenceSource::Path(base.join(p)),
        other => other,
    }
}
