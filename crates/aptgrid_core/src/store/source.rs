//! Dataset sources for the occupancy document.
//!
//! # Responsibility
//! - Retrieve the raw occupancy JSON from a bundled payload, a file or HTTP.
//! - Bound the wait on network retrieval.
//!
//! # Invariants
//! - Sources never parse; they hand back the raw document text.
//! - HTTP retrieval always carries a finite timeout.

use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub type SourceResult<T> = Result<T, SourceError>;

const HTTP_USER_AGENT: &str = concat!("aptgrid/", env!("CARGO_PKG_VERSION"));

/// Retrieval failure for a dataset source.
#[derive(Debug)]
pub enum SourceError {
    Io { path: PathBuf, source: std::io::Error },
    Http(reqwest::Error),
    HttpStatus { url: String, status: u16 },
}

impl Display for SourceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "failed to read dataset `{}`: {source}", path.display())
            }
            Self::Http(err) if err.is_timeout() => write!(f, "dataset request timed out: {err}"),
            Self::Http(err) => write!(f, "dataset request failed: {err}"),
            Self::HttpStatus { url, status } => {
                write!(f, "dataset request to `{url}` returned HTTP {status}")
            }
        }
    }
}

impl Error for SourceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Http(err) => Some(err),
            Self::HttpStatus { .. } => None,
        }
    }
}

impl From<reqwest::Error> for SourceError {
    fn from(value: reqwest::Error) -> Self {
        Self::Http(value)
    }
}

/// Anything that can hand over the raw occupancy document.
pub trait DatasetSource {
    /// Short, log-safe description (no credentials, no payload).
    fn describe(&self) -> String;
    fn fetch(&self) -> SourceResult<String>;
}

impl<T: DatasetSource + ?Sized> DatasetSource for Box<T> {
    fn describe(&self) -> String {
        (**self).describe()
    }

    fn fetch(&self) -> SourceResult<String> {
        (**self).fetch()
    }
}

/// Bundled payload compiled into or handed to the host.
#[derive(Debug, Clone)]
pub struct InlineSource {
    payload: String,
}

impl InlineSource {
    pub fn new(payload: impl Into<String>) -> Self {
        Self {
            payload: payload.into(),
        }
    }
}

impl DatasetSource for InlineSource {
    fn describe(&self) -> String {
        format!("inline:{}b", self.payload.len())
    }

    fn fetch(&self) -> SourceResult<String> {
        Ok(self.payload.clone())
    }
}

/// JSON document on local disk.
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl DatasetSource for FileSource {
    fn describe(&self) -> String {
        format!("file:{}", self.path.display())
    }

    fn fetch(&self) -> SourceResult<String> {
        std::fs::read_to_string(&self.path).map_err(|source| SourceError::Io {
            path: self.path.clone(),
            source,
        })
    }
}

/// Blocking HTTP GET with a bounded wait.
///
/// Expiry of `timeout` is reported as an ordinary [`SourceError::Http`], so
/// callers treat a slow server exactly like an unreachable one.
#[derive(Debug, Clone)]
pub struct HttpSource {
    url: String,
    timeout: Duration,
}

impl HttpSource {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            url: url.into(),
            timeout,
        }
    }
}

impl DatasetSource for HttpSource {
    fn describe(&self) -> String {
        format!("http:{} timeout_ms={}", self.url, self.timeout.as_millis())
    }

    fn fetch(&self) -> SourceResult<String> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(HTTP_USER_AGENT)
            .timeout(self.timeout)
            .build()?;

        let response = client
            .get(self.url.as_str())
            .header("Accept", "application/json")
            .send()?;

        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::HttpStatus {
                url: self.url.clone(),
                status: status.as_u16(),
            });
        }

        Ok(response.text()?)
    }
}

/// Where the session dataset lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatasetLocation {
    File(PathBuf),
    Url(String),
}

impl DatasetLocation {
    /// Classifies a raw location string: `http(s)://` is a URL, anything
    /// else a file path.
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        let lowered = trimmed.to_ascii_lowercase();
        if lowered.starts_with("http://") || lowered.starts_with("https://") {
            Self::Url(trimmed.to_string())
        } else {
            Self::File(PathBuf::from(trimmed))
        }
    }

    /// Builds the matching source; `timeout` applies to URLs only.
    pub fn open(&self, timeout: Duration) -> Box<dyn DatasetSource> {
        match self {
            Self::File(path) => Box::new(FileSource::new(path)),
            Self::Url(url) => Box::new(HttpSource::new(url.clone(), timeout)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{DatasetLocation, DatasetSource, FileSource, InlineSource, SourceError};
    use std::path::PathBuf;
    use std::time::Duration;

    #[test]
    fn location_parse_detects_urls_case_insensitively() {
        assert_eq!(
            DatasetLocation::parse(" HTTPS://example.com/apartments_status.json "),
            DatasetLocation::Url("HTTPS://example.com/apartments_status.json".to_string())
        );
        assert_eq!(
            DatasetLocation::parse("apartments_status.json"),
            DatasetLocation::File(PathBuf::from("apartments_status.json"))
        );
    }

    #[test]
    fn inline_source_returns_payload() {
        let source = InlineSource::new("{}");
        assert_eq!(source.fetch().expect("inline fetch should succeed"), "{}");
        assert_eq!(source.describe(), "inline:2b");
    }

    #[test]
    fn missing_file_reports_io_error() {
        let dir = tempfile::tempdir().expect("temp dir should be created");
        let source = FileSource::new(dir.path().join("absent.json"));
        let err = source.fetch().unwrap_err();
        assert!(matches!(err, SourceError::Io { .. }));
        assert!(err.to_string().contains("absent.json"));
    }

    #[test]
    fn opened_file_location_reads_from_disk() {
        let dir = tempfile::tempdir().expect("temp dir should be created");
        let path = dir.path().join("data.json");
        std::fs::write(&path, r#"{"1":{}}"#).expect("dataset should be written");

        let source = DatasetLocation::File(path).open(Duration::from_secs(1));
        assert_eq!(
            source.fetch().expect("file fetch should succeed"),
            r#"{"1":{}}"#
        );
    }
}
