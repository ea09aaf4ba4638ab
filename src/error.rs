//! Crate-level error type.
//!
//! Library code returns [`CoachError`]; the views collapse every dispatch
//! failure into a single "request failed" outcome before it reaches the UI.

use std::path::PathBuf;

/// Errors raised by dispatch, dataset loading, configuration and the web layer.
#[derive(Debug, thiserror::Error)]
pub enum CoachError {
    /// Connection, TLS, timeout or body-decoding failure from the HTTP client.
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The remote server replied with a non-2xx status code.
    #[error("HTTP {status} from {url}")]
    Status { status: u16, url: String },

    /// A dataset file could not be read.
    #[error("cannot read dataset {path}: {source}")]
    DatasetIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The dataset was read but is not an array of problem records.
    #[error("malformed dataset: {0}")]
    DatasetFormat(#[from] serde_json::Error),

    /// No problem with this id exists in the dataset.
    #[error("problem {0} not found")]
    ProblemNotFound(String),

    /// The language id is not in the editor's language table.
    #[error("unsupported language {0}")]
    UnknownLanguage(String),

    /// The configuration file could not be read or parsed.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// An inbound web request could not be parsed.
    #[error("bad request: {0}")]
    BadRequest(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<toml::de::Error> for CoachError {
    fn from(e: toml::de::Error) -> Self {
        CoachError::Config(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_display_includes_code_and_url() {
        let e = CoachError::Status { status: 503, url: "http://x/v1".into() };
        assert_eq!(e.to_string(), "HTTP 503 from http://x/v1");
    }

    #[test]
    fn test_dataset_io_display_includes_path() {
        let e = CoachError::DatasetIo {
            path: PathBuf::from("missing.json"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        };
        let s = e.to_string();
        assert!(s.contains("missing.json"));
        assert!(s.contains("gone"));
    }

    #[test]
    fn test_problem_not_found_display() {
        assert_eq!(CoachError::ProblemNotFound("42".into()).to_string(), "problem 42 not found");
    }

    #[test]
    fn test_toml_error_maps_to_config() {
        let err = toml::from_str::<toml::Value>("= broken").unwrap_err();
        let e: CoachError = err.into();
        assert!(matches!(e, CoachError::Config(_)));
    }

    #[test]
    fn test_json_error_maps_to_dataset_format() {
        let err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let e: CoachError = err.into();
        assert!(e.to_string().starts_with("malformed dataset"));
    }
}
