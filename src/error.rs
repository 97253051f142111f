//! Error types for loading, configuration and the HTTP surface

use std::path::PathBuf;

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use thiserror::Error;

/// A configured dataset could not be turned into a table
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("dataset source not found: {}", .path.display())]
    NotFound { path: PathBuf },

    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed {format} source {}: {message}", .path.display())]
    Malformed {
        path: PathBuf,
        format: &'static str,
        message: String,
    },

    #[error("unsupported source format: {}", .path.display())]
    UnsupportedFormat { path: PathBuf },
}

impl LoadError {
    /// Classify an I/O failure on `path`
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        if source.kind() == std::io::ErrorKind::NotFound {
            LoadError::NotFound { path }
        } else {
            LoadError::Io { path, source }
        }
    }

    pub fn malformed(path: impl Into<PathBuf>, format: &'static str, message: impl ToString) -> Self {
        LoadError::Malformed {
            path: path.into(),
            format,
            message: message.to_string(),
        }
    }
}

/// Configuration file could not be read or is inconsistent
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Errors surfaced to HTTP callers
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("no route for {0}")]
    NotFound(String),

    #[error("dataset '{name}' is unavailable: {reason}")]
    ServiceUnavailable { name: String, reason: String },

    #[error("failed to encode response: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ApiError {
    /// Stable code for the JSON error body
    pub fn error_code(&self) -> &'static str {
        match self {
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::ServiceUnavailable { .. } => "SERVICE_UNAVAILABLE",
            ApiError::Serialization(_) => "INTERNAL_ERROR",
        }
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::ServiceUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Serialization(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let body = serde_json::json!({
            "error": {
                "code": self.error_code(),
                "message": self.to_string(),
            }
        });

        HttpResponse::build(self.status_code()).json(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_is_not_found() {
        let err = LoadError::io(
            "data/cluster_tipologi.csv",
            std::io::Error::from(std::io::ErrorKind::NotFound),
        );
        assert!(matches!(err, LoadError::NotFound { .. }));
        assert!(err.to_string().contains("cluster_tipologi.csv"));
    }

    #[test]
    fn test_api_error_status_codes() {
        assert_eq!(
            ApiError::NotFound("/x".into()).status_code(),
            StatusCode::NOT_FOUND
        );
        let unavailable = ApiError::ServiceUnavailable {
            name: "cluster_digital".into(),
            reason: "missing".into(),
        };
        assert_eq!(unavailable.status_code(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(unavailable.error_code(), "SERVICE_UNAVAILABLE");
    }
}
