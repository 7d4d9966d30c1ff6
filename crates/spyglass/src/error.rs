use std::path::PathBuf;

use reqwest::StatusCode;
use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Anything wrong with the environment, the config file or the values they
/// provide. Always fatal, never retried.
#[derive(Error, Debug)]
pub enum ConfigurationError {
    #[error("missing required environment variable(s): {}", .0.join(", "))]
    MissingEnv(Vec<&'static str>),
    #[error("configuration file {} not found", .path.display())]
    FileNotFound {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("cannot read configuration file {}", .path.display())]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed configuration in {}", .path.display())]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("malformed configuration in {}: expected a mapping of keys to values", .path.display())]
    NotAMapping { path: PathBuf },
    #[error("missing required field(s) in {}: {}", .path.display(), .fields.join(", "))]
    MissingFields {
        path: PathBuf,
        fields: Vec<&'static str>,
    },
    #[error("invalid API base URL '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },
    #[error("deployment id '{}' cannot be used as a URL path segment", .0.escape_debug())]
    InvalidDeploymentId(String),
    #[error("API key contains characters that cannot be sent in an HTTP header")]
    InvalidApiKey,
}

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
    #[error(transparent)]
    Network(reqwest::Error),
    #[error("authentication rejected with status {status}")]
    Authentication { status: StatusCode, body: String },
    #[error("deployment id '{deployment_id}' not recognized")]
    NotFound { deployment_id: String, body: String },
    #[error("API returned unexpected status {status}")]
    Api { status: StatusCode, body: String },
}

impl Error {
    /// Name of the failure class, as shown in reports.
    pub fn kind(&self) -> &'static str {
        match self {
            Error::Configuration(_) => "ConfigurationError",
            Error::Network(_) => "NetworkError",
            Error::Authentication { .. } => "AuthenticationError",
            Error::NotFound { .. } => "NotFoundError",
            Error::Api { .. } => "ApiError",
        }
    }
}
