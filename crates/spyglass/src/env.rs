use std::path::PathBuf;

use crate::error::ConfigurationError;

pub const API_KEY_VAR: &str = "SPYGLASS_API_KEY";
pub const DEPLOYMENT_ID_VAR: &str = "DEPLOYMENT_ID";
pub const API_BASE_URL_VAR: &str = "SPYGLASS_API_BASE_URL";
pub const CONFIG_PATH_VAR: &str = "SPYGLASS_CONFIG_PATH";

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:4000";
pub const DEFAULT_CONFIG_PATH: &str = "model.yaml";

/// Everything a run needs from the process environment.
#[derive(Clone, PartialEq, Eq)]
pub struct RunContext {
    pub api_key: String,
    pub deployment_id: String,
    pub api_base_url: String,
    pub config_path: PathBuf,
}

impl std::fmt::Debug for RunContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RunContext")
            .field("api_key", &"<redacted>")
            .field("deployment_id", &self.deployment_id)
            .field("api_base_url", &self.api_base_url)
            .field("config_path", &self.config_path)
            .finish()
    }
}

impl RunContext {
    pub fn from_env() -> Result<Self, ConfigurationError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds the context from an arbitrary variable lookup. Empty values
    /// count as unset, and every missing required variable is reported at
    /// once.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigurationError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|value| !value.is_empty());

        let api_key = get(API_KEY_VAR);
        let deployment_id = get(DEPLOYMENT_ID_VAR);

        let (api_key, deployment_id) = match (api_key, deployment_id) {
            (Some(api_key), Some(deployment_id)) => (api_key, deployment_id),
            (api_key, deployment_id) => {
                let mut missing = Vec::new();
                if api_key.is_none() {
                    missing.push(API_KEY_VAR);
                }
                if deployment_id.is_none() {
                    missing.push(DEPLOYMENT_ID_VAR);
                }
                return Err(ConfigurationError::MissingEnv(missing));
            }
        };

        let api_base_url = get(API_BASE_URL_VAR)
            .map(|url| url.trim_end_matches('/').to_owned())
            .filter(|url| !url.is_empty())
            .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_owned());

        let config_path = get(CONFIG_PATH_VAR)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH));

        Ok(Self {
            api_key,
            deployment_id,
            api_base_url,
            config_path,
        })
    }
}
