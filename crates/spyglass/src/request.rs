use reqwest::{
    header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE},
    Method, Url,
};
use serde::{Deserialize, Serialize};

use crate::{config::DeploymentConfig, env::RunContext, error::ConfigurationError};

/// JSON body of `PUT /api/deployments/{id}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentPayload {
    pub name: String,
    pub description: String,
    pub model: String,
    pub prompt: String,
}

impl From<&DeploymentConfig> for DeploymentPayload {
    fn from(value: &DeploymentConfig) -> Self {
        Self {
            name: value.name.clone(),
            description: value.description.clone(),
            model: value.model.clone(),
            prompt: value.prompt.clone(),
        }
    }
}

/// A fully resolved deployment update, ready to be sent.
#[derive(Debug, Clone)]
pub struct DeploymentRequest {
    pub method: Method,
    pub url: Url,
    pub headers: HeaderMap,
    pub payload: DeploymentPayload,
}

impl DeploymentRequest {
    /// Pure: touches neither the network nor the disk.
    pub fn build(config: &DeploymentConfig, ctx: &RunContext) -> Result<Self, ConfigurationError> {
        let url = deployment_url(&ctx.api_base_url, &ctx.deployment_id)?;

        let mut authorization = HeaderValue::from_str(&format!("Bearer {}", ctx.api_key))
            .map_err(|_| ConfigurationError::InvalidApiKey)?;
        authorization.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, authorization);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        Ok(Self {
            method: Method::PUT,
            url,
            headers,
            payload: DeploymentPayload::from(config),
        })
    }

    pub fn body(&self) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec(&self.payload)
    }
}

impl std::fmt::Display for DeploymentRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.method, self.url)
    }
}

fn deployment_url(base: &str, deployment_id: &str) -> Result<Url, ConfigurationError> {
    let invalid = |reason: &str| ConfigurationError::InvalidBaseUrl {
        url: base.to_owned(),
        reason: reason.to_owned(),
    };

    let mut url = Url::parse(base).map_err(|e| invalid(&e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid("scheme must be http or https"));
    }
    url.set_query(None);
    url.set_fragment(None);

    // URL parsing drops `.`/`..` segments and strips tabs and newlines, so
    // such ids would silently address a different resource.
    if matches!(deployment_id, "." | "..") || deployment_id.chars().any(char::is_control) {
        return Err(ConfigurationError::InvalidDeploymentId(deployment_id.to_owned()));
    }

    url.path_segments_mut()
        .map_err(|_| invalid("URL cannot be used as a base"))?
        .pop_if_empty()
        .extend(["api", "deployments", deployment_id]);

    Ok(url)
}
