use std::time::Duration;

use log::{debug, warn};
use reqwest::{Client, StatusCode};
use serde_json::Value;

use crate::{
    error::{Error, Result},
    request::DeploymentRequest,
};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
const MAX_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// What the dashboard told us after a successful update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeploymentUpdate {
    pub status: StatusCode,
    pub updated_at: Option<String>,
    pub deployment_status: Option<String>,
}

impl DeploymentUpdate {
    /// Reads `updated_at` and `status` from `data`, falling back to the top
    /// level. Bodies that aren't JSON just yield no metadata.
    fn from_body(status: StatusCode, body: &[u8]) -> Self {
        let value: Option<Value> = serde_json::from_slice(body).ok();
        let lookup = |key: &str| {
            let value = value.as_ref()?;
            value
                .get("data")
                .and_then(|data| data.get(key))
                .or_else(|| value.get(key))
                .and_then(scalar_to_string)
        };

        Self {
            status,
            updated_at: lookup("updated_at"),
            deployment_status: lookup("status"),
        }
    }
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

#[derive(Debug, Clone)]
pub struct DeploymentClient {
    client: Client,
}

impl DeploymentClient {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(timeout.min(MAX_CONNECT_TIMEOUT))
            .timeout(timeout)
            .build()
            .map_err(Error::Network)?;

        Ok(Self { client })
    }

    /// Sends the update exactly once. There are no retries: every non-2xx
    /// status and every transport failure is returned as an error.
    pub async fn send(
        &self,
        request: &DeploymentRequest,
        deployment_id: &str,
    ) -> Result<DeploymentUpdate> {
        debug!("Sending {request}");

        let response = self
            .client
            .request(request.method.clone(), request.url.clone())
            .headers(request.headers.clone())
            .json(&request.payload)
            .send()
            .await
            .map_err(Error::Network)?;

        let status = response.status();
        debug!("Received status {status}");

        if status.is_success() {
            let body = match response.bytes().await {
                Ok(body) => body,
                Err(e) => {
                    warn!("Could not read response body: {e}");
                    Default::default()
                }
            };
            return Ok(DeploymentUpdate::from_body(status, &body));
        }

        let body = response.text().await.unwrap_or_default();

        Err(match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                Error::Authentication { status, body }
            }
            StatusCode::NOT_FOUND => Error::NotFound {
                deployment_id: deployment_id.to_owned(),
                body,
            },
            status => Error::Api { status, body },
        })
    }
}
