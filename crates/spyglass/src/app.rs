use std::{fmt, path::PathBuf, time::Duration};

use log::{debug, info};
use thiserror::Error;

use crate::{
    client::{DeploymentClient, DeploymentUpdate, DEFAULT_TIMEOUT},
    config::DeploymentConfig,
    env::RunContext,
    error::Error,
    request::DeploymentRequest,
};

/// The five stages of a run, in order. A run never moves backwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    ReadingEnv,
    LoadingConfig,
    BuildingRequest,
    CallingApi,
    Reporting,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::ReadingEnv => "reading environment",
            Stage::LoadingConfig => "loading configuration file",
            Stage::BuildingRequest => "building request",
            Stage::CallingApi => "calling deployment API",
            Stage::Reporting => "reporting",
        };
        f.write_str(name)
    }
}

#[derive(Error, Debug)]
#[error("{stage} failed: {error}")]
pub struct Failure {
    pub stage: Stage,
    #[source]
    pub error: Error,
}

impl Failure {
    fn at<E: Into<Error>>(stage: Stage) -> impl FnOnce(E) -> Self {
        move |error| Self {
            stage,
            error: error.into(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Options {
    /// Takes precedence over `SPYGLASS_CONFIG_PATH`.
    pub config_path: Option<PathBuf>,
    pub timeout: Duration,
    /// Stop after building the request.
    pub dry_run: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            config_path: None,
            timeout: DEFAULT_TIMEOUT,
            dry_run: false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Outcome {
    pub context: RunContext,
    pub config: DeploymentConfig,
    pub request: DeploymentRequest,
    /// `None` for dry runs.
    pub update: Option<DeploymentUpdate>,
}

pub async fn run<F>(lookup: F, options: &Options) -> Result<Outcome, Failure>
where
    F: Fn(&str) -> Option<String>,
{
    debug!("Stage: {}", Stage::ReadingEnv);
    let mut context = RunContext::from_lookup(lookup).map_err(Failure::at(Stage::ReadingEnv))?;
    if let Some(path) = &options.config_path {
        context.config_path = path.clone();
    }
    debug!("{context:?}");

    debug!("Stage: {}", Stage::LoadingConfig);
    info!("Loading {}", context.config_path.display());
    let config =
        DeploymentConfig::load(&context.config_path).map_err(Failure::at(Stage::LoadingConfig))?;

    debug!("Stage: {}", Stage::BuildingRequest);
    let request = DeploymentRequest::build(&config, &context)
        .map_err(Failure::at(Stage::BuildingRequest))?;

    if options.dry_run {
        info!("Dry run, not sending {request}");
        return Ok(Outcome {
            context,
            config,
            request,
            update: None,
        });
    }

    debug!("Stage: {}", Stage::CallingApi);
    info!("Updating deployment {}", context.deployment_id);
    let client = DeploymentClient::new(options.timeout).map_err(Failure::at(Stage::CallingApi))?;
    let update = client
        .send(&request, &context.deployment_id)
        .await
        .map_err(Failure::at(Stage::CallingApi))?;

    Ok(Outcome {
        context,
        config,
        request,
        update: Some(update),
    })
}
