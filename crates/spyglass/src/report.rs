//! Final stage of a run: turn the outcome into log lines and an exit code.
//!
//! | code | meaning                                               |
//! |------|-------------------------------------------------------|
//! | 0    | deployment updated, or dry run completed              |
//! | 1    | invalid command-line arguments or CLI setup failure   |
//! | 2    | configuration error while reading the environment     |
//! | 3    | configuration error while loading the config file     |
//! | 4    | configuration error while building the request        |
//! | 5    | network error (DNS, connection refused, timeout)      |
//! | 6    | authentication rejected (401/403)                     |
//! | 7    | deployment id not recognized (404)                    |
//! | 8    | any other non-2xx API response                        |

use std::error::Error as _;

use log::{debug, error, info};

use crate::{
    app::{Failure, Outcome, Stage},
    error::Error,
};

pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_ENV_CONFIG: i32 = 2;
pub const EXIT_FILE_CONFIG: i32 = 3;
pub const EXIT_REQUEST_CONFIG: i32 = 4;
pub const EXIT_NETWORK: i32 = 5;
pub const EXIT_AUTHENTICATION: i32 = 6;
pub const EXIT_NOT_FOUND: i32 = 7;
pub const EXIT_API: i32 = 8;

const PREVIEW_CHARS: usize = 100;
const BODY_CHARS: usize = 500;

/// Cuts `text` to at most `max` characters, marking the cut with `...`.
pub fn truncate(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_owned(),
    }
}

pub fn exit_code(failure: &Failure) -> i32 {
    match (&failure.error, failure.stage) {
        (Error::Configuration(_), Stage::ReadingEnv) => EXIT_ENV_CONFIG,
        (Error::Configuration(_), Stage::LoadingConfig) => EXIT_FILE_CONFIG,
        (Error::Configuration(_), _) => EXIT_REQUEST_CONFIG,
        (Error::Network(_), _) => EXIT_NETWORK,
        (Error::Authentication { .. }, _) => EXIT_AUTHENTICATION,
        (Error::NotFound { .. }, _) => EXIT_NOT_FOUND,
        (Error::Api { .. }, _) => EXIT_API,
    }
}

pub fn success_lines(outcome: &Outcome) -> Vec<String> {
    let config = &outcome.config;
    let headline = match &outcome.update {
        Some(_) => format!(
            "Successfully updated deployment {}",
            outcome.context.deployment_id
        ),
        None => format!("Dry run: would send {}", outcome.request),
    };

    let mut lines = vec![
        headline,
        format!("  Model: {}", config.model),
        format!("  Name: {}", config.name),
        format!("  Description: {}", truncate(&config.description, PREVIEW_CHARS)),
        format!("  Prompt: {}", truncate(&config.prompt, PREVIEW_CHARS)),
    ];

    if let Some(update) = &outcome.update {
        let or_na = |value: &Option<String>| value.clone().unwrap_or_else(|| "N/A".to_owned());
        lines.push(format!("  Status: {}", update.status.as_u16()));
        lines.push(format!("  Deployment status: {}", or_na(&update.deployment_status)));
        lines.push(format!("  Updated at: {}", or_na(&update.updated_at)));
    }

    lines
}

pub fn failure_lines(failure: &Failure) -> Vec<String> {
    let error = &failure.error;
    let mut lines = vec![
        format!("Deployment update failed while {}", failure.stage),
        format!("  {}: {}", error.kind(), error),
    ];

    let mut source = error.source();
    while let Some(cause) = source {
        lines.push(format!("  Caused by: {cause}"));
        source = cause.source();
    }

    let body = match error {
        Error::Authentication { body, .. }
        | Error::NotFound { body, .. }
        | Error::Api { body, .. } => body.as_str(),
        Error::Configuration(_) | Error::Network(_) => "",
    };
    if !body.is_empty() {
        lines.push(format!("  Response: {}", truncate(body, BODY_CHARS)));
    }

    lines.push(format!("  Exit code: {}", exit_code(failure)));
    lines
}

/// Logs the summary and returns the exit code for the process.
pub fn success(outcome: &Outcome) -> i32 {
    debug!("Stage: {}", Stage::Reporting);
    for line in success_lines(outcome) {
        info!("{line}");
    }
    EXIT_SUCCESS
}

pub fn failure(failure: &Failure) -> i32 {
    debug!("Stage: {}", Stage::Reporting);
    for line in failure_lines(failure) {
        error!("{line}");
    }
    exit_code(failure)
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use reqwest::StatusCode;

    use super::*;
    use crate::{
        client::DeploymentUpdate, config::DeploymentConfig, env::RunContext,
        error::ConfigurationError, request::DeploymentRequest,
    };

    fn outcome(update: Option<DeploymentUpdate>) -> Outcome {
        let context = RunContext {
            api_key: "secret".to_string(),
            deployment_id: "dep-1".to_string(),
            api_base_url: "http://localhost:4000".to_string(),
            config_path: PathBuf::from("model.yaml"),
        };
        let config = DeploymentConfig {
            name: "Bot".to_string(),
            description: "d".repeat(150),
            model: "gpt-4o".to_string(),
            prompt: "Be nice.".to_string(),
        };
        let request = DeploymentRequest::build(&config, &context).unwrap();
        Outcome {
            context,
            config,
            request,
            update,
        }
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("exactly10!", 10), "exactly10!");
        assert_eq!(truncate("ééééé", 3), "ééé...");
    }

    #[test]
    fn success_summary() {
        let lines = success_lines(&outcome(Some(DeploymentUpdate {
            status: StatusCode::OK,
            updated_at: Some("2024-05-01T12:00:00Z".to_string()),
            deployment_status: None,
        })));

        assert_eq!(lines[0], "Successfully updated deployment dep-1");
        assert!(lines.contains(&"  Model: gpt-4o".to_string()));
        assert!(lines.contains(&"  Name: Bot".to_string()));
        assert!(lines.contains(&format!("  Description: {}...", "d".repeat(100))));
        assert!(lines.contains(&"  Updated at: 2024-05-01T12:00:00Z".to_string()));
        assert!(lines.contains(&"  Deployment status: N/A".to_string()));
        assert!(!lines.iter().any(|line| line.contains("secret")));
    }

    #[test]
    fn dry_run_summary() {
        let lines = success_lines(&outcome(None));

        assert_eq!(
            lines[0],
            "Dry run: would send PUT http://localhost:4000/api/deployments/dep-1"
        );
        assert!(!lines.iter().any(|line| line.starts_with("  Status")));
        assert_eq!(success(&outcome(None)), EXIT_SUCCESS);
    }

    fn failure_at(stage: Stage, error: Error) -> Failure {
        Failure { stage, error }
    }

    #[test]
    fn exit_codes_distinguish_stages() {
        let config = || Error::from(ConfigurationError::InvalidApiKey);

        assert_eq!(exit_code(&failure_at(Stage::ReadingEnv, config())), 2);
        assert_eq!(exit_code(&failure_at(Stage::LoadingConfig, config())), 3);
        assert_eq!(exit_code(&failure_at(Stage::BuildingRequest, config())), 4);
        assert_eq!(
            exit_code(&failure_at(
                Stage::CallingApi,
                Error::Authentication {
                    status: StatusCode::FORBIDDEN,
                    body: String::new(),
                }
            )),
            6
        );
        assert_eq!(
            exit_code(&failure_at(
                Stage::CallingApi,
                Error::NotFound {
                    deployment_id: "dep-1".to_string(),
                    body: String::new(),
                }
            )),
            7
        );
        assert_eq!(
            exit_code(&failure_at(
                Stage::CallingApi,
                Error::Api {
                    status: StatusCode::BAD_GATEWAY,
                    body: String::new(),
                }
            )),
            8
        );
    }

    #[test]
    fn failure_report_includes_cause_and_body() {
        let failure = failure_at(
            Stage::CallingApi,
            Error::Api {
                status: StatusCode::UNPROCESSABLE_ENTITY,
                body: format!("{{\"error\": \"{}\"}}", "x".repeat(600)),
            },
        );
        let lines = failure_lines(&failure);

        assert_eq!(
            lines[0],
            "Deployment update failed while calling deployment API"
        );
        assert_eq!(
            lines[1],
            "  ApiError: API returned unexpected status 422 Unprocessable Entity"
        );
        let response = lines
            .iter()
            .find(|line| line.starts_with("  Response: "))
            .unwrap();
        assert!(response.ends_with("..."));
        assert_eq!(lines.last().unwrap(), "  Exit code: 8");
        assert_eq!(super::failure(&failure), EXIT_API);
    }

    #[test]
    fn failure_report_walks_source_chain() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "permission denied");
        let failure = failure_at(
            Stage::LoadingConfig,
            ConfigurationError::Unreadable {
                path: PathBuf::from("model.yaml"),
                source: io,
            }
            .into(),
        );
        let lines = failure_lines(&failure);

        assert_eq!(
            lines[1],
            "  ConfigurationError: cannot read configuration file model.yaml"
        );
        assert_eq!(lines[2], "  Caused by: permission denied");
        assert_eq!(lines.last().unwrap(), "  Exit code: 3");
    }
}
