use std::{
    fs,
    io::ErrorKind,
    path::{Path, PathBuf},
};

use serde::Deserialize;
use serde_yaml::Value;

use crate::error::ConfigurationError;

/// Shape of `model.yaml` as written by users. Unknown keys are ignored.
#[derive(Deserialize, Debug)]
struct RawConfig {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    prompt: Option<String>,
}

/// Desired state of a deployment. `name` and `description` are empty when
/// the file leaves them out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeploymentConfig {
    pub name: String,
    pub description: String,
    pub model: String,
    pub prompt: String,
}

impl DeploymentConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigurationError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| match source.kind() {
            ErrorKind::NotFound => ConfigurationError::FileNotFound {
                path: path.to_path_buf(),
                source,
            },
            _ => ConfigurationError::Unreadable {
                path: path.to_path_buf(),
                source,
            },
        })?;

        Self::parse(&content, path)
    }

    /// Parses configuration text. `origin` is only used in error messages.
    pub fn parse(content: &str, origin: impl Into<PathBuf>) -> Result<Self, ConfigurationError> {
        let path = origin.into();

        if content.trim().is_empty() {
            return Err(ConfigurationError::NotAMapping { path });
        }

        let value: Value = match serde_yaml::from_str(content) {
            Ok(value) => value,
            Err(source) => return Err(ConfigurationError::Malformed { path, source }),
        };

        if !value.is_mapping() {
            return Err(ConfigurationError::NotAMapping { path });
        }

        // Read from the text again: going through `Value` would turn plain
        // scalars such as `name: 2024` into numbers.
        let raw: RawConfig = match serde_yaml::from_str(content) {
            Ok(raw) => raw,
            Err(source) => return Err(ConfigurationError::Malformed { path, source }),
        };

        Self::try_from_raw(raw, path)
    }

    fn try_from_raw(raw: RawConfig, path: PathBuf) -> Result<Self, ConfigurationError> {
        let present =
            |field: &Option<String>| field.as_deref().is_some_and(|v| !v.trim().is_empty());

        let mut missing = Vec::new();
        if !present(&raw.model) {
            missing.push("model");
        }
        if !present(&raw.prompt) {
            missing.push("prompt");
        }
        if !missing.is_empty() {
            return Err(ConfigurationError::MissingFields {
                path,
                fields: missing,
            });
        }

        Ok(Self {
            name: raw.name.unwrap_or_default(),
            description: raw.description.unwrap_or_default(),
            model: raw.model.unwrap_or_default(),
            prompt: raw.prompt.unwrap_or_default(),
        })
    }
}
