//! Build environment resolution
//!
//! A task's env map holds literal values or references to remote configs.
//! References are resolved with secrets revealed, and the flattened map is
//! handed to the build as build arguments.

use crate::error::{BuildError, BuildResult};
use crate::remote::{GetConfigRequest, TaskApi};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Env entries by name.
pub type TaskEnv = BTreeMap<String, EnvValue>;

/// A single env entry: `{"value": "..."}` or `{"config": "name[:tag]"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnvValue {
    Value(String),
    Config(ConfigRef),
}

/// Reference to a remote config, written as `name` or `name:tag`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ConfigRef {
    pub name: String,
    pub tag: Option<String>,
}

impl ConfigRef {
    pub fn parse(s: &str) -> BuildResult<Self> {
        let (name, tag) = match s.split_once(':') {
            Some((name, tag)) => (name, Some(tag)),
            None => (s, None),
        };

        if name.is_empty() {
            return Err(BuildError::ConfigResolution {
                name: s.to_string(),
                message: "config name must not be empty".into(),
            });
        }

        Ok(Self {
            name: name.to_string(),
            tag: tag.filter(|t| !t.is_empty()).map(str::to_string),
        })
    }
}

impl fmt::Display for ConfigRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.tag {
            Some(tag) => write!(f, "{}:{}", self.name, tag),
            None => write!(f, "{}", self.name),
        }
    }
}

impl TryFrom<String> for ConfigRef {
    type Error = BuildError;

    fn try_from(s: String) -> BuildResult<Self> {
        ConfigRef::parse(&s)
    }
}

impl From<ConfigRef> for String {
    fn from(r: ConfigRef) -> Self {
        r.to_string()
    }
}

/// Resolves every entry of `env` into a flat map.
///
/// Fails on the first reference that cannot be resolved; nothing partial is
/// returned.
pub async fn resolve_build_env(
    api: &dyn TaskApi,
    env: &TaskEnv,
) -> BuildResult<BTreeMap<String, String>> {
    let mut resolved = BTreeMap::new();

    for (key, value) in env {
        let value = match value {
            EnvValue::Value(literal) => literal.clone(),
            EnvValue::Config(reference) => {
                tracing::debug!(env = %key, config = %reference, "Resolving config reference");
                let request = GetConfigRequest {
                    name: reference.name.clone(),
                    tag: reference.tag.clone().unwrap_or_default(),
                    show_secret: true,
                };
                api.get_config(request)
                    .await
                    .map_err(|e| BuildError::ConfigResolution {
                        name: reference.to_string(),
                        message: e.to_string(),
                    })?
                    .value
            }
        };
        resolved.insert(key.clone(), value);
    }

    Ok(resolved)
}
