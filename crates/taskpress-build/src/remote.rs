//! Remote task API seam
//!
//! The build only needs two calls from the task API: a registry token and
//! config lookups. Transport and retry live in the implementing crate.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub type RemoteError = Box<dyn std::error::Error + Send + Sync>;

/// Short-lived registry credentials handed out by the task API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryToken {
    pub token: String,
    #[serde(default)]
    pub expiration: String,
    pub repo: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetConfigRequest {
    pub name: String,
    pub tag: String,
    pub show_secret: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigValue {
    pub name: String,
    #[serde(default)]
    pub tag: String,
    pub value: String,
    #[serde(default)]
    pub is_secret: bool,
}

#[async_trait]
pub trait TaskApi: Send + Sync {
    async fn registry_token(&self) -> Result<RegistryToken, RemoteError>;

    async fn get_config(&self, request: GetConfigRequest) -> Result<ConfigValue, RemoteError>;
}
