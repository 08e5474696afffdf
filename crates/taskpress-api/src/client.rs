//! Task API client
//!
//! JSON over HTTPS with a token header. Connection errors, 429 and 5xx
//! responses are retried with exponential backoff.

use crate::error::{ApiError, ApiResult};
use crate::retry::{RetryConfig, is_retryable_error, is_retryable_status};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use taskpress_build::remote::{
    ConfigValue, GetConfigRequest, RegistryToken, RemoteError, TaskApi,
};

/// Default API host.
pub const DEFAULT_HOST: &str = "api.taskpress.dev";

const TOKEN_HEADER: &str = "X-Taskpress-Token";
const CLIENT_HEADER: &str = "X-Taskpress-Client";
const VERSION_HEADER: &str = "X-Taskpress-Version";

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

#[derive(Deserialize)]
struct GetConfigResponse {
    config: ConfigValue,
}

pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    token: String,
    retry: RetryConfig,
}

impl ApiClient {
    /// Creates a client for `host`.
    ///
    /// `host` is a bare host name (`api.taskpress.dev`), served over HTTPS,
    /// or a full `http://` / `https://` origin.
    pub fn new(host: &str, token: impl Into<String>) -> ApiResult<Self> {
        let token = token.into();
        if token.is_empty() {
            return Err(ApiError::MissingToken);
        }

        let http = reqwest::Client::builder()
            .user_agent(concat!("taskpress/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(ApiError::Client)?;

        Ok(Self {
            http,
            base_url: base_url(host),
            token,
            retry: RetryConfig::default(),
        })
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Short-lived credentials for the task image registry.
    pub async fn get_registry_token(&self) -> ApiResult<RegistryToken> {
        self.post("/registry/getToken", None::<&()>).await
    }

    pub async fn get_config(&self, request: &GetConfigRequest) -> ApiResult<ConfigValue> {
        let response: GetConfigResponse = self.post("/configs/get", Some(request)).await?;
        Ok(response.config)
    }

    async fn post<P, R>(&self, path: &str, payload: Option<&P>) -> ApiResult<R>
    where
        P: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let url = self.url(path);
        let mut retry = 0;

        loop {
            let mut request = self
                .http
                .post(&url)
                .header(TOKEN_HEADER, &self.token)
                .header(CLIENT_HEADER, "cli")
                .header(VERSION_HEADER, env!("CARGO_PKG_VERSION"));
            if let Some(payload) = payload {
                request = request.json(payload);
            }

            let outcome = request.send().await;
            let retryable = match &outcome {
                Ok(response) => is_retryable_status(response.status()),
                Err(e) => is_retryable_error(e),
            };

            if retryable && retry < self.retry.max_retries {
                let delay = self.retry.delay(retry);
                tracing::debug!(
                    "POST {} failed, retrying in {:?} ({}/{})",
                    url,
                    delay,
                    retry + 1,
                    self.retry.max_retries
                );
                tokio::time::sleep(delay).await;
                retry += 1;
                continue;
            }

            let response = outcome.map_err(|source| ApiError::Request {
                method: "POST",
                url: url.clone(),
                source,
            })?;
            return decode(response, &url).await;
        }
    }
}

async fn decode<R: DeserializeOwned>(response: reqwest::Response, url: &str) -> ApiResult<R> {
    let status = response.status();
    if status.is_client_error() || status.is_server_error() {
        let code = status.as_u16();
        let message = match response.json::<ErrorBody>().await {
            Ok(body) => body.error,
            Err(_) => status
                .canonical_reason()
                .unwrap_or("request failed")
                .to_string(),
        };
        return Err(ApiError::Status { code, message });
    }

    response
        .json::<R>()
        .await
        .map_err(|source| ApiError::Decode {
            url: url.to_string(),
            source,
        })
}

fn base_url(host: &str) -> String {
    let host = host.trim_end_matches('/');
    let origin = if host.starts_with("http://") || host.starts_with("https://") {
        host.to_string()
    } else {
        format!("https://{}", host)
    };
    format!("{}/v0", origin)
}

#[async_trait]
impl TaskApi for ApiClient {
    async fn registry_token(&self) -> Result<RegistryToken, RemoteError> {
        Ok(self.get_registry_token().await?)
    }

    async fn get_config(&self, request: GetConfigRequest) -> Result<ConfigValue, RemoteError> {
        Ok(ApiClient::get_config(self, &request).await?)
    }
}
