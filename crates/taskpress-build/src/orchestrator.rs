//! Local build pipeline
//!
//! Fetches registry credentials, resolves the task env, then builds,
//! verifies and pushes the task image.

use crate::auth::RegistryAuth;
use crate::builder::{BuildOutput, ImageBuilder};
use crate::config::{BuildArgs, BuildConfig, BuildKind, OutputSink};
use crate::context::ContextBuilder;
use crate::engine::ImageEngine;
use crate::env::{TaskEnv, resolve_build_env};
use crate::error::{BuildError, BuildResult};
use crate::remote::TaskApi;
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// One task to build on the local engine.
#[derive(Default)]
pub struct LocalBuild {
    pub root: PathBuf,
    pub task_id: String,
    pub version: String,
    pub builder: String,
    pub args: BuildArgs,
    pub env: TaskEnv,
    /// Progress output; stderr when `None`.
    pub output: Option<OutputSink>,
    /// Staging location override; the system temp directory when `None`.
    pub staging: Option<ContextBuilder>,
}

/// Builds and pushes the image for `request`.
///
/// Fails on the first error; nothing already built or pushed is undone.
pub async fn build_local(
    api: &dyn TaskApi,
    engine: Arc<dyn ImageEngine>,
    request: LocalBuild,
    cancel: &CancellationToken,
) -> BuildResult<BuildOutput> {
    let token = api
        .registry_token()
        .await
        .map_err(|e| BuildError::Api(format!("failed to get registry token: {}", e)))?;
    tracing::debug!("Registry token issued for {}", token.repo);
    let auth = RegistryAuth::new(token.token, token.repo);

    let build_env = resolve_build_env(api, &request.env).await?;

    let config = BuildConfig {
        kind: BuildKind::Local,
        root: request.root,
        builder: request.builder,
        args: Some(request.args),
        build_env,
        auth: Some(auth),
        output: request.output,
    };
    let mut builder = ImageBuilder::new(config, engine)?;
    if let Some(staging) = request.staging {
        builder = builder.with_context_builder(staging);
    }

    tracing::info!("Building task {}", request.task_id);
    let output = builder.build(&request.task_id, &request.version, cancel).await?;

    tracing::info!("Pushing {}", output.tag());
    builder.push(&output, cancel).await?;

    Ok(output)
}
