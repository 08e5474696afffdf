//! Image build and verification
//!
//! An `ImageBuilder` owns one resolved configuration and drives a single
//! task image through `Pending -> Building -> Built -> TagVerified -> Pushed`.
//! Any error moves it to `Failed`.

use crate::auth::RegistryAuth;
use crate::config::{BuildArgs, BuildConfig, OutputSink, ResolvedConfig};
use crate::context::ContextBuilder;
use crate::dockerfile::build_dockerfile;
use crate::engine::{BuildRequest, ImageEngine, TARGET_PLATFORM};
use crate::error::{BuildError, BuildResult};
use crate::progress::drain;
use crate::pusher::ImagePusher;
use crate::tag::{image_tag, validate_version};
use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildState {
    Pending,
    Building,
    Built,
    TagVerified,
    Pushed,
    Failed,
}

/// A built image whose tag was found in the engine's image list.
///
/// Only `ImageBuilder::build` hands these out, so holding one means the
/// image exists locally and can be pushed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildOutput {
    tag: String,
}

impl BuildOutput {
    pub(crate) fn verified(tag: String) -> Self {
        Self { tag }
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }
}

pub struct ImageBuilder {
    engine: Arc<dyn ImageEngine>,
    root: PathBuf,
    builder: String,
    args: BuildArgs,
    build_env: BTreeMap<String, String>,
    auth: RegistryAuth,
    output: OutputSink,
    context: ContextBuilder,
    state: BuildState,
}

impl ImageBuilder {
    /// Validates `config` and binds it to `engine`.
    pub fn new(config: BuildConfig, engine: Arc<dyn ImageEngine>) -> BuildResult<Self> {
        Ok(Self::from_resolved(config.resolve()?, engine))
    }

    pub fn from_resolved(config: ResolvedConfig, engine: Arc<dyn ImageEngine>) -> Self {
        Self {
            engine,
            root: config.root,
            builder: config.builder,
            args: config.args,
            build_env: config.build_env,
            auth: config.auth,
            output: config.output,
            context: ContextBuilder::new(),
            state: BuildState::Pending,
        }
    }

    /// Stages build contexts with `context` instead of the default.
    pub fn with_context_builder(mut self, context: ContextBuilder) -> Self {
        self.context = context;
        self
    }

    pub fn state(&self) -> BuildState {
        self.state
    }

    /// Builds the image for `task_id` and confirms the engine knows its tag.
    pub async fn build(
        &mut self,
        task_id: &str,
        version: &str,
        cancel: &CancellationToken,
    ) -> BuildResult<BuildOutput> {
        if self.state != BuildState::Pending {
            return Err(BuildError::InvalidInput(format!(
                "builder already used (state: {:?})",
                self.state
            )));
        }

        let result = self.run_build(task_id, version, cancel).await;
        match &result {
            Ok(_) => self.state = BuildState::TagVerified,
            Err(e) => {
                tracing::debug!("Build failed: {}", e);
                self.state = BuildState::Failed;
            }
        }
        result
    }

    /// Pushes a verified image with the configured registry auth.
    pub async fn push(
        &mut self,
        output: &BuildOutput,
        cancel: &CancellationToken,
    ) -> BuildResult<()> {
        if self.state != BuildState::TagVerified {
            return Err(BuildError::InvalidInput(format!(
                "push requires a verified image (state: {:?})",
                self.state
            )));
        }

        let pusher = ImagePusher::new(Arc::clone(&self.engine), self.auth.clone());
        let result = pusher.push(output, self.output.as_mut(), cancel).await;
        self.state = if result.is_ok() {
            BuildState::Pushed
        } else {
            BuildState::Failed
        };
        result
    }

    async fn run_build(
        &mut self,
        task_id: &str,
        version: &str,
        cancel: &CancellationToken,
    ) -> BuildResult<BuildOutput> {
        validate_version(version)?;
        let tag = image_tag(&self.auth.repo, task_id, version)?;

        let arg_names: Vec<String> = self.build_env.keys().cloned().collect();
        let dockerfile = build_dockerfile(&self.builder, &self.root, &self.args, &arg_names)?;
        tracing::debug!("Dockerfile:\n{}", dockerfile);

        // Released once the build stream ends, or on any early return.
        let staged = self.context.assemble(&self.root, &dockerfile)?;

        let request = BuildRequest {
            context: staged.archive_path().to_path_buf(),
            tag: tag.clone(),
            build_args: self
                .build_env
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect::<HashMap<_, _>>(),
            platform: TARGET_PLATFORM.to_string(),
            auth_configs: self.auth.auth_configs(),
        };

        tracing::info!("Building image: {}", tag);
        self.state = BuildState::Building;
        let engine = Arc::clone(&self.engine);
        drain(engine.build_image(request), self.output.as_mut(), cancel).await?;
        drop(staged);
        self.state = BuildState::Built;

        verify(engine.as_ref(), tag, cancel).await
    }
}

/// Succeeds only if `tag` is an exact entry of the engine's image list.
async fn verify(
    engine: &dyn ImageEngine,
    tag: String,
    cancel: &CancellationToken,
) -> BuildResult<BuildOutput> {
    let tags = tokio::select! {
        biased;
        _ = cancel.cancelled() => return Err(BuildError::Cancelled),
        tags = engine.list_image_tags() => tags?,
    };

    if tags.iter().any(|t| *t == tag) {
        tracing::info!("Successfully built: {}", tag);
        Ok(BuildOutput::verified(tag))
    } else {
        Err(BuildError::ImageNotFound { tag })
    }
}
