//! Container engine seam
//!
//! `ImageEngine` is the handle the builder drives. `DockerEngine` implements
//! it on top of Bollard; tests substitute an in-memory engine.

// The owned-String Bollard option types are deprecated in 0.19 but keep the
// returned streams free of borrowed option data.
#![allow(deprecated)]

use crate::error::{BuildError, BuildResult};
use crate::tag::split_image_tag;
use async_trait::async_trait;
use bollard::auth::DockerCredentials;
use bollard::image::{BuildImageOptions, PushImageOptions};
use bollard::models::{BuildInfo, PushImageInfo};
use bollard::{Docker, body_try_stream};
use futures_util::StreamExt;
use futures_util::stream::{self, BoxStream};
use std::collections::HashMap;
use std::fs::File;
use std::path::PathBuf;
use tokio_util::io::ReaderStream;

/// Platform every task image is built for.
pub const TARGET_PLATFORM: &str = "linux/amd64";

/// One progress message from a build or push.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Progress {
    /// Build step output, written verbatim.
    pub stream: Option<String>,
    pub status: Option<String>,
    pub progress: Option<String>,
    /// Error reported inside the stream by the engine.
    pub error: Option<String>,
}

impl From<BuildInfo> for Progress {
    fn from(info: BuildInfo) -> Self {
        let error = info
            .error
            .or_else(|| info.error_detail.and_then(|detail| detail.message));
        Self {
            stream: info.stream,
            status: info.status,
            progress: info.progress,
            error,
        }
    }
}

impl From<PushImageInfo> for Progress {
    fn from(info: PushImageInfo) -> Self {
        Self {
            stream: None,
            status: info.status,
            progress: info.progress,
            error: info.error,
        }
    }
}

pub type ProgressStream<'a> = BoxStream<'a, BuildResult<Progress>>;

/// Everything the engine needs to build one image.
pub struct BuildRequest {
    /// Gzipped tar archive with a top-level `Dockerfile`. Must stay on disk
    /// until the build stream ends.
    pub context: PathBuf,
    pub tag: String,
    pub build_args: HashMap<String, String>,
    pub platform: String,
    /// Credentials keyed by registry host.
    pub auth_configs: HashMap<String, DockerCredentials>,
}

#[async_trait]
pub trait ImageEngine: Send + Sync {
    /// Starts a build; the stream ends when the engine closes the response.
    fn build_image(&self, request: BuildRequest) -> ProgressStream<'_>;

    /// Tags of every image known to the engine.
    async fn list_image_tags(&self) -> BuildResult<Vec<String>>;

    /// Starts a push of `tag`.
    fn push_image(&self, tag: &str, credentials: DockerCredentials) -> ProgressStream<'_>;
}

/// Docker daemon reached through Bollard.
#[derive(Debug, Clone)]
pub struct DockerEngine {
    docker: Docker,
}

impl DockerEngine {
    /// Connects using `DOCKER_HOST` and friends, negotiating the API version.
    pub async fn connect() -> BuildResult<Self> {
        let docker = Docker::connect_with_defaults().map_err(BuildError::ClientInit)?;
        let docker = docker
            .negotiate_version()
            .await
            .map_err(BuildError::ClientInit)?;
        tracing::debug!("Connected to Docker daemon");
        Ok(Self { docker })
    }
}

#[async_trait]
impl ImageEngine for DockerEngine {
    fn build_image(&self, request: BuildRequest) -> ProgressStream<'_> {
        let archive = match File::open(&request.context) {
            Ok(file) => tokio::fs::File::from_std(file),
            Err(source) => {
                let err = BuildError::ContextAssembly {
                    path: request.context,
                    source,
                };
                return stream::once(async move { Err::<Progress, _>(err) }).boxed();
            }
        };

        let tag = request.tag.clone();
        let options = BuildImageOptions::<String> {
            dockerfile: "Dockerfile".to_string(),
            t: request.tag,
            buildargs: request.build_args,
            platform: request.platform,
            rm: true,
            forcerm: true,
            ..Default::default()
        };
        tracing::debug!("Build options: {:?}", options);

        // Streamed from disk so the upload follows the daemon's pace.
        let body = body_try_stream(ReaderStream::new(archive));
        self.docker
            .build_image(options, Some(request.auth_configs), Some(body))
            .map(move |msg| {
                msg.map(Progress::from)
                    .map_err(|e| BuildError::engine("image build", &tag, e))
            })
            .boxed()
    }

    async fn list_image_tags(&self) -> BuildResult<Vec<String>> {
        let images = self
            .docker
            .list_images(None::<bollard::query_parameters::ListImagesOptions>)
            .await
            .map_err(|e| BuildError::engine("image list", "", e))?;

        Ok(images.into_iter().flat_map(|img| img.repo_tags).collect())
    }

    fn push_image(&self, tag: &str, credentials: DockerCredentials) -> ProgressStream<'_> {
        let (image, image_tag) = split_image_tag(tag);
        let options = PushImageOptions::<String> { tag: image_tag };
        let tag = tag.to_string();

        self.docker
            .push_image(&image, Some(options), Some(credentials))
            .map(move |msg| {
                msg.map(Progress::from)
                    .map_err(|e| BuildError::engine("image push", &tag, e))
            })
            .boxed()
    }
}
