//! Task container image builds
//!
//! Turns a task directory into a container image: synthesizes a Dockerfile
//! for the task's runtime, stages and archives the build context, builds the
//! image on a container engine, verifies its tag and pushes it to the task
//! registry.

pub mod auth;
pub mod builder;
pub mod config;
pub mod context;
pub mod dockerfile;
pub mod engine;
pub mod env;
pub mod error;
pub mod orchestrator;
pub mod progress;
pub mod pusher;
pub mod remote;
pub mod tag;

pub use auth::RegistryAuth;
pub use builder::{BuildOutput, BuildState, ImageBuilder};
pub use config::{BuildArgs, BuildConfig, BuildKind, OutputSink};
pub use context::{BuildContext, ContextBuilder};
pub use dockerfile::{Builder, build_dockerfile};
pub use engine::{BuildRequest, DockerEngine, ImageEngine, Progress, ProgressStream};
pub use env::{ConfigRef, EnvValue, TaskEnv, resolve_build_env};
pub use error::{BuildError, BuildResult};
pub use orchestrator::{LocalBuild, build_local};
pub use pusher::ImagePusher;
pub use remote::{ConfigValue, GetConfigRequest, RegistryToken, RemoteError, TaskApi};
pub use tag::{image_tag, sanitize_task_id};
