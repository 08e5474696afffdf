use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BuildError {
    #[error("Invalid build configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Failed to initialize the container engine client: {0}")]
    ClientInit(#[source] bollard::errors::Error),

    #[error("build: the file {file} is required")]
    MissingFile { file: String },

    #[error("No base image for {runtime} version {version:?}")]
    VersionResolution { runtime: String, version: String },

    #[error("build: unknown builder type {0:?}")]
    UnsupportedBuilder(String),

    #[error("Invalid option for builder {builder}: {message}")]
    InvalidBuilderOption { builder: String, message: String },

    #[error("Template rendering failed: {0}")]
    Template(#[from] tera::Error),

    #[error("Failed to assemble build context from {path}: {source}")]
    ContextAssembly {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{method} failed for {tag}: {message}")]
    Engine {
        method: &'static str,
        tag: String,
        message: String,
    },

    #[error("build: image with the tag {tag:?} was not found")]
    ImageNotFound { tag: String },

    #[error("Failed to resolve config {name:?}: {message}")]
    ConfigResolution { name: String, message: String },

    #[error("Remote API request failed: {0}")]
    Api(String),

    #[error("Build was cancelled")]
    Cancelled,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl BuildError {
    pub(crate) fn engine(method: &'static str, tag: &str, err: impl std::fmt::Display) -> Self {
        BuildError::Engine {
            method,
            tag: tag.to_string(),
            message: err.to_string(),
        }
    }

    /// Human-facing message with remediation hints.
    pub fn user_message(&self) -> String {
        match self {
            BuildError::MissingFile { file } => {
                format!(
                    "The file {} is required but was not found in the task root.\n\
                     \n\
                     Fix:\n\
                     1. Check the entrypoint path in the task definition\n\
                     2. Make sure the file is inside the task root directory",
                    file
                )
            }
            BuildError::ClientInit(e) => {
                format!(
                    "Could not connect to the Docker daemon: {}\n\
                     \n\
                     Fix:\n\
                     1. Make sure Docker is running (`docker ps` should work)\n\
                     2. Check DOCKER_HOST if you use a remote daemon",
                    e
                )
            }
            BuildError::ImageNotFound { tag } => {
                format!(
                    "The build finished but no image tagged {} exists.\n\
                     \n\
                     Scroll up in the build output for the failing step.",
                    tag
                )
            }
            BuildError::UnsupportedBuilder(name) => {
                format!(
                    "Unknown builder {:?}.\n\
                     \n\
                     Supported builders: go, deno, python, node, docker",
                    name
                )
            }
            _ => format!("{}", self),
        }
    }
}

pub type BuildResult<T> = std::result::Result<T, BuildError>;
