use super::require;
use crate::config::BuildArgs;
use crate::error::BuildResult;
use std::path::Path;

const DEFAULT_DOCKERFILE: &str = "Dockerfile";

/// A task that ships its own Dockerfile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DockerOptions {
    /// Dockerfile path relative to the task root.
    pub dockerfile: String,
}

impl DockerOptions {
    pub fn from_args(args: &BuildArgs) -> Self {
        let dockerfile = args
            .get("dockerfile")
            .filter(|d| !d.is_empty())
            .cloned()
            .unwrap_or_else(|| DEFAULT_DOCKERFILE.to_string());
        Self { dockerfile }
    }
}

pub(super) fn dockerfile(root: &Path, opts: &DockerOptions) -> BuildResult<String> {
    let path = require(root, &opts.dockerfile)?;
    Ok(std::fs::read_to_string(path)?)
}
