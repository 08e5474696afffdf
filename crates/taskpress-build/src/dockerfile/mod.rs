//! Dockerfile synthesis
//!
//! Each builder kind validates its options, checks the files it needs under
//! the task root and renders a recipe for its runtime.

mod deno;
mod docker;
mod golang;
mod node;
mod python;
pub mod template;
pub mod version;

use crate::config::BuildArgs;
use crate::error::{BuildError, BuildResult};
use std::path::{Path, PathBuf};

pub use deno::DenoOptions;
pub use docker::DockerOptions;
pub use golang::GoOptions;
pub use node::NodeOptions;
pub use python::PythonOptions;
pub use template::DockerfileSpec;

/// A builder kind with its validated options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Builder {
    Go(GoOptions),
    Deno(DenoOptions),
    Python(PythonOptions),
    Node(NodeOptions),
    Docker(DockerOptions),
}

impl Builder {
    /// Parses a builder name and its options.
    pub fn from_args(name: &str, args: &BuildArgs) -> BuildResult<Self> {
        match name {
            "go" => Ok(Builder::Go(GoOptions::from_args(args)?)),
            "deno" => Ok(Builder::Deno(DenoOptions::from_args(args)?)),
            "python" => Ok(Builder::Python(PythonOptions::from_args(args)?)),
            "node" => Ok(Builder::Node(NodeOptions::from_args(args)?)),
            "docker" => Ok(Builder::Docker(DockerOptions::from_args(args))),
            _ => Err(BuildError::UnsupportedBuilder(name.to_string())),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Builder::Go(_) => "go",
            Builder::Deno(_) => "deno",
            Builder::Python(_) => "python",
            Builder::Node(_) => "node",
            Builder::Docker(_) => "docker",
        }
    }

    /// Renders the recipe against the files under `root`.
    ///
    /// `build_args` are declared as `ARG`s in generated recipes; a user
    /// Dockerfile is returned as-is.
    pub fn dockerfile(&self, root: &Path, build_args: &[String]) -> BuildResult<String> {
        tracing::debug!(builder = self.name(), root = %root.display(), "Synthesizing Dockerfile");
        match self {
            Builder::Go(opts) => golang::dockerfile(root, opts, build_args),
            Builder::Deno(opts) => deno::dockerfile(root, opts, build_args),
            Builder::Python(opts) => python::dockerfile(root, opts, build_args),
            Builder::Node(opts) => node::dockerfile(root, opts, build_args),
            Builder::Docker(opts) => docker::dockerfile(root, opts),
        }
    }
}

/// Parses `name` with `args` and renders its recipe.
pub fn build_dockerfile(
    name: &str,
    root: &Path,
    args: &BuildArgs,
    build_args: &[String],
) -> BuildResult<String> {
    Builder::from_args(name, args)?.dockerfile(root, build_args)
}

/// Reads the `entrypoint` option. It must be a relative path that can be
/// quoted inside a `RUN echo '...'` line.
fn entrypoint(builder: &str, args: &BuildArgs) -> BuildResult<String> {
    let invalid = |message: &str| BuildError::InvalidBuilderOption {
        builder: builder.to_string(),
        message: message.to_string(),
    };

    let entrypoint = args
        .get("entrypoint")
        .filter(|e| !e.is_empty())
        .ok_or_else(|| invalid("entrypoint is required"))?;

    if Path::new(entrypoint).is_absolute() {
        return Err(invalid("entrypoint must be relative to the task root"));
    }
    if entrypoint.contains(['\'', '"', '\n']) {
        return Err(invalid("entrypoint must not contain quotes or newlines"));
    }

    Ok(entrypoint.clone())
}

fn shim_enabled(args: &BuildArgs) -> bool {
    args.get("shim").map(String::as_str) == Some("true")
}

/// Ensures `rel` exists under `root`.
fn require(root: &Path, rel: &str) -> BuildResult<PathBuf> {
    let path = root.join(rel);
    if !path.exists() {
        let file = path
            .file_name()
            .map(|f| f.to_string_lossy().into_owned())
            .unwrap_or_else(|| rel.to_string());
        return Err(BuildError::MissingFile { file });
    }
    Ok(path)
}

fn exists(root: &Path, rel: &str) -> bool {
    root.join(rel).exists()
}

/// Directory holding the entrypoint, as a relative path (`.` at the root).
fn entrypoint_dir(entrypoint: &str) -> String {
    match Path::new(entrypoint).parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir.to_string_lossy().into_owned(),
        _ => ".".to_string(),
    }
}
