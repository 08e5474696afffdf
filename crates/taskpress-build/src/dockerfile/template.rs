//! Recipe and shim rendering
//!
//! Plain text substitution through Tera with autoescaping disabled.

use crate::error::BuildResult;
use serde::Serialize;
use tera::{Context, Tera};

/// Template inputs shared by the runtime recipes.
#[derive(Debug, Default, Serialize)]
pub struct DockerfileSpec {
    /// Resolved base image.
    pub base: String,
    /// Entrypoint relative to the task root.
    pub entrypoint: String,
    /// Directory of the entrypoint, `.` at the root.
    pub entrypoint_dir: String,
    /// Adapter script, already escaped for embedding.
    pub shim: Option<String>,
    pub has_manifest: bool,
    pub has_lockfile: bool,
    /// Dependency install command.
    pub install: String,
    /// Build env names declared as `ARG`.
    pub build_args: Vec<String>,
}

pub fn render(template: &str, data: &impl Serialize) -> BuildResult<String> {
    let context = Context::from_serialize(data)?;
    Ok(Tera::one_off(template, &context, false)?)
}

/// Escapes a script so `echo '<script>'` inside a `RUN` line writes it back
/// out with its newlines.
pub fn embed(script: &str) -> String {
    script.split('\n').collect::<Vec<_>>().join("\\n\\\n")
}

#[derive(Serialize)]
struct ShimData<'a> {
    entrypoint: &'a str,
}

/// Renders an adapter script for `entrypoint`.
pub fn render_shim(template: &str, entrypoint: &str) -> BuildResult<String> {
    render(template, &ShimData { entrypoint })
}
