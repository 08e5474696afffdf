use crate::auth::RegistryAuth;
use crate::error::{BuildError, BuildResult};
use std::collections::{BTreeMap, HashMap};
use std::io::Write;
use std::path::PathBuf;

/// Builder options from the task definition (entrypoint, shim, ...).
pub type BuildArgs = HashMap<String, String>;

/// Output sink for build and push progress.
pub type OutputSink = Box<dyn Write + Send>;

/// Builder name used when the task definition names none.
pub const DEFAULT_BUILDER: &str = "manual";

/// Where the image build runs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BuildKind {
    /// Local Docker daemon.
    #[default]
    Local,
    /// Hosted builders. Not handled by this crate.
    Remote,
}

/// Build configuration as supplied by the caller.
#[derive(Default)]
pub struct BuildConfig {
    pub kind: BuildKind,
    /// Task root. Must be absolute.
    pub root: PathBuf,
    /// Builder name; `manual` when empty.
    pub builder: String,
    /// Builder options; empty when `None`.
    pub args: Option<BuildArgs>,
    /// Resolved build env, passed to the build as build arguments.
    pub build_env: BTreeMap<String, String>,
    /// Required before any build call.
    pub auth: Option<RegistryAuth>,
    /// Progress output; stderr when `None`.
    pub output: Option<OutputSink>,
}

/// Validated configuration with all defaults applied.
pub struct ResolvedConfig {
    pub root: PathBuf,
    pub builder: String,
    pub args: BuildArgs,
    pub build_env: BTreeMap<String, String>,
    pub auth: RegistryAuth,
    pub output: OutputSink,
}

impl BuildConfig {
    pub fn resolve(self) -> BuildResult<ResolvedConfig> {
        if self.kind == BuildKind::Remote {
            return Err(BuildError::InvalidConfig(
                "remote builds are not supported by the local builder".into(),
            ));
        }

        if !self.root.is_absolute() {
            return Err(BuildError::InvalidConfig(format!(
                "expected an absolute path, got {:?}",
                self.root
            )));
        }

        let Some(auth) = self.auth else {
            return Err(BuildError::InvalidConfig(
                "builder requires registry auth".into(),
            ));
        };

        let builder = if self.builder.is_empty() {
            DEFAULT_BUILDER.to_string()
        } else {
            self.builder
        };

        Ok(ResolvedConfig {
            root: self.root,
            builder,
            args: self.args.unwrap_or_default(),
            build_env: self.build_env,
            auth,
            output: self.output.unwrap_or_else(|| Box::new(std::io::stderr())),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn auth() -> Option<RegistryAuth> {
        Some(RegistryAuth::new("token", "ghcr.io/org/tasks"))
    }

    #[test]
    fn test_resolve_defaults() {
        let config = BuildConfig {
            root: PathBuf::from("/srv/task"),
            auth: auth(),
            ..Default::default()
        };

        let resolved = config.resolve().unwrap();
        assert_eq!(resolved.builder, DEFAULT_BUILDER);
        assert!(resolved.args.is_empty());
        assert_eq!(resolved.auth.host(), "ghcr.io");
    }

    #[test]
    fn test_resolve_relative_root() {
        let config = BuildConfig {
            root: PathBuf::from("task"),
            auth: auth(),
            ..Default::default()
        };

        assert!(matches!(
            config.resolve(),
            Err(BuildError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_resolve_missing_auth() {
        let config = BuildConfig {
            root: PathBuf::from("/srv/task"),
            builder: "python".into(),
            ..Default::default()
        };

        let err = config.resolve().err().unwrap();
        assert!(err.to_string().contains("registry auth"));
    }

    #[test]
    fn test_resolve_remote_rejected() {
        let config = BuildConfig {
            kind: BuildKind::Remote,
            root: PathBuf::from("/srv/task"),
            auth: auth(),
            ..Default::default()
        };

        assert!(config.resolve().is_err());
    }
}
