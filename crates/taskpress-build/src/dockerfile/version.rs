use crate::error::{BuildError, BuildResult};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Runtime {
    Python,
    Node,
    Go,
    Deno,
}

impl fmt::Display for Runtime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Runtime::Python => "python",
            Runtime::Node => "node",
            Runtime::Go => "go",
            Runtime::Deno => "deno",
        };
        f.write_str(name)
    }
}

/// Base images by runtime and major version.
const BASE_IMAGES: &[(Runtime, &str, &str)] = &[
    (Runtime::Python, "3", "python:3.10-buster"),
    (Runtime::Node, "12", "node:12-buster"),
    (Runtime::Node, "14", "node:14-buster"),
    (Runtime::Node, "15", "node:15-buster"),
    (Runtime::Node, "16", "node:16-buster"),
    (Runtime::Node, "18", "node:18-buster"),
    (Runtime::Go, "1", "golang:1.17-alpine3.14"),
    (Runtime::Deno, "1", "denoland/deno:alpine-1.16.3"),
];

/// Resolves the base image for `runtime` at major version `version`.
pub fn base_image(runtime: Runtime, version: &str) -> BuildResult<&'static str> {
    BASE_IMAGES
        .iter()
        .find(|(r, v, _)| *r == runtime && *v == version)
        .map(|(_, _, image)| *image)
        .ok_or_else(|| BuildError::VersionResolution {
            runtime: runtime.to_string(),
            version: version.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_image() {
        assert_eq!(
            base_image(Runtime::Python, "3").unwrap(),
            "python:3.10-buster"
        );
        assert_eq!(base_image(Runtime::Node, "16").unwrap(), "node:16-buster");
    }

    #[test]
    fn test_base_image_unknown_version() {
        let err = base_image(Runtime::Node, "10").unwrap_err();
        assert!(matches!(err, BuildError::VersionResolution { .. }));
        assert!(err.to_string().contains("node"));
    }
}
