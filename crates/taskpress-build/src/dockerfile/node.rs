use super::template::{self, DockerfileSpec};
use super::version::{self, Runtime};
use super::{entrypoint, exists, require, shim_enabled};
use crate::config::BuildArgs;
use crate::error::BuildResult;
use std::path::Path;

const SHIM: &str = include_str!("templates/node-shim.js");

const DEFAULT_NODE_VERSION: &str = "16";

const SHIM_DOCKERFILE: &str = r#"FROM {{ base }}
{% for arg in build_args %}ARG {{ arg }}
{% endfor %}WORKDIR /task
RUN mkdir -p .task && echo '{{ shim }}' > .task/shim.js
{% if has_manifest %}COPY package.json{% if has_lockfile %} yarn.lock{% endif %} ./
RUN {{ install }}
{% endif %}COPY . .
ENTRYPOINT ["node", ".task/shim.js"]
"#;

const LEGACY_DOCKERFILE: &str = r#"FROM {{ base }}
{% for arg in build_args %}ARG {{ arg }}
{% endfor %}WORKDIR /task
{% if not has_manifest %}RUN echo '{}' > package.json
{% endif %}COPY . .
RUN {{ install }}
ENTRYPOINT ["node", "/task/{{ entrypoint }}"]
"#;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeOptions {
    pub entrypoint: String,
    /// Major version, e.g. `16`.
    pub node_version: String,
    pub shim: bool,
}

impl NodeOptions {
    pub fn from_args(args: &BuildArgs) -> BuildResult<Self> {
        let node_version = args
            .get("nodeVersion")
            .filter(|v| !v.is_empty())
            .cloned()
            .unwrap_or_else(|| DEFAULT_NODE_VERSION.to_string());

        Ok(Self {
            entrypoint: entrypoint("node", args)?,
            node_version,
            shim: shim_enabled(args),
        })
    }
}

pub(super) fn dockerfile(
    root: &Path,
    opts: &NodeOptions,
    build_args: &[String],
) -> BuildResult<String> {
    require(root, &opts.entrypoint)?;

    let has_lockfile = exists(root, "yarn.lock");
    let install = if has_lockfile {
        "yarn install --non-interactive --frozen-lockfile"
    } else {
        "npm install"
    };

    let mut spec = DockerfileSpec {
        base: version::base_image(Runtime::Node, &opts.node_version)?.to_string(),
        entrypoint: opts.entrypoint.clone(),
        has_manifest: exists(root, "package.json"),
        has_lockfile,
        install: install.to_string(),
        build_args: build_args.to_vec(),
        ..Default::default()
    };

    if !opts.shim {
        return template::render(LEGACY_DOCKERFILE, &spec);
    }

    let shim = template::render_shim(SHIM, &opts.entrypoint)?;
    spec.shim = Some(template::embed(&shim));
    template::render(SHIM_DOCKERFILE, &spec)
}
