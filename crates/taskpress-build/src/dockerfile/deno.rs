use super::template::{self, DockerfileSpec};
use super::version::{self, Runtime};
use super::{entrypoint, require};
use crate::config::BuildArgs;
use crate::error::BuildResult;
use std::path::Path;

const DOCKERFILE: &str = r#"FROM {{ base }}
{% for arg in build_args %}ARG {{ arg }}
{% endfor %}WORKDIR /task
COPY . .
RUN deno cache {{ entrypoint }}
ENTRYPOINT ["deno", "run", "-A", "/task/{{ entrypoint }}"]
"#;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DenoOptions {
    pub entrypoint: String,
}

impl DenoOptions {
    pub fn from_args(args: &BuildArgs) -> BuildResult<Self> {
        Ok(Self {
            entrypoint: entrypoint("deno", args)?,
        })
    }
}

pub(super) fn dockerfile(
    root: &Path,
    opts: &DenoOptions,
    build_args: &[String],
) -> BuildResult<String> {
    require(root, &opts.entrypoint)?;

    let spec = DockerfileSpec {
        base: version::base_image(Runtime::Deno, "1")?.to_string(),
        entrypoint: opts.entrypoint.clone(),
        build_args: build_args.to_vec(),
        ..Default::default()
    };

    template::render(DOCKERFILE, &spec)
}
