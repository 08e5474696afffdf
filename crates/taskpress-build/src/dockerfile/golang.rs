use super::template::{self, DockerfileSpec};
use super::version::{self, Runtime};
use super::{entrypoint, entrypoint_dir, exists, require};
use crate::config::BuildArgs;
use crate::error::BuildResult;
use std::path::Path;

const DOCKERFILE: &str = r#"FROM {{ base }}
{% for arg in build_args %}ARG {{ arg }}
{% endfor %}WORKDIR /task
COPY go.mod{% if has_lockfile %} go.sum{% endif %} ./
RUN go mod download
COPY . .
RUN go build -o /bin/task ./{{ entrypoint_dir }}
ENTRYPOINT ["/bin/task"]
"#;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GoOptions {
    pub entrypoint: String,
}

impl GoOptions {
    pub fn from_args(args: &BuildArgs) -> BuildResult<Self> {
        Ok(Self {
            entrypoint: entrypoint("go", args)?,
        })
    }
}

pub(super) fn dockerfile(root: &Path, opts: &GoOptions, build_args: &[String]) -> BuildResult<String> {
    require(root, &opts.entrypoint)?;
    require(root, "go.mod")?;

    let spec = DockerfileSpec {
        base: version::base_image(Runtime::Go, "1")?.to_string(),
        entrypoint: opts.entrypoint.clone(),
        entrypoint_dir: entrypoint_dir(&opts.entrypoint),
        has_manifest: true,
        has_lockfile: exists(root, "go.sum"),
        build_args: build_args.to_vec(),
        ..Default::default()
    };

    template::render(DOCKERFILE, &spec)
}
