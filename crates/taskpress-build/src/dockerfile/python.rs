use super::template::{self, DockerfileSpec};
use super::version::{self, Runtime};
use super::{entrypoint, exists, require, shim_enabled};
use crate::config::BuildArgs;
use crate::error::BuildResult;
use std::path::Path;

const SHIM: &str = include_str!("templates/python-shim.py");

const SHIM_DOCKERFILE: &str = r#"FROM {{ base }}
{% for arg in build_args %}ARG {{ arg }}
{% endfor %}WORKDIR /task
RUN mkdir -p .task && echo '{{ shim }}' > .task/shim.py
{% if has_manifest %}COPY requirements.txt .
RUN pip install -r requirements.txt
{% endif %}COPY . .
ENTRYPOINT ["python", ".task/shim.py"]
"#;

const LEGACY_DOCKERFILE: &str = r#"FROM {{ base }}
{% for arg in build_args %}ARG {{ arg }}
{% endfor %}WORKDIR /task
{% if not has_manifest %}RUN echo > requirements.txt
{% endif %}COPY . .
RUN pip install -r requirements.txt
ENTRYPOINT ["python", "/task/{{ entrypoint }}"]
"#;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PythonOptions {
    pub entrypoint: String,
    pub shim: bool,
}

impl PythonOptions {
    pub fn from_args(args: &BuildArgs) -> BuildResult<Self> {
        Ok(Self {
            entrypoint: entrypoint("python", args)?,
            shim: shim_enabled(args),
        })
    }
}

pub(super) fn dockerfile(
    root: &Path,
    opts: &PythonOptions,
    build_args: &[String],
) -> BuildResult<String> {
    require(root, &opts.entrypoint)?;

    let mut spec = DockerfileSpec {
        base: version::base_image(Runtime::Python, "3")?.to_string(),
        entrypoint: opts.entrypoint.clone(),
        has_manifest: exists(root, "requirements.txt"),
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
