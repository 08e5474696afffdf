use async_trait::async_trait;
use bollard::auth::DockerCredentials;
use futures_util::StreamExt;
use futures_util::stream;
use std::collections::HashMap;
use std::fs;
use std::io::{self, Read, Write};
use std::path::{Component, Path, PathBuf};
use std::sync::{Arc, Mutex};
use taskpress_build::{
    BuildRequest, BuildResult, ConfigValue, GetConfigRequest, ImageEngine, Progress,
    ProgressStream, RegistryToken, RemoteError, TaskApi,
};
use tempfile::TempDir;

pub const REPO: &str = "us-docker.pkg.dev/proj/tasks";

pub struct TestTask {
    pub root: TempDir,
}

impl TestTask {
    pub fn new() -> Self {
        Self {
            root: tempfile::tempdir().unwrap(),
        }
    }

    pub fn write(&self, rel: &str, content: &str) {
        let path = self.root.path().join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, content).unwrap();
    }

    pub fn path(&self) -> PathBuf {
        self.root.path().to_path_buf()
    }
}

/// What the fake engine saw for one build call.
#[allow(dead_code)]
pub struct RecordedBuild {
    pub tag: String,
    pub platform: String,
    pub build_args: HashMap<String, String>,
    pub auth_hosts: Vec<String>,
    pub dockerfile: String,
}

#[derive(Default)]
pub enum BuildBehavior {
    /// Stream a step and register the tag.
    #[default]
    Succeed,
    /// Stream an embedded error and register nothing.
    NoImage,
    /// Never finish.
    Hang,
    /// Build succeeds; listing images never finishes.
    HangOnList,
    /// Build succeeds; pushing never finishes.
    HangOnPush,
}

/// In-memory engine that records every call.
#[derive(Default)]
pub struct FakeEngine {
    pub behavior: BuildBehavior,
    pub images: Mutex<Vec<String>>,
    pub builds: Mutex<Vec<RecordedBuild>>,
    pub pushes: Mutex<Vec<(String, DockerCredentials)>>,
    pub list_calls: Mutex<usize>,
}

impl FakeEngine {
    pub fn new(behavior: BuildBehavior) -> Arc<Self> {
        Arc::new(Self {
            behavior,
            ..Default::default()
        })
    }

    #[allow(dead_code)]
    pub fn build_count(&self) -> usize {
        self.builds.lock().unwrap().len()
    }

    #[allow(dead_code)]
    pub fn push_count(&self) -> usize {
        self.pushes.lock().unwrap().len()
    }
}

#[async_trait]
impl ImageEngine for FakeEngine {
    fn build_image(&self, request: BuildRequest) -> ProgressStream<'_> {
        let mut auth_hosts: Vec<String> = request.auth_configs.keys().cloned().collect();
        auth_hosts.sort();
        self.builds.lock().unwrap().push(RecordedBuild {
            tag: request.tag.clone(),
            platform: request.platform.clone(),
            build_args: request.build_args.clone(),
            auth_hosts,
            dockerfile: read_dockerfile(&request.context),
        });

        match self.behavior {
            BuildBehavior::Succeed | BuildBehavior::HangOnList | BuildBehavior::HangOnPush => {
                self.images.lock().unwrap().push(request.tag.clone());
                stream::iter(vec![
                    Ok(Progress {
                        stream: Some("Step 1/3 : FROM base\n".into()),
                        ..Default::default()
                    }),
                    Ok(Progress {
                        stream: Some(format!("Successfully tagged {}\n", request.tag)),
                        ..Default::default()
                    }),
                ])
                .boxed()
            }
            BuildBehavior::NoImage => stream::iter(vec![Ok(Progress {
                error: Some("The command '/bin/sh -c pip install' returned a non-zero code: 1".into()),
                ..Default::default()
            })])
            .boxed(),
            BuildBehavior::Hang => stream::pending().boxed(),
        }
    }

    async fn list_image_tags(&self) -> BuildResult<Vec<String>> {
        *self.list_calls.lock().unwrap() += 1;
        if matches!(self.behavior, BuildBehavior::HangOnList) {
            std::future::pending::<()>().await;
        }
        let mut tags = vec!["python:3.10-buster".to_string()];
        tags.extend(self.images.lock().unwrap().iter().cloned());
        Ok(tags)
    }

    fn push_image(&self, tag: &str, credentials: DockerCredentials) -> ProgressStream<'_> {
        self.pushes
            .lock()
            .unwrap()
            .push((tag.to_string(), credentials));
        if matches!(self.behavior, BuildBehavior::HangOnPush) {
            return stream::pending().boxed();
        }
        stream::iter(vec![Ok(Progress {
            status: Some("Pushed".into()),
            ..Default::default()
        })])
        .boxed()
    }
}

fn read_dockerfile(context: &Path) -> String {
    let decoder = flate2::read::GzDecoder::new(fs::File::open(context).unwrap());
    let mut archive = tar::Archive::new(decoder);
    for entry in archive.entries().unwrap() {
        let mut entry = entry.unwrap();
        let path = entry.path().unwrap().into_owned();
        let depth = path
            .components()
            .filter(|c| matches!(c, Component::Normal(_)))
            .count();
        if depth == 1 && path.ends_with("Dockerfile") {
            let mut content = String::new();
            entry.read_to_string(&mut content).unwrap();
            return content;
        }
    }
    String::new()
}

/// Task API serving a fixed set of configs.
#[derive(Default)]
pub struct FakeApi {
    pub configs: HashMap<String, String>,
    pub deny_token: bool,
    pub requests: Mutex<Vec<GetConfigRequest>>,
}

impl FakeApi {
    pub fn with_configs(configs: &[(&str, &str)]) -> Self {
        Self {
            configs: configs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            ..Default::default()
        }
    }
}

#[async_trait]
impl TaskApi for FakeApi {
    async fn registry_token(&self) -> Result<RegistryToken, RemoteError> {
        if self.deny_token {
            return Err("401 unauthorized".into());
        }
        Ok(RegistryToken {
            token: "ya29.token".into(),
            expiration: "2026-10-15T12:00:00Z".into(),
            repo: REPO.into(),
        })
    }

    async fn get_config(&self, request: GetConfigRequest) -> Result<ConfigValue, RemoteError> {
        self.requests.lock().unwrap().push(request.clone());
        match self.configs.get(&request.name) {
            Some(value) => Ok(ConfigValue {
                name: request.name,
                tag: request.tag,
                value: value.clone(),
                is_secret: true,
            }),
            None => Err(format!("config {} not found", request.name).into()),
        }
    }
}

/// Output sink the test can read back.
#[derive(Clone, Default)]
pub struct SharedBuffer(pub Arc<Mutex<Vec<u8>>>);

impl SharedBuffer {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
