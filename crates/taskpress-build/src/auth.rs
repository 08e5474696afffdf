//! Registry authentication
//!
//! Turns the registry token handed out by the task API into Bollard
//! `DockerCredentials` for build and push calls.

use bollard::auth::DockerCredentials;
use std::collections::HashMap;
use std::fmt;

/// Username the registry expects when the password is an access token.
pub const TOKEN_USERNAME: &str = "oauth2accesstoken";

/// Registry credentials scoped to a single repository.
#[derive(Clone, PartialEq, Eq)]
pub struct RegistryAuth {
    /// Access token used as the registry password.
    pub token: String,
    /// Repository reference, e.g. `us-docker.pkg.dev/project/tasks`.
    pub repo: String,
}

impl fmt::Debug for RegistryAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegistryAuth")
            .field("token", &"<redacted>")
            .field("repo", &self.repo)
            .finish()
    }
}

impl RegistryAuth {
    pub fn new(token: impl Into<String>, repo: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            repo: repo.into(),
        }
    }

    /// Registry host: everything before the first `/` of the repository.
    ///
    /// # Examples
    /// - `us-docker.pkg.dev/project/tasks` -> `us-docker.pkg.dev`
    /// - `localhost:5000/tasks` -> `localhost:5000`
    /// - `registry.local` -> `registry.local`
    pub fn host(&self) -> &str {
        self.repo
            .split_once('/')
            .map(|(host, _)| host)
            .unwrap_or(&self.repo)
    }

    /// Credentials for pushing to the registry host.
    pub fn credentials(&self) -> DockerCredentials {
        DockerCredentials {
            username: Some(TOKEN_USERNAME.to_string()),
            password: Some(self.token.clone()),
            serveraddress: Some(self.host().to_string()),
            ..Default::default()
        }
    }

    /// Per-host credential map for the build call, so base images can be
    /// pulled from the same registry.
    pub fn auth_configs(&self) -> HashMap<String, DockerCredentials> {
        HashMap::from([(self.host().to_string(), self.credentials())])
    }
}
