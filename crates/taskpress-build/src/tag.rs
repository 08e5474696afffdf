//! Image naming for task builds.

use crate::error::{BuildError, BuildResult};

/// Normalizes a task ID into an image name component.
///
/// Image names may only contain lowercase letters, numbers and hyphens and
/// must end with a letter or number. The ID is lowercased and a trailing
/// digit is always replaced with `a`.
pub fn sanitize_task_id(task_id: &str) -> BuildResult<String> {
    let mut s = task_id.to_lowercase();

    let Some(last) = s.chars().last() else {
        return Err(BuildError::InvalidInput("task ID must not be empty".into()));
    };

    if last.is_ascii_digit() {
        s.pop();
        s.push('a');
    }

    Ok(s)
}

/// Image name for a task: `task-<sanitized id>`.
pub fn image_name(task_id: &str) -> BuildResult<String> {
    Ok(format!("task-{}", sanitize_task_id(task_id)?))
}

/// Fully-qualified tag: `<repo>/task-<sanitized id>:<version>`.
pub fn image_tag(repo: &str, task_id: &str, version: &str) -> BuildResult<String> {
    Ok(format!("{}/{}:{}", repo, image_name(task_id)?, version))
}

/// Checks an image version against Docker's tag rules: at most 128
/// characters of `[A-Za-z0-9_.-]`, not starting with `.` or `-`.
pub fn validate_version(version: &str) -> BuildResult<()> {
    if version.is_empty() {
        return Err(BuildError::InvalidInput("image version must not be empty".into()));
    }

    if version.len() > 128 {
        return Err(BuildError::InvalidInput(format!(
            "image version too long ({} characters, max 128)",
            version.len()
        )));
    }

    if version.starts_with('.') || version.starts_with('-') {
        return Err(BuildError::InvalidInput(format!(
            "image version must not start with '.' or '-': {}",
            version
        )));
    }

    if let Some(c) = version
        .chars()
        .find(|c| !c.is_ascii_alphanumeric() && *c != '.' && *c != '-' && *c != '_')
    {
        return Err(BuildError::InvalidInput(format!(
            "invalid character '{}' in image version: {}",
            c, version
        )));
    }

    Ok(())
}

/// Splits an image reference into image and tag.
///
/// Only a `:` after the last `/` separates a tag, so registry ports are
/// never mistaken for one.
///
/// # Examples
/// - `ghcr.io/org/app:v1.0` -> `("ghcr.io/org/app", "v1.0")`
/// - `ghcr.io/org/app:2` -> `("ghcr.io/org/app", "2")`
/// - `ghcr.io/org/app` -> `("ghcr.io/org/app", "latest")`
/// - `localhost:5000/app:dev` -> `("localhost:5000/app", "dev")`
pub fn split_image_tag(image: &str) -> (String, String) {
    let name_start = image.rfind('/').map_or(0, |pos| pos + 1);

    match image[name_start..].rfind(':') {
        Some(pos) => {
            let pos = name_start + pos;
            (image[..pos].to_string(), image[pos + 1..].to_string())
        }
        None => (image.to_string(), "latest".to_string()),
    }
}
