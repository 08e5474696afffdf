use anyhow::Context;
use colored::Colorize;
use std::path::PathBuf;
use std::sync::Arc;
use taskpress_api::ApiClient;
use taskpress_build::{ConfigRef, DockerEngine, EnvValue, LocalBuild, TaskEnv, build_local};
use taskpress_config::Settings;
use tokio_util::sync::CancellationToken;

pub struct BuildCommand {
    pub root: PathBuf,
    pub task_id: String,
    pub builder: String,
    pub args: Vec<(String, String)>,
    pub env: Vec<(String, String)>,
    pub env_config: Vec<(String, String)>,
    pub version: Option<String>,
    pub api_host: Option<String>,
    pub api_token: Option<String>,
}

/// Parses `KEY=VALUE`. The value may itself contain `=`.
pub fn parse_key_value(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(format!("expected KEY=VALUE, got {:?}", s)),
    }
}

/// Merges literal and config-backed env entries. A name given twice keeps
/// the config reference.
fn task_env(
    literals: Vec<(String, String)>,
    configs: Vec<(String, String)>,
) -> anyhow::Result<TaskEnv> {
    let mut env = TaskEnv::new();
    for (name, value) in literals {
        env.insert(name, EnvValue::Value(value));
    }
    for (name, reference) in configs {
        let reference = ConfigRef::parse(&reference)
            .with_context(|| format!("invalid config reference for {}", name))?;
        env.insert(name, EnvValue::Config(reference));
    }
    Ok(env)
}

/// Builds and pushes one task image.
pub async fn handle_build_command(cmd: BuildCommand, settings: Settings) -> anyhow::Result<()> {
    let root = std::path::absolute(&cmd.root)
        .with_context(|| format!("invalid task root: {}", cmd.root.display()))?;

    let token = cmd.api_token.or(settings.api_token).context(
        "API token is missing. Set TASKPRESS_API_TOKEN, pass --api-token or add api_token to config.yaml",
    )?;
    let host = cmd.api_host.unwrap_or(settings.api_host);
    let version = cmd.version.unwrap_or(settings.version);
    let env = task_env(cmd.env, cmd.env_config)?;
    let api = ApiClient::new(&host, token)?;
    tracing::debug!("API: {}, image version: {}", api.base_url(), version);
    let engine = DockerEngine::connect().await?;

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("{}", "Cancelling build...".yellow());
            on_interrupt.cancel();
        }
    });

    println!("{}", "Building task image...".green());
    println!("Task: {}", cmd.task_id.cyan());
    println!("Root: {}", root.display());
    if !cmd.builder.is_empty() {
        println!("Builder: {}", cmd.builder.cyan());
    }

    let request = LocalBuild {
        root,
        task_id: cmd.task_id,
        version,
        builder: cmd.builder,
        args: cmd.args.into_iter().collect(),
        env,
        ..Default::default()
    };
    let output = build_local(&api, Arc::new(engine), request, &cancel).await?;

    println!();
    println!("{} {}", "✓ Pushed".green(), output.tag().cyan());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_key_value() {
        assert_eq!(
            parse_key_value("entrypoint=main.py").unwrap(),
            ("entrypoint".to_string(), "main.py".to_string())
        );
        assert_eq!(
            parse_key_value("URL=a=b").unwrap(),
            ("URL".to_string(), "a=b".to_string())
        );
        assert_eq!(
            parse_key_value("EMPTY=").unwrap(),
            ("EMPTY".to_string(), String::new())
        );
        assert!(parse_key_value("novalue").is_err());
        assert!(parse_key_value("=x").is_err());
    }

    #[test]
    fn test_task_env() {
        let env = task_env(
            vec![("MODE".into(), "fast".into()), ("DB".into(), "local".into())],
            vec![("DB".into(), "db_url:prod".into())],
        )
        .unwrap();

        assert_eq!(env["MODE"], EnvValue::Value("fast".into()));
        assert_eq!(
            env["DB"],
            EnvValue::Config(ConfigRef {
                name: "db_url".into(),
                tag: Some("prod".into()),
            })
        );
    }

    #[test]
    fn test_task_env_bad_reference() {
        assert!(task_env(vec![], vec![("DB".into(), ":prod".into())]).is_err());
    }
}
