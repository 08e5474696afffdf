mod build;

use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;
use taskpress_build::BuildError;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "taskpress")]
#[command(about = "Build and push task container images", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build a task image on the local Docker daemon and push it
    Build {
        /// Task root directory
        #[arg(short, long, default_value = ".")]
        root: PathBuf,
        /// Task ID the image is named after
        #[arg(short = 't', long)]
        task_id: String,
        /// Builder kind (go, deno, python, node, docker)
        #[arg(short, long, default_value = "")]
        builder: String,
        /// Builder option, e.g. entrypoint=main.py (repeatable)
        #[arg(long = "arg", value_name = "KEY=VALUE", value_parser = build::parse_key_value)]
        args: Vec<(String, String)>,
        /// Build env value (repeatable)
        #[arg(long = "env", value_name = "NAME=VALUE", value_parser = build::parse_key_value)]
        env: Vec<(String, String)>,
        /// Build env value taken from a config (repeatable)
        #[arg(long = "env-config", value_name = "NAME=CONFIG[:TAG]", value_parser = build::parse_key_value)]
        env_config: Vec<(String, String)>,
        /// Image version; defaults to the configured version
        #[arg(long)]
        version: Option<String>,
        /// API host
        #[arg(long, env = "TASKPRESS_API_HOST")]
        api_host: Option<String>,
        /// API token
        #[arg(long, env = "TASKPRESS_API_TOKEN", hide_env_values = true)]
        api_token: Option<String>,
    },
    /// Show version information
    Version,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    if let Err(e) = run(cli).await {
        match e.downcast_ref::<BuildError>() {
            Some(build_error) => {
                eprintln!("{} {}", "Error:".red().bold(), build_error.user_message())
            }
            None => eprintln!("{} {:#}", "Error:".red().bold(), e),
        }
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Version => {
            println!("taskpress {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        Commands::Build {
            root,
            task_id,
            builder,
            args,
            env,
            env_config,
            version,
            api_host,
            api_token,
        } => {
            let settings = taskpress_config::load_settings()?;
            build::handle_build_command(
                build::BuildCommand {
                    root,
                    task_id,
                    builder,
                    args,
                    env,
                    env_config,
                    version,
                    api_host,
                    api_token,
                },
                settings,
            )
            .await
        }
    }
}
