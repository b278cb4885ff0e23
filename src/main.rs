use anyhow::Context;
use clap::{Parser, Subcommand};
use portfolio_guard::config::AppConfig;
use portfolio_guard::http_server::{serve, AppState};
use portfolio_guard::logging::{init_tracing, TracingConfig};
use portfolio_guard::session::hash_password;
use std::sync::Arc;

#[derive(Debug, Parser)]
#[command(name = "portfolio-guard", version, about)]
struct Cli {
    /// Address to bind (overrides BIND_ADDR)
    #[arg(long)]
    bind: Option<String>,

    /// Emit diagnostic logs as JSON
    #[arg(long, env = "JSON_LOGS")]
    json_logs: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print an Argon2 hash suitable for ADMIN_PASSWORD_HASH
    HashPassword { password: String },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if let Some(Command::HashPassword { password }) = cli.command {
        println!("{}", hash_password(&password)?);
        return Ok(());
    }

    init_tracing(&TracingConfig::default().with_json(cli.json_logs))?;

    let config = AppConfig::from_env().context("failed to load configuration")?;
    let bind = cli.bind.unwrap_or_else(|| config.bind_addr.clone());

    tracing::info!(
        environment = %config.environment,
        log_level = %config.log_level,
        require_consent = config.require_consent,
        retention_days = config.data_retention_days,
        "configuration loaded"
    );

    let state = AppState::from_config(Arc::new(config));
    serve(state, &bind).await?;

    Ok(())
}
