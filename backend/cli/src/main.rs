mod app;

use std::net::{IpAddr, SocketAddr};
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;

use folio_config::{load_and_validate, load_from_env, redact_config, Config};
use folio_gateway::auth::hash_password;
use folio_gateway::start_server;
use folio_store::SqliteStore;

#[derive(Parser)]
#[command(name = "folio")]
#[command(about = "Folio: portfolio site backend")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP API server
    Serve {
        /// Port to bind the HTTP server to
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Query a running server's health endpoint
    Status {
        /// Port the server listens on
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Validate the environment configuration and print it redacted
    CheckConfig,
    /// Read a password from stdin and print its Argon2id hash for ADMIN_PASSWORD_HASH
    HashPassword,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { port } => {
            // Logger first so validation findings are recorded.
            let logging = load_from_env()?.logging;
            folio_logging::init_logger(logging.dir.as_deref().map(Path::new), &logging.level);

            let (mut config, _report) = load_and_validate(true)?;
            if let Some(port) = port {
                config.server.port = port;
            }
            run_server(config).await?;
        }
        Commands::Status { port } => {
            let (config, _report) = load_and_validate(false)?;
            let port = port.unwrap_or(config.server.port);
            let client = reqwest::Client::new();
            match client
                .get(format!("http://localhost:{port}/api/health"))
                .send()
                .await
            {
                Ok(resp) => {
                    let body: serde_json::Value = resp.json().await?;
                    println!("{}", serde_json::to_string_pretty(&body)?);
                }
                Err(_) => {
                    println!("folio is not running on port {port}");
                }
            }
        }
        Commands::CheckConfig => {
            let (config, report) = load_and_validate(false)?;
            for warning in &report.warnings {
                println!("warning: {}: {}", warning.path, warning.message);
            }
            for error in &report.errors {
                println!("error: {}: {}", error.path, error.message);
            }
            println!("{}", serde_json::to_string_pretty(&redact_config(&config))?);
            if !report.is_valid() {
                std::process::exit(1);
            }
        }
        Commands::HashPassword => {
            let mut password = String::new();
            std::io::stdin()
                .read_line(&mut password)
                .context("Failed to read password from stdin")?;
            let password = password.trim_end_matches(['\r', '\n']);
            if password.is_empty() {
                anyhow::bail!("password must not be empty");
            }
            let hash = hash_password(password).map_err(|e| anyhow::anyhow!("hashing failed: {e}"))?;
            println!("{hash}");
        }
    }

    Ok(())
}

async fn run_server(config: Config) -> Result<()> {
    info!(
        port = config.server.port,
        bind = %config.server.bind_address,
        db = %config.database_path,
        "Starting folio"
    );

    let store = SqliteStore::open(&config.database_path)
        .with_context(|| format!("Failed to open database at {}", config.database_path))?;
    let state = app::build_state(&config, Arc::new(store)).await?;

    let ip: IpAddr = config
        .server
        .bind_address
        .parse()
        .with_context(|| format!("Invalid bind address {}", config.server.bind_address))?;
    let addr = SocketAddr::new(ip, config.server.port);

    start_server(addr, state, &config.server.cors_origins).await
}
