//! sharedvfs server binary
//!
//! ## Usage
//!
//! ```bash
//! # Defaults: 127.0.0.1:4242, one volume "C:"
//! sharedvfs-server
//!
//! # Config file, with the port overridden
//! sharedvfs-server --config sharedvfs.toml --port 5000
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use sharedvfs_server::{ServerConfig, VfsServer};

#[derive(Parser, Debug)]
#[command(name = "sharedvfs-server", version, about = "Multi-user virtual file system server")]
struct Args {
    /// TOML configuration file
    #[arg(long, short)]
    config: Option<PathBuf>,

    /// Address to bind (overrides the config file)
    #[arg(long)]
    bind: Option<String>,

    /// TCP port (overrides the config file)
    #[arg(long, short)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();
    if let Err(e) = run(args).await {
        tracing::error!("server error: {e:#}");
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}

async fn run(args: Args) -> anyhow::Result<()> {
    let mut config = match &args.config {
        Some(path) => ServerConfig::load(path)?,
        None => ServerConfig::default(),
    };
    if let Some(bind) = args.bind {
        config = config.with_bind_address(bind);
    }
    if let Some(port) = args.port {
        config = config.with_port(port);
    }

    let server = VfsServer::bind(&config)
        .await
        .with_context(|| format!("failed to bind {}:{}", config.bind_address, config.port))?;
    tracing::info!(volumes = ?config.vfs.volumes, "namespace ready");
    server.run().await?;
    Ok(())
}
