//! sharedvfs console.
//!
//! Usage:
//!   sharedvfs                          # 127.0.0.1:4242
//!   sharedvfs --host 10.0.0.5 --port 5000

use anyhow::{Context, Result};
use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{EnvFilter, fmt};

use sharedvfs_client::constants::{DEFAULT_HOST, DEFAULT_PORT};
use sharedvfs_client::{Console, Outcome, VfsClient};

/// Console client for a sharedvfs server.
#[derive(Parser, Debug)]
#[command(name = "sharedvfs")]
#[command(about = "Console client for the sharedvfs server")]
struct Args {
    /// Server host
    #[arg(long, default_value = DEFAULT_HOST)]
    host: String,

    /// Server port
    #[arg(long, short, default_value_t = DEFAULT_PORT)]
    port: u16,
}

#[tokio::main]
async fn main() -> Result<()> {
    fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let (client, mut notifications) = VfsClient::open(&args.host, args.port)
        .await
        .with_context(|| format!("failed to connect to {}:{}", args.host, args.port))?;
    let console = Console::new(client);

    for line in Console::banner() {
        println!("{line}");
    }

    let mut stdin = BufReader::new(tokio::io::stdin()).lines();
    let mut notifications_open = true;
    loop {
        tokio::select! {
            line = stdin.next_line() => {
                let Some(line) = line? else { break };
                match console.handle_line(&line).await {
                    Outcome::Continue(out) => out.iter().for_each(|l| println!("{l}")),
                    Outcome::Exit(out) => {
                        out.iter().for_each(|l| println!("{l}"));
                        break;
                    }
                }
            }
            event = notifications.recv(), if notifications_open => match event {
                Some(event) => println!("{}", Console::render_event(&event)),
                None => {
                    notifications_open = false;
                    tracing::warn!("server closed the connection");
                }
            },
        }
    }
    Ok(())
}
