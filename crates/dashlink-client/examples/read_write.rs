//! Read a pin, then write one
//!
//! Activates a dashboard, reads digital pin 4 from its device, prints the
//! reply fields, then writes digital pin 5 low (fire-and-forget).
//!
//! Usage:
//!     cargo run --example read_write -- --username you@example.com --password secret

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use dashlink_client::{AppClient, ClientConfig, PinKind, PinOp, Reply};

#[derive(Parser)]
#[command(name = "read_write")]
#[command(about = "Read and write device pins through an app server")]
struct Args {
    /// App server host
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// App server SSL port
    #[arg(long, default_value_t = 8443)]
    port: u16,

    /// Account username
    #[arg(short, long)]
    username: String,

    /// Account password
    #[arg(short, long)]
    password: String,

    /// Dashboard id to activate
    #[arg(long, default_value_t = 101)]
    dashboard: u32,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ClientConfig {
        host: args.host,
        port: args.port,
        ..Default::default()
    };

    let client = AppClient::connect(config, &args.username, &args.password)
        .await
        .context("Failed to connect and log in")?;

    client
        .activate(args.dashboard)
        .await
        .context("Failed to activate dashboard")?;
    tracing::info!("Activated dashboard {}", args.dashboard);

    let reply = client
        .hardware(args.dashboard, PinKind::Digital, PinOp::Read, 4, None)
        .await
        .context("Failed to read pin")?;
    if let Reply::Fields(fields) = reply {
        println!("Hardware response:");
        for (name, value) in ["dashboard", "command", "pin", "value"].iter().zip(&fields) {
            println!("\t{name}: {value}");
        }
    }

    let reply = client
        .hardware(args.dashboard, PinKind::Digital, PinOp::Write, 5, Some("0"))
        .await
        .context("Failed to write pin")?;
    println!("Write settled: {reply:?}");

    client.close().await?;
    Ok(())
}
