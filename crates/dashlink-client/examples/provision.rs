//! Provision a dashboard end to end
//!
//! Deletes dashboard 101 if present, recreates it, adds a button and a
//! display widget, then prints the dashboard's device token.
//!
//! Usage:
//!     cargo run --example provision -- --username you@example.com --password secret

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use dashlink_client::{AppClient, ClientConfig, ClientError, Widget};

#[derive(Parser)]
#[command(name = "provision")]
#[command(about = "Provision a demo dashboard on an app server")]
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

    /// Dashboard id to provision
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

    // A fresh run may find no dashboard to delete; that's fine
    match client.delete_dashboard(args.dashboard).await {
        Ok(_) => tracing::info!("Deleted old dashboard {}", args.dashboard),
        Err(ClientError::Rejected { code }) => {
            tracing::info!("No dashboard {} to delete (status {})", args.dashboard, code)
        }
        Err(e) => return Err(e).context("Failed to delete dashboard"),
    }

    client
        .create_dashboard(args.dashboard, "DashTest", "GRID")
        .await
        .context("Failed to create dashboard")?;
    tracing::info!("Created dashboard {}", args.dashboard);

    client
        .create_widget(
            args.dashboard,
            Widget {
                id: 1,
                x: 0,
                y: 0,
                label: "Button".to_string(),
                kind: "BUTTON".to_string(),
                pin_kind: "DIGITAL".to_string(),
                pin: "5".to_string(),
            },
        )
        .await
        .context("Failed to create button widget")?;

    client
        .create_widget(
            args.dashboard,
            Widget {
                id: 2,
                x: 200,
                y: 200,
                label: "Display".to_string(),
                kind: "DIGIT4_DISPLAY".to_string(),
                pin_kind: "DIGITAL".to_string(),
                pin: "4".to_string(),
            },
        )
        .await
        .context("Failed to create display widget")?;
    tracing::info!("Created widgets");

    let token = client
        .get_token(args.dashboard)
        .await
        .context("Failed to fetch token")?;
    println!("Token: {token}");

    client.close().await?;
    Ok(())
}
