use std::sync::Arc;

use clap::Parser;
use tokio::io::BufReader;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

mod config;
mod context;
mod discord;
mod error;
mod game;
mod mcp;
mod relay;
mod router;
mod tools;

use crate::config::Cli;
use crate::context::AppContext;
use crate::discord::{DiscordRestClient, GatewayListener};
use crate::mcp::McpServer;
use crate::router::EventRouter;
use crate::tools::ToolDispatcher;

/// Gateway events buffered ahead of the router
const EVENT_BUFFER: usize = 256;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    init_logging();

    info!(
        "Starting Discord MCP service v{}",
        env!("CARGO_PKG_VERSION")
    );

    let cli = Cli::parse();
    let config = config::load(&cli)?;

    info!(
        relay = %config.relay.bind_address(),
        channel_var = %config.bot.channel_var,
        channel_id = %config.bot.channel_id,
        "Configuration loaded"
    );

    let platform = Arc::new(DiscordRestClient::new(&config.discord)?);
    let ctx = Arc::new(AppContext::new(config, platform));
    let cancel = CancellationToken::new();

    // Relay endpoint; failing to bind takes the whole service down
    let relay_task = {
        let ctx = ctx.clone();
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if let Err(e) = relay::serve(&ctx.config.relay, ctx.relay.clone(), cancel.clone()).await
            {
                error!(error = %e, "Relay endpoint failed");
                cancel.cancel();
            }
        })
    };

    let (events_tx, events_rx) = mpsc::channel(EVENT_BUFFER);
    let gateway_task = tokio::spawn(
        GatewayListener::new(&ctx.config.discord).run(events_tx, cancel.clone()),
    );
    let router_task = tokio::spawn(EventRouter::new(ctx.clone()).run(events_rx, cancel.clone()));

    // MCP runs in the foreground on stdio until EOF, Ctrl-C or a fatal task error
    let server = McpServer::new(ToolDispatcher::new(ctx.clone()));
    tokio::select! {
        result = server.serve(BufReader::new(tokio::io::stdin()), tokio::io::stdout(), cancel.clone()) => {
            if let Err(e) = result {
                error!(error = %e, "MCP server failed");
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Shutdown signal received");
        }
    }

    cancel.cancel();
    let (relay_result, gateway_result, router_result) =
        tokio::join!(relay_task, gateway_task, router_task);
    for (task, result) in [
        ("relay", relay_result),
        ("gateway", gateway_result),
        ("router", router_result),
    ] {
        if let Err(e) = result {
            error!(task, error = %e, "Task panicked");
        }
    }

    info!("Shutdown complete");

    // A pending stdin read holds a blocking thread that runtime shutdown would wait on
    std::process::exit(0);
}

fn init_logging() {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    let format = fmt::format().with_target(true).compact();

    // stdout carries the MCP stream, so logs go to stderr
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("discord_mcp_service=info"));

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .event_format(format)
                .with_writer(std::io::stderr),
        )
        .with(filter)
        .init();
}
