//! docagent CLI and REST API entry point.
//!
//! Binary name: `docagent`
//!
//! Parses CLI arguments, loads configuration, initializes database and
//! services, then dispatches to the command handler or starts the REST API
//! server.

mod cli;
mod http;
mod state;

use std::sync::Arc;
use std::time::Duration;

use clap_complete::generate;

use docagent_core::conversation::ConversationStore;
use docagent_infra::config::{API_KEY_ENV, apply_api_key_override, load_config};
use docagent_infra::sqlite::conversation::SqliteConversationStore;
use docagent_observe::tracing_setup::{init_tracing, shutdown_tracing};

use cli::{Cli, Commands};
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::load();

    // Shell completions don't need config or app state
    if let Commands::Completions { shell } = &cli.command {
        let mut cmd = <Cli as clap::CommandFactory>::command();
        generate(*shell, &mut cmd, "docagent", &mut std::io::stdout());
        return Ok(());
    }

    init_tracing(&cli.tracing_options())
        .map_err(|e| anyhow::anyhow!("failed to initialize tracing: {e}"))?;

    let mut config = load_config(&cli.data_dir).await;
    apply_api_key_override(&mut config, std::env::var(API_KEY_ENV).ok());

    let result = match cli.command {
        Commands::Serve { host, port } => {
            let host = host.unwrap_or_else(|| config.server.host.clone());
            let port = port.unwrap_or(config.server.port);
            let state = AppState::init(cli.data_dir.clone(), config).await?;
            serve(state, &host, port).await
        }

        Commands::Messages { session_id, json } => {
            let pool = state::open_database(&cli.data_dir, &config).await?;
            let store = SqliteConversationStore::new(pool, config.conversation.retention());
            cli::messages::show_messages(&store, &session_id, json).await
        }

        Commands::Completions { .. } => unreachable!("handled above"),
    };

    shutdown_tracing();
    result
}

async fn serve(state: AppState, host: &str, port: u16) -> anyhow::Result<()> {
    let addr = format!("{host}:{port}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    let purge = tokio::spawn(purge_expired_sessions(
        state.store.clone(),
        state.purge_interval,
    ));

    println!(
        "  {} docagent API listening on {}",
        console::style("⚡").bold(),
        console::style(format!("http://{addr}")).cyan()
    );
    println!("  {}", console::style("Press Ctrl+C to stop").dim());

    let router = http::router::build_router(state);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    purge.abort();
    println!("\n  Server stopped.");
    Ok(())
}

/// Periodically drop expired conversation sessions.
async fn purge_expired_sessions(store: Arc<SqliteConversationStore>, every: Duration) {
    if every.is_zero() {
        tracing::info!("Session purge disabled");
        return;
    }

    let mut ticker = tokio::time::interval(every);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;
        match store.purge_expired().await {
            Ok(0) => {}
            Ok(removed) => tracing::info!(removed, "Purged expired conversation sessions"),
            Err(err) => tracing::warn!(error = %err, "Failed to purge expired sessions"),
        }
    }
}

/// Wait for Ctrl+C or SIGTERM for graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %err, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("Shutdown signal received");
}
