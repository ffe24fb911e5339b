//! Parley CLI and REST API entry point.
//!
//! Binary name: `parley`
//!
//! Parses CLI arguments, initializes database and services, then dispatches
//! to the appropriate command handler or starts the REST API server.

mod cli;
mod http;
mod state;

use clap::Parser;
use clap_complete::generate;
use tracing::{error, info};
use uuid::Uuid;

use cli::{Cli, Commands, SessionCommand};
use parley_infra::config::resolve_data_dir;
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Set up tracing based on verbosity; RUST_LOG takes precedence.
    let filter = match cli.verbose {
        0 if cli.quiet => "error",
        0 => "warn",
        1 => "info,parley=debug",
        _ => "trace",
    };
    parley_observe::tracing_setup::init_tracing(filter, cli.otel)
        .map_err(|e| anyhow::anyhow!("Failed to initialize tracing: {e}"))?;

    // Shell completions don't need app state
    if let Commands::Completions { shell } = &cli.command {
        let mut cmd = <Cli as clap::CommandFactory>::command();
        generate(*shell, &mut cmd, "parley", &mut std::io::stdout());
        return Ok(());
    }

    let result = run(cli).await;
    parley_observe::tracing_setup::shutdown_tracing();
    result
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let state = AppState::init(resolve_data_dir()).await?;

    match cli.command {
        // The server takes the owner from each request instead.
        Commands::Serve { port, host } => serve(state, host, port).await,
        command => {
            let owner = cli::owner::resolve_owner(cli.owner, &state.data_dir).await?;
            run_command(&state, command, owner, cli.json, cli.quiet).await
        }
    }
}

async fn run_command(
    state: &AppState,
    command: Commands,
    owner: Uuid,
    json: bool,
    quiet: bool,
) -> anyhow::Result<()> {
    match command {
        Commands::Session { action } => match action {
            SessionCommand::Create { title } => {
                cli::session::create_session(state, owner, title, json).await?;
            }
            SessionCommand::List => {
                cli::session::list_sessions(state, owner, json).await?;
            }
            SessionCommand::Show { session_id } => {
                cli::session::show_session(state, owner, session_id, json).await?;
            }
            SessionCommand::Rename { session_id, title } => {
                cli::session::rename_session(state, owner, session_id, &title, json).await?;
            }
            SessionCommand::Delete { session_id, force } => {
                cli::session::delete_session(state, owner, session_id, force, json).await?;
            }
        },

        Commands::Messages { session_id, cached } => {
            cli::message::list_messages(state, owner, session_id, cached, json).await?;
        }

        Commands::Send { session_id, text } => {
            cli::message::send_message(state, owner, session_id, &text, json, quiet).await?;
        }

        Commands::Chat { session_id, title } => {
            cli::chat::loop_runner::run_chat_loop(state, owner, session_id, title).await?;
        }

        Commands::Serve { .. } => unreachable!("handled in run"),
        Commands::Completions { .. } => unreachable!("handled in main"),
    }

    Ok(())
}

async fn serve(state: AppState, host: Option<String>, port: Option<u16>) -> anyhow::Result<()> {
    let host = host.unwrap_or_else(|| state.config.server.host.clone());
    let port = port.unwrap_or(state.config.server.port);

    let addr = format!("{host}:{port}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!(%addr, cache = state.cache_backend, "Listening");
    println!(
        "  {} Parley API listening on {}",
        console::style("⚡").bold(),
        console::style(format!("http://{addr}")).cyan()
    );
    println!("  {}", console::style("Press Ctrl+C to stop").dim());

    let router = http::router::build_router(state);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    println!("\n  Server stopped.");
    Ok(())
}

/// Wait for Ctrl+C or SIGTERM for graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
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
}
