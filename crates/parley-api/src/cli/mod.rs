//! CLI command definitions and dispatch for the `parley` binary.
//!
//! Uses clap derive macros for argument parsing. Session management follows
//! a noun-verb pattern (`parley session create`); turn commands are
//! top-level verbs (`parley send`, `parley chat`).

pub mod chat;
pub mod message;
pub mod owner;
pub mod session;

use clap::{Parser, Subcommand};
use clap_complete::Shell;
use uuid::Uuid;

/// Durable chat sessions with a cached conversation window.
#[derive(Parser)]
#[command(name = "parley", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Owner identity for session commands (defaults to a per-install id).
    #[arg(long, global = true, env = "PARLEY_OWNER")]
    pub owner: Option<Uuid>,

    /// Output machine-readable JSON instead of styled text.
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress all output except errors.
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Detailed output (-v for verbose, -vv for debug/trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Also export spans through OpenTelemetry (stdout exporter).
    #[arg(long, global = true)]
    pub otel: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Manage chat sessions (create, list, show, rename, delete).
    Session {
        #[command(subcommand)]
        action: SessionCommand,
    },

    /// Show the messages of a session.
    Messages {
        /// Session ID.
        session_id: Uuid,

        /// Read the cached window instead of the full log.
        #[arg(long)]
        cached: bool,
    },

    /// Send one message and print the assistant reply.
    Send {
        /// Session ID.
        session_id: Uuid,

        /// Message text.
        text: String,
    },

    /// Start an interactive chat loop.
    Chat {
        /// Continue an existing session instead of creating one.
        session_id: Option<Uuid>,

        /// Title for the new session.
        #[arg(long)]
        title: Option<String>,
    },

    /// Start the REST API server.
    Serve {
        /// Port to listen on (overrides config and PORT).
        #[arg(short, long)]
        port: Option<u16>,

        /// Host to bind to (overrides config).
        #[arg(long)]
        host: Option<String>,
    },

    /// Generate shell completions.
    Completions {
        /// Shell to generate completions for.
        shell: Shell,
    },
}

#[derive(Subcommand)]
pub enum SessionCommand {
    /// Create a new session.
    Create {
        /// Session title (defaults to "New Chat").
        #[arg(long)]
        title: Option<String>,
    },

    /// List active sessions, most recently updated first.
    #[command(alias = "ls")]
    List,

    /// Show one session.
    Show {
        /// Session ID.
        session_id: Uuid,
    },

    /// Rename a session.
    Rename {
        /// Session ID.
        session_id: Uuid,

        /// New title.
        title: String,
    },

    /// Deactivate a session. Its log is kept but it no longer accepts turns.
    #[command(alias = "rm")]
    Delete {
        /// Session ID.
        session_id: Uuid,

        /// Skip confirmation prompt.
        #[arg(long)]
        force: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parses_send_with_global_flags() {
        let id = Uuid::now_v7();
        let cli = Cli::try_parse_from(["parley", "send", &id.to_string(), "hello", "--json"]).unwrap();
        assert!(cli.json);
        match cli.command {
            Commands::Send { session_id, text } => {
                assert_eq!(session_id, id);
                assert_eq!(text, "hello");
            }
            _ => panic!("expected send"),
        }
    }

    #[test]
    fn test_rejects_malformed_session_id() {
        assert!(Cli::try_parse_from(["parley", "messages", "not-a-uuid"]).is_err());
    }

    #[test]
    fn test_session_delete_alias() {
        let id = Uuid::now_v7();
        let cli = Cli::try_parse_from(["parley", "session", "rm", &id.to_string(), "--force"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Session {
                action: SessionCommand::Delete { force: true, .. }
            }
        ));
    }
}
