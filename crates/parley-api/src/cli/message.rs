//! Message CLI commands: show a session's messages, send one turn.

use std::time::Duration;

use anyhow::Result;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use parley_core::chat::service::HistorySource;
use parley_types::chat::{ChatMessage, MessageRole};
use parley_types::error::{ChatError, TurnStage};

use crate::cli::session::lookup;
use crate::state::AppState;

/// Print a session's messages (the full log, or the cached window).
///
/// # Examples
///
/// ```bash
/// parley messages <session-id>
/// parley messages <session-id> --cached --json
/// ```
pub async fn list_messages(
    state: &AppState,
    owner_id: Uuid,
    session_id: Uuid,
    cached: bool,
    json: bool,
) -> Result<()> {
    let session = lookup(state, owner_id, session_id).await?;

    let (source, messages) = if cached {
        let view = state.chat_service.cached_history(&session_id).await?;
        (Some(view.source), view.messages)
    } else {
        (None, state.chat_service.list_messages(&session_id).await?)
    };

    if json {
        let out = match source {
            Some(source) => serde_json::json!({"source": source, "messages": messages}),
            None => serde_json::to_value(&messages)?,
        };
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    println!();
    println!("  {}", style(&session.title).cyan().bold());
    if let Some(source) = source {
        let label = match source {
            HistorySource::Cache => "from cache",
            HistorySource::Log => "from log (cache miss)",
        };
        println!("  {}", style(label).dim());
    }
    println!();

    if messages.is_empty() {
        println!("  {}", style("No messages yet.").dim());
        println!();
        return Ok(());
    }

    for msg in &messages {
        print_message(msg);
    }

    Ok(())
}

/// Send one message and print the reply.
///
/// Ctrl+C while waiting cancels the generation; the user message stays in
/// the log as a pending turn.
pub async fn send_message(
    state: &AppState,
    owner_id: Uuid,
    session_id: Uuid,
    text: &str,
    json: bool,
    quiet: bool,
) -> Result<()> {
    lookup(state, owner_id, session_id).await?;

    let cancel = CancellationToken::new();
    let ctrl_c = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                cancel.cancel();
            }
        })
    };

    let spinner = (!json && !quiet).then(thinking_spinner);
    let result = state
        .chat_service
        .send_message_with_cancel(session_id, text, &cancel)
        .await;
    ctrl_c.abort();
    if let Some(spinner) = spinner {
        spinner.finish_and_clear();
    }

    let reply = match result {
        Ok(reply) => reply,
        Err(err) => {
            if !json {
                print_turn_error(&err);
            }
            return Err(err.into());
        }
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&reply)?);
    } else {
        println!();
        print_message(&reply);
    }

    Ok(())
}

pub(crate) fn thinking_spinner() -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.set_message("thinking...");
    spinner.enable_steady_tick(Duration::from_millis(80));
    spinner
}

pub(crate) fn print_message(msg: &ChatMessage) {
    let label = match msg.role {
        MessageRole::User => style("You").green().bold(),
        MessageRole::Assistant => style("Assistant").cyan().bold(),
        MessageRole::System => style("System").magenta().bold(),
    };
    println!(
        "  {} {}",
        label,
        style(msg.created_at.format("%H:%M").to_string()).dim()
    );
    for line in msg.content.lines() {
        println!("  {line}");
    }
    if let Some(ms) = msg
        .metadata
        .as_ref()
        .and_then(|m| m.get("response_ms"))
        .and_then(|v| v.as_u64())
    {
        println!("  {}", style(format!("{ms}ms")).dim());
    }
    println!();
}

/// Explain a failed turn, including whether the user message was kept.
pub(crate) fn print_turn_error(err: &ChatError) {
    eprintln!();
    eprintln!("  {} {err}", style("!").red().bold());
    match err.stage() {
        Some(TurnStage::AppendUser) => {
            eprintln!("  {}", style("Your message was not saved.").dim());
        }
        Some(_) if err.is_pending() => {
            eprintln!(
                "  {}",
                style("Your message was saved but has no reply yet.").dim()
            );
        }
        _ => {}
    }
    eprintln!();
}
