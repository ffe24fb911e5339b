//! Session management CLI commands: create, list, show, rename, delete.
//!
//! Provides session browsing with rich tables and deletion with
//! confirmation prompt.

use anyhow::{Context, Result};
use comfy_table::{Cell, Color, ContentArrangement, Table, presets};
use console::style;
use dialoguer::Confirm;
use uuid::Uuid;

use parley_types::chat::ChatSession;

use crate::state::AppState;

/// Create a session and print its id.
///
/// # Examples
///
/// ```bash
/// parley session create --title "Trip planning"
/// ```
pub async fn create_session(
    state: &AppState,
    owner_id: Uuid,
    title: Option<String>,
    json: bool,
) -> Result<()> {
    let session = state
        .chat_service
        .create_session(owner_id, title.as_deref().unwrap_or_default())
        .await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&session)?);
        return Ok(());
    }

    println!();
    println!(
        "  {} Created session '{}'",
        style("+").green().bold(),
        style(&session.title).cyan()
    );
    println!("  {}  {}", style("ID:").bold(), session.id);
    println!(
        "  {}",
        style(format!("Start chatting with: parley chat {}", session.id)).dim()
    );
    println!();

    Ok(())
}

/// List the owner's active sessions.
///
/// # Examples
///
/// ```bash
/// parley session list
/// parley session list --json
/// ```
pub async fn list_sessions(state: &AppState, owner_id: Uuid, json: bool) -> Result<()> {
    let sessions = state.chat_service.list_sessions(&owner_id).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&sessions)?);
        return Ok(());
    }

    if sessions.is_empty() {
        println!();
        println!(
            "  {} No sessions yet. Start one with: {}",
            style("i").blue().bold(),
            style("parley chat").yellow()
        );
        println!();
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);

    table.set_header(vec![
        Cell::new("ID").fg(Color::White),
        Cell::new("Title").fg(Color::White),
        Cell::new("Messages").fg(Color::White),
        Cell::new("Updated").fg(Color::White),
    ]);

    for session in &sessions {
        table.add_row(vec![
            Cell::new(session.id.to_string()).fg(Color::DarkGrey),
            Cell::new(truncate(&session.title, 40)).fg(Color::Cyan),
            Cell::new(session.message_count.to_string()).fg(Color::White),
            Cell::new(session.updated_at.format("%Y-%m-%d %H:%M").to_string()).fg(Color::White),
        ]);
    }

    println!();
    println!("{table}");
    println!();
    println!(
        "  {} session{}",
        style(sessions.len()).bold(),
        if sessions.len() == 1 { "" } else { "s" }
    );
    println!();

    Ok(())
}

/// Show one session, including whether its last turn is still pending.
pub async fn show_session(state: &AppState, owner_id: Uuid, session_id: Uuid, json: bool) -> Result<()> {
    let session = lookup(state, owner_id, session_id).await?;
    let pending = state.chat_service.pending_turn(&session_id).await?;

    if json {
        let out = serde_json::json!({
            "session": session,
            "pending_message": pending,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    print_session(&session);
    if let Some(msg) = pending {
        println!(
            "  {} Last message has no reply yet: {}",
            style("!").yellow().bold(),
            style(truncate(&msg.content, 60)).dim()
        );
        println!();
    }

    Ok(())
}

/// Rename a session. A blank title resets it to the default.
pub async fn rename_session(
    state: &AppState,
    owner_id: Uuid,
    session_id: Uuid,
    title: &str,
    json: bool,
) -> Result<()> {
    let session = state
        .chat_service
        .rename_session(&session_id, &owner_id, title)
        .await
        .with_context(|| format!("Session '{session_id}' not found"))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&session)?);
    } else {
        println!(
            "  {} Session renamed to '{}'.",
            style("~").cyan().bold(),
            style(&session.title).cyan()
        );
    }

    Ok(())
}

/// Deactivate a session with confirmation.
///
/// # Examples
///
/// ```bash
/// parley session delete <session-id>
/// parley session delete <session-id> --force
/// ```
pub async fn delete_session(
    state: &AppState,
    owner_id: Uuid,
    session_id: Uuid,
    force: bool,
    json: bool,
) -> Result<()> {
    let session = lookup(state, owner_id, session_id).await?;

    if !force && !json {
        let confirmed = Confirm::new()
            .with_prompt(format!(
                "Delete session '{}' ({} messages)?",
                style(&session.title).red().bold(),
                session.message_count
            ))
            .default(false)
            .interact()?;

        if !confirmed {
            println!("  Cancelled.");
            return Ok(());
        }
    }

    state
        .chat_service
        .deactivate_session(&session_id, &owner_id)
        .await?;

    if json {
        println!(
            "{}",
            serde_json::json!({"deleted": true, "session_id": session_id.to_string()})
        );
    } else {
        println!(
            "  {} Session '{}' deleted.",
            style("x").red().bold(),
            session.title
        );
    }

    Ok(())
}

/// Fetch an active session owned by `owner_id`.
pub(crate) async fn lookup(state: &AppState, owner_id: Uuid, session_id: Uuid) -> Result<ChatSession> {
    state
        .chat_service
        .get_session(&session_id, &owner_id)
        .await
        .with_context(|| format!("Session '{session_id}' not found"))
}

fn print_session(session: &ChatSession) {
    println!();
    println!("  {}", style(&session.title).cyan().bold());
    println!("  {}        {}", style("ID:").bold(), session.id);
    println!("  {}  {}", style("Messages:").bold(), session.message_count);
    println!(
        "  {}   {}",
        style("Created:").bold(),
        session.created_at.format("%Y-%m-%d %H:%M UTC")
    );
    println!(
        "  {}   {}",
        style("Updated:").bold(),
        session.updated_at.format("%Y-%m-%d %H:%M UTC")
    );
    println!();
}

/// Truncate on a char boundary, appending "..." when shortened.
pub(crate) fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let kept: String = text.chars().take(max_chars.saturating_sub(3)).collect();
    format!("{kept}...")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_short_text_unchanged() {
        assert_eq!(truncate("hello", 10), "hello");
    }

    #[test]
    fn test_truncate_respects_char_boundaries() {
        assert_eq!(truncate("héllo wörld", 8), "héllo...");
    }
}
