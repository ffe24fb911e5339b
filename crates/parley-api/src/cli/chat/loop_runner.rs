//! Main chat loop.
//!
//! Resolves or creates the session, prints the banner, then runs turns
//! until Ctrl+D or `/exit`. A Ctrl+C while a reply is in progress cancels
//! that turn only; the session stays active for the next message.

use std::pin::pin;

use console::style;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use uuid::Uuid;

use parley_types::chat::ChatMessage;
use parley_types::error::ChatError;

use crate::cli::message::{print_message, print_turn_error, thinking_spinner};
use crate::cli::session::lookup;
use crate::state::AppState;

use super::banner::print_welcome_banner;
use super::commands::{self, ChatCommand};
use super::input::{ChatInput, InputEvent};

/// Run the interactive chat loop, creating a session when none is given.
pub async fn run_chat_loop(
    state: &AppState,
    owner_id: Uuid,
    session_id: Option<Uuid>,
    title: Option<String>,
) -> anyhow::Result<()> {
    let (session, resumed) = match session_id {
        Some(id) => (lookup(state, owner_id, id).await?, true),
        None => {
            let session = state
                .chat_service
                .create_session(owner_id, title.as_deref().unwrap_or_default())
                .await?;
            (session, false)
        }
    };
    let session_id = session.id;

    print_welcome_banner(&session, state.chat_service.generator_name(), resumed);

    if resumed {
        if let Some(pending) = state.chat_service.pending_turn(&session_id).await? {
            println!(
                "  {} The last message never got a reply. Send it again to retry:",
                style("!").yellow().bold()
            );
            println!("  {}", style(&pending.content).dim());
            println!();
        }
    }

    let prompt = format!("  {} ", style("You >").green().bold());
    let (mut chat_input, _writer) = ChatInput::new(prompt)
        .map_err(|e| anyhow::anyhow!("Failed to initialize input: {e}"))?;

    loop {
        match chat_input.read_line().await {
            InputEvent::Eof => {
                println!("\n  {}", style("Session saved.").dim());
                break;
            }
            InputEvent::Interrupted => {
                println!("\n  {}", style("Press Ctrl+D to exit, or keep chatting.").dim());
            }
            InputEvent::Message(text) if text.is_empty() => {}
            InputEvent::Message(text) => {
                if let Some(cmd) = commands::parse(&text) {
                    match cmd {
                        ChatCommand::Help => commands::print_help(),
                        ChatCommand::Clear => chat_input.clear(),
                        ChatCommand::Exit => {
                            println!("\n  {}", style("Session saved.").dim());
                            break;
                        }
                        ChatCommand::History => show_history(state, session_id).await,
                        ChatCommand::Rename(title) => {
                            match state.chat_service.rename_session(&session_id, &owner_id, &title).await {
                                Ok(s) => println!("\n  {} Renamed to '{}'\n", style("~").cyan().bold(), s.title),
                                Err(e) => println!("\n  {} Rename failed: {e}\n", style("!").red().bold()),
                            }
                        }
                        ChatCommand::System(instruction) => {
                            match state.chat_service.append_system_message(session_id, &instruction).await {
                                Ok(_) => println!("\n  {} System instruction added.\n", style("*").magenta().bold()),
                                Err(e) => println!("\n  {} Failed to add instruction: {e}\n", style("!").red().bold()),
                            }
                        }
                        ChatCommand::Unknown(name) => {
                            println!(
                                "\n  {} Unknown command: {}. Type /help for available commands.\n",
                                style("?").yellow().bold(),
                                style(name).dim()
                            );
                        }
                    }
                    continue;
                }

                match run_turn(state, &mut chat_input, session_id, &text).await {
                    Ok(reply) => {
                        println!();
                        print_message(&reply);
                    }
                    Err(ChatError::NotFoundOrForbidden) => {
                        println!(
                            "\n  {} This session was deleted elsewhere.",
                            style("x").red().bold()
                        );
                        break;
                    }
                    Err(err) => {
                        print_turn_error(&err);
                        eprintln!("  {}", style("Type a message to retry, /exit to quit.").dim());
                    }
                }
            }
        }
    }

    chat_input.flush();
    Ok(())
}

/// Send one turn while watching the prompt for Ctrl+C.
///
/// Lines typed while waiting are discarded.
async fn run_turn(
    state: &AppState,
    chat_input: &mut ChatInput,
    session_id: Uuid,
    text: &str,
) -> Result<ChatMessage, ChatError> {
    let cancel = CancellationToken::new();
    let spinner = thinking_spinner();

    let mut turn = pin!(state.chat_service.send_message_with_cancel(session_id, text, &cancel));
    let result = loop {
        tokio::select! {
            result = &mut turn => break result,
            event = chat_input.read_line(), if !cancel.is_cancelled() => match event {
                InputEvent::Interrupted | InputEvent::Eof => {
                    debug!(session_id = %session_id, "Cancelling turn from prompt");
                    spinner.set_message("cancelling...");
                    cancel.cancel();
                }
                InputEvent::Message(_) => {}
            },
        }
    };

    spinner.finish_and_clear();
    result
}

async fn show_history(state: &AppState, session_id: Uuid) {
    match state.chat_service.cached_history(&session_id).await {
        Ok(view) => {
            println!();
            for msg in &view.messages {
                print_message(msg);
            }
        }
        Err(e) => println!("\n  {} Failed to load history: {e}\n", style("!").red().bold()),
    }
}
