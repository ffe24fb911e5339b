//! Slash command parsing for the chat loop.
//!
//! Commands start with `/` and provide in-chat controls for the session.

use console::style;

/// Available slash commands in the chat loop.
#[derive(Debug, PartialEq)]
pub enum ChatCommand {
    /// Show available commands.
    Help,
    /// Clear the terminal screen.
    Clear,
    /// Leave the chat loop (the session stays active).
    Exit,
    /// Show the cached conversation window.
    History,
    /// Rename the current session.
    Rename(String),
    /// Add a system instruction to the conversation.
    System(String),
    /// Unknown command, or a known one missing its argument.
    Unknown(String),
}

/// Parse user input as a slash command.
///
/// Returns `None` if the input doesn't start with `/`.
pub fn parse(input: &str) -> Option<ChatCommand> {
    let trimmed = input.trim();
    if !trimmed.starts_with('/') {
        return None;
    }

    let (cmd, arg) = match trimmed.split_once(' ') {
        Some((cmd, arg)) => (cmd.to_lowercase(), arg.trim().to_string()),
        None => (trimmed.to_lowercase(), String::new()),
    };

    let with_arg = |build: fn(String) -> ChatCommand, usage: &str| {
        if arg.is_empty() {
            ChatCommand::Unknown(usage.to_string())
        } else {
            build(arg.clone())
        }
    };

    Some(match cmd.as_str() {
        "/help" | "/h" | "/?" => ChatCommand::Help,
        "/clear" | "/cls" => ChatCommand::Clear,
        "/exit" | "/quit" | "/q" => ChatCommand::Exit,
        "/history" => ChatCommand::History,
        "/rename" => with_arg(ChatCommand::Rename, "/rename requires a title"),
        "/system" | "/sys" => with_arg(ChatCommand::System, "/system requires an instruction"),
        other => ChatCommand::Unknown(other.to_string()),
    })
}

/// Print the help text listing all available commands.
pub fn print_help() {
    let rows = [
        ("/help", "Show this help message"),
        ("/clear", "Clear the screen"),
        ("/exit", "Leave the chat (session is kept)"),
        ("/history", "Show the recent conversation window"),
        ("/rename <title>", "Rename this session"),
        ("/system <text>", "Add a system instruction"),
    ];

    println!();
    println!("  {}", style("Available commands:").bold());
    println!();
    for (cmd, help) in rows {
        println!("  {}{}", style(format!("{cmd:<18}")).cyan(), help);
    }
    println!();
    println!(
        "  {}",
        style("Ctrl+C cancels a reply in progress, Ctrl+D exits").dim()
    );
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_help() {
        assert_eq!(parse("/help"), Some(ChatCommand::Help));
        assert_eq!(parse("/h"), Some(ChatCommand::Help));
        assert_eq!(parse("/?"), Some(ChatCommand::Help));
    }

    #[test]
    fn test_parse_exit() {
        assert_eq!(parse("/exit"), Some(ChatCommand::Exit));
        assert_eq!(parse("/QUIT"), Some(ChatCommand::Exit));
    }

    #[test]
    fn test_parse_rename_keeps_argument_case() {
        assert_eq!(
            parse("/rename  Trip Planning "),
            Some(ChatCommand::Rename("Trip Planning".to_string()))
        );
    }

    #[test]
    fn test_parse_system_requires_argument() {
        assert_eq!(
            parse("/system"),
            Some(ChatCommand::Unknown("/system requires an instruction".to_string()))
        );
        assert_eq!(
            parse("/sys be brief"),
            Some(ChatCommand::System("be brief".to_string()))
        );
    }

    #[test]
    fn test_parse_not_command() {
        assert_eq!(parse("hello world"), None);
    }

    #[test]
    fn test_parse_unknown() {
        assert_eq!(parse("/foo"), Some(ChatCommand::Unknown("/foo".to_string())));
    }
}
