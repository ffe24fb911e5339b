//! Welcome banner display for chat sessions.

use console::style;

use parley_types::chat::ChatSession;

/// Print the banner at the start of a chat loop.
pub fn print_welcome_banner(session: &ChatSession, generator: &str, resumed: bool) {
    let id = session.id.to_string();

    println!();
    println!("  {} {}", style("*").cyan(), style(&session.title).cyan().bold());
    if resumed {
        println!(
            "  {}",
            style(format!("Resuming, {} messages so far", session.message_count)).dim()
        );
    }
    println!();
    println!("  {}  {}", style("Generator:").bold(), style(generator).dim());
    println!("  {}    {}", style("Session:").bold(), style(&id[..8.min(id.len())]).dim());
    println!();
    println!("  {}", style("Type /help for commands, Ctrl+D to exit").dim());
    println!("  {}", style("---").dim());
    println!();
}
