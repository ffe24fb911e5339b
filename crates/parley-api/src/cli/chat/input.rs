//! Async line input for the chat loop.
//!
//! rustyline_async keeps the terminal in raw mode, so Ctrl+C arrives here
//! as an event rather than as SIGINT.

use rustyline_async::{Readline, ReadlineError, ReadlineEvent, SharedWriter};

/// What the user did at the prompt.
#[derive(Debug, PartialEq)]
pub enum InputEvent {
    /// A submitted line, trimmed.
    Message(String),
    /// Ctrl+D, or the input stream closed.
    Eof,
    /// Ctrl+C.
    Interrupted,
}

impl From<Result<ReadlineEvent, ReadlineError>> for InputEvent {
    fn from(result: Result<ReadlineEvent, ReadlineError>) -> Self {
        match result {
            Ok(ReadlineEvent::Line(line)) => InputEvent::Message(line.trim().to_string()),
            Ok(ReadlineEvent::Interrupted) => InputEvent::Interrupted,
            Ok(ReadlineEvent::Eof) | Err(_) => InputEvent::Eof,
        }
    }
}

pub struct ChatInput {
    rl: Readline,
}

impl ChatInput {
    /// Returns the input handler and a writer that prints above the prompt.
    pub fn new(prompt: String) -> Result<(Self, SharedWriter), ReadlineError> {
        let (rl, writer) = Readline::new(prompt)?;
        Ok((Self { rl }, writer))
    }

    pub async fn read_line(&mut self) -> InputEvent {
        let event = InputEvent::from(self.rl.readline().await);
        if let InputEvent::Message(line) = &event {
            if !line.is_empty() {
                self.rl.add_history_entry(line.clone());
            }
        }
        event
    }

    pub fn clear(&mut self) {
        let _ = self.rl.clear();
    }

    /// Restore the terminal before exiting.
    pub fn flush(&mut self) {
        let _ = self.rl.flush();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_is_trimmed() {
        let event = InputEvent::from(Ok(ReadlineEvent::Line("  hi there \n".to_string())));
        assert_eq!(event, InputEvent::Message("hi there".to_string()));
    }

    #[test]
    fn test_interrupt_and_eof() {
        assert_eq!(InputEvent::from(Ok(ReadlineEvent::Interrupted)), InputEvent::Interrupted);
        assert_eq!(InputEvent::from(Ok(ReadlineEvent::Eof)), InputEvent::Eof);
    }
}
