//! Deterministic offline generator.
//!
//! Used when no API key is configured. Picks one of four canned replies by
//! history length and echoes the last message in two of them, so the same
//! history always yields the same reply.

use parley_core::generator::ResponseGenerator;
use parley_types::chat::ChatMessage;
use parley_types::llm::{GeneratedReply, GenerationError};

/// Canned-reply `ResponseGenerator`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalGenerator;

impl LocalGenerator {
    pub fn new() -> Self {
        Self
    }

    fn reply_for(history: &[ChatMessage]) -> Result<String, GenerationError> {
        let last = history.last().ok_or(GenerationError::EmptyHistory)?;
        let topic = last.content.as_str();

        let reply = match history.len() % 4 {
            0 => format!(
                "I understand your question about {topic}. Let me provide you with a comprehensive answer."
            ),
            1 => "That's an interesting point. Based on my knowledge, I can help you with that topic."
                .to_string(),
            2 => format!("I can assist you with that. Here's what I know about {topic}"),
            _ => "Thank you for your question. Let me break this down for you.".to_string(),
        };
        Ok(reply)
    }
}

impl ResponseGenerator for LocalGenerator {
    fn name(&self) -> &str {
        "local"
    }

    async fn generate(&self, history: &[ChatMessage]) -> Result<GeneratedReply, GenerationError> {
        Ok(GeneratedReply {
            content: Self::reply_for(history)?,
            model: None,
            metadata: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parley_types::chat::MessageRole;
    use uuid::Uuid;

    fn history(contents: &[&str]) -> Vec<ChatMessage> {
        let session_id = Uuid::now_v7();
        contents
            .iter()
            .map(|c| ChatMessage::new(session_id, MessageRole::User, *c))
            .collect()
    }

    #[tokio::test]
    async fn test_empty_history_is_an_error() {
        let err = LocalGenerator::new().generate(&[]).await.unwrap_err();
        assert_eq!(err, GenerationError::EmptyHistory);
        assert_eq!(err.to_string(), "no messages provided");
    }

    #[tokio::test]
    async fn test_replies_rotate_by_history_length() {
        let generator = LocalGenerator::new();

        let one = generator.generate(&history(&["rust"])).await.unwrap();
        assert!(one.content.starts_with("That's an interesting point"));

        let two = generator.generate(&history(&["a", "lifetimes"])).await.unwrap();
        assert_eq!(
            two.content,
            "I can assist you with that. Here's what I know about lifetimes"
        );

        let three = generator.generate(&history(&["a", "b", "c"])).await.unwrap();
        assert!(three.content.starts_with("Thank you for your question"));

        let four = generator
            .generate(&history(&["a", "b", "c", "traits"]))
            .await
            .unwrap();
        assert!(four.content.contains("your question about traits."));
    }

    #[tokio::test]
    async fn test_same_history_same_reply() {
        let generator = LocalGenerator::new();
        let h = history(&["x", "y"]);
        assert_eq!(
            generator.generate(&h).await.unwrap(),
            generator.generate(&h).await.unwrap()
        );
        assert_eq!(generator.name(), "local");
    }
}
