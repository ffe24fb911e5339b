//! BoxResponseGenerator -- object-safe dynamic dispatch wrapper for ResponseGenerator.
//!
//! Same blanket-impl pattern used for every RPITIT port:
//! 1. Define an object-safe `ResponseGeneratorDyn` trait with boxed futures
//! 2. Blanket-impl `ResponseGeneratorDyn` for all `T: ResponseGenerator`
//! 3. `BoxResponseGenerator` wraps `Box<dyn ResponseGeneratorDyn>` and delegates

use std::future::Future;
use std::pin::Pin;

use parley_types::chat::ChatMessage;
use parley_types::llm::{GeneratedReply, GenerationError};

use super::ResponseGenerator;

/// Object-safe version of [`ResponseGenerator`] with boxed futures.
pub trait ResponseGeneratorDyn: Send + Sync {
    fn name(&self) -> &str;

    fn generate_boxed<'a>(
        &'a self,
        history: &'a [ChatMessage],
    ) -> Pin<Box<dyn Future<Output = Result<GeneratedReply, GenerationError>> + Send + 'a>>;
}

impl<T: ResponseGenerator> ResponseGeneratorDyn for T {
    fn name(&self) -> &str {
        ResponseGenerator::name(self)
    }

    fn generate_boxed<'a>(
        &'a self,
        history: &'a [ChatMessage],
    ) -> Pin<Box<dyn Future<Output = Result<GeneratedReply, GenerationError>> + Send + 'a>> {
        Box::pin(self.generate(history))
    }
}

/// Type-erased generator for runtime selection (network model vs local fallback).
pub struct BoxResponseGenerator {
    inner: Box<dyn ResponseGeneratorDyn + Send + Sync>,
}

impl BoxResponseGenerator {
    /// Wrap a concrete `ResponseGenerator` in a type-erased box.
    pub fn new<T: ResponseGenerator + 'static>(generator: T) -> Self {
        Self {
            inner: Box::new(generator),
        }
    }
}

impl ResponseGenerator for BoxResponseGenerator {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn generate(&self, history: &[ChatMessage]) -> Result<GeneratedReply, GenerationError> {
        self.inner.generate_boxed(history).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parley_types::chat::MessageRole;
    use uuid::Uuid;

    struct Shout;

    impl ResponseGenerator for Shout {
        fn name(&self) -> &str {
            "shout"
        }

        async fn generate(&self, history: &[ChatMessage]) -> Result<GeneratedReply, GenerationError> {
            let last = history.last().ok_or(GenerationError::EmptyHistory)?;
            Ok(GeneratedReply::text(last.content.to_uppercase()))
        }
    }

    #[tokio::test]
    async fn test_box_generator_delegates() {
        let boxed = BoxResponseGenerator::new(Shout);
        assert_eq!(ResponseGenerator::name(&boxed), "shout");

        let history = vec![ChatMessage::new(Uuid::now_v7(), MessageRole::User, "hello")];
        let reply = boxed.generate(&history).await.unwrap();
        assert_eq!(reply.content, "HELLO");

        let err = boxed.generate(&[]).await.unwrap_err();
        assert_eq!(err, GenerationError::EmptyHistory);
    }
}
