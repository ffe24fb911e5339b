//! Response generator port.
//!
//! - `ResponseGenerator`: RPITIT trait mapping an ordered history to one reply
//! - `BoxResponseGenerator`: object-safe wrapper for runtime selection
//!
//! The orchestrator never assumes which implementation it talks to: a
//! network-backed model and a deterministic local fallback are
//! interchangeable.

pub mod box_generator;

use parley_types::chat::ChatMessage;
use parley_types::llm::{GeneratedReply, GenerationError};

/// Trait for response generation backends.
///
/// Implementations live in parley-infra (e.g., `OpenAiGenerator`,
/// `LocalGenerator`). Timeouts and cancellation are applied by the caller;
/// implementations only need to be cancel-safe (dropping the future aborts
/// the call).
pub trait ResponseGenerator: Send + Sync {
    /// Human-readable generator name (e.g., "openai", "local").
    fn name(&self) -> &str;

    /// Produce the next assistant reply for an ordered conversation history.
    fn generate(
        &self,
        history: &[ChatMessage],
    ) -> impl std::future::Future<Output = Result<GeneratedReply, GenerationError>> + Send;
}
