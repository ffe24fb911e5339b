//! Response generator implementations.
//!
//! - [`openai::OpenAiGenerator`]: chat completions over HTTP
//! - [`local::LocalGenerator`]: deterministic offline fallback
//!
//! [`build_generator`] picks one from configuration.

pub mod local;
pub mod openai;

use parley_core::generator::box_generator::BoxResponseGenerator;
use parley_types::config::GeneratorConfig;
use secrecy::SecretString;
use tracing::{info, warn};

use self::local::LocalGenerator;
use self::openai::OpenAiGenerator;

/// Build the configured generator.
///
/// A non-empty API key selects [`OpenAiGenerator`]; otherwise replies come
/// from [`LocalGenerator`].
pub fn build_generator(config: &GeneratorConfig) -> BoxResponseGenerator {
    match config.api_key.as_deref().map(str::trim) {
        Some(key) if !key.is_empty() => {
            info!(model = %config.model, base_url = %config.base_url, "Using OpenAI-compatible generator");
            let secret = SecretString::from(key.to_string());
            BoxResponseGenerator::new(OpenAiGenerator::new(secret, config))
        }
        _ => {
            warn!("No API key configured, using local canned-reply generator");
            BoxResponseGenerator::new(LocalGenerator::new())
        }
    }
}
