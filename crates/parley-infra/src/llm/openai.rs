//! OpenAI-compatible response generator.
//!
//! Speaks the chat completions protocol through [`async_openai`], so any
//! endpoint that accepts it (OpenAI itself, a local gateway) works by
//! changing the base URL.

use async_openai::Client;
use async_openai::config::OpenAIConfig;
use async_openai::types::chat::{
    ChatCompletionRequestAssistantMessage, ChatCompletionRequestAssistantMessageContent,
    ChatCompletionRequestMessage, ChatCompletionRequestSystemMessage,
    ChatCompletionRequestSystemMessageContent, ChatCompletionRequestUserMessage,
    ChatCompletionRequestUserMessageContent, CreateChatCompletionRequest,
};
use parley_core::generator::ResponseGenerator;
use parley_types::chat::{ChatMessage, MessageRole};
use parley_types::config::GeneratorConfig;
use parley_types::llm::{GeneratedReply, GenerationError};
use secrecy::{ExposeSecret, SecretString};

/// Generator backed by a chat completions endpoint.
///
/// Does NOT derive Debug: the `async_openai::Client` holds the API key.
pub struct OpenAiGenerator {
    client: Client<OpenAIConfig>,
    model: String,
    temperature: f32,
    max_tokens: u32,
}

impl OpenAiGenerator {
    pub fn new(api_key: SecretString, config: &GeneratorConfig) -> Self {
        let openai_config = OpenAIConfig::new()
            .with_api_key(api_key.expose_secret())
            .with_api_base(&config.base_url);

        Self {
            client: Client::with_config(openai_config),
            model: config.model.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn build_request(&self, history: &[ChatMessage]) -> CreateChatCompletionRequest {
        let messages = history.iter().map(to_request_message).collect();

        CreateChatCompletionRequest {
            model: self.model.clone(),
            messages,
            max_completion_tokens: Some(self.max_tokens),
            temperature: Some(self.temperature),
            ..Default::default()
        }
    }
}

fn to_request_message(msg: &ChatMessage) -> ChatCompletionRequestMessage {
    match msg.role {
        MessageRole::System => ChatCompletionRequestMessage::System(ChatCompletionRequestSystemMessage {
            content: ChatCompletionRequestSystemMessageContent::Text(msg.content.clone()),
            name: None,
        }),
        MessageRole::User => ChatCompletionRequestMessage::User(ChatCompletionRequestUserMessage {
            content: ChatCompletionRequestUserMessageContent::Text(msg.content.clone()),
            name: None,
        }),
        MessageRole::Assistant => {
            #[allow(deprecated)]
            ChatCompletionRequestMessage::Assistant(ChatCompletionRequestAssistantMessage {
                content: Some(ChatCompletionRequestAssistantMessageContent::Text(
                    msg.content.clone(),
                )),
                refusal: None,
                name: None,
                audio: None,
                tool_calls: None,
                function_call: None,
            })
        }
    }
}

impl ResponseGenerator for OpenAiGenerator {
    fn name(&self) -> &str {
        "openai"
    }

    async fn generate(&self, history: &[ChatMessage]) -> Result<GeneratedReply, GenerationError> {
        if history.is_empty() {
            return Err(GenerationError::EmptyHistory);
        }

        let response = self
            .client
            .chat()
            .create(self.build_request(history))
            .await
            .map_err(map_openai_error)?;

        let content = response
            .choices
            .first()
            .and_then(|c| c.message.content.clone())
            .filter(|c| !c.is_empty())
            .ok_or(GenerationError::EmptyResponse)?;

        let metadata = response.usage.map(|u| {
            serde_json::json!({
                "input_tokens": u.prompt_tokens,
                "output_tokens": u.completion_tokens,
            })
        });

        Ok(GeneratedReply {
            content,
            model: Some(response.model),
            metadata,
        })
    }
}

/// Map an `async_openai::error::OpenAIError` to a [`GenerationError`].
fn map_openai_error(err: async_openai::error::OpenAIError) -> GenerationError {
    use async_openai::error::OpenAIError;

    match &err {
        OpenAIError::ApiError(api_err) => {
            let code = api_err.code.as_deref().unwrap_or("");
            let error_type = api_err.r#type.as_deref().unwrap_or("");

            if code == "invalid_api_key"
                || error_type == "authentication_error"
                || api_err.message.contains("Incorrect API key")
            {
                GenerationError::AuthenticationFailed
            } else if code == "rate_limit_exceeded" || error_type == "rate_limit_error" {
                GenerationError::RateLimited
            } else {
                GenerationError::Provider {
                    message: err.to_string(),
                }
            }
        }
        OpenAIError::Reqwest(reqwest_err) => match reqwest_err.status().map(|s| s.as_u16()) {
            Some(401) => GenerationError::AuthenticationFailed,
            Some(429) => GenerationError::RateLimited,
            _ => GenerationError::Provider {
                message: err.to_string(),
            },
        },
        _ => GenerationError::Provider {
            message: err.to_string(),
        },
    }
}
