use crate::config::RunConfig;
use crate::error::VignetteError;
use crate::prompt::SYSTEM_PROMPT;
use anyhow::{Context, Result};
use async_openai::types::{
    ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
    CreateChatCompletionRequest, CreateChatCompletionRequestArgs, CreateChatCompletionResponse,
};
use async_openai::{Client, config::OpenAIConfig};
use tracing::debug;

/// A remote model that answers one formatted vignette prompt at a time
#[allow(async_fn_in_trait)]
pub trait ReasoningClient {
    /// Send the prompt and return the reply text unmodified
    async fn complete(&mut self, prompt: &str) -> Result<String>;
}

/// Client for any OpenAI-compatible chat-completions endpoint
pub struct OpenAiReasoningClient {
    client: Client<OpenAIConfig>,
    model: String,
    temperature: f64,
    max_tokens: u32,
    system_prompt: String,
}

impl OpenAiReasoningClient {
    /// Build a client, reading the API key from the configured environment variable
    pub fn from_config(config: &RunConfig) -> Result<Self> {
        let api_key = config.api_key()?;
        Self::new(config, api_key)
    }

    pub fn new(config: &RunConfig, api_key: String) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()
            .context("Failed to build HTTP client")?;

        let openai_config = OpenAIConfig::new()
            .with_api_key(api_key)
            .with_api_base(&config.api_endpoint);

        Ok(Self {
            client: Client::with_config(openai_config).with_http_client(http_client),
            model: config.model.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            system_prompt: config
                .system_prompt
                .clone()
                .unwrap_or_else(|| SYSTEM_PROMPT.to_string()),
        })
    }

    /// Build the chat completion request for one prompt
    fn build_request(&self, prompt: &str) -> Result<CreateChatCompletionRequest> {
        let system_message = ChatCompletionRequestSystemMessageArgs::default()
            .content(self.system_prompt.clone())
            .build()
            .context("Failed to build system message")?
            .into();

        let user_message = ChatCompletionRequestUserMessageArgs::default()
            .content(prompt.to_string())
            .build()
            .context("Failed to build user message")?
            .into();

        CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages([system_message, user_message])
            .temperature(self.temperature as f32)
            .max_tokens(self.max_tokens)
            .build()
            .context("Failed to build chat completion request")
    }
}

impl ReasoningClient for OpenAiReasoningClient {
    async fn complete(&mut self, prompt: &str) -> Result<String> {
        let request = self.build_request(prompt)?;

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .context("Failed to generate response")?;

        if let Some(usage) = &response.usage {
            debug!(
                prompt_tokens = usage.prompt_tokens,
                completion_tokens = usage.completion_tokens,
                "completion received"
            );
        }

        extract_content(response)
    }
}

/// Take the text of the first choice; a reply without text is an error
fn extract_content(response: CreateChatCompletionResponse) -> Result<String> {
    response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .ok_or_else(|| VignetteError::EmptyResponse.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn create_test_config(api_endpoint: &str) -> RunConfig {
        RunConfig {
            input_path: PathBuf::from("in.json"),
            output_path: PathBuf::from("out.json"),
            api_endpoint: api_endpoint.to_string(),
            env_var_api_key: "VIGNETTE_EVAL_TEST_KEY".to_string(),
            model: "gpt-4o".to_string(),
            temperature: 1.0,
            max_tokens: 256,
            inter_call_delay_secs: 0.5,
            request_timeout_secs: 5,
            system_prompt: None,
        }
    }

    fn completion_body(content: &str) -> String {
        serde_json::json!({
            "id": "chatcmpl-1",
            "object": "chat.completion",
            "created": 1_700_000_000,
            "model": "gpt-4o",
            "choices": [{
                "index": 0,
                "message": {"role": "assistant", "content": content},
                "finish_reason": "stop"
            }],
            "usage": {"prompt_tokens": 12, "completion_tokens": 20, "total_tokens": 32}
        })
        .to_string()
    }

    #[test]
    fn test_build_request_uses_system_prompt() {
        let config = create_test_config("http://localhost:1");
        let client = OpenAiReasoningClient::new(&config, "key".to_string()).unwrap();

        let request = client.build_request("\"Q?\nOptions:\nA. x\n\"").unwrap();
        let body = serde_json::to_value(&request).unwrap();
        assert_eq!(body["model"], "gpt-4o");
        assert_eq!(body["max_tokens"], 256);
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][0]["content"], SYSTEM_PROMPT);
        assert_eq!(body["messages"][1]["role"], "user");
        assert_eq!(body["messages"][1]["content"], "\"Q?\nOptions:\nA. x\n\"");
    }

    #[test]
    fn test_build_request_system_prompt_override() {
        let mut config = create_test_config("http://localhost:1");
        config.system_prompt = Some("Answer briefly.".to_string());
        let client = OpenAiReasoningClient::new(&config, "key".to_string()).unwrap();

        let body = serde_json::to_value(client.build_request("Q").unwrap()).unwrap();
        assert_eq!(body["messages"][0]["content"], "Answer briefly.");
    }

    #[tokio::test]
    async fn test_complete_returns_raw_text() {
        let mut server = mockito::Server::new_async().await;
        let reply = "Reasoning: Classic presentation.\nAnswer: A\nConfidence: 85%";
        let mock = server
            .mock("POST", "/chat/completions")
            .match_header("authorization", "Bearer test-key")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(completion_body(reply))
            .create_async()
            .await;

        let config = create_test_config(&server.url());
        let mut client = OpenAiReasoningClient::new(&config, "test-key".to_string()).unwrap();

        let text = client.complete("\"Q?\nOptions:\nA. x\n\"").await.unwrap();
        assert_eq!(text, reply);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_complete_propagates_api_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/chat/completions")
            .with_status(400)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"error": {"message": "model not found", "type": "invalid_request_error", "param": null, "code": null}}"#,
            )
            .create_async()
            .await;

        let config = create_test_config(&server.url());
        let mut client = OpenAiReasoningClient::new(&config, "test-key".to_string()).unwrap();

        let err = client.complete("Q").await.unwrap_err();
        assert!(err.to_string().contains("Failed to generate response"));
    }

    #[tokio::test]
    async fn test_complete_empty_choices() {
        let mut server = mockito::Server::new_async().await;
        let body = serde_json::json!({
            "id": "chatcmpl-2",
            "object": "chat.completion",
            "created": 1_700_000_000,
            "model": "gpt-4o",
            "choices": []
        })
        .to_string();
        server
            .mock("POST", "/chat/completions")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(body)
            .create_async()
            .await;

        let config = create_test_config(&server.url());
        let mut client = OpenAiReasoningClient::new(&config, "test-key".to_string()).unwrap();

        let err = client.complete("Q").await.unwrap_err();
        assert!(err.downcast_ref::<VignetteError>().is_some());
    }
}
