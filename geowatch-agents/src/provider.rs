//! Search and answer providers
//!
//! Supports the Valyu search/answer API and OpenAI-compatible chat APIs.

use async_openai::{
    config::OpenAIConfig,
    types::{
        ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
        ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs, ResponseFormat,
    },
    Client,
};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

use geowatch_core::ExternalPayload;

use crate::{AnswerProvider, AnswerRequest, SearchProvider, SearchResult, SharedAnswer, SharedSearch};

/// Provider errors
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("API error: {0}")]
    Api(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Empty response")]
    EmptyResponse,

    #[error("Unsupported: {0}")]
    Unsupported(String),

    #[error("Network error: {0}")]
    Network(String),
}

impl From<reqwest::Error> for ProviderError {
    fn from(e: reqwest::Error) -> Self {
        ProviderError::Network(e.to_string())
    }
}

/// Valyu API configuration
#[derive(Debug, Clone)]
pub struct ValyuConfig {
    pub api_key: String,
    pub base_url: String,
    /// Per-request HTTP timeout
    pub request_timeout: Duration,
}

impl ValyuConfig {
    pub fn new(api_key: &str) -> Self {
        Self {
            api_key: api_key.to_string(),
            base_url: "https://api.valyu.ai".to_string(),
            request_timeout: Duration::from_secs(90),
        }
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }
}

/// Valyu news search and answer provider
pub struct ValyuProvider {
    client: reqwest::Client,
    config: ValyuConfig,
}

impl ValyuProvider {
    pub fn new(config: ValyuConfig) -> Result<Self, ProviderError> {
        if config.api_key.trim().is_empty() {
            return Err(ProviderError::Config("VALYU_API_KEY is not set".to_string()));
        }

        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| ProviderError::Config(e.to_string()))?;

        Ok(Self { client, config })
    }

    async fn post(&self, path: &str, body: &Value) -> Result<Value, ProviderError> {
        let url = format!("{}{}", self.config.base_url, path);
        debug!("POST {}", url);

        let response = self
            .client
            .post(&url)
            .header("x-api-key", &self.config.api_key)
            .header("content-type", "application/json")
            .json(body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(ProviderError::Api(format!("Valyu API error {}: {}", status, text)));
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| ProviderError::Api(e.to_string()))
    }
}

#[async_trait]
impl SearchProvider for ValyuProvider {
    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<SearchResult>, ProviderError> {
        let body = json!({
            "query": query,
            "search_type": "news",
            "max_num_results": max_results,
        });

        let json = self.post("/v1/search", &body).await?;

        let results = match json["results"].as_array() {
            Some(results) => results.iter().map(SearchResult::from_value).collect(),
            None => {
                debug!("No results field for query {:?}", query);
                Vec::new()
            }
        };

        Ok(results)
    }

    fn name(&self) -> &str {
        "valyu"
    }
}

#[async_trait]
impl AnswerProvider for ValyuProvider {
    async fn answer(&self, request: &AnswerRequest) -> Result<ExternalPayload, ProviderError> {
        let mut body = json!({
            "query": request.query,
            "excluded_sources": request.excluded_sources,
        });
        if let Some(schema) = &request.schema {
            body["structured_output"] = schema.clone();
        }

        let json = self.post("/v1/answer", &body).await?;
        payload_from_contents(&json["contents"])
    }

    fn name(&self) -> &str {
        "valyu"
    }
}

/// Map an answer's `contents` field to a payload
fn payload_from_contents(contents: &Value) -> Result<ExternalPayload, ProviderError> {
    match contents {
        Value::Null => Err(ProviderError::EmptyResponse),
        Value::String(text) if text.trim().is_empty() => Err(ProviderError::EmptyResponse),
        Value::String(text) => Ok(ExternalPayload::Text(text.clone())),
        other => Ok(ExternalPayload::Structured(other.clone())),
    }
}

const ANSWER_SYSTEM_PROMPT: &str = "You are a geopolitical risk analyst. Answer concisely and \
name the countries you discuss explicitly.";

const STRUCTURED_INSTRUCTION: &str = "Respond with a single JSON object and nothing else. \
It must conform to this JSON schema:";

/// OpenAI-compatible answer backend configuration
#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    pub api_key: String,
    /// Base URL (for OpenRouter, local servers, etc.)
    pub base_url: Option<String>,
    pub model: String,
    /// Temperature (0.0 - 2.0)
    pub temperature: f32,
    pub max_tokens: u16,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: None,
            model: "gpt-4o-mini".to_string(),
            temperature: 0.0,
            max_tokens: 4096,
        }
    }
}

impl OpenAiConfig {
    pub fn new(api_key: &str, model: &str) -> Self {
        Self {
            api_key: api_key.to_string(),
            model: model.to_string(),
            ..Default::default()
        }
    }
}

/// Answer provider backed by an OpenAI-compatible chat API
pub struct OpenAiProvider {
    client: Client<OpenAIConfig>,
    config: OpenAiConfig,
}

impl OpenAiProvider {
    pub fn new(config: OpenAiConfig) -> Result<Self, ProviderError> {
        if config.api_key.trim().is_empty() && config.base_url.is_none() {
            return Err(ProviderError::Config("OPENAI_API_KEY is not set".to_string()));
        }

        let mut openai_config = OpenAIConfig::new().with_api_key(&config.api_key);

        if let Some(base_url) = &config.base_url {
            openai_config = openai_config.with_api_base(base_url);
        }

        let client = Client::with_config(openai_config);

        Ok(Self { client, config })
    }
}

#[async_trait]
impl AnswerProvider for OpenAiProvider {
    async fn answer(&self, request: &AnswerRequest) -> Result<ExternalPayload, ProviderError> {
        if !request.excluded_sources.is_empty() {
            debug!("Chat backend ignores excluded sources {:?}", request.excluded_sources);
        }

        let system = match &request.schema {
            Some(schema) => format!("{}\n\n{} {}", ANSWER_SYSTEM_PROMPT, STRUCTURED_INSTRUCTION, schema),
            None => ANSWER_SYSTEM_PROMPT.to_string(),
        };

        let messages = vec![
            ChatCompletionRequestMessage::System(
                ChatCompletionRequestSystemMessageArgs::default()
                    .content(system)
                    .build()
                    .map_err(|e| ProviderError::Api(e.to_string()))?,
            ),
            ChatCompletionRequestMessage::User(
                ChatCompletionRequestUserMessageArgs::default()
                    .content(request.query.as_str())
                    .build()
                    .map_err(|e| ProviderError::Api(e.to_string()))?,
            ),
        ];

        let mut args = CreateChatCompletionRequestArgs::default();
        args.model(&self.config.model)
            .messages(messages)
            .temperature(self.config.temperature)
            .max_tokens(self.config.max_tokens);
        if request.schema.is_some() {
            args.response_format(ResponseFormat::JsonObject);
        }
        let chat_request = args.build().map_err(|e| ProviderError::Api(e.to_string()))?;

        let response = self.client.chat().create(chat_request).await.map_err(|e| {
            warn!("Chat completion failed: {}", e);
            ProviderError::Api(e.to_string())
        })?;

        response
            .choices
            .first()
            .and_then(|c| c.message.content.clone())
            .filter(|text| !text.trim().is_empty())
            .map(ExternalPayload::Text)
            .ok_or(ProviderError::EmptyResponse)
    }

    fn name(&self) -> &str {
        "openai"
    }
}

/// Create a shared Valyu search provider
pub fn create_search_provider(config: ValyuConfig) -> Result<SharedSearch, ProviderError> {
    Ok(Arc::new(ValyuProvider::new(config)?))
}

/// Create a shared Valyu answer provider
pub fn create_valyu_answer(config: ValyuConfig) -> Result<SharedAnswer, ProviderError> {
    Ok(Arc::new(ValyuProvider::new(config)?))
}

/// Create a shared OpenAI-compatible answer provider
pub fn create_openai_answer(config: OpenAiConfig) -> Result<SharedAnswer, ProviderError> {
    Ok(Arc::new(OpenAiProvider::new(config)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contents_string_is_text() {
        let payload = payload_from_contents(&json!("Poland and Germany are exposed.")).unwrap();
        assert_eq!(payload, ExternalPayload::Text("Poland and Germany are exposed.".to_string()));
    }

    #[test]
    fn test_contents_object_is_structured() {
        let contents = json!({"effects": []});
        let payload = payload_from_contents(&contents).unwrap();
        assert_eq!(payload, ExternalPayload::Structured(contents));
    }

    #[test]
    fn test_missing_contents_is_empty_response() {
        assert!(matches!(payload_from_contents(&Value::Null), Err(ProviderError::EmptyResponse)));
        assert!(matches!(payload_from_contents(&json!("  ")), Err(ProviderError::EmptyResponse)));
    }

    #[test]
    fn test_valyu_requires_api_key() {
        let err = ValyuProvider::new(ValyuConfig::new("")).err().unwrap();
        assert!(matches!(err, ProviderError::Config(_)));
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let config = ValyuConfig::new("key").with_base_url("http://localhost:8080/");
        assert_eq!(config.base_url, "http://localhost:8080");
    }

    #[test]
    fn test_openai_requires_key_without_base_url() {
        assert!(OpenAiProvider::new(OpenAiConfig::default()).is_err());
        let local = OpenAiConfig {
            base_url: Some("http://localhost:11434/v1".to_string()),
            ..Default::default()
        };
        assert!(OpenAiProvider::new(local).is_ok());
    }
}
