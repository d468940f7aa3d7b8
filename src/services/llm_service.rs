use std::fmt;
use std::sync::Arc;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::errors::LlmError;

pub const DEFAULT_MAX_TOKENS: usize = 400;

/// Configuration for LLM service
#[derive(Clone)]
pub struct LlmConfig {
    pub provider: String,
    pub api_key: Option<String>,
    /// Overrides the provider's public endpoint.
    pub base_url: Option<String>,
    /// Overrides the provider's default model.
    pub model: Option<String>,
    pub max_tokens: usize,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: "cohere".to_string(),
            api_key: None,
            base_url: None,
            model: None,
            max_tokens: DEFAULT_MAX_TOKENS,
        }
    }
}

impl fmt::Debug for LlmConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LlmConfig")
            .field("provider", &self.provider)
            .field("api_key", &self.api_key.as_deref().map(|_| "<redacted>"))
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("max_tokens", &self.max_tokens)
            .finish()
    }
}

impl LlmConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            provider: std::env::var("LLM_PROVIDER")
                .map(|p| p.to_lowercase())
                .unwrap_or(defaults.provider),
            api_key: non_empty_env("LLM_API_KEY"),
            base_url: non_empty_env("LLM_BASE_URL"),
            model: non_empty_env("LLM_MODEL"),
            max_tokens: std::env::var("LLM_MAX_TOKENS")
                .ok()
                .and_then(|s| s.parse::<usize>().ok())
                .unwrap_or(defaults.max_tokens),
        }
    }
}

fn non_empty_env(name: &str) -> Option<String> {
    non_empty(std::env::var(name).ok())
}

/// Blank values (`LLM_MODEL=` in a `.env`) count as unset.
fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Trait for LLM providers
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Generate a completion from a prompt
    async fn generate_completion(&self, prompt: String) -> Result<String, LlmError>;
}

fn map_send_error(e: reqwest::Error) -> LlmError {
    if e.is_timeout() {
        LlmError::Timeout
    } else {
        LlmError::NetworkError(e.without_url().to_string())
    }
}

async fn read_error_body(response: reqwest::Response) -> LlmError {
    let status = response.status();
    let error_text = response.text().await
        .unwrap_or_else(|_| "Unknown error".to_string());
    LlmError::ApiError(format!("HTTP {}: {}", status, error_text))
}

/// Cohere `generate` request/response structures
#[derive(Debug, Serialize)]
struct CohereRequest<'a> {
    model: &'a str,
    prompt: String,
    max_tokens: usize,
}

#[derive(Debug, Deserialize)]
struct CohereResponse {
    generations: Vec<CohereGeneration>,
}

#[derive(Debug, Deserialize)]
struct CohereGeneration {
    text: String,
}

/// Cohere provider implementation
pub struct CohereProvider {
    api_key: String,
    base_url: String,
    model: String,
    max_tokens: usize,
    client: Client,
}

impl CohereProvider {
    pub const DEFAULT_BASE_URL: &'static str = "https://api.cohere.ai";
    pub const DEFAULT_MODEL: &'static str = "command";

    pub fn new(api_key: String, base_url: Option<String>, model: Option<String>, max_tokens: usize) -> Self {
        Self {
            api_key,
            base_url: base_url.unwrap_or_else(|| Self::DEFAULT_BASE_URL.to_string()),
            model: model.unwrap_or_else(|| Self::DEFAULT_MODEL.to_string()),
            max_tokens,
            client: Client::new(),
        }
    }
}

#[async_trait]
impl LlmProvider for CohereProvider {
    async fn generate_completion(&self, prompt: String) -> Result<String, LlmError> {
        info!("Generating completion (provider: cohere, model: {}, max_tokens: {})", self.model, self.max_tokens);

        let request = CohereRequest {
            model: &self.model,
            prompt,
            max_tokens: self.max_tokens,
        };

        let response = self.client
            .post(format!("{}/v1/generate", self.base_url.trim_end_matches('/')))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&request)
            .send()
            .await
            .map_err(map_send_error)?;

        if !response.status().is_success() {
            return Err(read_error_body(response).await);
        }

        let body = response.json::<CohereResponse>()
            .await
            .map_err(|e| LlmError::InvalidResponse(e.without_url().to_string()))?;

        body.generations
            .into_iter()
            .next()
            .map(|g| g.text)
            .ok_or_else(|| LlmError::InvalidResponse("No generations in response".to_string()))
    }
}

/// OpenAI API request/response structures
#[derive(Debug, Serialize)]
struct OpenAiRequest<'a> {
    model: &'a str,
    messages: Vec<OpenAiMessage>,
    max_tokens: usize,
}

#[derive(Debug, Serialize, Clone)]
struct OpenAiMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct OpenAiResponse {
    choices: Vec<OpenAiChoice>,
    usage: Option<OpenAiUsage>,
}

#[derive(Debug, Deserialize)]
struct OpenAiChoice {
    message: OpenAiResponseMessage,
}

#[derive(Debug, Deserialize)]
struct OpenAiResponseMessage {
    content: String,
}

#[derive(Debug, Deserialize)]
struct OpenAiUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
    total_tokens: u32,
}

/// OpenAI provider implementation
pub struct OpenAiProvider {
    api_key: String,
    base_url: String,
    model: String,
    max_tokens: usize,
    client: Client,
}

impl OpenAiProvider {
    pub const DEFAULT_BASE_URL: &'static str = "https://api.openai.com";
    pub const DEFAULT_MODEL: &'static str = "gpt-4o-mini";

    pub fn new(api_key: String, base_url: Option<String>, model: Option<String>, max_tokens: usize) -> Self {
        Self {
            api_key,
            base_url: base_url.unwrap_or_else(|| Self::DEFAULT_BASE_URL.to_string()),
            model: model.unwrap_or_else(|| Self::DEFAULT_MODEL.to_string()),
            max_tokens,
            client: Client::new(),
        }
    }
}

#[async_trait]
impl LlmProvider for OpenAiProvider {
    async fn generate_completion(&self, prompt: String) -> Result<String, LlmError> {
        info!("Generating completion (provider: openai, model: {}, max_tokens: {})", self.model, self.max_tokens);

        // The persona instruction is already part of the prompt.
        let request = OpenAiRequest {
            model: &self.model,
            messages: vec![OpenAiMessage {
                role: "user".to_string(),
                content: prompt,
            }],
            max_tokens: self.max_tokens,
        };

        let response = self.client
            .post(format!("{}/v1/chat/completions", self.base_url.trim_end_matches('/')))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&request)
            .send()
            .await
            .map_err(map_send_error)?;

        if !response.status().is_success() {
            return Err(read_error_body(response).await);
        }

        let response = response.json::<OpenAiResponse>()
            .await
            .map_err(|e| LlmError::InvalidResponse(e.without_url().to_string()))?;

        if let Some(usage) = &response.usage {
            info!("LLM completion generated. Tokens: {} prompt + {} completion = {} total",
                  usage.prompt_tokens, usage.completion_tokens, usage.total_tokens);
        }

        response.choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| LlmError::InvalidResponse("No choices in response".to_string()))
    }
}

/// LLM service with provider abstraction
pub struct LlmService {
    provider: Option<Arc<dyn LlmProvider>>,
}

impl LlmService {
    pub fn new(config: LlmConfig) -> Self {
        let provider = match &config.api_key {
            Some(api_key) => {
                info!("Initializing LLM service with provider: {}", config.provider);
                match config.provider.as_str() {
                    "cohere" => Some(Arc::new(CohereProvider::new(
                        api_key.clone(),
                        config.base_url.clone(),
                        config.model.clone(),
                        config.max_tokens,
                    )) as Arc<dyn LlmProvider>),
                    "openai" => Some(Arc::new(OpenAiProvider::new(
                        api_key.clone(),
                        config.base_url.clone(),
                        config.model.clone(),
                        config.max_tokens,
                    )) as Arc<dyn LlmProvider>),
                    _ => {
                        warn!("Unknown LLM provider: {}. LLM features disabled.", config.provider);
                        None
                    }
                }
            }
            None => {
                warn!("LLM_API_KEY not configured. LLM features disabled.");
                None
            }
        };

        Self { provider }
    }

    pub fn with_provider(provider: Arc<dyn LlmProvider>) -> Self {
        Self {
            provider: Some(provider),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.provider.is_some()
    }

    pub async fn generate_completion(&self, prompt: String) -> Result<String, LlmError> {
        let provider = self.provider.as_ref()
            .ok_or(LlmError::Disabled)?;

        provider.generate_completion(prompt).await
    }
}
