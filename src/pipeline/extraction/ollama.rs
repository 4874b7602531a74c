use std::cell::Cell;

use serde::{Deserialize, Serialize};

use super::types::{LlmClient, ResponseMode};
use super::LlmError;

/// Ollama HTTP client for local LLM inference.
///
/// Built without a request timeout: deadline policy belongs to the service.
#[derive(Debug)]
pub struct OllamaClient {
    base_url: String,
    model: String,
    temperature: f32,
    client: reqwest::blocking::Client,
}

impl OllamaClient {
    /// Create a new OllamaClient pointing at an Ollama instance.
    pub fn new(base_url: &str, model: &str, temperature: f32) -> Result<Self, LlmError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(None::<std::time::Duration>)
            .build()
            .map_err(|e| LlmError::HttpClient(e.to_string()))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            temperature,
            client,
        })
    }

    /// Default Ollama instance at localhost:11434.
    pub fn default_local(model: &str) -> Result<Self, LlmError> {
        Self::new("http://localhost:11434", model, 0.0)
    }
}

/// Request body for Ollama /api/generate
#[derive(Serialize)]
struct OllamaGenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    system: &'a str,
    stream: bool,
    options: OllamaOptions,
}

#[derive(Serialize)]
struct OllamaOptions {
    temperature: f32,
}

/// Response body from Ollama /api/generate
#[derive(Deserialize)]
struct OllamaGenerateResponse {
    response: String,
}

impl LlmClient for OllamaClient {
    fn generate(&self, prompt: &str, system: &str) -> Result<String, LlmError> {
        let url = format!("{}/api/generate", self.base_url);
        let body = OllamaGenerateRequest {
            model: &self.model,
            prompt,
            system,
            stream: false,
            options: OllamaOptions {
                temperature: self.temperature,
            },
        };

        let response = self.client.post(&url).json(&body).send().map_err(|e| {
            if e.is_connect() {
                LlmError::Connection(self.base_url.clone())
            } else {
                LlmError::HttpClient(e.to_string())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(LlmError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: OllamaGenerateResponse = response
            .json()
            .map_err(|e| LlmError::ResponseDecoding(e.to_string()))?;

        Ok(parsed.response)
    }

    fn response_mode(&self) -> ResponseMode {
        ResponseMode::FreeText
    }

    fn describe(&self) -> String {
        format!("ollama:{}", self.model)
    }
}

/// Mock LLM client for testing. Returns a configurable response.
pub struct MockLlmClient {
    response: String,
    mode: ResponseMode,
    calls: Cell<usize>,
}

impl MockLlmClient {
    pub fn new(response: &str) -> Self {
        Self {
            response: response.to_string(),
            mode: ResponseMode::JsonObject,
            calls: Cell::new(0),
        }
    }

    pub fn with_mode(mut self, mode: ResponseMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.get()
    }
}

impl LlmClient for MockLlmClient {
    fn generate(&self, _prompt: &str, _system: &str) -> Result<String, LlmError> {
        self.calls.set(self.calls.get() + 1);
        Ok(self.response.clone())
    }

    fn response_mode(&self) -> ResponseMode {
        self.mode
    }

    fn describe(&self) -> String {
        "mock".to_string()
    }
}

/// LLM client that always fails, like an unreachable backend.
pub struct FailingLlmClient {
    calls: Cell<usize>,
}

impl FailingLlmClient {
    pub fn new() -> Self {
        Self { calls: Cell::new(0) }
    }

    pub fn calls(&self) -> usize {
        self.calls.get()
    }
}

impl Default for FailingLlmClient {
    fn default() -> Self {
        Self::new()
    }
}

impl LlmClient for FailingLlmClient {
    fn generate(&self, _prompt: &str, _system: &str) -> Result<String, LlmError> {
        self.calls.set(self.calls.get() + 1);
        Err(LlmError::Connection("http://unreachable.invalid".into()))
    }

    fn response_mode(&self) -> ResponseMode {
        ResponseMode::FreeText
    }

    fn describe(&self) -> String {
        "failing".to_string()
    }
}
