use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::Url;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::GenerationError;
use crate::ShaderGenerator;

pub const DEFAULT_ENDPOINT: &str = "http://localhost:4000/api/generate-shader";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    pub endpoint: Url,
    pub timeout: Duration,
}

impl GeneratorConfig {
    pub fn new(endpoint: &str, timeout: Duration) -> Result<Self, GenerationError> {
        let invalid = |reason: String| GenerationError::InvalidEndpoint {
            endpoint: endpoint.to_string(),
            reason,
        };
        let endpoint = Url::parse(endpoint).map_err(|err| invalid(err.to_string()))?;
        if !matches!(endpoint.scheme(), "http" | "https") {
            return Err(invalid(format!(
                "unsupported scheme '{}', expected http or https",
                endpoint.scheme()
            )));
        }
        Ok(Self { endpoint, timeout })
    }
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            endpoint: Url::parse(DEFAULT_ENDPOINT).expect("default endpoint is a valid url"),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GenerateRequest {
    pub prompt: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GenerateResponse {
    #[serde(rename = "shaderCode")]
    pub shader_code: String,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    #[serde(alias = "message")]
    error: String,
}

/// Blocking HTTP client; call it off the GL thread.
#[derive(Debug, Clone)]
pub struct GeneratorClient {
    http: Client,
    config: GeneratorConfig,
}

impl GeneratorClient {
    pub fn new(config: GeneratorConfig) -> Result<Self, GenerationError> {
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|source| GenerationError::Transport {
                endpoint: config.endpoint.to_string(),
                source,
            })?;
        Ok(Self { http, config })
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Requests source for `prompt`. The prompt is sent as given; callers
    /// reject blank prompts before getting here.
    pub fn request(&self, prompt: &str) -> Result<GenerateResponse, GenerationError> {
        let endpoint = &self.config.endpoint;
        debug!(%endpoint, prompt_len = prompt.len(), "requesting shader generation");
        let transport = |source| GenerationError::Transport {
            endpoint: endpoint.to_string(),
            source,
        };

        let response = self
            .http
            .post(endpoint.clone())
            .json(&GenerateRequest {
                prompt: prompt.to_string(),
            })
            .send()
            .map_err(transport)?;
        let status = response.status();
        let body = response.text().map_err(transport)?;

        if !status.is_success() {
            // Prefer the service's own error text over the raw body.
            let body = match serde_json::from_str::<ApiError>(&body) {
                Ok(err) => err.error,
                Err(_) => snippet(&body),
            };
            return Err(GenerationError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let payload: GenerateResponse =
            serde_json::from_str(&body).map_err(|err| GenerationError::Decode {
                reason: format!("{err}; first 200 bytes: {}", snippet(&body)),
            })?;
        info!(bytes = payload.shader_code.len(), "received generated shader");
        Ok(payload)
    }
}

impl ShaderGenerator for GeneratorClient {
    fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        self.request(prompt).map(|payload| payload.shader_code)
    }
}

fn snippet(body: &str) -> String {
    body.chars().take(200).collect()
}
