//! OpenAI Responses API backend.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use magpie_common::{MagpieError, Result};
use magpie_http::{Auth, HttpClient, HttpError, RequestOpts};

use crate::traits::{LlmClient, LlmResponse};

pub const OPENAI_API_BASE: &str = "https://api.openai.com/v1/";

/// Client for OpenAI's `/v1/responses` endpoint.
pub struct OpenAiClient {
    http: HttpClient,
    api_key: String,
    model: String,
}

impl OpenAiClient {
    pub fn new(api_key: String, model: String) -> Result<Self> {
        Self::with_base(OPENAI_API_BASE, api_key, model)
    }

    /// Same client against a different base URL. Tests point this at a mock
    /// server.
    pub fn with_base(base: &str, api_key: String, model: String) -> Result<Self> {
        let http = HttpClient::new(base).map_err(http_to_magpie)?;
        Ok(Self {
            http,
            api_key,
            model,
        })
    }
}

#[derive(Debug, Serialize)]
struct ResponsesApiRequest<'a> {
    model: &'a str,
    input: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    instructions: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct ResponsesApiResponse {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    output: Vec<OutputItem>,
}

#[derive(Debug, Deserialize)]
struct OutputItem {
    #[serde(rename = "type", default)]
    kind: String,
    #[serde(default)]
    content: Vec<OutputContent>,
}

#[derive(Debug, Deserialize)]
struct OutputContent {
    #[serde(rename = "type", default)]
    kind: String,
    #[serde(default)]
    text: String,
}

impl ResponsesApiResponse {
    /// First `output_text` fragment across the output items, if any.
    fn output_text(&self) -> Option<&str> {
        self.output
            .iter()
            .filter(|item| item.kind == "message")
            .flat_map(|item| item.content.iter())
            .find(|content| content.kind == "output_text")
            .map(|content| content.text.as_str())
    }
}

#[async_trait]
impl LlmClient for OpenAiClient {
    async fn generate(&self, prompt: &str, system_prompt: Option<&str>) -> Result<LlmResponse> {
        let request = ResponsesApiRequest {
            model: &self.model,
            input: prompt,
            instructions: system_prompt,
        };

        tracing::debug!(model = %self.model, "openai.generate.start");
        let response: ResponsesApiResponse = self
            .http
            .post_json(
                "responses",
                &request,
                RequestOpts {
                    auth: Some(Auth::Bearer(&self.api_key)),
                    ..Default::default()
                },
            )
            .await
            .map_err(http_to_magpie)?;

        if let Some(status) = response.status.as_deref() {
            if status != "completed" {
                tracing::debug!(status, "openai.generate.status");
            }
        }

        let text = response.output_text().unwrap_or_default().to_string();
        Ok(LlmResponse {
            text,
            model: response.model,
        })
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

fn http_to_magpie(err: HttpError) -> MagpieError {
    MagpieError::Completion(err.to_string())
}
