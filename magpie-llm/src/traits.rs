//! Client trait and shared response type for completion backends.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use magpie_common::Result;

use crate::parse;
use crate::prompt::{self, PostMaterial};

/// A completed generation, whatever backend produced it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmResponse {
    /// Raw text of the reply, exactly as the model returned it.
    pub text: String,
    /// Model that actually served the request, when the backend reports one.
    pub model: Option<String>,
}

/// Interface to a text-completion backend.
///
/// Implementations handle transport and auth; the post-composition flow is a
/// default method so every backend gets it for free.
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Run one completion and hand back the raw reply.
    async fn generate(&self, prompt: &str, system_prompt: Option<&str>) -> Result<LlmResponse>;

    /// Name of the model this client is configured for.
    fn model_name(&self) -> &str;

    /// Turn source material into a ready-to-publish post.
    ///
    /// Returns `Ok(None)` when the model replied but the reply did not carry
    /// a usable post. Transport and API failures surface as `Err`.
    async fn compose_post(&self, material: &PostMaterial) -> Result<Option<String>> {
        let user_prompt = prompt::build_prompt(material);
        tracing::debug!(model = self.model_name(), "llm.compose.start");

        let response = self
            .generate(&user_prompt, Some(prompt::SYSTEM_PROMPT))
            .await?;
        tracing::trace!(raw = %response.text, "llm.compose.raw");

        Ok(parse::parse_post(&response.text))
    }
}
