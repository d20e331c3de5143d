use anyhow::{Context, Result};

use super::{ensure_success, require_key};
use sous_core::gemini::{GenerateResponse, first_reply, user_turn};
use sous_core::service::ChatModel;

const MODELS_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";

#[derive(Clone)]
pub struct GeminiClient {
    client: reqwest::Client,
    api_key: Option<String>,
    model: String,
}

impl GeminiClient {
    pub fn new(client: reqwest::Client, api_key: Option<String>, model: String) -> Self {
        Self {
            client,
            api_key,
            model,
        }
    }
}

impl ChatModel for GeminiClient {
    async fn generate(&self, message: &str) -> Result<Option<String>> {
        let key = require_key(self.api_key.as_deref(), "GEMINI_API_KEY")?;
        let url = format!("{MODELS_URL}/{}:generateContent", self.model);

        let resp = self
            .client
            .post(&url)
            .header("x-goog-api-key", key)
            .json(&user_turn(message))
            .send()
            .await
            .context("Failed to reach Gemini API")?;
        let resp = ensure_success(resp, "Gemini API").await?;

        let data: GenerateResponse = resp
            .json()
            .await
            .context("Failed to parse Gemini response")?;

        Ok(first_reply(data))
    }
}
