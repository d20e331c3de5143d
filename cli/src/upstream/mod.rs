mod gemini;
mod spoonacular;
mod vision;

use anyhow::{Context, Result, bail};

use crate::config::Config;
use sous_core::models::{Label, RecipeSummary};
use sous_core::service::{ChatModel, LabelDetector, RecipeCatalog};

pub use gemini::GeminiClient;
pub use spoonacular::SpoonacularClient;
pub use vision::VisionClient;

/// The production upstreams, all sharing one connection pool.
#[derive(Clone)]
pub struct HttpUpstreams {
    pub vision: VisionClient,
    pub recipes: SpoonacularClient,
    pub chat: GeminiClient,
}

impl HttpUpstreams {
    pub fn from_config(config: &Config) -> Result<Self> {
        let client = http_client()?;
        Ok(Self {
            vision: VisionClient::new(client.clone(), config.vision_api_key.clone()),
            recipes: SpoonacularClient::new(client.clone(), config.spoonacular_api_key.clone()),
            chat: GeminiClient::new(
                client,
                config.gemini_api_key.clone(),
                config.gemini_model.clone(),
            ),
        })
    }
}

impl LabelDetector for HttpUpstreams {
    async fn detect_labels(&self, image: &[u8]) -> Result<Vec<Label>> {
        self.vision.detect_labels(image).await
    }
}

impl RecipeCatalog for HttpUpstreams {
    fn is_available(&self) -> bool {
        self.recipes.is_available()
    }

    async fn find_by_ingredients(&self, ingredients: &[String]) -> Result<Vec<RecipeSummary>> {
        self.recipes.find_by_ingredients(ingredients).await
    }

    async fn recipe_information(&self, recipe_id: i64) -> Result<serde_json::Value> {
        self.recipes.recipe_information(recipe_id).await
    }
}

impl ChatModel for HttpUpstreams {
    async fn generate(&self, message: &str) -> Result<Option<String>> {
        self.chat.generate(message).await
    }
}

// No request timeout: calls run until the upstream answers or the
// connection fails.
pub(crate) fn http_client() -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent(format!(
            "sous/{} (recipe backend)",
            env!("CARGO_PKG_VERSION")
        ))
        .build()
        .context("Failed to build HTTP client")
}

/// Turn a non-2xx response into an error carrying the status and body.
///
/// The body ends up in server logs only, never in a client response.
pub(crate) async fn ensure_success(
    resp: reqwest::Response,
    service: &str,
) -> Result<reqwest::Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    bail!("{service} returned {status}: {body}")
}

pub(crate) fn require_key<'a>(key: Option<&'a str>, var: &str) -> Result<&'a str> {
    key.with_context(|| format!("{var} is not configured"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require_key() {
        assert_eq!(require_key(Some("k"), "X_KEY").unwrap(), "k");
        let err = require_key(None, "X_KEY").unwrap_err();
        assert_eq!(err.to_string(), "X_KEY is not configured");
    }
}
