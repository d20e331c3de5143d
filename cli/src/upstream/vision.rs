use anyhow::{Context, Result};

use super::{ensure_success, require_key};
use sous_core::models::Label;
use sous_core::service::LabelDetector;
use sous_core::vision::{AnnotateResponse, label_request, labels_from_response};

const ANNOTATE_URL: &str = "https://vision.googleapis.com/v1/images:annotate";

#[derive(Clone)]
pub struct VisionClient {
    client: reqwest::Client,
    api_key: Option<String>,
}

impl VisionClient {
    pub fn new(client: reqwest::Client, api_key: Option<String>) -> Self {
        Self { client, api_key }
    }
}

impl LabelDetector for VisionClient {
    async fn detect_labels(&self, image: &[u8]) -> Result<Vec<Label>> {
        let key = require_key(self.api_key.as_deref(), "GOOGLE_CLOUD_VISION_KEY")?;

        let resp = self
            .client
            .post(ANNOTATE_URL)
            .header("x-goog-api-key", key)
            .json(&label_request(image))
            .send()
            .await
            .context("Failed to reach Cloud Vision API")?;
        let resp = ensure_success(resp, "Cloud Vision API").await?;

        let data: AnnotateResponse = resp
            .json()
            .await
            .context("Failed to parse Cloud Vision response")?;

        labels_from_response(data)
    }
}
