use anyhow::{Result, bail};
use base64::{Engine as _, engine::general_purpose};
use serde::{Deserialize, Serialize};

use crate::models::{Label, MAX_LABEL_RESULTS};

#[derive(Debug, Serialize)]
pub struct AnnotateRequest {
    pub requests: Vec<ImageRequest>,
}

#[derive(Debug, Serialize)]
pub struct ImageRequest {
    pub image: ImageContent,
    pub features: Vec<Feature>,
}

#[derive(Debug, Serialize)]
pub struct ImageContent {
    pub content: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Feature {
    #[serde(rename = "type")]
    pub kind: String,
    pub max_results: u32,
}

#[derive(Debug, Deserialize)]
pub struct AnnotateResponse {
    pub responses: Vec<ImageResponse>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageResponse {
    #[serde(default)]
    pub label_annotations: Vec<LabelAnnotation>,
    pub error: Option<Status>,
}

#[derive(Debug, Deserialize)]
pub struct LabelAnnotation {
    pub description: Option<String>,
    pub score: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct Status {
    #[serde(default)]
    pub code: i32,
    #[serde(default)]
    pub message: String,
}

/// Build a single-image label-detection request.
#[must_use]
pub fn label_request(image: &[u8]) -> AnnotateRequest {
    AnnotateRequest {
        requests: vec![ImageRequest {
            image: ImageContent {
                content: general_purpose::STANDARD.encode(image),
            },
            features: vec![Feature {
                kind: "LABEL_DETECTION".to_string(),
                max_results: MAX_LABEL_RESULTS,
            }],
        }],
    }
}

/// Pull the labels for the first image out of an annotate response.
///
/// An empty `responses` array or a response without annotations yields no
/// labels. A body with no `responses` key at all fails to deserialize.
/// Annotations lacking a description or score are skipped. An embedded
/// per-image error is a failure.
pub fn labels_from_response(resp: AnnotateResponse) -> Result<Vec<Label>> {
    let Some(first) = resp.responses.into_iter().next() else {
        return Ok(Vec::new());
    };

    if let Some(status) = first.error {
        bail!(
            "label detection failed with code {}: {}",
            status.code,
            status.message
        );
    }

    Ok(first
        .label_annotations
        .into_iter()
        .filter_map(|a| {
            Some(Label {
                description: a.description.filter(|d| !d.is_empty())?,
                score: a.score?,
            })
        })
        .collect())
}
