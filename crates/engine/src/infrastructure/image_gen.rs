//! Stability-style text-to-image client
//!
//! Implements the ImageGenPort trait. Images come back as base64 artifacts and
//! are handed on as `data:` URLs.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::infrastructure::ports::{GeneratedImage, ImageGenError, ImageGenPort, ImageRequest};

const DEFAULT_ASPECT_RATIO: &str = "16:9";
const DEFAULT_STYLE: &str = "realistic";
const BASE_SIZE: u32 = 1024;

/// Client for a Stability-compatible generation endpoint
#[derive(Clone)]
pub struct StabilityClient {
    client: Client,
    url: String,
    api_key: Option<String>,
}

#[derive(Debug, Serialize)]
struct TextPrompt<'a> {
    text: &'a str,
    weight: f32,
}

#[derive(Debug, Serialize)]
struct GenerationRequest<'a> {
    text_prompts: Vec<TextPrompt<'a>>,
    cfg_scale: u32,
    height: u32,
    width: u32,
    steps: u32,
    samples: u32,
}

#[derive(Debug, Deserialize)]
struct GenerationResponse {
    #[serde(default)]
    artifacts: Vec<Artifact>,
}

#[derive(Debug, Deserialize)]
struct Artifact {
    base64: Option<String>,
}

impl StabilityClient {
    pub fn new(url: &str, api_key: Option<String>) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(120))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            url: url.to_string(),
            api_key: api_key.filter(|k| !k.trim().is_empty()),
        }
    }
}

/// Width and height for a "W:H" ratio, longest side fixed at 1024.
///
/// Unparseable or non-positive ratios fall back to a square.
pub fn dimensions_for(aspect_ratio: &str) -> (u32, u32) {
    let parsed = aspect_ratio
        .split_once(':')
        .and_then(|(w, h)| Some((w.trim().parse::<f64>().ok()?, h.trim().parse::<f64>().ok()?)))
        .filter(|(w, h)| *w > 0.0 && *h > 0.0);

    let Some((w, h)) = parsed else {
        return (BASE_SIZE, BASE_SIZE);
    };

    let base = f64::from(BASE_SIZE);
    if w / h > 1.0 {
        (BASE_SIZE, (base * h / w).round() as u32)
    } else {
        ((base * w / h).round() as u32, BASE_SIZE)
    }
}

#[async_trait]
impl ImageGenPort for StabilityClient {
    async fn generate(&self, request: ImageRequest) -> Result<GeneratedImage, ImageGenError> {
        let api_key = self.api_key.as_deref().ok_or(ImageGenError::NotConfigured)?;

        let aspect_ratio = request
            .aspect_ratio
            .clone()
            .unwrap_or_else(|| DEFAULT_ASPECT_RATIO.to_string());
        let (width, height) = dimensions_for(&aspect_ratio);

        let mut text_prompts = vec![TextPrompt {
            text: &request.prompt,
            weight: 1.0,
        }];
        text_prompts.extend(request.negative_tags.iter().map(|tag| TextPrompt {
            text: tag,
            weight: -1.0,
        }));

        let body = GenerationRequest {
            text_prompts,
            cfg_scale: 7,
            height,
            width,
            steps: 30,
            samples: 1,
        };

        let response = self
            .client
            .post(&self.url)
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| ImageGenError::GenerationFailed(e.to_string()))?;

        if !response.status().is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ImageGenError::GenerationFailed(error_text));
        }

        let parsed: GenerationResponse = response
            .json()
            .await
            .map_err(|e| ImageGenError::GenerationFailed(e.to_string()))?;

        let image = parsed
            .artifacts
            .into_iter()
            .next()
            .and_then(|a| a.base64)
            .ok_or_else(|| ImageGenError::GenerationFailed("No image generated".to_string()))?;

        Ok(GeneratedImage {
            image_url: format!("data:image/png;base64,{}", image),
            metadata: json!({
                "prompt": request.prompt,
                "style": request.style.as_deref().unwrap_or(DEFAULT_STYLE),
                "aspect_ratio": aspect_ratio,
                "provider": "stable_diffusion",
            }),
        })
    }
}
