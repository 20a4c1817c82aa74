use crate::core::config::{ImageConfig, LlmConfig};
use crate::core::error::{ComicError, ComicResult, UpstreamStage};
use crate::core::model::{ImageRef, Panel};
use crate::services::prompt::image_prompt;
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use log::debug;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use std::time::Duration;

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct ImageGenerationRequest {
    pub model: String,
    pub prompt: String,
    pub n: u32,
    pub size: String,
    pub quality: String,
}

#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct GeneratedImage {
    pub url: String,
    #[serde(default)]
    pub revised_prompt: Option<String>,
}

#[async_trait]
pub trait ImageGenerator: Send + Sync + Debug {
    async fn generate(&self, request: &ImageGenerationRequest) -> Result<Vec<GeneratedImage>>;
}

// --- OpenAI ---

#[derive(Debug)]
pub struct OpenAIImageClient {
    api_key: String,
    base_url: String,
    client: reqwest::Client,
}

impl OpenAIImageClient {
    pub fn new(api_key: &str, llm: &LlmConfig, cfg: &ImageConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(cfg.timeout_seconds))
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            api_key: api_key.to_string(),
            base_url: llm.base_url.trim_end_matches('/').to_string(),
            client,
        })
    }
}

#[derive(Deserialize)]
struct ImageGenerationResponse {
    #[serde(default)]
    data: Vec<GeneratedImage>,
}

#[async_trait]
impl ImageGenerator for OpenAIImageClient {
    async fn generate(&self, request: &ImageGenerationRequest) -> Result<Vec<GeneratedImage>> {
        let url = format!("{}/images/generations", self.base_url);
        debug!("POST {} model={} size={}", url, request.model, request.size);

        let resp = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(request)
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let error_text = resp.text().await?;
            return Err(anyhow!("OpenAI image API error ({}): {}", status, error_text));
        }

        let result: ImageGenerationResponse = resp.json().await?;
        Ok(result.data)
    }
}

/// Requests artwork for one panel. Exactly one image per call, no retries.
#[derive(Debug)]
pub struct ImageClient {
    generator: Box<dyn ImageGenerator>,
    config: ImageConfig,
}

impl ImageClient {
    pub fn new(generator: Box<dyn ImageGenerator>, config: ImageConfig) -> Self {
        Self { generator, config }
    }

    pub fn build_request(&self, panel: &Panel) -> ImageGenerationRequest {
        ImageGenerationRequest {
            model: self.config.model.clone(),
            prompt: image_prompt(panel),
            n: 1,
            size: self.config.size.clone(),
            quality: self.config.quality.clone(),
        }
    }

    pub async fn request_image(&self, panel: &Panel) -> ComicResult<ImageRef> {
        let stage = UpstreamStage::Image {
            panel: panel.panel_number,
        };
        let request = self.build_request(panel);

        let images = self
            .generator
            .generate(&request)
            .await
            .map_err(|e| ComicError::upstream(stage, e))?;

        let first = images
            .into_iter()
            .next()
            .filter(|img| !img.url.trim().is_empty())
            .ok_or_else(|| ComicError::upstream(stage, anyhow!("No image generated")))?;

        Ok(ImageRef {
            url: first.url,
            revised_prompt: first.revised_prompt,
        })
    }
}
