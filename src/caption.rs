use std::time::Duration;

use anyhow::Context as _;
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;

pub const DOWNLOAD_FAILED: &str = "image download failed";
pub const CAPTION_FAILED: &str = "caption generation failed";

#[async_trait]
pub trait ImageCaptioner: Send + Sync {
    /// Always yields a value for the record: a caption, an empty string, or a failure placeholder.
    async fn caption(&self, image_url: &str) -> String;
}

/// Leaves every cover interpretation empty.
#[derive(Debug, Clone, Default)]
pub struct NoopCaptioner;

#[async_trait]
impl ImageCaptioner for NoopCaptioner {
    async fn caption(&self, _image_url: &str) -> String {
        String::new()
    }
}

#[derive(Debug, Clone)]
pub struct HfCaptionConfig {
    pub base_url: String,
    pub api_key: String,
    pub model: String,
    pub timeout: Duration,
}

/// Hosted `image-to-text` model called with raw image bytes, Hugging Face inference style.
#[derive(Debug, Clone)]
pub struct HfCaptioner {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
}

impl HfCaptioner {
    pub fn new(config: HfCaptionConfig) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .context("build caption http client")?;
        Ok(Self {
            client,
            endpoint: caption_endpoint(&config.base_url, &config.model),
            api_key: config.api_key,
        })
    }

    async fn download(&self, image_url: &str) -> anyhow::Result<DecodedImage> {
        let response = self
            .client
            .get(image_url)
            .send()
            .await
            .with_context(|| format!("GET {image_url}"))?
            .error_for_status()
            .with_context(|| format!("GET {image_url}"))?;
        let bytes = response
            .bytes()
            .await
            .with_context(|| format!("read image body: {image_url}"))?;
        decode_image(bytes.to_vec())
    }

    async fn describe(&self, image: DecodedImage) -> anyhow::Result<String> {
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .header(CONTENT_TYPE, image.mime_type)
            .body(image.bytes)
            .send()
            .await
            .with_context(|| format!("POST {}", self.endpoint))?;

        let status = response.status();
        let raw = response.text().await.context("read caption response body")?;
        if !status.is_success() {
            anyhow::bail!("caption API error ({status}): {raw}");
        }

        let value: serde_json::Value =
            serde_json::from_str(&raw).context("parse caption response")?;
        generated_text(&value).ok_or_else(|| anyhow::anyhow!("caption response has no text"))
    }
}

#[async_trait]
impl ImageCaptioner for HfCaptioner {
    async fn caption(&self, image_url: &str) -> String {
        let image = match self.download(image_url).await {
            Ok(image) => image,
            Err(err) => {
                tracing::error!(url = image_url, error = %format!("{err:#}"), "image download failed");
                return DOWNLOAD_FAILED.to_owned();
            }
        };

        match self.describe(image).await {
            Ok(caption) => caption,
            Err(err) => {
                tracing::error!(url = image_url, error = %format!("{err:#}"), "caption generation failed");
                CAPTION_FAILED.to_owned()
            }
        }
    }
}

pub fn caption_endpoint(base_url: &str, model: &str) -> String {
    let base_url = base_url.trim_end_matches('/');
    let model = model.trim_matches('/');
    format!("{base_url}/{model}")
}

#[derive(Debug)]
struct DecodedImage {
    bytes: Vec<u8>,
    mime_type: &'static str,
}

fn decode_image(bytes: Vec<u8>) -> anyhow::Result<DecodedImage> {
    let format = image::guess_format(&bytes).context("detect image format")?;
    image::load_from_memory_with_format(&bytes, format).context("decode image")?;
    Ok(DecodedImage {
        bytes,
        mime_type: format.to_mime_type(),
    })
}

fn generated_text(value: &serde_json::Value) -> Option<String> {
    // Pipelines answer with a list; some deployments return the bare object.
    let item = match value.as_array() {
        Some(items) => items.first()?,
        None => value,
    };
    let text = item.get("generated_text")?.as_str()?.trim();
    if text.is_empty() {
        return None;
    }
    Some(text.to_owned())
}
