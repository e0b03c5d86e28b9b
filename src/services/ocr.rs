//! Receipt OCR backends.
//!
//! The OCR provider is an external HTTP service: image bytes in, a list of
//! product lines out. Provider output is loose, so every line goes through
//! [`normalize_candidates`] before the reconciler sees it.

use crate::{config::AppConfig, errors::ServiceError, reconciliation::ReceiptCandidate};
use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, error, instrument, warn};

#[async_trait]
pub trait OcrBackend: Send + Sync {
    /// Extracts product lines from a receipt image.
    async fn extract(
        &self,
        image: &[u8],
        mime_type: &str,
    ) -> Result<Vec<ReceiptCandidate>, ServiceError>;

    fn provider_name(&self) -> &str;
}

/// Line as returned by the provider, before cleanup.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawCandidate {
    #[serde(default, alias = "product_name")]
    pub name: Option<String>,
    #[serde(default)]
    pub quantity: Option<f64>,
    #[serde(default, alias = "price")]
    pub unit_price: Option<Decimal>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub subcategory: Option<String>,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default)]
    pub confidence: Option<f32>,
    #[serde(default)]
    pub variant_group_tag: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct ExtractResponse {
    #[serde(alias = "candidates", alias = "items")]
    products: Vec<RawCandidate>,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Cleans provider output: names are trimmed and blank ones dropped,
/// negative quantities and prices become zero, confidence is clamped to
/// `0..=1` and a group tag of 0 means "no group".
pub fn normalize_candidates(raw: Vec<RawCandidate>) -> Vec<ReceiptCandidate> {
    raw.into_iter()
        .filter_map(|line| {
            let name = non_blank(line.name)?;
            let quantity = line
                .quantity
                .filter(|q| q.is_finite())
                .map(|q| q.round().clamp(0.0, i32::MAX as f64) as i32)
                .unwrap_or(1);
            let unit_price = line
                .unit_price
                .filter(|p| !p.is_sign_negative())
                .unwrap_or(Decimal::ZERO);
            Some(ReceiptCandidate {
                name,
                quantity,
                unit_price,
                category: non_blank(line.category),
                subcategory: non_blank(line.subcategory),
                unit: non_blank(line.unit),
                confidence: line.confidence.map(|c| c.clamp(0.0, 1.0)),
                variant_group_tag: line.variant_group_tag.filter(|tag| *tag != 0),
            })
        })
        .collect()
}

/// Talks to an OCR provider exposing `POST {base_url}/extract`.
pub struct HttpOcrBackend {
    base_url: String,
    api_key: Option<String>,
    client: reqwest::Client,
    timeout: Duration,
}

impl HttpOcrBackend {
    pub fn new(base_url: impl Into<String>, api_key: Option<String>, timeout: Duration) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
            client: reqwest::Client::new(),
            timeout,
        }
    }

    /// `None` when no OCR base URL is configured.
    pub fn from_config(config: &AppConfig) -> Option<Self> {
        let base_url = config
            .ocr_base_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())?;
        Some(Self::new(
            base_url,
            config.ocr_api_key.clone(),
            Duration::from_secs(config.ocr_timeout_secs.max(1)),
        ))
    }
}

fn file_extension(mime_type: &str) -> &'static str {
    match mime_type {
        "image/png" => "png",
        "image/webp" => "webp",
        "image/heic" => "heic",
        "application/pdf" => "pdf",
        _ => "jpg",
    }
}

#[async_trait]
impl OcrBackend for HttpOcrBackend {
    #[instrument(skip(self, image), fields(bytes = image.len()))]
    async fn extract(
        &self,
        image: &[u8],
        mime_type: &str,
    ) -> Result<Vec<ReceiptCandidate>, ServiceError> {
        let url = format!("{}/extract", self.base_url);

        let part = reqwest::multipart::Part::bytes(image.to_vec())
            .file_name(format!("receipt.{}", file_extension(mime_type)))
            .mime_str(mime_type)
            .map_err(|e| ServiceError::BadRequest(format!("Unsupported content type: {}", e)))?;
        let form = reqwest::multipart::Form::new().part("file", part);

        let mut request = self
            .client
            .post(&url)
            .multipart(form)
            .timeout(self.timeout);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await.map_err(|e| {
            error!(error = %e, "OCR request failed");
            ServiceError::ExternalServiceError(format!("OCR request failed: {}", e))
        })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            warn!(%status, "OCR provider returned an error");
            return Err(ServiceError::ExternalServiceError(format!(
                "OCR provider returned {}: {}",
                status,
                body.chars().take(200).collect::<String>()
            )));
        }

        let parsed: ExtractResponse = response.json().await.map_err(|e| {
            ServiceError::ExternalServiceError(format!("Failed to parse OCR response: {}", e))
        })?;
        let raw_count = parsed.products.len();
        let candidates = normalize_candidates(parsed.products);
        debug!(raw = raw_count, kept = candidates.len(), "Receipt lines extracted");
        Ok(candidates)
    }

    fn provider_name(&self) -> &str {
        &self.base_url
    }
}
