//! Client for the product and image lookup endpoints

use std::sync::Arc;

use serde::Deserialize;

use crate::config::ApiConfig;
use crate::image::image_source;
use crate::io::HttpClient;
use crate::record::ProductRecord;

/// Body of `GET /api/Image/{print_card}`
#[derive(Debug, Deserialize)]
struct ImageResponse {
    #[serde(rename = "imageBase64", default)]
    image_base64: Option<serde_json::Value>,
}

/// Lookup client for product records and their images
pub struct EntryApi {
    base_url: String,
    placeholder_image_url: String,
    http: Arc<dyn HttpClient>,
}

impl std::fmt::Debug for EntryApi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntryApi")
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl EntryApi {
    pub fn new(config: &ApiConfig, http: Arc<dyn HttpClient>) -> Self {
        let base_url = config.base_url.trim_end_matches('/').to_string();
        tracing::debug!("Created EntryApi at {}", base_url);

        Self {
            base_url,
            placeholder_image_url: config.placeholder_image_url.clone(),
            http,
        }
    }

    pub fn placeholder_image_url(&self) -> &str {
        &self.placeholder_image_url
    }

    /// `{base_url}/api/{resource}/{key}`, with `key` percent-encoded as one segment
    fn endpoint(&self, resource: &str, key: &str) -> crate::Result<String> {
        let mut url = reqwest::Url::parse(&self.base_url).map_err(|e| {
            crate::EntradaError::Config(format!("Invalid API base URL {}: {}", self.base_url, e))
        })?;
        url.path_segments_mut()
            .map_err(|_| {
                crate::EntradaError::Config(format!(
                    "API base URL {} cannot have a path",
                    self.base_url
                ))
            })?
            .pop_if_empty()
            .extend(["api", resource, key]);
        Ok(url.to_string())
    }

    /// Fetch the product record announced under `epc`
    pub async fn fetch_product(&self, epc: &str) -> crate::Result<ProductRecord> {
        let url = self.endpoint("socket", epc)?;
        let response = self.http.get(&url).await?;

        if !response.is_ok() {
            return Err(crate::EntradaError::Http(format!(
                "GET {} returned status {}",
                url, response.status
            )));
        }

        let record: ProductRecord = serde_json::from_str(&response.body)?;
        tracing::debug!("Product for EPC {}: {:?}", epc, record);
        Ok(record)
    }

    /// Fetch the image for a print card, returning an `<img src>` value.
    ///
    /// A non-success status or an absent payload yields the placeholder.
    /// Transport failures and unreadable bodies are errors.
    pub async fn fetch_image(&self, print_card: &str) -> crate::Result<String> {
        let url = self.endpoint("Image", print_card)?;
        let response = self.http.get(&url).await?;

        if !response.is_ok() {
            tracing::debug!(
                "Image lookup for '{}' returned status {}, using placeholder",
                print_card,
                response.status
            );
            return Ok(self.placeholder_image_url.clone());
        }

        let parsed: ImageResponse = serde_json::from_str(&response.body)?;
        match parsed.image_base64 {
            Some(serde_json::Value::String(payload)) => {
                Ok(image_source(&payload, &self.placeholder_image_url))
            }
            _ => {
                tracing::debug!("No image payload for '{}', using placeholder", print_card);
                Ok(self.placeholder_image_url.clone())
            }
        }
    }
}
