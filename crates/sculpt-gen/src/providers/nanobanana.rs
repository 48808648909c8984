//! NanoBanana image generation provider (Gemini)
//!
//! Generates 2D designs via the Gemini image model. The response envelope
//! has shifted between API revisions: inline image parts appear either at
//! the top level (`parts`) or nested under `candidates -> content ->
//! parts`. Both shapes are tried, first match wins.

use crate::config::SculptConfig;
use crate::provider::{encode_png, ImageProvider};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use image::DynamicImage;
use sculpt_core::{Result, SculptError};
use serde::Serialize;
use std::time::Duration;

const DEFAULT_GEMINI_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";
const GEMINI_IMAGE_MODEL: &str = "gemini-2.5-flash-image";
const REQUEST_TIMEOUT_SECS: u64 = 60;

/// Fixed style preamble composed with every caller prompt
const STYLE_PREAMBLE: &str = "Render a single object on a plain neutral background, \
centered, evenly lit, no text or watermarks, suitable for 3D reconstruction.";

#[derive(Serialize)]
struct GenerateContentRequest {
    contents: Vec<Content>,
}

#[derive(Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
enum Part {
    Text(String),
    InlineData(Blob),
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Blob {
    mime_type: &'static str,
    data: String,
}

/// NanoBanana provider for AI image generation via the Gemini API
pub struct NanoBananaProvider {
    api_key: String,
    api_url: String,
}

impl NanoBananaProvider {
    /// Create a new NanoBananaProvider from config
    pub fn from_config(config: &SculptConfig) -> Result<Self> {
        let api_key = config.require_api_key("gemini")?.to_string();
        let api_url = config
            .api_url("gemini")
            .unwrap_or(DEFAULT_GEMINI_URL)
            .to_string();

        Ok(Self { api_key, api_url })
    }

    fn post_generate(&self, request: &GenerateContentRequest) -> Result<serde_json::Value> {
        let agent = build_agent();
        let url = format!("{}/{}:generateContent", self.api_url, GEMINI_IMAGE_MODEL);

        let mut response = agent
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .header("Content-Type", "application/json")
            .send_json(request)
            .map_err(|e| SculptError::Provider(format!("Gemini API request failed: {}", e)))?;

        response
            .body_mut()
            .read_json()
            .map_err(|e| SculptError::Provider(format!("Failed to parse Gemini response: {}", e)))
    }
}

fn build_agent() -> ureq::Agent {
    let config = ureq::Agent::config_builder()
        .timeout_global(Some(Duration::from_secs(REQUEST_TIMEOUT_SECS)))
        .build();
    config.into()
}

impl ImageProvider for NanoBananaProvider {
    fn name(&self) -> &str {
        "nanobanana"
    }

    fn generate(&self, prompt: &str, reference: Option<&DynamicImage>) -> Result<DynamicImage> {
        let mut parts = vec![Part::Text(format!("{} {}", STYLE_PREAMBLE, prompt))];

        if let Some(reference) = reference {
            parts.push(Part::InlineData(Blob {
                mime_type: "image/png",
                data: STANDARD.encode(encode_png(reference)?),
            }));
        }

        let request = GenerateContentRequest {
            contents: vec![Content { parts }],
        };

        let response = self.post_generate(&request)?;

        let data = extract_inline_image(&response).ok_or_else(|| {
            SculptError::NoImageInResponse(
                "model response did not include an inline image".to_string(),
            )
        })?;

        image::load_from_memory(&data)
            .map_err(|e| SculptError::Image(format!("Failed to decode generated image: {}", e)))
    }
}

/// Find the first decodable inline image payload in a Gemini response.
///
/// Tries the flat `parts` envelope first, then `candidates`.
pub fn extract_inline_image(response: &serde_json::Value) -> Option<Vec<u8>> {
    if let Some(parts) = response.get("parts").and_then(|p| p.as_array()) {
        if let Some(data) = first_inline_payload(parts) {
            return Some(data);
        }
    }

    if let Some(candidates) = response.get("candidates").and_then(|c| c.as_array()) {
        for candidate in candidates {
            let parts = candidate
                .get("content")
                .and_then(|c| c.get("parts"))
                .and_then(|p| p.as_array());
            if let Some(parts) = parts {
                if let Some(data) = first_inline_payload(parts) {
                    return Some(data);
                }
            }
        }
    }

    None
}

fn first_inline_payload(parts: &[serde_json::Value]) -> Option<Vec<u8>> {
    for part in parts {
        let blob = part.get("inlineData").or_else(|| part.get("inline_data"));
        if let Some(data) = blob.and_then(|b| b.get("data")).and_then(|d| d.as_str()) {
            if let Ok(bytes) = STANDARD.decode(data) {
                return Some(bytes);
            }
        }
    }
    None
}
