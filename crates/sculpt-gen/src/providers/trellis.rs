//! Trellis image-to-3D provider (Replicate)
//!
//! Submits the input image as a PNG data URI to the Replicate predictions
//! API and polls until the prediction settles. The raw `output` value is
//! returned unnormalized; only the materializer interprets it.

use crate::config::SculptConfig;
use crate::output::RawOutput;
use crate::provider::{encode_png, ThreeDProvider};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use image::DynamicImage;
use sculpt_core::{Result, SculptError};
use std::time::Duration;

const DEFAULT_REPLICATE_URL: &str = "https://api.replicate.com/v1/predictions";
const TRELLIS_VERSION: &str = "e8f6c45206993f297372f5436b90350817bd9b4a0d52d2a76df50c1c8afa2b3c";
const REQUEST_TIMEOUT_SECS: u64 = 60;
const POLL_INTERVAL_SECS: u64 = 5;
const MAX_POLL_ATTEMPTS: u32 = 120;

/// Trellis provider for image-to-3D generation via Replicate
pub struct TrellisProvider {
    api_token: String,
    api_url: String,
}

impl TrellisProvider {
    /// Create a new TrellisProvider from config
    pub fn from_config(config: &SculptConfig) -> Result<Self> {
        let api_token = config.require_api_key("replicate")?.to_string();
        let api_url = config
            .api_url("replicate")
            .unwrap_or(DEFAULT_REPLICATE_URL)
            .to_string();

        Ok(Self { api_token, api_url })
    }

    /// Create a prediction and return its id
    fn create_prediction(&self, image_data_uri: &str) -> Result<String> {
        let payload = serde_json::json!({
            "version": TRELLIS_VERSION,
            "input": {
                "images": [image_data_uri],
                "texture_size": 2048,
                "mesh_simplify": 0.9,
                "generate_model": true,
                "save_gaussian_ply": true,
                "ss_sampling_steps": 38
            }
        });

        let response = self.post_json(&self.api_url, &payload)?;

        response
            .get("id")
            .and_then(|id| id.as_str())
            .map(|s| s.to_string())
            .ok_or_else(|| {
                SculptError::Provider(format!(
                    "Unexpected Replicate create response: {}",
                    serde_json::to_string_pretty(&response).unwrap_or_default()
                ))
            })
    }

    /// Poll a prediction until it leaves the in-progress states
    fn wait_for_prediction(&self, prediction_id: &str) -> Result<serde_json::Value> {
        let url = format!("{}/{}", self.api_url, prediction_id);

        for _ in 0..MAX_POLL_ATTEMPTS {
            let response = self.get_json(&url)?;

            match prediction_status(&response) {
                "succeeded" => return Ok(response),
                "failed" | "canceled" => {
                    let detail = response
                        .get("error")
                        .and_then(|e| e.as_str())
                        .unwrap_or("unknown error");
                    return Err(SculptError::Provider(format!(
                        "Replicate prediction {}: {}",
                        prediction_status(&response),
                        detail
                    )));
                }
                _ => std::thread::sleep(Duration::from_secs(POLL_INTERVAL_SECS)),
            }
        }

        Err(SculptError::Provider(format!(
            "Replicate prediction timed out after {} poll attempts",
            MAX_POLL_ATTEMPTS
        )))
    }

    fn post_json(&self, url: &str, payload: &serde_json::Value) -> Result<serde_json::Value> {
        let agent = build_agent();
        let mut response = agent
            .post(url)
            .header("Authorization", &format!("Bearer {}", self.api_token))
            .header("Content-Type", "application/json")
            .send_json(payload)
            .map_err(|e| SculptError::Provider(format!("Replicate API request failed: {}", e)))?;

        response.body_mut().read_json().map_err(|e| {
            SculptError::Provider(format!("Failed to parse Replicate response: {}", e))
        })
    }

    fn get_json(&self, url: &str) -> Result<serde_json::Value> {
        let agent = build_agent();
        let mut response = agent
            .get(url)
            .header("Authorization", &format!("Bearer {}", self.api_token))
            .call()
            .map_err(|e| SculptError::Provider(format!("Replicate poll failed: {}", e)))?;

        response.body_mut().read_json().map_err(|e| {
            SculptError::Provider(format!("Failed to parse poll response: {}", e))
        })
    }
}

fn build_agent() -> ureq::Agent {
    let config = ureq::Agent::config_builder()
        .timeout_global(Some(Duration::from_secs(REQUEST_TIMEOUT_SECS)))
        .build();
    config.into()
}

fn prediction_status(response: &serde_json::Value) -> &str {
    response
        .get("status")
        .and_then(|s| s.as_str())
        .unwrap_or("unknown")
}

/// Encode an image as a PNG data URI for upload
pub fn png_data_uri(image: &DynamicImage) -> Result<String> {
    let bytes = encode_png(image)?;
    Ok(format!("data:image/png;base64,{}", STANDARD.encode(bytes)))
}

/// Extract the raw output value from a settled prediction
pub fn prediction_output(response: &serde_json::Value) -> Result<RawOutput> {
    let output = response.get("output").cloned().ok_or_else(|| {
        SculptError::Provider("Replicate prediction succeeded without an output".to_string())
    })?;
    Ok(RawOutput::from_json(output))
}

impl ThreeDProvider for TrellisProvider {
    fn name(&self) -> &str {
        "trellis"
    }

    fn generate(&self, image: &DynamicImage) -> Result<RawOutput> {
        let data_uri = png_data_uri(image)?;

        let prediction_id = self.create_prediction(&data_uri)?;
        tracing::info!(prediction_id = %prediction_id, "submitted trellis prediction");

        let settled = self.wait_for_prediction(&prediction_id)?;
        prediction_output(&settled)
    }
}
