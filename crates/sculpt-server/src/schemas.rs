//! Request schemas for the generation endpoints

use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct GenerateRequest {
    pub prompt: String,
    /// Falls back to the configured default when omitted
    #[serde(default)]
    pub image_model: Option<String>,
    #[serde(default)]
    pub three_d_model: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Generate3dRequest {
    pub image_path: String,
    #[serde(default)]
    pub three_d_model: Option<String>,
}
