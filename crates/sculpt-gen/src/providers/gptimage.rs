//! GPT image generation provider, placeholder
//!
//! Registered so callers see it as a valid model name, but not wired to
//! the OpenAI API yet; `generate` fails explicitly.

use crate::provider::ImageProvider;
use image::DynamicImage;
use sculpt_core::{Result, SculptError};

/// Placeholder OpenAI image provider
#[derive(Default)]
pub struct GptImageProvider;

impl GptImageProvider {
    pub fn new() -> Self {
        Self
    }
}

impl ImageProvider for GptImageProvider {
    fn name(&self) -> &str {
        "gptimage"
    }

    fn generate(&self, _prompt: &str, _reference: Option<&DynamicImage>) -> Result<DynamicImage> {
        Err(SculptError::Unsupported(
            "gptimage is not implemented yet; use the nanobanana model instead".to_string(),
        ))
    }
}
