//! Generation provider traits
//!
//! Two small model families, each polymorphic over a single `generate`
//! capability. Adapters are pure protocol translators: the image stage
//! yields a decoded raster, the 3D stage yields the provider's raw output
//! untouched (normalization is the materializer's job).

use crate::output::RawOutput;
use image::DynamicImage;
use sculpt_core::{Result, SculptError};
use std::io::Cursor;

/// A text-to-image generation provider
pub trait ImageProvider: Send + Sync {
    /// Provider name (e.g. "nanobanana")
    fn name(&self) -> &str;

    /// Generate an image from a prompt, optionally conditioned on a
    /// reference image
    fn generate(&self, prompt: &str, reference: Option<&DynamicImage>) -> Result<DynamicImage>;
}

/// An image-to-3D generation provider
pub trait ThreeDProvider: Send + Sync {
    /// Provider name (e.g. "trellis")
    fn name(&self) -> &str;

    /// Generate a 3D asset from an image, returning the provider's raw
    /// response without normalization
    fn generate(&self, image: &DynamicImage) -> Result<RawOutput>;
}

/// Encode an image as PNG in memory
pub fn encode_png(image: &DynamicImage) -> Result<Vec<u8>> {
    let mut buffer = Cursor::new(Vec::new());
    image
        .write_to(&mut buffer, image::ImageFormat::Png)
        .map_err(|e| SculptError::Image(format!("Failed to encode PNG: {}", e)))?;
    Ok(buffer.into_inner())
}
