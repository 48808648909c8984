//! HunYuan3D image-to-3D provider (Replicate)
//!
//! Known-degraded variant: the pinned hunyuan3d-2.1 version
//! (`895e514f953d...`) currently returns assets the materializer cannot
//! use (`remove_background: false` input shape). Rather than silently
//! persisting garbage, `generate` fails with an explicit error until the
//! upstream model is fixed.

use crate::config::SculptConfig;
use crate::output::RawOutput;
use crate::provider::ThreeDProvider;
use image::DynamicImage;
use sculpt_core::{Result, SculptError};

/// HunYuan3D provider, registered but currently non-functional
pub struct HunyuanProvider {
    #[allow(dead_code)]
    api_token: String,
}

impl HunyuanProvider {
    /// Create a new HunyuanProvider from config.
    ///
    /// Credential checks still apply so a missing token surfaces as a
    /// configuration error, not as the degraded-variant error.
    pub fn from_config(config: &SculptConfig) -> Result<Self> {
        let api_token = config.require_api_key("replicate")?.to_string();
        Ok(Self { api_token })
    }
}

impl ThreeDProvider for HunyuanProvider {
    fn name(&self) -> &str {
        "hunyuan3d"
    }

    fn generate(&self, _image: &DynamicImage) -> Result<RawOutput> {
        Err(SculptError::Unsupported(
            "hunyuan3d is currently non-functional; use the trellis model instead".to_string(),
        ))
    }
}
