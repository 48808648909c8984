//! Provider registries
//!
//! Map model names to concrete implementations, one registry per model
//! family. Names are matched case-insensitively; unknown names fail
//! before any provider is constructed.

pub mod gptimage;
pub mod hunyuan;
pub mod nanobanana;
pub mod trellis;

use crate::config::SculptConfig;
use crate::provider::{ImageProvider, ThreeDProvider};
use sculpt_core::{Result, SculptError};

const IMAGE_MODELS: &[&str] = &["nanobanana", "gptimage"];
const THREE_D_MODELS: &[&str] = &["trellis", "hunyuan3d"];

/// Resolve an image model name to its canonical registry key
pub fn resolve_image_model(name: &str) -> Result<&'static str> {
    let lowered = name.to_lowercase();
    IMAGE_MODELS
        .iter()
        .find(|m| **m == lowered)
        .copied()
        .ok_or_else(|| SculptError::UnknownModel {
            value: name.to_string(),
            options: IMAGE_MODELS.to_vec(),
        })
}

/// Resolve a 3D model name to its canonical registry key
pub fn resolve_three_d_model(name: &str) -> Result<&'static str> {
    let lowered = name.to_lowercase();
    THREE_D_MODELS
        .iter()
        .find(|m| **m == lowered)
        .copied()
        .ok_or_else(|| SculptError::UnknownModel {
            value: name.to_string(),
            options: THREE_D_MODELS.to_vec(),
        })
}

/// Create an image provider by name with configuration
pub fn create_image_provider(
    name: &str,
    config: &SculptConfig,
) -> Result<Box<dyn ImageProvider>> {
    match resolve_image_model(name)? {
        "nanobanana" => Ok(Box::new(nanobanana::NanoBananaProvider::from_config(config)?)),
        "gptimage" => Ok(Box::new(gptimage::GptImageProvider::new())),
        _ => unreachable!("resolve_image_model returned an unregistered name"),
    }
}

/// Create a 3D provider by name with configuration
pub fn create_three_d_provider(
    name: &str,
    config: &SculptConfig,
) -> Result<Box<dyn ThreeDProvider>> {
    match resolve_three_d_model(name)? {
        "trellis" => Ok(Box::new(trellis::TrellisProvider::from_config(config)?)),
        "hunyuan3d" => Ok(Box::new(hunyuan::HunyuanProvider::from_config(config)?)),
        _ => unreachable!("resolve_three_d_model returned an unregistered name"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_is_case_insensitive() {
        assert_eq!(resolve_image_model("NanoBanana").unwrap(), "nanobanana");
        assert_eq!(resolve_three_d_model("TRELLIS").unwrap(), "trellis");
    }

    #[test]
    fn test_unknown_model_lists_options() {
        let err = resolve_three_d_model("nonexistent").unwrap_err();
        match err {
            SculptError::UnknownModel { value, options } => {
                assert_eq!(value, "nonexistent");
                assert!(options.contains(&"trellis"));
                assert!(options.contains(&"hunyuan3d"));
            }
            other => panic!("expected UnknownModel, got {other:?}"),
        }
    }

    #[test]
    fn test_unknown_name_rejected_before_construction() {
        // An unknown name must fail with UnknownModel even though no
        // credentials are configured; name validation precedes provider
        // construction.
        let config = SculptConfig::empty();
        let err = create_three_d_provider("nonexistent", &config).err().unwrap();
        assert!(matches!(err, SculptError::UnknownModel { .. }));
    }
}
