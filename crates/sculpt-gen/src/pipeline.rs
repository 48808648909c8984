//! Pipeline orchestration
//!
//! Sequences image generation, image-to-3D generation, and
//! materialization for a single request. No internal concurrency: each
//! stage blocks until its external call returns, and nothing is shared
//! between invocations except the output directory.

use crate::config::SculptConfig;
use crate::materialize::{ArtifactDescriptor, Materializer};
use crate::provider::{ImageProvider, ThreeDProvider};
use crate::providers::{
    create_image_provider, create_three_d_provider, resolve_image_model, resolve_three_d_model,
};
use image::DynamicImage;
use sculpt_core::{ArtifactId, Result, SculptError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Descriptor for a persisted intermediate image
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageArtifact {
    pub id: ArtifactId,
    /// Route the serving boundary exposes the file under
    pub url: String,
    /// Filename relative to the output directory
    pub path: String,
}

/// The result of a full prompt-to-3D run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineResult {
    #[serde(flatten)]
    pub artifact: ArtifactDescriptor,
    pub source_image: ImageArtifact,
}

/// Orchestrates the generation stages against one output directory
pub struct Pipeline {
    config: SculptConfig,
    output_dir: PathBuf,
    materializer: Materializer,
}

impl Pipeline {
    pub fn new<P: AsRef<Path>>(config: SculptConfig, output_dir: P) -> Result<Self> {
        let output_dir = output_dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&output_dir)?;

        let mut materializer = Materializer::new(&output_dir);
        if let Some(priority) = config.materialize_priority() {
            materializer = materializer.with_priority(priority.to_vec());
        }

        Ok(Self {
            config,
            output_dir,
            materializer,
        })
    }

    pub fn config(&self) -> &SculptConfig {
        &self.config
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Generate an image from a prompt and persist it as a PNG
    pub fn generate_image(
        &self,
        prompt: &str,
        image_model: &str,
        reference: Option<&[u8]>,
    ) -> Result<ImageArtifact> {
        let provider = create_image_provider(image_model, &self.config)?;

        let reference = reference
            .map(image::load_from_memory)
            .transpose()
            .map_err(|e| SculptError::Image(format!("Failed to decode reference image: {}", e)))?;

        self.generate_image_with(provider.as_ref(), prompt, reference.as_ref())
    }

    /// Image stage against an already-constructed provider
    pub fn generate_image_with(
        &self,
        provider: &dyn ImageProvider,
        prompt: &str,
        reference: Option<&DynamicImage>,
    ) -> Result<ImageArtifact> {
        tracing::info!(provider = provider.name(), "generating image");
        let image = provider.generate(prompt, reference)?;

        let id = ArtifactId::generate();
        let filename = format!("{}.png", id);
        image
            .save_with_format(self.output_dir.join(&filename), image::ImageFormat::Png)
            .map_err(|e| SculptError::Image(format!("Failed to persist image: {}", e)))?;

        Ok(ImageArtifact {
            id,
            url: format!("/files/{}", filename),
            path: filename,
        })
    }

    /// Generate a 3D artifact from an image on disk.
    ///
    /// The model name and image path are validated before the provider is
    /// constructed, so a missing image surfaces as not-found rather than
    /// as a credential problem.
    pub fn generate_3d(&self, image_path: &str, three_d_model: &str) -> Result<ArtifactDescriptor> {
        let three_d_model = resolve_three_d_model(three_d_model)?;
        let image = self.load_image(image_path)?;
        let provider = create_three_d_provider(three_d_model, &self.config)?;
        self.generate_3d_with(provider.as_ref(), &image)
    }

    /// 3D stage against an already-constructed provider
    pub fn generate_3d_with(
        &self,
        provider: &dyn ThreeDProvider,
        image: &DynamicImage,
    ) -> Result<ArtifactDescriptor> {
        tracing::info!(provider = provider.name(), "generating 3D asset");
        let raw = provider.generate(image)?;
        self.materializer.materialize(raw)
    }

    /// Full prompt-to-3D run.
    ///
    /// Both model names are validated before any provider work; a stage-2
    /// failure leaves the stage-1 image persisted but unreferenced.
    pub fn run_pipeline(
        &self,
        prompt: &str,
        image_model: &str,
        three_d_model: &str,
    ) -> Result<PipelineResult> {
        let image_model = resolve_image_model(image_model)?;
        let three_d_model = resolve_three_d_model(three_d_model)?;

        let image_provider = create_image_provider(image_model, &self.config)?;
        let three_d_provider = create_three_d_provider(three_d_model, &self.config)?;

        self.run_pipeline_with(image_provider.as_ref(), three_d_provider.as_ref(), prompt)
    }

    /// Full run against already-constructed providers
    pub fn run_pipeline_with(
        &self,
        image_provider: &dyn ImageProvider,
        three_d_provider: &dyn ThreeDProvider,
        prompt: &str,
    ) -> Result<PipelineResult> {
        let source_image = self.generate_image_with(image_provider, prompt, None)?;
        let image = self.load_image(&source_image.path)?;
        let artifact = self.generate_3d_with(three_d_provider, &image)?;

        Ok(PipelineResult {
            artifact,
            source_image,
        })
    }

    /// Load an image from an absolute path, falling back to the output
    /// directory for relative ones
    fn load_image(&self, image_path: &str) -> Result<DynamicImage> {
        let candidate = Path::new(image_path);
        let resolved = if candidate.exists() {
            candidate.to_path_buf()
        } else {
            self.output_dir.join(image_path)
        };

        if !resolved.exists() {
            return Err(SculptError::NotFound(format!(
                "image not found: {}",
                image_path
            )));
        }

        image::open(&resolved)
            .map_err(|e| SculptError::Image(format!("Failed to load image {}: {}", image_path, e)))
    }
}
