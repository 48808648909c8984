//! Shared server state

use sculpt_core::{Result, SculptError};
use sculpt_gen::{Pipeline, SculptConfig};
use std::path::{Path, PathBuf};

pub struct AppState {
    pipeline: Pipeline,
}

impl AppState {
    pub fn new<P: AsRef<Path>>(config: SculptConfig, output_dir: P) -> Result<Self> {
        let pipeline = Pipeline::new(config, output_dir)?;
        Ok(Self { pipeline })
    }

    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    /// Model to use when a request omits one
    pub fn default_image_model(&self) -> String {
        self.pipeline.config().generation.default_image_model.clone()
    }

    pub fn default_three_d_model(&self) -> String {
        self.pipeline.config().generation.default_three_d_model.clone()
    }

    /// Resolve a requested file path against the output directory.
    ///
    /// Absent files are not-found; anything resolving outside the output
    /// root is denied.
    pub fn resolve_file(&self, raw: &str) -> Result<PathBuf> {
        let candidate = self.pipeline.output_dir().join(raw);
        if !candidate.exists() {
            return Err(SculptError::NotFound(format!("file not found: {}", raw)));
        }

        let resolved = candidate.canonicalize()?;
        let root = self.pipeline.output_dir().canonicalize()?;
        if !resolved.starts_with(&root) {
            return Err(SculptError::Forbidden(
                "path escapes the output directory".to_string(),
            ));
        }

        Ok(resolved)
    }
}
