//! Sculpt Gen - text-to-3D generation pipeline
//!
//! Provides a pluggable provider framework for turning a text prompt into a
//! downloadable 3D asset: an image-generation stage (NanoBanana), an
//! image-to-3D stage (Trellis, HunYuan3D), and the artifact materializer
//! that normalizes heterogeneous provider outputs into canonical files.

pub mod config;
pub mod materialize;
pub mod output;
pub mod pipeline;
pub mod provider;
pub mod providers;

pub use config::SculptConfig;
pub use materialize::{ArtifactDescriptor, Fetcher, KeyRule, Materializer};
pub use output::{OutputValue, RawOutput};
pub use pipeline::{ImageArtifact, Pipeline, PipelineResult};
pub use provider::{ImageProvider, ThreeDProvider};
