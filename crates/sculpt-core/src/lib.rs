//! Sculpt Core - Foundational types for the sculpt pipeline
//!
//! This crate provides the types that all other sculpt crates depend on:
//! - `ArtifactId` - Unique identifiers for persisted artifacts
//! - Error types and Result alias

mod error;
mod id;

pub use error::{Result, SculptError};
pub use id::ArtifactId;
