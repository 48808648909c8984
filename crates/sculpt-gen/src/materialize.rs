//! Artifact materialization
//!
//! Reduces a raw, heterogeneously-shaped provider output to exactly one
//! canonical artifact on disk. Providers have renamed their preferred
//! output key and reassigned its extension across versions, so key
//! priority is data (configurable) rather than code: the scan order is
//! deterministic and never depends on mapping iteration order.

use crate::output::{OutputValue, RawOutput};
use sculpt_core::{ArtifactId, Result, SculptError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

const DOWNLOAD_TIMEOUT_SECS: u64 = 120;

/// A canonical descriptor for a persisted 3D artifact
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactDescriptor {
    pub id: ArtifactId,
    /// File extension without the dot ("glb", "ply")
    pub format: String,
    /// Always "file"; kept for forward compatibility with remote storage
    pub location: String,
    /// Filename relative to the output directory
    pub path: String,
}

/// One entry in the priority-key list: a mapping key the provider may use,
/// and the extension its payload should be persisted with
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyRule {
    pub key: String,
    pub extension: String,
}

impl KeyRule {
    pub fn new(key: &str, extension: &str) -> Self {
        Self {
            key: key.to_string(),
            extension: extension.to_string(),
        }
    }
}

/// The priority order observed against the current provider version:
/// the textured mesh key first, then the gaussian point cloud, then the
/// generic keys older versions used.
pub fn default_priority() -> Vec<KeyRule> {
    vec![
        KeyRule::new("model_file", "glb"),
        KeyRule::new("gaussian_ply", "ply"),
        KeyRule::new("ply", "ply"),
        KeyRule::new("output", "ply"),
    ]
}

/// Seam for URL downloads, so tests can count or deny fetches
pub trait Fetcher: Send + Sync {
    fn fetch(&self, url: &str) -> Result<Vec<u8>>;
}

/// Production fetcher with a bounded timeout
pub struct HttpFetcher;

impl Fetcher for HttpFetcher {
    fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        let config = ureq::Agent::config_builder()
            .timeout_global(Some(Duration::from_secs(DOWNLOAD_TIMEOUT_SECS)))
            .build();
        let agent: ureq::Agent = config.into();

        let response = agent
            .get(url)
            .call()
            .map_err(|e| SculptError::Provider(format!("Failed to download artifact: {}", e)))?;

        let mut reader = response.into_body().into_reader();
        let mut bytes = Vec::new();
        std::io::Read::read_to_end(&mut reader, &mut bytes)
            .map_err(|e| SculptError::Provider(format!("Failed to read artifact data: {}", e)))?;
        Ok(bytes)
    }
}

/// Normalizes raw provider outputs into canonical artifacts on disk
pub struct Materializer {
    output_dir: PathBuf,
    priority: Vec<KeyRule>,
    fetcher: Box<dyn Fetcher>,
}

impl Materializer {
    pub fn new<P: AsRef<Path>>(output_dir: P) -> Self {
        Self {
            output_dir: output_dir.as_ref().to_path_buf(),
            priority: default_priority(),
            fetcher: Box::new(HttpFetcher),
        }
    }

    /// Replace the priority-key list (from config)
    pub fn with_priority(mut self, priority: Vec<KeyRule>) -> Self {
        self.priority = priority;
        self
    }

    /// Replace the URL fetcher (for testing)
    pub fn with_fetcher(mut self, fetcher: Box<dyn Fetcher>) -> Self {
        self.fetcher = fetcher;
        self
    }

    /// Reduce a raw provider output to one persisted artifact.
    ///
    /// First-match-wins, in this order:
    /// 1. sequence: first binary element, persisted as `.ply`
    /// 2. mapping: priority keys in list order (binary payload, or a URL
    ///    whose content matches the key's extension; a failed download
    ///    continues the scan)
    /// 3. mapping fallback: first binary value as `.ply`, else first
    ///    http(s) URL containing `.ply`
    pub fn materialize(&self, raw: RawOutput) -> Result<ArtifactDescriptor> {
        match raw {
            RawOutput::Sequence(items) => {
                for item in &items {
                    if let Some(bytes) = item.as_bytes() {
                        return self.persist(bytes, "ply");
                    }
                }
                Err(SculptError::NoArtifactFound(
                    "no binary payloads in sequence output".to_string(),
                ))
            }
            RawOutput::Other(value) => Err(SculptError::NoArtifactFound(format!(
                "expected a sequence or mapping of outputs, got: {}",
                value
            ))),
            RawOutput::Mapping(entries) => {
                for rule in &self.priority {
                    let Some(value) = entries.get(&rule.key) else {
                        continue;
                    };
                    match value {
                        OutputValue::Bytes(bytes) => {
                            return self.persist(bytes, &rule.extension);
                        }
                        OutputValue::Text(text)
                            if is_http_url(text)
                                && url_matches_extension(text, &rule.extension) =>
                        {
                            match self.fetcher.fetch(text) {
                                Ok(bytes) => return self.persist(&bytes, &rule.extension),
                                Err(e) => {
                                    tracing::warn!(
                                        key = %rule.key,
                                        "download failed, continuing scan: {}",
                                        e
                                    );
                                }
                            }
                        }
                        _ => {}
                    }
                }

                // Fallback: any binary value, then any URL that looks like a
                // point cloud.
                for value in entries.values() {
                    if let Some(bytes) = value.as_bytes() {
                        return self.persist(bytes, "ply");
                    }
                }
                for value in entries.values() {
                    if let Some(text) = value.as_text() {
                        if is_http_url(text) && text.contains(".ply") {
                            match self.fetcher.fetch(text) {
                                Ok(bytes) => return self.persist(&bytes, "ply"),
                                Err(e) => {
                                    tracing::warn!(
                                        "fallback download failed, continuing scan: {}",
                                        e
                                    );
                                }
                            }
                        }
                    }
                }

                let keys: Vec<&str> = entries.keys().map(String::as_str).collect();
                Err(SculptError::NoArtifactFound(format!(
                    "no usable payload among output keys {:?}",
                    keys
                )))
            }
        }
    }

    /// Persist a payload as `<fresh-id>.<ext>` under the output directory
    fn persist(&self, bytes: &[u8], extension: &str) -> Result<ArtifactDescriptor> {
        std::fs::create_dir_all(&self.output_dir)?;

        let id = ArtifactId::generate();
        let filename = format!("{}.{}", id, extension);
        std::fs::write(self.output_dir.join(&filename), bytes)?;

        Ok(ArtifactDescriptor {
            id,
            format: extension.to_string(),
            location: "file".to_string(),
            path: filename,
        })
    }
}

fn is_http_url(s: &str) -> bool {
    s.starts_with("http://") || s.starts_with("https://")
}

/// A URL plausibly carries the expected extension if its path ends with the
/// extension token or contains it anywhere (query-string download links)
fn url_matches_extension(url: &str, extension: &str) -> bool {
    let token = format!(".{}", extension);
    let path = url.split('?').next().unwrap_or(url);
    path.ends_with(&token) || url.contains(&token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn temp_output_dir() -> PathBuf {
        let dir = std::env::temp_dir().join(format!("sculpt_mat_test_{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    /// Fetcher that counts calls and serves fixed bytes
    struct CountingFetcher {
        calls: Arc<AtomicUsize>,
        body: Vec<u8>,
    }

    impl Fetcher for CountingFetcher {
        fn fetch(&self, _url: &str) -> Result<Vec<u8>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.body.clone())
        }
    }

    /// Fetcher that fails every request
    struct FailingFetcher;

    impl Fetcher for FailingFetcher {
        fn fetch(&self, url: &str) -> Result<Vec<u8>> {
            Err(SculptError::Provider(format!("unreachable: {}", url)))
        }
    }

    fn mapping(entries: Vec<(&str, OutputValue)>) -> RawOutput {
        RawOutput::Mapping(
            entries
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect::<BTreeMap<_, _>>(),
        )
    }

    #[test]
    fn test_sequence_first_binary_persisted_as_ply() {
        let dir = temp_output_dir();
        let materializer = Materializer::new(&dir);

        let raw = RawOutput::Sequence(vec![
            OutputValue::Other(serde_json::json!(1)),
            OutputValue::Bytes(b"splat-data".to_vec()),
        ]);
        let descriptor = materializer.materialize(raw).unwrap();

        assert_eq!(descriptor.format, "ply");
        assert_eq!(descriptor.location, "file");
        let written = std::fs::read(dir.join(&descriptor.path)).unwrap();
        assert_eq!(written, b"splat-data");

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_sequence_without_binary_fails() {
        let dir = temp_output_dir();
        let materializer = Materializer::new(&dir);

        let raw = RawOutput::Sequence(vec![OutputValue::Text("not a payload".to_string())]);
        let err = materializer.materialize(raw).unwrap_err();
        assert!(matches!(err, SculptError::NoArtifactFound(_)));

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_non_mapping_fails() {
        let dir = temp_output_dir();
        let materializer = Materializer::new(&dir);

        let err = materializer
            .materialize(RawOutput::Other(serde_json::json!("bare string")))
            .unwrap_err();
        assert!(matches!(err, SculptError::NoArtifactFound(_)));

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_priority_prefers_glb_over_ply_regardless_of_map_order() {
        let dir = temp_output_dir();
        let materializer = Materializer::new(&dir);

        // BTreeMap iterates gaussian_ply before model_file; priority must
        // still pick model_file.
        let raw = mapping(vec![
            ("gaussian_ply", OutputValue::Bytes(b"point-cloud".to_vec())),
            ("model_file", OutputValue::Bytes(b"mesh-data".to_vec())),
        ]);
        let descriptor = materializer.materialize(raw).unwrap();

        assert_eq!(descriptor.format, "glb");
        let written = std::fs::read(dir.join(&descriptor.path)).unwrap();
        assert_eq!(written, b"mesh-data");

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_url_value_downloaded_when_extension_matches() {
        let dir = temp_output_dir();
        let calls = Arc::new(AtomicUsize::new(0));
        let materializer = Materializer::new(&dir).with_fetcher(Box::new(CountingFetcher {
            calls: calls.clone(),
            body: b"downloaded-mesh".to_vec(),
        }));

        let raw = mapping(vec![(
            "model_file",
            OutputValue::Text("https://cdn.example.com/out/model.glb".to_string()),
        )]);
        let descriptor = materializer.materialize(raw).unwrap();

        assert_eq!(descriptor.format, "glb");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        let written = std::fs::read(dir.join(&descriptor.path)).unwrap();
        assert_eq!(written, b"downloaded-mesh");

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_mismatched_url_not_downloaded() {
        let dir = temp_output_dir();
        let calls = Arc::new(AtomicUsize::new(0));
        let materializer = Materializer::new(&dir).with_fetcher(Box::new(CountingFetcher {
            calls: calls.clone(),
            body: Vec::new(),
        }));

        // model_file expects .glb; a .zip URL must be skipped in favor of
        // the next priority key.
        let raw = mapping(vec![
            (
                "model_file",
                OutputValue::Text("https://cdn.example.com/bundle.zip".to_string()),
            ),
            ("gaussian_ply", OutputValue::Bytes(b"point-cloud".to_vec())),
        ]);
        let descriptor = materializer.materialize(raw).unwrap();

        assert_eq!(descriptor.format, "ply");
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_failed_download_continues_scan() {
        let dir = temp_output_dir();
        let materializer = Materializer::new(&dir).with_fetcher(Box::new(FailingFetcher));

        let raw = mapping(vec![
            (
                "model_file",
                OutputValue::Text("https://cdn.example.com/model.glb".to_string()),
            ),
            ("gaussian_ply", OutputValue::Bytes(b"point-cloud".to_vec())),
        ]);
        let descriptor = materializer.materialize(raw).unwrap();

        assert_eq!(descriptor.format, "ply");
        let written = std::fs::read(dir.join(&descriptor.path)).unwrap();
        assert_eq!(written, b"point-cloud");

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_fallback_picks_unrecognized_binary_as_ply() {
        let dir = temp_output_dir();
        let materializer = Materializer::new(&dir);

        let raw = mapping(vec![(
            "some_new_key",
            OutputValue::Bytes(b"mystery-bytes".to_vec()),
        )]);
        let descriptor = materializer.materialize(raw).unwrap();

        assert_eq!(descriptor.format, "ply");

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_fallback_downloads_ply_url() {
        let dir = temp_output_dir();
        let calls = Arc::new(AtomicUsize::new(0));
        let materializer = Materializer::new(&dir).with_fetcher(Box::new(CountingFetcher {
            calls: calls.clone(),
            body: b"fallback-cloud".to_vec(),
        }));

        let raw = mapping(vec![(
            "renamed_output",
            OutputValue::Text("https://cdn.example.com/result.ply?token=abc".to_string()),
        )]);
        let descriptor = materializer.materialize(raw).unwrap();

        assert_eq!(descriptor.format, "ply");
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_fallback_continues_past_failed_ply_download() {
        let dir = temp_output_dir();

        /// Fails for one URL, serves fixed bytes for the rest
        struct FlakyFetcher {
            bad_url: &'static str,
            calls: Arc<AtomicUsize>,
        }

        impl Fetcher for FlakyFetcher {
            fn fetch(&self, url: &str) -> Result<Vec<u8>> {
                self.calls.fetch_add(1, Ordering::SeqCst);
                if url == self.bad_url {
                    Err(SculptError::Provider(format!("unreachable: {}", url)))
                } else {
                    Ok(b"second-cloud".to_vec())
                }
            }
        }

        let calls = Arc::new(AtomicUsize::new(0));
        let materializer = Materializer::new(&dir).with_fetcher(Box::new(FlakyFetcher {
            bad_url: "https://cdn.example.com/a.ply",
            calls: calls.clone(),
        }));

        // Both values land in the fallback pass; the first download fails
        // and the scan moves on to the second.
        let raw = mapping(vec![
            (
                "a_out",
                OutputValue::Text("https://cdn.example.com/a.ply".to_string()),
            ),
            (
                "b_out",
                OutputValue::Text("https://cdn.example.com/b.ply".to_string()),
            ),
        ]);
        let descriptor = materializer.materialize(raw).unwrap();

        assert_eq!(descriptor.format, "ply");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        let written = std::fs::read(dir.join(&descriptor.path)).unwrap();
        assert_eq!(written, b"second-cloud");

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_exhausted_fallback_downloads_fail_with_keys() {
        let dir = temp_output_dir();
        let materializer = Materializer::new(&dir).with_fetcher(Box::new(FailingFetcher));

        let raw = mapping(vec![(
            "renamed_output",
            OutputValue::Text("https://cdn.example.com/only.ply".to_string()),
        )]);
        let err = materializer.materialize(raw).unwrap_err();

        assert!(matches!(err, SculptError::NoArtifactFound(_)));
        assert!(err.to_string().contains("renamed_output"));

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_unusable_mapping_error_lists_keys() {
        let dir = temp_output_dir();
        let materializer = Materializer::new(&dir);

        let raw = mapping(vec![
            ("seed", OutputValue::Other(serde_json::json!(42))),
            ("status", OutputValue::Text("done".to_string())),
        ]);
        let err = materializer.materialize(raw).unwrap_err();

        let message = err.to_string();
        assert!(message.contains("seed"));
        assert!(message.contains("status"));

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_custom_priority_overrides_defaults() {
        let dir = temp_output_dir();
        let materializer = Materializer::new(&dir)
            .with_priority(vec![KeyRule::new("gaussian_ply", "ply")]);

        let raw = mapping(vec![
            ("gaussian_ply", OutputValue::Bytes(b"cloud".to_vec())),
            ("model_file", OutputValue::Bytes(b"mesh".to_vec())),
        ]);
        let descriptor = materializer.materialize(raw).unwrap();

        assert_eq!(descriptor.format, "ply");
        let written = std::fs::read(dir.join(&descriptor.path)).unwrap();
        assert_eq!(written, b"cloud");

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_url_extension_matching() {
        assert!(url_matches_extension("https://x.com/a.glb", "glb"));
        assert!(url_matches_extension("https://x.com/a.glb?sig=y", "glb"));
        assert!(url_matches_extension("https://x.com/a.ply.gz", "ply"));
        assert!(!url_matches_extension("https://x.com/a.zip", "glb"));
    }
}
