//! Layered configuration system
//!
//! Config is loaded with three layers of precedence (highest wins):
//! 1. Environment variables: `GOOGLE_API_KEY`, `REPLICATE_API_KEY`
//! 2. Project-local: `.sculpt/config.toml`
//! 3. Global: `~/.sculpt/config.toml`
//!
//! Credentials are resolved once here and passed into adapter
//! constructors; business logic never reads the environment directly.

use crate::materialize::KeyRule;
use sculpt_core::{Result, SculptError};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Env var names for each provider service's credential
const ENV_KEYS: &[(&str, &str)] = &[
    ("gemini", "GOOGLE_API_KEY"),
    ("replicate", "REPLICATE_API_KEY"),
];

/// Provider-specific configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub api_url: Option<String>,
}

/// Generation defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    #[serde(default = "default_image_model")]
    pub default_image_model: String,
    #[serde(default = "default_three_d_model")]
    pub default_three_d_model: String,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            default_image_model: default_image_model(),
            default_three_d_model: default_three_d_model(),
        }
    }
}

fn default_image_model() -> String {
    "nanobanana".to_string()
}
fn default_three_d_model() -> String {
    "trellis".to_string()
}

/// Materializer tuning: providers have renamed their preferred output key
/// across versions, so the priority list can be overridden without a
/// rebuild
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MaterializeConfig {
    #[serde(default)]
    pub priority: Option<Vec<KeyRule>>,
}

/// Top-level config file structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SculptConfigFile {
    #[serde(default)]
    pub providers: HashMap<String, ProviderConfig>,
    #[serde(default)]
    pub generation: GenerationConfig,
    #[serde(default)]
    pub materialize: MaterializeConfig,
}

/// Resolved configuration with environment variable overrides applied
#[derive(Debug, Clone)]
pub struct SculptConfig {
    pub providers: HashMap<String, ProviderConfig>,
    pub generation: GenerationConfig,
    pub materialize: MaterializeConfig,
}

impl SculptConfig {
    /// Load config with layered precedence: global < project < env vars
    pub fn load() -> Result<Self> {
        let mut config = SculptConfigFile::default();

        if let Some(global_path) = Self::global_config_path() {
            if global_path.exists() {
                let global = Self::load_file(&global_path)?;
                Self::merge_into(&mut config, global);
            }
        }

        let local_path = PathBuf::from(".sculpt/config.toml");
        if local_path.exists() {
            let local = Self::load_file(&local_path)?;
            Self::merge_into(&mut config, local);
        }

        Self::apply_env_overrides(&mut config);

        Ok(Self::from_file(config))
    }

    /// Load config from a specific file path only (for testing)
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let mut config = Self::load_file(path)?;
        Self::apply_env_overrides(&mut config);
        Ok(Self::from_file(config))
    }

    /// An empty config with defaults (no credentials)
    pub fn empty() -> Self {
        Self::from_file(SculptConfigFile::default())
    }

    /// Get API key for a provider service
    pub fn api_key(&self, service: &str) -> Option<&str> {
        self.providers.get(service).and_then(|p| p.api_key.as_deref())
    }

    /// Get API URL override for a provider service
    pub fn api_url(&self, service: &str) -> Option<&str> {
        self.providers.get(service).and_then(|p| p.api_url.as_deref())
    }

    /// Require an API key, failing with a configuration error naming the
    /// env var to set
    pub fn require_api_key(&self, service: &str) -> Result<&str> {
        self.api_key(service).ok_or_else(|| {
            let env_name = ENV_KEYS
                .iter()
                .find(|(s, _)| *s == service)
                .map(|(_, env)| *env)
                .unwrap_or("the provider api_key");
            SculptError::Configuration(format!(
                "{} API key not configured. Set {} or add it to .sculpt/config.toml",
                service, env_name
            ))
        })
    }

    /// Materializer priority-key override, if configured
    pub fn materialize_priority(&self) -> Option<&[KeyRule]> {
        self.materialize.priority.as_deref()
    }

    fn from_file(file: SculptConfigFile) -> Self {
        Self {
            providers: file.providers,
            generation: file.generation,
            materialize: file.materialize,
        }
    }

    fn global_config_path() -> Option<PathBuf> {
        dirs::home_dir().map(|h| h.join(".sculpt").join("config.toml"))
    }

    fn load_file(path: &Path) -> Result<SculptConfigFile> {
        let content = std::fs::read_to_string(path)?;
        let config: SculptConfigFile = toml::from_str(&content).map_err(|e| {
            SculptError::Configuration(format!(
                "Failed to parse config {}: {}",
                path.display(),
                e
            ))
        })?;
        Ok(config)
    }

    fn merge_into(base: &mut SculptConfigFile, overlay: SculptConfigFile) {
        for (name, provider) in overlay.providers {
            let entry = base.providers.entry(name).or_default();
            if provider.api_key.is_some() {
                entry.api_key = provider.api_key;
            }
            if provider.api_url.is_some() {
                entry.api_url = provider.api_url;
            }
        }

        if overlay.generation.default_image_model != default_image_model() {
            base.generation.default_image_model = overlay.generation.default_image_model;
        }
        if overlay.generation.default_three_d_model != default_three_d_model() {
            base.generation.default_three_d_model = overlay.generation.default_three_d_model;
        }
        if overlay.materialize.priority.is_some() {
            base.materialize.priority = overlay.materialize.priority;
        }
    }

    fn apply_env_overrides(config: &mut SculptConfigFile) {
        for (service, env_name) in ENV_KEYS {
            if let Ok(key) = std::env::var(env_name) {
                let entry = config.providers.entry(service.to_string()).or_default();
                entry.api_key = Some(key);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn temp_config(content: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("sculpt_config_test_{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.toml");
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(content.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_load_config_from_file() {
        // REPLICATE_API_KEY belongs to test_env_var_override, which runs
        // in parallel; only touch providers whose env var no other test
        // sets.
        std::env::remove_var("GOOGLE_API_KEY");

        let config_str = r#"
[providers.gemini]
api_key = "test-key-123"
api_url = "https://api.example.com/gemini"

[providers.openai]
api_key = "sk-test"

[generation]
default_three_d_model = "hunyuan3d"
"#;
        let path = temp_config(config_str);
        let config = SculptConfig::load_from_file(&path).unwrap();

        assert_eq!(config.api_key("gemini"), Some("test-key-123"));
        assert_eq!(config.api_url("gemini"), Some("https://api.example.com/gemini"));
        // No env override is wired for this provider; the file value
        // passes through untouched.
        assert_eq!(config.api_key("openai"), Some("sk-test"));
        assert_eq!(config.generation.default_three_d_model, "hunyuan3d");
        assert_eq!(config.generation.default_image_model, "nanobanana");

        std::fs::remove_file(&path).ok();
        std::fs::remove_dir(path.parent().unwrap()).ok();
    }

    #[test]
    fn test_env_var_override() {
        let config_str = r#"
[providers.replicate]
api_key = "file-key"
"#;
        let path = temp_config(config_str);

        std::env::set_var("REPLICATE_API_KEY", "env-key-override");

        let config = SculptConfig::load_from_file(&path).unwrap();
        assert_eq!(config.api_key("replicate"), Some("env-key-override"));

        std::env::remove_var("REPLICATE_API_KEY");
        std::fs::remove_file(&path).ok();
        std::fs::remove_dir(path.parent().unwrap()).ok();
    }

    #[test]
    fn test_missing_key_is_configuration_error() {
        let config = SculptConfig::empty();
        let err = config.require_api_key("replicate").unwrap_err();
        assert!(matches!(err, SculptError::Configuration(_)));
        assert!(err.to_string().contains("REPLICATE_API_KEY"));
    }

    #[test]
    fn test_materialize_priority_parsed() {
        let config_str = r#"
[[materialize.priority]]
key = "model_file"
extension = "ply"

[[materialize.priority]]
key = "output"
extension = "ply"
"#;
        let path = temp_config(config_str);
        let config = SculptConfig::load_from_file(&path).unwrap();

        let priority = config.materialize_priority().unwrap();
        assert_eq!(priority.len(), 2);
        assert_eq!(priority[0], KeyRule::new("model_file", "ply"));

        std::fs::remove_file(&path).ok();
        std::fs::remove_dir(path.parent().unwrap()).ok();
    }
}
