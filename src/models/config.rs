use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::search::OutputFormat;
use super::task::EmbeddingTask;
use crate::error::ConfigError;

pub const DEFAULT_EMBEDDING_URL: &str = "http://localhost:8080";
pub const DEFAULT_EMBEDDING_MODEL: &str = "jinaai/jina-embeddings-v3";
pub const DEFAULT_QDRANT_URL: &str = "http://localhost:6334";
pub const DEFAULT_ARTIFACTS_DIR: &str = "artifacts";
pub const DEFAULT_MEMORY_COLLECTION: &str = "user_memories";

const APP_DIR: &str = "chunkvec";
const PROJECT_DIR: &str = ".chunkvec";
const CONFIG_FILE: &str = "config.toml";

/// Environment variables that override file configuration.
pub const ENV_EMBEDDING_URL: &str = "CHUNKVEC_EMBEDDING_URL";
pub const ENV_EMBEDDING_API_KEY: &str = "CHUNKVEC_EMBEDDING_API_KEY";
pub const ENV_QDRANT_URL: &str = "CHUNKVEC_QDRANT_URL";
pub const ENV_QDRANT_API_KEY: &str = "CHUNKVEC_QDRANT_API_KEY";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub embedding: EmbeddingConfig,

    #[serde(default)]
    pub vector_store: VectorStoreConfig,

    #[serde(default)]
    pub paths: PathsConfig,

    #[serde(default)]
    pub output: OutputConfig,
}

/// Configuration together with the files it was assembled from.
#[derive(Debug, Clone, Default)]
pub struct ResolvedConfig {
    pub config: Config,
    pub global_path: Option<PathBuf>,
    pub project_path: Option<PathBuf>,
}

impl Config {
    pub fn global_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join(APP_DIR).join(CONFIG_FILE))
    }

    pub fn project_config_dir() -> Option<PathBuf> {
        std::env::current_dir().ok().map(|p| p.join(PROJECT_DIR))
    }

    pub fn project_path() -> Option<PathBuf> {
        Self::project_config_dir().map(|p| p.join(CONFIG_FILE))
    }

    /// Load defaults, then the global file, then the project file, then
    /// environment overrides.
    pub fn load() -> Result<ResolvedConfig, ConfigError> {
        let global = Self::global_path().filter(|p| p.exists());
        let project = Self::project_path().filter(|p| p.exists());

        let mut config = Self::load_layers(global.as_deref(), project.as_deref())?;
        config.apply_env_overrides(|key| std::env::var(key).ok());

        Ok(ResolvedConfig {
            config,
            global_path: global,
            project_path: project,
        })
    }

    /// Merge the given TOML files in order (later files win) on top of the
    /// built-in defaults.
    pub fn load_layers(global: Option<&Path>, project: Option<&Path>) -> Result<Self, ConfigError> {
        let mut merged = toml::Value::Table(toml::map::Map::new());

        for path in [global, project].into_iter().flatten() {
            let content = std::fs::read_to_string(path)?;
            let layer: toml::Value = toml::from_str(&content)?;
            merge_toml(&mut merged, layer);
        }

        let config: Config = merged.try_into()?;
        config.validate()?;
        Ok(config)
    }

    pub fn apply_env_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup(ENV_EMBEDDING_URL).filter(|v| !v.is_empty()) {
            self.embedding.url = url;
        }
        if let Some(key) = lookup(ENV_EMBEDDING_API_KEY).filter(|v| !v.is_empty()) {
            self.embedding.api_key = Some(key);
        }
        if let Some(url) = lookup(ENV_QDRANT_URL).filter(|v| !v.is_empty()) {
            self.vector_store.url = url;
        }
        if let Some(key) = lookup(ENV_QDRANT_API_KEY).filter(|v| !v.is_empty()) {
            self.vector_store.api_key = Some(key);
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.embedding.batch_size == 0 {
            return Err(ConfigError::ValidationError(
                "embedding.batch_size must be at least 1".to_string(),
            ));
        }
        if self.embedding.truncate_dim == Some(0) {
            return Err(ConfigError::ValidationError(
                "embedding.truncate_dim must be positive".to_string(),
            ));
        }
        if self.embedding.model.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "embedding.model must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    pub fn init_global() -> Result<PathBuf, ConfigError> {
        let path = Self::global_path().ok_or_else(|| {
            ConfigError::PathError("could not determine config directory".to_string())
        })?;
        Self::default().save_to(&path)?;
        Ok(path)
    }

    pub fn init_project() -> Result<PathBuf, ConfigError> {
        let path = Self::project_path().ok_or_else(|| {
            ConfigError::PathError("could not determine project directory".to_string())
        })?;
        Self::default().save_to(&path)?;
        Ok(path)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn vector_stores_dir(&self) -> PathBuf {
        self.paths.artifacts_dir.join("vector_stores")
    }

    pub fn visualizations_dir(&self) -> PathBuf {
        self.paths.artifacts_dir.join("visualizations")
    }
}

/// Recursively merge `overlay` into `base`; tables merge key by key, any
/// other value replaces.
pub fn merge_toml(base: &mut toml::Value, overlay: toml::Value) {
    match (base, overlay) {
        (toml::Value::Table(base_table), toml::Value::Table(overlay_table)) => {
            for (key, value) in overlay_table {
                match base_table.get_mut(&key) {
                    Some(existing) => merge_toml(existing, value),
                    None => {
                        base_table.insert(key, value);
                    }
                }
            }
        }
        (base, overlay) => *base = overlay,
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    #[serde(default = "default_embedding_url")]
    pub url: String,

    #[serde(default = "default_embedding_model")]
    pub model: String,

    #[serde(default)]
    pub task: EmbeddingTask,

    /// Matryoshka prefix length; `None` keeps the full dimension.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub truncate_dim: Option<u32>,

    #[serde(default = "default_max_length")]
    pub max_length: u32,

    #[serde(default = "default_batch_size")]
    pub batch_size: u32,

    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Local `tokenizer.json` used to count tokens when the service does not
    /// report usage.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tokenizer_path: Option<PathBuf>,
}

fn default_embedding_url() -> String {
    DEFAULT_EMBEDDING_URL.to_string()
}

fn default_embedding_model() -> String {
    DEFAULT_EMBEDDING_MODEL.to_string()
}

fn default_max_length() -> u32 {
    8192
}

fn default_batch_size() -> u32 {
    32
}

fn default_timeout() -> u64 {
    120
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            url: default_embedding_url(),
            model: default_embedding_model(),
            task: EmbeddingTask::default(),
            truncate_dim: None,
            max_length: default_max_length(),
            batch_size: default_batch_size(),
            timeout_secs: default_timeout(),
            api_key: None,
            tokenizer_path: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorStoreConfig {
    #[serde(default = "default_qdrant_url")]
    pub url: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

fn default_qdrant_url() -> String {
    DEFAULT_QDRANT_URL.to_string()
}

impl Default for VectorStoreConfig {
    fn default() -> Self {
        Self {
            url: default_qdrant_url(),
            api_key: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    #[serde(default = "default_artifacts_dir")]
    pub artifacts_dir: PathBuf,
}

fn default_artifacts_dir() -> PathBuf {
    PathBuf::from(DEFAULT_ARTIFACTS_DIR)
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            artifacts_dir: default_artifacts_dir(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default)]
    pub default_format: OutputFormat,
}

/// Vectorizer run file, the JSON document consumed by `vectorize --config`.
///
/// Unknown keys (such as `device`) are ignored; the embedding service owns
/// device placement.
#[derive(Debug, Clone, Deserialize)]
pub struct RunConfig {
    pub input: PathBuf,
    #[serde(default)]
    pub db: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub task: Option<EmbeddingTask>,
    #[serde(default)]
    pub truncate_dim: Option<u32>,
    #[serde(default)]
    pub max_length: Option<u32>,
    #[serde(default)]
    pub batch_size: Option<u32>,
}

impl RunConfig {
    /// Read a run file; `.toml` files are parsed as TOML, everything else as
    /// JSON.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::PathError(format!(
                "configuration file not found at {}",
                path.display()
            )));
        }
        let content = std::fs::read_to_string(path)?;
        let is_toml = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("toml"));
        if is_toml {
            Ok(toml::from_str(&content)?)
        } else {
            Ok(serde_json::from_str(&content)?)
        }
    }

    /// Overlay the run file onto a loaded configuration.
    pub fn apply_to(&self, config: &mut Config) {
        match self.db {
            Some(ref db) if is_http_url(db) => config.vector_store.url = db.clone(),
            Some(ref db) => {
                tracing::warn!(db = %db, "ignoring run file db that is not an http(s) URL");
            }
            None => {}
        }
        if let Some(ref model) = self.model {
            config.embedding.model = model.clone();
        }
        if let Some(task) = self.task {
            config.embedding.task = task;
        }
        if self.truncate_dim.is_some() {
            config.embedding.truncate_dim = self.truncate_dim;
        }
        if let Some(max_length) = self.max_length {
            config.embedding.max_length = max_length;
        }
        if let Some(batch_size) = self.batch_size {
            config.embedding.batch_size = batch_size;
        }
    }
}

fn is_http_url(value: &str) -> bool {
    value.starts_with("http://") || value.starts_with("https://")
}
