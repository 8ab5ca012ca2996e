use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};

use crate::{query::SCAN_LIMIT, records::EMBEDDING_DIM};

const CONFIG_FILE: &str = "config.yaml";

const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:5000";
const DEFAULT_LLM_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_CHAT_MODEL: &str = "gpt-3.5-turbo";
const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-ada-002";

/// Hosted language model settings. The api key only ever comes from
/// `OPENAI_API_KEY`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(default = "default_llm_base_url")]
    pub base_url: String,

    #[serde(default = "default_chat_model")]
    pub chat_model: String,

    /// Must produce vectors of `index.dimension` components.
    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,

    #[serde(skip)]
    pub api_key: Option<String>,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: default_llm_base_url(),
            chat_model: default_chat_model(),
            embedding_model: default_embedding_model(),
            api_key: None,
        }
    }
}

/// Vector index settings. The api key only ever comes from
/// `PINECONE_API_KEY`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct IndexConfig {
    /// Index host, e.g. `knowledge-pin-abc123.svc.pinecone.io`.
    #[serde(default)]
    pub host: String,

    #[serde(default)]
    pub namespace: String,

    #[serde(default = "default_dimension")]
    pub dimension: usize,

    /// Maximum number of records returned by list and item scans
    #[serde(default = "default_scan_limit")]
    pub scan_limit: usize,

    #[serde(skip)]
    pub api_key: Option<String>,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            host: String::new(),
            namespace: String::new(),
            dimension: default_dimension(),
            scan_limit: default_scan_limit(),
            api_key: None,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,

    /// Allow cross-origin requests from the browser extension and web UI.
    #[serde(default = "default_true")]
    pub cors: bool,

    #[serde(default)]
    pub llm: LlmConfig,

    #[serde(default)]
    pub index: IndexConfig,

    #[serde(skip_serializing, skip_deserializing)]
    base_path: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            cors: true,
            llm: LlmConfig::default(),
            index: IndexConfig::default(),
            base_path: PathBuf::new(),
        }
    }
}

fn default_listen_addr() -> String {
    DEFAULT_LISTEN_ADDR.to_string()
}

fn default_true() -> bool {
    true
}

fn default_llm_base_url() -> String {
    DEFAULT_LLM_BASE_URL.to_string()
}

fn default_chat_model() -> String {
    DEFAULT_CHAT_MODEL.to_string()
}

fn default_embedding_model() -> String {
    DEFAULT_EMBEDDING_MODEL.to_string()
}

fn default_dimension() -> usize {
    EMBEDDING_DIM
}

fn default_scan_limit() -> usize {
    SCAN_LIMIT
}

impl Config {
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.index.dimension == 0 {
            bail!("index.dimension must be greater than 0");
        }

        if self.index.scan_limit == 0 {
            bail!("index.scan_limit must be greater than 0");
        }

        url::Url::parse(&self.llm.base_url)
            .with_context(|| format!("llm.base_url is not a valid url: {}", self.llm.base_url))?;

        if self.listen_addr.parse::<std::net::SocketAddr>().is_err() {
            bail!("listen_addr is not a socket address: {}", self.listen_addr);
        }

        Ok(())
    }

    /// Loads `config.yaml` from `base_path`, writing defaults on first run,
    /// then applies environment overrides.
    pub fn load_with(base_path: &Path) -> anyhow::Result<Self> {
        std::fs::create_dir_all(base_path)
            .with_context(|| format!("failed to create {}", base_path.display()))?;

        let path = base_path.join(CONFIG_FILE);

        // create new if does not exist
        if !path.exists() {
            std::fs::write(&path, serde_yml::to_string(&Self::default())?)
                .with_context(|| format!("failed to write {}", path.display()))?;
        }

        let config_str = std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let mut config: Self = serde_yml::from_str(&config_str).context("config is malformed")?;

        config.base_path = base_path.to_path_buf();

        // resave in case config version needs an upgrade
        if config_str != serde_yml::to_string(&config)? {
            config.save()?;
        }

        config.apply_env();
        config.validate()?;

        Ok(config)
    }

    fn apply_env(&mut self) {
        self.apply_vars(|name| std::env::var(name).ok());
    }

    fn apply_vars(&mut self, var: impl Fn(&str) -> Option<String>) {
        let non_empty = |name: &str| var(name).filter(|v| !v.trim().is_empty());

        if let Some(key) = non_empty("OPENAI_API_KEY") {
            self.llm.api_key = Some(key);
        }
        if let Some(key) = non_empty("PINECONE_API_KEY") {
            self.index.api_key = Some(key);
        }
        if let Some(host) = non_empty("KPIN_INDEX_HOST") {
            self.index.host = host;
        }
        if let Some(addr) = non_empty("KPIN_LISTEN_ADDR") {
            self.listen_addr = addr;
        }
    }

    pub fn save(&self) -> anyhow::Result<()> {
        let path = self.base_path.join(CONFIG_FILE);
        std::fs::write(&path, serde_yml::to_string(&self)?)
            .with_context(|| format!("failed to write {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_load_writes_defaults() {
        let tmp = tempfile::tempdir().unwrap();
        let config = Config::load_with(tmp.path()).unwrap();

        assert!(tmp.path().join("config.yaml").exists());
        assert_eq!(config.index.dimension, 1536);
        assert_eq!(config.index.scan_limit, 100);
        assert_eq!(config.llm.chat_model, "gpt-3.5-turbo");
        assert!(config.cors);
    }

    #[test]
    fn test_partial_file_is_completed_with_defaults() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(
            tmp.path().join("config.yaml"),
            "index:\n  host: knowledge-pin.svc.pinecone.io\n  namespace: me\n",
        )
        .unwrap();

        let config = Config::load_with(tmp.path()).unwrap();
        assert_eq!(config.index.host, "knowledge-pin.svc.pinecone.io");
        assert_eq!(config.index.namespace, "me");
        assert_eq!(config.index.dimension, 1536);

        let saved = std::fs::read_to_string(tmp.path().join("config.yaml")).unwrap();
        assert!(saved.contains("scan_limit"));
    }

    #[test]
    fn test_secrets_are_never_written() {
        let tmp = tempfile::tempdir().unwrap();
        let mut config = Config::load_with(tmp.path()).unwrap();
        config.llm.api_key = Some("sk-secret".to_string());
        config.index.api_key = Some("pc-secret".to_string());
        config.save().unwrap();

        let saved = std::fs::read_to_string(tmp.path().join("config.yaml")).unwrap();
        assert!(!saved.contains("secret"));
    }

    #[test]
    fn test_env_overrides() {
        let mut config = Config::default();
        config.apply_vars(|name| match name {
            "OPENAI_API_KEY" => Some("sk-1".to_string()),
            "KPIN_INDEX_HOST" => Some("host.example".to_string()),
            "KPIN_LISTEN_ADDR" => Some("  ".to_string()),
            _ => None,
        });

        assert_eq!(config.llm.api_key.as_deref(), Some("sk-1"));
        assert_eq!(config.index.host, "host.example");
        assert_eq!(config.index.api_key, None);
        assert_eq!(config.listen_addr, DEFAULT_LISTEN_ADDR);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = Config::default();
        config.index.dimension = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.llm.base_url = "not a url".to_string();
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.listen_addr = "localhost".to_string();
        assert!(config.validate().is_err());

        assert!(Config::default().validate().is_ok());
    }
}
