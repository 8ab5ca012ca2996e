use crate::{
    app::{backend::AppBackend, remote::AppRemote, service::CurationService},
    config::Config,
    index::PineconeIndex,
    llm::OpenAiClient,
};
use anyhow::{bail, Context, Result};
use homedir::my_home;
use std::path::PathBuf;
use std::sync::Arc;

/// Application factory for creating and configuring application components
pub struct AppFactory;

impl AppFactory {
    /// Backend used by cli commands. `KPIN_ADDR` points them at a running
    /// daemon, otherwise they talk to the hosted services directly.
    pub fn create_backend() -> Result<Arc<dyn AppBackend>> {
        if let Ok(addr) = std::env::var("KPIN_ADDR") {
            log::info!("Using remote backend: {}", addr);
            return Ok(Arc::new(AppRemote::new(&addr)));
        }

        let config = Self::create_config()?;
        Ok(Arc::new(Self::create_service(&config)?))
    }

    /// Wire the service to the hosted index and language model.
    pub fn create_service(config: &Config) -> Result<CurationService> {
        if config.index.host.is_empty() {
            bail!("index.host is not configured (set it in config.yaml or KPIN_INDEX_HOST)");
        }

        let index_key = config
            .index
            .api_key
            .as_deref()
            .context("PINECONE_API_KEY is not set")?;

        if config.llm.api_key.is_none() {
            log::warn!("OPENAI_API_KEY is not set, llm requests will be unauthenticated");
        }

        let index = PineconeIndex::new(
            &config.index.host,
            index_key,
            &config.index.namespace,
            config.index.dimension,
        );
        let llm = OpenAiClient::new(&config.llm);

        Ok(CurationService::new(
            Arc::new(index),
            Arc::new(llm),
            config.into(),
        ))
    }

    pub fn create_config() -> Result<Config> {
        let base_path = Self::get_base_path()?;
        Config::load_with(&base_path)
            .with_context(|| format!("failed to load config from {}", base_path.display()))
    }

    /// Get the base path for the application
    fn get_base_path() -> Result<PathBuf> {
        if let Ok(base_path) = std::env::var("KPIN_BASE_PATH") {
            return Ok(PathBuf::from(base_path));
        }

        let home = my_home()
            .context("Could not determine home directory")?
            .context("Home directory path is empty")?;

        Ok(home.join(".local/share/kpin"))
    }
}
