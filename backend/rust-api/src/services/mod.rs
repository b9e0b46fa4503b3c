use std::sync::Arc;

use crate::config::Config;
use crate::services::provider::{CompletionProvider, GeminiProvider};
use crate::services::store::{AssessmentStore, MongoStore};

pub struct AppState {
    pub config: Config,
    pub store: Arc<dyn AssessmentStore>,
    pub provider: Arc<dyn CompletionProvider>,
}

impl AppState {
    pub async fn new(config: Config, mongo_client: mongodb::Client) -> anyhow::Result<Self> {
        let mongo = mongo_client.database(&config.mongo_database);
        let store = Arc::new(MongoStore::new(mongo));

        tracing::info!("Verifying MongoDB connectivity...");
        tokio::time::timeout(std::time::Duration::from_secs(5), store.ping())
            .await
            .map_err(|_| anyhow::anyhow!("MongoDB ping timeout after 5s"))??;
        tracing::info!("MongoDB connection established successfully");

        let provider = Arc::new(GeminiProvider::new(&config)?);

        Ok(Self {
            config,
            store,
            provider,
        })
    }

    /// Assemble state from explicit collaborators. Tests use this to swap
    /// in fakes for the store and the completion provider.
    pub fn with_collaborators(
        config: Config,
        store: Arc<dyn AssessmentStore>,
        provider: Arc<dyn CompletionProvider>,
    ) -> Self {
        Self {
            config,
            store,
            provider,
        }
    }
}

pub mod assessment_service;
pub mod provider;
pub mod quiz_service;
pub mod store;
