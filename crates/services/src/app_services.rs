use std::sync::Arc;

use reasoning_core::model::{Difficulty, QuestionCategory};
use storage::repository::Storage;

use crate::config::ClientConfig;
use crate::error::AppServicesError;
use crate::session_client::SessionClient;
use crate::sessions::{PracticeFlow, ReviewFlow};
use crate::transport::{HttpTransport, ReqwestTransport};

/// Assembles the session layer once at startup; screens receive it by reference.
#[derive(Clone)]
pub struct AppServices {
    config: ClientConfig,
    session: Arc<SessionClient>,
}

impl AppServices {
    /// Load configuration from the environment and build SQLite-backed services.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` for invalid configuration or storage setup failures.
    pub async fn from_env() -> Result<Self, AppServicesError> {
        let config = ClientConfig::from_env()?;
        Self::new_sqlite(config).await
    }

    /// Build services talking to the real backend, persisting the credential in `SQLite`.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if storage initialization fails.
    pub async fn new_sqlite(config: ClientConfig) -> Result<Self, AppServicesError> {
        let storage = Storage::sqlite(&config.database_url).await?;
        Ok(Self::with_parts(config, Arc::new(ReqwestTransport::new()), storage).await)
    }

    /// Build services from explicit parts (tests, alternative transports).
    pub async fn with_parts(
        config: ClientConfig,
        transport: Arc<dyn HttpTransport>,
        storage: Storage,
    ) -> Self {
        let session = Arc::new(
            SessionClient::init(config.api_base_url.clone(), transport, storage.kv).await,
        );
        Self { config, session }
    }

    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    #[must_use]
    pub fn session(&self) -> Arc<SessionClient> {
        Arc::clone(&self.session)
    }

    #[must_use]
    pub fn practice(
        &self,
        category: QuestionCategory,
        difficulty: Option<Difficulty>,
    ) -> PracticeFlow {
        PracticeFlow::new(self.session(), category).with_difficulty(difficulty)
    }

    #[must_use]
    pub fn review(&self) -> ReviewFlow {
        ReviewFlow::new(self.session())
    }
}
