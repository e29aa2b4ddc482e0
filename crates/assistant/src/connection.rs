//! Shared service session and re-authentication.
//!
//! A [`Session`] bundles the search and completion clients built from one
//! set of credentials and is never modified after construction. The
//! [`ConnectionHandle`] swaps whole sessions under a write lock, so a request
//! holding the old `Arc<Session>` keeps a consistent pair of clients while
//! a reconnect is in flight.

use crate::credentials::resolve_token;
use crate::retrieval::{HttpSearchService, SearchService};
use async_trait::async_trait;
use medrag_core::config::{AuthConfig, CompletionConfig};
use medrag_core::{AppConfig, AppResult};
use medrag_llm::{create_client, ClientOptions, LlmClient};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

/// Clients for the managed services, bound to one credential.
pub struct Session {
    generation: u64,
    pub search: Arc<dyn SearchService>,
    pub completion: Arc<dyn LlmClient>,
}

impl Session {
    pub fn new(search: Arc<dyn SearchService>, completion: Arc<dyn LlmClient>) -> Self {
        Self {
            generation: 0,
            search,
            completion,
        }
    }

    /// How many times the handle has (re)established a session.
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// Builds fresh sessions, performing authentication.
#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(&self) -> AppResult<Session>;
}

/// Connects to the HTTP search and completion services.
pub struct HttpConnector {
    search_endpoint: String,
    completion: CompletionConfig,
    auth: AuthConfig,
}

impl HttpConnector {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            search_endpoint: config.search.endpoint.clone(),
            completion: config.completion.clone(),
            auth: config.auth.clone(),
        }
    }
}

#[async_trait]
impl Connector for HttpConnector {
    async fn connect(&self) -> AppResult<Session> {
        let timeout = Duration::from_secs(self.completion.timeout_secs);
        let token = resolve_token(&self.auth, timeout).await?;

        let search = HttpSearchService::new(self.search_endpoint.clone(), token.clone(), timeout)?;
        let completion = create_client(
            &self.completion.provider,
            &ClientOptions {
                endpoint: self.completion.endpoint.clone(),
                token,
                timeout,
            },
        )?;

        Ok(Session::new(Arc::new(search), completion))
    }
}

/// Process-wide holder of the current session.
///
/// The first session is built on first use, so work that never touches the
/// managed services runs even while authentication is down.
pub struct ConnectionHandle {
    connector: Arc<dyn Connector>,
    session: RwLock<Option<Arc<Session>>>,
}

impl ConnectionHandle {
    pub fn new(connector: Arc<dyn Connector>) -> Self {
        Self {
            connector,
            session: RwLock::new(None),
        }
    }

    /// The session new work should use, connecting if none exists yet.
    pub async fn current(&self) -> AppResult<Arc<Session>> {
        if let Some(session) = self.session.read().await.as_ref() {
            return Ok(session.clone());
        }

        let mut slot = self.session.write().await;
        if let Some(session) = slot.as_ref() {
            return Ok(session.clone());
        }

        let mut session = self.connector.connect().await?;
        session.generation = 1;
        let session = Arc::new(session);
        *slot = Some(session.clone());

        tracing::debug!("Established service session");
        Ok(session)
    }

    /// Replace `stale` with a freshly authenticated session.
    ///
    /// Only one caller re-authenticates per stale session; callers that
    /// arrive after the swap get the session that replaced it.
    pub async fn reconnect(&self, stale: &Session) -> AppResult<Arc<Session>> {
        let mut slot = self.session.write().await;

        if let Some(current) = slot.as_ref() {
            if current.generation != stale.generation {
                tracing::debug!(
                    "Session already replaced (generation {}), skipping re-authentication",
                    current.generation
                );
                return Ok(current.clone());
            }
        }

        let mut fresh = self.connector.connect().await?;
        fresh.generation = stale.generation + 1;
        let fresh = Arc::new(fresh);
        *slot = Some(fresh.clone());

        tracing::info!("Re-established service session (generation {})", fresh.generation);
        Ok(fresh)
    }
}
