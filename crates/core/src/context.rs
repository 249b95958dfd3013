//! Explicitly constructed application context handed to frontends.

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;

use crate::{
    catalog::{HttpRouteSource, RouteCatalog, RouteSource},
    config::AppConfig,
    session::SessionStore,
    storage::{FileStore, KeyValueStore},
};

/// The session and catalog stores sharing one persistence adapter.
pub struct AppContext<S, R> {
    /// Settings the context was built from.
    pub config: AppConfig,
    /// Authentication state.
    pub session: SessionStore<S>,
    /// Routes and favorites.
    pub catalog: RouteCatalog<S, R>,
}

impl<S, R> Clone for AppContext<S, R> {
    fn clone(&self) -> Self {
        Self {
            config: self.config.clone(),
            session: self.session.clone(),
            catalog: self.catalog.clone(),
        }
    }
}

impl<S: KeyValueStore, R: RouteSource> AppContext<S, R> {
    /// Wire both stores onto `store`, fetching routes from `source`.
    pub fn new(config: AppConfig, store: S, source: R) -> Self {
        let store = Arc::new(store);
        Self {
            session: SessionStore::new(Arc::clone(&store)),
            catalog: RouteCatalog::new(store, Arc::new(source)),
            config,
        }
    }

    /// Detach both stores from operations still in flight.
    pub fn dispose(&self) {
        self.session.dispose();
        self.catalog.dispose();
    }
}

impl AppContext<FileStore, HttpRouteSource> {
    /// Production wiring: files under `storage_root`, HTTP to `api_url`.
    pub fn from_config(config: AppConfig) -> Result<Self> {
        let source =
            HttpRouteSource::from_config(&config).context("failed to build HTTP client")?;
        let store = FileStore::new(&config.storage_root);
        info!(
            api_url = %config.api_url,
            storage = %store.root().display(),
            "Application context ready"
        );
        Ok(Self::new(config, store, source))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        catalog::RouteOrigin,
        session::Credentials,
        storage::{self as kv, MemoryStore, FAVORITES_KEY},
    };
    use tempfile::tempdir;

    #[tokio::test]
    async fn stores_share_one_backend() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let config = AppConfig {
            api_url: "http://127.0.0.1:9".to_string(),
            storage_root: dir.path().to_path_buf(),
            request_timeout_secs: 2,
            dark_mode: false,
        };
        let context = AppContext::from_config(config)?;

        context
            .session
            .login(&Credentials::new("a@b.com", "pw"))
            .await?;
        assert_eq!(context.catalog.fetch_routes().await, RouteOrigin::Fallback);
        let first = context.catalog.routes()[0].clone();
        context.catalog.toggle_favorite(&first).await;

        assert!(dir.path().join("user.json").is_file());
        assert!(dir.path().join("favorites.json").is_file());

        let store = FileStore::new(dir.path());
        let favorites: Option<Vec<crate::models::Route>> =
            kv::get_json(&store, FAVORITES_KEY).await?;
        assert_eq!(favorites.map(|routes| routes.len()), Some(1));
        Ok(())
    }

    #[tokio::test]
    async fn dispose_detaches_both_stores() {
        let context = AppContext::new(
            AppConfig::default(),
            MemoryStore::new(),
            HttpRouteSource::new("http://127.0.0.1:9", std::time::Duration::from_secs(1))
                .expect("client"),
        );
        context.dispose();

        context.catalog.fetch_routes().await;
        assert!(context.catalog.routes().is_empty());
        assert!(!context.session.restore_session().await);
    }
}
