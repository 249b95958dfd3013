use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, error, info, warn};

use crate::{
    models::Route,
    storage::{self, KeyValueStore, FAVORITES_KEY, ROUTES_KEY},
};

use super::{fallback::fallback_routes, source::RouteSource};

/// Where the current route list came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteOrigin {
    /// The remote routes endpoint.
    Remote,
    /// The built-in sample list.
    Fallback,
}

/// Point-in-time copy of the catalog for rendering.
#[derive(Debug, Clone, Default)]
pub struct CatalogSnapshot {
    /// Routes in display order.
    pub routes: Vec<Route>,
    /// Favorited routes in the order they were added.
    pub favorites: Vec<Route>,
    /// A fetch is in flight.
    pub loading: bool,
    /// `None` until the first fetch completes.
    pub origin: Option<RouteOrigin>,
}

#[derive(Default)]
struct Inner {
    snapshot: CatalogSnapshot,
    disposed: bool,
}

/// Owner of the route list and the favorited subset.
///
/// All reads and writes of the in-memory state go through one lock;
/// persistence happens after the lock is released.
pub struct RouteCatalog<S, R> {
    store: Arc<S>,
    source: Arc<R>,
    inner: Arc<RwLock<Inner>>,
}

impl<S, R> Clone for RouteCatalog<S, R> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            source: Arc::clone(&self.source),
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S: KeyValueStore, R: RouteSource> RouteCatalog<S, R> {
    /// Create an empty catalog.
    pub fn new(store: Arc<S>, source: Arc<R>) -> Self {
        Self {
            store,
            source,
            inner: Arc::new(RwLock::new(Inner::default())),
        }
    }

    /// Copy of the current state.
    pub fn snapshot(&self) -> CatalogSnapshot {
        self.inner.read().snapshot.clone()
    }

    /// Current route list.
    pub fn routes(&self) -> Vec<Route> {
        self.inner.read().snapshot.routes.clone()
    }

    /// Current favorites.
    pub fn favorites(&self) -> Vec<Route> {
        self.inner.read().snapshot.favorites.clone()
    }

    /// Whether any favorite has this id.
    pub fn is_favorite(&self, id: u64) -> bool {
        self.inner
            .read()
            .snapshot
            .favorites
            .iter()
            .any(|route| route.id == id)
    }

    /// Look up a route in the current list.
    pub fn route(&self, id: u64) -> Option<Route> {
        self.inner
            .read()
            .snapshot
            .routes
            .iter()
            .find(|route| route.id == id)
            .cloned()
    }

    /// Filter routes using a case-insensitive substring search.
    pub fn routes_matching(&self, query: &str) -> Vec<Route> {
        let needle = query.trim().to_lowercase();
        let routes = self.routes();
        if needle.is_empty() {
            return routes;
        }
        routes
            .into_iter()
            .filter(|route| route.matches(&needle))
            .collect()
    }

    /// Stop applying results of operations that complete from now on.
    pub fn dispose(&self) {
        self.inner.write().disposed = true;
    }

    /// Replace the route list from the remote source, or with the built-in
    /// sample list when the fetch fails in any way.
    pub async fn fetch_routes(&self) -> RouteOrigin {
        {
            let mut inner = self.inner.write();
            if !inner.disposed {
                inner.snapshot.loading = true;
            }
        }

        match self.source.fetch_routes().await {
            Ok(routes) => {
                info!(count = routes.len(), "Routes fetched");
                self.commit_routes(routes.clone(), RouteOrigin::Remote);
                if let Err(err) = storage::set_json(&*self.store, ROUTES_KEY, &routes).await {
                    warn!(%err, "Failed to cache fetched routes");
                }
                RouteOrigin::Remote
            }
            Err(err) => {
                warn!(%err, "Route fetch failed; using built-in routes");
                self.commit_routes(fallback_routes(), RouteOrigin::Fallback);
                RouteOrigin::Fallback
            }
        }
    }

    /// Replace favorites with the persisted list, if there is one.
    pub async fn load_favorites(&self) {
        match storage::get_json::<_, Vec<Route>>(&*self.store, FAVORITES_KEY).await {
            Ok(Some(favorites)) => {
                let mut inner = self.inner.write();
                if inner.disposed {
                    debug!("Catalog disposed; discarding favorites");
                    return;
                }
                info!(count = favorites.len(), "Favorites loaded");
                inner.snapshot.favorites = favorites;
            }
            Ok(None) => debug!("No persisted favorites"),
            Err(err) => error!(%err, "Failed to load favorites"),
        }
    }

    /// Remove `route` from favorites if its id is present, otherwise append
    /// it, then persist the resulting list. Returns whether the route is a
    /// favorite afterwards. A failed write is logged and the in-memory
    /// change is kept.
    pub async fn toggle_favorite(&self, route: &Route) -> bool {
        let (favorites, now_favorite) = {
            let mut inner = self.inner.write();
            let favorites = &mut inner.snapshot.favorites;
            let present = favorites.iter().any(|favorite| favorite.id == route.id);
            if present {
                favorites.retain(|favorite| favorite.id != route.id);
            } else {
                favorites.push(route.clone());
            }
            (favorites.clone(), !present)
        };
        debug!(id = route.id, now_favorite, total = favorites.len(), "Toggled favorite");

        if let Err(err) = storage::set_json(&*self.store, FAVORITES_KEY, &favorites).await {
            error!(%err, id = route.id, "Failed to persist favorites");
        }
        now_favorite
    }

    fn commit_routes(&self, routes: Vec<Route>, origin: RouteOrigin) {
        let mut inner = self.inner.write();
        if inner.disposed {
            debug!("Catalog disposed; discarding routes");
            return;
        }
        inner.snapshot.routes = routes;
        inner.snapshot.origin = Some(origin);
        inner.snapshot.loading = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        catalog::source::FetchError,
        storage::{testing::FailingStore, MemoryStore},
    };

    enum StubSource {
        Routes(Vec<Route>),
        Unreachable,
    }

    impl RouteSource for StubSource {
        async fn fetch_routes(&self) -> Result<Vec<Route>, FetchError> {
            match self {
                StubSource::Routes(routes) => Ok(routes.clone()),
                StubSource::Unreachable => Err(FetchError::Status {
                    status: 503,
                    url: "http://stub/routes".to_string(),
                }),
            }
        }
    }

    fn route(id: u64, name: &str) -> Route {
        let mut route = fallback_routes()[0].clone();
        route.id = id;
        route.route = name.to_string();
        route
    }

    fn catalog<S: KeyValueStore>(store: &Arc<S>, source: StubSource) -> RouteCatalog<S, StubSource> {
        RouteCatalog::new(Arc::clone(store), Arc::new(source))
    }

    #[tokio::test]
    async fn network_failure_falls_back_to_builtin_routes() {
        let store = Arc::new(MemoryStore::new());
        let catalog = catalog(&store, StubSource::Unreachable);

        assert_eq!(catalog.fetch_routes().await, RouteOrigin::Fallback);
        let snapshot = catalog.snapshot();
        let ids: Vec<u64> = snapshot.routes.iter().map(|route| route.id).collect();
        assert_eq!(ids, vec![1, 2]);
        assert_eq!(snapshot.origin, Some(RouteOrigin::Fallback));
        assert!(!snapshot.loading);
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn successful_fetch_replaces_and_caches_routes() -> anyhow::Result<()> {
        let store = Arc::new(MemoryStore::new());
        let remote = vec![route(10, "Night Owl"), route(11, "Coastal")];
        let catalog = catalog(&store, StubSource::Routes(remote.clone()));

        assert_eq!(catalog.fetch_routes().await, RouteOrigin::Remote);
        assert_eq!(catalog.routes(), remote);

        let cached: Option<Vec<Route>> = storage::get_json(&*store, ROUTES_KEY).await?;
        assert_eq!(cached, Some(remote));
        Ok(())
    }

    #[tokio::test]
    async fn cache_write_failure_keeps_fetched_routes() {
        let store = Arc::new(FailingStore::failing_writes());
        let remote = vec![route(10, "Night Owl")];
        let catalog = catalog(&store, StubSource::Routes(remote.clone()));

        assert_eq!(catalog.fetch_routes().await, RouteOrigin::Remote);
        assert_eq!(catalog.routes(), remote);
    }

    #[tokio::test]
    async fn toggling_twice_restores_empty_favorites() -> anyhow::Result<()> {
        let store = Arc::new(MemoryStore::new());
        let catalog = catalog(&store, StubSource::Unreachable);
        let target = route(42, "Harbour Loop");

        assert!(catalog.toggle_favorite(&target).await);
        let favorites = catalog.favorites();
        assert_eq!(favorites.len(), 1);
        assert_eq!(favorites[0].id, 42);
        assert!(catalog.is_favorite(42));

        assert!(!catalog.toggle_favorite(&target).await);
        assert!(catalog.favorites().is_empty());

        let persisted: Option<Vec<Route>> = storage::get_json(&*store, FAVORITES_KEY).await?;
        assert_eq!(persisted, Some(Vec::new()));
        Ok(())
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_toggles_keep_every_route() {
        let store = Arc::new(MemoryStore::new());
        let catalog = catalog(&store, StubSource::Unreachable);

        let handles: Vec<_> = (0..32)
            .map(|id| {
                let catalog = catalog.clone();
                tokio::spawn(async move { catalog.toggle_favorite(&route(id, "Shuttle")).await })
            })
            .collect();
        for handle in handles {
            assert!(handle.await.expect("toggle task"));
        }
        let mut ids: Vec<u64> = catalog.favorites().iter().map(|route| route.id).collect();
        ids.sort_unstable();
        assert_eq!(ids, (0..32).collect::<Vec<u64>>());

        let handles: Vec<_> = (0..32)
            .filter(|id| id % 2 == 0)
            .map(|id| {
                let catalog = catalog.clone();
                tokio::spawn(async move { catalog.toggle_favorite(&route(id, "Shuttle")).await })
            })
            .collect();
        for handle in handles {
            assert!(!handle.await.expect("toggle task"));
        }
        let mut ids: Vec<u64> = catalog.favorites().iter().map(|route| route.id).collect();
        ids.sort_unstable();
        assert_eq!(ids, (0..32).filter(|id| id % 2 == 1).collect::<Vec<u64>>());
    }

    #[tokio::test]
    async fn removal_drops_every_entry_with_the_id() {
        let store = Arc::new(MemoryStore::new());
        storage::set_json(&*store, FAVORITES_KEY, &vec![route(3, "a"), route(3, "b"), route(4, "c")])
            .await
            .expect("seed favorites");
        let catalog = catalog(&store, StubSource::Unreachable);
        catalog.load_favorites().await;
        assert_eq!(catalog.favorites().len(), 3);

        assert!(!catalog.toggle_favorite(&route(3, "a")).await);
        let ids: Vec<u64> = catalog.favorites().iter().map(|route| route.id).collect();
        assert_eq!(ids, vec![4]);
    }

    #[tokio::test]
    async fn failed_persist_keeps_in_memory_toggle() {
        let store = Arc::new(FailingStore::failing_writes());
        let catalog = catalog(&store, StubSource::Unreachable);

        assert!(catalog.toggle_favorite(&route(5, "Ferry")).await);
        assert!(catalog.is_favorite(5));
    }

    #[tokio::test]
    async fn missing_or_unreadable_favorites_leave_state_alone() {
        let store = Arc::new(FailingStore::default());
        let catalog = catalog(&store, StubSource::Unreachable);
        catalog.toggle_favorite(&route(1, "Route 101")).await;

        store.inner.remove(FAVORITES_KEY).await.expect("remove");
        catalog.load_favorites().await;
        assert_eq!(catalog.favorites().len(), 1);

        *store.fail_reads.lock() = true;
        catalog.load_favorites().await;
        assert_eq!(catalog.favorites().len(), 1);
    }

    #[tokio::test]
    async fn disposed_catalog_discards_completions() {
        let store = Arc::new(MemoryStore::new());
        let catalog = catalog(&store, StubSource::Routes(vec![route(9, "Late")]));
        catalog.dispose();

        catalog.fetch_routes().await;
        assert!(catalog.routes().is_empty());
        assert!(!catalog.snapshot().loading);
    }

    #[tokio::test]
    async fn search_matches_names_endpoints_and_operators() {
        let store = Arc::new(MemoryStore::new());
        let catalog = catalog(&store, StubSource::Unreachable);
        catalog.fetch_routes().await;

        assert_eq!(catalog.routes_matching("").len(), 2);
        assert_eq!(catalog.routes_matching("  METRO ")[0].id, 2);
        assert_eq!(catalog.routes_matching("airport")[0].id, 1);
        assert_eq!(catalog.routes_matching("city transit")[0].id, 1);
        assert!(catalog.routes_matching("zeppelin").is_empty());
        assert_eq!(catalog.route(2).map(|route| route.route), Some("Blue Line".to_string()));
        assert!(catalog.route(99).is_none());
    }
}
