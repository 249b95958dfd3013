//! Route catalog: remote fetch with a built-in fallback, plus favorites.

mod fallback;
/// Remote route sources.
pub mod source;
/// The catalog state owner.
pub mod store;

pub use fallback::fallback_routes;
pub use source::{FetchError, HttpRouteSource, RouteSource};
pub use store::{CatalogSnapshot, RouteCatalog, RouteOrigin};
