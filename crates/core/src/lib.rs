#![warn(clippy::all, missing_docs)]

//! Core logic for Routebook, a travel companion for browsing transport
//! routes.
//!
//! This crate hosts the data models, configuration handling, the
//! persistence adapter, and the session and route catalog stores used by
//! the terminal UI and any future frontends.

pub mod catalog;
pub mod config;
pub mod context;
pub mod models;
#[allow(missing_docs)]
pub mod session;
pub mod storage;
#[allow(missing_docs)]
pub mod validation;

pub use catalog::{CatalogSnapshot, HttpRouteSource, RouteCatalog, RouteOrigin, RouteSource};
pub use config::AppConfig;
pub use context::AppContext;
pub use models::{Route, TransportType};
pub use session::{AuthState, Credentials, Registration, SessionSnapshot, SessionStore, User};
pub use storage::{FileStore, KeyValueStore, MemoryStore, StorageError};
