//! Authentication state and the persisted credential store.

mod models;
pub mod store;

pub use models::{
    derive_username, AuthState, Credentials, Registration, SessionSnapshot, User,
    DEFAULT_USERNAME,
};
pub use store::{AuthError, SessionStore};
