use std::sync::Arc;

use chrono::Utc;
use parking_lot::RwLock;
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::storage::{self, KeyValueStore, StorageError, SESSION_USER_KEY, USERS_KEY};

use super::models::{AuthState, Credentials, Registration, SessionSnapshot, User};

/// Failure of a login or registration. Only storage problems fail these
/// operations; unknown credentials never do.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Owner of the authentication state.
///
/// Clones are cheap handles onto the same state and backing store.
pub struct SessionStore<S> {
    store: Arc<S>,
    inner: Arc<RwLock<Inner>>,
}

#[derive(Default)]
struct Inner {
    snapshot: SessionSnapshot,
    disposed: bool,
}

impl<S> Clone for SessionStore<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S: KeyValueStore> SessionStore<S> {
    /// Create an unauthenticated store persisting through `store`.
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            inner: Arc::new(RwLock::new(Inner::default())),
        }
    }

    /// Copy of the current state.
    pub fn snapshot(&self) -> SessionSnapshot {
        self.inner.read().snapshot.clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.inner.read().snapshot.is_authenticated()
    }

    pub fn current_user(&self) -> Option<User> {
        self.inner.read().snapshot.user().cloned()
    }

    /// Stop applying results of operations that complete from now on.
    pub fn dispose(&self) {
        self.inner.write().disposed = true;
    }

    /// Sign in. A registered user whose email and password match exactly
    /// wins; otherwise a session-only user is made up from the email.
    pub async fn login(&self, credentials: &Credentials) -> Result<User, AuthError> {
        self.begin();
        let result = self.authenticate(credentials).await;
        self.finish(result, "login")
    }

    /// Append a new user to the credential store and sign in as them.
    /// Duplicate emails are accepted.
    pub async fn register(&self, registration: &Registration) -> Result<User, AuthError> {
        self.begin();
        let result = self.enrol(registration).await;
        self.finish(result, "registration")
    }

    /// Drop the persisted session, then the in-memory one. Failures are
    /// logged and leave the session in place.
    pub async fn logout(&self) {
        match self.store.remove(SESSION_USER_KEY).await {
            Ok(()) => {
                let mut inner = self.inner.write();
                if inner.disposed {
                    debug!("Session store disposed; keeping in-memory session");
                    return;
                }
                inner.snapshot.state = AuthState::Unauthenticated;
                inner.snapshot.authenticated_at = None;
                info!("Signed out");
            }
            Err(err) => error!(%err, "Logout failed"),
        }
    }

    /// Adopt the persisted session user, if one exists. Returns whether
    /// the store is now authenticated.
    pub async fn restore_session(&self) -> bool {
        match storage::get_json::<_, User>(&*self.store, SESSION_USER_KEY).await {
            Ok(Some(user)) => {
                info!(email = %user.email, "Restored session");
                self.authenticate_as(user)
            }
            Ok(None) => {
                debug!("No persisted session");
                false
            }
            Err(err) => {
                error!(%err, "Session restore failed");
                false
            }
        }
    }

    async fn authenticate(&self, credentials: &Credentials) -> Result<User, AuthError> {
        let users = self.registered_users().await?;
        let user = match users.into_iter().find(|user| user.matches(credentials)) {
            Some(found) => {
                info!(email = %found.email, "Matched registered user");
                found
            }
            None => {
                info!(email = %credentials.email, "No registered match; starting session-only user");
                User::session_only(&credentials.email)
            }
        };
        storage::set_json(&*self.store, SESSION_USER_KEY, &user).await?;
        Ok(user)
    }

    async fn enrol(&self, registration: &Registration) -> Result<User, AuthError> {
        let user = registration.to_user();
        let mut users = self.registered_users().await?;
        users.push(user.clone());
        storage::set_json(&*self.store, USERS_KEY, &users).await?;
        storage::set_json(&*self.store, SESSION_USER_KEY, &user).await?;
        info!(email = %user.email, total = users.len(), "Registered user");
        Ok(user)
    }

    async fn registered_users(&self) -> Result<Vec<User>, StorageError> {
        Ok(storage::get_json(&*self.store, USERS_KEY)
            .await?
            .unwrap_or_default())
    }

    fn begin(&self) {
        let mut inner = self.inner.write();
        if inner.disposed {
            return;
        }
        inner.snapshot.loading = true;
        inner.snapshot.error = None;
    }

    fn finish(&self, result: Result<User, AuthError>, action: &str) -> Result<User, AuthError> {
        match result {
            Ok(user) => {
                self.authenticate_as(user.clone());
                Ok(user)
            }
            Err(err) => {
                warn!(%err, action, "Authentication failed");
                let mut inner = self.inner.write();
                if !inner.disposed {
                    inner.snapshot.loading = false;
                    inner.snapshot.error = Some(err.to_string());
                }
                Err(err)
            }
        }
    }

    fn authenticate_as(&self, user: User) -> bool {
        let mut inner = self.inner.write();
        if inner.disposed {
            debug!("Session store disposed; discarding result");
            return false;
        }
        inner.snapshot = SessionSnapshot {
            state: AuthState::Authenticated(user),
            loading: false,
            error: None,
            authenticated_at: Some(Utc::now()),
        };
        true
    }
}
