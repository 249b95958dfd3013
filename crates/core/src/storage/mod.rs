//! Asynchronous key-value persistence.
//!
//! Every persisted value is a JSON document stored under a string key.
//! There are no transactions and no schema: callers encode and decode
//! their own values through [`get_json`] and [`set_json`].

use std::future::Future;

use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;

/// Directory-backed store writing one JSON file per key.
pub mod file;
/// In-process store backed by a map.
pub mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

/// Registered users, an array of `User`.
pub const USERS_KEY: &str = "users";
/// The current session user.
pub const SESSION_USER_KEY: &str = "user";
/// Last successfully fetched route list. Written, never read back.
pub const ROUTES_KEY: &str = "routes";
/// Favorited routes, an array of `Route`.
pub const FAVORITES_KEY: &str = "favorites";

/// Failures raised by the persistence layer.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The backing medium could not be read or written.
    #[error("storage access for `{key}` failed: {source}")]
    Io {
        /// Key being accessed.
        key: String,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },
    /// A value could not be serialised before writing.
    #[error("failed to encode `{key}`: {source}")]
    Encode {
        /// Key being written.
        key: String,
        /// Serialisation failure.
        #[source]
        source: serde_json::Error,
    },
    /// A stored value is not valid JSON for the requested type.
    #[error("failed to decode `{key}`: {source}")]
    Decode {
        /// Key being read.
        key: String,
        /// Deserialisation failure.
        #[source]
        source: serde_json::Error,
    },
}

impl StorageError {
    pub(crate) fn io(key: &str, source: std::io::Error) -> Self {
        Self::Io {
            key: key.to_string(),
            source,
        }
    }
}

/// Asynchronous string-keyed blob store.
///
/// Each operation is independently fallible; implementations make no
/// promise about ordering between concurrent writers.
pub trait KeyValueStore: Send + Sync + 'static {
    /// Read the raw value stored under `key`, if any.
    fn get(&self, key: &str) -> impl Future<Output = Result<Option<String>, StorageError>> + Send;

    /// Replace the value stored under `key`.
    fn set(&self, key: &str, value: &str) -> impl Future<Output = Result<(), StorageError>> + Send;

    /// Delete `key`. Removing a missing key succeeds.
    fn remove(&self, key: &str) -> impl Future<Output = Result<(), StorageError>> + Send;
}

/// Read and decode the JSON value stored under `key`.
pub async fn get_json<S, T>(store: &S, key: &str) -> Result<Option<T>, StorageError>
where
    S: KeyValueStore + ?Sized,
    T: DeserializeOwned,
{
    match store.get(key).await? {
        Some(raw) => serde_json::from_str(&raw)
            .map(Some)
            .map_err(|source| StorageError::Decode {
                key: key.to_string(),
                source,
            }),
        None => Ok(None),
    }
}

/// Encode `value` as JSON and store it under `key`.
pub async fn set_json<S, T>(store: &S, key: &str, value: &T) -> Result<(), StorageError>
where
    S: KeyValueStore + ?Sized,
    T: Serialize + Sync + ?Sized,
{
    let encoded = serde_json::to_string(value).map_err(|source| StorageError::Encode {
        key: key.to_string(),
        source,
    })?;
    store.set(key, &encoded).await
}


#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn json_helpers_round_trip_values() -> anyhow::Result<()> {
        let store = MemoryStore::new();
        set_json(&store, "numbers", &vec![1, 2, 3]).await?;

        let numbers: Option<Vec<u32>> = get_json(&store, "numbers").await?;
        assert_eq!(numbers, Some(vec![1, 2, 3]));

        let missing: Option<Vec<u32>> = get_json(&store, "absent").await?;
        assert!(missing.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn decode_failures_name_the_key() -> anyhow::Result<()> {
        let store = MemoryStore::new();
        store.set("favorites", "{not json").await?;

        let err = get_json::<_, Vec<u32>>(&store, "favorites")
            .await
            .expect_err("corrupt value must not decode");
        assert!(matches!(err, StorageError::Decode { ref key, .. } if key == "favorites"));
        assert!(err.to_string().contains("favorites"));

        store.set("favorites", &json!({"id": 1}).to_string()).await?;
        assert!(get_json::<_, Vec<u32>>(&store, "favorites").await.is_err());
        Ok(())
    }
}
