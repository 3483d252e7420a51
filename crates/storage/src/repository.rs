use async_trait::async_trait;
use progress_core::model::{AuthUser, ClassId, ClassRecord, StudentEmail, StudentRecord};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;

use crate::keys;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// String-keyed medium every record is persisted to.
///
/// There are no transactions: a read followed by a write is not atomic, and
/// concurrent writers to the same key are last-write-wins.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Fetch the raw value stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be read.
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Store `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be written.
    async fn put(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Remove `key`. Removing an absent key is not an error.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be written.
    async fn remove(&self, key: &str) -> Result<(), StorageError>;

    /// All keys starting with `prefix`, in ascending order.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be read.
    async fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>, StorageError>;
}

async fn read_json<T, S>(store: &S, key: &str) -> Result<Option<T>, StorageError>
where
    T: DeserializeOwned,
    S: KeyValueStore + ?Sized,
{
    let Some(raw) = store.get(key).await? else {
        log::debug!("no value under {key}");
        return Ok(None);
    };
    serde_json::from_str(&raw)
        .map(Some)
        .map_err(|err| StorageError::Serialization(format!("{key}: {err}")))
}

async fn write_json<T, S>(store: &S, key: &str, value: &T) -> Result<(), StorageError>
where
    T: Serialize + Sync,
    S: KeyValueStore + ?Sized,
{
    let raw =
        serde_json::to_string(value).map_err(|err| StorageError::Serialization(err.to_string()))?;
    log::debug!("writing {} bytes to {key}", raw.len());
    store.put(key, &raw).await
}

//
// ─── TYPED REPOSITORIES ────────────────────────────────────────────────────────
//

/// Repository contract for student records.
#[async_trait]
pub trait StudentRepository: Send + Sync {
    /// Fetch the record for `email`, or `None` if absent.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Serialization` if the stored value is malformed.
    async fn get_student(&self, email: &StudentEmail)
    -> Result<Option<StudentRecord>, StorageError>;

    /// Persist a record under its email key.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the record cannot be stored.
    async fn put_student(&self, record: &StudentRecord) -> Result<(), StorageError>;

    /// Every stored student record, ordered by key.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if any record cannot be read.
    async fn list_students(&self) -> Result<Vec<StudentRecord>, StorageError>;
}

/// Repository contract for class rosters.
#[async_trait]
pub trait ClassRepository: Send + Sync {
    /// Fetch a class by id, or `None` if absent.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Serialization` if the stored value is malformed.
    async fn get_class(&self, id: &ClassId) -> Result<Option<ClassRecord>, StorageError>;

    /// Persist or replace a class.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the class cannot be stored.
    async fn put_class(&self, class: &ClassRecord) -> Result<(), StorageError>;
}

/// Repository contract for the signed-in user.
#[async_trait]
pub trait AuthRepository: Send + Sync {
    /// # Errors
    ///
    /// Returns `StorageError::Serialization` if the stored value is malformed.
    async fn get_auth_user(&self) -> Result<Option<AuthUser>, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` if the user cannot be stored.
    async fn put_auth_user(&self, user: &AuthUser) -> Result<(), StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` if the key cannot be removed.
    async fn clear_auth_user(&self) -> Result<(), StorageError>;
}

#[async_trait]
impl<S: KeyValueStore + ?Sized> StudentRepository for S {
    async fn get_student(
        &self,
        email: &StudentEmail,
    ) -> Result<Option<StudentRecord>, StorageError> {
        read_json(self, &keys::student_key(email)).await
    }

    async fn put_student(&self, record: &StudentRecord) -> Result<(), StorageError> {
        write_json(self, &keys::student_key(&record.email), record).await
    }

    async fn list_students(&self) -> Result<Vec<StudentRecord>, StorageError> {
        let keys = self.keys_with_prefix(keys::STUDENT_PREFIX).await?;
        let mut records = Vec::with_capacity(keys.len());
        for key in keys {
            if let Some(record) = read_json(self, &key).await? {
                records.push(record);
            }
        }
        Ok(records)
    }
}

#[async_trait]
impl<S: KeyValueStore + ?Sized> ClassRepository for S {
    async fn get_class(&self, id: &ClassId) -> Result<Option<ClassRecord>, StorageError> {
        read_json(self, &keys::class_key(id)).await
    }

    async fn put_class(&self, class: &ClassRecord) -> Result<(), StorageError> {
        write_json(self, &keys::class_key(&class.id), class).await
    }
}

#[async_trait]
impl<S: KeyValueStore + ?Sized> AuthRepository for S {
    async fn get_auth_user(&self) -> Result<Option<AuthUser>, StorageError> {
        read_json(self, keys::AUTH_USER).await
    }

    async fn put_auth_user(&self, user: &AuthUser) -> Result<(), StorageError> {
        write_json(self, keys::AUTH_USER, user).await
    }

    async fn clear_auth_user(&self) -> Result<(), StorageError> {
        self.remove(keys::AUTH_USER).await
    }
}

//
// ─── IN-MEMORY BACKEND ─────────────────────────────────────────────────────────
//

/// Simple in-memory store for testing and prototyping.
///
/// Clones share the same underlying map.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    entries: Arc<Mutex<BTreeMap<String, String>>>,
}

impl InMemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: Arc::new(Mutex::new(BTreeMap::new())),
        }
    }
}

#[async_trait]
impl KeyValueStore for InMemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let guard = self
            .entries
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.get(key).cloned())
    }

    async fn put(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut guard = self
            .entries
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        let mut guard = self
            .entries
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.remove(key);
        Ok(())
    }

    async fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>, StorageError> {
        let guard = self
            .entries
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard
            .keys()
            .filter(|key| key.starts_with(prefix))
            .cloned()
            .collect())
    }
}

//
// ─── AGGREGATE ─────────────────────────────────────────────────────────────────
//

/// Aggregates the repositories behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub kv: Arc<dyn KeyValueStore>,
    pub students: Arc<dyn StudentRepository>,
    pub classes: Arc<dyn ClassRepository>,
    pub auth: Arc<dyn AuthRepository>,
}

impl Storage {
    /// Wire every repository to the same backing store.
    #[must_use]
    pub fn from_store<S: KeyValueStore + 'static>(store: S) -> Self {
        let store = Arc::new(store);
        let kv: Arc<dyn KeyValueStore> = store.clone();
        let students: Arc<dyn StudentRepository> = store.clone();
        let classes: Arc<dyn ClassRepository> = store.clone();
        let auth: Arc<dyn AuthRepository> = store;
        Self {
            kv,
            students,
            classes,
            auth,
        }
    }

    #[must_use]
    pub fn in_memory() -> Self {
        Self::from_store(InMemoryStore::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use progress_core::model::Role;
    use progress_core::policy::ProgressPolicy;

    fn email(raw: &str) -> StudentEmail {
        StudentEmail::parse(raw).unwrap()
    }

    #[tokio::test]
    async fn round_trips_student_under_lowercased_key() {
        let store = InMemoryStore::new();
        let record = StudentRecord::new(email("Ada@X.io"), "Ada", &ProgressPolicy::default());
        store.put_student(&record).await.unwrap();

        assert!(store.get("student_data_ada@x.io").await.unwrap().is_some());
        let fetched = store.get_student(&email("ADA@x.io")).await.unwrap();
        assert_eq!(fetched, Some(record));
    }

    #[tokio::test]
    async fn absent_records_are_none() {
        let store = InMemoryStore::new();
        assert!(store.get_student(&email("nobody@x.io")).await.unwrap().is_none());
        assert!(store.get_class(&ClassId::new("x")).await.unwrap().is_none());
        assert!(store.get_auth_user().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn malformed_json_surfaces_as_serialization_error() {
        let store = InMemoryStore::new();
        store.put("student_data_bad@x.io", "{not json").await.unwrap();
        let err = store.get_student(&email("bad@x.io")).await.unwrap_err();
        assert!(matches!(err, StorageError::Serialization(_)));
    }

    #[tokio::test]
    async fn auth_user_can_be_cleared() {
        let store = InMemoryStore::new();
        let user = AuthUser {
            name: "T".into(),
            email: email("t@x.io"),
            role: Role::Teacher,
        };
        store.put_auth_user(&user).await.unwrap();
        assert_eq!(store.get_auth_user().await.unwrap(), Some(user));

        store.clear_auth_user().await.unwrap();
        assert!(store.get_auth_user().await.unwrap().is_none());
        store.clear_auth_user().await.unwrap();
    }

    #[tokio::test]
    async fn list_students_ignores_other_keys() {
        let store = InMemoryStore::new();
        let policy = ProgressPolicy::default();
        for raw in ["b@x.io", "a@x.io"] {
            store
                .put_student(&StudentRecord::new(email(raw), raw, &policy))
                .await
                .unwrap();
        }
        store
            .put_class(&ClassRecord::new(ClassId::new("c"), "C"))
            .await
            .unwrap();

        let listed = store.list_students().await.unwrap();
        let emails: Vec<_> = listed.iter().map(|r| r.email.as_str()).collect();
        assert_eq!(emails, vec!["a@x.io", "b@x.io"]);
    }

    #[tokio::test]
    async fn storage_handles_share_one_store() {
        let storage = Storage::in_memory();
        let class = ClassRecord::new(ClassId::new("c"), "C");
        storage.classes.put_class(&class).await.unwrap();
        assert!(storage.kv.get("class_data_c").await.unwrap().is_some());
    }
}
