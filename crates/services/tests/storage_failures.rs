use std::sync::Arc;

use async_trait::async_trait;
use progress_core::model::{PracticeSession, StudentEmail};
use progress_core::policy::ProgressPolicy;
use progress_core::time::fixed_clock;
use services::{ProgressError, ProgressService};
use storage::repository::{KeyValueStore, StorageError};

/// Reads succeed with a fixed payload; every write fails.
struct ReadOnlyStore {
    payload: Option<String>,
}

#[async_trait]
impl KeyValueStore for ReadOnlyStore {
    async fn get(&self, _key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.payload.clone())
    }

    async fn put(&self, _key: &str, _value: &str) -> Result<(), StorageError> {
        Err(StorageError::Connection("read-only".into()))
    }

    async fn remove(&self, _key: &str) -> Result<(), StorageError> {
        Err(StorageError::Connection("read-only".into()))
    }

    async fn keys_with_prefix(&self, _prefix: &str) -> Result<Vec<String>, StorageError> {
        Ok(Vec::new())
    }
}

fn service(payload: Option<&str>) -> ProgressService {
    ProgressService::new(
        fixed_clock(),
        ProgressPolicy::default(),
        Arc::new(ReadOnlyStore {
            payload: payload.map(str::to_owned),
        }),
    )
}

#[tokio::test]
async fn write_failure_propagates_from_ensure() {
    let email = StudentEmail::parse("a@x.io").unwrap();
    let err = service(None)
        .ensure_student_record(&email, "A", None)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ProgressError::Storage(StorageError::Connection(_))
    ));
}

#[tokio::test]
async fn corrupted_record_surfaces_serialization_error() {
    let email = StudentEmail::parse("a@x.io").unwrap();
    let err = service(Some("{\"id\": 3"))
        .complete_practice_session(&email, PracticeSession::new(1, 0))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ProgressError::Storage(StorageError::Serialization(_))
    ));
}

#[tokio::test]
async fn absent_record_needs_no_write() {
    let email = StudentEmail::parse("a@x.io").unwrap();
    let result = service(None)
        .complete_practice_session(&email, PracticeSession::new(1, 0))
        .await
        .unwrap();
    assert!(result.is_none());
}
