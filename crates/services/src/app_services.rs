use std::sync::Arc;

use progress_core::policy::ProgressPolicy;
use storage::repository::Storage;

use crate::Clock;
use crate::auth_service::AuthService;
use crate::class_service::ClassService;
use crate::error::AppServicesError;
use crate::progress_service::ProgressService;

/// Assembles app-facing services over one storage backend.
#[derive(Clone)]
pub struct AppServices {
    progress: Arc<ProgressService>,
    classes: Arc<ClassService>,
    auth: Arc<AuthService>,
}

impl AppServices {
    /// Build services backed by `SQLite` storage.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if storage initialization fails.
    pub async fn new_sqlite(
        db_url: &str,
        clock: Clock,
        policy: ProgressPolicy,
    ) -> Result<Self, AppServicesError> {
        let storage = Storage::sqlite(db_url).await?;
        Ok(Self::from_storage(&storage, clock, policy))
    }

    /// Build services over an already constructed storage.
    #[must_use]
    pub fn from_storage(storage: &Storage, clock: Clock, policy: ProgressPolicy) -> Self {
        let progress = Arc::new(ProgressService::new(
            clock,
            policy,
            Arc::clone(&storage.students),
        ));
        let classes = Arc::new(ClassService::new(
            Arc::clone(&storage.classes),
            Arc::clone(&progress),
        ));
        let auth = Arc::new(AuthService::new(
            Arc::clone(&storage.auth),
            Arc::clone(&progress),
            Arc::clone(&classes),
        ));

        Self {
            progress,
            classes,
            auth,
        }
    }

    #[must_use]
    pub fn in_memory(clock: Clock, policy: ProgressPolicy) -> Self {
        Self::from_storage(&Storage::in_memory(), clock, policy)
    }

    #[must_use]
    pub fn progress(&self) -> Arc<ProgressService> {
        Arc::clone(&self.progress)
    }

    #[must_use]
    pub fn classes(&self) -> Arc<ClassService> {
        Arc::clone(&self.classes)
    }

    #[must_use]
    pub fn auth(&self) -> Arc<AuthService> {
        Arc::clone(&self.auth)
    }
}
