use std::sync::Arc;

use progress_core::model::{PracticeSession, StudentEmail, StudentRecord, StudentSeed};
use progress_core::policy::ProgressPolicy;
use storage::repository::StudentRepository;

use crate::Clock;
use crate::error::ProgressError;

/// Maintains per-student progress records.
///
/// Every write goes through [`ProgressService::save_student`], which is the
/// only place `overall_progress` is derived.
#[derive(Clone)]
pub struct ProgressService {
    clock: Clock,
    policy: ProgressPolicy,
    students: Arc<dyn StudentRepository>,
}

impl ProgressService {
    #[must_use]
    pub fn new(
        clock: Clock,
        policy: ProgressPolicy,
        students: Arc<dyn StudentRepository>,
    ) -> Self {
        Self {
            clock,
            policy,
            students,
        }
    }

    #[must_use]
    pub fn policy(&self) -> &ProgressPolicy {
        &self.policy
    }

    #[must_use]
    pub fn clock(&self) -> Clock {
        self.clock
    }

    /// Fetch a student record without creating it.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError::Storage` if the record cannot be read.
    pub async fn get_student(
        &self,
        email: &StudentEmail,
    ) -> Result<Option<StudentRecord>, ProgressError> {
        Ok(self.students.get_student(email).await?)
    }

    /// Every stored student record, ordered by email.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError::Storage` if any record cannot be read.
    pub async fn list_students(&self) -> Result<Vec<StudentRecord>, ProgressError> {
        Ok(self.students.list_students().await?)
    }

    /// Return the record for `email`, creating it on first use.
    ///
    /// An existing record is returned unchanged; `seed` only applies to a new one.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError::Storage` if reading or persisting fails.
    pub async fn ensure_student_record(
        &self,
        email: &StudentEmail,
        name: &str,
        seed: Option<StudentSeed>,
    ) -> Result<StudentRecord, ProgressError> {
        if let Some(existing) = self.students.get_student(email).await? {
            return Ok(existing);
        }

        let mut record = StudentRecord::new(email.clone(), name, &self.policy);
        if let Some(seed) = seed {
            record = record.with_seed(seed);
        }
        let saved = self.save_student(record).await?;
        log::info!("created student record for {email}");
        Ok(saved)
    }

    /// Re-derive aggregates, persist, and return the corrected record.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError::Storage` if persistence fails.
    pub async fn save_student(&self, record: StudentRecord) -> Result<StudentRecord, ProgressError> {
        let record = record.normalized();
        self.students.put_student(&record).await?;
        Ok(record)
    }

    /// Apply a finished practice session to the student's record.
    ///
    /// Returns `Ok(None)` when no record exists for `email`.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError::Storage` if reading or persisting fails.
    pub async fn complete_practice_session(
        &self,
        email: &StudentEmail,
        session: PracticeSession,
    ) -> Result<Option<StudentRecord>, ProgressError> {
        let Some(current) = self.students.get_student(email).await? else {
            log::debug!("no student record for {email}; session ignored");
            return Ok(None);
        };

        let today = self.clock.today();
        let next = current.apply_session(&session, today, &self.policy);
        let saved = self.save_student(next).await?;
        log::info!(
            "session for {email}: {} correct, {} incorrect, streak {}",
            session.correct,
            session.incorrect,
            saved.streak
        );
        Ok(Some(saved))
    }
}
