use std::sync::Arc;

use progress_core::model::{AuthUser, Role, StudentEmail, StudentSeed};
use storage::repository::AuthRepository;

use crate::class_service::ClassService;
use crate::error::AuthError;
use crate::progress_service::ProgressService;

/// Remembers who is signed in on this device.
///
/// There is no password check: signing in only stores the identity triple.
#[derive(Clone)]
pub struct AuthService {
    auth: Arc<dyn AuthRepository>,
    progress: Arc<ProgressService>,
    classes: Arc<ClassService>,
}

impl AuthService {
    #[must_use]
    pub fn new(
        auth: Arc<dyn AuthRepository>,
        progress: Arc<ProgressService>,
        classes: Arc<ClassService>,
    ) -> Self {
        Self {
            auth,
            progress,
            classes,
        }
    }

    /// Store the signed-in user.
    ///
    /// Students also get a progress record and a seat in their class. A blank
    /// name falls back to the local part of the email.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Email` for a blank email, or storage errors.
    pub async fn sign_in(&self, name: &str, email: &str, role: Role) -> Result<AuthUser, AuthError> {
        let email = StudentEmail::parse(email)?;
        let name = match name.trim() {
            "" => email.local_part().to_owned(),
            trimmed => trimmed.to_owned(),
        };
        let user = AuthUser {
            name,
            email,
            role,
        };
        self.auth.put_auth_user(&user).await?;

        if role == Role::Student {
            let seed = StudentSeed {
                role: Some(role),
                ..StudentSeed::default()
            };
            let record = self
                .progress
                .ensure_student_record(&user.email, &user.name, Some(seed))
                .await?;
            let class_id = record
                .class_id
                .unwrap_or_else(|| self.progress.policy().default_class_id().clone());
            self.classes
                .add_student_to_class(&class_id, &user.email)
                .await?;
        }

        log::info!("signed in {} as {}", user.email, user.role);
        Ok(user)
    }

    /// Forget the signed-in user. Progress records are kept.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Storage` if the key cannot be removed.
    pub async fn sign_out(&self) -> Result<(), AuthError> {
        self.auth.clear_auth_user().await?;
        log::info!("signed out");
        Ok(())
    }

    /// # Errors
    ///
    /// Returns `AuthError::Storage` if the stored user cannot be read.
    pub async fn current_user(&self) -> Result<Option<AuthUser>, AuthError> {
        Ok(self.auth.get_auth_user().await?)
    }
}
