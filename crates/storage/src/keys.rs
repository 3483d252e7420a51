//! Key layout of the shared key-value medium.
//!
//! These names are a compatibility contract with existing stored data and
//! must not change.

use progress_core::model::{ClassId, StudentEmail};

/// Key of the signed-in user record.
pub const AUTH_USER: &str = "auth_user";

pub const STUDENT_PREFIX: &str = "student_data_";

pub const CLASS_PREFIX: &str = "class_data_";

/// `student_data_<lowercased email>`
#[must_use]
pub fn student_key(email: &StudentEmail) -> String {
    format!("{STUDENT_PREFIX}{}", email.as_str())
}

/// `class_data_<class id>`
#[must_use]
pub fn class_key(class_id: &ClassId) -> String {
    format!("{CLASS_PREFIX}{}", class_id.as_str())
}
