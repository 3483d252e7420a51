use serde::{Deserialize, Serialize};

use crate::model::ids::{ClassId, StudentEmail};

/// Roster of one class. `student_emails` behaves as an insertion-ordered set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassRecord {
    pub id: ClassId,
    pub name: String,
    #[serde(default)]
    pub student_emails: Vec<StudentEmail>,
}

impl ClassRecord {
    #[must_use]
    pub fn new(id: ClassId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            student_emails: Vec::new(),
        }
    }

    #[must_use]
    pub fn contains(&self, email: &StudentEmail) -> bool {
        self.student_emails.contains(email)
    }

    /// Appends `email` unless already present. Returns whether it was added.
    pub fn add_student(&mut self, email: StudentEmail) -> bool {
        if self.contains(&email) {
            return false;
        }
        self.student_emails.push(email);
        true
    }
}
