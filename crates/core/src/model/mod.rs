mod class;
mod ids;
mod student;
mod subject;

pub use ids::{ClassId, EmailError, StudentEmail, StudentId};

pub use class::ClassRecord;
pub use student::{
    AuthUser, Diagnostics, PracticeSession, Role, RoleParseError, StudentRecord, StudentSeed,
    TopicProgress,
};
pub use subject::{Subject, SubjectParseError};
