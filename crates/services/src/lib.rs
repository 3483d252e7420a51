#![forbid(unsafe_code)]

pub mod app_services;
pub mod auth_service;
pub mod class_service;
pub mod error;
pub mod progress_service;

pub use progress_core::Clock;

pub use app_services::AppServices;
pub use auth_service::AuthService;
pub use class_service::{AttentionItem, ClassOverview, ClassService, SubjectAverage};
pub use error::{AppServicesError, AuthError, ClassError, ProgressError};
pub use progress_service::ProgressService;
