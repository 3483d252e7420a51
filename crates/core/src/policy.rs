use thiserror::Error;

use crate::model::ClassId;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum PolicyError {
    #[error("minutes per question must be > 0")]
    InvalidMinutesPerQuestion,

    #[error("max progress bump must be between 1 and 100")]
    InvalidMaxProgressBump,

    #[error("attention threshold must be between 0 and 100")]
    InvalidAttentionThreshold,

    #[error("active window must be at least 1 day")]
    InvalidActiveWindow,

    #[error("default class id cannot be empty")]
    EmptyDefaultClass,

    #[error("default level cannot be empty")]
    EmptyDefaultLevel,
}

//
// ─── POLICY ────────────────────────────────────────────────────────────────────
//

/// Tunables for session scoring and class aggregation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressPolicy {
    minutes_per_question: u32,
    max_progress_bump: u8,
    attention_threshold: u8,
    active_window_days: u32,
    default_class_id: ClassId,
    default_level: String,
}

impl ProgressPolicy {
    pub const DEFAULT_CLASS_ID: &'static str = "class-a";
    pub const DEFAULT_CLASS_NAME: &'static str = "Class A";

    /// Creates a validated policy.
    ///
    /// # Errors
    ///
    /// Returns `PolicyError` if any value is out of range or empty.
    pub fn new(
        minutes_per_question: u32,
        max_progress_bump: u8,
        attention_threshold: u8,
        active_window_days: u32,
        default_class_id: impl Into<String>,
        default_level: impl Into<String>,
    ) -> Result<Self, PolicyError> {
        if minutes_per_question == 0 {
            return Err(PolicyError::InvalidMinutesPerQuestion);
        }
        if max_progress_bump == 0 || max_progress_bump > 100 {
            return Err(PolicyError::InvalidMaxProgressBump);
        }
        if attention_threshold > 100 {
            return Err(PolicyError::InvalidAttentionThreshold);
        }
        if active_window_days == 0 {
            return Err(PolicyError::InvalidActiveWindow);
        }
        let default_class_id: String = default_class_id.into();
        if default_class_id.trim().is_empty() {
            return Err(PolicyError::EmptyDefaultClass);
        }
        let default_level: String = default_level.into();
        if default_level.trim().is_empty() {
            return Err(PolicyError::EmptyDefaultLevel);
        }

        Ok(Self {
            minutes_per_question,
            max_progress_bump,
            attention_threshold,
            active_window_days,
            default_class_id: ClassId::new(default_class_id.trim()),
            default_level: default_level.trim().to_owned(),
        })
    }

    /// Returns a copy pointing new students at a different class.
    ///
    /// # Errors
    ///
    /// Returns `PolicyError::EmptyDefaultClass` for a blank id.
    pub fn with_default_class(self, class_id: impl Into<String>) -> Result<Self, PolicyError> {
        Self::new(
            self.minutes_per_question,
            self.max_progress_bump,
            self.attention_threshold,
            self.active_window_days,
            class_id,
            self.default_level,
        )
    }

    /// Minutes credited per attempted question when a session reports no time.
    #[must_use]
    pub fn minutes_per_question(&self) -> u32 {
        self.minutes_per_question
    }

    #[must_use]
    pub fn max_progress_bump(&self) -> u8 {
        self.max_progress_bump
    }

    /// Students strictly below this overall progress need attention.
    #[must_use]
    pub fn attention_threshold(&self) -> u8 {
        self.attention_threshold
    }

    #[must_use]
    pub fn active_window_days(&self) -> u32 {
        self.active_window_days
    }

    #[must_use]
    pub fn default_class_id(&self) -> &ClassId {
        &self.default_class_id
    }

    #[must_use]
    pub fn default_level(&self) -> &str {
        &self.default_level
    }

    /// Display name for a class created on demand.
    #[must_use]
    pub fn class_name_for(&self, class_id: &ClassId) -> String {
        if class_id.as_str() == Self::DEFAULT_CLASS_ID {
            Self::DEFAULT_CLASS_NAME.to_owned()
        } else {
            format!("Class {class_id}")
        }
    }
}

impl Default for ProgressPolicy {
    fn default() -> Self {
        Self {
            minutes_per_question: 2,
            max_progress_bump: 5,
            attention_threshold: 50,
            active_window_days: 7,
            default_class_id: ClassId::new(Self::DEFAULT_CLASS_ID),
            default_level: "Beginner".to_owned(),
        }
    }
}
