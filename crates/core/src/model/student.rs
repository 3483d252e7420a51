use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::model::ids::{ClassId, StudentEmail, StudentId};
use crate::model::subject::Subject;
use crate::policy::ProgressPolicy;
use crate::progress::{SessionScore, clamp_percent, next_streak, overall_progress};

//
// ─── ROLE ──────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown role: {0}")]
pub struct RoleParseError(pub String);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    Student,
    Teacher,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Student => f.write_str("student"),
            Role::Teacher => f.write_str("teacher"),
        }
    }
}

impl FromStr for Role {
    type Err = RoleParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "student" => Ok(Role::Student),
            "teacher" => Ok(Role::Teacher),
            _ => Err(RoleParseError(s.to_owned())),
        }
    }
}

//
// ─── SIGNED-IN USER ────────────────────────────────────────────────────────────
//

/// The locally remembered signed-in user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUser {
    pub name: String,
    pub email: StudentEmail,
    pub role: Role,
}

//
// ─── DIAGNOSTICS ───────────────────────────────────────────────────────────────
//

/// Skill scores, each in `[0, 100]`. Set at creation and never updated by sessions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Diagnostics {
    pub listening: u8,
    pub grasping: u8,
    pub retention: u8,
    pub application: u8,
}

impl Diagnostics {
    #[must_use]
    pub fn new(listening: u8, grasping: u8, retention: u8, application: u8) -> Self {
        Self {
            listening,
            grasping,
            retention,
            application,
        }
        .clamped()
    }

    #[must_use]
    pub fn clamped(self) -> Self {
        Self {
            listening: clamp_percent(i64::from(self.listening)),
            grasping: clamp_percent(i64::from(self.grasping)),
            retention: clamp_percent(i64::from(self.retention)),
            application: clamp_percent(i64::from(self.application)),
        }
    }
}

//
// ─── TOPIC PROGRESS ────────────────────────────────────────────────────────────
//

/// Per-subject progress embedded in a student record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopicProgress {
    pub name: String,
    pub progress: u8,
    pub recent_score: u8,
    pub questions_completed: u32,
    #[serde(default)]
    pub sub_topics: Vec<String>,
}

impl TopicProgress {
    #[must_use]
    pub fn new(name: impl Into<String>, sub_topics: Vec<String>) -> Self {
        Self {
            name: name.into(),
            progress: 0,
            recent_score: 0,
            questions_completed: 0,
            sub_topics,
        }
    }

    fn clamped(mut self) -> Self {
        self.progress = clamp_percent(i64::from(self.progress));
        self.recent_score = clamp_percent(i64::from(self.recent_score));
        self
    }

    fn record_session(&mut self, score: &SessionScore) {
        self.questions_completed = self.questions_completed.saturating_add(score.attempted);
        self.progress = clamp_percent(i64::from(self.progress) + i64::from(score.progress_bump));
        self.recent_score = score.recent_score;
    }
}

//
// ─── PRACTICE SESSION ──────────────────────────────────────────────────────────
//

/// Aggregate result of one finished practice session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PracticeSession {
    pub correct: u32,
    pub incorrect: u32,
    /// Elapsed minutes; derived from the attempt count when absent.
    pub time_minutes: Option<u32>,
    /// Topic to credit; the first topic when absent.
    pub subject: Option<Subject>,
}

impl PracticeSession {
    #[must_use]
    pub fn new(correct: u32, incorrect: u32) -> Self {
        Self {
            correct,
            incorrect,
            time_minutes: None,
            subject: None,
        }
    }

    #[must_use]
    pub fn with_minutes(mut self, minutes: u32) -> Self {
        self.time_minutes = Some(minutes);
        self
    }

    #[must_use]
    pub fn with_subject(mut self, subject: Subject) -> Self {
        self.subject = Some(subject);
        self
    }
}

//
// ─── SEED ──────────────────────────────────────────────────────────────────────
//

/// Optional overrides applied when a student record is first created.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StudentSeed {
    pub role: Option<Role>,
    pub level: Option<String>,
    pub total_questions: Option<u32>,
    pub streak: Option<u32>,
    pub study_time_today_minutes: Option<u32>,
    pub diagnostics: Option<Diagnostics>,
    pub topics: Option<Vec<TopicProgress>>,
    pub class_id: Option<ClassId>,
    pub last_session_date: Option<NaiveDate>,
}

//
// ─── STUDENT RECORD ────────────────────────────────────────────────────────────
//

/// Persisted progress of one student.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentRecord {
    pub id: StudentId,
    pub name: String,
    pub email: StudentEmail,
    #[serde(default)]
    pub role: Role,
    pub level: String,
    pub total_questions: u32,
    pub streak: u32,
    pub study_time_today_minutes: u32,
    pub overall_progress: u8,
    #[serde(default)]
    pub diagnostics: Diagnostics,
    #[serde(default)]
    pub topics: Vec<TopicProgress>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class_id: Option<ClassId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_session_date: Option<NaiveDate>,
}

impl StudentRecord {
    /// Builds a fresh record with zero stats and the default curriculum.
    #[must_use]
    pub fn new(email: StudentEmail, name: impl Into<String>, policy: &ProgressPolicy) -> Self {
        Self {
            id: StudentId::generate(),
            name: name.into(),
            email,
            role: Role::Student,
            level: policy.default_level().to_owned(),
            total_questions: 0,
            streak: 0,
            study_time_today_minutes: 0,
            overall_progress: 0,
            diagnostics: Diagnostics::default(),
            topics: Subject::default_curriculum(),
            class_id: Some(policy.default_class_id().clone()),
            last_session_date: None,
        }
    }

    /// Applies seed overrides on top of a fresh record.
    #[must_use]
    pub fn with_seed(mut self, seed: StudentSeed) -> Self {
        if let Some(role) = seed.role {
            self.role = role;
        }
        if let Some(level) = seed.level {
            self.level = level;
        }
        if let Some(total) = seed.total_questions {
            self.total_questions = total;
        }
        if let Some(streak) = seed.streak {
            self.streak = streak;
        }
        if let Some(minutes) = seed.study_time_today_minutes {
            self.study_time_today_minutes = minutes;
        }
        if let Some(diagnostics) = seed.diagnostics {
            self.diagnostics = diagnostics;
        }
        if let Some(topics) = seed.topics {
            self.topics = topics;
        }
        if seed.class_id.is_some() {
            self.class_id = seed.class_id;
        }
        if seed.last_session_date.is_some() {
            self.last_session_date = seed.last_session_date;
        }
        self
    }

    /// Clamps percentages and re-derives `overall_progress` from the topics.
    #[must_use]
    pub fn normalized(mut self) -> Self {
        self.diagnostics = self.diagnostics.clamped();
        self.topics = self.topics.into_iter().map(TopicProgress::clamped).collect();
        self.overall_progress = overall_progress(&self.topics);
        self
    }

    /// Index of the topic a session for `subject` should credit.
    ///
    /// Falls back to the first topic when no subject is given or no topic
    /// carries the subject's name.
    #[must_use]
    pub fn topic_index_for(&self, subject: Option<Subject>) -> Option<usize> {
        subject
            .and_then(|s| self.topics.iter().position(|t| t.name == s.topic_name()))
            .or_else(|| (!self.topics.is_empty()).then_some(0))
    }

    /// Returns the record after completing `session` on `today`.
    ///
    /// `overall_progress` is left for `normalized` to re-derive.
    #[must_use]
    pub fn apply_session(
        &self,
        session: &PracticeSession,
        today: NaiveDate,
        policy: &ProgressPolicy,
    ) -> Self {
        let score =
            SessionScore::from_counts(session.correct, session.incorrect, policy.max_progress_bump());
        let minutes = session
            .time_minutes
            .unwrap_or_else(|| score.attempted.saturating_mul(policy.minutes_per_question()));

        let mut next = self.clone();
        next.streak = next_streak(self.last_session_date, self.streak, today);
        if let Some(idx) = next.topic_index_for(session.subject) {
            next.topics[idx].record_session(&score);
        }
        next.total_questions = next.total_questions.saturating_add(score.attempted);
        next.study_time_today_minutes = next.study_time_today_minutes.saturating_add(minutes);
        next.last_session_date = Some(today);
        next
    }

    /// Whether the student counts as active for class statistics.
    #[must_use]
    pub fn is_active(&self, today: NaiveDate, window_days: u32) -> bool {
        if self.total_questions > 0 {
            return true;
        }
        self.last_session_date.is_some_and(|last| {
            let days = today.signed_duration_since(last).num_days();
            (0..=i64::from(window_days)).contains(&days)
        })
    }
}
