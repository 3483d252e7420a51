use std::sync::Arc;

use chrono::{Duration, NaiveDate};
use serde::Serialize;

use progress_core::model::{
    ClassId, ClassRecord, Diagnostics, Role, StudentEmail, StudentRecord, StudentSeed, Subject,
};
use progress_core::progress::round_percent;
use storage::repository::ClassRepository;

use crate::error::ClassError;
use crate::progress_service::ProgressService;

//
// ─── OVERVIEW ──────────────────────────────────────────────────────────────────
//

/// A student whose overall progress is below the attention threshold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttentionItem {
    pub email: StudentEmail,
    pub name: String,
    pub overall_progress: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectAverage {
    pub subject: Subject,
    pub average_progress: u8,
}

/// Teacher-facing aggregate of a class.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassOverview {
    pub class_id: ClassId,
    pub name: String,
    pub student_count: usize,
    pub average_progress: u8,
    pub active_students: usize,
    pub needs_attention: Vec<AttentionItem>,
    pub subject_averages: Vec<SubjectAverage>,
}

fn mean_percent(values: impl Iterator<Item = u8>) -> u8 {
    let (sum, count) = values.fold((0_u64, 0_u64), |(s, c), v| (s + u64::from(v), c + 1));
    if count == 0 {
        return 0;
    }
    #[allow(clippy::cast_precision_loss)]
    let mean = sum as f64 / count as f64;
    round_percent(mean)
}

//
// ─── SERVICE ───────────────────────────────────────────────────────────────────
//

/// Class rosters and class-level statistics.
#[derive(Clone)]
pub struct ClassService {
    classes: Arc<dyn ClassRepository>,
    progress: Arc<ProgressService>,
}

impl ClassService {
    #[must_use]
    pub fn new(classes: Arc<dyn ClassRepository>, progress: Arc<ProgressService>) -> Self {
        Self { classes, progress }
    }

    /// Fetch a class by id.
    ///
    /// # Errors
    ///
    /// Returns `ClassError::Storage` if the class cannot be read.
    pub async fn get_class(&self, class_id: &ClassId) -> Result<Option<ClassRecord>, ClassError> {
        Ok(self.classes.get_class(class_id).await?)
    }

    /// Add `email` to the class roster, creating the class if needed.
    ///
    /// Adding an email that is already on the roster leaves it unchanged.
    ///
    /// # Errors
    ///
    /// Returns `ClassError::Storage` if reading or persisting fails.
    pub async fn add_student_to_class(
        &self,
        class_id: &ClassId,
        email: &StudentEmail,
    ) -> Result<ClassRecord, ClassError> {
        let mut class = match self.classes.get_class(class_id).await? {
            Some(class) => class,
            None => ClassRecord::new(
                class_id.clone(),
                self.progress.policy().class_name_for(class_id),
            ),
        };

        if class.add_student(email.clone()) {
            self.classes.put_class(&class).await?;
            log::info!("added {email} to class {class_id}");
        }
        Ok(class)
    }

    /// Resolve every roster email to its student record.
    ///
    /// A roster email without a record gets a default one. An unknown class
    /// yields an empty list.
    ///
    /// # Errors
    ///
    /// Returns `ClassError` if any record cannot be read or created.
    pub async fn get_class_students(
        &self,
        class_id: &ClassId,
    ) -> Result<Vec<StudentRecord>, ClassError> {
        match self.classes.get_class(class_id).await? {
            Some(class) => self.resolve_roster(&class).await,
            None => Ok(Vec::new()),
        }
    }

    async fn resolve_roster(&self, class: &ClassRecord) -> Result<Vec<StudentRecord>, ClassError> {
        let mut students = Vec::with_capacity(class.student_emails.len());
        for email in &class.student_emails {
            let record = match self.progress.get_student(email).await? {
                Some(record) => record,
                None => {
                    log::warn!("roster of {} lists {email} without a record", class.id);
                    let seed = StudentSeed {
                        class_id: Some(class.id.clone()),
                        ..StudentSeed::default()
                    };
                    self.progress
                        .ensure_student_record(email, email.local_part(), Some(seed))
                        .await?
                }
            };
            students.push(record.normalized());
        }
        Ok(students)
    }

    /// Aggregate statistics for the teacher dashboard.
    ///
    /// # Errors
    ///
    /// Returns `ClassError` if the roster cannot be resolved.
    pub async fn class_overview(&self, class_id: &ClassId) -> Result<ClassOverview, ClassError> {
        let policy = self.progress.policy();
        let today = self.progress.clock().today();
        let (name, students) = match self.classes.get_class(class_id).await? {
            Some(class) => {
                let students = self.resolve_roster(&class).await?;
                (class.name, students)
            }
            None => (policy.class_name_for(class_id), Vec::new()),
        };

        Ok(summarize(
            class_id.clone(),
            name,
            &students,
            today,
            policy.attention_threshold(),
            policy.active_window_days(),
        ))
    }

    /// Create the default class with its demo roster, once.
    ///
    /// If the default class already exists it is returned untouched.
    ///
    /// # Errors
    ///
    /// Returns `ClassError` if any record cannot be read or persisted.
    pub async fn seed_default_roster(&self) -> Result<ClassRecord, ClassError> {
        let policy = self.progress.policy();
        let class_id = policy.default_class_id().clone();
        if let Some(existing) = self.classes.get_class(&class_id).await? {
            return Ok(existing);
        }

        let today = self.progress.clock().today();
        let mut class = ClassRecord::new(class_id.clone(), policy.class_name_for(&class_id));
        for demo in DEMO_ROSTER {
            let email = StudentEmail::parse(demo.email)?;
            let seed = demo.seed(&class_id, today);
            self.progress
                .ensure_student_record(&email, demo.name, Some(seed))
                .await?;
            class.add_student(email);
        }

        self.classes.put_class(&class).await?;
        log::info!(
            "seeded class {class_id} with {} students",
            class.student_emails.len()
        );
        Ok(class)
    }
}

fn summarize(
    class_id: ClassId,
    name: String,
    students: &[StudentRecord],
    today: NaiveDate,
    attention_threshold: u8,
    active_window_days: u32,
) -> ClassOverview {
    let needs_attention = students
        .iter()
        .filter(|s| s.overall_progress < attention_threshold)
        .map(|s| AttentionItem {
            email: s.email.clone(),
            name: s.name.clone(),
            overall_progress: s.overall_progress,
        })
        .collect();

    let subject_averages = Subject::ALL
        .iter()
        .map(|subject| SubjectAverage {
            subject: *subject,
            average_progress: mean_percent(students.iter().filter_map(|s| {
                s.topics
                    .iter()
                    .find(|t| t.name == subject.topic_name())
                    .map(|t| t.progress)
            })),
        })
        .collect();

    ClassOverview {
        class_id,
        name,
        student_count: students.len(),
        average_progress: mean_percent(students.iter().map(|s| s.overall_progress)),
        active_students: students
            .iter()
            .filter(|s| s.is_active(today, active_window_days))
            .count(),
        needs_attention,
        subject_averages,
    }
}

//
// ─── DEMO ROSTER ───────────────────────────────────────────────────────────────
//

struct DemoStudent {
    email: &'static str,
    name: &'static str,
    level: &'static str,
    diagnostics: [u8; 4],
    topic_progress: [u8; 3],
    recent_scores: [u8; 3],
    total_questions: u32,
    streak: u32,
    days_since_session: Option<i64>,
}

impl DemoStudent {
    fn seed(&self, class_id: &ClassId, today: NaiveDate) -> StudentSeed {
        let mut topics = Subject::default_curriculum();
        let per_topic = self.total_questions / 3;
        for (i, topic) in topics.iter_mut().enumerate() {
            topic.progress = self.topic_progress[i];
            topic.recent_score = self.recent_scores[i];
            topic.questions_completed = per_topic;
        }
        let [listening, grasping, retention, application] = self.diagnostics;

        StudentSeed {
            role: Some(Role::Student),
            level: Some(self.level.to_owned()),
            total_questions: Some(self.total_questions),
            streak: Some(self.streak),
            study_time_today_minutes: None,
            diagnostics: Some(Diagnostics::new(listening, grasping, retention, application)),
            topics: Some(topics),
            class_id: Some(class_id.clone()),
            last_session_date: self
                .days_since_session
                .map(|days| today - Duration::days(days)),
        }
    }
}

const DEMO_ROSTER: [DemoStudent; 4] = [
    DemoStudent {
        email: "aarav.sharma@example.com",
        name: "Aarav Sharma",
        level: "Intermediate",
        diagnostics: [72, 65, 58, 61],
        topic_progress: [62, 48, 55],
        recent_scores: [70, 60, 65],
        total_questions: 180,
        streak: 4,
        days_since_session: Some(0),
    },
    DemoStudent {
        email: "diya.patel@example.com",
        name: "Diya Patel",
        level: "Advanced",
        diagnostics: [85, 80, 77, 82],
        topic_progress: [81, 74, 79],
        recent_scores: [90, 80, 85],
        total_questions: 320,
        streak: 9,
        days_since_session: Some(1),
    },
    DemoStudent {
        email: "kabir.singh@example.com",
        name: "Kabir Singh",
        level: "Beginner",
        diagnostics: [40, 35, 42, 30],
        topic_progress: [28, 35, 22],
        recent_scores: [40, 50, 30],
        total_questions: 60,
        streak: 1,
        days_since_session: Some(5),
    },
    DemoStudent {
        email: "meera.iyer@example.com",
        name: "Meera Iyer",
        level: "Beginner",
        diagnostics: [55, 50, 45, 52],
        topic_progress: [0, 0, 0],
        recent_scores: [0, 0, 0],
        total_questions: 0,
        streak: 0,
        days_since_session: None,
    },
];
