use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::model::TopicProgress;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown subject code: {0}")]
pub struct SubjectParseError(pub String);

/// The fixed subjects of the default curriculum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Subject {
    Quant,
    Logical,
    Verbal,
}

impl Subject {
    pub const ALL: [Subject; 3] = [Subject::Quant, Subject::Logical, Subject::Verbal];

    /// Short code used by callers to pick a subject.
    #[must_use]
    pub fn code(self) -> &'static str {
        match self {
            Subject::Quant => "quant",
            Subject::Logical => "logical",
            Subject::Verbal => "verbal",
        }
    }

    /// Name of the topic this subject updates.
    #[must_use]
    pub fn topic_name(self) -> &'static str {
        match self {
            Subject::Quant => "Quantitative Aptitude",
            Subject::Logical => "Logical Reasoning",
            Subject::Verbal => "Verbal Ability",
        }
    }

    #[must_use]
    pub fn sub_topics(self) -> &'static [&'static str] {
        match self {
            Subject::Quant => &[
                "Arithmetic",
                "Algebra",
                "Geometry",
                "Data Interpretation",
            ],
            Subject::Logical => &[
                "Puzzles",
                "Seating Arrangement",
                "Blood Relations",
                "Syllogisms",
            ],
            Subject::Verbal => &[
                "Reading Comprehension",
                "Grammar",
                "Vocabulary",
                "Para Jumbles",
            ],
        }
    }

    /// Zero-progress topic entry for this subject.
    #[must_use]
    pub fn blank_topic(self) -> TopicProgress {
        TopicProgress::new(
            self.topic_name(),
            self.sub_topics().iter().map(|s| (*s).to_owned()).collect(),
        )
    }

    /// The default three-topic curriculum, in display order.
    #[must_use]
    pub fn default_curriculum() -> Vec<TopicProgress> {
        Self::ALL.iter().map(|s| s.blank_topic()).collect()
    }
}

impl fmt::Display for Subject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Subject {
    type Err = SubjectParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "quant" => Ok(Subject::Quant),
            "logical" => Ok(Subject::Logical),
            "verbal" => Ok(Subject::Verbal),
            _ => Err(SubjectParseError(s.to_owned())),
        }
    }
}
