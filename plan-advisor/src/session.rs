use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::{
    answers::{Answers, RecordedAnswer},
    scoring::Recommendation,
    survey::{Question, question_count, question_at, question_ids},
};

/// Coarse conversation state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Questioning,
    SelectingPlan,
}

/// One user's in-progress conversation
#[derive(Debug, Clone)]
pub struct Session {
    pub user_id: String,
    pub answers: Answers,
    /// Index of the next question to ask, in `0..=question_count()`
    pub question_index: usize,
    pub phase: Phase,
    pub user_name: Option<String>,
    /// Set once the opening message has been answered with the first question
    pub started: bool,
    /// Top plans computed when questioning finished
    pub recommendations: Vec<Recommendation>,
    pub created_at: DateTime<Utc>,
    pub last_activity: DateTime<Utc>,
}

impl Session {
    pub fn new(user_id: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            user_id: user_id.into(),
            answers: Answers::new(),
            question_index: 0,
            phase: Phase::Questioning,
            user_name: None,
            started: false,
            recommendations: Vec::new(),
            created_at: now,
            last_activity: now,
        }
    }

    pub fn touch(&mut self) {
        self.last_activity = Utc::now();
    }

    pub fn current_question(&self) -> Option<&'static Question> {
        question_at(self.question_index)
    }

    pub fn questions_exhausted(&self) -> bool {
        self.question_index >= question_count()
    }

    /// Record `message` as the answer to the current question and advance.
    /// Returns `None` when there is no question left to answer.
    pub fn record_answer(&mut self, message: &str) -> Option<RecordedAnswer> {
        let question = self.current_question()?;
        let recorded = self.answers.record(question, message).clone();
        if question.id == question_ids::NAME {
            self.user_name = Some(recorded.raw.clone());
        }
        self.question_index += 1;
        Some(recorded)
    }

    /// Every answer so far was the skip label or the user's own name.
    pub fn all_skipped(&self) -> bool {
        self.answers.all_skipped(self.user_name.as_deref())
    }

    pub fn is_idle_since(&self, cutoff: DateTime<Utc>) -> bool {
        self.last_activity < cutoff
    }
}
