//! The ordered survey the conversation walks through.

use serde::{Deserialize, Serialize};

/// Answer label meaning "no preference given".
pub const SKIP: &str = "Skip";

pub mod question_ids {
    pub const NAME: &str = "name";
    pub const COVERAGE_AMOUNT: &str = "coverage_amount";
    pub const PREFERRED_HOSPITAL: &str = "preferred_hospital";
    pub const FAMILY_SIZE: &str = "family_size";
    pub const ADDITIONAL_SERVICES: &str = "additional_services";
    pub const HEALTHCARE_NEEDS: &str = "healthcare_needs";
    pub const DIAGNOSTIC_TESTS: &str = "diagnostic_tests";
    pub const PRESCRIPTION_DRUGS: &str = "prescription_drugs";
    pub const EMERGENCY_ROOM: &str = "emergency_room";
    pub const MATERNITY_PLANNING: &str = "maternity_planning";
    pub const WELLNESS_BENEFITS: &str = "wellness_benefits";
}

/// How an answer to a question is interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnswerKind {
    Text,
    SingleChoice,
    /// Several labels joined with commas
    MultiChoice,
    /// "Yes" or "No"
    YesNo,
}

/// Question type as presented to the chat client
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuestionType {
    Text,
    Options,
    Boolean,
}

impl From<AnswerKind> for QuestionType {
    fn from(kind: AnswerKind) -> Self {
        match kind {
            AnswerKind::Text => QuestionType::Text,
            AnswerKind::SingleChoice | AnswerKind::MultiChoice => QuestionType::Options,
            AnswerKind::YesNo => QuestionType::Boolean,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Question {
    pub id: &'static str,
    pub prompt: &'static str,
    pub kind: AnswerKind,
    pub choices: &'static [&'static str],
}

impl Question {
    /// Whether the skip label is offered for this question. The name question
    /// is the only one that cannot be skipped.
    pub fn skippable(&self) -> bool {
        self.id != question_ids::NAME
    }

    /// Choice labels shown to the user, skip label last.
    pub fn options(&self) -> Vec<String> {
        let mut options: Vec<String> = self.choices.iter().map(|c| c.to_string()).collect();
        if self.skippable() {
            options.push(SKIP.to_string());
        }
        options
    }

    pub fn question_type(&self) -> QuestionType {
        self.kind.into()
    }

    /// Whether `raw` is an answer this question offers. Free text accepts
    /// anything; multi-choice requires every comma-separated item to match.
    pub fn accepts(&self, raw: &str) -> bool {
        let raw = raw.trim();
        if self.skippable() && raw.eq_ignore_ascii_case(SKIP) {
            return true;
        }
        let offered = |label: &str| self.choices.iter().any(|c| c.eq_ignore_ascii_case(label));

        match self.kind {
            AnswerKind::Text => true,
            AnswerKind::SingleChoice => offered(raw),
            AnswerKind::MultiChoice => raw
                .split(',')
                .map(str::trim)
                .filter(|item| !item.is_empty())
                .all(offered),
            AnswerKind::YesNo => matches!(
                raw.to_ascii_lowercase().as_str(),
                "yes" | "y" | "true" | "no" | "n" | "false"
            ),
        }
    }
}

const YES_NO: &[&str] = &["Yes", "No"];

pub static QUESTIONS: [Question; 11] = [
    Question {
        id: question_ids::NAME,
        prompt: "Hello! I'm your insurance assistant. What's your name?",
        kind: AnswerKind::Text,
        choices: &[],
    },
    Question {
        id: question_ids::COVERAGE_AMOUNT,
        prompt: "What is your desired coverage amount?",
        kind: AnswerKind::SingleChoice,
        choices: &["$250,000", "$500,000", "$750,000", "$1,000,000", "$2,000,000"],
    },
    Question {
        id: question_ids::PREFERRED_HOSPITAL,
        prompt: "What is your preferred hospital network?",
        kind: AnswerKind::SingleChoice,
        choices: &[
            "Mayo Clinic",
            "Cleveland Clinic",
            "Johns Hopkins",
            "Local Hospital Network",
            "Other",
        ],
    },
    Question {
        id: question_ids::FAMILY_SIZE,
        prompt: "What is the size of your family to be covered?",
        kind: AnswerKind::SingleChoice,
        choices: &[
            "Self",
            "Self + Spouse",
            "Self + Child",
            "Self + Spouse + 1 Child",
            "Self + Spouse + 2 Children",
            "Self + Spouse + 3+ Children",
        ],
    },
    Question {
        id: question_ids::ADDITIONAL_SERVICES,
        prompt: "Which additional services would you like included in your plan? (Select all that apply)",
        kind: AnswerKind::MultiChoice,
        choices: &[
            "Maternity coverage",
            "Dental",
            "Vision",
            "Mental Health Coverage",
            "Prescription Drug Coverage",
        ],
    },
    Question {
        id: question_ids::HEALTHCARE_NEEDS,
        prompt: "What are your primary healthcare needs? (Select all that apply)",
        kind: AnswerKind::MultiChoice,
        choices: &[
            "Regular doctor visits",
            "Ongoing conditions",
            "Injuries",
            "Preventive care",
            "Specialist visits",
        ],
    },
    Question {
        id: question_ids::DIAGNOSTIC_TESTS,
        prompt: "Do you require frequent diagnostic tests, like X-rays or blood work?",
        kind: AnswerKind::YesNo,
        choices: YES_NO,
    },
    Question {
        id: question_ids::PRESCRIPTION_DRUGS,
        prompt: "Do you regularly take prescription drugs?",
        kind: AnswerKind::YesNo,
        choices: YES_NO,
    },
    Question {
        id: question_ids::EMERGENCY_ROOM,
        prompt: "How often do you visit the emergency room?",
        kind: AnswerKind::SingleChoice,
        choices: &["Rarely", "Occasionally", "Frequently"],
    },
    Question {
        id: question_ids::MATERNITY_PLANNING,
        prompt: "Are you planning for pregnancy or maternity-related services in the near future?",
        kind: AnswerKind::YesNo,
        choices: YES_NO,
    },
    Question {
        id: question_ids::WELLNESS_BENEFITS,
        prompt: "Would you like to include additional wellness benefits?",
        kind: AnswerKind::YesNo,
        choices: YES_NO,
    },
];

pub fn question_count() -> usize {
    QUESTIONS.len()
}

pub fn question_at(index: usize) -> Option<&'static Question> {
    QUESTIONS.get(index)
}
