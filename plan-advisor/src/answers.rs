use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use tracing::warn;

use crate::survey::{AnswerKind, QUESTIONS, Question, SKIP};

/// An answer parsed according to its question's [`AnswerKind`]
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum AnswerValue {
    /// The user chose the skip label
    Skip,
    Text(String),
    Choice(String),
    Multi(Vec<String>),
    YesNo(bool),
}

impl AnswerValue {
    /// Parse `raw` for `question`. Labels the question does not offer are
    /// still recorded, and logged; an unrecognized yes/no reads as no.
    pub fn parse(question: &Question, raw: &str) -> Self {
        let raw = raw.trim();
        if question.skippable() && raw.eq_ignore_ascii_case(SKIP) {
            return AnswerValue::Skip;
        }
        if !question.accepts(raw) {
            warn!(question_id = %question.id, answer = %raw, "Answer is not one of the offered options");
        }

        match question.kind {
            AnswerKind::Text => AnswerValue::Text(raw.to_string()),
            AnswerKind::SingleChoice => AnswerValue::Choice(raw.to_string()),
            AnswerKind::MultiChoice => AnswerValue::Multi(
                raw.split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .collect(),
            ),
            AnswerKind::YesNo => {
                let lowered = raw.to_ascii_lowercase();
                AnswerValue::YesNo(matches!(lowered.as_str(), "yes" | "y" | "true"))
            }
        }
    }

    pub fn is_skip(&self) -> bool {
        matches!(self, AnswerValue::Skip)
    }
}

/// The user's message as typed, next to its parsed form
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecordedAnswer {
    pub raw: String,
    pub value: AnswerValue,
}

/// Answers collected so far, keyed by question id
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Answers {
    entries: HashMap<String, RecordedAnswer>,
}

impl Answers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build answers from `(question id, raw text)` pairs. Ids that are not in
    /// the survey are ignored.
    pub fn from_pairs<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        let mut answers = Self::new();
        for (id, raw) in pairs {
            if let Some(question) = QUESTIONS.iter().find(|q| q.id == id) {
                answers.record(question, raw);
            }
        }
        answers
    }

    pub fn record(&mut self, question: &Question, raw: &str) -> &RecordedAnswer {
        let answer = RecordedAnswer {
            raw: raw.trim().to_string(),
            value: AnswerValue::parse(question, raw),
        };
        self.entries.insert(question.id.to_string(), answer);
        &self.entries[question.id]
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    pub fn recorded(&self, id: &str) -> Option<&RecordedAnswer> {
        self.entries.get(id)
    }

    /// The parsed answer, with skipped questions reported as absent.
    pub fn given(&self, id: &str) -> Option<&AnswerValue> {
        self.entries
            .get(id)
            .map(|answer| &answer.value)
            .filter(|value| !value.is_skip())
    }

    /// Single-choice or free-text answer.
    pub fn choice(&self, id: &str) -> Option<&str> {
        match self.given(id)? {
            AnswerValue::Choice(s) | AnswerValue::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn is_yes(&self, id: &str) -> bool {
        matches!(self.given(id), Some(AnswerValue::YesNo(true)))
    }

    /// Whether a multi-choice answer includes `label`.
    pub fn selected(&self, id: &str, label: &str) -> bool {
        match self.given(id) {
            Some(AnswerValue::Multi(items)) => items.iter().any(|item| item == label),
            Some(AnswerValue::Choice(item)) => item == label,
            _ => false,
        }
    }

    /// True when every recorded answer is either the skip label or the
    /// user's own name.
    ///
    /// A name that happens to match a real answer (a user called "Yes")
    /// counts as skipped here; that is a known edge case left to product.
    /// The same holds for a blank name: every blank answer then equals it,
    /// so a run of empty messages keeps the current plan.
    pub fn all_skipped(&self, user_name: Option<&str>) -> bool {
        self.entries.values().all(|answer| {
            answer.value.is_skip() || user_name.is_some_and(|name| answer.raw == name)
        })
    }

    /// Raw answer text by question id, for echoing back to the user.
    pub fn to_raw_map(&self) -> BTreeMap<String, String> {
        self.entries
            .iter()
            .map(|(id, answer)| (id.clone(), answer.raw.clone()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::survey::question_ids;

    #[test]
    fn parses_by_question_kind() {
        let answers = Answers::from_pairs([
            (question_ids::NAME, " Alex "),
            (question_ids::FAMILY_SIZE, "Self + Spouse"),
            (question_ids::HEALTHCARE_NEEDS, "Injuries, Ongoing conditions,"),
            (question_ids::DIAGNOSTIC_TESTS, "yes"),
            (question_ids::PRESCRIPTION_DRUGS, "No"),
        ]);

        assert_eq!(answers.choice(question_ids::NAME), Some("Alex"));
        assert_eq!(answers.choice(question_ids::FAMILY_SIZE), Some("Self + Spouse"));
        assert!(answers.selected(question_ids::HEALTHCARE_NEEDS, "Ongoing conditions"));
        assert!(!answers.selected(question_ids::HEALTHCARE_NEEDS, "Preventive care"));
        assert!(answers.is_yes(question_ids::DIAGNOSTIC_TESTS));
        assert!(!answers.is_yes(question_ids::PRESCRIPTION_DRUGS));
        assert_eq!(
            answers.given(question_ids::HEALTHCARE_NEEDS),
            Some(&AnswerValue::Multi(vec![
                "Injuries".to_string(),
                "Ongoing conditions".to_string()
            ]))
        );
    }

    #[test]
    fn skip_reads_as_absent() {
        let answers = Answers::from_pairs([
            (question_ids::DIAGNOSTIC_TESTS, "skip"),
            (question_ids::FAMILY_SIZE, SKIP),
        ]);

        assert!(answers.contains(question_ids::DIAGNOSTIC_TESTS));
        assert!(answers.given(question_ids::DIAGNOSTIC_TESTS).is_none());
        assert!(answers.choice(question_ids::FAMILY_SIZE).is_none());
        assert_eq!(
            answers.recorded(question_ids::FAMILY_SIZE).unwrap().raw,
            SKIP.to_string()
        );
    }

    #[test]
    fn name_question_is_never_skipped() {
        let answers = Answers::from_pairs([(question_ids::NAME, "Skip")]);
        assert_eq!(answers.choice(question_ids::NAME), Some("Skip"));
    }

    #[test]
    fn all_skipped_accepts_name_and_skip_only() {
        let mut answers = Answers::from_pairs([
            (question_ids::NAME, "Alex"),
            (question_ids::COVERAGE_AMOUNT, "Skip"),
            (question_ids::EMERGENCY_ROOM, "Skip"),
        ]);
        assert!(answers.all_skipped(Some("Alex")));
        assert!(!answers.all_skipped(None));

        answers.record(&QUESTIONS[8], "Rarely");
        assert!(!answers.all_skipped(Some("Alex")));
    }

    #[test]
    fn unoffered_labels_are_still_recorded() {
        let answers = Answers::from_pairs([
            (question_ids::PREFERRED_HOSPITAL, "St. Elsewhere"),
            (question_ids::DIAGNOSTIC_TESTS, "maybe"),
        ]);
        assert_eq!(answers.choice(question_ids::PREFERRED_HOSPITAL), Some("St. Elsewhere"));
        assert_eq!(
            answers.given(question_ids::DIAGNOSTIC_TESTS),
            Some(&AnswerValue::YesNo(false))
        );
    }

    #[test]
    fn blank_name_matches_blank_answers() {
        let mut answers = Answers::new();
        for question in QUESTIONS.iter() {
            answers.record(question, "");
        }
        assert!(answers.all_skipped(Some("")));
        assert!(!answers.all_skipped(Some("Alex")));
    }

    #[test]
    fn unknown_ids_are_ignored() {
        let answers = Answers::from_pairs([("favourite_colour", "blue")]);
        assert!(answers.is_empty());
    }
}
