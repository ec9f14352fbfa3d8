//! Request and response shapes of a conversation turn.

use serde::{Deserialize, Serialize};

use crate::{
    error::{AdvisorError, Result},
    scoring::Recommendation,
    summary::PlanSummary,
    survey::{Question, QuestionType},
};

/// Inbound chat message. Fields are optional so that a request missing one is
/// rejected by validation rather than by the transport.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TurnRequest {
    pub message: Option<String>,
    pub user_id: Option<String>,
}

impl TurnRequest {
    pub fn new(user_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
            user_id: Some(user_id.into()),
        }
    }

    /// Split into `(user_id, message)`, rejecting missing fields and blank ids.
    pub fn validate(self) -> Result<(String, String)> {
        let message = self
            .message
            .ok_or_else(|| AdvisorError::InvalidRequest("message is required".to_string()))?;
        let user_id = self
            .user_id
            .filter(|id| !id.trim().is_empty())
            .ok_or_else(|| AdvisorError::InvalidRequest("userId is required".to_string()))?;
        Ok((user_id, message))
    }
}

/// Reply to one conversation turn
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TurnResponse {
    Question {
        message: String,
        options: Vec<String>,
        #[serde(rename = "questionType")]
        question_type: QuestionType,
    },
    /// Top plans; the client lists them numbered from 1
    Recommendations {
        message: String,
        recommendations: Vec<Recommendation>,
    },
    /// The user kept their current plan without scoring
    FinalSummary {
        message: String,
        recommendations: Vec<Recommendation>,
        summary: PlanSummary,
    },
    PlanSelected {
        message: String,
        summary: PlanSummary,
    },
    Error {
        message: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        recommendations: Option<Vec<Recommendation>>,
    },
}

impl TurnResponse {
    pub fn question(question: &Question) -> Self {
        TurnResponse::Question {
            message: question.prompt.to_string(),
            options: question.options(),
            question_type: question.question_type(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        TurnResponse::Error {
            message: message.into(),
            recommendations: None,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, TurnResponse::Error { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::survey::QUESTIONS;
    use serde_json::json;

    #[test]
    fn missing_fields_are_rejected() {
        let missing_user = TurnRequest {
            message: Some("hi".to_string()),
            user_id: None,
        };
        assert!(matches!(
            missing_user.validate(),
            Err(AdvisorError::InvalidRequest(_))
        ));

        let blank_user = TurnRequest::new("   ", "hi");
        assert!(blank_user.validate().is_err());

        let missing_message: TurnRequest = serde_json::from_value(json!({ "userId": "u1" })).unwrap();
        assert!(missing_message.validate().is_err());

        let ok: TurnRequest =
            serde_json::from_value(json!({ "userId": "u1", "message": "" })).unwrap();
        assert_eq!(ok.validate().unwrap(), ("u1".to_string(), String::new()));
    }

    #[test]
    fn question_serializes_with_type_tag() {
        let value = serde_json::to_value(TurnResponse::question(&QUESTIONS[6])).unwrap();
        assert_eq!(value["type"], "question");
        assert_eq!(value["questionType"], "boolean");
        assert_eq!(value["options"], json!(["Yes", "No", "Skip"]));
    }

    #[test]
    fn error_omits_missing_recommendations() {
        let value = serde_json::to_value(TurnResponse::error("nope")).unwrap();
        assert_eq!(value, json!({ "type": "error", "message": "nope" }));
    }
}
