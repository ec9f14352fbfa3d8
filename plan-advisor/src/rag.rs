use chrono::{DateTime, Duration as IdleDuration, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use crate::{
    catalog::{CURRENT_PLAN_NAME, Plan, find_plan},
    collaborators::{ContextRetriever, NarrativeGenerator, RetrievedContext, with_timeout},
    error::{AdvisorError, Result},
};

pub const RAG_INTRO: &str = "I am an AI assistant. I will help you with questions about the plan.";
pub const RAG_FAILURE: &str =
    "Unable to process your question at this time. Please try again later.";

/// A free-form question about a plan
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RagRequest {
    pub message: Option<String>,
    pub user_id: Option<String>,
    /// Plan the question is about; the current plan when absent
    pub plan: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RagMetadata {
    pub context: String,
    pub confidence: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RagResponse {
    AiResponse {
        message: String,
        metadata: RagMetadata,
    },
    Error {
        message: String,
    },
}

/// Answers plan questions from the plan's own documents
pub struct RagAssistant {
    retriever: Arc<dyn ContextRetriever>,
    narrator: Arc<dyn NarrativeGenerator>,
    /// Users who already got the introduction, with their last question time
    greeted: DashMap<String, DateTime<Utc>>,
    timeout: Duration,
}

impl RagAssistant {
    pub fn new(
        retriever: Arc<dyn ContextRetriever>,
        narrator: Arc<dyn NarrativeGenerator>,
        timeout: Duration,
    ) -> Self {
        Self {
            retriever,
            narrator,
            greeted: DashMap::new(),
            timeout,
        }
    }

    /// Answer one question. `Err` only for malformed requests.
    pub async fn ask(&self, request: RagRequest) -> Result<RagResponse> {
        let message = request
            .message
            .ok_or_else(|| AdvisorError::InvalidRequest("message is required".to_string()))?;
        let user_id = request
            .user_id
            .filter(|id| !id.trim().is_empty())
            .ok_or_else(|| AdvisorError::InvalidRequest("userId is required".to_string()))?;

        if self.greeted.insert(user_id.clone(), Utc::now()).is_none() {
            info!(user_id = %user_id, "First plan question, sending introduction");
            return Ok(RagResponse::AiResponse {
                message: RAG_INTRO.to_string(),
                metadata: RagMetadata {
                    context: String::new(),
                    confidence: 0.0,
                },
            });
        }

        let plan_name = request.plan.as_deref().unwrap_or(CURRENT_PLAN_NAME);
        let Some(plan) = find_plan(plan_name) else {
            warn!(user_id = %user_id, plan = %plan_name, "Question about unknown plan");
            return Ok(RagResponse::Error {
                message: AdvisorError::UnknownPlan(plan_name.to_string()).to_string(),
            });
        };

        match self.answer(&message, plan).await {
            Ok((answer, context)) => Ok(RagResponse::AiResponse {
                message: answer,
                metadata: RagMetadata {
                    context: context.text,
                    confidence: context.relevance_score,
                },
            }),
            Err(e) => {
                warn!(user_id = %user_id, plan = %plan.name, error = %e, "Plan question failed");
                Ok(RagResponse::Error {
                    message: RAG_FAILURE.to_string(),
                })
            }
        }
    }

    /// Forget users who have not asked anything for longer than `max_idle`,
    /// so their next question gets the introduction again.
    pub fn evict_idle(&self, max_idle: IdleDuration) -> usize {
        let cutoff = Utc::now() - max_idle;
        let before = self.greeted.len();
        self.greeted.retain(|_, last_seen| *last_seen >= cutoff);
        before - self.greeted.len()
    }

    pub fn greeted_count(&self) -> usize {
        self.greeted.len()
    }

    async fn answer(&self, query: &str, plan: &Plan) -> Result<(String, RetrievedContext)> {
        let context = with_timeout(
            "context retrieval",
            self.timeout,
            self.retriever.retrieve(query, plan.collection),
        )
        .await?;
        info!(
            plan = %plan.name,
            relevance = context.relevance_score,
            "Retrieved plan context"
        );

        let prompt = rag_prompt(query, &context.text);
        let answer = with_timeout(
            "answer generation",
            self.timeout,
            self.narrator.generate(&prompt),
        )
        .await?;
        Ok((answer.trim().to_string(), context))
    }
}

fn rag_prompt(query: &str, context: &str) -> String {
    format!(
        r#"You are an AI assistant specializing in insurance policies.

Context about the insurance plan:
{context}

User question:
{query}

Provide a clear and concise response based on the provided context.
If the context does not contain relevant information, offer general insurance-related guidance.
Keep the response simple and easy for customers to understand."#
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Records the collection it was asked about
    #[derive(Default)]
    struct RecordingRetriever {
        collections: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl ContextRetriever for RecordingRetriever {
        async fn retrieve(&self, _query: &str, collection: &str) -> Result<RetrievedContext> {
            self.collections.lock().unwrap().push(collection.to_string());
            Ok(RetrievedContext {
                text: "Specialist visits cost $40.".to_string(),
                relevance_score: 0.87,
            })
        }
    }

    struct EchoNarrator;

    #[async_trait]
    impl NarrativeGenerator for EchoNarrator {
        async fn generate(&self, prompt: &str) -> Result<String> {
            Ok(format!("answered with {} chars of prompt", prompt.len()))
        }
    }

    struct DownNarrator;

    #[async_trait]
    impl NarrativeGenerator for DownNarrator {
        async fn generate(&self, _prompt: &str) -> Result<String> {
            Err(AdvisorError::Narrative("503".to_string()))
        }
    }

    fn request(user: &str, message: &str, plan: Option<&str>) -> RagRequest {
        RagRequest {
            message: Some(message.to_string()),
            user_id: Some(user.to_string()),
            plan: plan.map(str::to_string),
        }
    }

    #[tokio::test]
    async fn first_question_gets_the_introduction() {
        let assistant = RagAssistant::new(
            Arc::new(RecordingRetriever::default()),
            Arc::new(EchoNarrator),
            Duration::from_secs(1),
        );

        let first = assistant.ask(request("u1", "hello", None)).await.unwrap();
        assert_eq!(
            first,
            RagResponse::AiResponse {
                message: RAG_INTRO.to_string(),
                metadata: RagMetadata {
                    context: String::new(),
                    confidence: 0.0
                },
            }
        );

        let second = assistant
            .ask(request("u1", "what about specialists?", None))
            .await
            .unwrap();
        match second {
            RagResponse::AiResponse { metadata, .. } => {
                assert_eq!(metadata.context, "Specialist visits cost $40.");
                assert_eq!(metadata.confidence, 0.87);
            }
            other => panic!("unexpected response: {:?}", other),
        }
    }

    #[tokio::test]
    async fn questions_go_to_the_plan_collection() {
        let retriever = Arc::new(RecordingRetriever::default());
        let assistant = RagAssistant::new(
            retriever.clone(),
            Arc::new(EchoNarrator),
            Duration::from_secs(1),
        );

        assistant.ask(request("u1", "hi", None)).await.unwrap();
        assistant.ask(request("u1", "deductible?", None)).await.unwrap();
        assistant
            .ask(request("u1", "deductible?", Some("AmeriHealth Gold")))
            .await
            .unwrap();

        let collections = retriever.collections.lock().unwrap().clone();
        assert_eq!(collections, vec!["horizonblue", "amerigold-index"]);
    }

    #[tokio::test]
    async fn unknown_plan_is_an_explicit_error() {
        let retriever = Arc::new(RecordingRetriever::default());
        let assistant = RagAssistant::new(
            retriever.clone(),
            Arc::new(EchoNarrator),
            Duration::from_secs(1),
        );
        assistant.ask(request("u1", "hi", None)).await.unwrap();

        let response = assistant
            .ask(request("u1", "deductible?", Some("Acme Bronze")))
            .await
            .unwrap();
        assert_eq!(
            response,
            RagResponse::Error {
                message: "Unknown plan: Acme Bronze".to_string()
            }
        );
        assert!(retriever.collections.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn collaborator_failure_degrades() {
        let assistant = RagAssistant::new(
            Arc::new(RecordingRetriever::default()),
            Arc::new(DownNarrator),
            Duration::from_secs(1),
        );
        assistant.ask(request("u1", "hi", None)).await.unwrap();

        let response = assistant.ask(request("u1", "copay?", None)).await.unwrap();
        assert_eq!(
            response,
            RagResponse::Error {
                message: RAG_FAILURE.to_string()
            }
        );
    }

    #[tokio::test]
    async fn idle_users_are_greeted_again() {
        let assistant = RagAssistant::new(
            Arc::new(RecordingRetriever::default()),
            Arc::new(EchoNarrator),
            Duration::from_secs(1),
        );
        assistant.ask(request("stale", "hi", None)).await.unwrap();
        assistant.ask(request("fresh", "hi", None)).await.unwrap();
        assistant
            .greeted
            .insert("stale".to_string(), Utc::now() - IdleDuration::hours(2));

        assert_eq!(assistant.evict_idle(IdleDuration::minutes(30)), 1);
        assert_eq!(assistant.greeted_count(), 1);

        let again = assistant.ask(request("stale", "copay?", None)).await.unwrap();
        assert!(matches!(
            again,
            RagResponse::AiResponse { ref message, .. } if message == RAG_INTRO
        ));
    }

    #[tokio::test]
    async fn malformed_requests_are_rejected() {
        let assistant = RagAssistant::new(
            Arc::new(RecordingRetriever::default()),
            Arc::new(EchoNarrator),
            Duration::from_secs(1),
        );
        let result = assistant
            .ask(RagRequest {
                message: Some("hi".to_string()),
                user_id: None,
                plan: None,
            })
            .await;
        assert!(matches!(result, Err(AdvisorError::InvalidRequest(_))));
    }
}
