pub mod answers;
pub mod catalog;
pub mod collaborators;
pub mod conversation;
pub mod error;
pub mod protocol;
pub mod rag;
pub mod scoring;
pub mod session;
pub mod storage;
pub mod summary;
pub mod survey;

// Re-export commonly used types
pub use answers::{AnswerValue, Answers, RecordedAnswer};
pub use catalog::{CATALOG, CURRENT_PLAN_NAME, Plan, current_plan, find_plan};
pub use collaborators::{
    ContextRetriever, NarrativeGenerator, RetrievedContext, UnavailableNarrator,
    UnavailableRetriever, with_timeout,
};
pub use conversation::ConversationEngine;
pub use error::{AdvisorError, Result};
pub use protocol::{TurnRequest, TurnResponse};
pub use rag::{RagAssistant, RagMetadata, RagRequest, RagResponse};
pub use scoring::{Recommendation, ScoredPlan, rank, recommend, score};
pub use session::{Phase, Session};
pub use storage::{InMemorySessionStorage, SessionHandle, SessionStorage};
pub use summary::{PlanSummary, SummaryFormatter};
pub use survey::{QUESTIONS, Question, QuestionType, SKIP};
