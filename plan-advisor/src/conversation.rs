//! ConversationEngine – resolves a user's session, applies exactly one turn
//! of the survey state machine under that session's lock, and finalizes.
//!
//! A turn runs in two halves:
//! 1. **Locked**: load the session, record the answer or selection, compute the
//!    next state, and delete the session if the conversation is over.
//! 2. **Unlocked**: for finalized conversations, ask the narrative generator to
//!    explain the chosen plan. A slow or failing generator only costs the
//!    narrative; the structured summary is already built.
//!
//! Messages from the same user are serialized by the session lock. Different
//! users never contend on anything but the store's map.

use std::sync::Arc;
use tracing::{debug, info};

use crate::{
    catalog::current_plan,
    error::Result,
    protocol::{TurnRequest, TurnResponse},
    scoring::{self, Recommendation},
    session::{Phase, Session},
    storage::SessionStorage,
    summary::{PlanSummary, SummaryFormatter},
};

const RECOMMENDATIONS_MESSAGE: &str = "Based on your responses, here are your recommended insurance plans. Please select a plan by entering its number";
const PLAN_SELECTED_MESSAGE: &str = "Here's your selected plan summary:";

/// Outcome of the locked half of a turn
#[derive(Debug)]
enum Step {
    /// Answer the user; the session stays open
    Reply(TurnResponse),
    /// The user picked one of the offered plans; the session is gone
    Selected(PlanSummary),
    /// Every question was skipped; the session is gone
    KeptCurrent {
        recommendation: Recommendation,
        summary: PlanSummary,
    },
}

pub struct ConversationEngine {
    storage: Arc<dyn SessionStorage>,
    formatter: SummaryFormatter,
}

impl ConversationEngine {
    pub fn new(storage: Arc<dyn SessionStorage>, formatter: SummaryFormatter) -> Self {
        Self { storage, formatter }
    }

    pub fn storage(&self) -> &Arc<dyn SessionStorage> {
        &self.storage
    }

    /// Handle one inbound chat message.
    ///
    /// Returns `Err` only for malformed requests and storage failures; invalid
    /// answers and selections come back as [`TurnResponse::Error`].
    pub async fn handle(&self, request: TurnRequest) -> Result<TurnResponse> {
        let (user_id, message) = request.validate()?;

        let response = match self.advance(&user_id, &message).await? {
            Step::Reply(response) => response,
            Step::Selected(summary) => {
                let summary = self.formatter.with_narrative(summary).await;
                TurnResponse::PlanSelected {
                    message: PLAN_SELECTED_MESSAGE.to_string(),
                    summary,
                }
            }
            Step::KeptCurrent {
                recommendation,
                summary,
            } => {
                let summary = self.formatter.with_narrative(summary).await;
                TurnResponse::FinalSummary {
                    message: format!(
                        "You skipped every question, so we'll keep your current plan: {}.",
                        recommendation.name
                    ),
                    recommendations: vec![recommendation],
                    summary,
                }
            }
        };
        Ok(response)
    }

    /// Locked half of a turn.
    async fn advance(&self, user_id: &str, message: &str) -> Result<Step> {
        loop {
            let handle = self.storage.get_or_create(user_id).await?;
            let mut session = handle.lock().await;

            // The session may have been finalized or evicted while we waited
            // for its lock; in that case start over with whatever is current.
            let current = self.storage.get(user_id).await?;
            if !current.is_some_and(|current| Arc::ptr_eq(&current, &handle)) {
                debug!(user_id = %user_id, "Session replaced while waiting, retrying");
                continue;
            }

            session.touch();
            let step = self.transition(&mut session, message);

            if matches!(step, Step::Selected(_) | Step::KeptCurrent { .. }) {
                self.storage.delete(user_id).await?;
                info!(user_id = %user_id, "Conversation finalized, session removed");
            }
            return Ok(step);
        }
    }

    fn transition(&self, session: &mut Session, message: &str) -> Step {
        match session.phase {
            Phase::Questioning => self.answer_question(session, message),
            Phase::SelectingPlan => self.select_plan(session, message),
        }
    }

    fn answer_question(&self, session: &mut Session, message: &str) -> Step {
        // The opening message only starts the conversation.
        if !session.started {
            session.started = true;
            info!(user_id = %session.user_id, "Starting survey");
            return match session.current_question() {
                Some(question) => Step::Reply(TurnResponse::question(question)),
                None => self.finish_questions(session),
            };
        }

        if let Some(question) = session.current_question() {
            let recorded = session.record_answer(message);
            debug!(
                user_id = %session.user_id,
                question_id = %question.id,
                skipped = recorded.is_some_and(|a| a.value.is_skip()),
                "Recorded answer"
            );
        }

        match session.current_question() {
            Some(next) => Step::Reply(TurnResponse::question(next)),
            None => self.finish_questions(session),
        }
    }

    fn finish_questions(&self, session: &mut Session) -> Step {
        if session.all_skipped() {
            let plan = current_plan();
            info!(
                user_id = %session.user_id,
                plan = %plan.name,
                "All questions skipped, keeping current plan"
            );
            let recommendation = Recommendation::new(plan, 0.0);
            let summary = self.formatter.structured(
                &recommendation,
                &session.answers,
                session.user_name.as_deref(),
            );
            return Step::KeptCurrent {
                recommendation,
                summary,
            };
        }

        let recommendations = scoring::recommend(&session.answers);
        info!(
            user_id = %session.user_id,
            top_plan = %recommendations.first().map(|r| r.name.as_str()).unwrap_or("none"),
            "Survey complete, presenting recommendations"
        );
        session.recommendations = recommendations.clone();
        session.phase = Phase::SelectingPlan;

        Step::Reply(TurnResponse::Recommendations {
            message: format!(
                "{} ({}):",
                RECOMMENDATIONS_MESSAGE,
                choice_list(recommendations.len())
            ),
            recommendations,
        })
    }

    fn select_plan(&self, session: &mut Session, message: &str) -> Step {
        let available = session.recommendations.len();
        match parse_selection(message, available) {
            Some(index) => {
                let chosen = &session.recommendations[index];
                info!(
                    user_id = %session.user_id,
                    plan = %chosen.name,
                    selection = index + 1,
                    "Plan selected"
                );
                let summary =
                    self.formatter
                        .structured(chosen, &session.answers, session.user_name.as_deref());
                Step::Selected(summary)
            }
            None => {
                info!(
                    user_id = %session.user_id,
                    input = %message,
                    "Invalid plan selection"
                );
                Step::Reply(TurnResponse::Error {
                    message: format!(
                        "Please select a valid plan number ({}).",
                        choice_list(available)
                    ),
                    recommendations: Some(session.recommendations.clone()),
                })
            }
        }
    }
}

/// Zero-based index for a 1-based selection in `1..=available`.
fn parse_selection(message: &str, available: usize) -> Option<usize> {
    let choice: usize = message.trim().parse().ok()?;
    (1..=available).contains(&choice).then(|| choice - 1)
}

/// "1, 2, or 3" style list of valid selections.
fn choice_list(count: usize) -> String {
    let numbers: Vec<String> = (1..=count).map(|n| n.to_string()).collect();
    match numbers.as_slice() {
        [] => String::new(),
        [only] => only.clone(),
        [first, second] => format!("{} or {}", first, second),
        [init @ .., last] => format!("{}, or {}", init.join(", "), last),
    }
}
