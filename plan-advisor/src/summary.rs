use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use crate::{
    answers::Answers,
    catalog::Plan,
    collaborators::{NarrativeGenerator, with_timeout},
    scoring::Recommendation,
    survey::SKIP,
};

/// What the user receives once a plan is final
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanSummary {
    pub timestamp: DateTime<Utc>,
    pub user_name: Option<String>,
    pub selected_plan: Plan,
    pub plan_features: Vec<String>,
    pub match_score: f64,
    pub user_responses: BTreeMap<String, String>,
    pub document_url: String,
    /// Generated explanation; `None` when generation failed or came back blank
    pub narrative: Option<String>,
}

/// Builds plan summaries. The structured part is deterministic; the narrative
/// is best-effort and never blocks the rest of the summary.
pub struct SummaryFormatter {
    narrator: Arc<dyn NarrativeGenerator>,
    docs_base_url: String,
    timeout: Duration,
}

impl SummaryFormatter {
    pub fn new(
        narrator: Arc<dyn NarrativeGenerator>,
        docs_base_url: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            narrator,
            docs_base_url: docs_base_url.into(),
            timeout,
        }
    }

    /// Summary without a narrative. Safe to call while holding a session lock.
    pub fn structured(
        &self,
        recommendation: &Recommendation,
        answers: &Answers,
        user_name: Option<&str>,
    ) -> PlanSummary {
        let plan = recommendation.plan_details;
        PlanSummary {
            timestamp: Utc::now(),
            user_name: user_name.map(str::to_string),
            selected_plan: plan,
            plan_features: recommendation.features.clone(),
            match_score: recommendation.match_score,
            user_responses: answers.to_raw_map(),
            document_url: plan.document_url(&self.docs_base_url),
            narrative: None,
        }
    }

    /// Fill in the narrative. Failures are logged and leave it empty.
    pub async fn with_narrative(&self, mut summary: PlanSummary) -> PlanSummary {
        let prompt = narrative_prompt(&summary);
        let generated = with_timeout(
            "narrative generation",
            self.timeout,
            self.narrator.generate(&prompt),
        )
        .await;

        match generated {
            Ok(text) if !text.trim().is_empty() => {
                info!(plan = %summary.selected_plan.name, "Narrative generated");
                summary.narrative = Some(text.trim().to_string());
            }
            Ok(_) => {
                warn!(plan = %summary.selected_plan.name, "Narrative generator returned no text");
            }
            Err(e) => {
                warn!(
                    plan = %summary.selected_plan.name,
                    error = %e,
                    "Narrative generation failed, returning summary without it"
                );
            }
        }
        summary
    }
}

/// Prompt asking for the two-paragraph explanation of why the plan fits.
pub fn narrative_prompt(summary: &PlanSummary) -> String {
    let name = summary.user_name.as_deref().unwrap_or("the customer");
    let preferences = summary
        .user_responses
        .iter()
        .filter(|(id, raw)| id.as_str() != "name" && !raw.eq_ignore_ascii_case(SKIP))
        .map(|(id, raw)| format!("- {}: {}", id.replace('_', " "), raw))
        .collect::<Vec<_>>()
        .join("\n");
    let preferences = if preferences.is_empty() {
        "- no specific preferences given".to_string()
    } else {
        preferences
    };
    let features = summary
        .plan_features
        .iter()
        .map(|f| format!("- {}", f))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        r#"You are an insurance assistant writing a short personalized plan summary for {name}.

Selected plan: {plan}
Plan features:
{features}

Customer preferences:
{preferences}

Write exactly two paragraphs of plain text.
Paragraph 1: explain why {plan} fits {name}, referring only to the preferences and features above.
Paragraph 2: tell {name} that the full plan document is available at {url}.
Do not use markdown and do not invent coverage details."#,
        plan = summary.selected_plan.name,
        url = summary.document_url,
    )
}
