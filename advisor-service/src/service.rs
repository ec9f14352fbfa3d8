use axum::{
    Router,
    extract::{Request, State, rejection::JsonRejection},
    http::{HeaderValue, StatusCode},
    middleware::{Next, from_fn},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
};
use plan_advisor::{
    AdvisorError, ContextRetriever, ConversationEngine, InMemorySessionStorage,
    NarrativeGenerator, RagAssistant, RagRequest, RagResponse, SessionStorage, SummaryFormatter,
    TurnRequest, TurnResponse, UnavailableNarrator, UnavailableRetriever, current_plan,
    with_timeout,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{Instrument, error, info, warn};
use uuid::Uuid;

use crate::{
    clients::{OpenRouterNarrator, PineconeRetriever},
    config::ServiceConfig,
};

const GENERIC_ERROR: &str = "Internal server error";
const EXPLAIN_FAILURE: &str = "Failed to generate explanation";
const DEMO_USER_NAME: &str = "John Doe";

#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<ConversationEngine>,
    pub rag: Arc<RagAssistant>,
    pub narrator: Arc<dyn NarrativeGenerator>,
    pub timeout: Duration,
}

impl AppState {
    pub fn new(
        storage: Arc<dyn SessionStorage>,
        narrator: Arc<dyn NarrativeGenerator>,
        retriever: Arc<dyn ContextRetriever>,
        config: &ServiceConfig,
    ) -> Self {
        let timeout = config.external_call_timeout;
        let formatter =
            SummaryFormatter::new(narrator.clone(), &config.plan_docs_base_url, timeout);
        Self {
            engine: Arc::new(ConversationEngine::new(storage, formatter)),
            rag: Arc::new(RagAssistant::new(retriever, narrator.clone(), timeout)),
            narrator,
            timeout,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ExplainRequest {
    pub prompt: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ExplainResponse {
    pub explanation: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserInfo {
    pub name: String,
    pub current_plan: String,
}

/// Wire up collaborators from configuration and build the full application.
/// Missing credentials leave the matching collaborator unavailable so the
/// conversation still works without narratives or plan questions.
pub async fn create_app(config: &ServiceConfig) -> anyhow::Result<Router> {
    let narrator: Arc<dyn NarrativeGenerator> = match &config.openrouter_api_key {
        Some(key) => {
            info!(model = %config.llm_model, "Using OpenRouter for narratives");
            Arc::new(OpenRouterNarrator::new(key, &config.llm_model))
        }
        None => {
            warn!("OPENROUTER_API_KEY not set, summaries will have no narrative");
            Arc::new(UnavailableNarrator)
        }
    };

    let retriever: Arc<dyn ContextRetriever> = match &config.pinecone_api_key {
        Some(key) => {
            info!(namespace = %config.pinecone_namespace, "Using Pinecone for plan documents");
            Arc::new(PineconeRetriever::new(
                key,
                &config.pinecone_namespace,
                config.external_call_timeout,
            )?)
        }
        None => {
            warn!("PINECONE_API_KEY not set, plan questions will be unavailable");
            Arc::new(UnavailableRetriever)
        }
    };

    let storage = Arc::new(InMemorySessionStorage::new());
    let state = AppState::new(storage.clone(), narrator, retriever, config);

    if let Some(ttl) = config.session_idle_ttl {
        info!(ttl_secs = ttl.as_secs(), "Idle sessions will be evicted");
        spawn_session_sweeper(storage, state.rag.clone(), ttl)?;
    }

    Ok(build_router(state))
}

pub fn build_router(app_state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/chatbot", post(chatbot))
        .route("/rag", post(rag))
        .route("/explain", post(explain))
        .route("/user-info", get(user_info))
        .layer(from_fn(correlation_id_middleware))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}

/// Periodically drop sessions, and plan-question users, idle for longer
/// than `ttl`.
pub fn spawn_session_sweeper(
    storage: Arc<dyn SessionStorage>,
    rag: Arc<RagAssistant>,
    ttl: Duration,
) -> anyhow::Result<tokio::task::JoinHandle<()>> {
    let max_idle = chrono::Duration::from_std(ttl)?;
    let period = (ttl / 2).max(Duration::from_secs(1));

    Ok(tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        loop {
            interval.tick().await;
            match storage.evict_idle(max_idle).await {
                Ok(0) => {}
                Ok(evicted) => info!(evicted, "Evicted idle sessions"),
                Err(e) => error!(error = %e, "Session sweep failed"),
            }
            let forgotten = rag.evict_idle(max_idle);
            if forgotten > 0 {
                info!(forgotten, "Forgot idle plan-question users");
            }
        }
    }))
}

/// Middleware to add correlation ID to all requests
async fn correlation_id_middleware(mut request: Request, next: Next) -> Response {
    let correlation_id = Uuid::new_v4().to_string();
    let header = HeaderValue::from_str(&correlation_id).ok();

    if let Some(value) = &header {
        request.headers_mut().insert("x-correlation-id", value.clone());
    }

    let span = tracing::info_span!("http_request", correlation_id = %correlation_id);
    let mut response = next.run(request).instrument(span).await;

    if let Some(value) = header {
        response.headers_mut().insert("x-correlation-id", value);
    }
    response
}

async fn health_check() -> &'static str {
    "OK"
}

async fn chatbot(
    State(state): State<AppState>,
    payload: Result<Json<TurnRequest>, JsonRejection>,
) -> Response {
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => {
            warn!(error = %rejection, "Rejected chatbot request");
            return turn_error(StatusCode::BAD_REQUEST);
        }
    };

    match state.engine.handle(request).await {
        Ok(response) => Json(response).into_response(),
        Err(AdvisorError::InvalidRequest(reason)) => {
            warn!(reason = %reason, "Rejected chatbot request");
            turn_error(StatusCode::BAD_REQUEST)
        }
        Err(e) => {
            error!(error = %e, "Chatbot turn failed");
            turn_error(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

async fn rag(
    State(state): State<AppState>,
    payload: Result<Json<RagRequest>, JsonRejection>,
) -> Response {
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => {
            warn!(error = %rejection, "Rejected plan question");
            return rag_error(StatusCode::BAD_REQUEST);
        }
    };

    match state.rag.ask(request).await {
        Ok(response) => Json(response).into_response(),
        Err(AdvisorError::InvalidRequest(reason)) => {
            warn!(reason = %reason, "Rejected plan question");
            rag_error(StatusCode::BAD_REQUEST)
        }
        Err(e) => {
            error!(error = %e, "Plan question failed");
            rag_error(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

async fn explain(
    State(state): State<AppState>,
    payload: Result<Json<ExplainRequest>, JsonRejection>,
) -> Response {
    let prompt = match payload {
        Ok(Json(ExplainRequest {
            prompt: Some(prompt),
        })) if !prompt.trim().is_empty() => prompt,
        _ => return error_body(StatusCode::BAD_REQUEST, "prompt is required"),
    };

    match with_timeout("explanation", state.timeout, state.narrator.generate(&prompt)).await {
        Ok(explanation) => Json(ExplainResponse { explanation }).into_response(),
        Err(e) => {
            error!(error = %e, "Explanation failed");
            error_body(StatusCode::BAD_GATEWAY, EXPLAIN_FAILURE)
        }
    }
}

async fn user_info() -> Json<UserInfo> {
    Json(UserInfo {
        name: DEMO_USER_NAME.to_string(),
        current_plan: current_plan().name.to_string(),
    })
}

fn turn_error(status: StatusCode) -> Response {
    (status, Json(TurnResponse::error(GENERIC_ERROR))).into_response()
}

fn rag_error(status: StatusCode) -> Response {
    let body = RagResponse::Error {
        message: GENERIC_ERROR.to_string(),
    };
    (status, Json(body)).into_response()
}

fn error_body(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "type": "error", "message": message }))).into_response()
}
