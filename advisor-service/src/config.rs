use std::time::Duration;
use tracing::warn;

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_LLM_MODEL: &str = "openai/gpt-4o-mini";
pub const DEFAULT_PINECONE_NAMESPACE: &str = "__default__";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_DOCS_BASE_URL: &str = "/plans";

/// Configuration for the advisor service, read once at startup
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceConfig {
    pub port: u16,
    pub openrouter_api_key: Option<String>,
    pub llm_model: String,
    pub pinecone_api_key: Option<String>,
    pub pinecone_namespace: String,
    /// Upper bound on every LLM and vector-store call
    pub external_call_timeout: Duration,
    /// Sessions idle longer than this are evicted; `None` keeps them forever
    pub session_idle_ttl: Option<Duration>,
    pub plan_docs_base_url: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            openrouter_api_key: None,
            llm_model: DEFAULT_LLM_MODEL.to_string(),
            pinecone_api_key: None,
            pinecone_namespace: DEFAULT_PINECONE_NAMESPACE.to_string(),
            external_call_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            session_idle_ttl: None,
            plan_docs_base_url: DEFAULT_DOCS_BASE_URL.to_string(),
        }
    }
}

impl ServiceConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup. Blank values count as unset; unparsable
    /// numbers fall back to their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();

        Self {
            port: parse_or("PORT", get("PORT"), defaults.port),
            openrouter_api_key: get("OPENROUTER_API_KEY"),
            llm_model: get("LLM_MODEL").unwrap_or(defaults.llm_model),
            pinecone_api_key: get("PINECONE_API_KEY"),
            pinecone_namespace: get("PINECONE_NAMESPACE").unwrap_or(defaults.pinecone_namespace),
            external_call_timeout: Duration::from_secs(parse_or(
                "EXTERNAL_CALL_TIMEOUT_SECS",
                get("EXTERNAL_CALL_TIMEOUT_SECS"),
                DEFAULT_TIMEOUT_SECS,
            )),
            session_idle_ttl: get("SESSION_IDLE_TTL_SECS")
                .map(|raw| parse_or("SESSION_IDLE_TTL_SECS", Some(raw), 0u64))
                .filter(|secs| *secs > 0)
                .map(Duration::from_secs),
            plan_docs_base_url: get("PLAN_DOCS_BASE_URL").unwrap_or(defaults.plan_docs_base_url),
        }
    }
}

fn parse_or<T: std::str::FromStr + Copy + std::fmt::Display>(
    key: &str,
    raw: Option<String>,
    default: T,
) -> T {
    match raw {
        None => default,
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!(key = %key, value = %raw, default = %default, "Invalid value, using default");
            default
        }),
    }
}
