//! Application state — constructed once in `main`, cloned per request.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use sqlx::PgPool;

use crate::completion::{CompletionClient, DEFAULT_API_BASE, DEFAULT_MODEL};
use crate::storage::Storage;

const DEFAULT_SESSION_TTL_HOURS: i64 = 720; // 30 days

/// Central application state. Clone-friendly — PgPool and Arc are both Clone.
#[derive(Clone)]
pub struct AppState {
    pub storage: Storage,
    pub completions: CompletionClient,
    pub session_ttl: chrono::Duration,
    pub start_time: Instant,
    /// `true` once migrations ran and the pool answered a ping.
    pub ready: Arc<AtomicBool>,
}

impl AppState {
    pub fn new(db: PgPool) -> Self {
        let http_client = reqwest::Client::builder()
            .pool_max_idle_per_host(10)
            .timeout(std::time::Duration::from_secs(120))
            .connect_timeout(std::time::Duration::from_secs(5))
            .build()
            .expect("Failed to build HTTP client");

        let api_key = std::env::var("GROQ_API_KEY").ok().filter(|k| !k.is_empty());
        if api_key.is_some() {
            tracing::info!("GROQ_API_KEY configured — completion gateway enabled");
        } else {
            tracing::warn!("GROQ_API_KEY not set — message sends will fail until configured");
        }

        let base_url = std::env::var("GROQ_API_BASE")
            .ok()
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| DEFAULT_API_BASE.to_string());
        let model = std::env::var("GROQ_MODEL")
            .ok()
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| DEFAULT_MODEL.to_string());

        let session_ttl_hours = std::env::var("SESSION_TTL_HOURS")
            .ok()
            .and_then(|v| v.parse::<i64>().ok())
            .unwrap_or(DEFAULT_SESSION_TTL_HOURS);

        Self {
            storage: Storage::new(db),
            completions: CompletionClient::new(http_client, base_url, api_key, model),
            session_ttl: chrono::Duration::hours(session_ttl_hours),
            start_time: Instant::now(),
            ready: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::Relaxed)
    }

    pub fn mark_ready(&self) {
        self.ready.store(true, Ordering::Relaxed);
        tracing::info!("Backend marked as READY");
    }

    /// Assemble state from an existing pool and gateway, bypassing env
    /// config. Used by DB-backed integration tests.
    #[doc(hidden)]
    pub fn from_parts(db: PgPool, completions: CompletionClient) -> Self {
        Self {
            storage: Storage::new(db),
            completions,
            session_ttl: chrono::Duration::hours(DEFAULT_SESSION_TTL_HOURS),
            start_time: Instant::now(),
            ready: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Test-only constructor — uses `connect_lazy` so no real DB is needed.
    /// Only suitable for endpoints that fail before issuing SQL, or that
    /// handle DB errors gracefully.
    #[doc(hidden)]
    pub fn new_test() -> Self {
        let http_client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(5))
            .build()
            .expect("Failed to build HTTP client");

        let db = PgPool::connect_lazy("postgres://test@localhost:19999/test").expect("lazy pool");

        Self {
            storage: Storage::new(db),
            completions: CompletionClient::new(
                http_client,
                DEFAULT_API_BASE.to_string(),
                None,
                DEFAULT_MODEL.to_string(),
            ),
            session_ttl: chrono::Duration::hours(DEFAULT_SESSION_TTL_HOURS),
            start_time: Instant::now(),
            ready: Arc::new(AtomicBool::new(false)),
        }
    }
}
