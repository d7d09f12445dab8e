// service/emitter.rs
use std::sync::{Arc, Mutex};

use rand::distr::Alphanumeric;
use rand::{rng, Rng};
use reqwest::header::CONTENT_TYPE;

use crate::db::db::DBClient;
use crate::db::referraldb::ReferralExt;
use crate::models::referralmodel::NewAttributionEvent;

#[derive(Debug, Default)]
struct SessionState {
    session_id: Option<String>,
    page_loads: i32,
}

/// Fire-and-forget attribution reporter. Emission never throws to the
/// caller and never blocks the calling request: the database persist and
/// the legacy form mirror both run on a detached task, failures are logged
/// and swallowed, and nothing is retried (at-most-once, advisory data).
pub struct TrackingEmitter {
    db_client: Arc<DBClient>,
    http: reqwest::Client,
    legacy_endpoint: Option<String>,
    session: Mutex<SessionState>,
}

impl TrackingEmitter {
    pub fn new(db_client: Arc<DBClient>, legacy_endpoint: Option<String>) -> Self {
        TrackingEmitter {
            db_client,
            http: reqwest::Client::new(),
            legacy_endpoint,
            session: Mutex::new(SessionState::default()),
        }
    }

    /// Session id is created lazily on first use and lives for this
    /// emitter's lifetime; the page-load counter increments per emission.
    fn session_context(&self) -> (String, i32) {
        let mut session = self.session.lock().unwrap();
        if session.session_id.is_none() {
            session.session_id = Some(new_session_id());
        }
        session.page_loads += 1;
        (session.session_id.clone().unwrap(), session.page_loads)
    }

    pub fn emit(&self, mut event: NewAttributionEvent) {
        let (session_id, page_loads) = self.session_context();
        event.session_id = Some(session_id);
        event.page_loads = Some(page_loads);

        let db_client = self.db_client.clone();
        let http = self.http.clone();
        let endpoint = self.legacy_endpoint.clone();

        tokio::spawn(async move {
            if let Err(e) = db_client.record_attribution_event(&event).await {
                tracing::error!(
                    "TrackingEmitter: failed to persist attribution event (action {}): {}",
                    event.action,
                    e
                );
            }

            mirror_to_legacy(&http, endpoint, &event).await;
        });
    }

    /// Mirror-only path for callers that already persisted the event
    /// themselves and only need the best-effort external copy.
    pub fn mirror(&self, event: &NewAttributionEvent) {
        let http = self.http.clone();
        let endpoint = self.legacy_endpoint.clone();
        let event = event.clone();

        tokio::spawn(async move {
            mirror_to_legacy(&http, endpoint, &event).await;
        });
    }
}

/// One-way POST to the legacy form endpoint. The endpoint may be down or
/// may reject silently; the response is never inspected.
async fn mirror_to_legacy(
    http: &reqwest::Client,
    endpoint: Option<String>,
    event: &NewAttributionEvent,
) {
    let endpoint = match endpoint {
        Some(endpoint) => endpoint,
        None => return,
    };

    let fields = [
        ("referral_code", event.code.clone().unwrap_or_default()),
        ("action", event.action.clone()),
        ("source", event.source.clone().unwrap_or_default()),
        ("medium", event.medium.clone().unwrap_or_default()),
        ("campaign", event.campaign.clone().unwrap_or_default()),
        ("session_id", event.session_id.clone().unwrap_or_default()),
    ];

    let body = match serde_urlencoded::to_string(fields) {
        Ok(body) => body,
        Err(e) => {
            tracing::warn!("TrackingEmitter: could not encode legacy form body: {}", e);
            return;
        }
    };

    if let Err(e) = http
        .post(&endpoint)
        .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(body)
        .send()
        .await
    {
        tracing::warn!("TrackingEmitter: legacy form mirror failed: {}", e);
    }
}

fn new_session_id() -> String {
    rng()
        .sample_iter(&Alphanumeric)
        .take(16)
        .map(char::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::PgPool;

    fn emitter() -> TrackingEmitter {
        let pool = PgPool::connect_lazy("postgres://localhost/edupath").unwrap();
        TrackingEmitter::new(Arc::new(DBClient::new(pool)), None)
    }

    #[tokio::test]
    async fn session_id_is_lazy_and_stable_within_a_session() {
        let emitter = emitter();

        let (first_id, first_count) = emitter.session_context();
        let (second_id, second_count) = emitter.session_context();

        assert_eq!(first_id, second_id);
        assert_eq!(first_id.len(), 16);
        assert_eq!(first_count, 1);
        assert_eq!(second_count, 2);
    }

    #[tokio::test]
    async fn separate_sessions_get_separate_ids() {
        let (id_a, _) = emitter().session_context();
        let (id_b, _) = emitter().session_context();
        assert_ne!(id_a, id_b);
    }
}
