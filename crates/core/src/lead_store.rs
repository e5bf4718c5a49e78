//! Lead and Interaction Persistence
//!
//! Records are written to a hosted PocketBase instance. The router never reads
//! them back, and a failed write only means the response carries no record id.

use crate::interpreter::LeadRecord;
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use reqwest::StatusCode;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{info, warn};

/// Collection that receives one record per voice turn.
pub const INTERACTION_COLLECTION: &str = "voice_logs";

/// Collection that receives captured leads.
pub const LEAD_COLLECTION: &str = "leads";

/// One persisted voice turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InteractionLog {
    pub session_id: String,
    pub user_id: String,
    pub transcript: String,
    pub reply: String,
    pub lead_captured: bool,
    pub payment_requested: bool,
    /// Comma-separated degradation reasons, empty when the turn was clean.
    pub degradation: String,
}

/// Defines the contract for any backend that stores interactions and leads.
#[async_trait]
pub trait LeadStore: Send + Sync {
    /// Persists a captured lead, returning the created record id when known.
    async fn save_lead(&self, lead: &LeadRecord) -> Result<Option<String>>;

    /// Persists one voice turn, returning the created record id when known.
    async fn log_interaction(&self, log: &InteractionLog) -> Result<Option<String>>;
}

/// Superuser credentials for a PocketBase instance.
#[derive(Debug, Clone)]
pub struct PocketBaseCredentials {
    pub base_url: String,
    pub email: String,
    pub password: String,
}

#[derive(Serialize)]
struct AuthRequest<'a> {
    identity: &'a str,
    password: &'a str,
}

#[derive(Deserialize)]
struct AuthResponse {
    token: String,
}

#[derive(Deserialize)]
struct CreatedRecord {
    id: Option<String>,
}

/// A `LeadStore` that writes to PocketBase collections over its REST API.
///
/// The superuser token is fetched on first use and reused until PocketBase
/// rejects it.
pub struct PocketBaseStore {
    http: reqwest::Client,
    credentials: PocketBaseCredentials,
    token: Mutex<Option<String>>,
}

impl PocketBaseStore {
    pub fn new(credentials: PocketBaseCredentials, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            credentials,
            token: Mutex::new(None),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.credentials.base_url.trim_end_matches('/'), path)
    }

    /// Exchanges the superuser credentials for an auth token.
    async fn authenticate(&self) -> Result<String> {
        let response = self
            .http
            .post(self.url("/api/collections/_superusers/auth-with-password"))
            .json(&AuthRequest {
                identity: &self.credentials.email,
                password: &self.credentials.password,
            })
            .send()
            .await
            .context("PocketBase auth request failed")?;

        let status = response.status();
        if !status.is_success() {
            anyhow::bail!("PocketBase auth failed with status {}", status);
        }

        let auth: AuthResponse = response.json().await.context("Malformed auth response")?;
        Ok(auth.token)
    }

    /// Returns the cached token, authenticating first if there is none.
    async fn token(&self) -> Result<String> {
        let mut cached = self.token.lock().await;
        if let Some(token) = cached.as_ref() {
            return Ok(token.clone());
        }
        let token = self.authenticate().await?;
        *cached = Some(token.clone());
        Ok(token)
    }

    async fn post_record<T: Serialize + Sync>(
        &self,
        collection: &str,
        record: &T,
        token: &str,
    ) -> Result<reqwest::Response> {
        self.http
            .post(self.url(&format!("/api/collections/{}/records", collection)))
            .header("Authorization", token)
            .json(record)
            .send()
            .await
            .with_context(|| format!("PocketBase write to '{}' failed", collection))
    }

    async fn create_record<T: Serialize + Sync>(&self, collection: &str, record: &T) -> Result<Option<String>> {
        let token = self.token().await?;
        let mut response = self.post_record(collection, record, &token).await?;

        if matches!(response.status(), StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN) {
            info!(collection, "PocketBase token rejected. Re-authenticating.");
            self.token.lock().await.take();
            let token = self.token().await?;
            response = self.post_record(collection, record, &token).await?;
        }

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(collection, %status, body = %body, "PocketBase save failed");
            return Ok(None);
        }

        let created: CreatedRecord = response.json().await?;
        info!(collection, id = ?created.id, "PocketBase record created");
        Ok(created.id)
    }
}

#[async_trait]
impl LeadStore for PocketBaseStore {
    async fn save_lead(&self, lead: &LeadRecord) -> Result<Option<String>> {
        self.create_record(LEAD_COLLECTION, lead).await
    }

    async fn log_interaction(&self, log: &InteractionLog) -> Result<Option<String>> {
        self.create_record(INTERACTION_COLLECTION, log).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        interpreter::{LeadRecord, LeadStatus},
        test_support::spawn_stub,
    };
    use axum::{
        Json, Router,
        extract::Path,
        http::{HeaderMap, StatusCode},
        routing::post,
    };
    use serde_json::{Value, json};
    use std::sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    };

    const AUTH_PATH: &str = "/api/collections/_superusers/auth-with-password";
    const RECORDS_PATH: &str = "/api/collections/{collection}/records";

    fn store(base_url: &str) -> PocketBaseStore {
        PocketBaseStore::new(
            PocketBaseCredentials {
                base_url: base_url.to_string(),
                email: "admin@example.com".to_string(),
                password: "secret".to_string(),
            },
            Duration::from_secs(2),
        )
        .unwrap()
    }

    fn interaction() -> InteractionLog {
        InteractionLog {
            session_id: "s1".to_string(),
            user_id: String::new(),
            transcript: "hi".to_string(),
            reply: "hello".to_string(),
            lead_captured: false,
            payment_requested: true,
            degradation: String::new(),
        }
    }

    fn lead() -> LeadRecord {
        LeadRecord {
            name: "Jane".to_string(),
            email: "jane@x.com".to_string(),
            business_niche: None,
            session_id: "s1".to_string(),
            status: LeadStatus::New,
        }
    }

    /// An auth route that hands out `tok1`, `tok2`, ... and counts its calls.
    fn auth_route(calls: Arc<AtomicUsize>) -> Router {
        Router::new().route(
            AUTH_PATH,
            post(move |Json(body): Json<Value>| {
                let calls = calls.clone();
                async move {
                    assert_eq!(body["identity"], "admin@example.com");
                    let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
                    Json(json!({ "token": format!("tok{}", n) }))
                }
            }),
        )
    }

    /// A records route that only accepts `accepted_token`.
    fn records_route(accepted_token: &'static str) -> Router {
        Router::new().route(
            RECORDS_PATH,
            post(move |Path(collection): Path<String>, headers: HeaderMap| async move {
                let token = headers.get("authorization").and_then(|v| v.to_str().ok());
                if token != Some(accepted_token) {
                    return (StatusCode::UNAUTHORIZED, Json(json!({ "message": "bad token" })));
                }
                (StatusCode::OK, Json(json!({ "id": format!("{}_1", collection) })))
            }),
        )
    }

    #[test]
    fn test_url_joins_without_double_slash() {
        assert_eq!(
            store("http://pb.local:8090/").url("/api/health"),
            "http://pb.local:8090/api/health"
        );
    }

    #[test]
    fn test_interaction_log_serialization() {
        let json = serde_json::to_value(interaction()).unwrap();
        assert_eq!(json["session_id"], "s1");
        assert_eq!(json["payment_requested"], true);
        assert_eq!(json["degradation"], "");
    }

    #[test]
    fn test_created_record_tolerates_missing_id() {
        let created: CreatedRecord = serde_json::from_str(r#"{"collectionName":"leads"}"#).unwrap();
        assert_eq!(created.id, None);
    }

    #[tokio::test]
    async fn test_writes_return_created_ids_and_share_one_token() {
        let auth_calls = Arc::new(AtomicUsize::new(0));
        let base_url = spawn_stub(auth_route(auth_calls.clone()).merge(records_route("tok1"))).await;
        let store = store(&base_url);

        let log_id = store.log_interaction(&interaction()).await.unwrap();
        let lead_id = store.save_lead(&lead()).await.unwrap();

        assert_eq!(log_id.as_deref(), Some("voice_logs_1"));
        assert_eq!(lead_id.as_deref(), Some("leads_1"));
        assert_eq!(auth_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_rejected_token_is_refreshed_once() {
        let auth_calls = Arc::new(AtomicUsize::new(0));
        let base_url = spawn_stub(auth_route(auth_calls.clone()).merge(records_route("tok2"))).await;
        let store = store(&base_url);

        let id = store.save_lead(&lead()).await.unwrap();

        assert_eq!(id.as_deref(), Some("leads_1"));
        assert_eq!(auth_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_failed_write_yields_no_record_id() {
        let auth_calls = Arc::new(AtomicUsize::new(0));
        let app = auth_route(auth_calls).route(
            RECORDS_PATH,
            post(|| async {
                (
                    StatusCode::BAD_REQUEST,
                    Json(json!({ "message": "Failed to create record." })),
                )
            }),
        );
        let store = store(&spawn_stub(app).await);

        assert_eq!(store.log_interaction(&interaction()).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_auth_failure_is_an_error() {
        let app = Router::new().route(
            AUTH_PATH,
            post(|| async {
                (
                    StatusCode::BAD_REQUEST,
                    Json(json!({ "message": "Failed to authenticate." })),
                )
            }),
        );
        let store = store(&spawn_stub(app).await);

        let err = store.save_lead(&lead()).await.unwrap_err();
        assert!(err.to_string().contains("auth failed"));
    }

    #[tokio::test]
    async fn test_unreachable_store_is_an_error() {
        let store = store("http://127.0.0.1:9");
        let log = interaction();

        assert!(store.log_interaction(&log).await.is_err());
    }
}
