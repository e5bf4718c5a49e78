//! Payment Checkout Service
//!
//! Creates hosted checkout sessions when the interpreter reports that the
//! prospect asked to pay.

use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::info;

/// Stripe's REST API base.
pub const STRIPE_API_BASE: &str = "https://api.stripe.com/v1";

/// Parameters for one checkout session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutRequest {
    /// Conversation the payment belongs to; echoed back by the provider.
    pub session_id: String,
    pub customer_email: Option<String>,
}

/// A created checkout session.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct CheckoutSession {
    pub id: String,
    pub url: String,
}

/// Defines the contract for any hosted checkout provider.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn create_checkout(&self, request: &CheckoutRequest) -> Result<CheckoutSession>;
}

/// Static settings for Stripe Checkout.
#[derive(Debug, Clone)]
pub struct StripeSettings {
    pub secret_key: String,
    pub price_id: String,
    pub success_url: String,
    pub cancel_url: String,
}

#[derive(Deserialize)]
struct StripeSessionResponse {
    id: String,
    url: Option<String>,
}

/// A `PaymentGateway` backed by Stripe Checkout.
pub struct StripeCheckout {
    http: reqwest::Client,
    settings: StripeSettings,
    api_base: String,
}

impl StripeCheckout {
    pub fn new(settings: StripeSettings, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            settings,
            api_base: STRIPE_API_BASE.to_string(),
        })
    }

    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    /// Form fields for `POST /checkout/sessions`.
    fn form_fields(&self, request: &CheckoutRequest) -> Vec<(&'static str, String)> {
        let mut fields = vec![
            ("mode", "payment".to_string()),
            ("line_items[0][price]", self.settings.price_id.clone()),
            ("line_items[0][quantity]", "1".to_string()),
            ("success_url", self.settings.success_url.clone()),
            ("cancel_url", self.settings.cancel_url.clone()),
            ("client_reference_id", request.session_id.clone()),
            ("metadata[session_id]", request.session_id.clone()),
        ];
        if let Some(email) = &request.customer_email {
            fields.push(("customer_email", email.clone()));
        }
        fields
    }
}

#[async_trait]
impl PaymentGateway for StripeCheckout {
    async fn create_checkout(&self, request: &CheckoutRequest) -> Result<CheckoutSession> {
        let response = self
            .http
            .post(format!("{}/checkout/sessions", self.api_base))
            .bearer_auth(&self.settings.secret_key)
            .form(&self.form_fields(request))
            .send()
            .await
            .context("Stripe checkout request failed")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            bail!("Stripe returned {}: {}", status, body);
        }

        let created: StripeSessionResponse = response.json().await?;
        let url = created
            .url
            .context("Stripe checkout session has no hosted URL")?;
        info!(checkout_id = %created.id, session_id = %request.session_id, "Checkout session created");

        Ok(CheckoutSession {
            id: created.id,
            url,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::spawn_stub;
    use axum::{
        Form, Json, Router,
        http::{HeaderMap, StatusCode},
        routing::post,
    };
    use serde_json::{Value, json};
    use std::collections::HashMap;

    fn stripe_stub(status: StatusCode, body: Value) -> Router {
        Router::new().route(
            "/v1/checkout/sessions",
            post(move |headers: HeaderMap, Form(form): Form<HashMap<String, String>>| {
                let body = body.clone();
                async move {
                    assert_eq!(headers["authorization"], "Bearer sk_test_123");
                    assert_eq!(form["mode"], "payment");
                    assert_eq!(form["client_reference_id"], "s1");
                    assert_eq!(form["customer_email"], "jane@x.com");
                    (status, Json(body))
                }
            }),
        )
    }

    fn request() -> CheckoutRequest {
        CheckoutRequest {
            session_id: "s1".to_string(),
            customer_email: Some("jane@x.com".to_string()),
        }
    }

    fn checkout() -> StripeCheckout {
        StripeCheckout::new(
            StripeSettings {
                secret_key: "sk_test_123".to_string(),
                price_id: "price_abc".to_string(),
                success_url: "https://example.com/thanks".to_string(),
                cancel_url: "https://example.com/cancel".to_string(),
            },
            Duration::from_secs(2),
        )
        .unwrap()
    }

    #[test]
    fn test_form_fields_reference_the_session() {
        let fields = checkout().form_fields(&CheckoutRequest {
            session_id: "s42".to_string(),
            customer_email: None,
        });

        assert!(fields.contains(&("mode", "payment".to_string())));
        assert!(fields.contains(&("line_items[0][price]", "price_abc".to_string())));
        assert!(fields.contains(&("client_reference_id", "s42".to_string())));
        assert!(!fields.iter().any(|(k, _)| *k == "customer_email"));
    }

    #[test]
    fn test_form_fields_include_email_when_known() {
        let fields = checkout().form_fields(&CheckoutRequest {
            session_id: "s42".to_string(),
            customer_email: Some("jane@x.com".to_string()),
        });

        assert!(fields.contains(&("customer_email", "jane@x.com".to_string())));
    }

    #[tokio::test]
    async fn test_unreachable_api_is_an_error() {
        let gateway = checkout().with_api_base("http://127.0.0.1:9/v1");
        let result = gateway
            .create_checkout(&CheckoutRequest {
                session_id: "s1".to_string(),
                customer_email: None,
            })
            .await;

        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_created_session_returns_hosted_url() {
        let stub = stripe_stub(
            StatusCode::OK,
            json!({ "id": "cs_test_1", "url": "https://checkout.stripe.com/c/cs_test_1" }),
        );
        let gateway = checkout().with_api_base(format!("{}/v1", spawn_stub(stub).await));

        let session = gateway.create_checkout(&request()).await.unwrap();

        assert_eq!(session.id, "cs_test_1");
        assert_eq!(session.url, "https://checkout.stripe.com/c/cs_test_1");
    }

    #[tokio::test]
    async fn test_session_without_url_is_an_error() {
        let stub = stripe_stub(StatusCode::OK, json!({ "id": "cs_test_2", "url": null }));
        let gateway = checkout().with_api_base(format!("{}/v1", spawn_stub(stub).await));

        let err = gateway.create_checkout(&request()).await.unwrap_err();
        assert!(err.to_string().contains("no hosted URL"));
    }

    #[tokio::test]
    async fn test_stripe_error_status_is_an_error() {
        let stub = stripe_stub(
            StatusCode::PAYMENT_REQUIRED,
            json!({ "error": { "message": "No such price" } }),
        );
        let gateway = checkout().with_api_base(format!("{}/v1", spawn_stub(stub).await));

        let err = gateway.create_checkout(&request()).await.unwrap_err();
        let message = err.to_string();
        assert!(message.contains("402"), "{message}");
        assert!(message.contains("No such price"), "{message}");
    }
}
