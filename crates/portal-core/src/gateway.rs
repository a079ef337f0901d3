//! Action Gateway — the single path from this layer to the workflow backend.

use async_trait::async_trait;
use serde_json::Value;
use std::sync::OnceLock;
use std::time::Duration;
use tracing::{debug, warn};

use crate::actor::Actor;
use crate::config::WorkflowConfig;
use crate::envelope::{ActionEnvelope, ActionRequest};
use crate::error::GatewayError;
use crate::http::lazy_client;

/// Header carrying the shared secret on every backend call.
pub const SECRET_HEADER: &str = "x-portal-secret";

/// Invokes named actions on the workflow backend.
#[async_trait]
pub trait ActionGateway: Send + Sync {
    /// Send a prepared request and normalize the envelope.
    async fn send(&self, request: ActionRequest) -> Result<Value, GatewayError>;

    /// Build the request from its parts and send it.
    async fn invoke(
        &self,
        action: &str,
        actor: &Actor,
        data: Option<Value>,
    ) -> Result<Value, GatewayError> {
        let request = ActionRequest::new(action, actor.clone(), data)?;
        self.send(request).await
    }
}

// ---------------------------------------------------------------------------
// HttpActionGateway
// ---------------------------------------------------------------------------

/// Gateway that POSTs JSON to the configured backend endpoint.
///
/// The underlying HTTP client is created lazily on the first call.
pub struct HttpActionGateway {
    endpoint: String,
    secret: String,
    timeout: Duration,
    client: OnceLock<reqwest::Client>,
}

impl HttpActionGateway {
    pub fn new(config: &WorkflowConfig) -> Self {
        Self {
            endpoint: config.url.clone(),
            secret: config.secret.clone(),
            timeout: config.timeout,
            client: OnceLock::new(),
        }
    }
}

#[async_trait]
impl ActionGateway for HttpActionGateway {
    async fn send(&self, request: ActionRequest) -> Result<Value, GatewayError> {
        let client = lazy_client(&self.client, self.timeout).map_err(GatewayError::Transport)?;
        debug!(
            action = request.action(),
            actor = request.actor().email(),
            "invoking workflow action"
        );

        let response = client
            .post(&self.endpoint)
            .header(SECRET_HEADER, &self.secret)
            .json(&request)
            .send()
            .await
            .inspect_err(|e| warn!(action = request.action(), "workflow call failed: {e}"))?;

        let status = response.status();
        let body = response.bytes().await?;

        let envelope = match serde_json::from_slice::<ActionEnvelope>(&body) {
            Ok(envelope) => envelope,
            Err(_) if !status.is_success() => {
                warn!(action = request.action(), %status, "workflow backend answered without an envelope");
                return Err(GatewayError::Status {
                    status: status.as_u16(),
                });
            }
            Err(e) => return Err(GatewayError::Decode(e.to_string())),
        };

        envelope.into_result().inspect_err(|e| {
            if let GatewayError::Rejected { code, .. } = e {
                warn!(action = request.action(), code = code.as_str(), "workflow action rejected: {e}");
            }
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actor::Role;
    use mockito::Matcher;
    use serde_json::json;

    fn gateway_for(url: String) -> HttpActionGateway {
        HttpActionGateway::new(&WorkflowConfig {
            url,
            secret: "s3cret".into(),
            timeout: Duration::from_secs(5),
        })
    }

    fn admin() -> Actor {
        Actor::new("ops@portal.io", Role::Admin).unwrap()
    }

    #[tokio::test]
    async fn ok_envelope_returns_data() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/exec")
            .match_header(SECRET_HEADER, "s3cret")
            .match_body(Matcher::Json(json!({
                "action": "admin.grantXp",
                "actor": { "email": "ops@portal.io", "role": "ADMIN" },
                "data": { "email": "kid@school.edu", "amount": 5 },
            })))
            .with_status(200)
            .with_body(r#"{"ok":true,"code":"OK","message":"","data":{"x":1}}"#)
            .create_async()
            .await;

        let gateway = gateway_for(format!("{}/exec", server.url()));
        let data = gateway
            .invoke(
                "admin.grantXp",
                &admin(),
                Some(json!({ "email": "kid@school.edu", "amount": 5 })),
            )
            .await
            .unwrap();

        assert_eq!(data, json!({ "x": 1 }));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn rejected_envelope_carries_code_and_data() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/exec")
            .with_status(200)
            .with_body(r#"{"ok":false,"code":"ALREADY_ENTERED","message":"Already entered","data":{"entry":"e1"}}"#)
            .create_async()
            .await;

        let gateway = gateway_for(format!("{}/exec", server.url()));
        let err = gateway
            .invoke("portal.enterRaffle", &admin(), None)
            .await
            .unwrap_err();

        match err {
            GatewayError::Rejected {
                code,
                message,
                data,
            } => {
                assert_eq!(code, "ALREADY_ENTERED");
                assert_eq!(message, "Already entered");
                assert_eq!(data, json!({ "entry": "e1" }));
            }
            other => panic!("expected Rejected, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn envelope_on_error_status_is_still_honoured() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/exec")
            .with_status(422)
            .with_body(r#"{"ok":false,"code":"BAD","message":"bad input","data":null}"#)
            .create_async()
            .await;

        let gateway = gateway_for(format!("{}/exec", server.url()));
        let err = gateway
            .invoke("portal.listClaims", &admin(), None)
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::Rejected { .. }));
    }

    #[tokio::test]
    async fn non_envelope_error_status_maps_to_status_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/exec")
            .with_status(503)
            .with_body("<html>maintenance</html>")
            .create_async()
            .await;

        let gateway = gateway_for(format!("{}/exec", server.url()));
        let err = gateway
            .invoke("portal.listClaims", &admin(), None)
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::Status { status: 503 }));
    }

    #[tokio::test]
    async fn non_envelope_success_maps_to_decode_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/exec")
            .with_status(200)
            .with_body("not json")
            .create_async()
            .await;

        let gateway = gateway_for(format!("{}/exec", server.url()));
        let err = gateway
            .invoke("portal.listClaims", &admin(), None)
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::Decode(_)));
    }

    #[tokio::test]
    async fn unreachable_backend_maps_to_transport_error() {
        // Port 9 (discard) on loopback is not expected to accept connections.
        let gateway = gateway_for("http://127.0.0.1:9/exec".into());
        let err = gateway
            .invoke("portal.listClaims", &admin(), None)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            GatewayError::Transport(_) | GatewayError::Timeout
        ));
    }

    #[tokio::test]
    async fn invalid_action_is_rejected_before_sending() {
        let gateway = gateway_for("http://127.0.0.1:9/exec".into());
        let err = gateway
            .invoke("not an action", &admin(), None)
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::InvalidAction(_)));
    }
}
