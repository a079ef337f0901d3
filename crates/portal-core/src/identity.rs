//! Identity provider contract and its Identity Toolkit REST implementation.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::OnceLock;
use std::time::Duration;
use tracing::debug;

use crate::actor::Role;
use crate::config::IdentityConfig;
use crate::error::IdentityError;
use crate::http::lazy_client;

const IDENTITY_TIMEOUT: Duration = Duration::from_secs(10);
const API_KEY_HEADER: &str = "x-goog-api-key";

/// Claims extracted from a verified ID token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedToken {
    pub email: String,
    pub role_claim: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    pub uid: String,
    pub email: String,
    pub display_name: Option<String>,
    pub role_claim: Option<String>,
}

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn verify_token(&self, token: &str) -> Result<VerifiedToken, IdentityError>;

    async fn lookup_user(&self, email: &str) -> Result<Option<UserRecord>, IdentityError>;

    async fn create_user(
        &self,
        email: &str,
        display_name: Option<&str>,
    ) -> Result<UserRecord, IdentityError>;

    async fn update_display_name(&self, uid: &str, display_name: &str)
        -> Result<(), IdentityError>;

    async fn set_role_claim(&self, uid: &str, role: Role) -> Result<(), IdentityError>;

    async fn password_reset_link(
        &self,
        email: &str,
        continue_url: Option<&str>,
    ) -> Result<String, IdentityError>;

    /// Ask the provider to email a reset link to the user directly.
    async fn send_password_reset(
        &self,
        email: &str,
        continue_url: Option<&str>,
    ) -> Result<(), IdentityError>;
}

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct LookupResponse {
    #[serde(default)]
    users: Vec<ToolkitUser>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ToolkitUser {
    local_id: String,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    display_name: Option<String>,
    /// JSON-encoded custom claims, e.g. `{"role":"ADMIN"}`.
    #[serde(default)]
    custom_attributes: Option<String>,
}

impl ToolkitUser {
    fn role_claim(&self) -> Option<String> {
        role_from_custom_attributes(self.custom_attributes.as_deref()?)
    }

    fn into_record(self, fallback_email: &str) -> UserRecord {
        let role_claim = self.role_claim();
        UserRecord {
            uid: self.local_id,
            email: self
                .email
                .unwrap_or_else(|| fallback_email.to_string())
                .to_lowercase(),
            display_name: self.display_name,
            role_claim,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OobResponse {
    oob_link: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    #[serde(default)]
    message: String,
}

enum Credential<'a> {
    ApiKey(&'a str),
    Bearer(&'a str),
}

fn role_from_custom_attributes(raw: &str) -> Option<String> {
    let claims: Value = serde_json::from_str(raw).ok()?;
    claims.get("role")?.as_str().map(str::to_string)
}

// ---------------------------------------------------------------------------
// IdentityToolkit
// ---------------------------------------------------------------------------

/// Identity provider backed by the Identity Toolkit v1 REST API.
///
/// Token verification uses the web API key (sent as `x-goog-api-key`); user
/// management uses project-scoped endpoints authorized with an admin bearer
/// token.
pub struct IdentityToolkit {
    config: IdentityConfig,
    client: OnceLock<reqwest::Client>,
}

impl IdentityToolkit {
    pub fn new(config: IdentityConfig) -> Self {
        Self {
            config,
            client: OnceLock::new(),
        }
    }

    fn base(&self) -> &str {
        self.config.base_url.trim_end_matches('/')
    }

    fn project_url(&self, method: &str) -> Result<(String, &str), IdentityError> {
        match (&self.config.project_id, &self.config.admin_token) {
            (Some(project), Some(token)) => Ok((
                format!("{}/projects/{project}/{method}", self.base()),
                token.as_str(),
            )),
            _ => Err(IdentityError::AdminNotConfigured),
        }
    }

    fn api_key(&self) -> Result<&str, IdentityError> {
        self.config
            .api_key
            .as_deref()
            .ok_or_else(|| IdentityError::Provider("identity API key is not configured".into()))
    }

    async fn post<T: DeserializeOwned>(
        &self,
        url: &str,
        credential: Credential<'_>,
        body: Value,
    ) -> Result<T, IdentityError> {
        let client = lazy_client(&self.client, IDENTITY_TIMEOUT)?;
        let request = client.post(url).json(&body);
        let request = match credential {
            Credential::ApiKey(key) => request.header(API_KEY_HEADER, key),
            Credential::Bearer(token) => request.bearer_auth(token),
        };
        let response = request.send().await?;
        let status = response.status();
        let bytes = response.bytes().await?;

        if status.is_success() {
            return serde_json::from_slice(&bytes)
                .map_err(|e| IdentityError::Provider(format!("unexpected response: {e}")));
        }

        let message = serde_json::from_slice::<ErrorResponse>(&bytes)
            .map(|e| e.error.message)
            .unwrap_or_else(|_| format!("HTTP {status}"));
        if status.is_server_error() {
            return Err(IdentityError::Unavailable(message));
        }
        Err(IdentityError::Provider(message))
    }

    async fn admin_post<T: DeserializeOwned>(
        &self,
        method: &str,
        body: Value,
    ) -> Result<T, IdentityError> {
        let (url, token) = self.project_url(method)?;
        self.post(&url, Credential::Bearer(token), body).await
    }
}

#[async_trait]
impl IdentityProvider for IdentityToolkit {
    async fn verify_token(&self, token: &str) -> Result<VerifiedToken, IdentityError> {
        let key = self.api_key()?;
        let url = format!("{}/accounts:lookup", self.base());
        let response: LookupResponse = match self
            .post(&url, Credential::ApiKey(key), json!({ "idToken": token }))
            .await
        {
            Ok(r) => r,
            Err(IdentityError::Provider(msg)) => {
                debug!("token rejected by identity provider: {msg}");
                return Err(IdentityError::InvalidToken);
            }
            Err(e) => return Err(e),
        };

        let user = response
            .users
            .into_iter()
            .next()
            .ok_or(IdentityError::InvalidToken)?;
        let role_claim = user.role_claim();
        let email = user
            .email
            .filter(|e| !e.trim().is_empty())
            .ok_or(IdentityError::InvalidToken)?;
        Ok(VerifiedToken { email, role_claim })
    }

    async fn lookup_user(&self, email: &str) -> Result<Option<UserRecord>, IdentityError> {
        let response: LookupResponse = match self
            .admin_post("accounts:lookup", json!({ "email": [email] }))
            .await
        {
            Ok(r) => r,
            Err(IdentityError::Provider(msg)) if msg.starts_with("USER_NOT_FOUND") => {
                return Ok(None)
            }
            Err(e) => return Err(e),
        };
        Ok(response
            .users
            .into_iter()
            .next()
            .map(|u| u.into_record(email)))
    }

    async fn create_user(
        &self,
        email: &str,
        display_name: Option<&str>,
    ) -> Result<UserRecord, IdentityError> {
        let mut body = json!({ "email": email, "emailVerified": false });
        if let Some(name) = display_name {
            body["displayName"] = json!(name);
        }
        let user: ToolkitUser = self.admin_post("accounts", body).await?;
        let mut record = user.into_record(email);
        if record.display_name.is_none() {
            record.display_name = display_name.map(str::to_string);
        }
        Ok(record)
    }

    async fn update_display_name(
        &self,
        uid: &str,
        display_name: &str,
    ) -> Result<(), IdentityError> {
        let _: Value = self
            .admin_post(
                "accounts:update",
                json!({ "localId": uid, "displayName": display_name }),
            )
            .await?;
        Ok(())
    }

    async fn set_role_claim(&self, uid: &str, role: Role) -> Result<(), IdentityError> {
        let claims = json!({ "role": role.as_str() }).to_string();
        let _: Value = self
            .admin_post(
                "accounts:update",
                json!({ "localId": uid, "customAttributes": claims }),
            )
            .await?;
        Ok(())
    }

    async fn password_reset_link(
        &self,
        email: &str,
        continue_url: Option<&str>,
    ) -> Result<String, IdentityError> {
        let mut body = json!({
            "requestType": "PASSWORD_RESET",
            "email": email,
            "returnOobLink": true,
        });
        if let Some(url) = continue_url {
            body["continueUrl"] = json!(url);
        }
        let response: OobResponse = match self.admin_post("accounts:sendOobCode", body).await {
            Ok(r) => r,
            Err(IdentityError::Provider(msg)) if msg.starts_with("EMAIL_NOT_FOUND") => {
                return Err(IdentityError::UserNotFound(email.to_string()))
            }
            Err(e) => return Err(e),
        };
        response
            .oob_link
            .ok_or_else(|| IdentityError::Provider("no reset link in response".into()))
    }

    async fn send_password_reset(
        &self,
        email: &str,
        continue_url: Option<&str>,
    ) -> Result<(), IdentityError> {
        let key = self.api_key()?;
        let url = format!("{}/accounts:sendOobCode", self.base());
        let mut body = json!({ "requestType": "PASSWORD_RESET", "email": email });
        if let Some(continue_url) = continue_url {
            body["continueUrl"] = json!(continue_url);
        }
        let _: Value = self.post(&url, Credential::ApiKey(key), body).await?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    fn toolkit(url: String) -> IdentityToolkit {
        IdentityToolkit::new(IdentityConfig {
            base_url: url,
            api_key: Some("web-key".into()),
            project_id: Some("portal".into()),
            admin_token: Some("admin-token".into()),
        })
    }

    #[test]
    fn role_claim_is_read_from_custom_attributes() {
        assert_eq!(
            role_from_custom_attributes(r#"{"role":"INSTRUCTOR","cohort":3}"#).as_deref(),
            Some("INSTRUCTOR")
        );
        assert_eq!(role_from_custom_attributes(r#"{"cohort":3}"#), None);
        assert_eq!(role_from_custom_attributes("not json"), None);
    }

    #[tokio::test]
    async fn verify_token_returns_email_and_role() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/accounts:lookup")
            .match_header("x-goog-api-key", "web-key")
            .match_body(Matcher::Json(json!({ "idToken": "tok" })))
            .with_status(200)
            .with_body(
                r#"{"users":[{"localId":"u1","email":"teach@school.edu","customAttributes":"{\"role\":\"INSTRUCTOR\"}"}]}"#,
            )
            .create_async()
            .await;

        let verified = toolkit(server.url()).verify_token("tok").await.unwrap();
        assert_eq!(verified.email, "teach@school.edu");
        assert_eq!(verified.role_claim.as_deref(), Some("INSTRUCTOR"));
    }

    #[tokio::test]
    async fn rejected_token_is_invalid() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/accounts:lookup")
            .with_status(400)
            .with_body(r#"{"error":{"code":400,"message":"INVALID_ID_TOKEN"}}"#)
            .create_async()
            .await;

        let err = toolkit(server.url()).verify_token("bad").await.unwrap_err();
        assert!(matches!(err, IdentityError::InvalidToken));
    }

    #[tokio::test]
    async fn provider_outage_is_not_an_invalid_token() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/accounts:lookup")
            .with_status(503)
            .with_body("upstream connect error")
            .create_async()
            .await;

        let err = toolkit(server.url()).verify_token("tok").await.unwrap_err();
        assert!(matches!(err, IdentityError::Unavailable(_)), "{err:?}");
    }

    #[tokio::test]
    async fn transport_errors_do_not_leak_the_request_url() {
        let provider = IdentityToolkit::new(IdentityConfig {
            base_url: "http://127.0.0.1:1/secret-path".into(),
            api_key: Some("web-key".into()),
            ..IdentityConfig::default()
        });
        let err = provider.verify_token("tok").await.unwrap_err();
        assert!(matches!(err, IdentityError::Transport(_)), "{err:?}");
        let text = err.to_string();
        assert!(!text.contains("secret-path"), "{text}");
        assert!(!text.contains("web-key"), "{text}");
    }

    #[tokio::test]
    async fn lookup_missing_user_returns_none() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/projects/portal/accounts:lookup")
            .match_header("authorization", "Bearer admin-token")
            .with_status(200)
            .with_body("{}")
            .create_async()
            .await;

        let found = toolkit(server.url())
            .lookup_user("ghost@school.edu")
            .await
            .unwrap();
        assert!(found.is_none());
    }

    #[tokio::test]
    async fn set_role_claim_sends_encoded_claims() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/projects/portal/accounts:update")
            .match_body(Matcher::Json(json!({
                "localId": "u1",
                "customAttributes": "{\"role\":\"ADMIN\"}",
            })))
            .with_status(200)
            .with_body(r#"{"localId":"u1"}"#)
            .create_async()
            .await;

        toolkit(server.url())
            .set_role_claim("u1", Role::Admin)
            .await
            .unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn reset_link_for_unknown_email_is_user_not_found() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/projects/portal/accounts:sendOobCode")
            .with_status(400)
            .with_body(r#"{"error":{"code":400,"message":"EMAIL_NOT_FOUND"}}"#)
            .create_async()
            .await;

        let err = toolkit(server.url())
            .password_reset_link("ghost@school.edu", None)
            .await
            .unwrap_err();
        assert!(matches!(err, IdentityError::UserNotFound(_)));
    }

    #[tokio::test]
    async fn send_password_reset_uses_api_key() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/accounts:sendOobCode")
            .match_header("x-goog-api-key", "web-key")
            .match_body(Matcher::Json(json!({
                "requestType": "PASSWORD_RESET",
                "email": "kid@school.edu",
                "continueUrl": "https://learn.example.org/login",
            })))
            .with_status(200)
            .with_body(r#"{"email":"kid@school.edu"}"#)
            .create_async()
            .await;

        toolkit(server.url())
            .send_password_reset("kid@school.edu", Some("https://learn.example.org/login"))
            .await
            .unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn admin_calls_require_configuration() {
        let provider = IdentityToolkit::new(IdentityConfig::default());
        let err = provider.lookup_user("a@b.co").await.unwrap_err();
        assert!(matches!(err, IdentityError::AdminNotConfigured));
    }
}
