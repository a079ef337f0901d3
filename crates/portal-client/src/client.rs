use portal_core::actor::{EMAIL_HEADER, ROLE_HEADER};
use portal_core::Role;
use reqwest::Method;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::{ClientError, Result};

// ─── Credentials ──────────────────────────────────────────────────────────

/// How the client identifies itself to the BFF.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Credentials {
    #[default]
    Anonymous,
    /// `Authorization: Bearer <token>` issued by the identity provider.
    Bearer(String),
    /// Development impersonation headers. Only honored by a BFF started with
    /// dev headers enabled.
    Dev { email: String, role: Option<Role> },
}

// ─── Session ──────────────────────────────────────────────────────────────

/// The actor the BFF resolved for these credentials.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub email: String,
    pub role: Role,
    #[serde(default)]
    pub admin_capable: bool,
}

// ─── PortalClient ─────────────────────────────────────────────────────────

/// Thin JSON wrapper over the BFF routes.
///
/// Every non-2xx response becomes [`ClientError::Api`] carrying the body's
/// `error` and `code` fields, so callers never inspect raw responses.
pub struct PortalClient {
    base_url: String,
    credentials: Credentials,
    http: reqwest::Client,
}

impl PortalClient {
    pub fn new(base_url: &str, credentials: Credentials) -> Result<Self> {
        let base_url = base_url.trim().trim_end_matches('/').to_string();
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(ClientError::InvalidBaseUrl(base_url));
        }
        let http = reqwest::Client::builder()
            .user_agent(concat!("portal-client/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            base_url,
            credentials,
            http,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Send `method path` with an optional JSON body and return the parsed
    /// response body (`{ ok, data }` for portal routes).
    pub async fn request(&self, method: Method, path: &str, body: Option<&Value>) -> Result<Value> {
        let url = format!("{}/{}", self.base_url, path.trim_start_matches('/'));
        debug!(%method, %url, "portal request");

        let mut req = self.http.request(method, &url);
        req = match &self.credentials {
            Credentials::Anonymous => req,
            Credentials::Bearer(token) => req.bearer_auth(token),
            Credentials::Dev { email, role } => {
                let req = req.header(EMAIL_HEADER, email);
                match role {
                    Some(role) => req.header(ROLE_HEADER, role.as_str()),
                    None => req,
                }
            }
        };
        if let Some(body) = body {
            req = req.json(body);
        }

        let response = req.send().await?;
        let status = response.status();
        let bytes = response.bytes().await?;
        let parsed: Option<Value> = serde_json::from_slice(&bytes).ok();

        if !status.is_success() {
            return Err(api_error(status.as_u16(), parsed.as_ref()));
        }
        parsed.ok_or_else(|| ClientError::Decode(format!("{url} did not return JSON")))
    }

    pub async fn get(&self, path: &str) -> Result<Value> {
        self.request(Method::GET, path, None).await
    }

    pub async fn post(&self, path: &str, body: &Value) -> Result<Value> {
        self.request(Method::POST, path, Some(body)).await
    }

    /// The `data` member of a successful portal response.
    pub async fn data(&self, method: Method, path: &str, body: Option<&Value>) -> Result<Value> {
        let mut value = self.request(method, path, body).await?;
        match value.get_mut("data") {
            Some(data) => Ok(data.take()),
            None => Err(ClientError::Decode(format!("{path}: response has no data"))),
        }
    }

    /// Resolve the current session. Fails with a 401 [`ClientError::Api`]
    /// when the credentials are missing or rejected.
    pub async fn session(&self) -> Result<Session> {
        let data = self.data(Method::GET, "/api/session", None).await?;
        serde_json::from_value(data).map_err(|e| ClientError::Decode(e.to_string()))
    }
}

fn api_error(status: u16, body: Option<&Value>) -> ClientError {
    let field = |name: &str| {
        body.and_then(|b| b.get(name))
            .and_then(Value::as_str)
            .map(str::to_string)
    };
    ClientError::Api {
        status,
        code: field("code").unwrap_or_else(|| "UNKNOWN".into()),
        message: field("error").unwrap_or_else(|| format!("Request failed ({status})")),
    }
}
