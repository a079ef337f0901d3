use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::actor::{Actor, Role};

pub const DEFAULT_IDENTITY_URL: &str = "https://identitytoolkit.googleapis.com/v1";
pub const DEFAULT_WORKFLOW_TIMEOUT: Duration = Duration::from_secs(30);

// ---------------------------------------------------------------------------
// ConfigWarning / WarnLevel
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigWarning {
    pub level: WarnLevel,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarnLevel {
    Warning,
    Error,
}

// ---------------------------------------------------------------------------
// Sections
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct WorkflowConfig {
    pub url: String,
    pub secret: String,
    pub timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct IdentityConfig {
    pub base_url: String,
    /// Web API key used for token verification.
    pub api_key: Option<String>,
    pub project_id: Option<String>,
    /// OAuth access token for user management calls.
    pub admin_token: Option<String>,
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_IDENTITY_URL.to_string(),
            api_key: None,
            project_id: None,
            admin_token: None,
        }
    }
}

impl IdentityConfig {
    pub fn admin_enabled(&self) -> bool {
        self.project_id.is_some() && self.admin_token.is_some()
    }
}

/// Development-only identity overrides. Both are off unless set explicitly.
#[derive(Debug, Clone, Default)]
pub struct DevConfig {
    /// Honour `x-portal-email` / `x-portal-role` impersonation headers.
    pub allow_headers: bool,
    pub actor_email: Option<String>,
    pub actor_role: Option<String>,
}

impl DevConfig {
    /// The process-wide development actor, if configured. Role defaults to
    /// ADMIN; an unrecognized role coerces to STUDENT.
    pub fn actor(&self) -> Option<Actor> {
        let email = self.actor_email.as_deref()?;
        let role = self
            .actor_role
            .as_deref()
            .map(Role::parse_or_student)
            .unwrap_or(Role::Admin);
        Actor::new(email, role)
    }
}

// ---------------------------------------------------------------------------
// PortalConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct PortalConfig {
    pub workflow: WorkflowConfig,
    pub identity: IdentityConfig,
    /// Public origin of the portal, used for password-reset continue URLs.
    pub public_base_url: Option<String>,
    pub dev: DevConfig,
}

impl PortalConfig {
    /// Minimal config pointing at a workflow backend; everything else off.
    pub fn new(workflow_url: impl Into<String>, workflow_secret: impl Into<String>) -> Self {
        Self {
            workflow: WorkflowConfig {
                url: workflow_url.into(),
                secret: workflow_secret.into(),
                timeout: DEFAULT_WORKFLOW_TIMEOUT,
            },
            identity: IdentityConfig::default(),
            public_base_url: None,
            dev: DevConfig::default(),
        }
    }

    /// Where password-reset links send the user afterwards.
    pub fn login_url(&self) -> Option<String> {
        self.public_base_url
            .as_deref()
            .map(|base| format!("{}/login", base.trim_end_matches('/')))
    }

    /// Validate the configuration and return a list of warnings.
    /// Any `WarnLevel::Error` entry means the server must not start.
    pub fn validate(&self) -> Vec<ConfigWarning> {
        let mut warnings = Vec::new();

        let url = self.workflow.url.trim();
        if url.is_empty() {
            warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message: "workflow backend URL is not set".to_string(),
            });
        } else if !(url.starts_with("http://") || url.starts_with("https://")) {
            warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message: format!("workflow backend URL '{url}' must be http(s)"),
            });
        }

        if self.workflow.secret.trim().is_empty() {
            warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message: "workflow backend shared secret is not set".to_string(),
            });
        }

        if self.workflow.timeout.is_zero() {
            warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message: "workflow backend timeout must be greater than zero".to_string(),
            });
        }

        if self.identity.api_key.is_none() {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: "identity API key is not set; bearer tokens cannot be verified"
                    .to_string(),
            });
        }

        if !self.identity.admin_enabled() {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: "identity project or admin token is not set; user management and \
                          password reset are disabled"
                    .to_string(),
            });
        }

        if self.dev.allow_headers {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: "development impersonation headers are enabled".to_string(),
            });
        }

        if self.dev.actor_email.is_some() && self.dev.actor().is_none() {
            warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message: "development actor email is blank".to_string(),
            });
        } else if let Some(actor) = self.dev.actor() {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: format!(
                    "development actor {} ({}) answers every unauthenticated request",
                    actor.email(),
                    actor.role()
                ),
            });
        }

        warnings
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
