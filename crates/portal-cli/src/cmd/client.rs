use anyhow::{anyhow, Result};
use clap::Args;
use portal_client::{Credentials, PortalClient};
use portal_core::Role;

/// Where the BFF lives and who to call it as.
#[derive(Args, Debug)]
pub struct ClientArgs {
    /// Base URL of a running BFF
    #[arg(long, env = "PORTAL_URL", default_value = "http://localhost:8080")]
    pub url: String,

    /// Identity-provider ID token, sent as a bearer token
    #[arg(long, env = "PORTAL_TOKEN", hide_env_values = true, conflicts_with = "as_email")]
    pub token: Option<String>,

    /// Impersonate this email via the dev headers (server must allow them)
    #[arg(long, env = "PORTAL_AS_EMAIL")]
    pub as_email: Option<String>,

    /// Role to impersonate alongside --as-email
    #[arg(long, env = "PORTAL_AS_ROLE", requires = "as_email")]
    pub as_role: Option<String>,
}

impl ClientArgs {
    pub fn credentials(&self) -> Result<Credentials> {
        if let Some(token) = &self.token {
            return Ok(Credentials::Bearer(token.clone()));
        }
        let Some(email) = &self.as_email else {
            return Ok(Credentials::Anonymous);
        };
        let role = match &self.as_role {
            Some(raw) => Some(
                Role::parse(raw)
                    .ok_or_else(|| anyhow!("unknown role '{raw}' (expected STUDENT, INSTRUCTOR or ADMIN)"))?,
            ),
            None => None,
        };
        Ok(Credentials::Dev {
            email: email.clone(),
            role,
        })
    }

    pub fn build(&self) -> Result<PortalClient> {
        Ok(PortalClient::new(&self.url, self.credentials()?)?)
    }
}
