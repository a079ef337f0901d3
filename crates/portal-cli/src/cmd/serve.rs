use std::time::Duration;

use anyhow::Result;
use clap::Args;
use portal_core::config::{DevConfig, IdentityConfig, PortalConfig, WorkflowConfig, DEFAULT_IDENTITY_URL};

// ---------------------------------------------------------------------------
// Arguments
// ---------------------------------------------------------------------------

#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Port to listen on
    #[arg(long, env = "PORTAL_PORT", default_value = "8080")]
    pub port: u16,

    /// Workflow backend endpoint that executes actions
    #[arg(long, env = "PORTAL_WORKFLOW_URL")]
    pub workflow_url: Option<String>,

    /// Shared secret sent to the workflow backend
    #[arg(long, env = "PORTAL_WORKFLOW_SECRET", hide_env_values = true)]
    pub workflow_secret: Option<String>,

    /// Seconds before a workflow call is abandoned
    #[arg(long, env = "PORTAL_WORKFLOW_TIMEOUT_SECS", default_value = "30")]
    pub workflow_timeout_secs: u64,

    /// Identity provider REST base URL
    #[arg(long, env = "PORTAL_IDENTITY_URL", default_value = DEFAULT_IDENTITY_URL)]
    pub identity_url: String,

    /// Public API key used to verify ID tokens
    #[arg(long, env = "PORTAL_IDENTITY_API_KEY", hide_env_values = true)]
    pub identity_api_key: Option<String>,

    /// Identity project, required for user management
    #[arg(long, env = "PORTAL_IDENTITY_PROJECT")]
    pub identity_project: Option<String>,

    /// Service access token for identity admin calls
    #[arg(long, env = "PORTAL_IDENTITY_ADMIN_TOKEN", hide_env_values = true)]
    pub identity_admin_token: Option<String>,

    /// Public origin of the portal, used in password-reset links
    #[arg(long, env = "PORTAL_PUBLIC_BASE_URL")]
    pub public_base_url: Option<String>,

    /// Act as this email for every unauthenticated request (development only)
    #[arg(long, env = "PORTAL_DEV_EMAIL")]
    pub dev_email: Option<String>,

    /// Role for --dev-email (default ADMIN)
    #[arg(long, env = "PORTAL_DEV_ROLE")]
    pub dev_role: Option<String>,

    /// Honor x-portal-email / x-portal-role headers (development only)
    #[arg(long, env = "PORTAL_DEV_HEADERS")]
    pub dev_headers: bool,
}

impl ServeArgs {
    pub fn into_config(self) -> PortalConfig {
        PortalConfig {
            workflow: WorkflowConfig {
                url: self.workflow_url.unwrap_or_default(),
                secret: self.workflow_secret.unwrap_or_default(),
                timeout: Duration::from_secs(self.workflow_timeout_secs),
            },
            identity: IdentityConfig {
                base_url: self.identity_url,
                api_key: self.identity_api_key,
                project_id: self.identity_project,
                admin_token: self.identity_admin_token,
            },
            public_base_url: self.public_base_url,
            dev: DevConfig {
                allow_headers: self.dev_headers,
                actor_email: self.dev_email,
                actor_role: self.dev_role,
            },
        }
    }
}

// ---------------------------------------------------------------------------
// Run
// ---------------------------------------------------------------------------

pub fn run(args: ServeArgs) -> Result<()> {
    let port = args.port;
    let config = args.into_config();
    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(portal_server::serve(config, port))
}
