use std::sync::Arc;

use portal_core::chat::{ChatStore, MemoryChatStore};
use portal_core::config::PortalConfig;
use portal_core::{ActionGateway, HttpActionGateway, IdentityProvider, IdentityToolkit};

use crate::auth::ActorResolver;

/// Shared application state passed to all route handlers.
///
/// Every collaborator is read-only after construction; handlers keep no
/// state of their own between requests.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<PortalConfig>,
    pub resolver: Arc<ActorResolver>,
    pub gateway: Arc<dyn ActionGateway>,
    pub identity: Arc<dyn IdentityProvider>,
    pub chat: Arc<dyn ChatStore>,
}

impl AppState {
    /// Wire the production collaborators from configuration.
    pub fn from_config(config: PortalConfig) -> Self {
        let gateway = Arc::new(HttpActionGateway::new(&config.workflow));
        let identity = Arc::new(IdentityToolkit::new(config.identity.clone()));
        Self::new(config, gateway, identity, Arc::new(MemoryChatStore::new()))
    }

    pub fn new(
        config: PortalConfig,
        gateway: Arc<dyn ActionGateway>,
        identity: Arc<dyn IdentityProvider>,
        chat: Arc<dyn ChatStore>,
    ) -> Self {
        let resolver = Arc::new(ActorResolver::from_config(&config.dev, identity.clone()));
        Self {
            config: Arc::new(config),
            resolver,
            gateway,
            identity,
            chat,
        }
    }
}
