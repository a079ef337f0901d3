//! Contracts shared by the learning-portal BFF: the actor model, the action
//! envelope, and the three external collaborators (workflow backend,
//! identity provider, chat document store).

pub mod actor;
pub mod chat;
pub mod config;
pub mod envelope;
pub mod error;
pub mod gateway;
mod http;
pub mod identity;

pub use actor::{Actor, Role};
pub use envelope::{ActionEnvelope, ActionRequest, ApiErrorBody, ApiSuccess};
pub use error::{GatewayError, IdentityError, PortalError, Result};
pub use gateway::{ActionGateway, HttpActionGateway};
pub use identity::{IdentityProvider, IdentityToolkit};
