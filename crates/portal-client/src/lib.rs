//! `portal-client` — typed access to the learning portal BFF.
//!
//! Used by the `portal` CLI and by anything else that needs to talk to the
//! BFF the way the browser does.
//!
//! # Architecture
//!
//! ```text
//! Credentials (bearer token | dev headers)
//!     │
//!     ▼
//! PortalClient   ← JSON over reqwest; non-2xx → ClientError::Api
//!     │
//!     ▼
//! SessionCache   ← fresh 30 s / stale 5 min windows,
//!                  background revalidation while stale
//! ```
//!
//! # Quick start
//!
//! ```rust,ignore
//! use portal_client::{Credentials, PortalClient};
//!
//! let client = PortalClient::new(
//!     "http://localhost:8080",
//!     Credentials::Bearer(token),
//! )?;
//! let session = client.session().await?;
//! let dashboard = client.get("/api/dashboard").await?;
//! ```

pub mod client;
pub mod error;
pub mod session_cache;

#[cfg(test)]
mod tests;

pub use client::{Credentials, PortalClient, Session};
pub use error::ClientError;
pub use reqwest::Method;
pub use session_cache::{Lookup, SessionCache};

/// Convenience `Result` alias for this crate.
pub type Result<T> = std::result::Result<T, ClientError>;
