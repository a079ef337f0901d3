//! Shared outbound HTTP client construction.

use std::sync::OnceLock;
use std::time::Duration;

/// Return the client stored in `cell`, building it on first use.
///
/// Concurrent first callers may each build a client; `OnceLock` keeps the
/// first one stored and every caller gets that same instance back.
pub(crate) fn lazy_client(
    cell: &OnceLock<reqwest::Client>,
    timeout: Duration,
) -> Result<&reqwest::Client, reqwest::Error> {
    if let Some(client) = cell.get() {
        return Ok(client);
    }
    let built = reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(concat!("portal-bff/", env!("CARGO_PKG_VERSION")))
        .build()?;
    Ok(cell.get_or_init(|| built))
}
