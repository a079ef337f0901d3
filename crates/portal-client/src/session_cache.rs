use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::client::{PortalClient, Session};
use crate::Result;

pub const DEFAULT_FRESH: Duration = Duration::from_secs(30);
pub const DEFAULT_STALE: Duration = Duration::from_secs(5 * 60);

// ─── Freshness ────────────────────────────────────────────────────────────

/// Where a cached entry of a given age falls between the two windows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Freshness {
    /// Use as-is.
    Fresh,
    /// Use now, revalidate in the background.
    Stale,
    /// Discard and recheck before answering.
    Expired,
}

pub fn classify(age: Duration, fresh: Duration, stale: Duration) -> Freshness {
    if age < fresh {
        Freshness::Fresh
    } else if age < stale {
        Freshness::Stale
    } else {
        Freshness::Expired
    }
}

/// Result of [`SessionCache::lookup`].
#[derive(Debug, Clone, PartialEq)]
pub enum Lookup {
    Fresh(Session),
    Stale(Session),
    Miss,
}

// ─── SessionCache ─────────────────────────────────────────────────────────

struct Entry {
    session: Session,
    fetched_at: Instant,
}

/// Time-windowed cache of the resolved session.
///
/// Cloning is cheap; clones share the same entry.
///
/// ```rust,ignore
/// let cache = SessionCache::new(Arc::new(client));
/// let session = cache.get().await?;   // network on first call only
/// cache.invalidate().await;           // after sign-out
/// ```
#[derive(Clone)]
pub struct SessionCache {
    client: Arc<PortalClient>,
    fresh: Duration,
    stale: Duration,
    entry: Arc<RwLock<Option<Entry>>>,
    revalidating: Arc<AtomicBool>,
}

impl SessionCache {
    pub fn new(client: Arc<PortalClient>) -> Self {
        Self::with_windows(client, DEFAULT_FRESH, DEFAULT_STALE)
    }

    pub fn with_windows(client: Arc<PortalClient>, fresh: Duration, stale: Duration) -> Self {
        Self {
            client,
            fresh,
            stale: stale.max(fresh),
            entry: Arc::new(RwLock::new(None)),
            revalidating: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Classify the cached entry without touching the network.
    pub async fn lookup(&self) -> Lookup {
        let entry = self.entry.read().await;
        let Some(entry) = entry.as_ref() else {
            return Lookup::Miss;
        };
        match classify(entry.fetched_at.elapsed(), self.fresh, self.stale) {
            Freshness::Fresh => Lookup::Fresh(entry.session.clone()),
            Freshness::Stale => Lookup::Stale(entry.session.clone()),
            Freshness::Expired => Lookup::Miss,
        }
    }

    /// The session, fetching or revalidating as the windows require.
    pub async fn get(&self) -> Result<Session> {
        match self.lookup().await {
            Lookup::Fresh(session) => Ok(session),
            Lookup::Stale(session) => {
                self.spawn_revalidation();
                Ok(session)
            }
            Lookup::Miss => self.refresh().await,
        }
    }

    /// Fetch the session now and store it. A 401 clears the entry.
    pub async fn refresh(&self) -> Result<Session> {
        match self.client.session().await {
            Ok(session) => {
                *self.entry.write().await = Some(Entry {
                    session: session.clone(),
                    fetched_at: Instant::now(),
                });
                Ok(session)
            }
            Err(e) => {
                if e.is_unauthenticated() {
                    self.invalidate().await;
                }
                Err(e)
            }
        }
    }

    pub async fn invalidate(&self) {
        *self.entry.write().await = None;
    }

    fn spawn_revalidation(&self) {
        if self.revalidating.swap(true, Ordering::AcqRel) {
            return;
        }
        let cache = self.clone();
        tokio::spawn(async move {
            debug!("revalidating stale session");
            if let Err(e) = cache.refresh().await {
                warn!("session revalidation failed: {e}");
            }
            cache.revalidating.store(false, Ordering::Release);
        });
    }
}
