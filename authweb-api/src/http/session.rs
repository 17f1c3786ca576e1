//! Server-side session storage
//!
//! Session values stay on the server in a concurrent map; the browser only
//! holds the random session id in an `HttpOnly` cookie.

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use dashmap::DashMap;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use authweb_core::config::SessionConfig;
use authweb_core::oauth2::Session;

const SESSION_ID_LEN: usize = 32;
const MAX_PURGE_INTERVAL: Duration = Duration::from_secs(60);

#[derive(Debug)]
struct SessionEntry {
    session: Session,
    touched_at: Instant,
}

/// A session checked out for the duration of one request
#[derive(Debug)]
pub struct SessionHandle {
    id: String,
    is_new: bool,
    pub session: Session,
}

impl SessionHandle {
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// No cookie has been issued for this session yet
    #[must_use]
    pub const fn is_new(&self) -> bool {
        self.is_new
    }
}

#[derive(Debug, Clone)]
pub struct SessionManager {
    sessions: Arc<DashMap<String, SessionEntry>>,
    cookie_name: String,
    secure: bool,
    idle_timeout: Duration,
}

impl SessionManager {
    #[must_use]
    pub fn new(config: &SessionConfig) -> Self {
        Self {
            sessions: Arc::new(DashMap::new()),
            cookie_name: config.cookie_name.clone(),
            secure: config.secure,
            idle_timeout: config.idle_timeout(),
        }
    }

    /// Check out the session named by the request cookie, or a fresh one
    /// when the cookie is absent, unknown, or idle for too long.
    #[must_use]
    pub fn load(&self, jar: &CookieJar) -> SessionHandle {
        if let Some(cookie) = jar.get(&self.cookie_name) {
            let id = cookie.value();
            if let Some(mut entry) = self.sessions.get_mut(id) {
                if entry.touched_at.elapsed() < self.idle_timeout {
                    entry.touched_at = Instant::now();
                    return SessionHandle {
                        id: id.to_string(),
                        is_new: false,
                        session: entry.session.clone(),
                    };
                }
            }
        }

        SessionHandle {
            id: nanoid::nanoid!(SESSION_ID_LEN),
            is_new: true,
            session: Session::new(),
        }
    }

    /// Move `handle` to a fresh id, dropping the entry stored under the old
    /// one. The next [`commit`](Self::commit) issues a new cookie.
    pub fn rotate(&self, handle: &mut SessionHandle) {
        self.sessions.remove(&handle.id);
        handle.id = nanoid::nanoid!(SESSION_ID_LEN);
        handle.is_new = true;
    }

    /// Store `handle` back, setting the session cookie if it is new.
    #[must_use]
    pub fn commit(&self, jar: CookieJar, handle: SessionHandle) -> CookieJar {
        self.sessions.insert(
            handle.id.clone(),
            SessionEntry {
                session: handle.session,
                touched_at: Instant::now(),
            },
        );

        if handle.is_new {
            jar.add(self.session_cookie(handle.id))
        } else {
            jar
        }
    }

    fn session_cookie(&self, id: String) -> Cookie<'static> {
        Cookie::build((self.cookie_name.clone(), id))
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax)
            .secure(self.secure)
            .build()
    }

    /// Drop sessions idle for longer than the configured timeout.
    pub fn purge_expired(&self) -> usize {
        let before = self.sessions.len();
        self.sessions
            .retain(|_, entry| entry.touched_at.elapsed() < self.idle_timeout);
        before.saturating_sub(self.sessions.len())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Periodically purge idle sessions until `shutdown` fires.
    pub fn spawn_purge_task(&self, shutdown: CancellationToken) -> JoinHandle<()> {
        let manager = self.clone();
        let period = self
            .idle_timeout
            .clamp(Duration::from_secs(1), MAX_PURGE_INTERVAL);

        tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            loop {
                tokio::select! {
                    () = shutdown.cancelled() => break,
                    _ = interval.tick() => {
                        let purged = manager.purge_expired();
                        if purged > 0 {
                            debug!(purged, remaining = manager.len(), "Purged idle sessions");
                        }
                    }
                }
            }
        })
    }
}
