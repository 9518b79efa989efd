//! Upstream session manager
//!
//! Owns the one authenticated session shared by all refreshes. The state lock
//! is held across login, so concurrent refreshes that find no session wait for
//! a single login instead of racing to authenticate.

use std::path::PathBuf;
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::Mutex;

use crate::adapters::cookie_file;
use crate::domain::ports::{Credentials, Session, UpstreamClient};
use crate::error::UpstreamError;

#[derive(Debug)]
enum SessionState {
    Unauthenticated,
    Authenticated(Session),
}

/// Session state as reported to callers that must not wait on a login
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Authenticated,
    Unauthenticated,
    /// The state lock is held, usually by a login or cookie validation
    Authenticating,
}

pub struct SessionManager<U>
where
    U: UpstreamClient + ?Sized,
{
    upstream: Arc<U>,
    credentials: Credentials,
    cookies_file: Option<PathBuf>,
    state: Mutex<SessionState>,
}

impl<U> SessionManager<U>
where
    U: UpstreamClient + ?Sized,
{
    pub fn new(upstream: Arc<U>, credentials: Credentials, cookies_file: Option<PathBuf>) -> Self {
        Self {
            upstream,
            credentials,
            cookies_file,
            state: Mutex::new(SessionState::Unauthenticated),
        }
    }

    /// Current session, authenticating first if needed
    pub async fn session(&self) -> Result<Session, UpstreamError> {
        let mut state = self.state.lock().await;

        if let SessionState::Authenticated(session) = &*state {
            return Ok(session.clone());
        }

        let session = self.authenticate().await?;
        *state = SessionState::Authenticated(session.clone());
        Ok(session)
    }

    /// Drop a session the upstream rejected
    ///
    /// Only transitions back to `Unauthenticated` if `stale` is still the
    /// current session; a newer session established meanwhile is kept.
    pub async fn invalidate(&self, stale: &Session) {
        let mut state = self.state.lock().await;

        if matches!(&*state, SessionState::Authenticated(current) if current == stale) {
            tracing::warn!("Upstream rejected session, will re-authenticate");
            *state = SessionState::Unauthenticated;
            if let Some(path) = &self.cookies_file {
                cookie_file::remove(path).await;
            }
        }
    }

    /// Current state without waiting for the state lock
    pub fn status(&self) -> SessionStatus {
        match self.state.try_lock() {
            Ok(state) => match &*state {
                SessionState::Authenticated(_) => SessionStatus::Authenticated,
                SessionState::Unauthenticated => SessionStatus::Unauthenticated,
            },
            Err(_) => SessionStatus::Authenticating,
        }
    }

    async fn authenticate(&self) -> Result<Session, UpstreamError> {
        if let Some(path) = &self.cookies_file {
            if let Some(saved) = cookie_file::load(path).await {
                match self.upstream.validate(&saved).await {
                    Ok(()) => {
                        tracing::info!("Restored upstream session from cookie file");
                        return Ok(saved);
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "Cookie validation failed");
                        cookie_file::remove(path).await;
                    }
                }
            }
        }

        tracing::info!(username = %self.credentials.username, "Logging in to upstream");
        let session = self.upstream.login(&self.credentials).await?;

        if let Some(path) = &self.cookies_file {
            if let Err(e) = cookie_file::save(path, &session).await {
                tracing::warn!(path = %path.display(), error = %e, "Failed to save cookies");
            }
        }

        Ok(session)
    }
}
