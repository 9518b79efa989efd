//! Cookie file persistence for upstream sessions
//!
//! The file holds a JSON array of `{name, value}` cookies. A file that fails to
//! parse, or that carries more than one `ct0` cookie, is stale and gets removed.

use std::path::Path;

use crate::domain::ports::{Session, SessionCookie};

const CSRF_COOKIE: &str = "ct0";

/// Load a saved session, cleaning up unusable files
pub async fn load(path: &Path) -> Option<Session> {
    let raw = match tokio::fs::read(path).await {
        Ok(raw) => raw,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!(path = %path.display(), "No cookie file");
            return None;
        }
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Failed to read cookie file");
            return None;
        }
    };

    let cookies: Vec<SessionCookie> = match serde_json::from_slice(&raw) {
        Ok(cookies) => cookies,
        Err(e) => {
            tracing::error!(path = %path.display(), error = %e, "Error cleaning cookies");
            remove(path).await;
            return None;
        }
    };

    let csrf_count = cookies.iter().filter(|c| c.name == CSRF_COOKIE).count();
    if csrf_count > 1 {
        tracing::warn!(
            path = %path.display(),
            count = csrf_count,
            "Found multiple ct0 cookies, discarding cookie file"
        );
        remove(path).await;
        return None;
    }

    if cookies.is_empty() {
        return None;
    }

    Some(Session { cookies })
}

/// Persist a session's cookies
pub async fn save(path: &Path, session: &Session) -> std::io::Result<()> {
    let body = serde_json::to_vec_pretty(&session.cookies)?;
    tokio::fs::write(path, body).await
}

/// Remove the cookie file if present
pub async fn remove(path: &Path) {
    match tokio::fs::remove_file(path).await {
        Ok(()) => tracing::debug!(path = %path.display(), "Removed cookie file"),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Failed to remove cookie file")
        }
    }
}
