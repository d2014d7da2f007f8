//! Session cookie handling for the registration endpoints.

use anyhow::Result;
use axum::http::{
    header::{InvalidHeaderValue, COOKIE},
    HeaderMap, HeaderValue,
};

use crate::registrar::{SessionId, SessionStore};

pub const SESSION_COOKIE_NAME: &str = "registrar_session";

/// Session resolved for one request.
pub struct RequestSession {
    pub id: SessionId,
    /// Set when the session was opened for this request and the client still
    /// needs the cookie.
    pub fresh: bool,
}

/// Find the caller's session, or open an anonymous one.
pub fn resolve_session(sessions: &dyn SessionStore, headers: &HeaderMap) -> Result<RequestSession> {
    if let Some(token) = extract_session_token(headers) {
        if let Some(id) = sessions.find(&token)? {
            return Ok(RequestSession { id, fresh: false });
        }
    }
    Ok(RequestSession {
        id: sessions.open()?,
        fresh: true,
    })
}

/// Build an `HttpOnly` cookie for the session token.
pub fn session_cookie(
    session: &SessionId,
    ttl_seconds: u64,
    secure: bool,
) -> Result<HeaderValue, InvalidHeaderValue> {
    let mut cookie = format!(
        "{SESSION_COOKIE_NAME}={session}; Path=/; HttpOnly; SameSite=Lax; Max-Age={ttl_seconds}"
    );
    if secure {
        cookie.push_str("; Secure");
    }
    HeaderValue::from_str(&cookie)
}

pub fn extract_session_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(COOKIE)?.to_str().ok()?;
    value.split(';').find_map(|pair| {
        let (key, val) = pair.trim().split_once('=')?;
        (key.trim() == SESSION_COOKIE_NAME && !val.trim().is_empty())
            .then(|| val.trim().to_string())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemorySessionStore;

    fn cookie_headers(value: &str) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_str(value)?);
        Ok(headers)
    }

    #[test]
    fn extracts_session_among_other_cookies() -> Result<()> {
        let headers = cookie_headers("theme=dark; registrar_session=abc123 ; lang=en")?;
        assert_eq!(extract_session_token(&headers).as_deref(), Some("abc123"));
        assert_eq!(extract_session_token(&cookie_headers("theme=dark")?), None);
        assert_eq!(extract_session_token(&cookie_headers("registrar_session=")?), None);
        assert_eq!(extract_session_token(&HeaderMap::new()), None);
        Ok(())
    }

    #[test]
    fn cookie_is_http_only() -> Result<()> {
        let cookie = session_cookie(&SessionId::new("abc"), 60, false)?;
        assert_eq!(
            cookie.to_str()?,
            "registrar_session=abc; Path=/; HttpOnly; SameSite=Lax; Max-Age=60"
        );
        let cookie = session_cookie(&SessionId::new("abc"), 60, true)?;
        assert!(cookie.to_str()?.ends_with("; Secure"));
        Ok(())
    }

    #[test]
    fn unknown_token_opens_fresh_session() -> Result<()> {
        let store = MemorySessionStore::default();
        let session = resolve_session(&store, &cookie_headers("registrar_session=stale")?)?;
        assert!(session.fresh);
        assert_ne!(session.id.as_str(), "stale");

        let cookie = format!("registrar_session={}", session.id);
        let again = resolve_session(&store, &cookie_headers(&cookie)?)?;
        assert!(!again.fresh);
        assert_eq!(again.id, session.id);
        Ok(())
    }
}
