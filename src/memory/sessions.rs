//! In-memory session store.

use anyhow::{anyhow, Result};
use std::{
    collections::HashMap,
    sync::RwLock,
    time::{Duration, Instant},
};
use tracing::debug;

use crate::registrar::{
    account::AccountId,
    ports::{SessionId, SessionStore},
    token::generate_token,
};

pub const DEFAULT_SESSION_TTL_SECONDS: u64 = 12 * 60 * 60;

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum SessionError {
    #[error("session not found or expired")]
    NotFound,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionClass {
    Anonymous,
    User,
}

impl SessionClass {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Anonymous => "Anonymous",
            Self::User => "User",
        }
    }
}

struct SessionRecord {
    class: SessionClass,
    account: Option<AccountId>,
    expires_at: Instant,
}

impl SessionRecord {
    fn is_live(&self) -> bool {
        Instant::now() < self.expires_at
    }
}

pub struct MemorySessionStore {
    sessions: RwLock<HashMap<String, SessionRecord>>,
    ttl: Duration,
}

impl MemorySessionStore {
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            ttl,
        }
    }

    #[must_use]
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn class(&self, session: &SessionId) -> Result<Option<SessionClass>> {
        let sessions = self.sessions.read().map_err(|_| anyhow!("Poisoned lock"))?;
        Ok(sessions
            .get(session.as_str())
            .filter(|record| record.is_live())
            .map(|record| record.class))
    }

    /// Number of stored sessions, live or not yet purged.
    pub fn len(&self) -> Result<usize> {
        Ok(self
            .sessions
            .read()
            .map_err(|_| anyhow!("Poisoned lock"))?
            .len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// Drop expired sessions, returning how many were removed.
    pub fn purge_expired(&self) -> Result<usize> {
        let mut sessions = self.sessions.write().map_err(|_| anyhow!("Poisoned lock"))?;
        let before = sessions.len();
        sessions.retain(|_, record| record.is_live());
        Ok(before - sessions.len())
    }
}

impl Default for MemorySessionStore {
    fn default() -> Self {
        Self::new(Duration::from_secs(DEFAULT_SESSION_TTL_SECONDS))
    }
}

impl SessionStore for MemorySessionStore {
    fn open(&self) -> Result<SessionId> {
        let token = generate_token()?;
        let mut sessions = self.sessions.write().map_err(|_| anyhow!("Poisoned lock"))?;
        sessions.retain(|_, record| record.is_live());
        sessions.insert(
            token.clone(),
            SessionRecord {
                class: SessionClass::Anonymous,
                account: None,
                expires_at: Instant::now() + self.ttl,
            },
        );
        debug!("Opened anonymous session");
        Ok(SessionId::new(token))
    }

    fn find(&self, token: &str) -> Result<Option<SessionId>> {
        let sessions = self.sessions.read().map_err(|_| anyhow!("Poisoned lock"))?;
        Ok(sessions
            .get(token)
            .filter(|record| record.is_live())
            .map(|_| SessionId::new(token)))
    }

    fn current_account(&self, session: &SessionId) -> Result<Option<AccountId>> {
        let sessions = self.sessions.read().map_err(|_| anyhow!("Poisoned lock"))?;
        Ok(sessions
            .get(session.as_str())
            .filter(|record| record.is_live())
            .and_then(|record| record.account))
    }

    fn elevate(&self, session: &SessionId, account: AccountId) -> Result<()> {
        let mut sessions = self.sessions.write().map_err(|_| anyhow!("Poisoned lock"))?;
        let record = sessions
            .get_mut(session.as_str())
            .filter(|record| record.is_live())
            .ok_or(SessionError::NotFound)?;
        record.class = SessionClass::User;
        record.account = Some(account);
        record.expires_at = Instant::now() + self.ttl;
        debug!(account_id = %account, "Session elevated");
        Ok(())
    }
}
