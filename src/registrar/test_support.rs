//! Recording collaborators for workflow tests.
//!
//! Every fake writes to one shared [`Journal`] so tests can assert the order
//! of side effects across collaborators.

use anyhow::{anyhow, Result};
use secrecy::SecretString;
use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
    time::Duration,
};

use super::{
    account::{Account, AccountId},
    config::RegistrationConfig,
    events::{BeforeRegister, RecoveryRequested, RegisterComplete, RegistrationListener},
    ports::{DuplicateField, Notifier, SessionId, SessionStore, TokenIssuer, TokenRequest, UserStore},
    recover::RecoveryWorkflow,
    register::RegistrationWorkflow,
    submission::FieldMap,
    token::{generate_token, RecoveryToken, DEFAULT_TOKEN_TTL_SECONDS},
};

pub fn fields_of(pairs: &[(&str, &str)]) -> FieldMap {
    pairs
        .iter()
        .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
        .collect()
}

fn locked<T>(mutex: &Mutex<T>) -> Result<std::sync::MutexGuard<'_, T>> {
    mutex.lock().map_err(|_| anyhow!("Poisoned lock"))
}

#[derive(Clone, Default)]
pub struct Journal(Arc<Mutex<Vec<String>>>);

impl Journal {
    pub fn record(&self, entry: impl Into<String>) -> Result<()> {
        locked(&self.0)?.push(entry.into());
        Ok(())
    }

    pub fn entries(&self) -> Result<Vec<String>> {
        Ok(locked(&self.0)?.clone())
    }
}

pub struct RecordingUserStore {
    journal: Journal,
    known: Mutex<Vec<Account>>,
    saved: Mutex<Vec<Account>>,
    rejection: Mutex<Option<(String, String)>>,
    claimed_on_save: Mutex<Option<String>>,
}

impl RecordingUserStore {
    fn new(journal: Journal) -> Self {
        Self {
            journal,
            known: Mutex::new(Vec::new()),
            saved: Mutex::new(Vec::new()),
            rejection: Mutex::new(None),
            claimed_on_save: Mutex::new(None),
        }
    }

    /// Add an already persisted account, returning it with its new id.
    pub fn seed(&self, mut account: Account) -> Result<Account> {
        account.assign_id(AccountId::new());
        locked(&self.known)?.push(account.clone());
        Ok(account)
    }

    /// Make `validate` fail with one error.
    pub fn reject_with(&self, field: &str, message: &str) -> Result<()> {
        *locked(&self.rejection)? = Some((field.to_string(), message.to_string()));
        Ok(())
    }

    /// Make `save` report that `field` was taken after validation passed.
    pub fn claim_on_save(&self, field: &str) -> Result<()> {
        *locked(&self.claimed_on_save)? = Some(field.to_string());
        Ok(())
    }

    pub fn saved(&self) -> Result<Vec<Account>> {
        Ok(locked(&self.saved)?.clone())
    }

    fn find_by(&self, field: &str, value: &str) -> Result<Option<Account>> {
        let known = locked(&self.known)?;
        let saved = locked(&self.saved)?;
        Ok(known
            .iter()
            .chain(saved.iter())
            .find(|account| account.field(field) == Some(value))
            .cloned())
    }
}

impl UserStore for RecordingUserStore {
    fn min_password_length(&self, _account: &Account) -> usize {
        5
    }

    fn validate(&self, account: &mut Account) -> Result<bool> {
        self.journal.record("store:validate")?;
        match locked(&self.rejection)?.as_ref() {
            Some((field, message)) => {
                account
                    .validation_errors_mut()
                    .insert(field.clone(), message.clone());
                Ok(false)
            }
            None => Ok(true),
        }
    }

    fn save(&self, account: &mut Account) -> Result<AccountId> {
        self.journal.record("store:save")?;
        if let Some(field) = locked(&self.claimed_on_save)?.as_ref() {
            return Err(DuplicateField::new(field.clone()).into());
        }
        let id = AccountId::new();
        account.assign_id(id);
        locked(&self.saved)?.push(account.clone());
        Ok(id)
    }

    fn find_by_username(&self, username: &str) -> Result<Option<Account>> {
        self.find_by("Username", username)
    }

    fn find_by_email(&self, email: &str) -> Result<Option<Account>> {
        self.find_by("Email", email)
    }
}

pub struct RecordingSessionStore {
    journal: Journal,
    bound: Mutex<HashMap<SessionId, AccountId>>,
    elevated: Mutex<Vec<AccountId>>,
}

impl RecordingSessionStore {
    fn new(journal: Journal) -> Self {
        Self {
            journal,
            bound: Mutex::new(HashMap::new()),
            elevated: Mutex::new(Vec::new()),
        }
    }

    /// Log `session` in as `account` without going through elevation.
    pub fn bind(&self, session: &SessionId, account: AccountId) -> Result<()> {
        locked(&self.bound)?.insert(session.clone(), account);
        Ok(())
    }

    pub fn elevated(&self) -> Result<Vec<AccountId>> {
        Ok(locked(&self.elevated)?.clone())
    }
}

impl SessionStore for RecordingSessionStore {
    fn open(&self) -> Result<SessionId> {
        Ok(SessionId::new(generate_token()?))
    }

    fn find(&self, token: &str) -> Result<Option<SessionId>> {
        Ok(Some(SessionId::new(token)))
    }

    fn current_account(&self, session: &SessionId) -> Result<Option<AccountId>> {
        Ok(locked(&self.bound)?.get(session).copied())
    }

    fn elevate(&self, session: &SessionId, account: AccountId) -> Result<()> {
        self.journal.record("session:elevate")?;
        locked(&self.elevated)?.push(account);
        self.bind(session, account)
    }
}

pub struct RecordingNotifier {
    journal: Journal,
    sent: Mutex<Vec<(String, String, serde_json::Value)>>,
}

impl RecordingNotifier {
    pub fn sent(&self) -> Result<Vec<(String, String, serde_json::Value)>> {
        Ok(locked(&self.sent)?.clone())
    }
}

impl Notifier for RecordingNotifier {
    fn send_template(
        &self,
        recipient: &str,
        template: &str,
        context: &serde_json::Value,
    ) -> Result<()> {
        self.journal.record(format!("notify:{template}"))?;
        locked(&self.sent)?.push((recipient.to_string(), template.to_string(), context.clone()));
        Ok(())
    }
}

pub struct RecordingTokenIssuer {
    journal: Journal,
    created: Mutex<Vec<TokenRequest>>,
    sent: Mutex<Vec<(AccountId, String)>>,
}

impl RecordingTokenIssuer {
    pub fn created(&self) -> Result<Vec<TokenRequest>> {
        Ok(locked(&self.created)?.clone())
    }

    pub fn sent(&self) -> Result<Vec<(AccountId, String)>> {
        Ok(locked(&self.sent)?.clone())
    }
}

impl TokenIssuer for RecordingTokenIssuer {
    fn create(&self, request: &TokenRequest) -> Result<RecoveryToken> {
        self.journal.record("token:create")?;
        locked(&self.created)?.push(*request);
        Ok(RecoveryToken::new(
            request.creator_id,
            SecretString::from(generate_token()?),
            request.single_use,
            Duration::from_secs(DEFAULT_TOKEN_TTL_SECONDS),
        ))
    }

    fn send_email(&self, token: &RecoveryToken, address: &str) -> Result<()> {
        self.journal.record("token:send")?;
        locked(&self.sent)?.push((token.creator_id(), address.to_string()));
        Ok(())
    }
}

pub struct RecordingListener {
    journal: Journal,
}

impl RegistrationListener for RecordingListener {
    fn before_register(&self, _event: &mut BeforeRegister<'_>) -> Result<()> {
        self.journal.record("event:beforeRegister")
    }

    fn register_complete(&self, _event: &RegisterComplete<'_>) -> Result<()> {
        self.journal.record("event:registerComplete")
    }

    fn recovery_requested(&self, _event: &RecoveryRequested<'_>) -> Result<()> {
        self.journal.record("event:recoverPasswordComplete")
    }
}

/// One anonymous session plus a recording fake for every collaborator.
pub struct Fixture {
    pub journal: Journal,
    pub session: SessionId,
    pub users: Arc<RecordingUserStore>,
    pub sessions: Arc<RecordingSessionStore>,
    pub notifier: Arc<RecordingNotifier>,
    pub tokens: Arc<RecordingTokenIssuer>,
}

impl Fixture {
    pub fn new() -> Self {
        let journal = Journal::default();
        Self {
            session: SessionId::new("test-session"),
            users: Arc::new(RecordingUserStore::new(journal.clone())),
            sessions: Arc::new(RecordingSessionStore::new(journal.clone())),
            notifier: Arc::new(RecordingNotifier {
                journal: journal.clone(),
                sent: Mutex::new(Vec::new()),
            }),
            tokens: Arc::new(RecordingTokenIssuer {
                journal: journal.clone(),
                created: Mutex::new(Vec::new()),
                sent: Mutex::new(Vec::new()),
            }),
            journal,
        }
    }

    pub fn listener(&self) -> Arc<dyn RegistrationListener> {
        Arc::new(RecordingListener {
            journal: self.journal.clone(),
        })
    }

    pub fn workflow(&self, config: RegistrationConfig) -> RegistrationWorkflow {
        RegistrationWorkflow::new(
            config,
            self.users.clone(),
            self.sessions.clone(),
            self.notifier.clone(),
        )
    }

    pub fn recovery(&self) -> RecoveryWorkflow {
        RecoveryWorkflow::new(self.users.clone(), self.tokens.clone())
    }
}
