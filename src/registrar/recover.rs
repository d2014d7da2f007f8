//! Password recovery token issuance.

use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::{debug, info, instrument};

use super::{
    events::{EventBus, RecoveryRequested},
    ports::{TokenIssuer, TokenRequest, UserStore},
    submission::RequestKind,
};

/// Why a recovery request could not be honoured.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryError {
    #[error("Please provide either your username or email address to reset your password.")]
    MissingIdentifier,
    #[error("No account is currently registered for that username or email address.")]
    AccountNotFound,
    #[error(
        "Unfortunately, there is no email address on file for this account. Please contact an administrator."
    )]
    NoEmailOnFile,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryOutcome {
    /// Nothing submitted yet.
    Form,
    /// A token was issued and sent.
    Sent,
    Failed(RecoveryError),
}

impl RecoveryOutcome {
    #[must_use]
    pub fn success(&self) -> bool {
        matches!(self, Self::Sent)
    }

    #[must_use]
    pub fn error(&self) -> Option<RecoveryError> {
        match self {
            Self::Failed(error) => Some(*error),
            Self::Form | Self::Sent => None,
        }
    }
}

pub struct RecoveryWorkflow {
    users: Arc<dyn UserStore>,
    tokens: Arc<dyn TokenIssuer>,
    events: EventBus,
}

impl RecoveryWorkflow {
    #[must_use]
    pub fn new(users: Arc<dyn UserStore>, tokens: Arc<dyn TokenIssuer>) -> Self {
        Self {
            users,
            tokens,
            events: EventBus::default(),
        }
    }

    #[must_use]
    pub fn with_events(mut self, events: EventBus) -> Self {
        self.events = events;
        self
    }

    /// Issue a single-use recovery token for the account matching
    /// `identifier`, tried first as a username and then as an email.
    ///
    /// # Errors
    /// Store, token issuer and listener failures.
    #[instrument(skip_all, fields(kind = ?kind))]
    pub fn request_recovery(&self, kind: RequestKind, identifier: &str) -> Result<RecoveryOutcome> {
        if !kind.is_submit() {
            return Ok(RecoveryOutcome::Form);
        }

        if identifier.is_empty() {
            return Ok(RecoveryOutcome::Failed(RecoveryError::MissingIdentifier));
        }

        let account = match self
            .users
            .find_by_username(identifier)
            .context("Failed to look up account by username")?
        {
            Some(account) => Some(account),
            None => self
                .users
                .find_by_email(identifier)
                .context("Failed to look up account by email")?,
        };

        let Some(account) = account else {
            debug!("No account for recovery identifier");
            return Ok(RecoveryOutcome::Failed(RecoveryError::AccountNotFound));
        };

        let (Some(id), Some(email)) = (account.id(), account.email()) else {
            debug!("Account has no email on file");
            return Ok(RecoveryOutcome::Failed(RecoveryError::NoEmailOnFile));
        };

        let token = self
            .tokens
            .create(&TokenRequest {
                creator_id: id,
                single_use: true,
            })
            .context("Failed to create recovery token")?;

        self.tokens
            .send_email(&token, email)
            .context("Failed to send recovery email")?;

        self.events
            .recovery_requested(&RecoveryRequested {
                account: &account,
                token: &token,
            })
            .context("recoverPasswordComplete listener failed")?;

        info!(account_id = %id, token_id = %token.id(), "Recovery token sent");

        Ok(RecoveryOutcome::Sent)
    }
}
