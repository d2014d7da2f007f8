//! In-memory recovery token issuer.

use anyhow::{anyhow, Context, Result};
use secrecy::{ExposeSecret, SecretString};
use serde_json::json;
use std::{
    collections::HashMap,
    sync::{Arc, RwLock},
    time::Duration,
};
use tracing::{debug, instrument};

use crate::registrar::{
    account::AccountId,
    ports::{Notifier, TokenIssuer, TokenRequest},
    token::{build_reset_url, generate_token, hash_token, RecoveryToken, DEFAULT_TOKEN_TTL_SECONDS},
};

/// Template used for the reset link email.
pub const RECOVER_PASSWORD_TEMPLATE: &str = "recoverPassword";

/// Issues recovery tokens, keeping only a hash of each secret.
pub struct MemoryTokenIssuer {
    tokens: RwLock<HashMap<Vec<u8>, RecoveryToken>>,
    notifier: Arc<dyn Notifier>,
    frontend_base_url: String,
    ttl: Duration,
}

impl MemoryTokenIssuer {
    #[must_use]
    pub fn new(notifier: Arc<dyn Notifier>, frontend_base_url: impl Into<String>) -> Self {
        Self {
            tokens: RwLock::new(HashMap::new()),
            notifier,
            frontend_base_url: frontend_base_url.into(),
            ttl: Duration::from_secs(DEFAULT_TOKEN_TTL_SECONDS),
        }
    }

    #[must_use]
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Account a live token secret was issued for.
    pub fn lookup(&self, secret: &str) -> Result<Option<AccountId>> {
        let tokens = self.tokens.read().map_err(|_| anyhow!("Poisoned lock"))?;
        Ok(tokens
            .get(&hash_token(secret))
            .filter(|token| !token.is_expired())
            .map(RecoveryToken::creator_id))
    }

    /// Remove a single-use token, returning its creator if it was still live.
    pub fn redeem(&self, secret: &str) -> Result<Option<AccountId>> {
        let mut tokens = self.tokens.write().map_err(|_| anyhow!("Poisoned lock"))?;
        let key = hash_token(secret);
        let Some(token) = tokens.get(&key) else {
            return Ok(None);
        };
        let creator = (!token.is_expired()).then(|| token.creator_id());
        if token.single_use() || creator.is_none() {
            tokens.remove(&key);
        }
        Ok(creator)
    }
}

impl TokenIssuer for MemoryTokenIssuer {
    #[instrument(skip_all, fields(creator_id = %request.creator_id))]
    fn create(&self, request: &TokenRequest) -> Result<RecoveryToken> {
        let secret = generate_token()?;
        let key = hash_token(&secret);
        let token = RecoveryToken::new(
            request.creator_id,
            SecretString::from(secret),
            request.single_use,
            self.ttl,
        );

        let mut tokens = self.tokens.write().map_err(|_| anyhow!("Poisoned lock"))?;
        tokens.retain(|_, existing| !existing.is_expired());
        tokens.insert(key, token.clone());

        debug!(token_id = %token.id(), "Recovery token created");
        Ok(token)
    }

    fn send_email(&self, token: &RecoveryToken, address: &str) -> Result<()> {
        let reset_url = build_reset_url(&self.frontend_base_url, token.secret().expose_secret());
        let context = json!({
            "tokenId": token.id().to_string(),
            "resetUrl": reset_url,
            "expiresInMinutes": token.ttl().as_secs() / 60,
        });
        self.notifier
            .send_template(address, RECOVER_PASSWORD_TEMPLATE, &context)
            .context("Failed to deliver recovery token")
    }
}
