//! Password recovery tokens.

use anyhow::{Context, Result};
use base64::Engine;
use rand::{rngs::OsRng, RngCore};
use secrecy::SecretString;
use sha2::{Digest, Sha256};
use std::time::{Duration, Instant};
use ulid::Ulid;

use super::account::AccountId;

/// Default lifetime of a recovery token.
pub const DEFAULT_TOKEN_TTL_SECONDS: u64 = 30 * 60;

/// A single-use, expiring credential-reset token bound to one account.
///
/// The raw secret only lives here long enough to be delivered; issuers keep
/// a hash of it.
#[derive(Clone, Debug)]
pub struct RecoveryToken {
    id: Ulid,
    creator_id: AccountId,
    secret: SecretString,
    single_use: bool,
    issued_at: Instant,
    ttl: Duration,
}

impl RecoveryToken {
    #[must_use]
    pub fn new(creator_id: AccountId, secret: SecretString, single_use: bool, ttl: Duration) -> Self {
        Self {
            id: Ulid::new(),
            creator_id,
            secret,
            single_use,
            issued_at: Instant::now(),
            ttl,
        }
    }

    #[must_use]
    pub fn id(&self) -> Ulid {
        self.id
    }

    #[must_use]
    pub fn creator_id(&self) -> AccountId {
        self.creator_id
    }

    #[must_use]
    pub fn secret(&self) -> &SecretString {
        &self.secret
    }

    #[must_use]
    pub fn single_use(&self) -> bool {
        self.single_use
    }

    #[must_use]
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.issued_at.elapsed() >= self.ttl
    }
}

/// Create a new URL-safe token secret from 32 random bytes.
pub fn generate_token() -> Result<String> {
    let mut bytes = [0u8; 32];
    OsRng
        .try_fill_bytes(&mut bytes)
        .context("failed to generate token")?;
    Ok(base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes))
}

/// Hash a token so raw values are never kept at rest.
#[must_use]
pub fn hash_token(token: &str) -> Vec<u8> {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hasher.finalize().to_vec()
}

/// Build the frontend link included in recovery emails.
#[must_use]
pub fn build_reset_url(frontend_base_url: &str, token: &str) -> String {
    let base = frontend_base_url.trim_end_matches('/');
    format!("{base}/reset-password#token={token}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;
    use secrecy::ExposeSecret;

    #[test]
    fn generate_token_has_32_bytes_of_entropy() {
        let decoded_len = generate_token()
            .ok()
            .and_then(|token| URL_SAFE_NO_PAD.decode(token.as_bytes()).ok())
            .map(|bytes| bytes.len());
        assert_eq!(decoded_len, Some(32));
    }

    #[test]
    fn generated_tokens_differ() -> Result<()> {
        assert_ne!(generate_token()?, generate_token()?);
        Ok(())
    }

    #[test]
    fn hash_token_stable() {
        assert_eq!(hash_token("token"), hash_token("token"));
        assert_ne!(hash_token("token"), hash_token("other"));
        assert_eq!(hash_token("token").len(), 32);
    }

    #[test]
    fn build_reset_url_trims_trailing_slash() {
        let url = build_reset_url("https://accounts.example.org/", "abc");
        assert_eq!(url, "https://accounts.example.org/reset-password#token=abc");
    }

    #[test]
    fn token_expires_after_ttl() {
        let creator = AccountId::new();
        let live = RecoveryToken::new(
            creator,
            SecretString::from("s".to_string()),
            true,
            Duration::from_secs(60),
        );
        assert!(!live.is_expired());
        assert!(live.single_use());
        assert_eq!(live.creator_id(), creator);
        assert_eq!(live.secret().expose_secret(), "s");

        let stale = RecoveryToken::new(
            creator,
            SecretString::from("s".to_string()),
            true,
            Duration::ZERO,
        );
        assert!(stale.is_expired());
    }
}
