//! Collaborators the workflows depend on.
//!
//! Workflows hold these as `Arc<dyn Trait>`; the `memory` module provides
//! reference implementations.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::{
    account::{fields, Account, AccountId, DEFAULT_ACCOUNT_CLASS},
    submission::FieldMap,
    token::RecoveryToken,
};

/// Opaque handle to a browser session.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A unique field was claimed by another account after validation passed.
///
/// `UserStore::save` returns this (inside `anyhow::Error`) so the workflow
/// can report it as a field error instead of a fault.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("{field} is already registered.")]
pub struct DuplicateField {
    pub field: String,
}

impl DuplicateField {
    #[must_use]
    pub fn new(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
        }
    }
}

/// Persistence and validation of user records.
pub trait UserStore: Send + Sync {
    /// Class of accounts created when no factory hook is configured.
    fn default_class(&self) -> &str {
        DEFAULT_ACCOUNT_CLASS
    }

    fn new_account(&self) -> Account {
        Account::new(self.default_class())
    }

    /// Minimum password length for the account's class.
    fn min_password_length(&self, account: &Account) -> usize;

    /// Copy request fields onto the account. The clear-text password is set
    /// separately and never lands in the field map.
    fn assign_fields(&self, account: &mut Account, values: &FieldMap) {
        for (name, value) in values {
            if name != fields::PASSWORD {
                account.set_field(name.clone(), value.clone());
            }
        }
    }

    /// Run the store's own validation, recording problems on the account.
    /// Returns whether the account is valid.
    fn validate(&self, account: &mut Account) -> Result<bool>;

    /// Persist the account, assigning and returning its identity.
    ///
    /// # Errors
    /// [`DuplicateField`] when a unique field lost a race with another save;
    /// anything else is a fault.
    fn save(&self, account: &mut Account) -> Result<AccountId>;

    fn find_by_username(&self, username: &str) -> Result<Option<Account>>;

    fn find_by_email(&self, email: &str) -> Result<Option<Account>>;
}

/// Session lookup and elevation.
pub trait SessionStore: Send + Sync {
    /// Start a new anonymous session.
    fn open(&self) -> Result<SessionId>;

    /// Resolve a client-supplied token to a live session.
    fn find(&self, token: &str) -> Result<Option<SessionId>>;

    /// Account bound to the session, if a user is logged in.
    fn current_account(&self, session: &SessionId) -> Result<Option<AccountId>>;

    /// Bind the session to `account`, switching it to the user class.
    fn elevate(&self, session: &SessionId, account: AccountId) -> Result<()>;
}

/// Template based email dispatch.
pub trait Notifier: Send + Sync {
    fn send_template(
        &self,
        recipient: &str,
        template: &str,
        context: &serde_json::Value,
    ) -> Result<()>;
}

/// Parameters for issuing a recovery token.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TokenRequest {
    pub creator_id: AccountId,
    pub single_use: bool,
}

/// Creation and delivery of recovery tokens.
pub trait TokenIssuer: Send + Sync {
    fn create(&self, request: &TokenRequest) -> Result<RecoveryToken>;

    fn send_email(&self, token: &RecoveryToken, address: &str) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedStore;

    impl UserStore for FixedStore {
        fn min_password_length(&self, _account: &Account) -> usize {
            8
        }

        fn validate(&self, _account: &mut Account) -> Result<bool> {
            Ok(true)
        }

        fn save(&self, account: &mut Account) -> Result<AccountId> {
            let id = AccountId::new();
            account.assign_id(id);
            Ok(id)
        }

        fn find_by_username(&self, _username: &str) -> Result<Option<Account>> {
            Ok(None)
        }

        fn find_by_email(&self, _email: &str) -> Result<Option<Account>> {
            Ok(None)
        }
    }

    #[test]
    fn default_assign_fields_skips_password() {
        let store = FixedStore;
        let mut account = store.new_account();
        let values: FieldMap = [("Username", "jdoe"), ("Password", "secret123")]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();

        store.assign_fields(&mut account, &values);

        assert_eq!(account.class(), "User");
        assert_eq!(account.username(), Some("jdoe"));
        assert_eq!(account.field("Password"), None);
    }

    #[test]
    fn session_id_displays_token() {
        let session = SessionId::new("abc");
        assert_eq!(session.to_string(), "abc");
        assert_eq!(session.as_str(), "abc");
    }
}
