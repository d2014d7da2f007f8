//! In-memory user store with field validation and Argon2id password hashes.

use anyhow::{anyhow, Result};
use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use rand::rngs::OsRng;
use regex::Regex;
use secrecy::{ExposeSecret, SecretString};
use std::{collections::HashMap, sync::RwLock};
use tracing::{debug, instrument};

use crate::registrar::{
    account::{fields, Account, AccountId, DEFAULT_ACCOUNT_CLASS},
    ports::{DuplicateField, UserStore},
};

pub const DEFAULT_MIN_PASSWORD_LENGTH: usize = 5;

const USERNAME_MIN_LENGTH: usize = 2;
const USERNAME_MAX_LENGTH: usize = 30;

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum StoreError {
    #[error("account not found")]
    NotFound,
    #[error("failed to hash password")]
    PasswordHash,
}

struct StoredAccount {
    account: Account,
    password_hash: Option<String>,
}

pub struct MemoryUserStore {
    accounts: RwLock<HashMap<AccountId, StoredAccount>>,
    default_class: String,
    min_password_length: usize,
}

impl MemoryUserStore {
    #[must_use]
    pub fn new() -> Self {
        Self {
            accounts: RwLock::new(HashMap::new()),
            default_class: DEFAULT_ACCOUNT_CLASS.to_string(),
            min_password_length: DEFAULT_MIN_PASSWORD_LENGTH,
        }
    }

    #[must_use]
    pub fn with_default_class(mut self, class: impl Into<String>) -> Self {
        self.default_class = class.into();
        self
    }

    #[must_use]
    pub fn with_min_password_length(mut self, length: usize) -> Self {
        self.min_password_length = length;
        self
    }

    /// Number of persisted accounts.
    pub fn len(&self) -> Result<usize> {
        Ok(self.read()?.len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    pub fn get(&self, id: AccountId) -> Result<Option<Account>> {
        Ok(self.read()?.get(&id).map(|stored| stored.account.clone()))
    }

    /// Check `password` against the stored hash of account `id`.
    ///
    /// # Errors
    /// `StoreError::NotFound` if the account does not exist.
    pub fn verify_password(&self, id: AccountId, password: &str) -> Result<bool> {
        let accounts = self.read()?;
        let stored = accounts.get(&id).ok_or(StoreError::NotFound)?;
        let Some(hash) = stored.password_hash.as_deref() else {
            return Ok(false);
        };
        let parsed =
            PasswordHash::new(hash).map_err(|_| anyhow!("invalid stored password hash"))?;
        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok())
    }

    fn read(
        &self,
    ) -> Result<std::sync::RwLockReadGuard<'_, HashMap<AccountId, StoredAccount>>> {
        self.accounts.read().map_err(|_| anyhow!("Poisoned lock"))
    }

    fn find_by(&self, field: &str, value: &str) -> Result<Option<Account>> {
        Ok(self
            .read()?
            .values()
            .find(|stored| matches_ignore_case(stored.account.field(field), value))
            .map(|stored| stored.account.clone()))
    }
}

impl Default for MemoryUserStore {
    fn default() -> Self {
        Self::new()
    }
}

impl UserStore for MemoryUserStore {
    fn default_class(&self) -> &str {
        &self.default_class
    }

    fn min_password_length(&self, _account: &Account) -> usize {
        self.min_password_length
    }

    #[instrument(skip_all)]
    fn validate(&self, account: &mut Account) -> Result<bool> {
        let accounts = self.read()?;
        let taken = |field: &str, value: &str| {
            accounts.values().any(|stored| {
                stored.account.id() != account.id()
                    && matches_ignore_case(stored.account.field(field), value)
            })
        };

        let mut found = Vec::new();

        match account.username() {
            None => found.push((fields::USERNAME, "Username is required.".to_string())),
            Some(username) if !valid_username(username) => found.push((
                fields::USERNAME,
                format!(
                    "Username must be {USERNAME_MIN_LENGTH} to {USERNAME_MAX_LENGTH} characters of letters, numbers, dots, dashes or underscores."
                ),
            )),
            Some(username) if taken(fields::USERNAME, username) => found.push((
                fields::USERNAME,
                "Username is already registered.".to_string(),
            )),
            Some(_) => {}
        }

        match account.email() {
            Some(email) if !valid_email(email) => {
                found.push((fields::EMAIL, "Email does not appear to be valid.".to_string()));
            }
            Some(email) if taken(fields::EMAIL, email) => {
                found.push((fields::EMAIL, "Email is already registered.".to_string()));
            }
            _ => {}
        }

        if let Some(gender) = account.field(fields::GENDER).filter(|v| !v.is_empty()) {
            if gender != "Male" && gender != "Female" {
                found.push((fields::GENDER, "Gender must be Male or Female.".to_string()));
            }
        }

        if let Some(date) = account.field(fields::BIRTH_DATE).filter(|v| !v.is_empty()) {
            if !valid_birth_date(date) {
                found.push((
                    fields::BIRTH_DATE,
                    "Birth date must be formatted as YYYY-MM-DD.".to_string(),
                ));
            }
        }

        drop(accounts);

        let errors = account.validation_errors_mut();
        errors.clear();
        errors.extend(found);

        debug!(errors = errors.len(), "Account validated");

        Ok(errors.is_empty())
    }

    #[instrument(skip_all)]
    fn save(&self, account: &mut Account) -> Result<AccountId> {
        let password_hash = account
            .take_clear_password()
            .map(|password| hash_password(&password))
            .transpose()?;

        let mut accounts = self.accounts.write().map_err(|_| anyhow!("Poisoned lock"))?;

        // Another request may have claimed the username or email since validation.
        for (field, value) in [
            (fields::USERNAME, account.username()),
            (fields::EMAIL, account.email()),
        ] {
            let Some(value) = value else { continue };
            if accounts.values().any(|stored| {
                stored.account.id() != account.id()
                    && matches_ignore_case(stored.account.field(field), value)
            }) {
                return Err(DuplicateField::new(field).into());
            }
        }

        let id = account.id().unwrap_or_default();
        account.assign_id(id);
        accounts.insert(
            id,
            StoredAccount {
                account: account.clone(),
                password_hash,
            },
        );

        debug!(account_id = %id, "Account saved");

        Ok(id)
    }

    fn find_by_username(&self, username: &str) -> Result<Option<Account>> {
        self.find_by(fields::USERNAME, username)
    }

    fn find_by_email(&self, email: &str) -> Result<Option<Account>> {
        self.find_by(fields::EMAIL, email)
    }
}

fn matches_ignore_case(stored: Option<&str>, value: &str) -> bool {
    stored.is_some_and(|stored| !stored.is_empty() && stored.eq_ignore_ascii_case(value))
}

fn valid_username(username: &str) -> bool {
    let length = username.chars().count();
    if !(USERNAME_MIN_LENGTH..=USERNAME_MAX_LENGTH).contains(&length) {
        return false;
    }
    Regex::new(r"^[A-Za-z0-9_.\-]+$").is_ok_and(|regex| regex.is_match(username))
}

fn valid_email(email: &str) -> bool {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").is_ok_and(|regex| regex.is_match(email))
}

fn valid_birth_date(date: &str) -> bool {
    let Some(captures) = Regex::new(r"^(\d{4})-(\d{2})-(\d{2})$")
        .ok()
        .and_then(|regex| regex.captures(date))
    else {
        return false;
    };
    let part = |index: usize| {
        captures
            .get(index)
            .and_then(|m| m.as_str().parse::<u32>().ok())
            .unwrap_or(0)
    };
    (1..=12).contains(&part(2)) && (1..=31).contains(&part(3))
}

fn hash_password(password: &SecretString) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.expose_secret().as_bytes(), &salt)
        .map_err(|_| StoreError::PasswordHash)?
        .to_string();
    Ok(hash)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registrar::ErrorSet;

    fn account(pairs: &[(&str, &str)]) -> Account {
        let mut account = Account::new(DEFAULT_ACCOUNT_CLASS);
        for (name, value) in pairs {
            account.set_field(*name, *value);
        }
        account
    }

    fn errors_of(store: &MemoryUserStore, mut account: Account) -> Result<ErrorSet> {
        store.validate(&mut account)?;
        Ok(account.validation_errors().clone())
    }

    #[test]
    fn username_is_required_and_checked() -> Result<()> {
        let store = MemoryUserStore::new();
        assert_eq!(
            errors_of(&store, account(&[]))?.get("Username"),
            Some("Username is required.")
        );
        assert!(errors_of(&store, account(&[("Username", "a")]))?.contains("Username"));
        assert!(errors_of(&store, account(&[("Username", "bad name")]))?.contains("Username"));
        assert!(errors_of(&store, account(&[("Username", "jane.doe-1_x")]))?.is_empty());
        Ok(())
    }

    #[test]
    fn optional_fields_are_checked_when_present() -> Result<()> {
        let store = MemoryUserStore::new();
        let errors = errors_of(
            &store,
            account(&[
                ("Username", "jdoe"),
                ("Email", "not-an-email"),
                ("Gender", "Other"),
                ("BirthDate", "1990-13-01"),
            ]),
        )?;
        assert_eq!(
            errors.fields().collect::<Vec<_>>(),
            vec!["Email", "Gender", "BirthDate"]
        );

        let errors = errors_of(
            &store,
            account(&[
                ("Username", "jdoe"),
                ("Email", "jdoe@example.com"),
                ("Gender", "Female"),
                ("BirthDate", "1990-02-14"),
                ("Phone", ""),
            ]),
        )?;
        assert!(errors.is_empty());
        Ok(())
    }

    #[test]
    fn validation_replaces_previous_errors() -> Result<()> {
        let store = MemoryUserStore::new();
        let mut candidate = account(&[]);
        assert!(!store.validate(&mut candidate)?);
        candidate.set_field("Username", "jdoe");
        assert!(store.validate(&mut candidate)?);
        assert!(candidate.validation_errors().is_empty());
        Ok(())
    }

    #[test]
    fn save_hashes_password_and_assigns_id() -> Result<()> {
        let store = MemoryUserStore::new();
        let mut candidate = account(&[("Username", "jdoe"), ("Email", "jdoe@example.com")]);
        candidate.set_clear_password(SecretString::from("hunter22".to_string()));

        let id = store.save(&mut candidate)?;

        assert_eq!(candidate.id(), Some(id));
        assert!(candidate.clear_password().is_none());
        assert!(store.verify_password(id, "hunter22")?);
        assert!(!store.verify_password(id, "hunter23")?);
        assert_eq!(store.len()?, 1);
        Ok(())
    }

    #[test]
    fn lookups_ignore_case() -> Result<()> {
        let store = MemoryUserStore::new();
        let mut candidate = account(&[("Username", "JDoe"), ("Email", "JDoe@Example.com")]);
        let id = store.save(&mut candidate)?;

        let by_username = store.find_by_username("jdoe")?;
        let by_email = store.find_by_email("jdoe@example.com")?;
        assert_eq!(by_username.and_then(|found| found.id()), Some(id));
        assert_eq!(by_email.and_then(|found| found.id()), Some(id));
        assert!(store.find_by_username("jdoe@example.com")?.is_none());
        Ok(())
    }

    #[test]
    fn duplicates_fail_validation() -> Result<()> {
        let store = MemoryUserStore::new();
        store.save(&mut account(&[("Username", "jdoe"), ("Email", "jdoe@example.com")]))?;

        let errors = errors_of(
            &store,
            account(&[("Username", "JDOE"), ("Email", "JDOE@example.com")]),
        )?;
        assert_eq!(errors.get("Username"), Some("Username is already registered."));
        assert_eq!(errors.get("Email"), Some("Email is already registered."));
        Ok(())
    }

    #[test]
    fn racing_save_conflicts() -> Result<()> {
        let store = MemoryUserStore::new();
        let mut first = account(&[("Username", "jdoe")]);
        let mut second = account(&[("Username", "jdoe")]);
        assert!(store.validate(&mut first)?);
        assert!(store.validate(&mut second)?);

        store.save(&mut first)?;
        let err = store
            .save(&mut second)
            .err()
            .ok_or_else(|| anyhow!("second save should conflict"))?;

        assert_eq!(
            err.downcast_ref::<DuplicateField>(),
            Some(&DuplicateField::new("Username"))
        );
        assert_eq!(err.to_string(), "Username is already registered.");
        assert!(second.is_phantom());
        assert_eq!(store.len()?, 1);
        Ok(())
    }

    #[test]
    fn default_class_and_min_length_are_configurable() {
        let store = MemoryUserStore::new()
            .with_default_class("Student")
            .with_min_password_length(12);
        let account = store.new_account();
        assert_eq!(account.class(), "Student");
        assert_eq!(store.min_password_length(&account), 12);
    }

    #[test]
    fn birth_date_format() {
        assert!(valid_birth_date("2000-01-31"));
        assert!(!valid_birth_date("2000-1-31"));
        assert!(!valid_birth_date("2000-00-10"));
        assert!(!valid_birth_date("31/01/2000"));
    }
}
