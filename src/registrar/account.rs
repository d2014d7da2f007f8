//! Candidate accounts and their identifiers.

use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, fmt};
use uuid::Uuid;

use super::errors::ErrorSet;

/// Well-known field names.
pub mod fields {
    pub const FIRST_NAME: &str = "FirstName";
    pub const LAST_NAME: &str = "LastName";
    pub const GENDER: &str = "Gender";
    pub const BIRTH_DATE: &str = "BirthDate";
    pub const USERNAME: &str = "Username";
    pub const PASSWORD: &str = "Password";
    pub const EMAIL: &str = "Email";
    pub const PHONE: &str = "Phone";
    pub const LOCATION: &str = "Location";
    pub const ABOUT: &str = "About";

    /// Not part of the allow-list; read straight from the raw request.
    pub const PASSWORD_CONFIRM: &str = "PasswordConfirm";

    /// Fields accepted from a registration form unless configured otherwise.
    pub const DEFAULT_REGISTRATION_FIELDS: [&str; 10] = [
        FIRST_NAME, LAST_NAME, GENDER, BIRTH_DATE, USERNAME, PASSWORD, EMAIL, PHONE, LOCATION,
        ABOUT,
    ];
}

/// Class name used when a store does not override it.
pub const DEFAULT_ACCOUNT_CLASS: &str = "User";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountId(Uuid);

impl AccountId {
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    #[must_use]
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for AccountId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Uuid> for AccountId {
    fn from(value: Uuid) -> Self {
        Self(value)
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// An account record owned by a workflow for the length of one request.
///
/// An account without an id is a phantom: built and populated but never
/// persisted. Stores assign the id when they save it.
#[derive(Clone, Debug, Serialize)]
pub struct Account {
    id: Option<AccountId>,
    class: String,
    fields: BTreeMap<String, String>,
    #[serde(skip)]
    clear_password: Option<SecretString>,
    #[serde(skip_serializing_if = "ErrorSet::is_empty")]
    validation_errors: ErrorSet,
}

impl Account {
    /// Build a phantom account of the given class.
    #[must_use]
    pub fn new(class: impl Into<String>) -> Self {
        Self {
            id: None,
            class: class.into(),
            fields: BTreeMap::new(),
            clear_password: None,
            validation_errors: ErrorSet::new(),
        }
    }

    #[must_use]
    pub fn id(&self) -> Option<AccountId> {
        self.id
    }

    #[must_use]
    pub fn is_phantom(&self) -> bool {
        self.id.is_none()
    }

    /// Record the identity a store assigned on save.
    pub fn assign_id(&mut self, id: AccountId) {
        self.id = Some(id);
    }

    #[must_use]
    pub fn class(&self) -> &str {
        &self.class
    }

    #[must_use]
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    #[must_use]
    pub fn fields(&self) -> &BTreeMap<String, String> {
        &self.fields
    }

    pub fn set_field(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.fields.insert(name.into(), value.into());
    }

    pub fn remove_field(&mut self, name: &str) -> Option<String> {
        self.fields.remove(name)
    }

    #[must_use]
    pub fn username(&self) -> Option<&str> {
        self.non_empty(fields::USERNAME)
    }

    #[must_use]
    pub fn email(&self) -> Option<&str> {
        self.non_empty(fields::EMAIL)
    }

    /// Full name built from first and last name, if either is set.
    #[must_use]
    pub fn full_name(&self) -> Option<String> {
        let name = [
            self.non_empty(fields::FIRST_NAME),
            self.non_empty(fields::LAST_NAME),
        ]
        .into_iter()
        .flatten()
        .collect::<Vec<_>>()
        .join(" ");
        if name.is_empty() { None } else { Some(name) }
    }

    /// Mail recipient in `"Full Name" <email>` form, or the bare address.
    #[must_use]
    pub fn email_recipient(&self) -> Option<String> {
        let email = self.email()?;
        Some(match self.full_name() {
            Some(name) => format!("\"{name}\" <{email}>"),
            None => email.to_string(),
        })
    }

    pub fn set_clear_password(&mut self, password: SecretString) {
        self.clear_password = Some(password);
    }

    #[must_use]
    pub fn clear_password(&self) -> Option<&SecretString> {
        self.clear_password.as_ref()
    }

    pub fn take_clear_password(&mut self) -> Option<SecretString> {
        self.clear_password.take()
    }

    #[must_use]
    pub fn validation_errors(&self) -> &ErrorSet {
        &self.validation_errors
    }

    pub fn validation_errors_mut(&mut self) -> &mut ErrorSet {
        &mut self.validation_errors
    }

    /// Attach externally gathered errors; they win over the account's own.
    pub fn add_validation_errors(&mut self, errors: &ErrorSet) {
        self.validation_errors.merge(errors);
    }

    fn non_empty(&self, name: &str) -> Option<&str> {
        self.field(name).filter(|value| !value.is_empty())
    }
}
