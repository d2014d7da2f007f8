use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use utoipa::ToSchema;

use crate::registrar::{Account, ErrorSet, RecoveryOutcome, RegistrationOutcome};

/// Public view of an account; never carries credentials.
#[derive(ToSchema, Serialize, Debug)]
pub struct AccountView {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub class: String,
    pub fields: BTreeMap<String, String>,
}

impl From<&Account> for AccountView {
    fn from(account: &Account) -> Self {
        Self {
            id: account.id().map(|id| id.to_string()),
            class: account.class().to_string(),
            fields: account.fields().clone(),
        }
    }
}

#[derive(ToSchema, Serialize, Debug)]
pub struct RegistrationResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<AccountView>,
    /// Field name to message, in the order problems were found.
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Object>)]
    pub errors: Option<ErrorSet>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<&RegistrationOutcome> for RegistrationResponse {
    fn from(outcome: &RegistrationOutcome) -> Self {
        Self {
            success: outcome.success(),
            data: outcome.account().map(AccountView::from),
            errors: outcome.errors().cloned(),
            error: match outcome {
                RegistrationOutcome::Denied(denial) => Some(denial.to_string()),
                _ => None,
            },
        }
    }
}

#[derive(ToSchema, Serialize, Debug)]
pub struct RecoveryResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<RecoveryOutcome> for RecoveryResponse {
    fn from(outcome: RecoveryOutcome) -> Self {
        Self {
            success: outcome.success(),
            error: outcome.error().map(|error| error.to_string()),
        }
    }
}

/// Body of a recovery submission.
#[derive(ToSchema, Deserialize, Debug, Default)]
pub struct RecoveryRequest {
    /// Username or email address.
    #[serde(default)]
    pub username: String,
}

/// Registration form fields. Unknown fields are accepted and ignored unless
/// configured.
#[derive(ToSchema, Deserialize, Debug)]
#[serde(rename_all = "PascalCase")]
pub struct RegistrationForm {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub gender: Option<String>,
    pub birth_date: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub password_confirm: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub location: Option<String>,
    pub about: Option<String>,
}
