//! Request intake: request kind and allow-list filtering.

use serde::Serialize;
use std::collections::BTreeMap;

use super::account::fields;

/// Raw string fields as received from a request.
pub type FieldMap = BTreeMap<String, String>;

/// Whether a request only displays a form or submits it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RequestKind {
    Display,
    Submit,
}

impl RequestKind {
    #[must_use]
    pub fn is_submit(self) -> bool {
        self == Self::Submit
    }
}

/// Registration fields that survived the allow-list.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct RegistrationSubmission {
    fields: FieldMap,
}

impl RegistrationSubmission {
    /// Keep only the keys of `raw` that appear in `allowed`; values are untouched.
    #[must_use]
    pub fn from_request<S: AsRef<str>>(raw: &FieldMap, allowed: &[S]) -> Self {
        let fields = raw
            .iter()
            .filter(|(key, _)| allowed.iter().any(|name| name.as_ref() == key.as_str()))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();
        Self { fields }
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.fields.insert(name.into(), value.into());
    }

    pub fn remove(&mut self, name: &str) -> Option<String> {
        self.fields.remove(name)
    }

    #[must_use]
    pub fn fields(&self) -> &FieldMap {
        &self.fields
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// The submitted password, treating an empty value as absent.
    #[must_use]
    pub fn password(&self) -> Option<&str> {
        self.get(fields::PASSWORD).filter(|value| !value.is_empty())
    }

    /// Submitted fields with `overrides` laid on top.
    #[must_use]
    pub fn merged_with(&self, overrides: &FieldMap) -> FieldMap {
        let mut merged = self.fields.clone();
        merged.extend(overrides.iter().map(|(k, v)| (k.clone(), v.clone())));
        merged
    }

    /// Copy of the submission without the clear-text password.
    #[must_use]
    pub fn redacted(&self) -> Self {
        let mut fields = self.fields.clone();
        fields.remove(fields::PASSWORD);
        Self { fields }
    }
}
