//! Password policy applied to registration submissions.

use super::{account::fields, errors::ErrorSet};

pub const PASSWORD_CONFIRM_MESSAGE: &str =
    "Please enter your password a second time for confirmation.";

#[must_use]
pub fn password_length_message(min_length: usize) -> String {
    format!("Password must be at least {min_length} characters long.")
}

/// Check the submitted password and its confirmation.
///
/// At most one error is recorded: a short or missing password masks any
/// confirmation problem. Length is measured in UTF-8 bytes.
pub fn check_password(
    password: Option<&str>,
    confirmation: Option<&str>,
    min_length: usize,
    errors: &mut ErrorSet,
) {
    let password = password.unwrap_or_default();
    if password.is_empty() || password.len() < min_length {
        errors.insert(fields::PASSWORD, password_length_message(min_length));
        return;
    }

    let confirmation = confirmation.unwrap_or_default();
    if confirmation.is_empty() || confirmation != password {
        errors.insert(fields::PASSWORD_CONFIRM, PASSWORD_CONFIRM_MESSAGE);
    }
}
