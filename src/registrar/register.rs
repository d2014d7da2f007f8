//! Self-service registration.

use anyhow::{Context, Result};
use secrecy::SecretString;
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, info, instrument};

use super::{
    account::{fields, Account},
    config::RegistrationConfig,
    errors::ErrorSet,
    events::{BeforeRegister, EventBus, RegisterComplete},
    hooks::RegistrationHooks,
    policy::check_password,
    ports::{DuplicateField, Notifier, SessionId, SessionStore, UserStore},
    submission::{FieldMap, RegistrationSubmission, RequestKind},
};

/// Template used for the welcome email.
pub const REGISTER_COMPLETE_TEMPLATE: &str = "registerComplete";

/// Reasons a registration request is refused before any work is done.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistrationDenial {
    #[error("You are already logged in. Please log out if you need to register a new account.")]
    AlreadyAuthenticated,
    #[error("Sorry, self-registration is not currently available. Please contact an administrator.")]
    RegistrationDisabled,
}

#[derive(Debug)]
pub enum RegistrationOutcome {
    /// Refused by a guard.
    Denied(RegistrationDenial),
    /// Form to (re)display with the unpersisted account and any errors.
    Form { account: Account },
    /// Account persisted and session elevated.
    Complete { account: Account },
}

impl RegistrationOutcome {
    #[must_use]
    pub fn success(&self) -> bool {
        matches!(self, Self::Complete { .. })
    }

    #[must_use]
    pub fn account(&self) -> Option<&Account> {
        match self {
            Self::Denied(_) => None,
            Self::Form { account } | Self::Complete { account } => Some(account),
        }
    }

    /// Validation errors attached to the account, if there are any.
    #[must_use]
    pub fn errors(&self) -> Option<&ErrorSet> {
        self.account()
            .map(Account::validation_errors)
            .filter(|errors| !errors.is_empty())
    }
}

pub struct RegistrationWorkflow {
    config: RegistrationConfig,
    hooks: RegistrationHooks,
    events: EventBus,
    users: Arc<dyn UserStore>,
    sessions: Arc<dyn SessionStore>,
    notifier: Arc<dyn Notifier>,
}

impl RegistrationWorkflow {
    #[must_use]
    pub fn new(
        config: RegistrationConfig,
        users: Arc<dyn UserStore>,
        sessions: Arc<dyn SessionStore>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            config,
            hooks: RegistrationHooks::default(),
            events: EventBus::default(),
            users,
            sessions,
            notifier,
        }
    }

    #[must_use]
    pub fn with_hooks(mut self, hooks: RegistrationHooks) -> Self {
        self.hooks = hooks;
        self
    }

    #[must_use]
    pub fn with_events(mut self, events: EventBus) -> Self {
        self.events = events;
        self
    }

    #[must_use]
    pub fn config(&self) -> &RegistrationConfig {
        &self.config
    }

    /// Handle one registration request.
    ///
    /// `raw` is the full request data; only allow-listed fields reach the
    /// account, while `PasswordConfirm` and the `beforeRegister` payload read
    /// from it directly. `overrides` are laid on top of the submitted fields.
    ///
    /// # Errors
    /// Collaborator, hook and listener failures propagate unchanged with the
    /// failing step attached as context.
    #[instrument(skip_all, fields(kind = ?kind))]
    pub fn register(
        &self,
        kind: RequestKind,
        raw: &FieldMap,
        session: &SessionId,
        overrides: &FieldMap,
    ) -> Result<RegistrationOutcome> {
        if self
            .sessions
            .current_account(session)
            .context("Failed to inspect session")?
            .is_some()
        {
            debug!("Session already authenticated");
            return Ok(RegistrationOutcome::Denied(
                RegistrationDenial::AlreadyAuthenticated,
            ));
        }

        if !self.config.enabled() {
            debug!("Registration disabled");
            return Ok(RegistrationOutcome::Denied(
                RegistrationDenial::RegistrationDisabled,
            ));
        }

        let mut submission = RegistrationSubmission::from_request(raw, self.config.fields());
        let mut errors = ErrorSet::new();

        let mut account = match self.hooks.account_factory() {
            Some(factory) => factory
                .create_account(&mut submission, &mut errors)
                .context("Account factory hook failed")?,
            None => self.users.new_account(),
        };

        if !kind.is_submit() {
            self.users.assign_fields(&mut account, overrides);
            return Ok(RegistrationOutcome::Form { account });
        }

        self.users
            .assign_fields(&mut account, &submission.merged_with(overrides));

        if let Some(password) = submission.password() {
            account.set_clear_password(SecretString::from(password.to_string()));
        }

        check_password(
            submission.password(),
            raw.get(fields::PASSWORD_CONFIRM).map(String::as_str),
            self.users.min_password_length(&account),
            &mut errors,
        );

        if let Some(hook) = self.hooks.registration_data() {
            hook.apply_registration_data(&mut account, &submission, &mut errors)
                .context("Registration data hook failed")?;
        }

        self.events
            .before_register(&mut BeforeRegister {
                account: &mut account,
                request_data: raw,
                errors: &mut errors,
            })
            .context("beforeRegister listener failed")?;

        let valid = self
            .users
            .validate(&mut account)
            .context("Failed to validate account")?;

        if !valid || !errors.is_empty() {
            if !errors.is_empty() {
                account.add_validation_errors(&errors);
            }
            debug!(
                errors = account.validation_errors().len(),
                "Registration rejected"
            );
            return Ok(RegistrationOutcome::Form { account });
        }

        let id = match self.users.save(&mut account) {
            Ok(id) => id,
            Err(err) => {
                let Some(duplicate) = err.downcast_ref::<DuplicateField>() else {
                    return Err(err.context("Failed to save account"));
                };
                debug!(field = %duplicate.field, "Lost a race for a unique field");
                account
                    .validation_errors_mut()
                    .insert(duplicate.field.clone(), duplicate.to_string());
                return Ok(RegistrationOutcome::Form { account });
            }
        };

        self.sessions
            .elevate(session, id)
            .context("Failed to elevate session")?;

        match account.email_recipient() {
            Some(recipient) => {
                let context = json!({
                    "User": &account,
                    "registrationData": submission.redacted(),
                });
                self.notifier
                    .send_template(&recipient, REGISTER_COMPLETE_TEMPLATE, &context)
                    .context("Failed to send welcome email")?;
            }
            None => debug!("No email on file, skipping welcome email"),
        }

        if let Some(hook) = self.hooks.register_complete() {
            hook.on_register_complete(&account, &submission)
                .context("Register complete hook failed")?;
        }

        self.events
            .register_complete(&RegisterComplete {
                account: &account,
                request_data: raw,
            })
            .context("registerComplete listener failed")?;

        info!(account_id = %id, "Registration complete");

        Ok(RegistrationOutcome::Complete { account })
    }
}
