//! Optional extension points of the registration workflow.
//!
//! Each hook is a trait object held in [`RegistrationHooks`]; an absent hook
//! means the workflow's built-in behaviour applies. Closures with matching
//! signatures implement the traits directly.

use anyhow::Result;
use std::{fmt, sync::Arc};

use super::{account::Account, errors::ErrorSet, submission::RegistrationSubmission};

/// Builds the candidate account in place of the store's default class.
///
/// Runs before any field assignment, on every request kind, and may adjust
/// the submission or report errors.
pub trait AccountFactory: Send + Sync {
    fn create_account(
        &self,
        submission: &mut RegistrationSubmission,
        errors: &mut ErrorSet,
    ) -> Result<Account>;
}

impl<F> AccountFactory for F
where
    F: Fn(&mut RegistrationSubmission, &mut ErrorSet) -> Result<Account> + Send + Sync,
{
    fn create_account(
        &self,
        submission: &mut RegistrationSubmission,
        errors: &mut ErrorSet,
    ) -> Result<Account> {
        self(submission, errors)
    }
}

/// Applies extra submission data after the password check, before validation.
pub trait RegistrationDataHook: Send + Sync {
    fn apply_registration_data(
        &self,
        account: &mut Account,
        submission: &RegistrationSubmission,
        errors: &mut ErrorSet,
    ) -> Result<()>;
}

impl<F> RegistrationDataHook for F
where
    F: Fn(&mut Account, &RegistrationSubmission, &mut ErrorSet) -> Result<()> + Send + Sync,
{
    fn apply_registration_data(
        &self,
        account: &mut Account,
        submission: &RegistrationSubmission,
        errors: &mut ErrorSet,
    ) -> Result<()> {
        self(account, submission, errors)
    }
}

/// Runs once a registration has been persisted and announced.
pub trait RegisterCompleteHook: Send + Sync {
    fn on_register_complete(
        &self,
        account: &Account,
        submission: &RegistrationSubmission,
    ) -> Result<()>;
}

impl<F> RegisterCompleteHook for F
where
    F: Fn(&Account, &RegistrationSubmission) -> Result<()> + Send + Sync,
{
    fn on_register_complete(
        &self,
        account: &Account,
        submission: &RegistrationSubmission,
    ) -> Result<()> {
        self(account, submission)
    }
}

#[derive(Clone, Default)]
pub struct RegistrationHooks {
    create_account: Option<Arc<dyn AccountFactory>>,
    apply_registration_data: Option<Arc<dyn RegistrationDataHook>>,
    on_register_complete: Option<Arc<dyn RegisterCompleteHook>>,
}

impl RegistrationHooks {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_account_factory(mut self, hook: Arc<dyn AccountFactory>) -> Self {
        self.create_account = Some(hook);
        self
    }

    #[must_use]
    pub fn with_registration_data(mut self, hook: Arc<dyn RegistrationDataHook>) -> Self {
        self.apply_registration_data = Some(hook);
        self
    }

    #[must_use]
    pub fn with_register_complete(mut self, hook: Arc<dyn RegisterCompleteHook>) -> Self {
        self.on_register_complete = Some(hook);
        self
    }

    #[must_use]
    pub fn account_factory(&self) -> Option<&dyn AccountFactory> {
        self.create_account.as_deref()
    }

    #[must_use]
    pub fn registration_data(&self) -> Option<&dyn RegistrationDataHook> {
        self.apply_registration_data.as_deref()
    }

    #[must_use]
    pub fn register_complete(&self) -> Option<&dyn RegisterCompleteHook> {
        self.on_register_complete.as_deref()
    }
}

impl fmt::Debug for RegistrationHooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegistrationHooks")
            .field("create_account", &self.create_account.is_some())
            .field("apply_registration_data", &self.apply_registration_data.is_some())
            .field("on_register_complete", &self.on_register_complete.is_some())
            .finish()
    }
}
