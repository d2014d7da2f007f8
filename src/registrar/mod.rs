//! Registration and password recovery workflows.
//!
//! Both workflows are synchronous and talk to the outside world only through
//! the traits in [`ports`].

pub mod account;
pub mod config;
pub mod errors;
pub mod events;
pub mod hooks;
pub mod policy;
pub mod ports;
pub mod recover;
pub mod register;
pub mod submission;
pub mod token;

#[cfg(test)]
pub(crate) mod test_support;

pub use account::{Account, AccountId};
pub use config::RegistrationConfig;
pub use errors::ErrorSet;
pub use events::{EventBus, RegistrationListener};
pub use hooks::RegistrationHooks;
pub use ports::{DuplicateField, Notifier, SessionId, SessionStore, TokenIssuer, TokenRequest, UserStore};
pub use recover::{RecoveryError, RecoveryOutcome, RecoveryWorkflow};
pub use register::{RegistrationDenial, RegistrationOutcome, RegistrationWorkflow};
pub use submission::{FieldMap, RegistrationSubmission, RequestKind};
pub use token::RecoveryToken;
