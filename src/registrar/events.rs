//! Named workflow events and their synchronous broadcast.

use anyhow::Result;
use std::{fmt, sync::Arc};
use tracing::debug;

use super::{
    account::Account, errors::ErrorSet, submission::FieldMap, token::RecoveryToken,
};

pub const BEFORE_REGISTER: &str = "beforeRegister";
pub const REGISTER_COMPLETE: &str = "registerComplete";
pub const RECOVER_PASSWORD_COMPLETE: &str = "recoverPasswordComplete";

/// Payload of `beforeRegister`. Listeners may edit the account and report
/// errors; any error blocks the registration.
pub struct BeforeRegister<'a> {
    pub account: &'a mut Account,
    pub request_data: &'a FieldMap,
    pub errors: &'a mut ErrorSet,
}

/// Payload of `registerComplete`.
pub struct RegisterComplete<'a> {
    pub account: &'a Account,
    pub request_data: &'a FieldMap,
}

/// Payload of `recoverPasswordComplete`.
pub struct RecoveryRequested<'a> {
    pub account: &'a Account,
    pub token: &'a RecoveryToken,
}

/// Receives workflow events. Every method defaults to doing nothing.
pub trait RegistrationListener: Send + Sync {
    fn before_register(&self, _event: &mut BeforeRegister<'_>) -> Result<()> {
        Ok(())
    }

    fn register_complete(&self, _event: &RegisterComplete<'_>) -> Result<()> {
        Ok(())
    }

    fn recovery_requested(&self, _event: &RecoveryRequested<'_>) -> Result<()> {
        Ok(())
    }
}

/// Ordered list of listeners, called in subscription order.
///
/// A listener returning `Err` stops the broadcast and the error propagates
/// to the workflow's caller.
#[derive(Clone, Default)]
pub struct EventBus {
    listeners: Vec<Arc<dyn RegistrationListener>>,
}

impl EventBus {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, listener: Arc<dyn RegistrationListener>) {
        self.listeners.push(listener);
    }

    #[must_use]
    pub fn with_listener(mut self, listener: Arc<dyn RegistrationListener>) -> Self {
        self.subscribe(listener);
        self
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    pub fn before_register(&self, event: &mut BeforeRegister<'_>) -> Result<()> {
        debug!(event = BEFORE_REGISTER, listeners = self.listeners.len());
        for listener in &self.listeners {
            listener.before_register(event)?;
        }
        Ok(())
    }

    pub fn register_complete(&self, event: &RegisterComplete<'_>) -> Result<()> {
        debug!(event = REGISTER_COMPLETE, listeners = self.listeners.len());
        for listener in &self.listeners {
            listener.register_complete(event)?;
        }
        Ok(())
    }

    pub fn recovery_requested(&self, event: &RecoveryRequested<'_>) -> Result<()> {
        debug!(event = RECOVER_PASSWORD_COMPLETE, listeners = self.listeners.len());
        for listener in &self.listeners {
            listener.recovery_requested(event)?;
        }
        Ok(())
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;
    use std::sync::Mutex;

    struct Tagger {
        name: &'static str,
        seen: Arc<Mutex<Vec<String>>>,
    }

    impl RegistrationListener for Tagger {
        fn before_register(&self, event: &mut BeforeRegister<'_>) -> Result<()> {
            self.seen
                .lock()
                .map_err(|_| anyhow!("Poisoned lock"))?
                .push(self.name.to_string());
            event.errors.insert("Listener", self.name);
            Ok(())
        }
    }

    struct Failing;

    impl RegistrationListener for Failing {
        fn register_complete(&self, _event: &RegisterComplete<'_>) -> Result<()> {
            Err(anyhow!("listener failed"))
        }
    }

    #[test]
    fn listeners_run_in_subscription_order() -> Result<()> {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let bus = EventBus::new()
            .with_listener(Arc::new(Tagger { name: "first", seen: seen.clone() }))
            .with_listener(Arc::new(Tagger { name: "second", seen: seen.clone() }));

        let mut account = Account::new("User");
        let request_data = FieldMap::new();
        let mut errors = ErrorSet::new();
        bus.before_register(&mut BeforeRegister {
            account: &mut account,
            request_data: &request_data,
            errors: &mut errors,
        })?;

        let seen = seen.lock().map_err(|_| anyhow!("Poisoned lock"))?;
        assert_eq!(*seen, vec!["first", "second"]);
        // the later listener overwrote the earlier message
        assert_eq!(errors.get("Listener"), Some("second"));
        Ok(())
    }

    #[test]
    fn listener_error_propagates() {
        let bus = EventBus::new().with_listener(Arc::new(Failing));
        let account = Account::new("User");
        let request_data = FieldMap::new();
        let result = bus.register_complete(&RegisterComplete {
            account: &account,
            request_data: &request_data,
        });
        assert!(result.is_err());
    }

    #[test]
    fn empty_bus_is_a_no_op() -> Result<()> {
        let bus = EventBus::new();
        assert!(bus.is_empty());
        let account = Account::new("User");
        let request_data = FieldMap::new();
        bus.register_complete(&RegisterComplete {
            account: &account,
            request_data: &request_data,
        })?;
        Ok(())
    }
}
