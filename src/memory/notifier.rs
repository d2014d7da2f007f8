//! Notifier that writes messages to the log instead of sending them.

use anyhow::Result;
use serde_json::Value;
use tracing::info;

use crate::registrar::ports::Notifier;

/// Context keys that carry live credentials.
const SECRET_KEYS: [&str; 1] = ["resetUrl"];

/// Local dev notifier.
#[derive(Clone, Debug, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn send_template(&self, recipient: &str, template: &str, context: &Value) -> Result<()> {
        info!(
            recipient = %recipient,
            template = %template,
            context = %redact_context(context),
            "email send stub"
        );
        Ok(())
    }
}

fn redact_context(context: &Value) -> Value {
    let mut redacted = context.clone();
    if let Some(object) = redacted.as_object_mut() {
        for key in SECRET_KEYS {
            if let Some(value) = object.get_mut(key) {
                *value = Value::from("REDACTED");
            }
        }
    }
    redacted
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn log_notifier_accepts_any_message() -> Result<()> {
        LogNotifier.send_template("jdoe@example.com", "registerComplete", &json!({}))?;
        Ok(())
    }

    #[test]
    fn reset_link_is_redacted() {
        let context = json!({
            "tokenId": "01J0000000000000000000000",
            "resetUrl": "http://localhost:8080/reset-password#token=secret",
            "expiresInMinutes": 30,
        });

        let redacted = redact_context(&context);

        assert_eq!(redacted["resetUrl"], "REDACTED");
        assert_eq!(redacted["tokenId"], context["tokenId"]);
        assert_eq!(redacted["expiresInMinutes"], 30);
        assert!(!redacted.to_string().contains("secret"));
        assert_eq!(redact_context(&json!("plain")), json!("plain"));
    }
}
