//! Registration workflow configuration.

use super::account::fields::DEFAULT_REGISTRATION_FIELDS;

#[derive(Clone, Debug)]
pub struct RegistrationConfig {
    enabled: bool,
    fields: Vec<String>,
}

impl RegistrationConfig {
    /// Default config: registration enabled, standard person fields allowed.
    #[must_use]
    pub fn new() -> Self {
        Self {
            enabled: true,
            fields: DEFAULT_REGISTRATION_FIELDS
                .iter()
                .map(ToString::to_string)
                .collect(),
        }
    }

    #[must_use]
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Replace the allow-list of fields accepted from a request.
    #[must_use]
    pub fn with_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields = fields.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn enabled(&self) -> bool {
        self.enabled
    }

    #[must_use]
    pub fn fields(&self) -> &[String] {
        &self.fields
    }
}

impl Default for RegistrationConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registration_config_defaults_and_overrides() {
        let config = RegistrationConfig::new();
        assert!(config.enabled());
        assert_eq!(config.fields().len(), 10);
        assert!(config.fields().iter().any(|field| field == "Username"));
        assert!(!config.fields().iter().any(|field| field == "PasswordConfirm"));

        let config = config
            .with_enabled(false)
            .with_fields(["Username", "Password", "Email"]);
        assert!(!config.enabled());
        assert_eq!(config.fields(), ["Username", "Password", "Email"]);
    }
}
