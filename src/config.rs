//! Sender configuration

use std::{env, fmt};

use serde::Deserialize;

use crate::Error;

/// SMTP server, credentials and default sender
///
/// ```
/// use mailer::MailerConfig;
///
/// let config = MailerConfig::new("smtp.example.com", 587, "user", "secret")
///     .sender("noreply@example.com", "Example");
/// assert_eq!(config.port, 587);
/// ```
#[derive(Clone, Deserialize, PartialEq, Eq)]
pub struct MailerConfig {
    pub host: String,
    pub port: u16,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    pub sender_email: String,
    #[serde(default)]
    pub sender_name: String,
}

impl MailerConfig {
    pub fn new(
        host: impl Into<String>,
        port: u16,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        MailerConfig {
            host: host.into(),
            port,
            username: username.into(),
            password: password.into(),
            sender_email: String::new(),
            sender_name: String::new(),
        }
    }

    /// Sets the default sender address and display name
    pub fn sender(mut self, email: impl Into<String>, name: impl Into<String>) -> Self {
        self.sender_email = email.into();
        self.sender_name = name.into();
        self
    }

    /// Reads `MAILER_HOST`, `MAILER_PORT`, `MAILER_USERNAME`,
    /// `MAILER_PASSWORD`, `MAILER_SENDER_EMAIL` and `MAILER_SENDER_NAME`.
    ///
    /// Host, port and sender email are required.
    pub fn from_env() -> Result<Self, Error> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, Error> {
        let required = |key: &str| {
            lookup(key)
                .filter(|value| !value.is_empty())
                .ok_or_else(|| Error::Config(format!("{key} is not set")))
        };

        let port = required("MAILER_PORT")?;
        let port = port
            .parse()
            .map_err(|_| Error::Config(format!("MAILER_PORT {port:?} is not a valid port")))?;

        Ok(MailerConfig {
            host: required("MAILER_HOST")?,
            port,
            username: lookup("MAILER_USERNAME").unwrap_or_default(),
            password: lookup("MAILER_PASSWORD").unwrap_or_default(),
            sender_email: required("MAILER_SENDER_EMAIL")?,
            sender_name: lookup("MAILER_SENDER_NAME").unwrap_or_default(),
        })
    }
}

impl fmt::Debug for MailerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MailerConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("sender_email", &self.sender_email)
            .field("sender_name", &self.sender_name)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod test {
    use std::collections::HashMap;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn from_lookup() {
        let config = MailerConfig::from_lookup(lookup(&[
            ("MAILER_HOST", "smtp.example.com"),
            ("MAILER_PORT", "465"),
            ("MAILER_USERNAME", "user"),
            ("MAILER_PASSWORD", "secret"),
            ("MAILER_SENDER_EMAIL", "noreply@example.com"),
        ]))
        .unwrap();

        assert_eq!(
            config,
            MailerConfig::new("smtp.example.com", 465, "user", "secret")
                .sender("noreply@example.com", "")
        );
    }

    #[test]
    fn missing_or_invalid_values() {
        let err = MailerConfig::from_lookup(lookup(&[("MAILER_PORT", "25")])).unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid configuration: MAILER_HOST is not set"
        );

        let err = MailerConfig::from_lookup(lookup(&[("MAILER_PORT", "smtp")])).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn debug_hides_password() {
        let config = MailerConfig::new("h", 25, "u", "hunter2");
        assert!(!format!("{config:?}").contains("hunter2"));
    }

    #[test]
    fn deserialize() {
        let config: MailerConfig = serde_json::from_str(
            r#"{"host": "smtp.example.com", "port": 587, "sender_email": "a@example.com"}"#,
        )
        .unwrap();
        assert_eq!(config.username, "");
        assert_eq!(config.port, 587);
    }
}
