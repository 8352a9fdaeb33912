//! Provider connection settings.
//!
//! Values come from the manifest's `[provider]` table first, then from
//! `LANDSCAPE_API_*` environment variables for anything the table leaves out.

use anyhow::{Result, bail};
use landscape::Credentials;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const ENV_API_URL: &str = "LANDSCAPE_API_URL";
pub const ENV_ACCOUNT: &str = "LANDSCAPE_API_ACCOUNT";
pub const ENV_ACCESS_KEY: &str = "LANDSCAPE_API_ACCESS_KEY";
pub const ENV_SECRET_KEY: &str = "LANDSCAPE_API_SECRET_KEY";
pub const ENV_EMAIL: &str = "LANDSCAPE_API_EMAIL";
pub const ENV_PASSWORD: &str = "LANDSCAPE_API_PASSWORD";

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// The `[provider]` table, as written.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProviderSettings {
    pub api_url: Option<String>,
    pub account: Option<String>,
    pub access_key: Option<String>,
    pub secret_key: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub timeout_secs: Option<u64>,
}

/// Validated settings, ready to build a client.
#[derive(Debug, Clone)]
pub struct ConnectionSettings {
    pub api_url: String,
    pub credentials: Credentials,
    pub timeout: Duration,
}

impl ProviderSettings {
    /// Fill unset values from the process environment.
    pub fn with_env(self) -> Self {
        self.fill_from(|name| std::env::var(name).ok())
    }

    /// Fill unset values from `lookup`.
    pub fn fill_from(self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let pick = |value: Option<String>, var: &str| present(value).or_else(|| present(lookup(var)));
        Self {
            api_url: pick(self.api_url, ENV_API_URL),
            account: pick(self.account, ENV_ACCOUNT),
            access_key: pick(self.access_key, ENV_ACCESS_KEY),
            secret_key: pick(self.secret_key, ENV_SECRET_KEY),
            email: pick(self.email, ENV_EMAIL),
            password: pick(self.password, ENV_PASSWORD),
            timeout_secs: self.timeout_secs,
        }
    }

    /// Check the settings and pick a credential style.
    ///
    /// Every problem is reported at once. Email/password wins when both
    /// credential styles are complete.
    pub fn validate(&self) -> Result<ConnectionSettings> {
        let mut problems = Vec::new();

        let api_url = present(self.api_url.clone());
        if api_url.is_none() {
            problems.push(format!(
                "api_url is required (set it in [provider] or {ENV_API_URL})"
            ));
        }

        let email = present(self.email.clone());
        let password = present(self.password.clone());
        let access_key = present(self.access_key.clone());
        let secret_key = present(self.secret_key.clone());
        let account = present(self.account.clone());

        match (&email, &password) {
            (Some(_), None) => problems.push("email is set but password is missing".to_string()),
            (None, Some(_)) => problems.push("password is set but email is missing".to_string()),
            _ => {}
        }
        match (&access_key, &secret_key) {
            (Some(_), None) => {
                problems.push("access_key is set but secret_key is missing".to_string());
            }
            (None, Some(_)) => {
                problems.push("secret_key is set but access_key is missing".to_string());
            }
            _ => {}
        }
        if account.is_some() && (email.is_none() || password.is_none()) {
            problems.push("account can only be used with email and password".to_string());
        }
        if email.is_none() && password.is_none() && access_key.is_none() && secret_key.is_none() {
            problems.push(format!(
                "no credentials: set email and password ({ENV_EMAIL}, {ENV_PASSWORD}) \
                 or access_key and secret_key ({ENV_ACCESS_KEY}, {ENV_SECRET_KEY})"
            ));
        }

        if self.timeout_secs == Some(0) {
            problems.push("timeout_secs must be greater than zero".to_string());
        }

        let credentials = match (email, password, access_key, secret_key) {
            (Some(email), Some(password), _, _) => Some(Credentials::EmailPassword {
                email,
                password,
                account,
            }),
            (_, _, Some(access_key), Some(secret_key)) => Some(Credentials::AccessKey {
                access_key,
                secret_key,
            }),
            _ => None,
        };

        match (api_url, credentials) {
            (Some(api_url), Some(credentials)) if problems.is_empty() => {
                log::debug!("using {} credentials for {api_url}", credentials.kind());
                Ok(ConnectionSettings {
                    api_url,
                    credentials,
                    timeout: Duration::from_secs(self.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS)),
                })
            }
            _ => bail!(
                "Invalid provider configuration:\n  - {}",
                problems.join("\n  - ")
            ),
        }
    }
}

fn present(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn test_table_wins_over_environment() {
        let settings = ProviderSettings {
            api_url: Some("https://table.example/api".into()),
            ..ProviderSettings::default()
        }
        .fill_from(env(&[
            (ENV_API_URL, "https://env.example/api"),
            (ENV_ACCESS_KEY, "AK"),
            (ENV_SECRET_KEY, "SK"),
        ]));

        assert_eq!(settings.api_url.as_deref(), Some("https://table.example/api"));
        assert_eq!(settings.access_key.as_deref(), Some("AK"));

        let conn = settings.validate().unwrap();
        assert!(matches!(conn.credentials, Credentials::AccessKey { .. }));
        assert_eq!(conn.timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_empty_values_count_as_unset() {
        let settings = ProviderSettings {
            api_url: Some("  ".into()),
            ..ProviderSettings::default()
        }
        .fill_from(env(&[(ENV_API_URL, "https://env.example/api")]));
        assert_eq!(settings.api_url.as_deref(), Some("https://env.example/api"));
    }

    #[test]
    fn test_email_password_wins() {
        let settings = ProviderSettings {
            api_url: Some("https://x/api".into()),
            email: Some("me@example.com".into()),
            password: Some("pw".into()),
            account: Some("acme".into()),
            access_key: Some("AK".into()),
            secret_key: Some("SK".into()),
            timeout_secs: Some(5),
        };
        let conn = settings.validate().unwrap();
        match conn.credentials {
            Credentials::EmailPassword { account, .. } => {
                assert_eq!(account.as_deref(), Some("acme"));
            }
            other => panic!("unexpected credentials: {other:?}"),
        }
        assert_eq!(conn.timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_all_problems_reported_together() {
        let settings = ProviderSettings {
            email: Some("me@example.com".into()),
            secret_key: Some("SK".into()),
            timeout_secs: Some(0),
            ..ProviderSettings::default()
        };
        let message = settings.validate().unwrap_err().to_string();
        assert!(message.contains("api_url is required"));
        assert!(message.contains("password is missing"));
        assert!(message.contains("access_key is missing"));
        assert!(message.contains("timeout_secs"));
    }

    #[test]
    fn test_no_credentials() {
        let settings = ProviderSettings {
            api_url: Some("https://x/api".into()),
            account: Some("acme".into()),
            ..ProviderSettings::default()
        };
        let message = settings.validate().unwrap_err().to_string();
        assert!(message.contains("no credentials"));
        assert!(message.contains("account can only be used"));
    }
}
