use crate::{Credentials, GarminError};
use secrecy::SecretString;

pub const DEFAULT_BASE_URL: &str = "https://connectapi.garmin.com";

#[derive(Clone, Debug)]
pub struct Config {
    pub credentials: Credentials,
    pub base_url: String,
}

impl Config {
    pub fn from_env() -> Result<Self, GarminError> {
        Self::from_env_with(|k| std::env::var(k).ok())
    }

    /// Testable helper that reads configuration values using the provided
    /// function. Empty values count as missing.
    pub fn from_env_with<F>(mut get: F) -> Result<Self, GarminError>
    where
        F: FnMut(&str) -> Option<String>,
    {
        let mut required = |key: &str| {
            get(key)
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| GarminError::Config(format!("{key} missing")))
        };
        let email = required("GARMIN_EMAIL")?;
        let password = required("GARMIN_PASSWORD")?;
        let base_url = get("GARMIN_BASE_URL")
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_BASE_URL.into());
        Ok(Self {
            credentials: Credentials {
                email,
                password: SecretString::new(password.into()),
            },
            base_url,
        })
    }
}
