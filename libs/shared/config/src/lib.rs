use std::env;

use thiserror::Error;
use tracing::warn;

pub const DEFAULT_JITSI_BASE_URL: &str = "https://meet.jit.si";

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub supabase_url: String,
    pub supabase_anon_key: String,
    pub functions_base_url: String,
    pub jitsi_base_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("required environment variable {0} is not set")]
    MissingVar(&'static str),
}

impl AppConfig {
    /// Loads `.env` when present, then reads the environment.
    pub fn load() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();
        Self::from_env()
    }

    /// Reads configuration from the environment. Missing required values are
    /// a fatal startup error; optional values fall back to defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        let supabase_url = require("SUPABASE_URL")?;
        let supabase_anon_key = require("SUPABASE_ANON_PUBLIC_KEY")?;

        let functions_base_url = env::var("SUPABASE_FUNCTIONS_URL")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| format!("{}/functions/v1", supabase_url.trim_end_matches('/')));

        let jitsi_base_url = env::var("JITSI_BASE_URL")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| {
                warn!("JITSI_BASE_URL not set, using {}", DEFAULT_JITSI_BASE_URL);
                DEFAULT_JITSI_BASE_URL.to_string()
            });

        Ok(Self {
            supabase_url,
            supabase_anon_key,
            functions_base_url,
            jitsi_base_url,
        })
    }

    pub fn is_configured(&self) -> bool {
        !self.supabase_url.is_empty() && !self.supabase_anon_key.is_empty()
    }
}

fn require(name: &'static str) -> Result<String, ConfigError> {
    match env::var(name) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(ConfigError::MissingVar(name)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    // Environment variables are process-wide; the tests below serialize.
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    const ALL_VARS: [&str; 4] = [
        "SUPABASE_URL",
        "SUPABASE_ANON_PUBLIC_KEY",
        "SUPABASE_FUNCTIONS_URL",
        "JITSI_BASE_URL",
    ];

    fn clear_env() {
        for var in ALL_VARS {
            env::remove_var(var);
        }
    }

    #[test]
    fn missing_supabase_url_is_fatal() {
        let _guard = ENV_LOCK.lock().unwrap();
        clear_env();
        env::set_var("SUPABASE_ANON_PUBLIC_KEY", "anon-key");

        let result = AppConfig::from_env();
        assert_eq!(result, Err(ConfigError::MissingVar("SUPABASE_URL")));
    }

    #[test]
    fn blank_required_value_is_fatal() {
        let _guard = ENV_LOCK.lock().unwrap();
        clear_env();
        env::set_var("SUPABASE_URL", "https://proj.supabase.co");
        env::set_var("SUPABASE_ANON_PUBLIC_KEY", "   ");

        let result = AppConfig::from_env();
        assert_eq!(
            result,
            Err(ConfigError::MissingVar("SUPABASE_ANON_PUBLIC_KEY"))
        );
    }

    #[test]
    fn optional_values_fall_back_to_defaults() {
        let _guard = ENV_LOCK.lock().unwrap();
        clear_env();
        env::set_var("SUPABASE_URL", "https://proj.supabase.co/");
        env::set_var("SUPABASE_ANON_PUBLIC_KEY", "anon-key");

        let config = AppConfig::from_env().unwrap();
        assert_eq!(
            config.functions_base_url,
            "https://proj.supabase.co/functions/v1"
        );
        assert_eq!(config.jitsi_base_url, DEFAULT_JITSI_BASE_URL);
        assert!(config.is_configured());
    }

    #[test]
    fn explicit_optional_values_win() {
        let _guard = ENV_LOCK.lock().unwrap();
        clear_env();
        env::set_var("SUPABASE_URL", "https://proj.supabase.co");
        env::set_var("SUPABASE_ANON_PUBLIC_KEY", "anon-key");
        env::set_var("SUPABASE_FUNCTIONS_URL", "http://127.0.0.1:9009/functions/v1");
        env::set_var("JITSI_BASE_URL", "https://jitsi.clinic.example");

        let config = AppConfig::from_env().unwrap();
        assert_eq!(
            config.functions_base_url,
            "http://127.0.0.1:9009/functions/v1"
        );
        assert_eq!(config.jitsi_base_url, "https://jitsi.clinic.example");
    }
}
