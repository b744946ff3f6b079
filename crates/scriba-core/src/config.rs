//! Gateway configuration loaded from `.env`.
//!
//! Secrets stay in the backend only. The operator password (`USER_PW`) is
//! hashed once at startup and only the digest is retained; the service API
//! key never leaves the gateway process.

use crate::auth::hash_password;
use crate::error::{ScribaError, ScribaResult};

/// Runtime configuration for the gateway.
///
/// | Env | Default | Description |
/// |-----|---------|-------------|
/// | USER_PW | required | Operator password; hashed at startup. |
/// | ASSEMBLYAI_API_KEY | required | Credential for the speech-to-text service. |
/// | ASSEMBLYAI_BASE_URL | https://api.assemblyai.com | Override for tests. |
/// | SCRIBA_PORT | 8000 | Gateway bind port (127.0.0.1 only). |
/// | SCRIBA_POLL_INTERVAL_MS | 3000 | Transcript polling cadence. |
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub app_name: String,
    pub port: u16,
    /// Lowercase hex SHA-256 of `USER_PW`.
    pub password_hash: String,
    pub api_key: String,
    pub base_url: String,
    pub poll_interval_ms: u64,
}

impl GatewayConfig {
    /// Load from environment. Missing `USER_PW` or `ASSEMBLYAI_API_KEY` is a
    /// `Config` error: the process must not serve requests without them.
    pub fn from_env() -> ScribaResult<Self> {
        let password = required_env("USER_PW")?;
        let api_key = required_env("ASSEMBLYAI_API_KEY")?;
        Ok(Self {
            app_name: "Scriba Gateway".to_string(),
            port: env_u16("SCRIBA_PORT", 8000),
            password_hash: hash_password(&password),
            api_key,
            base_url: env_string("ASSEMBLYAI_BASE_URL", "https://api.assemblyai.com"),
            poll_interval_ms: env_u64("SCRIBA_POLL_INTERVAL_MS", 3000),
        })
    }
}

fn required_env(name: &str) -> ScribaResult<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ScribaError::Config(format!("{} is not set", name)))
}

fn env_string(name: &str, default: &str) -> String {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| default.to_string())
}

fn env_u16(name: &str, default: u16) -> u16 {
    match std::env::var(name) {
        Ok(v) => v.trim().parse().unwrap_or(default),
        Err(_) => default,
    }
}

fn env_u64(name: &str, default: u64) -> u64 {
    match std::env::var(name) {
        Ok(v) => v.trim().parse().unwrap_or(default),
        Err(_) => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn required_env_rejects_missing_and_blank() {
        std::env::remove_var("SCRIBA_TEST_REQUIRED_MISSING");
        assert!(required_env("SCRIBA_TEST_REQUIRED_MISSING").is_err());
        std::env::set_var("SCRIBA_TEST_REQUIRED_BLANK", "   ");
        assert!(required_env("SCRIBA_TEST_REQUIRED_BLANK").is_err());
        std::env::set_var("SCRIBA_TEST_REQUIRED_SET", " secret ");
        assert_eq!(required_env("SCRIBA_TEST_REQUIRED_SET").unwrap(), "secret");
    }

    #[test]
    fn numeric_env_falls_back_on_garbage() {
        std::env::set_var("SCRIBA_TEST_PORT_GARBAGE", "not-a-port");
        assert_eq!(env_u16("SCRIBA_TEST_PORT_GARBAGE", 8000), 8000);
        std::env::set_var("SCRIBA_TEST_PORT_OK", "9100");
        assert_eq!(env_u16("SCRIBA_TEST_PORT_OK", 8000), 9100);
        assert_eq!(env_u64("SCRIBA_TEST_POLL_UNSET", 3000), 3000);
    }
}
