use thiserror::Error;

pub const DEFAULT_MODEL: &str = "google/gemini-2.0-flash-001";
pub const DEFAULT_PORT: u16 = 3000;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("{0} not set")]
    Missing(&'static str),
}

/// Settings read from the environment at startup.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub openrouter_api_key: String,
    pub model: String,
    pub port: u16,
}

impl ServiceConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let openrouter_api_key = lookup("OPENROUTER_API_KEY")
            .filter(|key| !key.trim().is_empty())
            .ok_or(ConfigError::Missing("OPENROUTER_API_KEY"))?;

        let model = lookup("ROUTER_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string());

        let port = lookup("PORT")
            .and_then(|port| port.parse::<u16>().ok())
            .unwrap_or(DEFAULT_PORT);

        Ok(Self {
            openrouter_api_key,
            model,
            port,
        })
    }
}
