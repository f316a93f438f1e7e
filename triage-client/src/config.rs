use clap::Parser;
use std::path::PathBuf;

pub const DEFAULT_REDIRECT_URL: &str = "http://localhost:3000/auth/verify";

#[derive(Parser, Debug, Clone)]
#[command(name = "triage-client")]
#[command(about = "Chat with the triage assistant and request an expert consultation", long_about = None)]
pub struct ClientConfig {
    /// Base URL of the triage service
    #[arg(long, env = "ROUTER_URL", default_value = "http://localhost:3000")]
    pub router_url: String,

    /// Identity Toolkit API key. Without one, sign-in links are printed locally.
    #[arg(long, env = "AUTH_API_KEY")]
    pub auth_api_key: Option<String>,

    /// Where sign-in links lead back to
    #[arg(long, env = "AUTH_REDIRECT_URL", default_value = DEFAULT_REDIRECT_URL)]
    pub auth_redirect_url: String,

    /// PostgreSQL connection string. Without one, requests are kept in memory.
    #[arg(long, env = "DATABASE_URL")]
    pub database_url: Option<String>,

    #[arg(long, env = "LOCAL_STORE_PATH", default_value = ".triage-client.json")]
    pub local_store_path: PathBuf,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_override_defaults() {
        let config = ClientConfig::try_parse_from([
            "triage-client",
            "--router-url",
            "http://triage.internal:8080",
            "--local-store-path",
            "/tmp/chat.json",
        ])
        .unwrap();

        assert_eq!(config.router_url, "http://triage.internal:8080");
        assert_eq!(config.local_store_path, PathBuf::from("/tmp/chat.json"));
        assert_eq!(config.auth_redirect_url, DEFAULT_REDIRECT_URL);
    }
}
