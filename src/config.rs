use std::net::SocketAddr;

pub const JWT_SIGN_KEY: &str = "JWT_SIGN_KEY";
pub const JWT_VALIDATE_KEY: &str = "JWT_VALIDATE_KEY";
pub const JWT_ISSUER: &str = "JWT_ISSUER";

pub const OPENSEARCH_URLS: &str = "OPENSEARCH_URLS";
pub const OPENSEARCH_USERNAME: &str = "OPENSEARCH_USERNAME";
pub const OPENSEARCH_SECRET: &str = "OPENSEARCH_SECRET";

pub const GIT_COMMIT: &str = "GIT_COMMIT";

pub const SKIT_ADDR: &str = "SKIT_ADDR";
const DEFAULT_ADDR: &str = "127.0.0.1:3000";

/// Returns the variable's value when it is set and not empty.
pub fn env_non_empty(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|value| !value.is_empty())
}

pub fn env_or(key: &str, default: &str) -> String {
    env_non_empty(key).unwrap_or_else(|| default.to_owned())
}

/// Splits a comma separated list, trimming entries and dropping empty ones.
pub fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| entry.to_owned())
        .collect()
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub addr: SocketAddr,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, std::net::AddrParseError> {
        let addr = env_or(SKIT_ADDR, DEFAULT_ADDR).parse()?;
        Ok(ServerConfig { addr })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn split_list_drops_blank_entries() {
        assert_eq!(
            split_list(" https://a:9200, ,https://b:9200 ,"),
            vec!["https://a:9200".to_owned(), "https://b:9200".to_owned()]
        );
        assert!(split_list("").is_empty());
        assert!(split_list(" , ").is_empty());
    }

    #[test]
    #[serial]
    fn empty_values_fall_back_to_default() {
        std::env::set_var("SKIT_TEST_EMPTY", "");
        assert_eq!(env_or("SKIT_TEST_EMPTY", "fallback"), "fallback");
        assert_eq!(env_non_empty("SKIT_TEST_EMPTY"), None);

        std::env::set_var("SKIT_TEST_EMPTY", "value");
        assert_eq!(env_or("SKIT_TEST_EMPTY", "fallback"), "value");
        std::env::remove_var("SKIT_TEST_EMPTY");
    }

    #[test]
    #[serial]
    fn server_addr_defaults_to_localhost() {
        std::env::remove_var(SKIT_ADDR);
        let config = ServerConfig::from_env().unwrap();
        assert_eq!(config.addr.to_string(), "127.0.0.1:3000");
    }
}
