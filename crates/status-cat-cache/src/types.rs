//! Configuration for the status cat cache

use crate::upstream::CatFetcher;
use std::path::PathBuf;

/// Resolved runtime configuration, injected into the server state at startup
#[derive(Debug, Clone)]
pub struct CacheConfig {
    pub host: String,
    pub port: u16,
    pub cache_dir: PathBuf,
    pub upstream_url: String,
    pub upstream_timeout_secs: u64,
    pub max_body_bytes: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
            cache_dir: PathBuf::from("./cache"),
            upstream_url: CatFetcher::DEFAULT_BASE_URL.to_string(),
            upstream_timeout_secs: CatFetcher::DEFAULT_TIMEOUT.as_secs(),
            max_body_bytes: 10 * 1024 * 1024, // 10 MiB
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = CacheConfig::default();
        assert_eq!(config.port, 3000);
        assert_eq!(config.upstream_url, "https://http.cat");
        assert_eq!(config.upstream_timeout_secs, 30);
        assert_eq!(config.max_body_bytes, 10 * 1024 * 1024);
    }
}
