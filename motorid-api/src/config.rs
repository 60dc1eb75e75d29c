//! API Configuration Module
//!
//! Configuration for CORS, the command channel, and the gateway's wait
//! window. Loaded from environment variables with development defaults.

use std::time::Duration;

/// API configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Allowed CORS origins (comma-separated in env var).
    /// Empty means allow all origins (dev mode).
    pub cors_origins: Vec<String>,

    /// How long a write call waits for the worker's response.
    pub dispatch_timeout: Duration,

    /// Bound of the command queue between gateway and worker.
    pub channel_capacity: usize,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            cors_origins: Vec::new(), // Empty = allow all
            dispatch_timeout: Duration::from_secs(10),
            channel_capacity: 256,
        }
    }
}

impl ApiConfig {
    /// Create ApiConfig from environment variables.
    ///
    /// Environment variables:
    /// - `MOTORID_CORS_ORIGINS`: Comma-separated allowed origins (empty = allow all)
    /// - `MOTORID_DISPATCH_TIMEOUT_SECS`: Gateway wait window per write call (default: 10)
    /// - `MOTORID_CHANNEL_CAPACITY`: Command queue bound (default: 256)
    pub fn from_env() -> Self {
        let cors_origins = std::env::var("MOTORID_CORS_ORIGINS")
            .ok()
            .map(|s| {
                s.split(',')
                    .map(|o| o.trim().to_string())
                    .filter(|o| !o.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        let dispatch_timeout = Duration::from_secs(
            std::env::var("MOTORID_DISPATCH_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(10),
        );

        let channel_capacity = std::env::var("MOTORID_CHANNEL_CAPACITY")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(256);

        Self {
            cors_origins,
            dispatch_timeout,
            channel_capacity,
        }
    }

    /// Check if running in production mode (strict CORS).
    pub fn is_production(&self) -> bool {
        !self.cors_origins.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ApiConfig::default();
        assert!(config.cors_origins.is_empty());
        assert_eq!(config.dispatch_timeout, Duration::from_secs(10));
        assert_eq!(config.channel_capacity, 256);
        assert!(!config.is_production());
    }

    #[test]
    fn test_is_production() {
        let mut config = ApiConfig::default();
        config.cors_origins = vec!["https://registry.example".to_string()];
        assert!(config.is_production());
    }
}
