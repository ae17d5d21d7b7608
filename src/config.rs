use std::str::FromStr;
use std::time::Duration;

use crate::application::discovery::ScannerConfig;
use crate::application::pipeline::{BatchConfig, ThumbnailConfig};

/// Output format of the log subscriber
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "text" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            other => Err(format!("unknown log format: {}", other)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub budget_bytes: u64,
    pub probe_concurrency: usize,
    pub scan_chunk_size: usize,
    pub probe_range_bytes: u64,
    pub thumbnail_size: u32,
    pub thumbnail_timeout_ms: u64,
    // HTTP transport
    pub http_connect_timeout_secs: u64,
    pub http_request_timeout_secs: u64,
    pub log_format: LogFormat,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            budget_bytes: 500 * 1024,
            probe_concurrency: 5,
            scan_chunk_size: 10,
            probe_range_bytes: 1024,
            thumbnail_size: 64,
            thumbnail_timeout_ms: 2000,
            http_connect_timeout_secs: 10,
            http_request_timeout_secs: 60,
            log_format: LogFormat::Text,
        }
    }
}

fn env_or<T: FromStr>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

impl Config {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            budget_bytes: env_or("ASSET_BUDGET_BYTES", defaults.budget_bytes),
            probe_concurrency: env_or("PROBE_CONCURRENCY", defaults.probe_concurrency),
            scan_chunk_size: env_or("SCAN_CHUNK_SIZE", defaults.scan_chunk_size),
            probe_range_bytes: env_or("PROBE_RANGE_BYTES", defaults.probe_range_bytes),
            thumbnail_size: env_or("THUMBNAIL_SIZE", defaults.thumbnail_size),
            thumbnail_timeout_ms: env_or("THUMBNAIL_TIMEOUT_MS", defaults.thumbnail_timeout_ms),
            http_connect_timeout_secs: env_or(
                "HTTP_CONNECT_TIMEOUT_SECS",
                defaults.http_connect_timeout_secs,
            ),
            http_request_timeout_secs: env_or(
                "HTTP_REQUEST_TIMEOUT_SECS",
                defaults.http_request_timeout_secs,
            ),
            log_format: env_or("LOG_FORMAT", defaults.log_format),
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.budget_bytes == 0 {
            return Err("ASSET_BUDGET_BYTES must be greater than 0".to_string());
        }

        if self.probe_concurrency == 0 {
            return Err("PROBE_CONCURRENCY must be at least 1".to_string());
        }

        if self.scan_chunk_size == 0 {
            return Err("SCAN_CHUNK_SIZE must be at least 1".to_string());
        }

        if self.probe_range_bytes == 0 {
            return Err("PROBE_RANGE_BYTES must be greater than 0".to_string());
        }

        if !(8..=512).contains(&self.thumbnail_size) {
            return Err("THUMBNAIL_SIZE must be between 8 and 512".to_string());
        }

        if self.thumbnail_timeout_ms < 100 {
            return Err("THUMBNAIL_TIMEOUT_MS must be at least 100".to_string());
        }

        if self.http_connect_timeout_secs == 0 || self.http_request_timeout_secs == 0 {
            return Err("HTTP timeouts must be greater than 0".to_string());
        }

        Ok(())
    }

    pub fn scanner(&self) -> ScannerConfig {
        ScannerConfig {
            batch: BatchConfig {
                chunk_size: self.scan_chunk_size,
            },
            probe_concurrency: self.probe_concurrency,
            probe_range_bytes: self.probe_range_bytes,
        }
    }

    pub fn thumbnail(&self) -> ThumbnailConfig {
        ThumbnailConfig {
            size: self.thumbnail_size,
            timeout: Duration::from_millis(self.thumbnail_timeout_ms),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.budget_bytes, 512_000);
        assert_eq!(config.scanner().batch.chunk_size, 10);
        assert_eq!(config.thumbnail().timeout, Duration::from_secs(2));
    }

    #[test]
    fn test_validate_rejects_zero_concurrency() {
        let config = Config {
            probe_concurrency: 0,
            ..Config::default()
        };
        assert!(config.validate().unwrap_err().contains("PROBE_CONCURRENCY"));
    }

    #[test]
    fn test_validate_rejects_thumbnail_size_out_of_range() {
        for size in [4, 1024] {
            let config = Config {
                thumbnail_size: size,
                ..Config::default()
            };
            assert!(config.validate().is_err());
        }
    }

    #[test]
    fn test_validate_rejects_short_thumbnail_timeout() {
        let config = Config {
            thumbnail_timeout_ms: 50,
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_log_format_parse() {
        assert_eq!("JSON".parse::<LogFormat>(), Ok(LogFormat::Json));
        assert_eq!("text".parse::<LogFormat>(), Ok(LogFormat::Text));
        assert!("xml".parse::<LogFormat>().is_err());
    }
}
