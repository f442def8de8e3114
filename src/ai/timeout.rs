//! Unified Timeout Configuration
//!
//! Centralized timeout management with operation-specific defaults.

use std::future::Future;
use std::time::Duration;

use crate::constants::{execution, network as net_constants, scan};
use crate::types::{Result, ScrapeError};

#[derive(Debug, Clone)]
pub struct TimeoutConfig {
    pub llm_request: Duration,
    pub scan_nav: Duration,
    pub dom_settle: Duration,
    pub script_execution: Duration,
    pub connection: Duration,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            llm_request: Duration::from_secs(net_constants::DEFAULT_TIMEOUT_SECS),
            scan_nav: Duration::from_secs(scan::NAV_TIMEOUT_SECS),
            dom_settle: Duration::from_secs(scan::DOM_STABILITY_MAX_SECS),
            script_execution: Duration::from_secs(execution::TEST_RUN_TIMEOUT_SECS),
            connection: Duration::from_secs(net_constants::CONNECTION_TIMEOUT_SECS),
        }
    }
}

pub async fn with_timeout<T, F>(timeout: Duration, future: F, operation_name: &str) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match tokio::time::timeout(timeout, future).await {
        Ok(result) => result,
        Err(_) => Err(ScrapeError::timeout(operation_name, timeout)),
    }
}

pub async fn with_timeout_map<T, F>(timeout: Duration, future: F, operation_name: &str) -> Result<T>
where
    F: Future<Output = T>,
{
    match tokio::time::timeout(timeout, future).await {
        Ok(result) => Ok(result),
        Err(_) => Err(ScrapeError::timeout(operation_name, timeout)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_config_defaults() {
        let config = TimeoutConfig::default();
        assert_eq!(config.llm_request.as_secs(), 300);
        assert_eq!(config.connection.as_secs(), 30);
        assert_eq!(config.scan_nav.as_secs(), 45);
    }

    #[tokio::test]
    async fn test_with_timeout_success() {
        let result = with_timeout(
            Duration::from_secs(1),
            async { Ok::<_, ScrapeError>(42) },
            "test operation",
        )
        .await;
        assert!(result.is_ok());
        assert_eq!(result.unwrap(), 42);
    }

    #[tokio::test]
    async fn test_with_timeout_expires() {
        let result = with_timeout(
            Duration::from_millis(10),
            async {
                tokio::time::sleep(Duration::from_secs(1)).await;
                Ok::<_, ScrapeError>(42)
            },
            "slow operation",
        )
        .await;
        assert!(result.is_err());
        assert!(matches!(result.unwrap_err(), ScrapeError::Timeout { .. }));
    }
}
