//! Timeouts for external calls
//!
//! Every suspension point of the pipeline (exemplar retrieval, generation,
//! external judgment) runs under an explicit deadline. An expired deadline
//! surfaces as `HumaniseError::Timeout`, which callers treat exactly like a
//! provider failure.
//!
//! ## Usage
//!
//! ```ignore
//! use crate::ai::timeout::with_timeout;
//!
//! let response = with_timeout(Duration::from_secs(120), provider.generate(&request), "style rewrite").await?;
//! ```

use std::future::Future;
use std::time::Duration;

use crate::types::{HumaniseError, Result};

/// Execute an async operation with a timeout
///
/// Returns `HumaniseError::Timeout` if the operation doesn't complete in time.
pub async fn with_timeout<T, F>(timeout: Duration, future: F, operation_name: &str) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match tokio::time::timeout(timeout, future).await {
        Ok(result) => result,
        Err(_) => Err(HumaniseError::timeout(operation_name, timeout)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_with_timeout_success() {
        let result = with_timeout(
            Duration::from_secs(1),
            async { Ok::<_, HumaniseError>(42) },
            "test operation",
        )
        .await;
        assert_eq!(result.unwrap(), 42);
    }

    #[tokio::test]
    async fn test_with_timeout_expires() {
        let result = with_timeout(
            Duration::from_millis(10),
            async {
                tokio::time::sleep(Duration::from_secs(1)).await;
                Ok::<_, HumaniseError>(42)
            },
            "slow operation",
        )
        .await;
        assert!(matches!(result.unwrap_err(), HumaniseError::Timeout { .. }));
    }
}
