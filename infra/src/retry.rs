//! Single-retry wrapper for storage calls

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use kd_core::errors::{DomainError, DomainResult};
use redis::ErrorKind;
use sqlx::mysql::MySqlDatabaseError;
use tokio::time::sleep;
use tracing::{error, warn};

/// MySQL error number for "Lock wait timeout exceeded"
const MYSQL_LOCK_WAIT_TIMEOUT: u16 = 1205;
/// MySQL error number for "Deadlock found when trying to get lock"
const MYSQL_DEADLOCK: u16 = 1213;

/// Whether a failed storage call may succeed if repeated
pub trait Transient {
    fn is_transient(&self) -> bool;
}

impl Transient for sqlx::Error {
    fn is_transient(&self) -> bool {
        match self {
            sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::Protocol(_)
            | sqlx::Error::PoolTimedOut
            | sqlx::Error::WorkerCrashed => true,
            // Constraint violations and syntax errors fail the same way every time
            sqlx::Error::Database(db) => db
                .try_downcast_ref::<MySqlDatabaseError>()
                .map_or(false, |e| {
                    matches!(e.number(), MYSQL_LOCK_WAIT_TIMEOUT | MYSQL_DEADLOCK)
                }),
            _ => false,
        }
    }
}

impl Transient for redis::RedisError {
    fn is_transient(&self) -> bool {
        self.is_io_error()
            || self.is_timeout()
            || self.is_connection_dropped()
            || matches!(
                self.kind(),
                ErrorKind::BusyLoadingError
                    | ErrorKind::TryAgain
                    | ErrorKind::ClusterDown
                    | ErrorKind::MasterDown
            )
    }
}

/// Runs `call`, and on a transient failure runs it once more after `delay`
///
/// A second transient failure is surfaced as `StorageError::Unavailable`
/// tagged with `operation`. Permanent failures are not retried and surface
/// as `DomainError::Internal`.
pub async fn retry_once<T, E, F, Fut>(operation: &str, delay: Duration, mut call: F) -> DomainResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Display + Transient,
{
    match call().await {
        Ok(value) => Ok(value),
        Err(first) if !first.is_transient() => {
            error!(operation, error = %first, "Storage call failed permanently");
            Err(DomainError::Internal {
                message: format!("{} failed: {}", operation, first),
            })
        }
        Err(first) => {
            warn!(
                operation,
                error = %first,
                delay_ms = delay.as_millis() as u64,
                "Storage call failed, retrying once"
            );
            sleep(delay).await;

            call().await.map_err(|second| {
                error!(operation, error = %second, "Storage call failed after retry");
                DomainError::unavailable(operation, second)
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kd_core::errors::StorageError;
    use std::fmt;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[derive(Debug)]
    enum FakeError {
        ConnectionReset,
        Constraint,
    }

    impl fmt::Display for FakeError {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            match self {
                FakeError::ConnectionReset => f.write_str("connection reset"),
                FakeError::Constraint => f.write_str("duplicate entry"),
            }
        }
    }

    impl Transient for FakeError {
        fn is_transient(&self) -> bool {
            matches!(self, FakeError::ConnectionReset)
        }
    }

    #[tokio::test]
    async fn test_second_attempt_succeeds() {
        let attempts = AtomicU32::new(0);
        let result = retry_once("test.op", Duration::from_millis(1), || {
            let attempt = attempts.fetch_add(1, Ordering::SeqCst);
            async move {
                if attempt == 0 {
                    Err(FakeError::ConnectionReset)
                } else {
                    Ok(42)
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(attempts.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_two_failures_surface_unavailable() {
        let attempts = AtomicU32::new(0);
        let result: DomainResult<()> = retry_once("test.op", Duration::from_millis(1), || {
            attempts.fetch_add(1, Ordering::SeqCst);
            async { Err(FakeError::ConnectionReset) }
        })
        .await;

        assert_eq!(attempts.load(Ordering::SeqCst), 2);
        match result {
            Err(DomainError::Storage(StorageError::Unavailable { operation, message })) => {
                assert_eq!(operation, "test.op");
                assert_eq!(message, "connection reset");
            }
            other => panic!("Expected Unavailable, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_permanent_failure_is_not_retried() {
        let attempts = AtomicU32::new(0);
        let result: DomainResult<()> = retry_once("test.insert", Duration::from_secs(60), || {
            attempts.fetch_add(1, Ordering::SeqCst);
            async { Err(FakeError::Constraint) }
        })
        .await;

        assert_eq!(attempts.load(Ordering::SeqCst), 1);
        assert!(matches!(result, Err(DomainError::Internal { .. })));
    }

    #[tokio::test]
    async fn test_success_does_not_retry() {
        let attempts = AtomicU32::new(0);
        let result = retry_once("test.op", Duration::from_millis(1), || {
            attempts.fetch_add(1, Ordering::SeqCst);
            async { Ok::<_, FakeError>("ok") }
        })
        .await;

        assert_eq!(result.unwrap(), "ok");
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_sqlx_error_classification() {
        assert!(sqlx::Error::PoolTimedOut.is_transient());
        assert!(sqlx::Error::Io(std::io::Error::from(std::io::ErrorKind::ConnectionReset)).is_transient());
        assert!(!sqlx::Error::RowNotFound.is_transient());
        assert!(!sqlx::Error::ColumnNotFound("token_hash".to_string()).is_transient());
    }

    #[test]
    fn test_redis_error_classification() {
        let dropped = redis::RedisError::from(std::io::Error::from(std::io::ErrorKind::BrokenPipe));
        assert!(dropped.is_transient());
        assert!(redis::RedisError::from((ErrorKind::TryAgain, "resharding")).is_transient());
        assert!(!redis::RedisError::from((ErrorKind::TypeError, "not an integer")).is_transient());
    }
}
