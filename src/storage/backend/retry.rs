//! 数据库操作重试
//!
//! 只对瞬时错误（取连接失败、死锁、锁等待超时、SQLite BUSY/LOCKED）重试，
//! 退避时间按指数增长并叠加 0-25% 抖动。

use sea_orm::DbErr;
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, warn};

use crate::config::DatabaseConfig;

/// 各数据库中表示"稍后再试"的错误码
const RETRYABLE_CODES: &[&str] = &[
    "1213", "1205", // MySQL 死锁 / 锁等待超时
    "40001", "40P01", // PostgreSQL 序列化失败 / 死锁
    "5", "6", // SQLite BUSY / LOCKED
];

const RETRYABLE_MESSAGES: &[&str] = &[
    "deadlock",
    "lock wait timeout",
    "database is locked",
    "serialization failure",
];

/// 判断数据库错误是否可重试
pub fn is_retryable_error(err: &DbErr) -> bool {
    match err {
        DbErr::ConnectionAcquire(_) | DbErr::Conn(_) => true,
        DbErr::Exec(runtime_err) | DbErr::Query(runtime_err) => is_retryable_runtime(runtime_err),
        _ => false,
    }
}

fn is_retryable_runtime(err: &sea_orm::error::RuntimeErr) -> bool {
    use sea_orm::error::RuntimeErr;

    match err {
        RuntimeErr::SqlxError(sqlx_err) => {
            let code = sqlx_err
                .as_database_error()
                .and_then(|db_err| db_err.code().map(|c| c.into_owned()));
            match code {
                Some(code) => RETRYABLE_CODES.contains(&code.as_str()),
                None => message_is_retryable(&sqlx_err.to_string()),
            }
        }
        RuntimeErr::Internal(msg) => message_is_retryable(msg),
        #[allow(unreachable_patterns)]
        _ => false,
    }
}

fn message_is_retryable(msg: &str) -> bool {
    let msg = msg.to_lowercase();
    RETRYABLE_MESSAGES.iter().any(|m| msg.contains(m))
}

/// 重试配置
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetryConfig {
    pub max_retries: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
}

impl From<&DatabaseConfig> for RetryConfig {
    fn from(config: &DatabaseConfig) -> Self {
        Self {
            max_retries: config.retry_count,
            base_delay_ms: config.retry_base_delay_ms,
            max_delay_ms: config.retry_max_delay_ms,
        }
    }
}

/// 执行 `operation`，遇到可重试错误时按指数退避重试
pub async fn with_retry<T, F, Fut>(
    operation_name: &str,
    config: RetryConfig,
    mut operation: F,
) -> Result<T, DbErr>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, DbErr>>,
{
    let mut attempt = 0;
    loop {
        let err = match operation().await {
            Ok(value) => {
                if attempt > 0 {
                    debug!("'{}' succeeded after {} retries", operation_name, attempt);
                }
                return Ok(value);
            }
            Err(e) => e,
        };

        if !is_retryable_error(&err) {
            debug!("'{}' failed with non-retryable error: {}", operation_name, err);
            return Err(err);
        }
        if attempt >= config.max_retries {
            warn!(
                "'{}' failed after {} attempts: {}",
                operation_name,
                attempt + 1,
                err
            );
            return Err(err);
        }

        attempt += 1;
        let delay = backoff_delay(attempt, config.base_delay_ms, config.max_delay_ms);
        warn!(
            "'{}' failed (attempt {}/{}): {}; retrying in {} ms",
            operation_name,
            attempt,
            config.max_retries + 1,
            err,
            delay
        );
        sleep(Duration::from_millis(delay)).await;
    }
}

/// 第 `attempt` 次重试（从 1 开始）的等待时间
fn backoff_delay(attempt: u32, base_ms: u64, max_ms: u64) -> u64 {
    use rand::RngExt;
    let exp = base_ms.saturating_mul(2u64.saturating_pow(attempt.saturating_sub(1)));
    let capped = exp.min(max_ms);
    let jitter = rand::rng().random_range(0..=capped / 4);
    capped.saturating_add(jitter)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::error::{ConnAcquireErr, RuntimeErr};
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fast() -> RetryConfig {
        RetryConfig {
            max_retries: 2,
            base_delay_ms: 5,
            max_delay_ms: 20,
        }
    }

    #[test]
    fn test_connection_errors_are_retryable() {
        assert!(is_retryable_error(&DbErr::ConnectionAcquire(
            ConnAcquireErr::Timeout
        )));
        assert!(is_retryable_error(&DbErr::Conn(RuntimeErr::Internal(
            "connection reset".to_string()
        ))));
    }

    #[test]
    fn test_lock_messages_are_retryable() {
        for msg in [
            "Deadlock found when trying to get lock",
            "database is locked",
            "Lock wait timeout exceeded",
        ] {
            let err = DbErr::Exec(RuntimeErr::Internal(msg.to_string()));
            assert!(is_retryable_error(&err), "{msg}");
        }
    }

    #[test]
    fn test_logic_errors_are_not_retryable() {
        assert!(!is_retryable_error(&DbErr::RecordNotFound(
            "Server".to_string()
        )));
        assert!(!is_retryable_error(&DbErr::Query(RuntimeErr::Internal(
            "no such column: Foo".to_string()
        ))));
    }

    #[test]
    fn test_backoff_grows_and_caps() {
        assert!((100..=125).contains(&backoff_delay(1, 100, 2000)));
        assert!((400..=500).contains(&backoff_delay(3, 100, 2000)));
        assert!((2000..=2500).contains(&backoff_delay(12, 100, 2000)));
    }

    #[test]
    fn test_retry_config_from_database_config() {
        let mut db = DatabaseConfig::default();
        db.retry_count = 7;
        db.retry_base_delay_ms = 10;
        db.retry_max_delay_ms = 70;
        assert_eq!(
            RetryConfig::from(&db),
            RetryConfig {
                max_retries: 7,
                base_delay_ms: 10,
                max_delay_ms: 70
            }
        );
    }

    #[tokio::test]
    async fn test_recovers_after_transient_failures() {
        let calls = AtomicU32::new(0);
        let result = with_retry("save(1)", fast(), || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if n < 2 {
                    Err(DbErr::ConnectionAcquire(ConnAcquireErr::Timeout))
                } else {
                    Ok(5u64)
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), 5);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_gives_up_after_max_retries() {
        let calls = AtomicU32::new(0);
        let result: Result<u64, _> = with_retry("save(1)", fast(), || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(DbErr::ConnectionAcquire(ConnAcquireErr::Timeout)) }
        })
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_non_retryable_error_runs_once() {
        let calls = AtomicU32::new(0);
        let result: Result<u64, _> = with_retry("versions", fast(), || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(DbErr::Custom("syntax error".to_string())) }
        })
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
