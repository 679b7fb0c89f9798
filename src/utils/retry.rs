//! 带指数退避的重试
//!
//! 第 n 次失败后等待 `delay_ms × 2^(n-1)`，第一次重试恰好等待 `delay_ms`。
//! 本模块不做任何回滚，操作是否可重复执行由调用方负责。

use std::future::Future;
use std::time::Duration;

use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::error::{AppError, AppResult};

/// 重试配置
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryConfig {
    /// 最大尝试次数（包含第一次），至少为 1
    pub max_retries: u32,
    /// 基础等待时间（毫秒）
    pub delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            delay_ms: 2000,
        }
    }
}

/// 重试策略
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    config: RetryConfig,
}

impl RetryPolicy {
    pub fn new(config: RetryConfig) -> Self {
        Self { config }
    }

    /// 实际生效的尝试次数
    pub fn max_attempts(&self) -> u32 {
        self.config.max_retries.max(1)
    }

    /// 第 `attempt` 次失败之后的等待时间
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(31);
        Duration::from_millis(self.config.delay_ms.saturating_mul(1u64 << exponent))
    }

    /// 执行操作，失败时按指数退避重试
    ///
    /// # 参数
    /// - `operation`: 每次尝试都会重新调用的异步操作
    /// - `label`: 用于日志和最终错误的操作名称
    ///
    /// # 返回
    /// 任意一次成功即返回结果；全部失败时返回 `AppError::RetryExhausted`，
    /// 其中包装最后一次的错误
    pub async fn execute<T, F, Fut>(&self, mut operation: F, label: &str) -> AppResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = AppResult<T>>,
    {
        let max_attempts = self.max_attempts();
        let mut attempt = 1;

        loop {
            debug!("{}: 第 {}/{} 次尝试", label, attempt, max_attempts);

            match operation().await {
                Ok(value) => {
                    if attempt > 1 {
                        info!("{}: 第 {} 次尝试成功", label, attempt);
                    }
                    return Ok(value);
                }
                Err(e) => {
                    warn!("{}: 第 {}/{} 次尝试失败: {}", label, attempt, max_attempts, e);

                    if attempt >= max_attempts {
                        return Err(AppError::RetryExhausted {
                            label: label.to_string(),
                            attempts: max_attempts,
                            source: Box::new(e),
                        });
                    }

                    let delay = self.backoff_delay(attempt);
                    if !delay.is_zero() {
                        debug!("{}: 等待 {}ms 后重试", label, delay.as_millis());
                        sleep(delay).await;
                    }
                    attempt += 1;
                }
            }
        }
    }
}
