#[cfg(test)]
use std::cell::RefCell;
use std::time::Duration;

use tracing::warn;

use crate::config::RetryConfig;
use crate::error::{MigrateError, Result};

/// 대기 동작을 추상화한다. 테스트에서는 실제로 잠들지 않는 구현을 쓴다.
pub trait Sleeper {
    fn sleep(&self, duration: Duration);
}

pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// 요청된 대기 시간만 기록하는 Sleeper.
#[cfg(test)]
#[derive(Default)]
pub struct RecordingSleeper {
    slept: RefCell<Vec<Duration>>,
}

#[cfg(test)]
impl RecordingSleeper {
    pub fn slept(&self) -> Vec<Duration> {
        self.slept.borrow().clone()
    }
}

#[cfg(test)]
impl Sleeper for RecordingSleeper {
    fn sleep(&self, duration: Duration) {
        self.slept.borrow_mut().push(duration);
    }
}

/// 요청 하나에 적용되는 재시도 정책.
/// n번째 실패 후 대기 시간은 `multiplier * 2^(n-1)`을 `[min_delay, max_delay]`로 자른 값이다.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub multiplier: Duration,
    pub min_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            multiplier: Duration::from_secs(1),
            min_delay: Duration::from_secs(4),
            max_delay: Duration::from_secs(10),
        }
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(cfg: &RetryConfig) -> Self {
        Self {
            max_attempts: cfg.max_attempts.max(1),
            multiplier: Duration::from_millis(cfg.multiplier_ms),
            min_delay: Duration::from_millis(cfg.min_delay_ms),
            max_delay: Duration::from_millis(cfg.max_delay_ms.max(cfg.min_delay_ms)),
        }
    }
}

impl RetryPolicy {
    /// `attempt`번째 시도가 실패한 뒤 기다릴 시간 (1부터 시작).
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let exp = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.multiplier
            .saturating_mul(exp)
            .clamp(self.min_delay, self.max_delay)
    }

    /// 재시도 가능한 오류가 나면 정책에 따라 다시 시도한다.
    /// 재시도할 수 없는 오류나 마지막 시도의 오류는 그대로 반환한다.
    pub fn run<T, F>(&self, sleeper: &dyn Sleeper, mut op: F) -> Result<T>
    where
        F: FnMut() -> Result<T>,
    {
        let mut attempt = 1;
        loop {
            match op() {
                Ok(value) => return Ok(value),
                Err(e) if e.is_retryable() && attempt < self.max_attempts => {
                    let backoff = self.delay_after(attempt);
                    warn!(
                        attempt,
                        max_attempts = self.max_attempts,
                        backoff_ms = backoff.as_millis() as u64,
                        error = %e,
                        "http.retry"
                    );
                    sleeper.sleep(backoff);
                    attempt += 1;
                }
                Err(e) => return Err(exhausted(e, attempt)),
            }
        }
    }
}

fn exhausted(e: MigrateError, attempts: u32) -> MigrateError {
    match e {
        MigrateError::Transport { status, message } if attempts > 1 => MigrateError::Transport {
            status,
            message: format!("{message} (after {attempts} attempts)"),
        },
        other => other,
    }
}
