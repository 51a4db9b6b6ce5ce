use rand::Rng;
use std::fmt::Display;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

/// Retry policy shared by every network-facing operation.
///
/// `max_attempts` counts the first call, so `max_attempts = 3` means at most
/// three invocations of the operation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
    pub exponential_base: f64,
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 1000,
            max_delay_ms: 30000,
            exponential_base: 2.0,
            jitter: true,
        }
    }
}

impl RetryConfig {
    pub fn new(max_attempts: u32, base_delay_ms: u64) -> Self {
        Self {
            max_attempts,
            base_delay_ms,
            max_delay_ms: base_delay_ms * 30,
            ..Default::default()
        }
    }

    /// Constant delay between attempts, no jitter.
    pub fn fixed(max_attempts: u32, delay: Duration) -> Self {
        let delay_ms = delay.as_millis() as u64;
        Self {
            max_attempts,
            base_delay_ms: delay_ms,
            max_delay_ms: delay_ms,
            exponential_base: 1.0,
            jitter: false,
        }
    }

    pub fn with_max_delay(mut self, max_delay_ms: u64) -> Self {
        self.max_delay_ms = max_delay_ms;
        self
    }

    pub fn without_jitter(mut self) -> Self {
        self.jitter = false;
        self
    }

    pub fn calculate_delay(&self, attempt: u32) -> Duration {
        let delay_ms = self.base_delay_ms as f64 * self.exponential_base.powi(attempt as i32);
        let delay_ms = delay_ms.min(self.max_delay_ms as f64);

        let delay_ms = if self.jitter {
            let rng_factor = rand::thread_rng().gen_range(0.5..=1.5);
            delay_ms * rng_factor
        } else {
            delay_ms
        };

        Duration::from_millis(delay_ms as u64)
    }
}

/// Runs `operation` until it succeeds or the attempt budget is spent.
pub async fn with_retry<T, E, F, Fut>(
    config: RetryConfig,
    operation_name: &str,
    operation: F,
) -> Result<T, E>
where
    E: Display,
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    with_retry_if(config, operation_name, operation, |_| true).await
}

/// Like [`with_retry`], but only errors accepted by `should_retry` are
/// retried. Any other error is returned immediately.
pub async fn with_retry_if<T, E, F, Fut, P>(
    config: RetryConfig,
    operation_name: &str,
    operation: F,
    should_retry: P,
) -> Result<T, E>
where
    E: Display,
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    P: Fn(&E) -> bool,
{
    let max_attempts = config.max_attempts.max(1);
    let mut attempt = 0;

    loop {
        attempt += 1;
        match operation().await {
            Ok(result) => {
                if attempt > 1 {
                    debug!("{} succeeded on attempt {}", operation_name, attempt);
                }
                return Ok(result);
            }
            Err(e) if attempt < max_attempts && should_retry(&e) => {
                let delay = config.calculate_delay(attempt - 1);
                warn!(
                    "{} failed (attempt {}/{}). Retrying in {:?}: {}",
                    operation_name, attempt, max_attempts, delay, e
                );
                tokio::time::sleep(delay).await;
            }
            Err(e) => {
                debug!(
                    "{} giving up after {} attempt(s): {}",
                    operation_name, attempt, e
                );
                return Err(e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_delay_is_constant() {
        let config = RetryConfig::fixed(3, Duration::from_secs(5));
        assert_eq!(config.calculate_delay(0), Duration::from_secs(5));
        assert_eq!(config.calculate_delay(1), Duration::from_secs(5));
        assert_eq!(config.calculate_delay(7), Duration::from_secs(5));
    }

    #[test]
    fn test_exponential_delay_is_capped() {
        let config = RetryConfig::new(5, 100).without_jitter().with_max_delay(250);
        assert_eq!(config.calculate_delay(0), Duration::from_millis(100));
        assert_eq!(config.calculate_delay(1), Duration::from_millis(200));
        assert_eq!(config.calculate_delay(2), Duration::from_millis(250));
    }
}
