//! Byte-rate throttling for streamed transfers

use crate::config::parse_rate_limit;
use crate::ConfigResult;
use futures_util::stream::{self, Stream, StreamExt};
use std::time::Duration;
use tokio::time::Instant;

/// Throttles a byte stream to a target average throughput
///
/// After every chunk of `n` bytes the limiter computes how long `n` bytes
/// should take at the configured rate. If less time has passed since the
/// previous chunk, the calling task sleeps for the difference. Only the
/// calling task is suspended; other transfers keep running.
#[derive(Debug, Clone)]
pub struct RateLimiter {
    bytes_per_sec: u64,
    last_read: Instant,
}

impl RateLimiter {
    /// Creates a limiter for the given rate; a rate of zero disables limiting
    pub fn new(bytes_per_sec: u64) -> Self {
        Self {
            bytes_per_sec,
            last_read: Instant::now(),
        }
    }

    /// Creates a pass-through limiter
    pub fn unlimited() -> Self {
        Self::new(0)
    }

    /// Builds a limiter from an optional rate-limit string such as `200k`
    ///
    /// # Arguments
    ///
    /// * `spec` - The rate string, or `None` for no limit
    ///
    /// # Returns
    ///
    /// * `Ok(RateLimiter)` - The limiter, unlimited for `None`, empty or `0`
    /// * `Err(ConfigError)` - The string is malformed
    pub fn from_spec(spec: Option<&str>) -> ConfigResult<Self> {
        match spec {
            Some(s) => Ok(Self::new(parse_rate_limit(s)?)),
            None => Ok(Self::unlimited()),
        }
    }

    pub fn bytes_per_sec(&self) -> u64 {
        self.bytes_per_sec
    }

    pub fn is_unlimited(&self) -> bool {
        self.bytes_per_sec == 0
    }

    /// Time `n` bytes should take at the configured rate
    pub fn expected_duration(&self, n: usize) -> Duration {
        if self.is_unlimited() {
            return Duration::ZERO;
        }
        Duration::from_secs_f64(n as f64 / self.bytes_per_sec as f64)
    }

    /// Accounts for `n` freshly read bytes, sleeping if they arrived too fast
    pub async fn pace(&mut self, n: usize) {
        if self.is_unlimited() {
            return;
        }

        let expected = self.expected_duration(n);
        let elapsed = self.last_read.elapsed();
        if elapsed < expected {
            tokio::time::sleep(expected - elapsed).await;
        }
        self.last_read = Instant::now();
    }

    /// Wraps a chunked byte stream so that it yields no faster than the rate
    ///
    /// Chunks are passed through unchanged; errors are forwarded without
    /// pacing.
    pub fn throttle<S, B, E>(self, stream: S) -> impl Stream<Item = Result<B, E>>
    where
        S: Stream<Item = Result<B, E>>,
        B: AsRef<[u8]>,
    {
        stream::unfold(
            (Box::pin(stream), self),
            |(mut inner, mut limiter)| async move {
                let item = inner.next().await?;
                if let Ok(chunk) = &item {
                    limiter.pace(chunk.as_ref().len()).await;
                }
                Some((item, (inner, limiter)))
            },
        )
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::unlimited()
    }
}
