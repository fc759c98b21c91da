//! Bounded polling with exponential backoff
//!
//! Used for the readiness wait after a workload is submitted.

use std::future::Future;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::Instant;

/// How long and how often to poll
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    /// Overall deadline measured from the first attempt
    pub timeout: Duration,
    /// Delay after the first unsuccessful attempt
    pub initial_interval: Duration,
    /// Upper bound on any single delay
    pub max_interval: Duration,
    /// Multiplier applied to the delay after each attempt
    pub backoff_factor: f64,
}

impl RetryPolicy {
    pub fn new(timeout: Duration, initial_interval: Duration, max_interval: Duration) -> Self {
        Self {
            timeout,
            initial_interval,
            max_interval: max_interval.max(initial_interval),
            backoff_factor: 2.0,
        }
    }

    /// Delay to use after `current`
    pub fn next_delay(&self, current: Duration) -> Duration {
        current.mul_f64(self.backoff_factor).min(self.max_interval)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(
            Duration::from_secs(120),
            Duration::from_secs(1),
            Duration::from_secs(5),
        )
    }
}

/// Why polling stopped without a value
#[derive(Debug, PartialEq)]
pub enum PollError<E> {
    /// Deadline passed; carries the number of attempts made
    TimedOut { attempts: u32 },
    /// Cancellation signal observed
    Cancelled,
    /// The probe itself failed
    Failed(E),
}

/// Run `probe` until it yields `Some`, the deadline passes, or `cancel` flips to `true`
///
/// A probe error ends polling immediately. A dropped cancellation sender is
/// treated as "never cancelled".
pub async fn poll_until<T, E, F, Fut>(
    policy: &RetryPolicy,
    mut cancel: watch::Receiver<bool>,
    mut probe: F,
) -> Result<T, PollError<E>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Option<T>, E>>,
{
    let deadline = Instant::now() + policy.timeout;
    let mut delay = policy.initial_interval;
    let mut attempts = 0u32;

    loop {
        if *cancel.borrow() {
            return Err(PollError::Cancelled);
        }

        attempts += 1;
        match probe().await {
            Ok(Some(value)) => return Ok(value),
            Ok(None) => {}
            Err(e) => return Err(PollError::Failed(e)),
        }

        let now = Instant::now();
        if now >= deadline {
            return Err(PollError::TimedOut { attempts });
        }

        tokio::select! {
            _ = tokio::time::sleep(delay.min(deadline - now)) => {}
            _ = cancelled(&mut cancel) => return Err(PollError::Cancelled),
        }

        delay = policy.next_delay(delay);
    }
}

async fn cancelled(rx: &mut watch::Receiver<bool>) {
    let closed = rx.wait_for(|stop| *stop).await.is_err();
    if closed {
        std::future::pending::<()>().await;
    }
}
