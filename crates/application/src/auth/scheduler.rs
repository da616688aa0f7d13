//! Proactive token refresh scheduling.
//!
//! The scheduler arms a one-shot timer at a fraction of the access token's
//! remaining lifetime so that the common case never sees a 401.

use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use ecoroute_domain::DomainResult;
use tokio::task::JoinHandle;

use crate::ports::{Clock, TokenDecoder};

/// Fraction of the token lifetime after which the refresh fires.
pub const DEFAULT_REFRESH_THRESHOLD: f64 = 0.8;

/// Handle to an armed refresh timer.
///
/// Cancelling or dropping the handle disarms the timer. A callback that has
/// already started keeps running.
#[derive(Debug)]
pub struct RefreshTimer {
    handle: JoinHandle<()>,
    delay: Duration,
}

impl RefreshTimer {
    /// Delay the timer was armed with.
    #[must_use]
    pub const fn delay(&self) -> Duration {
        self.delay
    }

    /// Returns true while the timer has not fired or been cancelled.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        !self.handle.is_finished()
    }

    /// Disarm the timer.
    pub fn cancel(&self) {
        self.handle.abort();
    }
}

impl Drop for RefreshTimer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Arms refresh timers from access tokens.
pub struct RefreshScheduler {
    decoder: Arc<dyn TokenDecoder>,
    clock: Arc<dyn Clock>,
    threshold: f64,
    timer: Mutex<Option<RefreshTimer>>,
}

impl std::fmt::Debug for RefreshScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RefreshScheduler")
            .field("threshold", &self.threshold)
            .field("armed", &self.is_armed())
            .finish_non_exhaustive()
    }
}

impl RefreshScheduler {
    /// Create a scheduler with the default threshold.
    #[must_use]
    pub fn new(decoder: Arc<dyn TokenDecoder>, clock: Arc<dyn Clock>) -> Self {
        Self {
            decoder,
            clock,
            threshold: DEFAULT_REFRESH_THRESHOLD,
            timer: Mutex::new(None),
        }
    }

    /// Use a different lifetime fraction. Values outside `(0, 1]` fall back
    /// to the default.
    #[must_use]
    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = if threshold > 0.0 && threshold <= 1.0 {
            threshold
        } else {
            DEFAULT_REFRESH_THRESHOLD
        };
        self
    }

    /// The configured lifetime fraction.
    #[must_use]
    pub const fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Delay before a refresh is due for `access_token`.
    ///
    /// # Errors
    ///
    /// Returns an error if the token cannot be decoded.
    pub fn delay_for(&self, access_token: &str) -> DomainResult<Duration> {
        let claims = self.decoder.decode(access_token)?;
        let remaining = claims.ttl(self.clock.now()).to_std().unwrap_or_default();
        Ok(remaining.mul_f64(self.threshold))
    }

    /// Arm a timer that runs `on_due` once the refresh is due.
    ///
    /// Any previously armed timer is cancelled first. Returns the delay, or
    /// `None` when the token has no lifetime left and nothing was scheduled.
    ///
    /// # Errors
    ///
    /// Returns an error if the token cannot be decoded. The previous timer
    /// is cancelled either way.
    pub fn start<F, Fut>(&self, access_token: &str, on_due: F) -> DomainResult<Option<Duration>>
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.stop();

        let delay = self.delay_for(access_token)?;
        if delay.is_zero() {
            tracing::debug!("Token already expired, proactive refresh not scheduled");
            return Ok(None);
        }

        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            tracing::debug!("Proactive refresh due");
            // Runs detached so re-arming from inside the callback cannot abort it.
            tokio::spawn(on_due());
        });

        tracing::debug!(delay_secs = delay.as_secs_f64(), "Proactive refresh scheduled");
        *self.slot() = Some(RefreshTimer { handle, delay });
        Ok(Some(delay))
    }

    /// Cancel the pending timer, if any.
    pub fn stop(&self) {
        if let Some(timer) = self.slot().take() {
            timer.cancel();
            tracing::debug!("Proactive refresh cancelled");
        }
    }

    /// Returns true while a timer is pending.
    #[must_use]
    pub fn is_armed(&self) -> bool {
        self.slot().as_ref().is_some_and(RefreshTimer::is_pending)
    }

    fn slot(&self) -> std::sync::MutexGuard<'_, Option<RefreshTimer>> {
        self.timer.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for RefreshScheduler {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::{DateTime, Utc};
    use ecoroute_domain::{DomainError, TokenClaims};
    use pretty_assertions::assert_eq;
    use tokio::sync::mpsc;

    /// Tokens are `"<name>@<exp>"`.
    struct ExpDecoder;

    impl TokenDecoder for ExpDecoder {
        fn decode(&self, token: &str) -> DomainResult<TokenClaims> {
            let exp = token
                .rsplit_once('@')
                .and_then(|(_, exp)| exp.parse().ok())
                .ok_or_else(|| DomainError::InvalidToken(token.to_string()))?;
            Ok(TokenClaims {
                sub: "user".to_string(),
                email: "user@example.com".to_string(),
                token_type: "access".to_string(),
                jti: token.to_string(),
                iat: 0,
                exp,
            })
        }
    }

    struct Epoch;

    impl Clock for Epoch {
        fn now(&self) -> DateTime<Utc> {
            DateTime::UNIX_EPOCH
        }
    }

    fn scheduler() -> RefreshScheduler {
        RefreshScheduler::new(Arc::new(ExpDecoder), Arc::new(Epoch))
    }

    #[test]
    fn test_threshold_is_clamped_to_default() {
        assert_eq!(scheduler().with_threshold(0.5).threshold(), 0.5);
        assert_eq!(scheduler().with_threshold(0.0).threshold(), 0.8);
        assert_eq!(scheduler().with_threshold(1.5).threshold(), 0.8);
    }

    #[test]
    fn test_delay_is_fraction_of_remaining_lifetime() {
        let delay = scheduler().delay_for("a@1000").unwrap();
        assert_eq!(delay, Duration::from_secs(800));
    }

    #[test]
    fn test_undecodable_token_is_an_error() {
        assert!(scheduler().delay_for("garbage").is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_fires_at_eighty_percent_of_lifetime() {
        let scheduler = scheduler();
        let (tx, mut rx) = mpsc::unbounded_channel();

        let delay = scheduler
            .start("a@1000", move || async move {
                tx.send(()).unwrap();
            })
            .unwrap();
        assert_eq!(delay, Some(Duration::from_secs(800)));

        tokio::time::sleep(Duration::from_secs(799)).await;
        assert!(rx.try_recv().is_err());
        assert!(scheduler.is_armed());

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert!(rx.try_recv().is_ok());
        assert!(!scheduler.is_armed());
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_prevents_callback() {
        let scheduler = scheduler();
        let (tx, mut rx) = mpsc::unbounded_channel();

        scheduler
            .start("a@1000", move || async move {
                tx.send(()).unwrap();
            })
            .unwrap();
        tokio::time::sleep(Duration::from_secs(500)).await;
        scheduler.stop();
        scheduler.stop();

        tokio::time::sleep(Duration::from_secs(1000)).await;
        assert!(rx.try_recv().is_err());
        assert!(!scheduler.is_armed());
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_replaces_pending_timer() {
        let scheduler = scheduler();
        let (tx, mut rx) = mpsc::unbounded_channel();

        let first = tx.clone();
        scheduler
            .start("a@100", move || async move {
                first.send("first").unwrap();
            })
            .unwrap();
        scheduler
            .start("b@1000", move || async move {
                tx.send("second").unwrap();
            })
            .unwrap();

        tokio::time::sleep(Duration::from_secs(801)).await;
        assert_eq!(rx.try_recv().unwrap(), "second");
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_expired_token_schedules_nothing() {
        let scheduler = scheduler();
        let armed = scheduler.start("a@0", || async {}).unwrap();
        assert_eq!(armed, None);
        assert!(!scheduler.is_armed());
    }
}
