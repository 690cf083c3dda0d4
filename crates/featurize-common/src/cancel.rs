//! Cancellation and deadline token threaded through every store call.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use crate::error::{FeaturizeError, Result};

/// Cooperative cancellation handle with an optional deadline.
///
/// Clones share the same flag, so a signal handler can cancel a resolution
/// running on another thread.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
    deadline: Option<Instant>,
}

impl CancelToken {
    /// Creates a token that is never cancelled unless [`cancel`](Self::cancel) is called.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a token sharing this one's flag and expiring after `timeout`.
    #[must_use]
    pub fn with_timeout(&self, timeout: Duration) -> Self {
        Self {
            flag: Arc::clone(&self.flag),
            deadline: Instant::now().checked_add(timeout),
        }
    }

    /// Requests cancellation for every clone of this token.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    /// Returns `true` once cancelled or past the deadline.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst) || self.deadline.is_some_and(|d| Instant::now() >= d)
    }

    /// Time left before the deadline, if one is set.
    #[must_use]
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|d| d.saturating_duration_since(Instant::now()))
    }

    /// Fails with [`FeaturizeError::Cancelled`] when the token has fired.
    ///
    /// # Errors
    ///
    /// Returns `Cancelled` if cancellation was requested or the deadline passed.
    pub fn check(&self) -> Result<()> {
        if self.flag.load(Ordering::SeqCst) {
            return Err(FeaturizeError::Cancelled {
                feature: None,
                reason: "cancellation requested".into(),
            });
        }
        if self.deadline.is_some_and(|d| Instant::now() >= d) {
            return Err(FeaturizeError::Cancelled {
                feature: None,
                reason: "deadline exceeded".into(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_token_passes() {
        let token = CancelToken::new();
        assert!(!token.is_cancelled());
        assert!(token.check().is_ok());
        assert!(token.remaining().is_none());
    }

    #[test]
    fn cancel_is_visible_through_clones() {
        let token = CancelToken::new();
        let clone = token.clone();
        token.cancel();
        assert!(clone.is_cancelled());
        let err = clone.check().unwrap_err();
        assert!(err.to_string().contains("cancellation requested"));
    }

    #[test]
    fn elapsed_deadline_cancels() {
        let token = CancelToken::new().with_timeout(Duration::ZERO);
        assert!(token.is_cancelled());
        assert!(matches!(
            token.check(),
            Err(FeaturizeError::Cancelled { .. })
        ));
    }

    #[test]
    fn timeout_shares_flag_with_parent() {
        let parent = CancelToken::new();
        let child = parent.with_timeout(Duration::from_secs(3600));
        assert!(child.remaining().is_some());
        parent.cancel();
        assert!(child.is_cancelled());
    }
}
