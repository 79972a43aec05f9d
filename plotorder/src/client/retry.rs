//! Retry policy for remote API calls.
//!
//! Every call to the order service is wrapped by a policy: a failed attempt
//! either earns a fixed backoff and another try, or exhausts the budget and
//! surfaces the final error to the caller as a value. Nothing is thrown past
//! the gateway boundary.

use std::time::Duration;

/// Default number of attempts for a remote call (including the first).
pub const DEFAULT_RETRY_ATTEMPTS: u32 = 5;

/// Default backoff between two attempts.
pub const DEFAULT_RETRY_DELAY_SECS: u64 = 10;

/// How a remote call handles failures.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RetryPolicy {
    /// No retries - fail on the first error.
    None,

    /// Fixed number of attempts with a constant delay between them.
    Fixed {
        /// Maximum number of attempts (including the initial attempt).
        max_attempts: u32,
        /// Delay between attempts.
        delay: Duration,
    },
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::Fixed {
            max_attempts: DEFAULT_RETRY_ATTEMPTS,
            delay: Duration::from_secs(DEFAULT_RETRY_DELAY_SECS),
        }
    }
}

impl RetryPolicy {
    /// Creates a fixed retry policy.
    pub fn fixed(max_attempts: u32, delay: Duration) -> Self {
        Self::Fixed {
            max_attempts,
            delay,
        }
    }

    /// Returns the delay before the next attempt, or `None` when the budget
    /// is exhausted.
    ///
    /// `attempt` is 1-based: passing 1 asks whether a second attempt is
    /// allowed after the first failure.
    pub fn delay_for_attempt(&self, attempt: u32) -> Option<Duration> {
        match self {
            Self::None => None,
            Self::Fixed {
                max_attempts,
                delay,
            } => {
                if attempt < *max_attempts {
                    Some(*delay)
                } else {
                    None
                }
            }
        }
    }

    /// Maximum number of attempts for this policy.
    pub fn max_attempts(&self) -> u32 {
        match self {
            Self::None => 1,
            Self::Fixed { max_attempts, .. } => *max_attempts,
        }
    }
}
