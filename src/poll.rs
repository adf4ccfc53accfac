// Operation polling with bounded, exponentially increasing retries.

use crate::api::{AssetApi, OperationStatus};
use crate::error::UploaderError;
use crate::model::{PendingOperation, Resolution};
use std::time::Duration;

/// Retry budget and delay schedule for polling an operation.
///
/// Delay before attempt `n + 1` is `initial_delay * multiplier^(n - 1)`,
/// capped at `max_delay`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BackoffPolicy {
    /// Total get-operation calls allowed per poll.
    pub max_attempts: u32,
    pub initial_delay: Duration,
    pub multiplier: f64,
    pub max_delay: Duration,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            initial_delay: Duration::from_secs(3),
            multiplier: 2.0,
            max_delay: Duration::from_secs(60),
        }
    }
}

impl BackoffPolicy {
    /// Delay to wait after the given zero-based attempt.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let secs = self.initial_delay.as_secs_f64() * self.multiplier.max(1.0).powi(attempt as i32);
        let capped = secs.min(self.max_delay.as_secs_f64());
        Duration::from_secs_f64(capped)
    }
}

/// Polls operations through an [`AssetApi`] until they finish or the
/// budget runs out.
pub struct Poller<A> {
    api: A,
    policy: BackoffPolicy,
    sleep: Box<dyn Fn(Duration)>,
}

impl<A: AssetApi> Poller<A> {
    pub fn new(api: A, policy: BackoffPolicy) -> Self {
        Self {
            api,
            policy,
            sleep: Box::new(std::thread::sleep),
        }
    }

    /// Replace the blocking sleep between attempts.
    pub fn with_sleeper(mut self, sleep: impl Fn(Duration) + 'static) -> Self {
        self.sleep = Box::new(sleep);
        self
    }

    pub fn policy(&self) -> &BackoffPolicy {
        &self.policy
    }

    /// Poll one operation to a terminal state or until the attempt budget
    /// is spent. No delay follows the final attempt.
    pub fn poll(&self, op: &PendingOperation) -> Resolution {
        let max = self.policy.max_attempts;

        for attempt in 1..=max {
            match self.api.get_operation(&op.operation_url) {
                Ok(OperationStatus::Done { asset_id: Some(asset_id) }) => {
                    tracing::info!(name = %op.name, asset_id = %asset_id, attempt, "Operation resolved");
                    return Resolution::Resolved { asset_id };
                }
                Ok(OperationStatus::Done { asset_id: None }) => {
                    tracing::error!(name = %op.name, attempt, "Operation done but no asset id");
                    return Resolution::Errored {
                        reason: UploaderError::MissingResult.to_string(),
                    };
                }
                Ok(OperationStatus::Pending) => {
                    tracing::info!(name = %op.name, attempt, max_attempts = max, "Not done yet");
                }
                Err(e) if e.is_retryable() => {
                    tracing::warn!(name = %op.name, attempt, max_attempts = max, error = %e, "Polling attempt failed");
                }
                Err(e) => {
                    tracing::error!(name = %op.name, attempt, error = %e, "Polling failed permanently");
                    return Resolution::Errored { reason: e.to_string() };
                }
            }

            if attempt < max {
                let delay = self.policy.delay_for_attempt(attempt - 1);
                tracing::debug!(name = %op.name, wait_ms = delay.as_millis() as u64, "Waiting before next poll");
                (self.sleep)(delay);
            }
        }

        tracing::warn!(name = %op.name, max_attempts = max, "Max poll attempts reached");
        Resolution::Unresolved(op.clone())
    }
}
