//! Composition of caller cancellation and request timeout.

use std::future::pending;
use std::time::Duration;

use tokio::time::{Instant, sleep_until};
use tokio_util::sync::CancellationToken;

/// Which source ended a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalReason {
    /// The caller's token was cancelled.
    External,
    /// The request deadline passed.
    Timeout,
}

/// Logical OR of an external token and a deadline.
///
/// Either side may be absent. With neither, [`fired`](Self::fired) never
/// resolves. The deadline is fixed when the signal is composed, so compose
/// it right before the request goes out.
#[derive(Debug, Clone)]
pub struct RequestSignal {
    external: Option<CancellationToken>,
    deadline: Option<Instant>,
}

impl RequestSignal {
    pub fn compose(external: Option<CancellationToken>, timeout: Option<Duration>) -> Self {
        Self {
            external,
            deadline: timeout.map(|t| Instant::now() + t),
        }
    }

    /// Resolves when either source fires. External cancellation wins ties.
    pub async fn fired(&self) -> SignalReason {
        let external = async {
            match &self.external {
                Some(token) => token.cancelled().await,
                None => pending().await,
            }
        };
        let timeout = async {
            match self.deadline {
                Some(deadline) => sleep_until(deadline).await,
                None => pending().await,
            }
        };

        tokio::select! {
            biased;
            _ = external => SignalReason::External,
            _ = timeout => SignalReason::Timeout,
        }
    }

    /// Non-blocking check.
    pub fn check(&self) -> Option<SignalReason> {
        if self.external.as_ref().is_some_and(|t| t.is_cancelled()) {
            Some(SignalReason::External)
        } else if self.deadline.is_some_and(|d| Instant::now() >= d) {
            Some(SignalReason::Timeout)
        } else {
            None
        }
    }
}
