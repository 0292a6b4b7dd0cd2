//! Time budgets for bounded operations

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;
use thiserror::Error;
use tokio::time::Instant;

/// Returned when a bounded operation runs past its deadline.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("deadline of {}ms exceeded", .0.as_millis())]
pub struct DeadlineExceeded(pub Duration);

/// An absolute point in time after which a bounded operation is abandoned.
///
/// Deadlines are plain values: deriving one never shortens another, so two
/// deadlines created back to back with `Deadline::after` each get their full
/// budget regardless of how long the work under the first one took.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Deadline {
    at: Instant,
    budget: Duration,
}

impl Deadline {
    /// Creates a deadline `budget` from now.
    pub fn after(budget: Duration) -> Self {
        Self::since(Instant::now(), budget)
    }

    /// Creates a deadline `budget` after `start`, which may lie in the past.
    pub fn since(start: Instant, budget: Duration) -> Self {
        Self {
            at: start + budget,
            budget,
        }
    }

    pub fn budget(&self) -> Duration {
        self.budget
    }

    pub fn instant(&self) -> Instant {
        self.at
    }

    /// Time left before expiry, zero once expired.
    pub fn remaining(&self) -> Duration {
        self.at.saturating_duration_since(Instant::now())
    }

    pub fn is_expired(&self) -> bool {
        Instant::now() >= self.at
    }

    /// Runs `fut` until it completes or the deadline passes.
    ///
    /// An already expired deadline never starts `fut`. On expiry the future is
    /// dropped, so whatever it held (a pooled connection, a prepared statement)
    /// is released before this returns.
    pub async fn run<F>(&self, fut: F) -> Result<F::Output, DeadlineExceeded>
    where
        F: Future,
    {
        if self.is_expired() {
            return Err(DeadlineExceeded(self.budget));
        }
        tokio::time::timeout_at(self.at, fut)
            .await
            .map_err(|_| DeadlineExceeded(self.budget))
    }
}

impl Display for Deadline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}ms", self.budget.as_millis())
    }
}
