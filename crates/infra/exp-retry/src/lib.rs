#![deny(clippy::all)]
#![deny(missing_docs)]

//! # `exp-retry`
//!
//! Exponential backoff retry helper with cancellation and deadline support.
//!
//! An operation is called repeatedly. After each call it reports through
//! [`Attempt`] whether to try again. Between attempts the caller's
//! [`RetryContext`] is checked and the thread (or task) sleeps for an interval
//! that grows geometrically.
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::time::Duration;
//! use exp_retry::{Attempt, ExpTimer, RetryContext};
//!
//! # fn fetch() -> Result<String, std::io::Error> { Ok(String::new()) }
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let ctx = RetryContext::background().with_timeout(Duration::from_secs(30));
//! let mut timer = ExpTimer::new(Duration::from_millis(100), 2.0);
//!
//! let body = timer.retry(&ctx, || {
//!     Attempt::retry_if(fetch(), |e| e.kind() == std::io::ErrorKind::TimedOut)
//! })?;
//! # let _ = body;
//! # Ok(())
//! # }
//! ```
//!
//! ## Async
//!
//! [`ExpTimer::retry_async`] and [`retry_async`] race the backoff sleep
//! against cancellation, so a cancelled context ends the wait immediately.
//! The blocking [`ExpTimer::retry`] only checks the context between attempts.
//!
//! ## Configuration
//!
//! [`TimerConfig`] can be deserialized or read from the environment
//! (`EXP_RETRY_INTERVAL_MS`, `EXP_RETRY_MULTIPLIER`).

/// The typed report of one operation call
pub mod attempt;
/// Timer configuration
pub mod config;
/// Cancellation context
pub mod context;
/// Error types
pub mod error;
/// Async retry loop
pub mod future;
/// Backoff timer and the blocking retry loop
pub mod timer;

pub use crate::attempt::Attempt;
pub use crate::config::TimerConfig;
pub use crate::context::RetryContext;
pub use crate::error::{ConfigError, ContextError, RetryError};
pub use crate::future::retry_async;
pub use crate::timer::{DEFAULT_INITIAL_INTERVAL, DEFAULT_MULTIPLIER, ExpTimer, retry};

/// Re-exported so callers can build contexts from their own tokens.
pub use tokio_util::sync::CancellationToken;
