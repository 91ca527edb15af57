//! Error types.
//!
//! Streams carry their own error type; the types here are the ones the crate
//! itself produces or signals.

use std::{convert::Infallible, time::Duration};

/// Emitted by [`timeout`](crate::observable::ObservableExt::timeout) when no
/// notification arrived in time.
///
/// Operators that can time out require `Err: From<TimeoutError>`, which keeps
/// a timing-budget failure distinguishable from an error raised by the
/// producer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("no notification within {duration:?}")]
pub struct TimeoutError {
  pub duration: Duration,
}

/// Misuse of a connectable observable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ConnectError {
  #[error("connectable observable is already connected")]
  AlreadyConnected,
}

/// Outcome of awaiting the first value of a stream.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FirstValueError<E> {
  #[error("sequence completed without a value")]
  Empty,
  #[error("sequence failed before its first value: {0}")]
  Source(E),
}

/// Failure of a wrapped service call.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CallError<E> {
  /// The service itself reported a failure.
  #[error("service call failed: {0}")]
  Failed(E),
  /// The service did not answer within the timeout budget.
  #[error("service call timed out after {0:?}")]
  TimedOut(Duration),
  /// Every attempt failed; `reason` describes the last failure.
  #[error("out of retries after {attempts} attempts: {reason}")]
  OutOfRetries { attempts: usize, reason: String },
}

impl<E> CallError<E> {
  pub fn is_timeout(&self) -> bool { matches!(self, CallError::TimedOut(_)) }
}

impl<E> From<TimeoutError> for CallError<E> {
  fn from(err: TimeoutError) -> Self { CallError::TimedOut(err.duration) }
}

/// Infallible input streams (UI events) feed straight into a call pipeline.
impl<E> From<Infallible> for CallError<E> {
  fn from(never: Infallible) -> Self { match never {} }
}
