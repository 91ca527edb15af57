//! Debounced service calls.
//!
//! [`wrap_service_call`] turns a stream of user input into a stream of
//! service results:
//!
//! ```text
//! input ─ throttle ─ distinct_until_changed ─ map(call ─ timeout ─ retry) ─ switch_on_next ─▶ results
//! ```
//!
//! * bursts of input collapse to the last value once the input was quiet for
//!   the throttle window,
//! * an input equal to the previous one is not sent again,
//! * every call is bounded by a timeout and retried a few times,
//! * a newer input cancels the call still in flight for an older one, so a
//!   stale result or a stale error never reaches the consumer.
//!
//! ```rust
//! use rxsearch::prelude::*;
//!
//! let scheduler = TestScheduler::new();
//! let mut input = Subject::<String, std::convert::Infallible>::new();
//! let results = MutArc::own(vec![]);
//! let sink = results.clone();
//!
//! let service = scheduler.clone();
//! input
//!   .clone()
//!   .call_service(
//!     move |query: String| {
//!       observable::timer::<_, String, _>(query.to_uppercase(), Duration::from_millis(50), service.clone())
//!     },
//!     scheduler.clone(),
//!     ServiceCallConfig::default(),
//!   )
//!   .subscribe(move |v| sink.rc_deref_mut().push(v));
//!
//! input.next("c".to_string());
//! input.next("ca".to_string());
//! input.next("cat".to_string());
//! scheduler.flush();
//! assert_eq!(*results.rc_deref(), vec!["CAT".to_string()]);
//! ```

use std::{
  fmt::Display,
  sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
  },
  time::Duration,
};

use crate::{
  error::CallError,
  observable::{Observable, ObservableExt},
  ops::RetryPolicy,
  rc::{MutArc, RcDerefMut},
  scheduler::Scheduler,
  subscription::{SerialSubscription, Subscription},
};

// ============================================================================
// Configuration
// ============================================================================

/// Which failures of a service call are retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RetryOn {
  /// Failures reported by the service and timeouts.
  #[default]
  Any,
  FailuresOnly,
  TimeoutsOnly,
}

impl RetryOn {
  pub fn covers<E>(self, err: &CallError<E>) -> bool {
    match err {
      CallError::Failed(_) => matches!(self, RetryOn::Any | RetryOn::FailuresOnly),
      CallError::TimedOut(_) => matches!(self, RetryOn::Any | RetryOn::TimeoutsOnly),
      CallError::OutOfRetries { .. } => false,
    }
  }
}

/// Timing and retry budget of a wrapped service call.
///
/// ```rust
/// use rxsearch::prelude::*;
///
/// let config = ServiceCallConfig::default()
///   .with_throttle(Duration::from_millis(500))
///   .with_timeout(Duration::from_millis(500))
///   .with_retry_on(RetryOn::FailuresOnly);
/// assert_eq!(config.attempts, 3);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceCallConfig {
  /// Quiet period the input needs before a call is issued.
  pub throttle: Duration,
  /// Budget of a single attempt.
  pub timeout: Duration,
  /// Total attempts per input, the first one included.
  pub attempts: usize,
  pub retry_on: RetryOn,
}

impl Default for ServiceCallConfig {
  fn default() -> Self {
    ServiceCallConfig {
      throttle: Duration::from_millis(100),
      timeout: Duration::from_millis(250),
      attempts: 3,
      retry_on: RetryOn::Any,
    }
  }
}

impl ServiceCallConfig {
  pub fn with_throttle(mut self, throttle: Duration) -> Self {
    self.throttle = throttle;
    self
  }

  pub fn with_timeout(mut self, timeout: Duration) -> Self {
    self.timeout = timeout;
    self
  }

  pub fn with_attempts(mut self, attempts: usize) -> Self {
    self.attempts = attempts;
    self
  }

  pub fn with_retry_on(mut self, retry_on: RetryOn) -> Self {
    self.retry_on = retry_on;
    self
  }

  pub fn retry_policy(&self) -> CallRetryPolicy {
    CallRetryPolicy { attempts: self.attempts, retry_on: self.retry_on }
  }
}

/// Retries the failure kinds selected by [`RetryOn`] until `attempts`
/// subscriptions were made.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallRetryPolicy {
  pub attempts: usize,
  pub retry_on: RetryOn,
}

impl<E> RetryPolicy<CallError<E>> for CallRetryPolicy {
  fn should_retry(&self, err: &CallError<E>, attempts: usize) -> bool {
    attempts < self.attempts && self.retry_on.covers(err)
  }
}

impl CallRetryPolicy {
  /// Error surfaced once retrying stopped: a retryable failure becomes
  /// [`CallError::OutOfRetries`], anything else passes through.
  fn exhausted<E: Display>(self, err: CallError<E>) -> CallError<E> {
    if !self.retry_on.covers(&err) {
      return err;
    }
    let reason = match &err {
      CallError::Failed(e) => e.to_string(),
      other => other.to_string(),
    };
    tracing::debug!(attempts = self.attempts, %reason, "service call out of retries");
    CallError::OutOfRetries { attempts: self.attempts, reason }
  }
}

// ============================================================================
// Pipeline
// ============================================================================

/// Wraps `call` behind `source`; see the module documentation for the
/// pipeline.
///
/// The result errors only when the call for the *latest* input ran out of
/// retries (or failed in a way `config.retry_on` does not retry). It is a
/// cold observable: every subscription builds its own pipeline.
pub fn wrap_service_call<S, F, R, E, SD>(
  source: S,
  call: F,
  scheduler: SD,
  config: ServiceCallConfig,
) -> impl Observable<Item = R::Item, Err = CallError<E>> + Clone + Send + 'static
where
  S: Observable + Clone + Send + 'static,
  S::Item: PartialEq + Clone + Send + 'static,
  S::Err: 'static,
  CallError<E>: From<S::Err>,
  F: Fn(S::Item) -> R + Clone + Send + 'static,
  R: Observable<Err = E> + Clone + Send + 'static,
  R::Item: 'static,
  E: Display + 'static,
  SD: Scheduler,
{
  let timeout = config.timeout;
  let policy = config.retry_policy();
  let calls = Arc::new(AtomicUsize::new(0));
  let call_scheduler = scheduler.clone();
  source
    .map_err(<CallError<E> as From<S::Err>>::from)
    .throttle(config.throttle, scheduler)
    .distinct_until_changed()
    .map(move |query: S::Item| {
      let call_id = calls.fetch_add(1, Ordering::Relaxed) + 1;
      tracing::debug!(call_id, "issuing service call");
      call(query)
        .map_err(CallError::Failed)
        .timeout(timeout, call_scheduler.clone())
        .retry(policy)
        .map_err(move |err| policy.exhausted(err))
    })
    .switch_on_next()
}

/// Method form of [`wrap_service_call`].
pub trait CallServiceExt: Observable + Clone + Send + 'static {
  fn call_service<F, R, E, SD>(
    self,
    call: F,
    scheduler: SD,
    config: ServiceCallConfig,
  ) -> impl Observable<Item = R::Item, Err = CallError<E>> + Clone + Send + 'static
  where
    Self::Item: PartialEq + Clone + Send + 'static,
    Self::Err: 'static,
    CallError<E>: From<Self::Err>,
    F: Fn(Self::Item) -> R + Clone + Send + 'static,
    R: Observable<Err = E> + Clone + Send + 'static,
    R::Item: 'static,
    E: Display + 'static,
    SD: Scheduler,
  {
    wrap_service_call(self, call, scheduler, config)
  }
}

impl<T: Observable + Clone + Send + 'static> CallServiceExt for T {}

// ============================================================================
// Result sink
// ============================================================================

/// Consumer of a service-call pipeline, typically the presentation layer.
pub trait ResultSink<T, E> {
  fn on_results(&mut self, results: T);
  fn on_error(&mut self, err: E);
}

/// Feeds `source` into `sink`.
///
/// After an error the sink is told and `source` is subscribed again, so one
/// failed search does not stop the ones that follow. A source that fails
/// synchronously on every subscription would loop forever.
pub fn bind_sink<S, K>(source: S, sink: K) -> SinkBinding
where
  S: Observable + Clone + Send + 'static,
  S::Item: 'static,
  S::Err: 'static,
  K: ResultSink<S::Item, S::Err> + Send + 'static,
{
  let binding = Binding {
    source,
    sink: MutArc::own(sink),
    current: SerialSubscription::default(),
    epoch: Arc::new(AtomicUsize::new(0)),
  };
  let handle = SinkBinding(binding.current.clone());
  binding.attach();
  handle
}

/// Keeps a [`bind_sink`] pipeline subscribed until unsubscribed.
pub struct SinkBinding(SerialSubscription);

impl Subscription for SinkBinding {
  fn unsubscribe(self) { self.0.unsubscribe() }

  fn is_closed(&self) -> bool { self.0.is_closed() }
}

struct Binding<S, K> {
  source: S,
  sink: MutArc<K>,
  current: SerialSubscription,
  epoch: Arc<AtomicUsize>,
}

impl<S: Clone, K> Clone for Binding<S, K> {
  fn clone(&self) -> Self {
    Binding {
      source: self.source.clone(),
      sink: self.sink.clone(),
      current: self.current.clone(),
      epoch: self.epoch.clone(),
    }
  }
}

impl<S, K> Binding<S, K>
where
  S: Observable + Clone + Send + 'static,
  S::Item: 'static,
  S::Err: 'static,
  K: ResultSink<S::Item, S::Err> + Send + 'static,
{
  fn attach(self) {
    let epoch = self.epoch.fetch_add(1, Ordering::AcqRel) + 1;
    let results = self.sink.clone();
    let retry = self.clone();
    let subscription = self.source.clone().subscribe_err(
      move |v| results.rc_deref_mut().on_results(v),
      move |err| {
        retry.sink.rc_deref_mut().on_error(err);
        if !retry.current.is_closed() {
          tracing::debug!("pipeline failed, resubscribing");
          retry.attach();
        }
      },
    );
    // A synchronous failure has already attached a newer subscription.
    if self.epoch.load(Ordering::Acquire) == epoch {
      self.current.replace(subscription);
    } else {
      subscription.unsubscribe();
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{
    observable,
    observer::Observer,
    rc::RcDeref,
    scheduler::TestScheduler,
    subject::Subject,
  };

  #[test]
  fn config_defaults() {
    let config = ServiceCallConfig::default();
    assert_eq!(config.throttle, Duration::from_millis(100));
    assert_eq!(config.timeout, Duration::from_millis(250));
    assert_eq!(config.attempts, 3);
    assert_eq!(config.retry_on, RetryOn::Any);
  }

  #[test]
  fn policy_respects_kind_and_budget() {
    let failed: CallError<String> = CallError::Failed("down".into());
    let timed_out: CallError<String> = CallError::TimedOut(Duration::from_millis(250));

    let any = ServiceCallConfig::default().retry_policy();
    assert!(any.should_retry(&failed, 1));
    assert!(any.should_retry(&timed_out, 2));
    assert!(!any.should_retry(&failed, 3));

    let failures = ServiceCallConfig::default().with_retry_on(RetryOn::FailuresOnly).retry_policy();
    assert!(failures.should_retry(&failed, 1));
    assert!(!failures.should_retry(&timed_out, 1));

    let timeouts = ServiceCallConfig::default().with_retry_on(RetryOn::TimeoutsOnly).retry_policy();
    assert!(!timeouts.should_retry(&failed, 1));
    assert!(timeouts.should_retry(&timed_out, 1));
  }

  #[test]
  fn exhausted_errors_are_human_readable() {
    let policy = ServiceCallConfig::default().retry_policy();
    assert_eq!(
      policy.exhausted(CallError::Failed("Error!".to_string())),
      CallError::OutOfRetries { attempts: 3, reason: "Error!".into() }
    );
    assert_eq!(
      policy.exhausted(CallError::<String>::TimedOut(Duration::from_millis(250))).to_string(),
      "out of retries after 3 attempts: service call timed out after 250ms"
    );

    let failures_only = ServiceCallConfig::default().with_retry_on(RetryOn::FailuresOnly).retry_policy();
    let timeout = CallError::<String>::TimedOut(Duration::from_millis(250));
    assert_eq!(failures_only.exhausted(timeout.clone()), timeout);
  }

  #[derive(Default)]
  struct RecordingSink {
    log: Vec<String>,
  }

  impl ResultSink<i32, String> for MutArc<RecordingSink> {
    fn on_results(&mut self, results: i32) { self.rc_deref_mut().log.push(format!("results {results}")) }

    fn on_error(&mut self, err: String) { self.rc_deref_mut().log.push(format!("error {err}")) }
  }

  #[test]
  fn sink_binding_survives_errors() {
    let mut input = Subject::<i32, String>::new();
    let recording = MutArc::own(RecordingSink::default());
    let source = input.clone().try_map(|v| if v < 0 { Err(format!("bad {v}")) } else { Ok(v) });
    let binding = bind_sink(source, recording.clone());

    input.next(1);
    input.next(-1);
    input.next(2);
    assert_eq!(recording.rc_deref().log, vec!["results 1", "error bad -1", "results 2"]);
    assert_eq!(input.subscribed_size(), 1);

    binding.unsubscribe();
    assert_eq!(input.subscribed_size(), 0);
  }

  #[test]
  fn stale_call_is_cancelled_by_newer_input() {
    let scheduler = TestScheduler::new();
    let mut input = Subject::<&'static str, std::convert::Infallible>::new();
    let calls = MutArc::own(vec![]);
    let results = MutArc::own(vec![]);
    let (c, r) = (calls.clone(), results.clone());
    let service = scheduler.clone();
    wrap_service_call(
      input.clone(),
      move |q: &'static str| {
        c.rc_deref_mut().push(q);
        observable::timer::<_, String, _>(q.len(), Duration::from_millis(200), service.clone())
      },
      scheduler.clone(),
      ServiceCallConfig::default(),
    )
    .subscribe(move |v| r.rc_deref_mut().push(v));

    input.next("ca");
    scheduler.advance_by(Duration::from_millis(150));
    input.next("cat");
    scheduler.flush();
    assert_eq!(*calls.rc_deref(), vec!["ca", "cat"]);
    assert_eq!(*results.rc_deref(), vec![3]);
  }
}
