use std::sync::{
  atomic::{AtomicUsize, Ordering},
  Arc,
};

use parking_lot::Mutex;

use crate::{
  observable::Observable,
  observer::Observer,
  rc::SharedObserver,
  subscription::{SerialSubscription, SharedSubscription, Subscription},
};

/// Decides whether a failed subscription is resubscribed.
pub trait RetryPolicy<Err>: Clone + Send + 'static {
  /// `attempts` is the number of subscriptions made so far, the failed one
  /// included.
  fn should_retry(&self, err: &Err, attempts: usize) -> bool;
}

/// `n` total attempts, whatever the error.
impl<Err> RetryPolicy<Err> for usize {
  #[inline]
  fn should_retry(&self, _: &Err, attempts: usize) -> bool { attempts < *self }
}

#[derive(Clone)]
pub struct RetryOp<S, P> {
  pub(crate) source: S,
  pub(crate) policy: P,
}

impl<S, P> Observable for RetryOp<S, P>
where
  S: Observable + Clone + Send + 'static,
  S::Item: 'static,
  S::Err: 'static,
  P: RetryPolicy<S::Err>,
{
  type Item = S::Item;
  type Err = S::Err;
  type Unsub = SharedSubscription;

  fn actual_subscribe<O>(self, observer: O) -> SharedSubscription
  where
    O: Observer<S::Item, S::Err> + Send + 'static,
  {
    let observer = SharedObserver::new(observer);
    let current = SerialSubscription::default();
    let subscription = SharedSubscription::default();
    subscription.add(observer.clone());
    subscription.add(current.clone());
    let ctx = Arc::new(RetryContext {
      source: Mutex::new(self.source),
      observer,
      current,
      latest: AtomicUsize::new(0),
    });
    subscribe_attempt(&ctx, self.policy, 1);
    subscription
  }
}

struct RetryContext<S, O> {
  source: Mutex<S>,
  observer: SharedObserver<O>,
  current: SerialSubscription,
  latest: AtomicUsize,
}

fn subscribe_attempt<S, P, O>(ctx: &Arc<RetryContext<S, O>>, policy: P, attempt: usize)
where
  S: Observable + Clone + Send + 'static,
  S::Item: 'static,
  S::Err: 'static,
  P: RetryPolicy<S::Err>,
  O: Observer<S::Item, S::Err> + Send + 'static,
{
  ctx.latest.store(attempt, Ordering::Release);
  let source = ctx.source.lock().clone();
  let unsub = source.actual_subscribe(RetryObserver { ctx: ctx.clone(), policy, attempt });
  // A source failing synchronously has already resubscribed from inside
  // `actual_subscribe`; only the newest attempt is kept.
  if ctx.latest.load(Ordering::Acquire) == attempt {
    ctx.current.replace(unsub);
  } else {
    unsub.unsubscribe();
  }
}

pub struct RetryObserver<S, P, O> {
  ctx: Arc<RetryContext<S, O>>,
  policy: P,
  attempt: usize,
}

impl<S, P, O> Observer<S::Item, S::Err> for RetryObserver<S, P, O>
where
  S: Observable + Clone + Send + 'static,
  S::Item: 'static,
  S::Err: 'static,
  P: RetryPolicy<S::Err>,
  O: Observer<S::Item, S::Err> + Send + 'static,
{
  fn next(&mut self, value: S::Item) { self.ctx.observer.emit_next::<S::Item, S::Err>(value) }

  fn error(self, err: S::Err) {
    if self.ctx.observer.is_closed() {
      return;
    }
    if self.policy.should_retry(&err, self.attempt) {
      tracing::debug!(attempt = self.attempt + 1, "source failed, resubscribing");
      subscribe_attempt(&self.ctx, self.policy, self.attempt + 1);
    } else {
      tracing::debug!(attempts = self.attempt, "retry budget exhausted");
      self.ctx.observer.emit_error::<S::Item, S::Err>(err);
    }
  }

  fn complete(self) { self.ctx.observer.emit_complete::<S::Item, S::Err>() }

  fn is_finished(&self) -> bool { self.ctx.observer.observer_finished::<S::Item, S::Err>() }
}

#[cfg(test)]
mod tests {
  use std::time::Duration;

  use super::*;
  use crate::{
    observable::{self, Emitter, ObservableExt},
    rc::{MutArc, RcDeref, RcDerefMut},
    scheduler::TestScheduler,
  };

  type Log = MutArc<Vec<String>>;

  /// Fails the first `failures` subscriptions, then emits "ok".
  fn flaky(
    failures: usize,
    calls: MutArc<usize>,
  ) -> impl Observable<Item = &'static str, Err = &'static str> + Clone + Send + 'static {
    observable::create(move |emitter: Emitter<&'static str, &'static str>| {
      let attempt = {
        let mut calls = calls.rc_deref_mut();
        *calls += 1;
        *calls
      };
      if attempt <= failures {
        emitter.error("Error!");
      } else {
        emitter.next("ok");
        emitter.complete();
      }
    })
  }

  fn run<P: RetryPolicy<&'static str>>(failures: usize, policy: P) -> (Log, usize) {
    let log = MutArc::own(vec![]);
    let calls = MutArc::own(0);
    let (l1, l2, l3) = (log.clone(), log.clone(), log.clone());
    flaky(failures, calls.clone()).retry(policy).subscribe_all(
      move |v| l1.rc_deref_mut().push(format!("next {v}")),
      move |e| l2.rc_deref_mut().push(format!("error {e}")),
      move || l3.rc_deref_mut().push("complete".to_string()),
    );
    let calls = *calls.rc_deref();
    (log, calls)
  }

  #[test]
  fn success_on_last_attempt_hides_errors() {
    let (log, calls) = run(2, 3);
    assert_eq!(*log.rc_deref(), vec!["next ok", "complete"]);
    assert_eq!(calls, 3);
  }

  #[test]
  fn always_failing_surfaces_one_error_after_budget() {
    let (log, calls) = run(usize::MAX, 3);
    assert_eq!(*log.rc_deref(), vec!["error Error!"]);
    assert_eq!(calls, 3);
  }

  #[test]
  fn two_attempts_boundary() {
    let (log, calls) = run(1, 2);
    assert_eq!(*log.rc_deref(), vec!["next ok", "complete"]);
    assert_eq!(calls, 2);

    let (log, calls) = run(2, 2);
    assert_eq!(*log.rc_deref(), vec!["error Error!"]);
    assert_eq!(calls, 2);
  }

  #[test]
  fn zero_and_one_never_resubscribe() {
    for budget in [0, 1] {
      let (log, calls) = run(1, budget);
      assert_eq!(*log.rc_deref(), vec!["error Error!"]);
      assert_eq!(calls, 1);
    }
  }

  #[derive(Clone)]
  struct OnlyTransient;

  impl RetryPolicy<&'static str> for OnlyTransient {
    fn should_retry(&self, err: &&'static str, attempts: usize) -> bool {
      *err == "transient" && attempts < 10
    }
  }

  #[test]
  fn custom_policy_sees_the_error() {
    let (log, calls) = run(1, OnlyTransient);
    assert_eq!(*log.rc_deref(), vec!["error Error!"]);
    assert_eq!(calls, 1);
  }

  fn failing_after(
    delay: u64,
    scheduler: TestScheduler,
    calls: MutArc<usize>,
  ) -> impl Observable<Item = i32, Err = ()> + Clone + Send + 'static {
    observable::defer(move || {
      *calls.rc_deref_mut() += 1;
      observable::timer::<_, (), _>(1, Duration::from_millis(delay), scheduler)
        .try_map(|_| Err::<i32, ()>(()))
    })
  }

  #[test]
  fn asynchronous_failure_resubscribes_later() {
    let scheduler = TestScheduler::new();
    let calls = MutArc::own(0);
    let failed = MutArc::own(false);
    let f = failed.clone();
    failing_after(10, scheduler.clone(), calls.clone())
      .retry(3)
      .subscribe_err(|_| {}, move |_| *f.rc_deref_mut() = true);
    assert_eq!(*calls.rc_deref(), 1);
    scheduler.advance_by(Duration::from_millis(10));
    assert_eq!(*calls.rc_deref(), 2);
    assert!(!*failed.rc_deref());
    scheduler.flush();
    assert_eq!(*calls.rc_deref(), 3);
    assert!(*failed.rc_deref());
  }

  #[test]
  fn unsubscribe_stops_resubscribing() {
    let scheduler = TestScheduler::new();
    let calls = MutArc::own(0);
    let subscription =
      failing_after(10, scheduler.clone(), calls.clone()).retry(3).subscribe(|_| {});
    subscription.unsubscribe();
    scheduler.flush();
    assert_eq!(*calls.rc_deref(), 1);
    assert_eq!(scheduler.pending(), 0);
  }
}
