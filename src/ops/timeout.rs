use std::{
  sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
  },
  time::Duration,
};

use crate::{
  error::TimeoutError,
  observable::Observable,
  observer::Observer,
  rc::SharedObserver,
  scheduler::Scheduler,
  subscription::{SerialSubscription, SharedSubscription, Subscription},
};

/// Sliding timeout: the timer starts on subscription and restarts with every
/// value. If it elapses first, the source is released and the stream fails
/// with `TimeoutError` converted into the stream's error type.
#[derive(Clone)]
pub struct TimeoutOp<S, SD> {
  pub(crate) source: S,
  pub(crate) duration: Duration,
  pub(crate) scheduler: SD,
}

impl<S, SD> Observable for TimeoutOp<S, SD>
where
  S: Observable,
  S::Item: 'static,
  S::Err: From<TimeoutError> + 'static,
  SD: Scheduler,
{
  type Item = S::Item;
  type Err = S::Err;
  type Unsub = SharedSubscription;

  fn actual_subscribe<O>(self, observer: O) -> SharedSubscription
  where
    O: Observer<S::Item, S::Err> + Send + 'static,
  {
    let observer = SharedObserver::new(observer);
    let upstream = SharedSubscription::default();
    let timer = SerialSubscription::default();
    let subscription = SharedSubscription::default();
    subscription.add(observer.clone());
    subscription.add(timer.clone());
    subscription.add(upstream.clone());

    let timeout = TimeoutObserver {
      observer,
      scheduler: self.scheduler,
      duration: self.duration,
      generation: Arc::new(AtomicUsize::new(0)),
      timer,
      upstream: upstream.clone(),
    };
    timeout.arm::<S::Item, S::Err>();
    upstream.add(self.source.actual_subscribe(timeout));
    subscription
  }
}

pub struct TimeoutObserver<O, SD> {
  observer: SharedObserver<O>,
  scheduler: SD,
  duration: Duration,
  generation: Arc<AtomicUsize>,
  timer: SerialSubscription,
  upstream: SharedSubscription,
}

impl<O, SD: Scheduler> TimeoutObserver<O, SD> {
  /// Starts a new timer, invalidating the previous one.
  fn arm<Item, Err>(&self)
  where
    O: Observer<Item, Err> + Send + 'static,
    Item: 'static,
    Err: From<TimeoutError> + 'static,
  {
    let generation = self.generation.fetch_add(1, Ordering::AcqRel) + 1;
    let current = self.generation.clone();
    let observer = self.observer.clone();
    let upstream = self.upstream.clone();
    let duration = self.duration;
    let task = self.scheduler.schedule(
      move || {
        if current.load(Ordering::Acquire) != generation {
          return;
        }
        tracing::debug!(?duration, "timeout elapsed, releasing source");
        upstream.unsubscribe();
        observer.emit_error::<Item, Err>(TimeoutError { duration }.into());
      },
      Some(duration),
    );
    self.timer.replace(task);
  }

  fn disarm(&self) {
    self.generation.fetch_add(1, Ordering::AcqRel);
    self.timer.clear();
  }
}

impl<Item, Err, O, SD> Observer<Item, Err> for TimeoutObserver<O, SD>
where
  O: Observer<Item, Err> + Send + 'static,
  SD: Scheduler,
  Item: 'static,
  Err: From<TimeoutError> + 'static,
{
  fn next(&mut self, value: Item) {
    if self.observer.is_closed() {
      return;
    }
    self.arm::<Item, Err>();
    self.observer.emit_next::<Item, Err>(value);
  }

  fn error(self, err: Err) {
    self.disarm();
    self.observer.emit_error::<Item, Err>(err);
  }

  fn complete(self) {
    self.disarm();
    self.observer.emit_complete::<Item, Err>();
  }

  fn is_finished(&self) -> bool { self.observer.observer_finished::<Item, Err>() }
}
