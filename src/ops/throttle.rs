//! Silence-window throttling: a value is emitted only once `duration` has
//! passed without a newer value arriving.
//!
//! ```text
//! source:   a-b-c-------d----|
//! throttle: --------c------d-|
//! ```
//!
//! Every value restarts the window and replaces the pending one. When the
//! source completes, a still-pending value is emitted right away, followed by
//! the completion. An error drops the pending value.

use std::time::Duration;

use crate::{
  observable::Observable,
  observer::Observer,
  rc::{MutArc, RcDerefMut, SharedObserver},
  scheduler::Scheduler,
  subscription::{SerialSubscription, SharedSubscription},
};

#[derive(Clone)]
pub struct ThrottleOp<S, SD> {
  pub(crate) source: S,
  pub(crate) duration: Duration,
  pub(crate) scheduler: SD,
}

impl<S, SD> Observable for ThrottleOp<S, SD>
where
  S: Observable,
  S::Item: Send + 'static,
  S::Err: 'static,
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
    let timer = SerialSubscription::default();
    let subscription = SharedSubscription::default();
    subscription.add(observer.clone());
    subscription.add(timer.clone());
    let throttle = ThrottleObserver {
      observer,
      scheduler: self.scheduler,
      duration: self.duration,
      pending: MutArc::own(Pending { generation: 0, value: None }),
      timer,
    };
    subscription.add(self.source.actual_subscribe(throttle));
    subscription
  }
}

struct Pending<Item> {
  generation: usize,
  value: Option<Item>,
}

pub struct ThrottleObserver<O, SD, Item> {
  observer: SharedObserver<O>,
  scheduler: SD,
  duration: Duration,
  pending: MutArc<Pending<Item>>,
  timer: SerialSubscription,
}

impl<O, SD, Item> ThrottleObserver<O, SD, Item> {
  fn take_pending(&self) -> Option<Item> {
    let mut pending = self.pending.rc_deref_mut();
    pending.generation += 1;
    pending.value.take()
  }
}

impl<Item, Err, O, SD> Observer<Item, Err> for ThrottleObserver<O, SD, Item>
where
  O: Observer<Item, Err> + Send + 'static,
  SD: Scheduler,
  Item: Send + 'static,
  Err: 'static,
{
  fn next(&mut self, value: Item) {
    let generation = {
      let mut pending = self.pending.rc_deref_mut();
      pending.generation += 1;
      pending.value = Some(value);
      pending.generation
    };
    let observer = self.observer.clone();
    let pending = self.pending.clone();
    let task = self.scheduler.schedule(
      move || {
        let value = {
          let mut pending = pending.rc_deref_mut();
          if pending.generation == generation { pending.value.take() } else { None }
        };
        if let Some(value) = value {
          observer.emit_next::<Item, Err>(value);
        }
      },
      Some(self.duration),
    );
    self.timer.replace(task);
  }

  fn error(self, err: Err) {
    self.timer.clear();
    self.take_pending();
    self.observer.emit_error::<Item, Err>(err);
  }

  fn complete(self) {
    self.timer.clear();
    if let Some(value) = self.take_pending() {
      self.observer.emit_next::<Item, Err>(value);
    }
    self.observer.emit_complete::<Item, Err>();
  }

  fn is_finished(&self) -> bool { self.observer.observer_finished::<Item, Err>() }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{
    observable::ObservableExt,
    rc::RcDeref,
    scheduler::TestScheduler,
    subject::Subject,
    subscription::Subscription,
  };

  fn ms(v: u64) -> Duration { Duration::from_millis(v) }

  #[test]
  fn burst_collapses_to_last_value_after_silence() {
    let scheduler = TestScheduler::new();
    let mut input = Subject::<&'static str, ()>::new();
    let seen = MutArc::own(vec![]);
    let s = seen.clone();
    let clock = scheduler.clone();
    input
      .clone()
      .throttle(ms(100), scheduler.clone())
      .subscribe(move |v| s.rc_deref_mut().push((v, clock.now())));

    input.next("c");
    scheduler.advance_by(ms(30));
    input.next("ca");
    scheduler.advance_by(ms(30));
    input.next("cat");
    scheduler.advance_by(ms(99));
    assert!(seen.rc_deref().is_empty());
    scheduler.advance_by(ms(1));
    assert_eq!(*seen.rc_deref(), vec![("cat", ms(160))]);
  }

  #[test]
  fn spaced_values_all_pass() {
    let scheduler = TestScheduler::new();
    let mut input = Subject::<i32, ()>::new();
    let seen = MutArc::own(vec![]);
    let s = seen.clone();
    input.clone().throttle(ms(10), scheduler.clone()).subscribe(move |v| s.rc_deref_mut().push(v));
    for v in 0..3 {
      input.next(v);
      scheduler.advance_by(ms(20));
    }
    assert_eq!(*seen.rc_deref(), vec![0, 1, 2]);
  }

  #[test]
  fn completion_flushes_pending_value() {
    let scheduler = TestScheduler::new();
    let mut input = Subject::<i32, ()>::new();
    let log = MutArc::own(vec![]);
    let (l1, l2) = (log.clone(), log.clone());
    input.clone().throttle(ms(50), scheduler.clone()).subscribe_all(
      move |v| l1.rc_deref_mut().push(format!("next {v}")),
      |_| {},
      move || l2.rc_deref_mut().push("complete".to_string()),
    );
    input.next(1);
    input.next(2);
    input.clone().complete();
    assert_eq!(*log.rc_deref(), vec!["next 2", "complete"]);
    assert_eq!(scheduler.pending(), 0);
  }

  #[test]
  fn error_drops_pending_value() {
    let scheduler = TestScheduler::new();
    let mut input = Subject::<i32, &'static str>::new();
    let log = MutArc::own(vec![]);
    let (l1, l2) = (log.clone(), log.clone());
    input.clone().throttle(ms(50), scheduler.clone()).subscribe_err(
      move |v| l1.rc_deref_mut().push(format!("next {v}")),
      move |e| l2.rc_deref_mut().push(format!("error {e}")),
    );
    input.next(1);
    input.clone().error("boom");
    scheduler.flush();
    assert_eq!(*log.rc_deref(), vec!["error boom"]);
  }

  #[test]
  fn unsubscribe_cancels_pending_emission() {
    let scheduler = TestScheduler::new();
    let mut input = Subject::<i32, ()>::new();
    let seen = MutArc::own(vec![]);
    let s = seen.clone();
    let subscription =
      input.clone().throttle(ms(50), scheduler.clone()).subscribe(move |v| s.rc_deref_mut().push(v));
    input.next(1);
    subscription.unsubscribe();
    scheduler.flush();
    assert!(seen.rc_deref().is_empty());
    assert_eq!(input.subscribed_size(), 0);
  }
}
