//! Flattens a stream of streams by always following the newest inner stream.
//!
//! ```text
//! outer:  --A--------B------|
//! A:        --1--2--3--4
//! B:                 --5--6|
//! result: ----1--2-----5--6|
//! ```
//!
//! The previous inner subscription is disposed before the next one starts, so
//! a superseded stream's timers and in-flight work are cancelled rather than
//! having their output filtered out. The result completes once the outer
//! stream and the current inner stream have both completed. An error from
//! either side terminates the result.

use crate::{
  observable::Observable,
  observer::Observer,
  rc::{MutArc, RcDeref, RcDerefMut, SharedObserver},
  subscription::{SerialSubscription, SharedSubscription, Subscription},
};

#[derive(Clone)]
pub struct SwitchOnNextOp<S> {
  pub(crate) source: S,
}

impl<S> Observable for SwitchOnNextOp<S>
where
  S: Observable,
  S::Item: Observable<Err = S::Err>,
  <S::Item as Observable>::Item: 'static,
  S::Err: 'static,
{
  type Item = <S::Item as Observable>::Item;
  type Err = S::Err;
  type Unsub = SharedSubscription;

  fn actual_subscribe<O>(self, observer: O) -> SharedSubscription
  where
    O: Observer<Self::Item, S::Err> + Send + 'static,
  {
    let shared = SwitchShared {
      observer: SharedObserver::new(observer),
      state: MutArc::own(SwitchState::default()),
      inner: SerialSubscription::default(),
      outer: SharedSubscription::default(),
    };
    let subscription = SharedSubscription::default();
    subscription.add(shared.observer.clone());
    subscription.add(shared.inner.clone());
    subscription.add(shared.outer.clone());
    let outer = shared.outer.clone();
    outer.add(self.source.actual_subscribe(SwitchOuterObserver(shared)));
    subscription
  }
}

#[derive(Default)]
struct SwitchState {
  generation: usize,
  inner_active: bool,
  outer_done: bool,
}

struct SwitchShared<O> {
  observer: SharedObserver<O>,
  state: MutArc<SwitchState>,
  inner: SerialSubscription,
  outer: SharedSubscription,
}

impl<O> Clone for SwitchShared<O> {
  fn clone(&self) -> Self {
    SwitchShared {
      observer: self.observer.clone(),
      state: self.state.clone(),
      inner: self.inner.clone(),
      outer: self.outer.clone(),
    }
  }
}

impl<O> SwitchShared<O> {
  fn is_current(&self, generation: usize) -> bool { self.state.rc_deref().generation == generation }
}

pub struct SwitchOuterObserver<O>(SwitchShared<O>);

impl<Inner, Err, O> Observer<Inner, Err> for SwitchOuterObserver<O>
where
  Inner: Observable<Err = Err>,
  Inner::Item: 'static,
  Err: 'static,
  O: Observer<Inner::Item, Err> + Send + 'static,
{
  fn next(&mut self, inner: Inner) {
    let (generation, superseded) = {
      let mut state = self.0.state.rc_deref_mut();
      state.generation += 1;
      let superseded = std::mem::replace(&mut state.inner_active, true);
      (state.generation, superseded)
    };
    if superseded {
      tracing::trace!(generation, "newer inner stream supersedes the active one");
    }
    self.0.inner.clear();
    let unsub = inner.actual_subscribe(SwitchInnerObserver { shared: self.0.clone(), generation });
    if self.0.is_current(generation) {
      self.0.inner.replace(unsub);
    } else {
      unsub.unsubscribe();
    }
  }

  fn error(self, err: Err) {
    self.0.inner.clear();
    self.0.observer.emit_error::<Inner::Item, Err>(err);
  }

  fn complete(self) {
    let done = {
      let mut state = self.0.state.rc_deref_mut();
      state.outer_done = true;
      !state.inner_active
    };
    if done {
      self.0.observer.emit_complete::<Inner::Item, Err>();
    }
  }

  fn is_finished(&self) -> bool { self.0.observer.observer_finished::<Inner::Item, Err>() }
}

pub struct SwitchInnerObserver<O> {
  shared: SwitchShared<O>,
  generation: usize,
}

impl<Item, Err, O> Observer<Item, Err> for SwitchInnerObserver<O>
where
  O: Observer<Item, Err>,
{
  fn next(&mut self, value: Item) {
    if self.shared.is_current(self.generation) {
      self.shared.observer.emit_next::<Item, Err>(value);
    }
  }

  fn error(self, err: Err) {
    if self.shared.is_current(self.generation) {
      self.shared.outer.unsubscribe();
      self.shared.observer.emit_error::<Item, Err>(err);
    }
  }

  fn complete(self) {
    let done = {
      let mut state = self.shared.state.rc_deref_mut();
      if state.generation != self.generation {
        return;
      }
      state.inner_active = false;
      state.outer_done
    };
    if done {
      self.shared.observer.emit_complete::<Item, Err>();
    }
  }

  fn is_finished(&self) -> bool {
    !self.shared.is_current(self.generation) || self.shared.observer.observer_finished::<Item, Err>()
  }
}

#[cfg(test)]
mod tests {
  use std::time::Duration;

  use super::*;
  use crate::{
    observable::{self, ObservableExt},
    scheduler::TestScheduler,
    subject::Subject,
  };

  type Log = MutArc<Vec<String>>;

  fn record<S>(source: S) -> Log
  where
    S: Observable<Item = i32, Err = &'static str>,
  {
    let log = MutArc::own(vec![]);
    let (l1, l2, l3) = (log.clone(), log.clone(), log.clone());
    source.actual_subscribe(crate::observer::FnObserver {
      next: move |v: i32| l1.rc_deref_mut().push(format!("next {v}")),
      error: move |e: &'static str| l2.rc_deref_mut().push(format!("error {e}")),
      complete: move || l3.rc_deref_mut().push("complete".to_string()),
    });
    log
  }

  #[test]
  fn only_the_latest_inner_stream_is_heard() {
    let mut outer = Subject::<Subject<i32, &'static str>, &'static str>::new();
    let mut first = Subject::new();
    let mut second = Subject::new();
    let mut third = Subject::new();
    let log = record(outer.clone().switch_on_next());

    outer.next(first.clone());
    first.next(1);
    outer.next(second.clone());
    first.next(2);
    second.next(3);
    outer.next(third.clone());
    first.next(4);
    second.next(5);
    third.next(6);

    assert_eq!(*log.rc_deref(), vec!["next 1", "next 3", "next 6"]);
    // Superseded streams were disposed, not just muted.
    assert_eq!(first.subscribed_size(), 0);
    assert_eq!(second.subscribed_size(), 0);
    assert_eq!(third.subscribed_size(), 1);
  }

  #[test]
  fn completes_after_outer_and_current_inner() {
    let mut outer = Subject::<Subject<i32, &'static str>, &'static str>::new();
    let mut inner = Subject::new();
    let log = record(outer.clone().switch_on_next());

    outer.next(inner.clone());
    outer.clone().complete();
    assert!(log.rc_deref().is_empty());
    inner.next(1);
    inner.clone().complete();
    assert_eq!(*log.rc_deref(), vec!["next 1", "complete"]);
  }

  #[test]
  fn inner_error_disposes_outer() {
    let mut outer = Subject::<Subject<i32, &'static str>, &'static str>::new();
    let mut inner = Subject::new();
    let log = record(outer.clone().switch_on_next());

    outer.next(inner.clone());
    inner.next(1);
    inner.clone().error("boom");
    assert_eq!(*log.rc_deref(), vec!["next 1", "error boom"]);
    assert_eq!(outer.subscribed_size(), 0);
  }

  #[test]
  fn superseded_timer_is_cancelled() {
    let scheduler = TestScheduler::new();
    let mut outer = Subject::<_, &'static str>::new();
    let log = record(outer.clone().switch_on_next());

    outer.next(observable::timer(1, Duration::from_millis(100), scheduler.clone()));
    scheduler.advance_by(Duration::from_millis(50));
    outer.next(observable::timer(2, Duration::from_millis(100), scheduler.clone()));
    assert_eq!(scheduler.pending(), 1);
    scheduler.flush();
    assert_eq!(*log.rc_deref(), vec!["next 2"]);
  }

  #[test]
  fn synchronous_inner_streams_all_pass() {
    let source =
      observable::from_iter::<_, &'static str>(vec![1, 2]).map(|v| observable::from_iter(vec![v, v * 10]));
    let log = record(source.switch_on_next());
    assert_eq!(*log.rc_deref(), vec!["next 1", "next 10", "next 2", "next 20", "complete"]);
  }
}
