use std::marker::PhantomData;

use super::zip::{Either, LeftObserver, PairSink, RightObserver};
use crate::{
  observable::Observable,
  observer::Observer,
  rc::{MutArc, RcDerefMut, SharedObserver},
  subscription::{SharedSubscription, Subscription},
};

/// Emits `func(latest_left, latest_right)` whenever either source emits,
/// once both have produced a value. Completes when both sources completed.
#[derive(Clone)]
pub struct CombineLatestOp<S1, S2, F> {
  pub(crate) left: S1,
  pub(crate) right: S2,
  pub(crate) func: F,
}

impl<S1, S2, F, B> Observable for CombineLatestOp<S1, S2, F>
where
  S1: Observable,
  S2: Observable<Err = S1::Err>,
  S1::Item: Clone + Send + 'static,
  S2::Item: Clone + Send + 'static,
  S1::Err: 'static,
  F: FnMut(S1::Item, S2::Item) -> B + Send + 'static,
  B: 'static,
{
  type Item = B;
  type Err = S1::Err;
  type Unsub = SharedSubscription;

  fn actual_subscribe<O>(self, observer: O) -> SharedSubscription
  where
    O: Observer<B, S1::Err> + Send + 'static,
  {
    let sink = CombineLatestSink {
      observer: SharedObserver::new(observer),
      state: MutArc::own(CombineState {
        func: self.func,
        left: None,
        right: None,
        left_done: false,
        right_done: false,
      }),
      sources: SharedSubscription::default(),
      _p: PhantomData,
    };
    let subscription = SharedSubscription::default();
    subscription.add(sink.observer.clone());
    subscription.add(sink.sources.clone());
    sink.sources.add(self.left.actual_subscribe(LeftObserver(sink.clone())));
    sink.sources.add(self.right.actual_subscribe(RightObserver(sink.clone())));
    subscription
  }
}

struct CombineState<F, A, C> {
  func: F,
  left: Option<A>,
  right: Option<C>,
  left_done: bool,
  right_done: bool,
}

pub struct CombineLatestSink<O, F, A, C, B, Err> {
  observer: SharedObserver<O>,
  state: MutArc<CombineState<F, A, C>>,
  sources: SharedSubscription,
  _p: PhantomData<fn() -> (B, Err)>,
}

impl<O, F, A, C, B, Err> Clone for CombineLatestSink<O, F, A, C, B, Err> {
  fn clone(&self) -> Self {
    CombineLatestSink {
      observer: self.observer.clone(),
      state: self.state.clone(),
      sources: self.sources.clone(),
      _p: PhantomData,
    }
  }
}

impl<O, F, A, C, B, Err> PairSink for CombineLatestSink<O, F, A, C, B, Err>
where
  O: Observer<B, Err>,
  F: FnMut(A, C) -> B,
  A: Clone,
  C: Clone,
{
  type Left = A;
  type Right = C;
  type Err = Err;

  fn on_next(&self, value: Either<A, C>) {
    let combined = {
      let mut state = self.state.rc_deref_mut();
      match value {
        Either::Left(a) => state.left = Some(a),
        Either::Right(c) => state.right = Some(c),
      }
      match (state.left.clone(), state.right.clone()) {
        (Some(a), Some(c)) => Some((state.func)(a, c)),
        _ => None,
      }
    };
    if let Some(value) = combined {
      self.observer.emit_next::<B, Err>(value);
    }
  }

  fn on_error(&self, err: Err) {
    self.observer.emit_error::<B, Err>(err);
    self.sources.clone().unsubscribe();
  }

  fn on_complete(&self, left: bool) {
    let done = {
      let mut state = self.state.rc_deref_mut();
      if left {
        state.left_done = true;
      } else {
        state.right_done = true;
      }
      state.left_done && state.right_done
    };
    if done {
      self.observer.emit_complete::<B, Err>();
    }
  }

  fn is_finished(&self) -> bool { self.observer.observer_finished::<B, Err>() }
}

#[cfg(test)]
mod tests {
  use std::time::Duration;

  use super::*;
  use crate::{
    observable::{self, ObservableExt},
    rc::RcDeref,
    scheduler::TestScheduler,
    subject::Subject,
  };

  #[test]
  fn waits_for_both_then_follows_either() {
    let scheduler = TestScheduler::new();
    let numbers = observable::interval::<(), _>(Duration::from_secs(1), scheduler.clone()).take(3);
    let letter = observable::timer::<_, (), _>('A', Duration::from_millis(2500), scheduler.clone());
    let log = MutArc::own(vec![]);
    let (l1, l2) = (log.clone(), log.clone());
    let clock = scheduler.clone();
    numbers.combine_latest(letter, |n, c| (n, c)).subscribe_all(
      move |(n, c)| l1.rc_deref_mut().push(format!("({n},{c}) at {:?}", clock.now())),
      |_| {},
      move || l2.rc_deref_mut().push("complete".to_string()),
    );
    scheduler.flush();
    assert_eq!(
      *log.rc_deref(),
      vec!["(1,A) at 2.5s", "(2,A) at 3s", "complete"]
    );
  }

  #[test]
  fn completes_only_when_both_complete() {
    let mut left = Subject::<i32, ()>::new();
    let mut right = Subject::<i32, ()>::new();
    let done = MutArc::own(false);
    let d = done.clone();
    left
      .clone()
      .combine_latest(right.clone(), |a, b| a + b)
      .subscribe_all(|_| {}, |_| {}, move || *d.rc_deref_mut() = true);
    left.next(1);
    right.next(2);
    left.clone().complete();
    assert!(!*done.rc_deref());
    right.next(3);
    right.clone().complete();
    assert!(*done.rc_deref());
  }
}
