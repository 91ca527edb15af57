use crate::{
  observable::Observable,
  observer::Observer,
  subscription::{SharedSubscription, Subscription},
};

/// Emits the first `count` values, then completes and releases the source.
#[derive(Clone)]
pub struct TakeOp<S> {
  pub(crate) source: S,
  pub(crate) count: usize,
}

impl<S: Observable> Observable for TakeOp<S> {
  type Item = S::Item;
  type Err = S::Err;
  type Unsub = SharedSubscription;

  fn actual_subscribe<O>(self, observer: O) -> SharedSubscription
  where
    O: Observer<S::Item, S::Err> + Send + 'static,
  {
    let upstream = SharedSubscription::default();
    if self.count == 0 {
      observer.complete();
      upstream.clone().unsubscribe();
      return upstream;
    }
    let observer = TakeObserver { observer: Some(observer), remaining: self.count, upstream: upstream.clone() };
    upstream.add(self.source.actual_subscribe(observer));
    upstream
  }
}

pub struct TakeObserver<O> {
  observer: Option<O>,
  remaining: usize,
  upstream: SharedSubscription,
}

impl<Item, Err, O> Observer<Item, Err> for TakeObserver<O>
where
  O: Observer<Item, Err>,
{
  fn next(&mut self, value: Item) {
    if self.remaining == 0 {
      return;
    }
    self.remaining -= 1;
    if self.remaining > 0 {
      self.observer.next(value);
    } else if let Some(mut observer) = self.observer.take() {
      observer.next(value);
      self.upstream.clone().unsubscribe();
      observer.complete();
    }
  }

  fn error(self, err: Err) { self.observer.error(err) }

  fn complete(self) { self.observer.complete() }

  fn is_finished(&self) -> bool { self.observer.is_finished() }
}

#[cfg(test)]
mod tests {
  use crate::{
    observable::{self, ObservableExt},
    rc::{MutArc, RcDeref, RcDerefMut},
    scheduler::{Duration, TestScheduler},
    subscription::Subscription,
  };

  #[test]
  fn takes_and_completes() {
    let log = MutArc::own(vec![]);
    let (l1, l2) = (log.clone(), log.clone());
    observable::from_iter::<_, ()>(1..100).take(3).subscribe_all(
      move |v| l1.rc_deref_mut().push(v),
      |_| {},
      move || l2.rc_deref_mut().push(-1),
    );
    assert_eq!(*log.rc_deref(), vec![1, 2, 3, -1]);
  }

  #[test]
  fn take_zero_completes_without_subscribing() {
    let done = MutArc::own(false);
    let d = done.clone();
    let subscription = observable::never::<i32, ()>().take(0).subscribe_all(
      |_| {},
      |_| {},
      move || *d.rc_deref_mut() = true,
    );
    assert!(*done.rc_deref());
    assert!(subscription.is_closed());
  }

  #[test]
  fn releases_async_source() {
    let scheduler = TestScheduler::new();
    let subscription = observable::interval::<(), _>(Duration::from_millis(1), scheduler.clone())
      .take(2)
      .subscribe(|_| {});
    scheduler.advance_by(Duration::from_millis(2));
    assert!(subscription.is_closed());
    assert_eq!(scheduler.pending(), 0);
  }
}
