use crate::{
  observable::Observable,
  observer::Observer,
  rc::{MutArc, RcDerefMut, SharedObserver},
  subscription::{SharedSubscription, Subscription},
};

/// Interleaves two streams by arrival order.
#[derive(Clone)]
pub struct MergeOp<S1, S2> {
  pub(crate) left: S1,
  pub(crate) right: S2,
}

/// Interleaves any number of streams of one type.
#[derive(Clone)]
pub struct MergeAllOp<S> {
  pub(crate) sources: Vec<S>,
}

impl<S1, S2> Observable for MergeOp<S1, S2>
where
  S1: Observable,
  S2: Observable<Item = S1::Item, Err = S1::Err>,
  S1::Item: 'static,
  S1::Err: 'static,
{
  type Item = S1::Item;
  type Err = S1::Err;
  type Unsub = SharedSubscription;

  fn actual_subscribe<O>(self, observer: O) -> SharedSubscription
  where
    O: Observer<S1::Item, S1::Err> + Send + 'static,
  {
    let (merge, subscription) = MergeObserver::new(observer, 2);
    merge.sources.add(self.left.actual_subscribe(merge.clone()));
    merge.sources.add(self.right.actual_subscribe(merge.clone()));
    subscription
  }
}

impl<S> Observable for MergeAllOp<S>
where
  S: Observable,
  S::Item: 'static,
  S::Err: 'static,
{
  type Item = S::Item;
  type Err = S::Err;
  type Unsub = SharedSubscription;

  fn actual_subscribe<O>(self, observer: O) -> SharedSubscription
  where
    O: Observer<S::Item, S::Err> + Send + 'static,
  {
    let (merge, subscription) = MergeObserver::new(observer, self.sources.len());
    if self.sources.is_empty() {
      merge.observer.emit_complete::<S::Item, S::Err>();
      return subscription;
    }
    for source in self.sources {
      if merge.observer.is_closed() {
        break;
      }
      merge.sources.add(source.actual_subscribe(merge.clone()));
    }
    subscription
  }
}

/// Observer shared by every merged source.
pub struct MergeObserver<O> {
  observer: SharedObserver<O>,
  remaining: MutArc<usize>,
  sources: SharedSubscription,
}

impl<O> Clone for MergeObserver<O> {
  fn clone(&self) -> Self {
    MergeObserver {
      observer: self.observer.clone(),
      remaining: self.remaining.clone(),
      sources: self.sources.clone(),
    }
  }
}

impl<O: Send + 'static> MergeObserver<O> {
  fn new(observer: O, count: usize) -> (Self, SharedSubscription) {
    let merge = MergeObserver {
      observer: SharedObserver::new(observer),
      remaining: MutArc::own(count),
      sources: SharedSubscription::default(),
    };
    let subscription = SharedSubscription::default();
    subscription.add(merge.observer.clone());
    subscription.add(merge.sources.clone());
    (merge, subscription)
  }
}

impl<Item, Err, O> Observer<Item, Err> for MergeObserver<O>
where
  O: Observer<Item, Err>,
{
  fn next(&mut self, value: Item) { self.observer.emit_next::<Item, Err>(value) }

  fn error(self, err: Err) {
    self.observer.emit_error::<Item, Err>(err);
    self.sources.unsubscribe();
  }

  fn complete(self) {
    let done = {
      let mut remaining = self.remaining.rc_deref_mut();
      *remaining = remaining.saturating_sub(1);
      *remaining == 0
    };
    if done {
      self.observer.emit_complete::<Item, Err>();
    }
  }

  fn is_finished(&self) -> bool { self.observer.observer_finished::<Item, Err>() }
}
