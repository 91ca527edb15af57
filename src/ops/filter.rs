use crate::{
  observable::Observable,
  observer::Observer,
  subscription::{SharedSubscription, Subscription},
};

#[derive(Clone)]
pub struct FilterOp<S, F> {
  pub(crate) source: S,
  pub(crate) predicate: F,
}

impl<S, F> Observable for FilterOp<S, F>
where
  S: Observable,
  F: FnMut(&S::Item) -> bool + Send + 'static,
{
  type Item = S::Item;
  type Err = S::Err;
  type Unsub = S::Unsub;

  fn actual_subscribe<O>(self, observer: O) -> S::Unsub
  where
    O: Observer<S::Item, S::Err> + Send + 'static,
  {
    self.source.actual_subscribe(FilterObserver { observer, predicate: self.predicate })
  }
}

pub struct FilterObserver<O, F> {
  observer: O,
  predicate: F,
}

impl<Item, Err, O, F> Observer<Item, Err> for FilterObserver<O, F>
where
  O: Observer<Item, Err>,
  F: FnMut(&Item) -> bool,
{
  fn next(&mut self, value: Item) {
    if (self.predicate)(&value) {
      self.observer.next(value)
    }
  }

  #[inline]
  fn error(self, err: Err) { self.observer.error(err) }

  #[inline]
  fn complete(self) { self.observer.complete() }

  #[inline]
  fn is_finished(&self) -> bool { self.observer.is_finished() }
}

/// `filter` with a fallible predicate: the first `Err` terminates the stream
/// and releases the source.
#[derive(Clone)]
pub struct TryFilterOp<S, F> {
  pub(crate) source: S,
  pub(crate) predicate: F,
}

impl<S, F> Observable for TryFilterOp<S, F>
where
  S: Observable,
  F: FnMut(&S::Item) -> Result<bool, S::Err> + Send + 'static,
{
  type Item = S::Item;
  type Err = S::Err;
  type Unsub = SharedSubscription;

  fn actual_subscribe<O>(self, observer: O) -> SharedSubscription
  where
    O: Observer<S::Item, S::Err> + Send + 'static,
  {
    let upstream = SharedSubscription::default();
    let observer =
      TryFilterObserver { observer: Some(observer), predicate: self.predicate, upstream: upstream.clone() };
    upstream.add(self.source.actual_subscribe(observer));
    upstream
  }
}

pub struct TryFilterObserver<O, F> {
  observer: Option<O>,
  predicate: F,
  upstream: SharedSubscription,
}

impl<Item, Err, O, F> Observer<Item, Err> for TryFilterObserver<O, F>
where
  O: Observer<Item, Err>,
  F: FnMut(&Item) -> Result<bool, Err>,
{
  fn next(&mut self, value: Item) {
    if self.observer.is_none() {
      return;
    }
    match (self.predicate)(&value) {
      Ok(true) => self.observer.next(value),
      Ok(false) => {}
      Err(err) => {
        self.upstream.clone().unsubscribe();
        self.observer.take().error(err);
      }
    }
  }

  fn error(self, err: Err) { self.observer.error(err) }

  fn complete(self) { self.observer.complete() }

  fn is_finished(&self) -> bool { self.observer.is_finished() }
}
