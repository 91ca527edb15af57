use crate::{
  observable::Observable,
  observer::Observer,
  subscription::{SharedSubscription, Subscription},
};

#[derive(Clone)]
pub struct MapOp<S, F> {
  pub(crate) source: S,
  pub(crate) func: F,
}

impl<S, F, B> Observable for MapOp<S, F>
where
  S: Observable,
  F: FnMut(S::Item) -> B + Send + 'static,
{
  type Item = B;
  type Err = S::Err;
  type Unsub = S::Unsub;

  fn actual_subscribe<O>(self, observer: O) -> S::Unsub
  where
    O: Observer<B, S::Err> + Send + 'static,
  {
    self.source.actual_subscribe(MapObserver { observer, func: self.func })
  }
}

pub struct MapObserver<O, F> {
  observer: O,
  func: F,
}

impl<Item, Err, O, F, B> Observer<Item, Err> for MapObserver<O, F>
where
  O: Observer<B, Err>,
  F: FnMut(Item) -> B,
{
  #[inline]
  fn next(&mut self, value: Item) { self.observer.next((self.func)(value)) }

  #[inline]
  fn error(self, err: Err) { self.observer.error(err) }

  #[inline]
  fn complete(self) { self.observer.complete() }

  #[inline]
  fn is_finished(&self) -> bool { self.observer.is_finished() }
}

/// `map` with a fallible function: the first `Err` terminates the stream and
/// releases the source.
#[derive(Clone)]
pub struct TryMapOp<S, F> {
  pub(crate) source: S,
  pub(crate) func: F,
}

impl<S, F, B> Observable for TryMapOp<S, F>
where
  S: Observable,
  F: FnMut(S::Item) -> Result<B, S::Err> + Send + 'static,
{
  type Item = B;
  type Err = S::Err;
  type Unsub = SharedSubscription;

  fn actual_subscribe<O>(self, observer: O) -> SharedSubscription
  where
    O: Observer<B, S::Err> + Send + 'static,
  {
    let upstream = SharedSubscription::default();
    let observer = TryMapObserver { observer: Some(observer), func: self.func, upstream: upstream.clone() };
    upstream.add(self.source.actual_subscribe(observer));
    upstream
  }
}

pub struct TryMapObserver<O, F> {
  observer: Option<O>,
  func: F,
  upstream: SharedSubscription,
}

impl<Item, Err, O, F, B> Observer<Item, Err> for TryMapObserver<O, F>
where
  O: Observer<B, Err>,
  F: FnMut(Item) -> Result<B, Err>,
{
  fn next(&mut self, value: Item) {
    if self.observer.is_none() {
      return;
    }
    match (self.func)(value) {
      Ok(v) => self.observer.next(v),
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
