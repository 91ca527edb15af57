use crate::{observable::Observable, observer::Observer};

#[derive(Clone)]
pub struct MapErrOp<S, F> {
  pub(crate) source: S,
  pub(crate) func: F,
}

impl<S, F, E> Observable for MapErrOp<S, F>
where
  S: Observable,
  F: FnOnce(S::Err) -> E + Send + 'static,
{
  type Item = S::Item;
  type Err = E;
  type Unsub = S::Unsub;

  fn actual_subscribe<O>(self, observer: O) -> S::Unsub
  where
    O: Observer<S::Item, E> + Send + 'static,
  {
    self.source.actual_subscribe(MapErrObserver { observer, func: self.func })
  }
}

pub struct MapErrObserver<O, F> {
  observer: O,
  func: F,
}

impl<Item, Err, O, F, E> Observer<Item, Err> for MapErrObserver<O, F>
where
  O: Observer<Item, E>,
  F: FnOnce(Err) -> E,
{
  #[inline]
  fn next(&mut self, value: Item) { self.observer.next(value) }

  #[inline]
  fn error(self, err: Err) { self.observer.error((self.func)(err)) }

  #[inline]
  fn complete(self) { self.observer.complete() }

  #[inline]
  fn is_finished(&self) -> bool { self.observer.is_finished() }
}
