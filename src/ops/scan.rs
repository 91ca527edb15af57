use crate::{observable::Observable, observer::Observer};

/// Emits every intermediate accumulator value.
#[derive(Clone)]
pub struct ScanOp<S, F, B> {
  pub(crate) source: S,
  pub(crate) func: F,
  pub(crate) initial: B,
}

impl<S, F, B> Observable for ScanOp<S, F, B>
where
  S: Observable,
  F: FnMut(B, S::Item) -> B + Send + 'static,
  B: Clone + Send + 'static,
{
  type Item = B;
  type Err = S::Err;
  type Unsub = S::Unsub;

  fn actual_subscribe<O>(self, observer: O) -> S::Unsub
  where
    O: Observer<B, S::Err> + Send + 'static,
  {
    self
      .source
      .actual_subscribe(ScanObserver { observer, func: self.func, acc: Some(self.initial) })
  }
}

pub struct ScanObserver<O, F, B> {
  observer: O,
  func: F,
  acc: Option<B>,
}

impl<Item, Err, O, F, B> Observer<Item, Err> for ScanObserver<O, F, B>
where
  O: Observer<B, Err>,
  F: FnMut(B, Item) -> B,
  B: Clone,
{
  fn next(&mut self, value: Item) {
    if let Some(acc) = self.acc.take() {
      let acc = (self.func)(acc, value);
      self.acc = Some(acc.clone());
      self.observer.next(acc);
    }
  }

  #[inline]
  fn error(self, err: Err) { self.observer.error(err) }

  #[inline]
  fn complete(self) { self.observer.complete() }

  #[inline]
  fn is_finished(&self) -> bool { self.observer.is_finished() }
}
