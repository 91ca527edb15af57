//! The consuming side of a stream.

/// Receives the notifications of one subscription.
///
/// `error` and `complete` take the observer by value: a stream ends at most
/// once and nothing follows its end.
pub trait Observer<Item, Err> {
  fn next(&mut self, value: Item);

  fn error(self, err: Err);

  fn complete(self);

  /// `true` once no more values are wanted. Synchronous producers check it
  /// to stop early, after a downstream `take` for instance.
  fn is_finished(&self) -> bool;
}

// ============================================================================
// Type erasure
// ============================================================================

/// Object-safe twin of [`Observer`] with boxed receivers for the terminal
/// notifications.
pub trait DynObserver<Item, Err> {
  fn box_next(&mut self, value: Item);
  fn box_error(self: Box<Self>, err: Err);
  fn box_complete(self: Box<Self>);
  fn box_is_finished(&self) -> bool;
}

impl<T, Item, Err> DynObserver<Item, Err> for T
where
  T: Observer<Item, Err>,
{
  fn box_next(&mut self, value: Item) { self.next(value); }
  fn box_error(self: Box<Self>, err: Err) { (*self).error(err); }
  fn box_complete(self: Box<Self>) { (*self).complete(); }
  fn box_is_finished(&self) -> bool { self.is_finished() }
}

/// What [`Emitter`](crate::observable::Emitter) and subjects store.
pub type BoxedObserver<Item, Err> = Box<dyn DynObserver<Item, Err> + Send>;

impl<Item, Err> Observer<Item, Err> for BoxedObserver<Item, Err> {
  #[inline]
  fn next(&mut self, value: Item) { (**self).box_next(value) }

  #[inline]
  fn error(self, err: Err) { self.box_error(err) }

  #[inline]
  fn complete(self) { self.box_complete() }

  #[inline]
  fn is_finished(&self) -> bool { (**self).box_is_finished() }
}

// ============================================================================
// Closures
// ============================================================================

/// Observer assembled from three closures; built by the `subscribe*` helpers.
#[derive(Clone)]
pub struct FnObserver<N, E, C> {
  pub next: N,
  pub error: E,
  pub complete: C,
}

impl<Item, Err, N, E, C> Observer<Item, Err> for FnObserver<N, E, C>
where
  N: FnMut(Item),
  E: FnOnce(Err),
  C: FnOnce(),
{
  #[inline]
  fn next(&mut self, value: Item) { (self.next)(value); }

  #[inline]
  fn error(self, err: Err) { (self.error)(err); }

  #[inline]
  fn complete(self) { (self.complete)(); }

  #[inline]
  fn is_finished(&self) -> bool { false }
}

/// An absent observer ignores everything and counts as finished.
impl<O, Item, Err> Observer<Item, Err> for Option<O>
where
  O: Observer<Item, Err>,
{
  fn next(&mut self, value: Item) {
    if let Some(inner) = self {
      inner.next(value);
    }
  }

  fn error(self, err: Err) {
    if let Some(inner) = self {
      inner.error(err);
    }
  }

  fn complete(self) {
    if let Some(inner) = self {
      inner.complete();
    }
  }

  fn is_finished(&self) -> bool { self.as_ref().is_none_or(Observer::is_finished) }
}
