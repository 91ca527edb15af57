use crate::{observable::Observable, observer::Observer};

/// Creates the actual observable lazily, once per subscription.
///
/// ```rust
/// use rxsearch::prelude::*;
///
/// let calls = MutArc::own(0);
/// let counter = calls.clone();
/// let deferred = observable::defer(move || {
///   *counter.rc_deref_mut() += 1;
///   observable::of::<_, ()>(1)
/// });
/// deferred.clone().subscribe(|_| {});
/// deferred.subscribe(|_| {});
/// assert_eq!(*calls.rc_deref(), 2);
/// ```
pub fn defer<F, S>(factory: F) -> Defer<F>
where
  F: FnOnce() -> S,
  S: Observable,
{
  Defer(factory)
}

#[derive(Clone)]
pub struct Defer<F>(F);

impl<F, S> Observable for Defer<F>
where
  F: FnOnce() -> S,
  S: Observable,
{
  type Item = S::Item;
  type Err = S::Err;
  type Unsub = S::Unsub;

  fn actual_subscribe<O>(self, observer: O) -> S::Unsub
  where
    O: Observer<S::Item, S::Err> + Send + 'static,
  {
    (self.0)().actual_subscribe(observer)
  }
}
