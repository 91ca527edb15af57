use crate::{
  observable::Observable,
  observer::{BoxedObserver, Observer},
  subscription::BoxedSubscription,
};

/// Object-safe mirror of [`Observable`].
pub trait DynObservable<Item, Err>: Send {
  fn box_subscribe(self: Box<Self>, observer: BoxedObserver<Item, Err>) -> BoxedSubscription;
}

impl<S> DynObservable<S::Item, S::Err> for S
where
  S: Observable + Send,
  S::Item: 'static,
  S::Err: 'static,
{
  fn box_subscribe(self: Box<Self>, observer: BoxedObserver<S::Item, S::Err>) -> BoxedSubscription {
    BoxedSubscription::new((*self).actual_subscribe(observer))
  }
}

/// An observable with its operator chain erased, for storing streams of
/// different shapes behind one type.
///
/// Boxed observables are not `Clone`, so they can be subscribed only once;
/// box at the end of a chain rather than in front of `retry`.
pub struct BoxedObservable<Item, Err>(Box<dyn DynObservable<Item, Err>>);

impl<Item, Err> BoxedObservable<Item, Err> {
  pub fn new<S>(source: S) -> Self
  where
    S: Observable<Item = Item, Err = Err> + Send + 'static,
    Item: 'static,
    Err: 'static,
  {
    BoxedObservable(Box::new(source))
  }
}

impl<Item: 'static, Err: 'static> Observable for BoxedObservable<Item, Err> {
  type Item = Item;
  type Err = Err;
  type Unsub = BoxedSubscription;

  fn actual_subscribe<O>(self, observer: O) -> BoxedSubscription
  where
    O: Observer<Item, Err> + Send + 'static,
  {
    self.0.box_subscribe(Box::new(observer))
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{
    observable::{self, ObservableExt},
    rc::{MutArc, RcDeref, RcDerefMut},
  };

  #[test]
  fn heterogeneous_sources_behind_one_type() {
    let sources: Vec<BoxedObservable<i32, ()>> = vec![
      observable::of(1).box_it(),
      observable::from_iter(vec![2, 3]).map(|v| v * 10).box_it(),
      observable::empty().box_it(),
    ];
    let seen = MutArc::own(vec![]);
    for source in sources {
      let s = seen.clone();
      source.subscribe(move |v| s.rc_deref_mut().push(v));
    }
    assert_eq!(*seen.rc_deref(), vec![1, 20, 30]);
  }
}
