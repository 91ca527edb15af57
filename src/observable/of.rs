//! Synchronous sources: `of`, `from_iter`, `empty`, `never`, `throw_err`.
//!
//! These emit on the subscriber's stack and return `()` as their
//! subscription. Stopping early is driven by
//! [`Observer::is_finished`](crate::observer::Observer::is_finished).

use std::marker::PhantomData;

use crate::{observable::Observable, observer::Observer};

/// Creates an observable producing values from an iterator.
///
/// Completes when the iterator is exhausted. The iterator is cloned for every
/// subscription.
///
/// # Example
///
/// ```rust
/// use rxsearch::prelude::*;
///
/// let seen = MutArc::own(vec![]);
/// let sink = seen.clone();
/// observable::from_iter::<_, ()>(0..3).subscribe(move |v| sink.rc_deref_mut().push(v));
/// assert_eq!(*seen.rc_deref(), vec![0, 1, 2]);
/// ```
pub fn from_iter<Iter, Err>(iter: Iter) -> FromIter<Iter, Err>
where
  Iter: IntoIterator,
{
  FromIter { iter, _err: PhantomData }
}

pub struct FromIter<Iter, Err> {
  iter: Iter,
  _err: PhantomData<fn() -> Err>,
}

impl<Iter: Clone, Err> Clone for FromIter<Iter, Err> {
  fn clone(&self) -> Self { FromIter { iter: self.iter.clone(), _err: PhantomData } }
}

impl<Iter, Err> Observable for FromIter<Iter, Err>
where
  Iter: IntoIterator,
{
  type Item = Iter::Item;
  type Err = Err;
  type Unsub = ();

  fn actual_subscribe<O>(self, mut observer: O)
  where
    O: Observer<Self::Item, Err> + Send + 'static,
  {
    for v in self.iter {
      if observer.is_finished() {
        return;
      }
      observer.next(v);
    }
    if !observer.is_finished() {
      observer.complete();
    }
  }
}

/// Creates an observable that emits one value and completes.
pub fn of<Item, Err>(value: Item) -> Of<Item, Err> { Of { value, _err: PhantomData } }

pub struct Of<Item, Err> {
  value: Item,
  _err: PhantomData<fn() -> Err>,
}

impl<Item: Clone, Err> Clone for Of<Item, Err> {
  fn clone(&self) -> Self { Of { value: self.value.clone(), _err: PhantomData } }
}

impl<Item, Err> Observable for Of<Item, Err> {
  type Item = Item;
  type Err = Err;
  type Unsub = ();

  fn actual_subscribe<O>(self, mut observer: O)
  where
    O: Observer<Item, Err> + Send + 'static,
  {
    if !observer.is_finished() {
      observer.next(self.value);
    }
    if !observer.is_finished() {
      observer.complete();
    }
  }
}

/// Creates an observable that completes without emitting.
pub fn empty<Item, Err>() -> Trivial<Item, Err> { Trivial { kind: TrivialKind::Empty, _p: PhantomData } }

/// Creates an observable that never emits and never terminates.
pub fn never<Item, Err>() -> Trivial<Item, Err> { Trivial { kind: TrivialKind::Never, _p: PhantomData } }

/// Creates an observable that fails immediately with `err`.
pub fn throw_err<Item, Err>(err: Err) -> ThrowErr<Item, Err> { ThrowErr { err, _item: PhantomData } }

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum TrivialKind {
  Empty,
  Never,
}

pub struct Trivial<Item, Err> {
  kind: TrivialKind,
  _p: PhantomData<fn() -> (Item, Err)>,
}

impl<Item, Err> Clone for Trivial<Item, Err> {
  fn clone(&self) -> Self { Trivial { kind: self.kind, _p: PhantomData } }
}

impl<Item, Err> Observable for Trivial<Item, Err> {
  type Item = Item;
  type Err = Err;
  type Unsub = ();

  fn actual_subscribe<O>(self, observer: O)
  where
    O: Observer<Item, Err> + Send + 'static,
  {
    if self.kind == TrivialKind::Empty {
      observer.complete();
    }
  }
}

pub struct ThrowErr<Item, Err> {
  err: Err,
  _item: PhantomData<fn() -> Item>,
}

impl<Item, Err: Clone> Clone for ThrowErr<Item, Err> {
  fn clone(&self) -> Self { ThrowErr { err: self.err.clone(), _item: PhantomData } }
}

impl<Item, Err> Observable for ThrowErr<Item, Err> {
  type Item = Item;
  type Err = Err;
  type Unsub = ();

  fn actual_subscribe<O>(self, observer: O)
  where
    O: Observer<Item, Err> + Send + 'static,
  {
    observer.error(self.err);
  }
}
