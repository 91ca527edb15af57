use std::collections::VecDeque;

use super::{Slot, Subject, SubjectSubscription};
use crate::{
  observable::Observable,
  observer::{BoxedObserver, Observer},
  rc::{MutArc, RcDeref, RcDerefMut, SharedObserver},
};

struct ReplayBuffer<Item> {
  values: VecDeque<Item>,
  capacity: Option<usize>,
}

/// A [`Subject`] that remembers past values.
///
/// A new subscriber first receives the buffered values in their original
/// order, then live values. If the subject already terminated, the buffered
/// values are followed by the terminal notification.
///
/// A value is buffered under the subject lock, the same lock a new
/// subscriber is registered under, so it reaches each subscriber exactly once:
/// replayed or live. Nothing is delivered while a lock is held.
///
/// ```rust
/// use rxsearch::prelude::*;
///
/// let mut subject = ReplaySubject::<i32, ()>::with_capacity(2);
/// subject.next(1);
/// subject.next(2);
/// subject.next(3);
///
/// let seen = MutArc::own(vec![]);
/// let sink = seen.clone();
/// subject.clone().subscribe(move |v| sink.rc_deref_mut().push(v));
/// subject.next(4);
/// assert_eq!(*seen.rc_deref(), vec![2, 3, 4]);
/// ```
pub struct ReplaySubject<Item, Err> {
  subject: Subject<Item, Err>,
  buffer: MutArc<ReplayBuffer<Item>>,
}

impl<Item, Err> Clone for ReplaySubject<Item, Err> {
  fn clone(&self) -> Self { ReplaySubject { subject: self.subject.clone(), buffer: self.buffer.clone() } }
}

impl<Item, Err> ReplaySubject<Item, Err> {
  /// Keeps the most recent `capacity` values.
  pub fn with_capacity(capacity: usize) -> Self { Self::new(Some(capacity)) }

  /// Keeps every value ever received.
  pub fn unbounded() -> Self { Self::new(None) }

  fn new(capacity: Option<usize>) -> Self {
    ReplaySubject {
      subject: Subject::new(),
      buffer: MutArc::own(ReplayBuffer { values: VecDeque::new(), capacity }),
    }
  }

  pub fn subscribed_size(&self) -> usize { self.subject.subscribed_size() }

  /// Number of values a new subscriber would receive first.
  pub fn buffered_len(&self) -> usize { self.buffer.rc_deref().values.len() }
}

impl<Item, Err> Observer<Item, Err> for ReplaySubject<Item, Err>
where
  Item: Clone + 'static,
  Err: Clone + 'static,
{
  fn next(&mut self, value: Item) {
    let buffer = &self.buffer;
    self.subject.broadcast_next_with(value, |v| buffer.rc_deref_mut().record(v));
  }

  fn error(self, err: Err) { self.subject.broadcast_error(err) }

  fn complete(self) { self.subject.broadcast_complete() }

  fn is_finished(&self) -> bool { self.subject.is_stopped() }
}

impl<Item: Clone> ReplayBuffer<Item> {
  fn record(&mut self, value: &Item) {
    if self.capacity == Some(0) {
      return;
    }
    self.values.push_back(value.clone());
    if let Some(capacity) = self.capacity {
      while self.values.len() > capacity {
        self.values.pop_front();
      }
    }
  }
}

impl<Item, Err> Observable for ReplaySubject<Item, Err>
where
  Item: Clone + Send + 'static,
  Err: Clone + Send + 'static,
{
  type Item = Item;
  type Err = Err;
  type Unsub = SubjectSubscription<Item, Err>;

  fn actual_subscribe<O>(self, observer: O) -> SubjectSubscription<Item, Err>
  where
    O: Observer<Item, Err> + Send + 'static,
  {
    let observer: BoxedObserver<Item, Err> = Box::new(observer);
    let slot: Slot<Item, Err> = SharedObserver::new(observer);
    let buffer = self.buffer;
    self.subject.attach_replaying(slot, move || buffer.rc_deref().values.iter().cloned().collect(), true)
  }
}
