use super::{Slot, Subject, SubjectSubscription};
use crate::{
  observable::Observable,
  observer::{BoxedObserver, Observer},
  rc::{MutArc, RcDeref, RcDerefMut, SharedObserver},
};

/// A [`Subject`] holding a current value.
///
/// New subscribers immediately receive the current value, then live values.
/// After the subject terminated, new subscribers only receive the terminal
/// notification, while [`BehaviorSubject::value`] keeps returning the last
/// value received before termination.
pub struct BehaviorSubject<Item, Err> {
  subject: Subject<Item, Err>,
  value: MutArc<Item>,
}

impl<Item, Err> Clone for BehaviorSubject<Item, Err> {
  fn clone(&self) -> Self { BehaviorSubject { subject: self.subject.clone(), value: self.value.clone() } }
}

impl<Item, Err> BehaviorSubject<Item, Err> {
  pub fn new(seed: Item) -> Self { BehaviorSubject { subject: Subject::new(), value: MutArc::own(seed) } }

  pub fn subscribed_size(&self) -> usize { self.subject.subscribed_size() }
}

impl<Item: Clone, Err> BehaviorSubject<Item, Err> {
  /// The current value.
  pub fn value(&self) -> Item { self.value.rc_deref().clone() }
}

impl<Item, Err> Observer<Item, Err> for BehaviorSubject<Item, Err>
where
  Item: Clone + 'static,
  Err: Clone + 'static,
{
  fn next(&mut self, value: Item) {
    let current = &self.value;
    self.subject.broadcast_next_with(value, |v| *current.rc_deref_mut() = v.clone());
  }

  fn error(self, err: Err) { self.subject.broadcast_error(err) }

  fn complete(self) { self.subject.broadcast_complete() }

  fn is_finished(&self) -> bool { self.subject.is_stopped() }
}

impl<Item, Err> Observable for BehaviorSubject<Item, Err>
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
    let current = self.value;
    self.subject.attach_replaying(slot, move || vec![current.rc_deref().clone()], false)
  }
}
