//! Subjects: observers that fan what they receive out to every current
//! subscriber, making a cold stream hot.
//!
//! * [`Subject`] forwards live notifications only.
//! * [`ReplaySubject`] additionally buffers past values for late subscribers.
//! * [`BehaviorSubject`] always holds a current value, starting from a seed.
//!
//! All three are cloneable handles over shared state: clone one to keep
//! feeding it from imperative code while the other clone is subscribed.
//!
//! # Fan-out discipline
//!
//! The subscriber list is snapshotted under its lock and notifications are
//! delivered after the lock is released, in subscription order. Every
//! subscriber slot has its own closed flag, so unsubscribing during a fan-out
//! stops delivery to that slot. A subscriber added during a fan-out is not
//! part of that snapshot: it misses the value being delivered unless the
//! subject replays it. The replay and current-value memory of
//! [`ReplaySubject`] and [`BehaviorSubject`] is updated under the same lock,
//! so subscribing or reading it from inside a subscriber is fine. Feeding the same subject from several threads
//! at once is allowed, but values from different threads may then reach the
//! subscribers in different relative orders, and a value pushed from another
//! thread while a new subscriber is being replayed to may overtake the
//! replay. Serialize the producers when that matters.

use smallvec::SmallVec;

use crate::{
  observable::Observable,
  observer::{BoxedObserver, Observer},
  rc::{MutArc, RcDeref, RcDerefMut, SharedObserver},
  subscription::Subscription,
};

mod behavior_subject;
mod replay_subject;

pub use behavior_subject::BehaviorSubject;
pub use replay_subject::ReplaySubject;

pub(crate) type Slot<Item, Err> = SharedObserver<BoxedObserver<Item, Err>>;

#[derive(Clone)]
enum Terminal<Err> {
  Completed,
  Errored(Err),
}

struct SubjectState<Item, Err> {
  next_id: usize,
  observers: SmallVec<[(usize, Slot<Item, Err>); 2]>,
  terminal: Option<Terminal<Err>>,
}

/// A multicast hub: values pushed in with `next` reach every subscriber.
///
/// Once completed or errored, the subject keeps that terminal notification
/// and hands it to every later subscriber right away.
///
/// ```rust
/// use rxsearch::prelude::*;
///
/// let mut subject = Subject::<i32, ()>::new();
/// let seen = MutArc::own(vec![]);
/// let sink = seen.clone();
/// subject.clone().subscribe(move |v| sink.rc_deref_mut().push(v));
/// subject.next(1);
/// subject.next(2);
/// assert_eq!(*seen.rc_deref(), vec![1, 2]);
/// ```
pub struct Subject<Item, Err>(MutArc<SubjectState<Item, Err>>);

impl<Item, Err> Clone for Subject<Item, Err> {
  fn clone(&self) -> Self { Subject(self.0.clone()) }
}

impl<Item, Err> Default for Subject<Item, Err> {
  fn default() -> Self {
    Subject(MutArc::own(SubjectState { next_id: 0, observers: SmallVec::new(), terminal: None }))
  }
}

impl<Item, Err> Subject<Item, Err> {
  pub fn new() -> Self { Self::default() }

  /// Number of live subscribers.
  pub fn subscribed_size(&self) -> usize { self.0.rc_deref().observers.len() }

  /// Whether the subject received a terminal notification.
  pub fn is_stopped(&self) -> bool { self.0.rc_deref().terminal.is_some() }

  fn remove(&self, id: usize) {
    let removed = {
      let mut state = self.0.rc_deref_mut();
      let idx = state.observers.iter().position(|(slot_id, _)| *slot_id == id);
      idx.map(|idx| state.observers.remove(idx))
    };
    drop(removed);
  }
}

impl<Item: 'static, Err: Clone + 'static> Subject<Item, Err> {
  pub(crate) fn attach(&self, slot: Slot<Item, Err>) -> SubjectSubscription<Item, Err> {
    self.attach_replaying(slot, Vec::new, false)
  }

  /// Adds `slot` to the subscriber list and hands it the values produced by
  /// `replay`, or hands it the terminal notification if the subject already
  /// stopped (after the replayed values when `replay_after_stop`).
  ///
  /// `replay` runs under the subject lock, the same lock
  /// [`Subject::broadcast_next_with`] records under, so every value reaches
  /// the slot either replayed or live, never both. Delivery happens after the
  /// lock is released.
  pub(crate) fn attach_replaying<R>(
    &self,
    slot: Slot<Item, Err>,
    replay: R,
    replay_after_stop: bool,
  ) -> SubjectSubscription<Item, Err>
  where
    R: FnOnce() -> Vec<Item>,
  {
    let (values, terminal, subscription) = {
      let mut state = self.0.rc_deref_mut();
      let values = replay();
      match state.terminal.clone() {
        Some(terminal) => {
          let values = if replay_after_stop { values } else { Vec::new() };
          (values, Some(terminal), SubjectSubscription { subject: None, id: 0, slot: slot.clone() })
        }
        None => {
          let id = state.next_id;
          state.next_id += 1;
          state.observers.push((id, slot.clone()));
          (values, None, SubjectSubscription { subject: Some(self.clone()), id, slot: slot.clone() })
        }
      }
    };
    for value in values {
      slot.emit_next::<Item, Err>(value);
    }
    match terminal {
      Some(Terminal::Errored(err)) => slot.emit_error::<Item, Err>(err),
      Some(Terminal::Completed) => slot.emit_complete::<Item, Err>(),
      None => {}
    }
    subscription
  }

  fn stop(&self, terminal: Terminal<Err>) -> Option<SmallVec<[(usize, Slot<Item, Err>); 2]>> {
    let mut state = self.0.rc_deref_mut();
    if state.terminal.is_some() {
      return None;
    }
    state.terminal = Some(terminal);
    Some(std::mem::take(&mut state.observers))
  }
}

impl<Item: Clone + 'static, Err: Clone + 'static> Subject<Item, Err> {
  pub(crate) fn broadcast_next(&self, value: Item) { self.broadcast_next_with(value, |_| {}) }

  /// Fans `value` out to a snapshot of the subscribers. `record` runs under
  /// the subject lock before the snapshot is taken and is skipped once the
  /// subject stopped.
  pub(crate) fn broadcast_next_with<F>(&self, value: Item, record: F)
  where
    F: FnOnce(&Item),
  {
    let observers: SmallVec<[Slot<Item, Err>; 2]> = {
      let state = self.0.rc_deref();
      if state.terminal.is_some() {
        return;
      }
      record(&value);
      state.observers.iter().map(|(_, slot)| slot.clone()).collect()
    };
    for slot in observers {
      slot.emit_next::<Item, Err>(value.clone());
    }
  }

  pub(crate) fn broadcast_error(&self, err: Err) {
    if let Some(observers) = self.stop(Terminal::Errored(err.clone())) {
      for (_, slot) in observers {
        slot.emit_error::<Item, Err>(err.clone());
      }
    }
  }

  pub(crate) fn broadcast_complete(&self) {
    if let Some(observers) = self.stop(Terminal::Completed) {
      for (_, slot) in observers {
        slot.emit_complete::<Item, Err>();
      }
    }
  }
}

impl<Item, Err> Observer<Item, Err> for Subject<Item, Err>
where
  Item: Clone + 'static,
  Err: Clone + 'static,
{
  #[inline]
  fn next(&mut self, value: Item) { self.broadcast_next(value) }

  #[inline]
  fn error(self, err: Err) { self.broadcast_error(err) }

  #[inline]
  fn complete(self) { self.broadcast_complete() }

  #[inline]
  fn is_finished(&self) -> bool { self.is_stopped() }
}

impl<Item, Err> Observable for Subject<Item, Err>
where
  Item: Send + 'static,
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
    self.attach(SharedObserver::new(observer))
  }
}

/// Subscription to a subject; unsubscribing detaches the subscriber slot.
pub struct SubjectSubscription<Item, Err> {
  subject: Option<Subject<Item, Err>>,
  id: usize,
  slot: Slot<Item, Err>,
}

impl<Item, Err> Subscription for SubjectSubscription<Item, Err> {
  fn unsubscribe(self) {
    self.slot.close();
    if let Some(subject) = self.subject {
      subject.remove(self.id);
    }
  }

  #[inline]
  fn is_closed(&self) -> bool { self.slot.is_closed() }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::observable::ObservableExt;

  fn record(subject: &Subject<i32, &'static str>) -> (MutArc<Vec<String>>, SubjectSubscription<i32, &'static str>) {
    let log = MutArc::own(vec![]);
    let (l1, l2, l3) = (log.clone(), log.clone(), log.clone());
    let subscription = subject.clone().subscribe_all(
      move |v| l1.rc_deref_mut().push(format!("next {v}")),
      move |e| l2.rc_deref_mut().push(format!("error {e}")),
      move || l3.rc_deref_mut().push("complete".to_string()),
    );
    (log, subscription)
  }

  #[test]
  fn fan_out_in_subscription_order() {
    let mut subject = Subject::<i32, ()>::new();
    let order = MutArc::own(vec![]);
    for tag in ["first", "second"] {
      let o = order.clone();
      subject.clone().subscribe(move |v: i32| o.rc_deref_mut().push((tag, v)));
    }
    subject.next(1);
    assert_eq!(*order.rc_deref(), vec![("first", 1), ("second", 1)]);
  }

  #[test]
  fn late_subscriber_only_sees_later_values() {
    let mut subject = Subject::new();
    subject.next(1);
    let (log, _subscription) = record(&subject);
    subject.next(2);
    assert_eq!(*log.rc_deref(), vec!["next 2"]);
  }

  #[test]
  fn terminal_reaches_current_and_future_subscribers() {
    let mut subject = Subject::new();
    let (before, _s1) = record(&subject);
    subject.clone().error("boom");
    subject.next(3);
    let (after, _s2) = record(&subject);
    assert_eq!(*before.rc_deref(), vec!["error boom"]);
    assert_eq!(*after.rc_deref(), vec!["error boom"]);
    assert_eq!(subject.subscribed_size(), 0);
  }

  #[test]
  fn unsubscribe_detaches() {
    let mut subject = Subject::new();
    let (log, subscription) = record(&subject);
    subject.next(1);
    subscription.unsubscribe();
    subject.next(2);
    assert_eq!(*log.rc_deref(), vec!["next 1"]);
    assert_eq!(subject.subscribed_size(), 0);
  }

  #[test]
  fn unsubscribe_during_fan_out() {
    let mut subject = Subject::<i32, ()>::new();
    let log = MutArc::own(vec![]);
    let victim = MutArc::own(None::<SubjectSubscription<i32, ()>>);

    let (l, v) = (log.clone(), victim.clone());
    subject.clone().subscribe(move |x| {
      l.rc_deref_mut().push(("killer", x));
      if let Some(s) = v.rc_deref_mut().take() {
        s.unsubscribe();
      }
    });
    let l = log.clone();
    let s = subject.clone().subscribe(move |x| l.rc_deref_mut().push(("victim", x)));
    *victim.rc_deref_mut() = Some(s);

    subject.next(1);
    subject.next(2);
    assert_eq!(*log.rc_deref(), vec![("killer", 1), ("killer", 2)]);
  }

  #[test]
  fn subscribe_during_fan_out_starts_with_the_next_value() {
    let mut subject = Subject::<i32, ()>::new();
    let log = MutArc::own(vec![]);
    let (l, hub) = (log.clone(), subject.clone());
    subject.clone().subscribe(move |x| {
      l.rc_deref_mut().push(("outer", x));
      if x == 1 {
        let l = l.clone();
        hub.clone().subscribe(move |x| l.rc_deref_mut().push(("inner", x)));
      }
    });

    subject.next(1);
    subject.next(2);
    assert_eq!(*log.rc_deref(), vec![("outer", 1), ("outer", 2), ("inner", 2)]);
    assert_eq!(subject.subscribed_size(), 2);
  }
}
