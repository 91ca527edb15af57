use std::marker::PhantomData;

use crate::{
  observable::Observable,
  observer::{BoxedObserver, Observer},
  rc::SharedObserver,
  subscription::{SharedSubscription, Subscription},
};

/// Creates an observable from a producer function.
///
/// `subscribe` runs once per subscription with an [`Emitter`] for that
/// subscription and returns the teardown to run when the subscription ends
/// (`()` when there is nothing to release). The emitter is cloneable and can
/// be moved into callbacks or threads.
///
/// # Example
///
/// ```rust
/// use rxsearch::prelude::*;
///
/// let seen = MutArc::own(vec![]);
/// let sink = seen.clone();
/// observable::create::<_, (), _, _>(|emitter| {
///   emitter.next(1);
///   emitter.next(2);
///   emitter.complete();
/// })
/// .subscribe(move |v| sink.rc_deref_mut().push(v));
/// assert_eq!(*seen.rc_deref(), vec![1, 2]);
/// ```
pub fn create<Item, Err, F, U>(subscribe: F) -> Create<F, Item, Err>
where
  F: FnOnce(Emitter<Item, Err>) -> U,
  U: Subscription,
{
  Create { subscribe, _p: PhantomData }
}

pub struct Create<F, Item, Err> {
  subscribe: F,
  _p: PhantomData<fn() -> (Item, Err)>,
}

impl<F: Clone, Item, Err> Clone for Create<F, Item, Err> {
  fn clone(&self) -> Self { Create { subscribe: self.subscribe.clone(), _p: PhantomData } }
}

impl<F, U, Item, Err> Observable for Create<F, Item, Err>
where
  F: FnOnce(Emitter<Item, Err>) -> U,
  U: Subscription + Send + 'static,
  Item: 'static,
  Err: 'static,
{
  type Item = Item;
  type Err = Err;
  type Unsub = SharedSubscription;

  fn actual_subscribe<O>(self, observer: O) -> SharedSubscription
  where
    O: Observer<Item, Err> + Send + 'static,
  {
    let observer: BoxedObserver<Item, Err> = Box::new(observer);
    let emitter = Emitter(SharedObserver::new(observer));
    let subscription = SharedSubscription::default();
    subscription.add(emitter.0.clone());
    subscription.add((self.subscribe)(emitter));
    subscription
  }
}

/// Handle a [`create`] producer pushes notifications through.
///
/// After a terminal notification or an unsubscribe, every call is a no-op.
pub struct Emitter<Item, Err>(SharedObserver<BoxedObserver<Item, Err>>);

impl<Item, Err> Clone for Emitter<Item, Err> {
  fn clone(&self) -> Self { Emitter(self.0.clone()) }
}

impl<Item, Err> Emitter<Item, Err> {
  pub fn next(&self, value: Item) { self.0.emit_next::<Item, Err>(value) }

  pub fn error(&self, err: Err) { self.0.emit_error::<Item, Err>(err) }

  pub fn complete(&self) { self.0.emit_complete::<Item, Err>() }

  /// Whether the subscriber stopped listening. Long-running producers should
  /// poll this and stop.
  pub fn is_closed(&self) -> bool { self.0.observer_finished::<Item, Err>() }
}

#[cfg(test)]
mod tests {
  use std::{sync::mpsc, thread};

  use super::*;
  use crate::{
    observable::ObservableExt,
    rc::{MutArc, RcDeref, RcDerefMut},
  };

  #[test]
  fn nothing_after_terminal() {
    let log = MutArc::own(vec![]);
    let (l1, l2, l3) = (log.clone(), log.clone(), log.clone());
    create::<i32, &'static str, _, _>(|emitter| {
      emitter.next(1);
      emitter.error("boom");
      emitter.next(2);
      emitter.complete();
    })
    .subscribe_all(
      move |v| l1.rc_deref_mut().push(format!("next {v}")),
      move |e| l2.rc_deref_mut().push(format!("error {e}")),
      move || l3.rc_deref_mut().push("complete".to_string()),
    );
    assert_eq!(*log.rc_deref(), vec!["next 1", "error boom"]);
  }

  #[test]
  fn teardown_runs_on_unsubscribe() {
    let teardown = SharedSubscription::default();
    let t = teardown.clone();
    let subscription = create::<i32, (), _, _>(move |_| t).subscribe(|_| {});
    assert!(!teardown.is_closed());
    subscription.unsubscribe();
    assert!(teardown.is_closed());
  }

  #[test]
  fn emitter_from_another_thread() {
    let (tx, rx) = mpsc::channel();
    let (gate_tx, gate_rx) = mpsc::channel::<()>();
    create::<i32, (), _, _>(move |emitter| {
      thread::spawn(move || {
        emitter.next(5);
        emitter.complete();
        gate_tx.send(()).unwrap_or_default();
      });
    })
    .subscribe(move |v| tx.send(v).unwrap_or_default());
    gate_rx.recv_timeout(std::time::Duration::from_secs(5)).unwrap();
    assert_eq!(rx.try_iter().collect::<Vec<_>>(), vec![5]);
  }

  #[test]
  fn unsubscribed_emitter_is_closed() {
    let slot = MutArc::own(None);
    let s = slot.clone();
    let subscription = create::<i32, (), _, _>(move |emitter| {
      *s.rc_deref_mut() = Some(emitter);
    })
    .subscribe(|_| {});
    subscription.unsubscribe();
    let emitter = slot.rc_deref_mut().take().unwrap();
    assert!(emitter.is_closed());
  }
}
