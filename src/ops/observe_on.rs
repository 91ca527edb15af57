use std::collections::VecDeque;

use crate::{
  observable::Observable,
  observer::Observer,
  rc::{MutArc, RcDerefMut, SharedObserver},
  scheduler::Scheduler,
  subscription::SharedSubscription,
};

#[derive(Clone)]
pub struct ObserveOnOp<S, SD> {
  pub(crate) source: S,
  pub(crate) scheduler: SD,
}

impl<S, SD> Observable for ObserveOnOp<S, SD>
where
  S: Observable,
  S::Item: Send + 'static,
  S::Err: Send + 'static,
  SD: Scheduler,
{
  type Item = S::Item;
  type Err = S::Err;
  type Unsub = SharedSubscription;

  fn actual_subscribe<O>(self, observer: O) -> SharedSubscription
  where
    O: Observer<S::Item, S::Err> + Send + 'static,
  {
    let observer = SharedObserver::new(observer);
    let drains = SharedSubscription::default();
    let subscription = SharedSubscription::default();
    subscription.add(observer.clone());
    subscription.add(drains.clone());
    let observe_on = ObserveOnObserver {
      observer,
      scheduler: self.scheduler,
      queue: MutArc::own(Queue { draining: false, items: VecDeque::new() }),
      drains,
    };
    subscription.add(self.source.actual_subscribe(observe_on));
    subscription
  }
}

enum Notification<Item, Err> {
  Next(Item),
  Error(Err),
  Complete,
}

struct Queue<Item, Err> {
  draining: bool,
  items: VecDeque<Notification<Item, Err>>,
}

/// Queues notifications and drains them in order on the scheduler. At most
/// one drain task is scheduled at a time.
pub struct ObserveOnObserver<O, SD, Item, Err> {
  observer: SharedObserver<O>,
  scheduler: SD,
  queue: MutArc<Queue<Item, Err>>,
  drains: SharedSubscription,
}

impl<O, SD, Item, Err> ObserveOnObserver<O, SD, Item, Err>
where
  O: Observer<Item, Err> + Send + 'static,
  SD: Scheduler,
  Item: Send + 'static,
  Err: Send + 'static,
{
  fn enqueue(&self, notification: Notification<Item, Err>) {
    let start = {
      let mut queue = self.queue.rc_deref_mut();
      queue.items.push_back(notification);
      !std::mem::replace(&mut queue.draining, true)
    };
    if !start {
      return;
    }
    let observer = self.observer.clone();
    let queue = self.queue.clone();
    let task = self.scheduler.schedule(move || drain(&observer, &queue), None);
    self.drains.add(task);
  }
}

fn drain<O, Item, Err>(observer: &SharedObserver<O>, queue: &MutArc<Queue<Item, Err>>)
where
  O: Observer<Item, Err>,
{
  loop {
    let notification = {
      let mut queue = queue.rc_deref_mut();
      match queue.items.pop_front() {
        Some(notification) => notification,
        None => {
          queue.draining = false;
          return;
        }
      }
    };
    match notification {
      Notification::Next(value) => observer.emit_next::<Item, Err>(value),
      Notification::Error(err) => observer.emit_error::<Item, Err>(err),
      Notification::Complete => observer.emit_complete::<Item, Err>(),
    }
  }
}

impl<Item, Err, O, SD> Observer<Item, Err> for ObserveOnObserver<O, SD, Item, Err>
where
  O: Observer<Item, Err> + Send + 'static,
  SD: Scheduler,
  Item: Send + 'static,
  Err: Send + 'static,
{
  fn next(&mut self, value: Item) { self.enqueue(Notification::Next(value)) }

  fn error(self, err: Err) { self.enqueue(Notification::Error(err)) }

  fn complete(self) { self.enqueue(Notification::Complete) }

  fn is_finished(&self) -> bool { self.observer.observer_finished::<Item, Err>() }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{
    observable::{self, ObservableExt},
    rc::RcDeref,
    scheduler::{NewThreadScheduler, TestScheduler},
  };

  #[test]
  fn nothing_is_delivered_until_the_scheduler_runs() {
    let scheduler = TestScheduler::new();
    let log = MutArc::own(vec![]);
    let (l1, l2) = (log.clone(), log.clone());
    observable::from_iter::<_, ()>(vec![1, 2, 3]).observe_on(scheduler.clone()).subscribe_all(
      move |v| l1.rc_deref_mut().push(format!("next {v}")),
      |_| {},
      move || l2.rc_deref_mut().push("complete".to_string()),
    );
    assert!(log.rc_deref().is_empty());
    assert_eq!(scheduler.pending(), 1);
    scheduler.flush();
    assert_eq!(*log.rc_deref(), vec!["next 1", "next 2", "next 3", "complete"]);
  }

  #[test]
  fn delivers_on_another_thread() {
    let (tx, rx) = std::sync::mpsc::channel();
    let caller = std::thread::current().id();
    observable::from_iter::<_, ()>(0..3).observe_on(NewThreadScheduler).subscribe_all(
      {
        let tx = tx.clone();
        move |v| tx.send(Some((v, std::thread::current().id()))).unwrap_or_default()
      },
      |_| {},
      move || tx.send(None).unwrap_or_default(),
    );
    let mut values = vec![];
    while let Ok(Some((v, thread))) = rx.recv() {
      assert_ne!(thread, caller);
      values.push(v);
    }
    assert_eq!(values, vec![0, 1, 2]);
  }
}
