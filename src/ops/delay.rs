use std::time::Duration;

use crate::{
  observable::Observable,
  observer::Observer,
  rc::SharedObserver,
  scheduler::Scheduler,
  subscription::{SharedSubscription, Subscription},
};

#[derive(Clone)]
pub struct DelayOp<S, SD> {
  pub(crate) source: S,
  pub(crate) duration: Duration,
  pub(crate) scheduler: SD,
}

impl<S, SD> Observable for DelayOp<S, SD>
where
  S: Observable,
  S::Item: Send + 'static,
  S::Err: 'static,
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
    let tasks = SharedSubscription::default();
    let subscription = SharedSubscription::default();
    subscription.add(observer.clone());
    subscription.add(tasks.clone());
    let delay =
      DelayObserver { observer, scheduler: self.scheduler, duration: self.duration, tasks };
    subscription.add(self.source.actual_subscribe(delay));
    subscription
  }
}

pub struct DelayObserver<O, SD> {
  observer: SharedObserver<O>,
  scheduler: SD,
  duration: Duration,
  tasks: SharedSubscription,
}

impl<Item, Err, O, SD> Observer<Item, Err> for DelayObserver<O, SD>
where
  O: Observer<Item, Err> + Send + 'static,
  SD: Scheduler,
  Item: Send + 'static,
  Err: 'static,
{
  fn next(&mut self, value: Item) {
    let observer = self.observer.clone();
    let task =
      self.scheduler.schedule(move || observer.emit_next::<Item, Err>(value), Some(self.duration));
    self.tasks.add(task);
  }

  fn error(self, err: Err) {
    self.tasks.unsubscribe();
    self.observer.emit_error::<Item, Err>(err);
  }

  fn complete(self) {
    // Same due time as the last value, so it runs after it.
    let observer = self.observer;
    let task =
      self.scheduler.schedule(move || observer.emit_complete::<Item, Err>(), Some(self.duration));
    self.tasks.add(task);
  }

  fn is_finished(&self) -> bool { self.observer.observer_finished::<Item, Err>() }
}
