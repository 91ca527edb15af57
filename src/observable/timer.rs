use std::marker::PhantomData;

use crate::{
  observable::Observable,
  observer::Observer,
  rc::SharedObserver,
  scheduler::{Duration, Scheduler},
  subscription::{SerialSubscription, SharedSubscription},
};

/// Emits `value` once after `delay`, then completes.
pub fn timer<Item, Err, SD>(value: Item, delay: Duration, scheduler: SD) -> Timer<Item, Err, SD>
where
  SD: Scheduler,
{
  Timer { value, delay, scheduler, _err: PhantomData }
}

pub struct Timer<Item, Err, SD> {
  value: Item,
  delay: Duration,
  scheduler: SD,
  _err: PhantomData<fn() -> Err>,
}

impl<Item: Clone, Err, SD: Clone> Clone for Timer<Item, Err, SD> {
  fn clone(&self) -> Self {
    Timer {
      value: self.value.clone(),
      delay: self.delay,
      scheduler: self.scheduler.clone(),
      _err: PhantomData,
    }
  }
}

impl<Item, Err, SD> Observable for Timer<Item, Err, SD>
where
  Item: Send + 'static,
  Err: 'static,
  SD: Scheduler,
{
  type Item = Item;
  type Err = Err;
  type Unsub = SharedSubscription;

  fn actual_subscribe<O>(self, observer: O) -> SharedSubscription
  where
    O: Observer<Item, Err> + Send + 'static,
  {
    let observer = SharedObserver::new(observer);
    let subscription = SharedSubscription::default();
    subscription.add(observer.clone());
    let value = self.value;
    let handle = self.scheduler.schedule(
      move || {
        observer.emit_next::<Item, Err>(value);
        observer.emit_complete::<Item, Err>();
      },
      Some(self.delay),
    );
    subscription.add(handle);
    subscription
  }
}

/// Emits `0, 1, 2, ...`, one value every `period`, never completing.
///
/// Each tick schedules the next one, so a virtual-time scheduler only ever
/// holds a single pending task per subscription. The scheduler must not run
/// tasks inline: with [`ImmediateScheduler`](crate::scheduler::ImmediateScheduler)
/// the ticks would recurse forever.
pub fn interval<Err, SD: Scheduler>(period: Duration, scheduler: SD) -> Interval<Err, SD> {
  Interval { period, scheduler, _err: PhantomData }
}

pub struct Interval<Err, SD> {
  period: Duration,
  scheduler: SD,
  _err: PhantomData<fn() -> Err>,
}

impl<Err, SD: Clone> Clone for Interval<Err, SD> {
  fn clone(&self) -> Self {
    Interval { period: self.period, scheduler: self.scheduler.clone(), _err: PhantomData }
  }
}

impl<Err, SD> Observable for Interval<Err, SD>
where
  Err: 'static,
  SD: Scheduler,
{
  type Item = usize;
  type Err = Err;
  type Unsub = SharedSubscription;

  fn actual_subscribe<O>(self, observer: O) -> SharedSubscription
  where
    O: Observer<usize, Err> + Send + 'static,
  {
    let observer = SharedObserver::new(observer);
    let pending = SerialSubscription::default();
    let subscription = SharedSubscription::default();
    subscription.add(observer.clone());
    subscription.add(pending.clone());
    let tick = Tick { observer, scheduler: self.scheduler, period: self.period, pending };
    schedule_tick::<Err, _, _>(tick, 0);
    subscription
  }
}

struct Tick<O, SD> {
  observer: SharedObserver<O>,
  scheduler: SD,
  period: Duration,
  pending: SerialSubscription,
}

fn schedule_tick<Err, O, SD>(tick: Tick<O, SD>, index: usize)
where
  O: Observer<usize, Err> + Send + 'static,
  SD: Scheduler,
  Err: 'static,
{
  let scheduler = tick.scheduler.clone();
  let period = tick.period;
  let pending = tick.pending.clone();
  let handle = scheduler.schedule(
    move || {
      tick.observer.emit_next::<usize, Err>(index);
      if !tick.observer.observer_finished::<usize, Err>() {
        schedule_tick::<Err, _, _>(tick, index + 1);
      }
    },
    Some(period),
  );
  pending.replace(handle);
}
