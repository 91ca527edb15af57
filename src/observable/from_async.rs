use std::future::Future;

use futures::{
  future::{abortable, AbortHandle},
  task::{Spawn, SpawnExt},
};

use crate::{
  observable::Observable,
  observer::Observer,
  rc::SharedObserver,
  subscription::{SharedSubscription, Subscription},
};

/// Turns an asynchronous call into an observable.
///
/// `factory` is invoked once per subscription, so retrying the observable
/// issues a fresh call. The future runs on `spawner`; its `Ok` value is
/// emitted followed by completion, its `Err` becomes the error notification.
/// Unsubscribing aborts the future.
///
/// ```rust
/// use futures::executor::ThreadPool;
/// use rxsearch::prelude::*;
///
/// let pool = ThreadPool::new().unwrap();
/// let answer = observable::from_async(|| async { Ok::<_, ()>(42) }, pool).into_future();
/// assert_eq!(futures::executor::block_on(answer), Ok(42));
/// ```
pub fn from_async<F, Fut, SP>(factory: F, spawner: SP) -> FromAsync<F, SP>
where
  F: FnOnce() -> Fut,
  Fut: Future,
  SP: Spawn,
{
  FromAsync { factory, spawner }
}

#[derive(Clone)]
pub struct FromAsync<F, SP> {
  factory: F,
  spawner: SP,
}

impl<F, Fut, SP, Item, Err> Observable for FromAsync<F, SP>
where
  F: FnOnce() -> Fut,
  Fut: Future<Output = Result<Item, Err>> + Send + 'static,
  SP: Spawn,
  Item: Send + 'static,
  Err: Send + 'static,
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

    let call = (self.factory)();
    let (task, handle) = abortable(async move {
      match call.await {
        Ok(value) => {
          observer.emit_next::<Item, Err>(value);
          observer.emit_complete::<Item, Err>();
        }
        Err(err) => observer.emit_error::<Item, Err>(err),
      }
    });
    match self.spawner.spawn(async move {
      // Aborted means unsubscribed; nothing left to deliver.
      let _ = task.await;
    }) {
      Ok(()) => subscription.add(AbortOnUnsubscribe(handle)),
      Err(err) => {
        tracing::error!(%err, "from_async could not spawn its future");
        subscription.clone().unsubscribe();
      }
    }
    subscription
  }
}

struct AbortOnUnsubscribe(AbortHandle);

impl Subscription for AbortOnUnsubscribe {
  fn unsubscribe(self) { self.0.abort() }

  fn is_closed(&self) -> bool { self.0.is_aborted() }
}

#[cfg(test)]
mod tests {
  use std::time::Duration;

  use futures::executor::{block_on, ThreadPool};

  use super::*;
  use crate::{error::FirstValueError, observable::ObservableExt};

  #[test]
  fn emits_value_then_completes() {
    let pool = ThreadPool::new().unwrap();
    let first = from_async(|| async { Ok::<_, &'static str>("ok") }, pool).into_future();
    assert_eq!(block_on(first), Ok("ok"));
  }

  #[test]
  fn failure_becomes_error() {
    let pool = ThreadPool::new().unwrap();
    let first = from_async(|| async { Err::<i32, _>("down") }, pool).into_future();
    assert_eq!(block_on(first), Err(FirstValueError::Source("down")));
  }

  #[test]
  fn unsubscribe_aborts_the_call() {
    let pool = ThreadPool::new().unwrap();
    let (tx, rx) = std::sync::mpsc::channel();
    let (release_tx, release_rx) = futures::channel::oneshot::channel::<()>();
    let subscription = from_async(
      move || async move {
        let _ = release_rx.await;
        Ok::<_, ()>(1)
      },
      pool,
    )
    .subscribe(move |v| tx.send(v).unwrap_or_default());
    subscription.unsubscribe();
    let _ = release_tx.send(());
    assert!(rx.recv_timeout(Duration::from_millis(100)).is_err());
  }
}
