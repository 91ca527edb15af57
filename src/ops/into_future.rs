//! Bridges a stream into `async` code by awaiting its first value.

use std::{
  future::Future,
  pin::Pin,
  task::{Context, Poll},
};

use futures::channel::oneshot;

use crate::{
  error::FirstValueError,
  observable::Observable,
  observer::Observer,
  subscription::{SharedSubscription, Subscription},
};

/// Resolves with the first value of the source, its error, or
/// [`FirstValueError::Empty`] when it completes without a value.
///
/// The source is subscribed when the future is created and released after the
/// first value. Dropping the future unsubscribes.
///
/// ```rust
/// use rxsearch::prelude::*;
///
/// let first = observable::from_iter::<_, ()>(vec![3, 4]).into_future();
/// assert_eq!(futures::executor::block_on(first), Ok(3));
///
/// let none = observable::empty::<i32, ()>().into_future();
/// assert_eq!(futures::executor::block_on(none), Err(FirstValueError::Empty));
/// ```
#[must_use = "futures do nothing unless polled"]
pub struct ObservableFuture<Item, Err> {
  receiver: oneshot::Receiver<Result<Item, Err>>,
  subscription: SharedSubscription,
}

impl<Item, Err> ObservableFuture<Item, Err>
where
  Item: Send + 'static,
  Err: Send + 'static,
{
  pub fn new<S>(source: S) -> Self
  where
    S: Observable<Item = Item, Err = Err>,
  {
    let (sender, receiver) = oneshot::channel();
    let subscription = SharedSubscription::default();
    let observer = FirstValueObserver { sender: Some(sender), upstream: subscription.clone() };
    subscription.add(source.actual_subscribe(observer));
    ObservableFuture { receiver, subscription }
  }
}

impl<Item, Err> Future for ObservableFuture<Item, Err> {
  type Output = Result<Item, FirstValueError<Err>>;

  fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
    Pin::new(&mut self.receiver).poll(cx).map(|received| match received {
      Ok(Ok(value)) => Ok(value),
      Ok(Err(err)) => Err(FirstValueError::Source(err)),
      Err(oneshot::Canceled) => Err(FirstValueError::Empty),
    })
  }
}

impl<Item, Err> Drop for ObservableFuture<Item, Err> {
  fn drop(&mut self) { self.subscription.clone().unsubscribe(); }
}

struct FirstValueObserver<Item, Err> {
  sender: Option<oneshot::Sender<Result<Item, Err>>>,
  upstream: SharedSubscription,
}

impl<Item, Err> Observer<Item, Err> for FirstValueObserver<Item, Err> {
  fn next(&mut self, value: Item) {
    if let Some(sender) = self.sender.take() {
      // The receiver may already be gone; nobody is waiting then.
      let _ = sender.send(Ok(value));
      self.upstream.clone().unsubscribe();
    }
  }

  fn error(mut self, err: Err) {
    if let Some(sender) = self.sender.take() {
      let _ = sender.send(Err(err));
    }
  }

  // Dropping the sender resolves the future with `Empty`.
  fn complete(self) {}

  fn is_finished(&self) -> bool { self.sender.is_none() }
}
