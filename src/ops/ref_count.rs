use std::sync::{
  atomic::{AtomicBool, Ordering},
  Arc,
};

use crate::{
  observable::{Connection, ConnectableObservable, Observable},
  observer::Observer,
  rc::{MutArc, RcDeref, RcDerefMut},
  subscription::{Subscription, TupleSubscription},
};

/// Connects a [`ConnectableObservable`] when its first subscriber arrives and
/// disconnects it when the last one leaves. A later first subscriber starts a
/// fresh connection.
pub struct RefCountOp<S, P> {
  connectable: ConnectableObservable<S, P>,
  state: MutArc<RefCountState>,
}

#[derive(Default)]
struct RefCountState {
  count: usize,
  connection: Option<Connection>,
}

impl<S: Clone, P: Clone> Clone for RefCountOp<S, P> {
  fn clone(&self) -> Self {
    RefCountOp { connectable: self.connectable.clone(), state: self.state.clone() }
  }
}

impl<S, P> RefCountOp<S, P> {
  pub fn new(connectable: ConnectableObservable<S, P>) -> Self {
    RefCountOp { connectable, state: MutArc::own(RefCountState::default()) }
  }

  /// Number of live subscribers.
  pub fn subscriber_count(&self) -> usize { self.state.rc_deref().count }
}

impl<S, P> Observable for RefCountOp<S, P>
where
  S: Observable + Clone,
  P: Observable<Item = S::Item, Err = S::Err> + Observer<S::Item, S::Err> + Clone + Send + 'static,
{
  type Item = S::Item;
  type Err = S::Err;
  type Unsub = TupleSubscription<P::Unsub, RefCountRelease>;

  fn actual_subscribe<O>(self, observer: O) -> Self::Unsub
  where
    O: Observer<S::Item, S::Err> + Send + 'static,
  {
    let first = {
      let mut state = self.state.rc_deref_mut();
      state.count += 1;
      state.count == 1
    };
    let release = RefCountRelease { state: self.state.clone(), released: Arc::new(AtomicBool::new(false)) };
    let attached =
      self.connectable.clone().actual_subscribe(RefCountObserver { observer, release: release.clone() });
    if first && !release.is_closed() {
      tracing::trace!("first subscriber, connecting");
      match self.connectable.connect() {
        Ok(connection) => {
          let mut state = self.state.rc_deref_mut();
          if state.count == 0 {
            // Everybody left while we were connecting.
            drop(state);
            connection.unsubscribe();
          } else {
            state.connection = Some(connection);
          }
        }
        Err(err) => tracing::debug!(%err, "source already connected elsewhere"),
      }
    }
    TupleSubscription::new(attached, release)
  }
}

/// Forwards to the subscriber and drops its reference once it terminated.
struct RefCountObserver<O> {
  observer: O,
  release: RefCountRelease,
}

impl<Item, Err, O: Observer<Item, Err>> Observer<Item, Err> for RefCountObserver<O> {
  fn next(&mut self, value: Item) { self.observer.next(value) }

  fn error(self, err: Err) {
    self.observer.error(err);
    self.release.release();
  }

  fn complete(self) {
    self.observer.complete();
    self.release.release();
  }

  fn is_finished(&self) -> bool { self.observer.is_finished() }
}

/// Drops one reference; the last one disconnects the source. Closed once the
/// reference was dropped, by unsubscribing or by the subscriber terminating.
#[derive(Clone)]
pub struct RefCountRelease {
  state: MutArc<RefCountState>,
  released: Arc<AtomicBool>,
}

impl RefCountRelease {
  fn release(&self) {
    if self.released.swap(true, Ordering::AcqRel) {
      return;
    }
    let connection = {
      let mut state = self.state.rc_deref_mut();
      state.count = state.count.saturating_sub(1);
      if state.count == 0 { state.connection.take() } else { None }
    };
    if let Some(connection) = connection {
      tracing::trace!("last subscriber left, disconnecting");
      connection.unsubscribe();
    }
  }
}

impl Subscription for RefCountRelease {
  fn unsubscribe(self) { self.release() }

  fn is_closed(&self) -> bool { self.released.load(Ordering::Acquire) }
}
