//! Connectable observables share one activation of a source among many
//! subscribers.
//!
//! Subscribing to a [`ConnectableObservable`] only attaches to its internal
//! subject. The source is subscribed when [`ConnectableObservable::connect`]
//! is called, and every value it produces is broadcast through the subject.
//!
//! ```rust
//! use rxsearch::prelude::*;
//!
//! let connectable = observable::from_iter::<_, ()>(1..=3).publish();
//! let (a, b) = (MutArc::own(vec![]), MutArc::own(vec![]));
//! let (sa, sb) = (a.clone(), b.clone());
//! connectable.clone().subscribe(move |v| sa.rc_deref_mut().push(v));
//! connectable.clone().subscribe(move |v| sb.rc_deref_mut().push(v * 10));
//!
//! // Nothing flows before connecting.
//! assert!(a.rc_deref().is_empty());
//!
//! let _connection = connectable.connect().unwrap();
//! assert_eq!(*a.rc_deref(), vec![1, 2, 3]);
//! assert_eq!(*b.rc_deref(), vec![10, 20, 30]);
//! ```

use crate::{
  error::ConnectError,
  observable::Observable,
  observer::Observer,
  ops::ref_count::RefCountOp,
  rc::{MutArc, RcDeref, RcDerefMut},
  subscription::{SharedSubscription, Subscription},
};

/// A source paired with the subject that multicasts it.
///
/// Clones share the subject and the connection state.
pub struct ConnectableObservable<S, P> {
  source: S,
  subject: P,
  connection: MutArc<Option<SharedSubscription>>,
}

impl<S: Clone, P: Clone> Clone for ConnectableObservable<S, P> {
  fn clone(&self) -> Self {
    ConnectableObservable {
      source: self.source.clone(),
      subject: self.subject.clone(),
      connection: self.connection.clone(),
    }
  }
}

impl<S, P> ConnectableObservable<S, P> {
  pub fn new(source: S, subject: P) -> Self {
    ConnectableObservable { source, subject, connection: MutArc::own(None) }
  }

  /// Connects on the first subscriber and disconnects when the last one
  /// leaves.
  pub fn ref_count(self) -> RefCountOp<S, P> { RefCountOp::new(self) }
}

impl<S, P> ConnectableObservable<S, P>
where
  S: Observable + Clone,
  P: Observer<S::Item, S::Err> + Clone + Send + 'static,
{
  /// Subscribes the source to the subject.
  ///
  /// Fails with [`ConnectError::AlreadyConnected`] while a previous
  /// connection is still live. Once that connection was unsubscribed,
  /// connecting again starts a fresh activation of the source.
  pub fn connect(&self) -> Result<Connection, ConnectError> {
    let connection = {
      let mut slot = self.connection.rc_deref_mut();
      if slot.as_ref().is_some_and(|c| !c.is_closed()) {
        return Err(ConnectError::AlreadyConnected);
      }
      let connection = SharedSubscription::default();
      *slot = Some(connection.clone());
      connection
    };
    tracing::debug!("connecting shared source");
    connection.add(self.source.clone().actual_subscribe(self.subject.clone()));
    Ok(Connection(connection))
  }

  /// Whether a connection is currently live.
  pub fn is_connected(&self) -> bool {
    self.connection.rc_deref().as_ref().is_some_and(|c| !c.is_closed())
  }
}

impl<S, P> Observable for ConnectableObservable<S, P>
where
  S: Observable,
  P: Observable<Item = S::Item, Err = S::Err>,
{
  type Item = S::Item;
  type Err = S::Err;
  type Unsub = P::Unsub;

  fn actual_subscribe<O>(self, observer: O) -> P::Unsub
  where
    O: Observer<S::Item, S::Err> + Send + 'static,
  {
    self.subject.actual_subscribe(observer)
  }
}

/// The live link between a connectable's source and its subject.
///
/// Unsubscribing tears down the shared source subscription; subscribers stay
/// attached to the subject and see values again after a reconnect.
#[derive(Debug)]
pub struct Connection(SharedSubscription);

impl Subscription for Connection {
  fn unsubscribe(self) {
    tracing::debug!("disconnecting shared source");
    self.0.unsubscribe()
  }

  fn is_closed(&self) -> bool { self.0.is_closed() }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{
    observable::{self, ObservableExt},
    scheduler::{Duration, TestScheduler},
    subject::Subject,
  };

  #[test]
  fn second_connect_is_a_usage_error() {
    let scheduler = TestScheduler::new();
    let connectable = observable::interval::<(), _>(Duration::from_millis(10), scheduler).publish();
    let first = connectable.connect();
    assert!(first.is_ok());
    assert_eq!(connectable.connect().err(), Some(ConnectError::AlreadyConnected));
    assert!(connectable.is_connected());
  }

  #[test]
  fn reconnect_after_disconnect_is_a_new_activation() {
    let scheduler = TestScheduler::new();
    let connectable =
      observable::interval::<(), _>(Duration::from_millis(10), scheduler.clone()).publish();
    let seen = MutArc::own(vec![]);
    let s = seen.clone();
    connectable.clone().subscribe(move |v| s.rc_deref_mut().push(v));

    let connection = connectable.connect().unwrap();
    scheduler.advance_by(Duration::from_millis(20));
    connection.unsubscribe();
    assert!(!connectable.is_connected());
    scheduler.advance_by(Duration::from_millis(20));

    let _connection = connectable.connect().unwrap();
    scheduler.advance_by(Duration::from_millis(10));
    // The interval restarted from zero.
    assert_eq!(*seen.rc_deref(), vec![0, 1, 0]);
  }

  #[test]
  fn source_runs_once_for_many_subscribers() {
    let activations = MutArc::own(0);
    let a = activations.clone();
    let source = observable::defer(move || {
      *a.rc_deref_mut() += 1;
      observable::of::<_, ()>(1)
    });
    let connectable = ConnectableObservable::new(source, Subject::new());
    connectable.clone().subscribe(|_| {});
    connectable.clone().subscribe(|_| {});
    let _connection = connectable.connect().unwrap();
    assert_eq!(*activations.rc_deref(), 1);
  }
}
