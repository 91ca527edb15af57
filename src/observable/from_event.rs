//! Bridges callback-style event sources into observables.
//!
//! An event source only has to offer registration of a handler, returning a
//! token, and removal by that token. [`EventEmitter`] is a ready-made source
//! for code that raises the events itself (a text box's "text changed", a
//! button's "clicked").

use std::{marker::PhantomData, sync::Arc};

use parking_lot::Mutex;
use smallvec::SmallVec;

use crate::{
  observable::Observable,
  observer::Observer,
  rc::{MutArc, RcDeref, RcDerefMut, SharedObserver},
  subscription::{SharedSubscription, Subscription},
};

pub type EventHandler<Args> = Box<dyn FnMut(Args) + Send>;

/// Registration interface of an event-raising collaborator.
pub trait EventSource<Args>: Clone + Send + 'static {
  type Token: Send + 'static;

  fn add_handler(&self, handler: EventHandler<Args>) -> Self::Token;

  fn remove_handler(&self, token: Self::Token);
}

/// Observes the events raised by `source`.
///
/// Every subscription registers its own handler and removes it again on
/// unsubscribe. The stream never completes on its own.
pub fn from_event<Args, Err, ES>(source: ES) -> FromEvent<ES, Args, Err>
where
  ES: EventSource<Args>,
{
  FromEvent { source, _p: PhantomData }
}

pub struct FromEvent<ES, Args, Err> {
  source: ES,
  _p: PhantomData<fn() -> (Args, Err)>,
}

impl<ES: Clone, Args, Err> Clone for FromEvent<ES, Args, Err> {
  fn clone(&self) -> Self { FromEvent { source: self.source.clone(), _p: PhantomData } }
}

impl<ES, Args, Err> Observable for FromEvent<ES, Args, Err>
where
  ES: EventSource<Args>,
  Args: 'static,
  Err: 'static,
{
  type Item = Args;
  type Err = Err;
  type Unsub = SharedSubscription;

  fn actual_subscribe<O>(self, observer: O) -> SharedSubscription
  where
    O: Observer<Args, Err> + Send + 'static,
  {
    let observer = SharedObserver::new(observer);
    let subscription = SharedSubscription::default();
    subscription.add(observer.clone());
    let token = self
      .source
      .add_handler(Box::new(move |args| observer.emit_next::<Args, Err>(args)));
    subscription.add(Registration { source: self.source, token: Some(token), _args: PhantomData });
    subscription
  }
}

struct Registration<ES: EventSource<Args>, Args> {
  source: ES,
  token: Option<ES::Token>,
  _args: PhantomData<fn(Args)>,
}

impl<ES: EventSource<Args>, Args> Subscription for Registration<ES, Args> {
  fn unsubscribe(mut self) {
    if let Some(token) = self.token.take() {
      self.source.remove_handler(token);
    }
  }

  fn is_closed(&self) -> bool { self.token.is_none() }
}

// ============================================================================
// EventEmitter
// ============================================================================

/// Token identifying a handler registered on an [`EventEmitter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HandlerToken(u64);

type SharedHandler<Args> = Arc<Mutex<EventHandler<Args>>>;

struct Handlers<Args> {
  next_token: u64,
  registered: SmallVec<[(HandlerToken, SharedHandler<Args>); 2]>,
}

impl<Args> Default for Handlers<Args> {
  fn default() -> Self { Handlers { next_token: 0, registered: SmallVec::new() } }
}

/// A multicast callback registry.
///
/// Handlers run in registration order. `raise` works on a snapshot of the
/// registrations, so handlers may add or remove handlers while being called.
pub struct EventEmitter<Args>(MutArc<Handlers<Args>>);

impl<Args> Clone for EventEmitter<Args> {
  fn clone(&self) -> Self { EventEmitter(self.0.clone()) }
}

impl<Args> Default for EventEmitter<Args> {
  fn default() -> Self { EventEmitter(MutArc::own(Handlers::default())) }
}

impl<Args> EventEmitter<Args> {
  pub fn new() -> Self { Self::default() }

  pub fn handler_count(&self) -> usize { self.0.rc_deref().registered.len() }
}

impl<Args: Clone> EventEmitter<Args> {
  /// Calls every registered handler with a clone of `args`.
  pub fn raise(&self, args: Args) {
    let snapshot: SmallVec<[SharedHandler<Args>; 2]> = self
      .0
      .rc_deref()
      .registered
      .iter()
      .map(|(_, handler)| handler.clone())
      .collect();
    for handler in snapshot {
      let mut handler = handler.lock();
      (*handler)(args.clone());
    }
  }
}

impl<Args: 'static> EventSource<Args> for EventEmitter<Args> {
  type Token = HandlerToken;

  fn add_handler(&self, handler: EventHandler<Args>) -> HandlerToken {
    let mut handlers = self.0.rc_deref_mut();
    let token = HandlerToken(handlers.next_token);
    handlers.next_token += 1;
    handlers.registered.push((token, Arc::new(Mutex::new(handler))));
    token
  }

  fn remove_handler(&self, token: HandlerToken) {
    let removed = {
      let mut handlers = self.0.rc_deref_mut();
      let idx = handlers.registered.iter().position(|(t, _)| *t == token);
      idx.map(|idx| handlers.registered.remove(idx))
    };
    // Dropped outside the lock: the handler may own the last subscriber.
    drop(removed);
  }
}
