//! Shared-ownership building blocks used by operators and subjects.
//!
//! [`MutArc`] is the thread-safe mutable cell every stateful operator keeps
//! its state in. [`SharedObserver`] is the handle used whenever one downstream
//! observer has to be reachable from several places at once (a timer task and
//! the upstream observer, several merged sources, the slots of a subject).

use std::sync::{
  atomic::{AtomicBool, Ordering},
  Arc,
};

use parking_lot::{Mutex, MutexGuard};

use crate::{observer::Observer, subscription::Subscription};

pub trait RcDeref {
  type Target<'a>
  where
    Self: 'a;
  #[allow(clippy::needless_lifetimes)]
  fn rc_deref<'a>(&'a self) -> Self::Target<'a>;
}

pub trait RcDerefMut {
  type Target<'a>
  where
    Self: 'a;
  #[allow(clippy::needless_lifetimes)]
  fn rc_deref_mut<'a>(&'a self) -> Self::Target<'a>;
}

/// `Arc<Mutex<T>>` with the deref helpers used across the crate.
#[derive(Default)]
pub struct MutArc<T>(Arc<Mutex<T>>);

impl<T> MutArc<T> {
  pub fn own(t: T) -> Self { Self(Arc::new(Mutex::new(t))) }

  /// Whether both handles point at the same cell.
  pub fn ptr_eq(&self, other: &Self) -> bool { Arc::ptr_eq(&self.0, &other.0) }
}

impl<T> RcDeref for MutArc<T> {
  type Target<'a>
    = MutexGuard<'a, T>
  where
    Self: 'a;

  #[inline]
  #[allow(clippy::needless_lifetimes)]
  fn rc_deref<'a>(&'a self) -> Self::Target<'a> { self.0.lock() }
}

impl<T> RcDerefMut for MutArc<T> {
  type Target<'a>
    = MutexGuard<'a, T>
  where
    Self: 'a;

  #[inline]
  #[allow(clippy::needless_lifetimes)]
  fn rc_deref_mut<'a>(&'a self) -> Self::Target<'a> { self.0.lock() }
}

impl<T> Clone for MutArc<T> {
  #[inline]
  fn clone(&self) -> Self { Self(self.0.clone()) }
}

// ============================================================================
// SharedObserver
// ============================================================================

struct SharedObserverInner<O> {
  closed: AtomicBool,
  observer: Mutex<Option<O>>,
}

/// A cloneable handle to a single downstream observer.
///
/// * Notifications are serialized by an internal lock, so a timer firing on
///   a worker thread and an upstream value arriving on another never
///   interleave inside the observer.
/// * The terminal notification takes the observer out, so every clone sees
///   the handle as finished afterwards.
/// * [`SharedObserver::close`] flips an atomic flag without waiting for the
///   lock: calling it from inside the observer's own `next` is fine, and no
///   notification that starts after `close` returns is delivered.
pub struct SharedObserver<O>(Arc<SharedObserverInner<O>>);

impl<O> Clone for SharedObserver<O> {
  #[inline]
  fn clone(&self) -> Self { Self(self.0.clone()) }
}

impl<O> SharedObserver<O> {
  pub fn new(observer: O) -> Self {
    Self(Arc::new(SharedObserverInner {
      closed: AtomicBool::new(false),
      observer: Mutex::new(Some(observer)),
    }))
  }

  #[inline]
  pub fn is_closed(&self) -> bool { self.0.closed.load(Ordering::Acquire) }

  /// Stops all further delivery and drops the observer if nobody is using it
  /// right now.
  pub fn close(&self) {
    self.0.closed.store(true, Ordering::Release);
    if let Some(mut guard) = self.0.observer.try_lock() {
      guard.take();
    }
  }

  pub fn emit_next<Item, Err>(&self, value: Item)
  where
    O: Observer<Item, Err>,
  {
    if self.is_closed() {
      return;
    }
    let mut guard = self.0.observer.lock();
    // Re-check under the lock: `close` may have raced us.
    if self.is_closed() {
      return;
    }
    if let Some(observer) = guard.as_mut() {
      observer.next(value);
    }
  }

  pub fn emit_error<Item, Err>(&self, err: Err)
  where
    O: Observer<Item, Err>,
  {
    if let Some(observer) = self.take_for_terminal() {
      observer.error(err);
    }
  }

  pub fn emit_complete<Item, Err>(&self)
  where
    O: Observer<Item, Err>,
  {
    if let Some(observer) = self.take_for_terminal() {
      observer.complete();
    }
  }

  pub fn observer_finished<Item, Err>(&self) -> bool
  where
    O: Observer<Item, Err>,
  {
    if self.is_closed() {
      return true;
    }
    match self.0.observer.try_lock() {
      Some(guard) => guard.as_ref().is_none_or(|o| Observer::<Item, Err>::is_finished(o)),
      // Somebody is delivering right now, so it is still alive.
      None => false,
    }
  }

  fn take_for_terminal(&self) -> Option<O> {
    if self.0.closed.swap(true, Ordering::AcqRel) {
      return None;
    }
    self.0.observer.lock().take()
  }
}

impl<Item, Err, O> Observer<Item, Err> for SharedObserver<O>
where
  O: Observer<Item, Err>,
{
  #[inline]
  fn next(&mut self, value: Item) { self.emit_next::<Item, Err>(value) }

  #[inline]
  fn error(self, err: Err) { self.emit_error::<Item, Err>(err) }

  #[inline]
  fn complete(self) { self.emit_complete::<Item, Err>() }

  #[inline]
  fn is_finished(&self) -> bool { self.observer_finished::<Item, Err>() }
}

/// Unsubscribing a shared observer closes it.
impl<O> Subscription for SharedObserver<O> {
  #[inline]
  fn unsubscribe(self) { self.close() }

  #[inline]
  fn is_closed(&self) -> bool { SharedObserver::is_closed(self) }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::observer::FnObserver;

  fn recording() -> (MutArc<Vec<String>>, impl Observer<i32, &'static str> + Send + 'static) {
    let log = MutArc::own(vec![]);
    let (l1, l2, l3) = (log.clone(), log.clone(), log.clone());
    let observer = FnObserver {
      next: move |v: i32| l1.rc_deref_mut().push(format!("next {v}")),
      error: move |e: &'static str| l2.rc_deref_mut().push(format!("error {e}")),
      complete: move || l3.rc_deref_mut().push("complete".to_string()),
    };
    (log, observer)
  }

  #[test]
  fn terminal_is_delivered_once() {
    let (log, observer) = recording();
    let shared = SharedObserver::new(observer);
    shared.emit_next::<i32, &'static str>(1);
    shared.emit_complete::<i32, &'static str>();
    shared.emit_error::<i32, &'static str>("late");
    shared.emit_next::<i32, &'static str>(2);
    assert_eq!(*log.rc_deref(), vec!["next 1", "complete"]);
    assert!(shared.is_closed());
  }

  #[test]
  fn close_stops_delivery() {
    let (log, observer) = recording();
    let shared = SharedObserver::new(observer);
    let other = shared.clone();
    shared.emit_next::<i32, &'static str>(1);
    other.close();
    shared.emit_next::<i32, &'static str>(2);
    shared.emit_complete::<i32, &'static str>();
    assert_eq!(*log.rc_deref(), vec!["next 1"]);
  }

  #[test]
  fn mut_arc_shares_state() {
    let a = MutArc::own(1);
    let b = a.clone();
    *b.rc_deref_mut() += 1;
    assert_eq!(*a.rc_deref(), 2);
    assert!(a.ptr_eq(&b));
  }
}
