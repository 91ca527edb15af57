//! Subscription handles.
//!
//! A subscription owns the relationship between one observer and one
//! activation of an observable. `unsubscribe` consumes the handle; handles
//! that can be shared ([`SharedSubscription`], [`SerialSubscription`]) are
//! cloneable and unsubscribing any clone is idempotent.

mod boxed;
mod serial;
mod shared;
mod tuple;

pub use boxed::*;
pub use serial::*;
pub use shared::*;
pub use tuple::*;

/// Subscription returned from `Observable::actual_subscribe` to allow
/// unsubscribing.
pub trait Subscription {
  /// Deregister the observer. Timers and upstream subscriptions owned by this
  /// activation are released before the call returns.
  fn unsubscribe(self);

  fn is_closed(&self) -> bool;
}

/// The subscription of a source that already finished synchronously.
impl Subscription for () {
  #[inline]
  fn unsubscribe(self) {}

  #[inline]
  fn is_closed(&self) -> bool { true }
}

impl<T: Subscription> Subscription for Option<T> {
  fn unsubscribe(self) {
    if let Some(inner) = self {
      inner.unsubscribe();
    }
  }

  fn is_closed(&self) -> bool { self.as_ref().is_none_or(Subscription::is_closed) }
}

/// An RAII implementation of a "scoped subscribed" of a subscription.
/// When this structure is dropped (falls out of scope), the subscription will
/// be unsubscribed.
///
/// If you want to drop it immediately, wrap it in its own scope.
#[must_use]
pub struct SubscriptionGuard<T: Subscription>(Option<T>);

impl<T: Subscription> SubscriptionGuard<T> {
  /// Wraps an existing subscription with a guard to enable RAII behavior for
  /// it.
  pub fn new(subscription: T) -> SubscriptionGuard<T> { SubscriptionGuard(Some(subscription)) }

  /// Gives the subscription back without unsubscribing it.
  pub fn into_inner(mut self) -> Option<T> { self.0.take() }
}

impl<T: Subscription> Drop for SubscriptionGuard<T> {
  #[inline]
  fn drop(&mut self) {
    if let Some(subscription) = self.0.take() {
      subscription.unsubscribe();
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn guard_unsubscribes_on_drop() {
    let shared = SharedSubscription::default();
    {
      let _guard = SubscriptionGuard::new(shared.clone());
      assert!(!shared.is_closed());
    }
    assert!(shared.is_closed());
  }

  #[test]
  fn guard_into_inner_keeps_subscription() {
    let shared = SharedSubscription::default();
    let guard = SubscriptionGuard::new(shared.clone());
    let inner = guard.into_inner();
    assert!(!shared.is_closed());
    inner.unsubscribe();
    assert!(shared.is_closed());
  }
}
