use super::Subscription;

/// `Subscription::unsubscribe` takes `self`, so trait objects go through this
/// boxed-receiver twin.
pub trait BoxedSubscriptionInner {
  fn boxed_unsubscribe(self: Box<Self>);
  fn boxed_is_closed(&self) -> bool;
}

impl<T: Subscription> BoxedSubscriptionInner for T {
  #[inline]
  fn boxed_unsubscribe(self: Box<Self>) { (*self).unsubscribe() }

  #[inline]
  fn boxed_is_closed(&self) -> bool { self.is_closed() }
}

/// Any `Send` subscription behind one type, as stored by
/// [`SharedSubscription`](super::SharedSubscription),
/// [`SerialSubscription`](super::SerialSubscription) and
/// [`BoxedObservable`](crate::observable::BoxedObservable).
pub struct BoxedSubscription(Box<dyn BoxedSubscriptionInner + Send>);

impl BoxedSubscription {
  #[inline]
  pub fn new(subscription: impl Subscription + Send + 'static) -> Self {
    Self(Box::new(subscription))
  }
}

impl Subscription for BoxedSubscription {
  #[inline]
  fn unsubscribe(self) { self.0.boxed_unsubscribe() }

  #[inline]
  fn is_closed(&self) -> bool { self.0.boxed_is_closed() }
}
