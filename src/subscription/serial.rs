use super::{BoxedSubscription, Subscription};
use crate::rc::{MutArc, RcDeref, RcDerefMut};

/// Holds at most one inner subscription; installing a new one releases the
/// previous one.
///
/// `switch_on_next` keeps the active inner stream here, `timeout` and
/// `throttle` keep their pending timer here.
#[derive(Clone, Default)]
pub struct SerialSubscription(MutArc<SerialInner>);

#[derive(Default)]
struct SerialInner {
  closed: bool,
  current: Option<BoxedSubscription>,
}

impl SerialSubscription {
  /// Installs `subscription`, unsubscribing the one it replaces. If this
  /// handle is already closed, `subscription` is unsubscribed right away.
  pub fn replace<S: Subscription + Send + 'static>(&self, subscription: S) {
    let mut inner = self.0.rc_deref_mut();
    if inner.closed {
      drop(inner);
      subscription.unsubscribe();
    } else {
      let old = inner.current.replace(BoxedSubscription::new(subscription));
      drop(inner);
      old.unsubscribe();
    }
  }

  /// Unsubscribes the current inner subscription, keeping this handle open.
  pub fn clear(&self) {
    let old = self.0.rc_deref_mut().current.take();
    old.unsubscribe();
  }
}

impl Subscription for SerialSubscription {
  fn unsubscribe(self) {
    let old = {
      let mut inner = self.0.rc_deref_mut();
      inner.closed = true;
      inner.current.take()
    };
    old.unsubscribe();
  }

  #[inline]
  fn is_closed(&self) -> bool { self.0.rc_deref().closed }
}
