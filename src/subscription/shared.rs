use std::fmt::{Debug, Formatter};

use smallvec::SmallVec;

use super::{BoxedSubscription, Subscription};
use crate::rc::{MutArc, RcDeref, RcDerefMut};

/// A composite subscription: a bag of teardowns released together.
///
/// Cloning shares the bag. The first `unsubscribe` on any clone releases
/// every teardown; later calls are no-ops. Adding to a closed bag
/// unsubscribes the addition immediately, which is what makes it safe to hand
/// out the handle before the upstream subscription exists.
#[derive(Clone, Default)]
pub struct SharedSubscription(MutArc<Inner>);

#[derive(Default)]
struct Inner {
  closed: bool,
  teardown: SmallVec<[BoxedSubscription; 1]>,
}

impl SharedSubscription {
  pub fn add<S: Subscription + Send + 'static>(&self, subscription: S) {
    if subscription.is_closed() {
      return;
    }
    let mut inner = self.0.rc_deref_mut();
    if inner.closed {
      drop(inner);
      subscription.unsubscribe();
    } else {
      inner.teardown.retain(|v| !v.is_closed());
      inner.teardown.push(BoxedSubscription::new(subscription));
    }
  }

  /// Number of live teardowns held by this subscription.
  pub fn teardown_size(&self) -> usize { self.0.rc_deref().teardown.len() }

  fn close(&self) {
    let teardown = {
      let mut inner = self.0.rc_deref_mut();
      if inner.closed {
        return;
      }
      inner.closed = true;
      std::mem::take(&mut inner.teardown)
    };
    // Released outside the lock: a teardown may reach back into this bag.
    for v in teardown {
      v.unsubscribe();
    }
  }
}

impl Subscription for SharedSubscription {
  #[inline]
  fn unsubscribe(self) { self.close() }

  #[inline]
  fn is_closed(&self) -> bool { self.0.rc_deref().closed }
}

impl Debug for SharedSubscription {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    let inner = self.0.rc_deref();
    f.debug_struct("SharedSubscription")
      .field("closed", &inner.closed)
      .field("teardown_count", &inner.teardown.len())
      .finish()
  }
}
