use super::Subscription;

/// Two teardowns released together, first then second.
///
/// `ref_count` pairs the subject registration with the release of its
/// connection reference this way.
pub struct TupleSubscription<A, B> {
  first: A,
  second: B,
}

impl<A, B> TupleSubscription<A, B> {
  pub fn new(first: A, second: B) -> Self { TupleSubscription { first, second } }
}

impl<A: Subscription, B: Subscription> Subscription for TupleSubscription<A, B> {
  fn unsubscribe(self) {
    self.first.unsubscribe();
    self.second.unsubscribe();
  }

  fn is_closed(&self) -> bool { self.first.is_closed() && self.second.is_closed() }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::subscription::SharedSubscription;

  #[test]
  fn releases_both_halves() {
    let (registration, connection) = (SharedSubscription::default(), SharedSubscription::default());
    let pair = TupleSubscription::new(registration.clone(), connection.clone());

    connection.clone().unsubscribe();
    assert!(!pair.is_closed());

    pair.unsubscribe();
    assert!(registration.is_closed());
    assert!(connection.is_closed());
  }
}
