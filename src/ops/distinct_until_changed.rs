use crate::{observable::Observable, observer::Observer};

/// Comparer used by `distinct_until_changed`.
pub fn default_eq<T: PartialEq>(a: &T, b: &T) -> bool { a == b }

/// Forwards a value only if it differs from the last forwarded value,
/// according to `eq`.
#[derive(Clone)]
pub struct DistinctUntilChangedOp<S, F> {
  pub(crate) source: S,
  pub(crate) eq: F,
}

impl<S, F> Observable for DistinctUntilChangedOp<S, F>
where
  S: Observable,
  S::Item: Clone + Send + 'static,
  F: FnMut(&S::Item, &S::Item) -> bool + Send + 'static,
{
  type Item = S::Item;
  type Err = S::Err;
  type Unsub = S::Unsub;

  fn actual_subscribe<O>(self, observer: O) -> S::Unsub
  where
    O: Observer<S::Item, S::Err> + Send + 'static,
  {
    self
      .source
      .actual_subscribe(DistinctUntilChangedObserver { observer, eq: self.eq, last: None })
  }
}

pub struct DistinctUntilChangedObserver<O, F, Item> {
  observer: O,
  eq: F,
  last: Option<Item>,
}

impl<Item, Err, O, F> Observer<Item, Err> for DistinctUntilChangedObserver<O, F, Item>
where
  O: Observer<Item, Err>,
  F: FnMut(&Item, &Item) -> bool,
  Item: Clone,
{
  fn next(&mut self, value: Item) {
    if let Some(last) = &self.last {
      if (self.eq)(last, &value) {
        return;
      }
    }
    self.last = Some(value.clone());
    self.observer.next(value);
  }

  #[inline]
  fn error(self, err: Err) { self.observer.error(err) }

  #[inline]
  fn complete(self) { self.observer.complete() }

  #[inline]
  fn is_finished(&self) -> bool { self.observer.is_finished() }
}

#[cfg(test)]
mod tests {
  use crate::{
    observable::{self, ObservableExt},
    rc::{MutArc, RcDeref, RcDerefMut},
  };

  #[test]
  fn drops_adjacent_duplicates_only() {
    let seen = MutArc::own(vec![]);
    let s = seen.clone();
    observable::from_iter::<_, ()>(vec![1, 1, 2, 2, 2, 1, 3, 3])
      .distinct_until_changed()
      .subscribe(move |v| s.rc_deref_mut().push(v));
    assert_eq!(*seen.rc_deref(), vec![1, 2, 1, 3]);
  }

  #[test]
  fn custom_comparer() {
    let seen = MutArc::own(vec![]);
    let s = seen.clone();
    observable::from_iter::<_, ()>(vec!["cat", "CAT", "Cat", "dog"])
      .distinct_until_changed_by(|a: &&str, b: &&str| a.eq_ignore_ascii_case(b))
      .subscribe(move |v| s.rc_deref_mut().push(v));
    assert_eq!(*seen.rc_deref(), vec!["cat", "dog"]);
  }

  #[test]
  fn output_never_has_adjacent_equal_elements() {
    let input: Vec<u8> = (0..200u32).map(|i| ((i * 7919) % 5) as u8 / 2).collect();
    let seen = MutArc::own(vec![]);
    let s = seen.clone();
    observable::from_iter::<_, ()>(input.clone())
      .distinct_until_changed()
      .subscribe(move |v| s.rc_deref_mut().push(v));
    let out = seen.rc_deref().clone();
    assert!(out.windows(2).all(|w| w[0] != w[1]));

    // The output is an order-preserving subsequence of the input.
    let mut rest = input.iter();
    assert!(out.iter().all(|v| rest.any(|x| x == v)));
  }
}
