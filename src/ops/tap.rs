use crate::{observable::Observable, observer::Observer};

/// Runs a side effect for every value, passing the value on unchanged.
#[derive(Clone)]
pub struct TapOp<S, F> {
  pub(crate) source: S,
  pub(crate) func: F,
}

impl<S, F> Observable for TapOp<S, F>
where
  S: Observable,
  F: FnMut(&S::Item) + Send + 'static,
{
  type Item = S::Item;
  type Err = S::Err;
  type Unsub = S::Unsub;

  fn actual_subscribe<O>(self, observer: O) -> S::Unsub
  where
    O: Observer<S::Item, S::Err> + Send + 'static,
  {
    self.source.actual_subscribe(TapObserver { observer, func: self.func })
  }
}

pub struct TapObserver<O, F> {
  observer: O,
  func: F,
}

impl<Item, Err, O, F> Observer<Item, Err> for TapObserver<O, F>
where
  O: Observer<Item, Err>,
  F: FnMut(&Item),
{
  fn next(&mut self, value: Item) {
    (self.func)(&value);
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
  fn side_effects_see_values_and_errors() {
    let log = MutArc::own(vec![]);
    let (l1, l2, l3) = (log.clone(), log.clone(), log.clone());
    observable::from_iter(vec![1, 2])
      .try_map(|v| if v < 2 { Ok(v) } else { Err("too big") })
      .tap(move |v| l1.rc_deref_mut().push(format!("tap {v}")))
      .tap_err(move |e| l2.rc_deref_mut().push(format!("tap_err {e}")))
      .subscribe_err(move |v| l3.rc_deref_mut().push(format!("next {v}")), |_| {});
    assert_eq!(*log.rc_deref(), vec!["tap 1", "next 1", "tap_err too big"]);
  }
}
