use crate::{observable::Observable, observer::Observer};

#[derive(Clone)]
pub struct StartWithOp<S, Item> {
  pub(crate) source: S,
  pub(crate) values: Vec<Item>,
}

impl<S> Observable for StartWithOp<S, S::Item>
where
  S: Observable,
{
  type Item = S::Item;
  type Err = S::Err;
  type Unsub = Option<S::Unsub>;

  fn actual_subscribe<O>(self, mut observer: O) -> Option<S::Unsub>
  where
    O: Observer<S::Item, S::Err> + Send + 'static,
  {
    for v in self.values {
      if observer.is_finished() {
        break;
      }
      observer.next(v);
    }
    (!observer.is_finished()).then(|| self.source.actual_subscribe(observer))
  }
}

#[cfg(test)]
mod tests {
  use crate::{
    observable::{self, ObservableExt},
    rc::{MutArc, RcDeref, RcDerefMut},
  };

  #[test]
  fn prefix_comes_first() {
    let seen = MutArc::own(vec![]);
    let s = seen.clone();
    observable::from_iter::<_, ()>(vec![3, 4])
      .start_with(vec![1, 2])
      .subscribe(move |v| s.rc_deref_mut().push(v));
    assert_eq!(*seen.rc_deref(), vec![1, 2, 3, 4]);
  }

  #[test]
  fn take_inside_prefix_skips_source() {
    let seen = MutArc::own(vec![]);
    let s = seen.clone();
    observable::from_iter::<_, ()>(vec![3, 4])
      .start_with(vec![1, 2])
      .take(1)
      .subscribe(move |v| s.rc_deref_mut().push(v));
    assert_eq!(*seen.rc_deref(), vec![1]);
  }
}
