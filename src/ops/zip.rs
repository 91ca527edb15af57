use std::collections::VecDeque;

use crate::{
  observable::Observable,
  observer::Observer,
  rc::{MutArc, RcDerefMut, SharedObserver},
  subscription::{SharedSubscription, Subscription},
};

// ============================================================================
// Two-source plumbing shared with `combine_latest`
// ============================================================================

pub enum Either<L, R> {
  Left(L),
  Right(R),
}

/// Receives the notifications of two upstream sources.
pub trait PairSink {
  type Left;
  type Right;
  type Err;

  fn on_next(&self, value: Either<Self::Left, Self::Right>);
  fn on_error(&self, err: Self::Err);
  /// `left` tells which source completed.
  fn on_complete(&self, left: bool);
  fn is_finished(&self) -> bool;
}

pub struct LeftObserver<P>(pub(crate) P);

pub struct RightObserver<P>(pub(crate) P);

impl<P: PairSink> Observer<P::Left, P::Err> for LeftObserver<P> {
  #[inline]
  fn next(&mut self, value: P::Left) { self.0.on_next(Either::Left(value)) }

  #[inline]
  fn error(self, err: P::Err) { self.0.on_error(err) }

  #[inline]
  fn complete(self) { self.0.on_complete(true) }

  #[inline]
  fn is_finished(&self) -> bool { self.0.is_finished() }
}

impl<P: PairSink> Observer<P::Right, P::Err> for RightObserver<P> {
  #[inline]
  fn next(&mut self, value: P::Right) { self.0.on_next(Either::Right(value)) }

  #[inline]
  fn error(self, err: P::Err) { self.0.on_error(err) }

  #[inline]
  fn complete(self) { self.0.on_complete(false) }

  #[inline]
  fn is_finished(&self) -> bool { self.0.is_finished() }
}

// ============================================================================
// Zip
// ============================================================================

/// Pairs the n-th value of one source with the n-th value of the other.
///
/// Unpaired values wait in a FIFO queue per source. The result completes as
/// soon as a completed source has no queued values left, since no further
/// pair is possible.
#[derive(Clone)]
pub struct ZipOp<S1, S2> {
  pub(crate) left: S1,
  pub(crate) right: S2,
}

impl<S1, S2> Observable for ZipOp<S1, S2>
where
  S1: Observable,
  S2: Observable<Err = S1::Err>,
  S1::Item: Send + 'static,
  S2::Item: Send + 'static,
  S1::Err: 'static,
{
  type Item = (S1::Item, S2::Item);
  type Err = S1::Err;
  type Unsub = SharedSubscription;

  fn actual_subscribe<O>(self, observer: O) -> SharedSubscription
  where
    O: Observer<Self::Item, S1::Err> + Send + 'static,
  {
    let zip = ZipSink {
      observer: SharedObserver::new(observer),
      state: MutArc::own(ZipState {
        left: VecDeque::new(),
        right: VecDeque::new(),
        left_done: false,
        right_done: false,
      }),
      sources: SharedSubscription::default(),
      _err: std::marker::PhantomData,
    };
    let subscription = SharedSubscription::default();
    subscription.add(zip.observer.clone());
    subscription.add(zip.sources.clone());
    zip.sources.add(self.left.actual_subscribe(LeftObserver(zip.clone())));
    zip.sources.add(self.right.actual_subscribe(RightObserver(zip.clone())));
    subscription
  }
}

struct ZipState<A, B> {
  left: VecDeque<A>,
  right: VecDeque<B>,
  left_done: bool,
  right_done: bool,
}

impl<A, B> ZipState<A, B> {
  fn exhausted(&self) -> bool {
    (self.left_done && self.left.is_empty()) || (self.right_done && self.right.is_empty())
  }
}

pub struct ZipSink<O, A, B, Err> {
  observer: SharedObserver<O>,
  state: MutArc<ZipState<A, B>>,
  sources: SharedSubscription,
  _err: std::marker::PhantomData<fn() -> Err>,
}

impl<O, A, B, Err> Clone for ZipSink<O, A, B, Err> {
  fn clone(&self) -> Self {
    ZipSink {
      observer: self.observer.clone(),
      state: self.state.clone(),
      sources: self.sources.clone(),
      _err: std::marker::PhantomData,
    }
  }
}

impl<O, A, B, Err> ZipSink<O, A, B, Err>
where
  O: Observer<(A, B), Err>,
{
  fn finish(&self) {
    self.observer.emit_complete::<(A, B), Err>();
    self.sources.clone().unsubscribe();
  }
}

impl<O, A, B, Err> PairSink for ZipSink<O, A, B, Err>
where
  O: Observer<(A, B), Err>,
{
  type Left = A;
  type Right = B;
  type Err = Err;

  fn on_next(&self, value: Either<A, B>) {
    let (pair, exhausted) = {
      let mut state = self.state.rc_deref_mut();
      let pair = match value {
        Either::Left(a) => match state.right.pop_front() {
          Some(b) => Some((a, b)),
          None => {
            state.left.push_back(a);
            None
          }
        },
        Either::Right(b) => match state.left.pop_front() {
          Some(a) => Some((a, b)),
          None => {
            state.right.push_back(b);
            None
          }
        },
      };
      (pair, state.exhausted())
    };
    if let Some(pair) = pair {
      self.observer.emit_next::<(A, B), Err>(pair);
    }
    if exhausted {
      self.finish();
    }
  }

  fn on_error(&self, err: Err) {
    self.observer.emit_error::<(A, B), Err>(err);
    self.sources.clone().unsubscribe();
  }

  fn on_complete(&self, left: bool) {
    let exhausted = {
      let mut state = self.state.rc_deref_mut();
      if left {
        state.left_done = true;
      } else {
        state.right_done = true;
      }
      state.exhausted()
    };
    if exhausted {
      self.finish();
    }
  }

  fn is_finished(&self) -> bool { self.observer.observer_finished::<(A, B), Err>() }
}
