//! The `Observable` trait, its operator extension trait, and the factories
//! that create sources.
//!
//! An observable is a description of a stream. Nothing happens until it is
//! subscribed; every subscription of a cold observable re-runs its producer
//! from scratch, which is why operators and factories are `Clone`.
//!
//! ```rust
//! use rxsearch::prelude::*;
//!
//! let seen = MutArc::own(vec![]);
//! let sink = seen.clone();
//! observable::from_iter::<_, ()>(1..=6)
//!   .filter(|v| v % 2 == 0)
//!   .map(|v| v * 10)
//!   .subscribe(move |v| sink.rc_deref_mut().push(v));
//! assert_eq!(*seen.rc_deref(), vec![20, 40, 60]);
//! ```

use std::time::Duration;

use crate::{
  observer::{FnObserver, Observer},
  ops::{
    combine_latest::CombineLatestOp,
    delay::DelayOp,
    distinct_until_changed::{default_eq, DistinctUntilChangedOp},
    filter::{FilterOp, TryFilterOp},
    into_future::ObservableFuture,
    map::{MapOp, TryMapOp},
    map_err::MapErrOp,
    merge::{MergeAllOp, MergeOp},
    observe_on::ObserveOnOp,
    retry::{RetryOp, RetryPolicy},
    scan::ScanOp,
    start_with::StartWithOp,
    switch_on_next::SwitchOnNextOp,
    take::TakeOp,
    tap::TapOp,
    throttle::ThrottleOp,
    timeout::TimeoutOp,
    zip::ZipOp,
  },
  scheduler::Scheduler,
  subject::{ReplaySubject, Subject},
  subscription::Subscription,
};

mod boxed;
mod connectable;
mod create;
mod defer;
mod from_async;
mod from_event;
mod of;
mod timer;

pub use boxed::*;
pub use connectable::*;
pub use create::*;
pub use defer::*;
pub use from_async::*;
pub use from_event::*;
pub use of::*;
pub use timer::*;

/// A stream of `Item`s that may end with an `Err` or complete.
pub trait Observable: Sized {
  type Item;
  type Err;
  /// Handle returned by [`Observable::actual_subscribe`].
  type Unsub: Subscription + Send + 'static;

  /// Activates the stream, pushing its notifications into `observer`.
  ///
  /// Operators implement this; user code normally goes through the
  /// `subscribe*` helpers of [`ObservableExt`].
  fn actual_subscribe<O>(self, observer: O) -> Self::Unsub
  where
    O: Observer<Self::Item, Self::Err> + Send + 'static;
}

/// Merges every observable yielded by `sources` into one stream.
///
/// Completes once all sources completed; the first error wins and disposes
/// the remaining sources. An empty iterator completes immediately.
pub fn merge_all<S, I>(sources: I) -> MergeAllOp<S>
where
  I: IntoIterator<Item = S>,
  S: Observable,
{
  MergeAllOp { sources: sources.into_iter().collect() }
}

/// Operators and subscribe helpers available on every [`Observable`].
pub trait ObservableExt: Observable {
  // ==================== Subscribing ====================

  /// Subscribes with a value callback. Errors are dropped; use
  /// [`ObservableExt::subscribe_err`] when the stream can fail.
  fn subscribe<N>(self, next: N) -> Self::Unsub
  where
    N: FnMut(Self::Item) + Send + 'static,
  {
    self.actual_subscribe(FnObserver { next, error: |_: Self::Err| {}, complete: || {} })
  }

  fn subscribe_err<N, E>(self, next: N, error: E) -> Self::Unsub
  where
    N: FnMut(Self::Item) + Send + 'static,
    E: FnOnce(Self::Err) + Send + 'static,
  {
    self.actual_subscribe(FnObserver { next, error, complete: || {} })
  }

  fn subscribe_all<N, E, C>(self, next: N, error: E, complete: C) -> Self::Unsub
  where
    N: FnMut(Self::Item) + Send + 'static,
    E: FnOnce(Self::Err) + Send + 'static,
    C: FnOnce() + Send + 'static,
  {
    self.actual_subscribe(FnObserver { next, error, complete })
  }

  #[inline]
  fn subscribe_with<O>(self, observer: O) -> Self::Unsub
  where
    O: Observer<Self::Item, Self::Err> + Send + 'static,
  {
    self.actual_subscribe(observer)
  }

  /// Erases the concrete operator type.
  fn box_it(self) -> BoxedObservable<Self::Item, Self::Err>
  where
    Self: Send + 'static,
    Self::Item: 'static,
    Self::Err: 'static,
  {
    BoxedObservable::new(self)
  }

  // ==================== Transformation ====================

  /// Applies `f` to every value.
  fn map<B, F>(self, f: F) -> MapOp<Self, F>
  where
    F: FnMut(Self::Item) -> B,
  {
    MapOp { source: self, func: f }
  }

  /// Like `map`, but an `Err` returned by `f` terminates the stream with that
  /// error.
  fn try_map<B, F>(self, f: F) -> TryMapOp<Self, F>
  where
    F: FnMut(Self::Item) -> Result<B, Self::Err>,
  {
    TryMapOp { source: self, func: f }
  }

  fn map_err<E, F>(self, f: F) -> MapErrOp<Self, F>
  where
    F: FnOnce(Self::Err) -> E,
  {
    MapErrOp { source: self, func: f }
  }

  fn scan<B, F>(self, initial: B, f: F) -> ScanOp<Self, F, B>
  where
    F: FnMut(B, Self::Item) -> B,
    B: Clone,
  {
    ScanOp { source: self, func: f, initial }
  }

  // ==================== Filtering ====================

  fn filter<F>(self, f: F) -> FilterOp<Self, F>
  where
    F: FnMut(&Self::Item) -> bool,
  {
    FilterOp { source: self, predicate: f }
  }

  /// Like `filter`, but a failing predicate terminates the stream.
  fn try_filter<F>(self, f: F) -> TryFilterOp<Self, F>
  where
    F: FnMut(&Self::Item) -> Result<bool, Self::Err>,
  {
    TryFilterOp { source: self, predicate: f }
  }

  /// Suppresses values equal to the last forwarded one.
  fn distinct_until_changed(
    self,
  ) -> DistinctUntilChangedOp<Self, fn(&Self::Item, &Self::Item) -> bool>
  where
    Self::Item: PartialEq + Clone,
  {
    DistinctUntilChangedOp {
      source: self,
      eq: default_eq::<Self::Item> as fn(&Self::Item, &Self::Item) -> bool,
    }
  }

  /// Suppresses values the comparer considers equal to the last forwarded
  /// one.
  fn distinct_until_changed_by<F>(self, eq: F) -> DistinctUntilChangedOp<Self, F>
  where
    F: FnMut(&Self::Item, &Self::Item) -> bool,
    Self::Item: Clone,
  {
    DistinctUntilChangedOp { source: self, eq }
  }

  /// Emits at most the first `count` values, then completes.
  fn take(self, count: usize) -> TakeOp<Self> { TakeOp { source: self, count } }

  // ==================== Time ====================

  /// Emits a value only after `duration` passed without a newer one
  /// (silence window). A value still pending when the source completes is
  /// flushed before the completion.
  fn throttle<SD: Scheduler>(self, duration: Duration, scheduler: SD) -> ThrottleOp<Self, SD> {
    ThrottleOp { source: self, duration, scheduler }
  }

  /// Fails with [`TimeoutError`](crate::error::TimeoutError) when the gap
  /// since subscribing or since the last value exceeds `duration`.
  fn timeout<SD: Scheduler>(self, duration: Duration, scheduler: SD) -> TimeoutOp<Self, SD> {
    TimeoutOp { source: self, duration, scheduler }
  }

  /// Shifts every value and the completion by `duration`. Errors are
  /// forwarded immediately.
  fn delay<SD: Scheduler>(self, duration: Duration, scheduler: SD) -> DelayOp<Self, SD> {
    DelayOp { source: self, duration, scheduler }
  }

  /// Delivers every notification on `scheduler`, preserving their order.
  fn observe_on<SD: Scheduler>(self, scheduler: SD) -> ObserveOnOp<Self, SD> {
    ObserveOnOp { source: self, scheduler }
  }

  // ==================== Error handling ====================

  /// Resubscribes the source when it fails, as long as `policy` allows.
  ///
  /// A plain `usize` is a policy counting *total* attempts: `retry(3)`
  /// subscribes at most three times, `retry(0)` and `retry(1)` never
  /// resubscribe.
  fn retry<P>(self, policy: P) -> RetryOp<Self, P>
  where
    P: RetryPolicy<Self::Err>,
  {
    RetryOp { source: self, policy }
  }

  // ==================== Combination ====================

  /// Flattens a stream of streams, keeping only the most recent inner
  /// stream subscribed.
  fn switch_on_next(self) -> SwitchOnNextOp<Self>
  where
    Self::Item: Observable<Err = Self::Err>,
  {
    SwitchOnNextOp { source: self }
  }

  fn merge<S>(self, other: S) -> MergeOp<Self, S>
  where
    S: Observable<Item = Self::Item, Err = Self::Err>,
  {
    MergeOp { left: self, right: other }
  }

  /// Pairs values of both streams in arrival order.
  fn zip<S>(self, other: S) -> ZipOp<Self, S>
  where
    S: Observable<Err = Self::Err>,
  {
    ZipOp { left: self, right: other }
  }

  /// Combines the latest value of each stream whenever either emits, once
  /// both have emitted.
  fn combine_latest<S, B, F>(self, other: S, f: F) -> CombineLatestOp<Self, S, F>
  where
    S: Observable<Err = Self::Err>,
    F: FnMut(Self::Item, S::Item) -> B,
  {
    CombineLatestOp { left: self, right: other, func: f }
  }

  fn start_with(self, values: Vec<Self::Item>) -> StartWithOp<Self, Self::Item> {
    StartWithOp { source: self, values }
  }

  // ==================== Side effects ====================

  fn tap<F>(self, f: F) -> TapOp<Self, F>
  where
    F: FnMut(&Self::Item),
  {
    TapOp { source: self, func: f }
  }

  /// Runs a side effect for the error, passing it on unchanged.
  fn tap_err<F>(
    self,
    f: F,
  ) -> MapErrOp<Self, impl FnOnce(Self::Err) -> Self::Err + Clone + Send + 'static>
  where
    F: FnOnce(&Self::Err) + Clone + Send + 'static,
  {
    self.map_err(move |err| {
      f(&err);
      err
    })
  }

  // ==================== Multicasting ====================

  /// Shares one subscription of this stream among all subscribers of the
  /// returned connectable, once it is connected.
  fn publish(self) -> ConnectableObservable<Self, Subject<Self::Item, Self::Err>> {
    ConnectableObservable::new(self, Subject::new())
  }

  /// Like `publish`, but late subscribers first receive up to `capacity`
  /// buffered values.
  fn replay(self, capacity: usize) -> ConnectableObservable<Self, ReplaySubject<Self::Item, Self::Err>> {
    ConnectableObservable::new(self, ReplaySubject::with_capacity(capacity))
  }

  // ==================== Bridging ====================

  /// A future resolving to the first value, the error, or
  /// [`FirstValueError::Empty`](crate::error::FirstValueError::Empty).
  /// The source is subscribed immediately and released after the first value.
  fn into_future(self) -> ObservableFuture<Self::Item, Self::Err>
  where
    Self::Item: Send + 'static,
    Self::Err: Send + 'static,
  {
    ObservableFuture::new(self)
  }
}

impl<T: Observable> ObservableExt for T {}
