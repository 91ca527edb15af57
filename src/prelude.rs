//! Prelude module for convenient imports
//!
//! This module re-exports commonly used types and traits for easy access.

// Error types
pub use crate::error::*;
// Core traits and factories (reachable as `observable::of(..)` and friends)
pub use crate::observable::{
  self, BoxedObservable, ConnectableObservable, Connection, Emitter, EventEmitter, EventHandler,
  EventSource, HandlerToken, Observable, ObservableExt,
};
// Observer trait
pub use crate::observer::{BoxedObserver, FnObserver, Observer};
// Operators
pub use crate::ops::{into_future::ObservableFuture, RetryPolicy};
// Shared state
pub use crate::rc::{MutArc, RcDeref, RcDerefMut, SharedObserver};
// Schedulers
#[cfg(feature = "tokio-scheduler")]
pub use crate::scheduler::TokioScheduler;
pub use crate::scheduler::{
  Duration, ImmediateScheduler, Instant, NewThreadScheduler, Scheduler, TaskHandle, TestScheduler,
};
// Debounced service calls
pub use crate::search::*;
// Subject
pub use crate::subject::*;
// Subscription
pub use crate::subscription::*;
