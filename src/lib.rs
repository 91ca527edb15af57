//! # rxsearch: reactive streams for debounced service calls
//!
//! A push-based implementation of the Reactive Extensions contract, sized for
//! one job: turning bursts of user input into calls to a slow, unreliable
//! service, and delivering only the results that still matter.
//!
//! ## Quick Start
//!
//! ```rust
//! use rxsearch::prelude::*;
//!
//! let evens = MutArc::own(vec![]);
//! let sink = evens.clone();
//! observable::from_iter::<_, ()>(0..10)
//!   .filter(|v| v % 2 == 0)
//!   .map(|v| v * 2)
//!   .subscribe(move |v| sink.rc_deref_mut().push(v));
//! assert_eq!(*evens.rc_deref(), vec![0, 4, 8, 12, 16]);
//! ```
//!
//! ## Key Concepts
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Observable`] | A description of a stream; nothing runs until it is subscribed |
//! | [`Observer`] | Consumes `next`, `error`, and `complete` notifications |
//! | [`Subscription`] | Handle to cancel an active subscription |
//! | [`Scheduler`] | Decides where and when timed work runs |
//! | [`Subject`] | Observer and observable at once, fanning values out |
//!
//! The debounced search pipeline lives in [`search`].
//!
//! ## Threading
//!
//! Every observer and task is `Send + 'static`, and operator state sits
//! behind `parking_lot` mutexes. A notification already running on another
//! thread when `unsubscribe` is called may still finish; any notification
//! that starts after `unsubscribe` returned is dropped. Emitting into a chain
//! from inside one of its own callbacks is not supported.
//!
//! ## Feature Flags
//!
//! - **`tokio-scheduler`** (default): [`TokioScheduler`](scheduler::TokioScheduler)
//!
//! [`Observable`]: observable::Observable
//! [`Observer`]: observer::Observer
//! [`Subscription`]: subscription::Subscription
//! [`Scheduler`]: scheduler::Scheduler
//! [`Subject`]: subject::Subject

pub mod error;
pub mod observable;
pub mod observer;
pub mod ops;
pub mod prelude;
pub mod rc;
pub mod scheduler;
pub mod search;
pub mod subject;
pub mod subscription;

// Re-export the prelude module
pub use prelude::*;
