//! Operators. Each one is a struct wrapping its upstream observable(s);
//! [`ObservableExt`](crate::observable::ObservableExt) builds them.

pub mod combine_latest;
pub mod delay;
pub mod distinct_until_changed;
pub mod filter;
pub mod into_future;
pub mod map;
pub mod map_err;
pub mod merge;
pub mod observe_on;
pub mod ref_count;
pub mod retry;
pub mod scan;
pub mod start_with;
pub mod switch_on_next;
pub mod take;
pub mod tap;
pub mod throttle;
pub mod timeout;
pub mod zip;

pub use retry::RetryPolicy;
