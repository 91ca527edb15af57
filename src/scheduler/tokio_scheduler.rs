use futures::{
  future::FutureObj,
  task::{Spawn, SpawnError},
};
use tokio::runtime::Handle;

use super::{Duration, Scheduler, TaskHandle};

/// Wall-clock scheduler backed by a tokio runtime.
///
/// Delays use `tokio::time::sleep`, so the runtime needs the time driver
/// enabled. The scheduler also implements [`Spawn`], which lets
/// [`from_async`](crate::observable::from_async) run futures on the same
/// runtime.
#[derive(Clone, Debug)]
pub struct TokioScheduler {
  handle: Handle,
}

impl TokioScheduler {
  pub fn new(handle: Handle) -> Self { Self { handle } }

  /// Scheduler for the runtime the caller is running in.
  ///
  /// # Panics
  ///
  /// Panics when called outside of a tokio runtime.
  pub fn current() -> Self { Self::new(Handle::current()) }
}

impl Scheduler for TokioScheduler {
  fn schedule<F>(&self, task: F, delay: Option<Duration>) -> TaskHandle
  where
    F: FnOnce() + Send + 'static,
  {
    let handle = TaskHandle::new();
    let task = handle.guard(task);
    let spawned = self.handle.spawn(async move {
      if let Some(delay) = delay {
        tokio::time::sleep(delay).await;
      }
      task();
    });
    // A cancelled task stops sleeping instead of waiting out its delay.
    handle.on_cancel(move || spawned.abort());
    handle
  }
}

impl Spawn for TokioScheduler {
  fn spawn_obj(&self, future: FutureObj<'static, ()>) -> Result<(), SpawnError> {
    self.handle.spawn(future);
    Ok(())
  }
}
