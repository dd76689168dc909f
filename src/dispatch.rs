//! Blocking evaluation work bound to a concurrency permit

use tokio::sync::OwnedSemaphorePermit;
use tokio::task::JoinHandle;

/// Run `work` on the blocking pool, holding `permit` until it returns.
///
/// The permit travels with the closure, so a caller that gives up waiting
/// (e.g. on timeout) does not free the slot while the work is still running.
pub fn spawn_with_permit<F, T>(permit: OwnedSemaphorePermit, work: F) -> JoinHandle<T>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(move || {
        let _permit = permit;
        work()
    })
}
