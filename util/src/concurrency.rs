use std::io;
use std::thread;

use tracing::trace;

/// Thread helper for work that may leave the caller's thread.
///
/// The decision engine itself is single-threaded; only read-only searches
/// over shared map snapshots go through here.
pub struct Concurrency;

impl Concurrency {
    /// Runs `f` on a new named thread and returns its handle.
    ///
    /// The caller joins the handle before reading the result, so nothing
    /// spawned here ever observes or mutates game state concurrently.
    pub fn run<T, F>(name: &str, f: F) -> io::Result<thread::JoinHandle<T>>
    where
        T: Send + 'static,
        F: FnOnce() -> T + Send + 'static,
    {
        trace!(thread = %name, "Spawning worker thread");
        thread::Builder::new().name(name.to_string()).spawn(f)
    }

    /// Runs `f` on the current thread.
    pub fn run_on_current_thread<T, F: FnOnce() -> T>(f: F) -> T {
        f()
    }
}
