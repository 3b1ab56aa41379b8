//! Task Spawning
//!
//! Every query and filter application is fire-and-forget from the
//! controller's point of view. Tasks are spawned on the ambient tokio
//! runtime; the binary runs a current-thread runtime so all continuations
//! interleave on one thread.
//!
//! ```text
//! UI event
//!       │
//!       ▼
//! controller transition ──► spawn_named("chart:routes", async { query → reduce → render })
//!                       ──► spawn_named("layer:routes", async { stats → renderer })
//! ```

use std::future::Future;

use tokio::task::JoinHandle;

/// Spawn a detached task with a name (for debugging)
///
/// Must be called from within a tokio runtime.
pub fn spawn_named<F, T>(name: impl Into<String>, future: F) -> JoinHandle<T>
where
    F: Future<Output = T> + Send + 'static,
    T: Send + 'static,
{
    let name = name.into();
    tracing::debug!("Spawning task: {}", name);
    tokio::spawn(async move {
        let output = future.await;
        tracing::debug!("Task completed: {}", name);
        output
    })
}
