//! Offload CPU-bound work (password digests, document rendering) from the
//! async workers.

use tracing::error;

use crate::domain::Error;

/// Run `task` on Tokio's blocking pool.
///
/// A panicking or cancelled task becomes an internal error.
///
/// # Examples
/// ```
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// use telemetry_backend::domain::run_blocking;
///
/// let sum = run_blocking(|| (1..=10).sum::<u32>()).await.expect("task runs");
/// assert_eq!(sum, 55);
/// # }
/// ```
pub async fn run_blocking<T, F>(task: F) -> Result<T, Error>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(task).await.map_err(|err| {
        error!(error = %err, "blocking task failed");
        Error::internal(format!("blocking task failed: {err}"))
    })
}
