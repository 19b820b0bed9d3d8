pub mod test_session;

pub use mock_observer::*;
pub use mock_signaling::*;
pub use mock_transport::*;
pub use test_capture::*;
pub use test_session::*;

/// Default timeout for waiting on asynchronous effects (ms).
pub const WAIT_TIMEOUT_MS: u64 = 5000;

/// Poll `condition` every 10 ms until it holds or `timeout_ms` passes.
pub async fn wait_until<F>(timeout_ms: u64, mut condition: F) -> bool
where
    F: FnMut() -> bool,
{
    let start = std::time::Instant::now();
    let timeout = std::time::Duration::from_millis(timeout_ms);

    loop {
        if condition() {
            return true;
        }
        if start.elapsed() > timeout {
            return false;
        }
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    }
}
