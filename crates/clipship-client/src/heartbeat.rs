//! Keep-alive heartbeat for the upload window.

use std::time::Duration;

use tokio::sync::oneshot;
use tracing::debug;

use crate::api::ApiClient;

/// Handle for the keep-alive ping task of one transfer.
///
/// The task pings the backend every interval until stopped. Stopping
/// is idempotent, and dropping the handle stops the task too, so an
/// early error return cannot leak a running heartbeat.
pub struct Heartbeat {
    stop: Option<oneshot::Sender<()>>,
}

impl Heartbeat {
    /// Spawn the ping task. The first ping fires one full interval
    /// after start.
    pub fn start(api: ApiClient, interval: Duration) -> Self {
        let (stop, mut stopped) = oneshot::channel();

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            // interval yields an immediate first tick; swallow it so
            // the cadence matches a plain repeating timer
            ticker.tick().await;

            loop {
                tokio::select! {
                    _ = &mut stopped => break,
                    _ = ticker.tick() => api.ping().await,
                }
            }
            debug!("Heartbeat stopped");
        });

        Self { stop: Some(stop) }
    }

    /// Stop the ping task. Safe to call more than once.
    pub fn stop(&mut self) {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
    }

    pub fn is_stopped(&self) -> bool {
        self.stop.is_none()
    }
}

impl Drop for Heartbeat {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ClientConfig;

    #[tokio::test]
    async fn test_stop_is_idempotent() {
        let api = ApiClient::new(&ClientConfig::default()).unwrap();
        let mut heartbeat = Heartbeat::start(api, Duration::from_secs(60));
        assert!(!heartbeat.is_stopped());

        heartbeat.stop();
        assert!(heartbeat.is_stopped());
        heartbeat.stop();
        assert!(heartbeat.is_stopped());
    }
}
