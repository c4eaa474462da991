//! Stop flag shared by the signal handler and the serving loops.
//!
//! The flag lives in a `watch` channel, so a serving loop that subscribes
//! after the trigger still sees it and stops instead of serving forever.

use std::sync::Arc;

use tokio::sync::watch;

/// Owner side of the stop flag. Clones trigger the same flag.
#[derive(Debug, Clone)]
pub struct Shutdown {
    flag: Arc<watch::Sender<bool>>,
}

impl Shutdown {
    pub fn new() -> Self {
        let (flag, _) = watch::channel(false);
        Self { flag: Arc::new(flag) }
    }

    /// Signal for one serving loop.
    pub fn subscribe(&self) -> ShutdownSignal {
        ShutdownSignal {
            rx: self.flag.subscribe(),
        }
    }

    /// Raise the flag. Idempotent.
    pub fn trigger(&self) {
        self.flag.send_replace(true);
    }

    pub fn is_triggered(&self) -> bool {
        *self.flag.borrow()
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

/// Receiving side handed to [`HttpServer::run`](crate::http::HttpServer::run)
/// and friends.
#[derive(Debug, Clone)]
pub struct ShutdownSignal {
    rx: watch::Receiver<bool>,
}

impl ShutdownSignal {
    /// Resolve once the flag is raised, or at once if it already is.
    ///
    /// Dropping every [`Shutdown`] handle also resolves it.
    pub async fn triggered(mut self) {
        if self.rx.wait_for(|stopped| *stopped).await.is_err() {
            tracing::debug!("Shutdown handle dropped");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn every_signal_resolves_on_trigger() {
        let shutdown = Shutdown::new();
        let a = tokio::spawn(shutdown.subscribe().triggered());
        let b = tokio::spawn(shutdown.subscribe().triggered());

        shutdown.trigger();

        tokio::time::timeout(Duration::from_secs(1), async {
            a.await.unwrap();
            b.await.unwrap();
        })
        .await
        .unwrap();
        assert!(shutdown.is_triggered());
    }

    #[tokio::test]
    async fn late_subscriber_sees_earlier_trigger() {
        let shutdown = Shutdown::new();
        shutdown.trigger();

        tokio::time::timeout(Duration::from_millis(100), shutdown.subscribe().triggered())
            .await
            .expect("flag raised before subscribe must still stop the loop");
    }

    #[tokio::test]
    async fn untriggered_signal_stays_pending() {
        let shutdown = Shutdown::new();
        let waited = tokio::time::timeout(Duration::from_millis(50), shutdown.subscribe().triggered()).await;
        assert!(waited.is_err());
        assert!(!shutdown.is_triggered());
    }

    #[tokio::test]
    async fn clones_share_the_flag() {
        let shutdown = Shutdown::default();
        let signal = shutdown.subscribe();
        shutdown.clone().trigger();

        tokio::time::timeout(Duration::from_millis(100), signal.triggered())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn dropping_every_handle_releases_waiters() {
        let shutdown = Shutdown::new();
        let signal = shutdown.subscribe();
        drop(shutdown);

        tokio::time::timeout(Duration::from_millis(100), signal.triggered())
            .await
            .unwrap();
    }
}
