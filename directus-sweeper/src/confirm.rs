//! Operator abort window before live deletion.
//!
//! The sweep pauses for a fixed delay; SIGINT (Ctrl+C) or SIGTERM during the
//! pause cancels the deletion before any request is sent.

use crate::sweep::DeletionGate;
use async_trait::async_trait;
use std::time::Duration;
use tokio::signal;
use tracing::{info, warn};

pub struct ConfirmationWindow {
    delay: Duration,
}

impl ConfirmationWindow {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }

    /// Resolves when the operator asks to stop.
    async fn abort_signal() {
        let ctrl_c = async {
            if let Err(e) = signal::ctrl_c().await {
                warn!("Failed to install Ctrl+C handler: {}", e);
                std::future::pending::<()>().await;
            }
        };

        #[cfg(unix)]
        let terminate = async {
            match signal::unix::signal(signal::unix::SignalKind::terminate()) {
                Ok(mut stream) => {
                    stream.recv().await;
                }
                Err(e) => {
                    warn!("Failed to install SIGTERM handler: {}", e);
                    std::future::pending::<()>().await;
                }
            }
        };

        #[cfg(not(unix))]
        let terminate = std::future::pending::<()>();

        tokio::select! {
            _ = ctrl_c => info!("Received SIGINT (Ctrl+C)"),
            _ = terminate => info!("Received SIGTERM"),
        }
    }
}

#[async_trait]
impl DeletionGate for ConfirmationWindow {
    async fn confirm(&self, count: usize) -> bool {
        if self.delay.is_zero() {
            return true;
        }

        println!(
            "About to delete {} record(s). Starting in {}s, press Ctrl+C to abort...",
            count,
            self.delay.as_secs()
        );

        tokio::select! {
            _ = tokio::time::sleep(self.delay) => true,
            _ = Self::abort_signal() => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_window_elapses_into_confirmation() {
        let window = ConfirmationWindow::new(Duration::from_secs(5));
        let start = tokio::time::Instant::now();

        assert!(window.confirm(3).await);
        assert!(start.elapsed() >= Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_zero_delay_confirms_immediately() {
        let window = ConfirmationWindow::new(Duration::ZERO);
        assert!(window.confirm(1).await);
    }
}
