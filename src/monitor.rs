//! AP state transition monitoring
//!
//! Enable/disable requests return on acceptance while the platform
//! transition completes in the background. `ApStateMonitor` polls the
//! controller and broadcasts each observed transition, giving callers a
//! subscription to await DISABLED -> ENABLING -> ENABLED instead of
//! re-polling on a timer themselves.

use crate::controller::ApController;
use crate::error::{ApctlError, ApctlResult};
use crate::state::ApState;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::time::sleep;
use tracing::{debug, info};

/// Default interval between state polls.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// AP lifecycle events.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApEvent {
    /// The normalized state changed between two polls.
    StateChanged { from: ApState, to: ApState },
}

/// Polling monitor broadcasting AP state transitions.
pub struct ApStateMonitor {
    controller: Arc<ApController>,
    poll_interval: Duration,
    event_tx: broadcast::Sender<ApEvent>,
    running: Arc<tokio::sync::RwLock<bool>>,
}

impl ApStateMonitor {
    pub fn new(controller: Arc<ApController>) -> Self {
        let (event_tx, _) = broadcast::channel(64);
        Self {
            controller,
            poll_interval: DEFAULT_POLL_INTERVAL,
            event_tx,
            running: Arc::new(tokio::sync::RwLock::new(false)),
        }
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Subscribe to state transition events.
    pub fn subscribe(&self) -> broadcast::Receiver<ApEvent> {
        self.event_tx.subscribe()
    }

    /// Start the polling task.
    pub async fn start(&self) -> ApctlResult<()> {
        let mut running = self.running.write().await;
        if *running {
            return Err(ApctlError::ServiceError(
                "AP state monitor already running".to_string(),
            ));
        }
        *running = true;
        drop(running);

        info!("Starting AP state monitor");

        let controller = self.controller.clone();
        let event_tx = self.event_tx.clone();
        let running = self.running.clone();
        let poll_interval = self.poll_interval;

        tokio::spawn(async move {
            let mut last = controller.state().await;
            loop {
                sleep(poll_interval).await;
                if !*running.read().await {
                    break;
                }
                let current = controller.state().await;
                if current != last {
                    debug!(from = %last, to = %current, "AP state transition");
                    // No receivers is fine; events are best-effort
                    let _ = event_tx.send(ApEvent::StateChanged {
                        from: last,
                        to: current,
                    });
                    last = current;
                }
            }
            debug!("AP state monitor loop ended");
        });

        Ok(())
    }

    /// Stop the polling task.
    pub async fn stop(&self) {
        let mut running = self.running.write().await;
        *running = false;
        info!("Stopped AP state monitor");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fake::FakeCapability;

    #[tokio::test]
    async fn test_monitor_broadcasts_transitions() {
        // Disabled -> Enabling -> Enabled, one raw code per poll
        let fake = Arc::new(FakeCapability::new().with_state_script(vec![11, 12, 13]));
        let controller = Arc::new(ApController::new(fake).await);
        let monitor = ApStateMonitor::new(controller)
            .with_poll_interval(Duration::from_millis(10));
        let mut events = monitor.subscribe();

        monitor.start().await.unwrap();

        let first = events.recv().await.unwrap();
        assert_eq!(
            first,
            ApEvent::StateChanged {
                from: ApState::Disabled,
                to: ApState::Enabling
            }
        );
        let second = events.recv().await.unwrap();
        assert_eq!(
            second,
            ApEvent::StateChanged {
                from: ApState::Enabling,
                to: ApState::Enabled
            }
        );

        monitor.stop().await;
    }

    #[tokio::test]
    async fn test_monitor_rejects_double_start() {
        let fake = Arc::new(FakeCapability::new());
        let controller = Arc::new(ApController::new(fake).await);
        let monitor = ApStateMonitor::new(controller);

        monitor.start().await.unwrap();
        assert!(monitor.start().await.is_err());
        monitor.stop().await;
    }
}
