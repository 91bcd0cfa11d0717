//! Main runtime manager.

use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use wheel_models::Slot;

use crate::driver::StatusDriver;
use crate::error::{Result, RuntimeError};
use crate::event::RuntimeEvent;

/// Runs a [`StatusDriver`] in a background task until shut down.
pub struct Runtime {
    /// The driver, until it is moved into the loop task.
    driver: Option<StatusDriver>,
    /// Handle to the loop task.
    loop_handle: Option<JoinHandle<Slot>>,
    /// Event sender shared with the driver.
    events: broadcast::Sender<RuntimeEvent>,
    /// Shutdown signal sender.
    shutdown_tx: watch::Sender<bool>,
    /// Shutdown signal receiver (for cloning to the loop).
    shutdown_rx: watch::Receiver<bool>,
    /// Whether the runtime has been started.
    started: bool,
}

impl Runtime {
    /// Create a new runtime around a driver.
    pub fn new(driver: StatusDriver) -> Self {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        Self {
            events: driver.event_sender(),
            driver: Some(driver),
            loop_handle: None,
            shutdown_tx,
            shutdown_rx,
            started: false,
        }
    }

    /// Subscribe to loop events.
    pub fn subscribe(&self) -> broadcast::Receiver<RuntimeEvent> {
        self.events.subscribe()
    }

    /// Start the runtime (calibrates, then begins cycling).
    pub fn start(&mut self) -> Result<()> {
        let Some(mut driver) = self.driver.take() else {
            return Err(RuntimeError::AlreadyStarted);
        };

        info!("starting runtime");

        let shutdown_rx = self.shutdown_rx.clone();
        let handle = tokio::spawn(async move { driver.run(shutdown_rx).await });

        self.loop_handle = Some(handle);
        self.started = true;

        debug!("runtime started");

        Ok(())
    }

    /// Stop the loop and return the slot the wheel was left in.
    pub async fn shutdown(&mut self) -> Result<Slot> {
        if !self.started {
            return Err(RuntimeError::NotStarted);
        }

        info!("shutting down runtime");

        self.shutdown_tx.send(true).map_err(|e| {
            RuntimeError::Shutdown(format!("failed to send shutdown signal: {}", e))
        })?;

        let handle = self
            .loop_handle
            .take()
            .ok_or_else(|| RuntimeError::Shutdown("loop task missing".to_string()))?;
        debug!("waiting for control loop to stop");
        let slot = handle
            .await
            .map_err(|e| RuntimeError::Shutdown(format!("control loop panicked: {}", e)))?;

        self.started = false;

        info!(slot = %slot, "runtime stopped");

        Ok(slot)
    }

    /// Waits for the loop task to end on its own.
    ///
    /// Cancel-safe: dropping the future leaves the runtime able to shut down.
    pub async fn wait(&mut self) -> Result<Slot> {
        let handle = self.loop_handle.as_mut().ok_or(RuntimeError::NotStarted)?;
        let joined = handle.await;
        self.loop_handle = None;
        self.started = false;

        match joined {
            Ok(slot) => {
                info!(slot = %slot, "control loop stopped");
                Ok(slot)
            }
            Err(e) => {
                error!(error = %e, "control loop died");
                Err(RuntimeError::LoopEnded(e.to_string()))
            }
        }
    }

    /// Check if the runtime has been started.
    pub fn is_started(&self) -> bool {
        self.started
    }
}

impl Drop for Runtime {
    fn drop(&mut self) {
        // Send shutdown signal if still running
        if self.started {
            let _ = self.shutdown_tx.send(true);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    use async_trait::async_trait;
    use chrono::{DateTime, Utc};
    use wheel_calendar::CalendarSource;
    use wheel_models::{CalendarEvent, Status};
    use wheel_robot::Motor;

    use crate::config::RuntimeConfig;
    use crate::controller::WheelController;
    use crate::test_support::{RecordingMotor, ScriptedCalendar};

    fn runtime() -> (Runtime, Arc<RecordingMotor>) {
        let motor = Arc::new(RecordingMotor::new());
        let config = RuntimeConfig::default();
        let controller = WheelController::from_config(Arc::clone(&motor) as Arc<dyn Motor>, &config);
        let source: Arc<dyn CalendarSource> = Arc::new(ScriptedCalendar::new());
        (Runtime::new(StatusDriver::new(source, controller, config)), motor)
    }

    #[tokio::test]
    async fn test_runtime_new() {
        let (runtime, _) = runtime();
        assert!(!runtime.is_started());
    }

    #[tokio::test(start_paused = true)]
    async fn test_runtime_start_stop() {
        let (mut runtime, motor) = runtime();
        let mut events = runtime.subscribe();

        runtime.start().unwrap();
        assert!(runtime.is_started());

        assert_eq!(
            events.recv().await.unwrap(),
            RuntimeEvent::Calibrated { failed_steps: 0 }
        );
        assert_eq!(
            events.recv().await.unwrap(),
            RuntimeEvent::StatusResolved {
                status: Status::Available
            }
        );

        tokio::time::sleep(Duration::from_secs(1)).await;

        let slot = runtime.shutdown().await.unwrap();
        assert_eq!(slot, Status::Available.slot());
        assert!(!runtime.is_started());
        assert_eq!(motor.calls(), 6 + 4);
    }

    #[tokio::test]
    async fn test_runtime_double_start() {
        let (mut runtime, _) = runtime();

        runtime.start().unwrap();

        let result = runtime.start();
        assert!(matches!(result, Err(RuntimeError::AlreadyStarted)));

        runtime.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_runtime_shutdown_not_started() {
        let (mut runtime, _) = runtime();

        let result = runtime.shutdown().await;
        assert!(matches!(result, Err(RuntimeError::NotStarted)));
    }

    struct BrokenCalendar;

    #[async_trait]
    impl CalendarSource for BrokenCalendar {
        async fn next_event(
            &self,
            _now: DateTime<Utc>,
        ) -> wheel_calendar::Result<Option<CalendarEvent>> {
            panic!("calendar backend bug");
        }
    }

    #[tokio::test]
    async fn test_runtime_wait_reports_dead_loop() {
        let motor = Arc::new(RecordingMotor::new());
        let config = RuntimeConfig::default();
        let controller = WheelController::from_config(Arc::clone(&motor) as Arc<dyn Motor>, &config);
        let mut runtime = Runtime::new(StatusDriver::new(Arc::new(BrokenCalendar), controller, config));

        runtime.start().unwrap();
        let result = runtime.wait().await;

        assert!(matches!(result, Err(RuntimeError::LoopEnded(_))));
        assert!(!runtime.is_started());
        assert!(matches!(
            runtime.shutdown().await,
            Err(RuntimeError::NotStarted)
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_runtime_wait_is_cancel_safe() {
        let (mut runtime, _) = runtime();
        runtime.start().unwrap();

        let waited = tokio::time::timeout(Duration::from_secs(5), runtime.wait()).await;
        assert!(waited.is_err());

        assert_eq!(runtime.shutdown().await.unwrap(), Status::Available.slot());
    }

    #[tokio::test]
    async fn test_runtime_wait_not_started() {
        let (mut runtime, _) = runtime();
        assert!(matches!(runtime.wait().await, Err(RuntimeError::NotStarted)));
    }
}
