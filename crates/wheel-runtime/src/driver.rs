//! The control loop: resolve the status, move the wheel, wait.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::{broadcast, watch};
use tracing::{debug, error, info, warn};

use wheel_calendar::CalendarSource;
use wheel_models::{Slot, Status};

use crate::config::RuntimeConfig;
use crate::controller::{Calibration, WheelController};
use crate::event::RuntimeEvent;
use crate::resolver::StatusResolver;

/// Capacity of the event broadcast channel.
const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Where the control loop is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    /// Homing the wheel; runs once.
    Initializing,
    /// Reading the calendar.
    Polling,
    /// Turning the wheel.
    Moving,
    /// Waiting out the poll interval.
    Sleeping,
    /// A cycle failed; the next one starts without the poll interval.
    Recovering,
}

/// What one cycle did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    /// The wheel shows `status`.
    Settled {
        /// Resolved status.
        status: Status,
        /// Slot the wheel is in.
        slot: Slot,
    },
    /// The calendar could not be read; the wheel was not touched.
    SourceFailed,
    /// A step failed part-way.
    MoveInterrupted {
        /// Resolved status.
        status: Status,
        /// Slot the wheel was left in.
        reached: Slot,
    },
}

/// Owns the wheel position and runs resolve/move/wait cycles.
pub struct StatusDriver {
    source: Arc<dyn CalendarSource>,
    resolver: StatusResolver,
    controller: WheelController,
    config: RuntimeConfig,
    slot: Slot,
    state: LoopState,
    consecutive_failures: u32,
    events: broadcast::Sender<RuntimeEvent>,
}

impl StatusDriver {
    /// Creates a driver that has not yet calibrated the wheel.
    pub fn new(
        source: Arc<dyn CalendarSource>,
        controller: WheelController,
        config: RuntimeConfig,
    ) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            source,
            resolver: StatusResolver::new(config.imminent_window),
            controller,
            config,
            slot: Slot::HOME,
            state: LoopState::Initializing,
            consecutive_failures: 0,
            events,
        }
    }

    /// Subscribe to loop events.
    pub fn subscribe(&self) -> broadcast::Receiver<RuntimeEvent> {
        self.events.subscribe()
    }

    pub(crate) fn event_sender(&self) -> broadcast::Sender<RuntimeEvent> {
        self.events.clone()
    }

    /// Slot the wheel is believed to be in.
    pub fn slot(&self) -> Slot {
        self.slot
    }

    /// Current loop state.
    pub fn state(&self) -> LoopState {
        self.state
    }

    /// Get the configuration.
    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    fn emit(&self, event: RuntimeEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }

    fn enter_recovering(&mut self) {
        self.consecutive_failures = self.consecutive_failures.saturating_add(1);
        self.state = LoopState::Recovering;
    }

    /// Homes the wheel and moves to `Polling`, whatever the calibration outcome.
    pub async fn initialize(&mut self) -> Calibration {
        let calibration = self
            .controller
            .calibrate(self.config.calibration_steps)
            .await;
        if calibration.failed_steps > 0 {
            warn!(
                failed_steps = calibration.failed_steps,
                "calibration incomplete, assuming slot 0"
            );
        }

        self.slot = calibration.slot;
        self.state = LoopState::Polling;
        self.emit(RuntimeEvent::Calibrated {
            failed_steps: calibration.failed_steps,
        });
        calibration
    }

    /// Runs one resolve-and-move cycle.
    ///
    /// Ends in `Sleeping` when the wheel reached its target and in
    /// `Recovering` when the calendar or a wheel step failed.
    pub async fn run_cycle(&mut self) -> CycleOutcome {
        self.state = LoopState::Polling;
        let now = Utc::now();

        let next = match self.source.next_event(now).await {
            Ok(next) => next,
            Err(e) => {
                error!(error = %e, "failed to read calendar, retrying");
                self.emit(RuntimeEvent::SourceFailed {
                    error: e.to_string(),
                });
                self.enter_recovering();
                return CycleOutcome::SourceFailed;
            }
        };

        let status = self.resolver.resolve(now, next.as_ref());
        self.emit(RuntimeEvent::StatusResolved { status });

        self.state = LoopState::Moving;
        let from = self.slot;
        match self.controller.advance(from, status).await {
            Ok(slot) => {
                self.slot = slot;
                if slot != from {
                    self.emit(RuntimeEvent::WheelMoved { from, to: slot });
                }
                self.consecutive_failures = 0;
                self.state = LoopState::Sleeping;
                debug!(slot = %slot, status = %status, "wheel in position");
                CycleOutcome::Settled { status, slot }
            }
            Err(e) => {
                self.slot = e.reached;
                if e.reached != from {
                    self.emit(RuntimeEvent::WheelMoved {
                        from,
                        to: e.reached,
                    });
                }
                error!(
                    reached = %e.reached,
                    target = %e.target,
                    error = %e.source,
                    "wheel move interrupted, trying to recover"
                );
                self.emit(RuntimeEvent::MoveInterrupted {
                    reached: e.reached,
                    target: e.target,
                    error: e.source.to_string(),
                });
                self.enter_recovering();
                CycleOutcome::MoveInterrupted {
                    status,
                    reached: e.reached,
                }
            }
        }
    }

    /// How long to wait before the next cycle, if at all.
    pub fn pause(&self) -> Option<Duration> {
        match self.state {
            LoopState::Sleeping => Some(self.config.poll_interval),
            LoopState::Recovering => self
                .config
                .recovery_backoff
                .map(|backoff| backoff.delay(self.consecutive_failures)),
            LoopState::Initializing | LoopState::Polling | LoopState::Moving => None,
        }
    }

    /// Runs cycles until `shutdown` turns true, returning the final slot.
    pub async fn run(&mut self, mut shutdown: watch::Receiver<bool>) -> Slot {
        if self.state == LoopState::Initializing {
            self.initialize().await;
        }

        info!(
            poll_interval_secs = self.config.poll_interval.as_secs(),
            "starting control loop"
        );

        loop {
            if *shutdown.borrow() {
                break;
            }

            self.run_cycle().await;

            match self.pause() {
                Some(delay) => {
                    debug!(delay_ms = delay.as_millis() as u64, "waiting for next cycle");
                    tokio::select! {
                        _ = tokio::time::sleep(delay) => {}
                        changed = shutdown.changed() => {
                            if changed.is_err() || *shutdown.borrow() {
                                break;
                            }
                        }
                    }
                }
                None => tokio::task::yield_now().await,
            }
        }

        info!(slot = %self.slot, "control loop stopped");
        self.slot
    }
}
