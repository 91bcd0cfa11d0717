//! Runtime configuration.

use std::time::Duration;

/// Capped exponential delay applied between failed cycles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Backoff {
    /// Delay after the first failure.
    pub base: Duration,
    /// Upper bound on any delay.
    pub max: Duration,
}

impl Backoff {
    /// Creates a backoff policy; `max` is raised to `base` if smaller.
    pub fn new(base: Duration, max: Duration) -> Self {
        Self {
            base,
            max: max.max(base),
        }
    }

    /// Delay after `failures` consecutive failed cycles (`failures >= 1`).
    pub fn delay(&self, failures: u32) -> Duration {
        if failures == 0 {
            return Duration::ZERO;
        }
        let factor = 2u32.saturating_pow(failures - 1);
        self.base.saturating_mul(factor).min(self.max)
    }
}

/// Configuration for the runtime.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    /// Wait between successful cycles.
    pub poll_interval: Duration,
    /// How soon an event must start to count as imminent.
    pub imminent_window: chrono::Duration,
    /// Single steps issued when homing the wheel.
    pub calibration_steps: usize,
    /// Power applied for one step; steps toward lower slots use the negation.
    pub step_power: f64,
    /// Delay between failed cycles; `None` retries immediately.
    pub recovery_backoff: Option<Backoff>,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(60),
            imminent_window: chrono::Duration::minutes(5),
            calibration_steps: 6,
            step_power: 1.0 / 6.0,
            recovery_backoff: None,
        }
    }
}

impl RuntimeConfig {
    /// Creates a new config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the poll interval.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Sets the imminent window.
    pub fn with_imminent_window(mut self, window: chrono::Duration) -> Self {
        self.imminent_window = window;
        self
    }

    /// Sets the number of calibration steps.
    pub fn with_calibration_steps(mut self, steps: usize) -> Self {
        self.calibration_steps = steps;
        self
    }

    /// Sets the per-step power magnitude.
    pub fn with_step_power(mut self, power: f64) -> Self {
        self.step_power = power.abs();
        self
    }

    /// Enables capped backoff between failed cycles.
    pub fn with_recovery_backoff(mut self, backoff: Backoff) -> Self {
        self.recovery_backoff = Some(backoff);
        self
    }
}
