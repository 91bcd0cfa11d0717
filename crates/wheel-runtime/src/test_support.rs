//! In-memory fakes for the calendar and motor ports.

use std::collections::{HashSet, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use wheel_calendar::{CalendarError, CalendarSource};
use wheel_models::CalendarEvent;
use wheel_robot::{Motor, RobotError};

/// A calendar that replays scripted responses, then reports a clear calendar.
#[derive(Default)]
pub struct ScriptedCalendar {
    responses: Mutex<VecDeque<Result<Option<CalendarEvent>, String>>>,
    calls: AtomicUsize,
}

impl ScriptedCalendar {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_event(&self, event: Option<CalendarEvent>) {
        self.responses.lock().unwrap().push_back(Ok(event));
    }

    pub fn push_failure(&self, message: &str) {
        self.responses
            .lock()
            .unwrap()
            .push_back(Err(message.to_string()));
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CalendarSource for ScriptedCalendar {
    async fn next_event(&self, _now: DateTime<Utc>) -> wheel_calendar::Result<Option<CalendarEvent>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.responses.lock().unwrap().pop_front() {
            Some(Ok(event)) => Ok(event),
            Some(Err(body)) => Err(CalendarError::Api { status: 503, body }),
            None => Ok(None),
        }
    }
}

/// A motor that records every command and fails on chosen calls (1-based).
#[derive(Default)]
pub struct RecordingMotor {
    powers: Mutex<Vec<f64>>,
    failing_calls: Mutex<HashSet<usize>>,
}

impl RecordingMotor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_on(calls: impl IntoIterator<Item = usize>) -> Self {
        let motor = Self::default();
        motor.failing_calls.lock().unwrap().extend(calls);
        motor
    }

    pub fn fail_call(&self, call: usize) {
        self.failing_calls.lock().unwrap().insert(call);
    }

    pub fn powers(&self) -> Vec<f64> {
        self.powers.lock().unwrap().clone()
    }

    pub fn calls(&self) -> usize {
        self.powers.lock().unwrap().len()
    }
}

#[async_trait]
impl Motor for RecordingMotor {
    fn name(&self) -> &str {
        "wheel_motor"
    }

    async fn set_power(&self, power: f64) -> wheel_robot::Result<()> {
        let call = {
            let mut powers = self.powers.lock().unwrap();
            powers.push(power);
            powers.len()
        };
        if self.failing_calls.lock().unwrap().contains(&call) {
            return Err(RobotError::Rpc {
                method: "viam.component.motor.v1.MotorService/SetPower".to_string(),
                status: 504,
                body: "deadline exceeded".to_string(),
            });
        }
        Ok(())
    }
}
