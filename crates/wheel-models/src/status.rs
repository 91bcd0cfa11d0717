//! Availability status codes and the wheel slots they occupy.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{ModelError, Result};

/// One of the six availability codes shown on the wheel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Status {
    /// Away for the day.
    OutOfOffice,
    /// Working, but not at the office.
    WorkFromHome,
    /// An event starts within the imminent window.
    GoingToEvent,
    /// Blocked out for focused work.
    FocusTime,
    /// Nothing relevant on the calendar.
    Available,
    /// In a meeting or any other started event.
    InMeeting,
}

impl Status {
    /// All statuses in slot order.
    pub const ALL: [Status; Slot::COUNT] = [
        Status::OutOfOffice,
        Status::WorkFromHome,
        Status::GoingToEvent,
        Status::FocusTime,
        Status::Available,
        Status::InMeeting,
    ];

    /// Returns the wheel slot this status is shown in.
    pub const fn slot(self) -> Slot {
        match self {
            Status::OutOfOffice => Slot(0),
            Status::WorkFromHome => Slot(1),
            Status::GoingToEvent => Slot(2),
            Status::FocusTime => Slot(3),
            Status::Available => Slot(4),
            Status::InMeeting => Slot(5),
        }
    }

    /// Returns the status shown in the given slot.
    pub const fn from_slot(slot: Slot) -> Status {
        Status::ALL[slot.0 as usize]
    }

    /// Returns the canonical upper-case code.
    pub const fn as_str(self) -> &'static str {
        match self {
            Status::OutOfOffice => "OUT_OF_OFFICE",
            Status::WorkFromHome => "WORK_FROM_HOME",
            Status::GoingToEvent => "GOING_TO_EVENT",
            Status::FocusTime => "FOCUS_TIME",
            Status::Available => "AVAILABLE",
            Status::InMeeting => "IN_MEETING",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A physical wheel position, always within `0..=5`.
///
/// The slot space is linear: moving between two slots passes through every
/// slot in between and never wraps from 5 to 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u8")]
pub struct Slot(u8);

impl Slot {
    /// Number of slots on the wheel.
    pub const COUNT: usize = 6;
    /// The calibration position.
    pub const HOME: Slot = Slot(0);
    /// The highest slot.
    pub const MAX: Slot = Slot(Self::COUNT as u8 - 1);

    /// Creates a slot, rejecting indices outside the wheel.
    pub fn new(index: i64) -> Result<Self> {
        if (0..Self::COUNT as i64).contains(&index) {
            Ok(Slot(index as u8))
        } else {
            Err(ModelError::SlotOutOfRange(index))
        }
    }

    /// Returns the slot index.
    pub const fn index(self) -> u8 {
        self.0
    }

    /// Signed number of single steps from `self` to `target`.
    ///
    /// Positive means towards higher slots.
    pub fn offset_to(self, target: Slot) -> i8 {
        target.0 as i8 - self.0 as i8
    }

    /// The neighbouring slot one step towards `target`, or `self` if already there.
    pub fn toward(self, target: Slot) -> Slot {
        match self.0.cmp(&target.0) {
            std::cmp::Ordering::Less => Slot(self.0 + 1),
            std::cmp::Ordering::Greater => Slot(self.0 - 1),
            std::cmp::Ordering::Equal => self,
        }
    }
}

impl Default for Slot {
    fn default() -> Self {
        Slot::HOME
    }
}

impl TryFrom<i64> for Slot {
    type Error = ModelError;

    fn try_from(index: i64) -> Result<Self> {
        Slot::new(index)
    }
}

impl From<Slot> for u8 {
    fn from(slot: Slot) -> Self {
        slot.0
    }
}

impl From<Status> for Slot {
    fn from(status: Status) -> Self {
        status.slot()
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
