//! The tick scheduling contract.
//!
//! A scheduler accepts a task for "some later turn" and hands back an id that
//! can cancel it until the moment it runs. Interactive hosts run ticks on the
//! display-refresh cadence; everything else runs them like an immediate timer.

use crate::Task;
use serde::Deserialize;
use std::fmt;
use std::str::FromStr;

/// Handle for a scheduled task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TickId(pub(crate) u64);

impl TickId {
    /// Raw id value
    pub fn value(&self) -> u64 {
        self.0
    }
}

/// Which lane of the event loop serves tick requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TickMode {
    /// Immediate-timer cadence (non-interactive hosts)
    #[default]
    Immediate,
    /// Frame-aligned cadence (interactive hosts)
    Frame,
}

impl FromStr for TickMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "immediate" | "timer" => Ok(TickMode::Immediate),
            "frame" | "animation-frame" => Ok(TickMode::Frame),
            other => Err(format!("unknown tick mode: {}", other)),
        }
    }
}

impl fmt::Display for TickMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TickMode::Immediate => write!(f, "immediate"),
            TickMode::Frame => write!(f, "frame"),
        }
    }
}

/// Schedule and cancel deferred tasks.
pub trait Scheduler {
    /// Run `task` on a later turn. Returns an id usable with
    /// [`Scheduler::cancel_tick`].
    fn request_tick(&self, task: Task) -> TickId;

    /// Cancel a pending task. Returns false when the task already ran or
    /// was never scheduled here.
    fn cancel_tick(&self, id: TickId) -> bool;
}
