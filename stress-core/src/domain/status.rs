//! Run lifecycle and terminal classification

use std::fmt;
use std::time::Duration;

/// Lifecycle status string reported by the server in every pull response
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LifeCycleStatus {
    /// `NormalExit`
    NormalExit,
    /// `CancelExit`
    CancelExit,
    /// `AbnormalExit`
    AbnormalExit,
    /// Some other status containing `Exit` that this tester does not know
    UnknownExit(String),
    /// Still running (any status without `Exit` in it)
    Running(String),
}

impl LifeCycleStatus {
    /// Parses the raw `LifeCycleStatus` value
    pub fn parse(raw: &str) -> Self {
        match raw {
            "NormalExit" => Self::NormalExit,
            "CancelExit" => Self::CancelExit,
            "AbnormalExit" => Self::AbnormalExit,
            other if other.contains("Exit") => Self::UnknownExit(other.to_string()),
            other => Self::Running(other.to_string()),
        }
    }

    /// Terminal classification, `None` while the run is still alive
    pub fn terminal(&self) -> Option<RunStatus> {
        match self {
            Self::NormalExit => Some(RunStatus::Success),
            Self::CancelExit => Some(RunStatus::Canceled),
            Self::AbnormalExit | Self::UnknownExit(_) => Some(RunStatus::Error),
            Self::Running(_) => None,
        }
    }
}

impl fmt::Display for LifeCycleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NormalExit => write!(f, "NormalExit"),
            Self::CancelExit => write!(f, "CancelExit"),
            Self::AbnormalExit => write!(f, "AbnormalExit"),
            Self::UnknownExit(s) | Self::Running(s) => write!(f, "{}", s),
        }
    }
}

/// How a strategy run ended, from the tester's point of view
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Success,
    Error,
    Canceled,
}

impl RunStatus {
    pub fn is_success(self) -> bool {
        self == Self::Success
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success => write!(f, "success"),
            Self::Error => write!(f, "error"),
            Self::Canceled => write!(f, "canceled"),
        }
    }
}

/// Terminal result of one strategy run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunOutcome {
    pub status: RunStatus,
    /// Wall-clock time from the first submission attempt to the terminal response
    pub elapsed: Duration,
}

impl RunOutcome {
    pub fn new(status: RunStatus, elapsed: Duration) -> Self {
        Self { status, elapsed }
    }

    pub fn elapsed_millis(&self) -> u64 {
        self.elapsed.as_millis() as u64
    }
}
