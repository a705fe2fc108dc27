//! Dispatch records and their lifecycle.

use std::fmt;

use jiff::{Zoned, civil::DateTime};

use super::DispatchType;

/// Where a dispatch stands in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchStatus {
    InProgress,
    Completed,
}

impl DispatchStatus {
    /// The label written to the data file.
    pub fn label(self) -> &'static str {
        match self {
            Self::InProgress => "En curso",
            Self::Completed => "Completado",
        }
    }

    /// Reverse of [`label`](Self::label).
    pub fn from_label(label: &str) -> Option<Self> {
        [Self::InProgress, Self::Completed]
            .into_iter()
            .find(|s| s.label() == label)
    }
}

impl fmt::Display for DispatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(match self {
            Self::InProgress => "In progress",
            Self::Completed => "Completed",
        })
    }
}

/// One dispatch, tracked from start to completion.
///
/// `started_at` is always set for dispatches created by the store; it is
/// `None` only when the stored value could not be parsed on load. The same
/// goes for `finished_at` on a completed dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchRecord {
    pub id: String,
    pub kind: DispatchType,
    pub status: DispatchStatus,
    pub started_at: Option<DateTime>,
    pub finished_at: Option<DateTime>,
    pub notes: String,
}

impl DispatchRecord {
    /// A new in-progress dispatch.
    pub fn start(id: String, kind: DispatchType, notes: String, started_at: DateTime) -> Self {
        Self {
            id,
            kind,
            status: DispatchStatus::InProgress,
            started_at: Some(started_at),
            finished_at: None,
            notes,
        }
    }

    /// Marks the dispatch completed at `at`.
    ///
    /// The finish time never precedes the start time: a clock reading earlier
    /// than `started_at` is clamped to it.
    pub fn complete(&mut self, at: DateTime) {
        let finished_at = match self.started_at {
            Some(started_at) if started_at > at => started_at,
            _ => at,
        };
        self.status = DispatchStatus::Completed;
        self.finished_at = Some(finished_at);
    }
}

/// The current local wall-clock time, truncated to microseconds.
///
/// Microseconds are the finest precision the data file has ever carried, so
/// values read back compare equal to what was written.
pub fn now() -> DateTime {
    let now = Zoned::now().datetime();
    let micros = now.subsec_nanosecond() / 1_000;
    now.with()
        .subsec_nanosecond(micros * 1_000)
        .build()
        .unwrap_or(now)
}
