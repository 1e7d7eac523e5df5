use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::error::SelectorError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AppointmentId(pub i64);

impl fmt::Display for AppointmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AppointmentStatus {
    Pending,
    Confirmed,
    Completed,
    Cancelled,
}

impl AppointmentStatus {
    pub const ALL: [AppointmentStatus; 4] = [
        AppointmentStatus::Pending,
        AppointmentStatus::Confirmed,
        AppointmentStatus::Completed,
        AppointmentStatus::Cancelled,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            AppointmentStatus::Pending => "PENDING",
            AppointmentStatus::Confirmed => "CONFIRMED",
            AppointmentStatus::Completed => "COMPLETED",
            AppointmentStatus::Cancelled => "CANCELLED",
        }
    }

    /// Cancelled and completed visits never show up as upcoming.
    pub fn is_closed(self) -> bool {
        matches!(
            self,
            AppointmentStatus::Completed | AppointmentStatus::Cancelled
        )
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AppointmentStatus {
    type Err = SelectorError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let raw = raw.trim();
        AppointmentStatus::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(raw))
            .ok_or_else(|| SelectorError::UnknownStatus(raw.to_string()))
    }
}

/// Status tab choice. The backend narrows by status, so this is a query
/// parameter for the fetch rather than a predicate over held data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusSelector {
    #[default]
    All,
    Only(AppointmentStatus),
}

impl StatusSelector {
    /// Path segment understood by `GET /appointments/{segment}`.
    pub fn path_segment(self) -> &'static str {
        match self {
            StatusSelector::All => "all",
            StatusSelector::Only(AppointmentStatus::Pending) => "pending",
            StatusSelector::Only(AppointmentStatus::Confirmed) => "confirmed",
            StatusSelector::Only(AppointmentStatus::Completed) => "completed",
            StatusSelector::Only(AppointmentStatus::Cancelled) => "cancelled",
        }
    }

    pub fn matches(self, status: AppointmentStatus) -> bool {
        match self {
            StatusSelector::All => true,
            StatusSelector::Only(wanted) => wanted == status,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            StatusSelector::All => "All Appointments",
            StatusSelector::Only(AppointmentStatus::Pending) => "Pending",
            StatusSelector::Only(AppointmentStatus::Confirmed) => "Confirmed",
            StatusSelector::Only(AppointmentStatus::Completed) => "Completed",
            StatusSelector::Only(AppointmentStatus::Cancelled) => "Cancelled",
        }
    }
}

impl FromStr for StatusSelector {
    type Err = SelectorError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let raw = raw.trim();
        if raw.eq_ignore_ascii_case("all") {
            return Ok(StatusSelector::All);
        }
        raw.parse::<AppointmentStatus>()
            .map(StatusSelector::Only)
            .map_err(|_| SelectorError::UnknownStatusSelector(raw.to_string()))
    }
}

impl fmt::Display for StatusSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path_segment())
    }
}

/// Client-side time range applied to whatever set was fetched last.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeWindow {
    #[default]
    AllTime,
    Today,
    ThisWeek,
    ThisMonth,
}

impl TimeWindow {
    pub fn as_str(self) -> &'static str {
        match self {
            TimeWindow::AllTime => "all",
            TimeWindow::Today => "today",
            TimeWindow::ThisWeek => "week",
            TimeWindow::ThisMonth => "month",
        }
    }
}

impl FromStr for TimeWindow {
    type Err = SelectorError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "all" | "all_time" | "all-time" => Ok(TimeWindow::AllTime),
            "today" => Ok(TimeWindow::Today),
            "week" | "this_week" | "this-week" => Ok(TimeWindow::ThisWeek),
            "month" | "this_month" | "this-month" => Ok(TimeWindow::ThisMonth),
            _ => Err(SelectorError::UnknownTimeWindow(raw.trim().to_string())),
        }
    }
}

impl fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
