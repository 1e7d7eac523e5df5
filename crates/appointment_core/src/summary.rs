use chrono::{DateTime, TimeZone};
use shared::{domain::AppointmentStatus, protocol::Appointment};

use crate::filter::upcoming;

/// Headline counts for the overview page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DashboardSummary {
    pub total: usize,
    pub upcoming: usize,
    pub pending: usize,
}

impl DashboardSummary {
    pub fn from_appointments<Tz: TimeZone>(all: &[Appointment], now: &DateTime<Tz>) -> Self {
        Self {
            total: all.len(),
            upcoming: upcoming(all, now).len(),
            pending: all
                .iter()
                .filter(|appointment| appointment.status == AppointmentStatus::Pending)
                .count(),
        }
    }
}
