use chrono::{DateTime, TimeZone};
use shared::{
    domain::{AppointmentId, StatusSelector, TimeWindow},
    protocol::Appointment,
};
use tracing::debug;

use crate::{filter::filter_by_window, reconcile::reconcile};

/// State behind the appointment list view.
///
/// Holds the set last fetched for `status` and the active time window. The
/// window is applied on read, so switching windows never needs a fetch.
#[derive(Debug, Clone, Default)]
pub struct AppointmentBoard {
    snapshot: Vec<Appointment>,
    status: StatusSelector,
    window: TimeWindow,
}

impl AppointmentBoard {
    pub fn new(window: TimeWindow) -> Self {
        Self {
            window,
            ..Self::default()
        }
    }

    pub fn status(&self) -> StatusSelector {
        self.status
    }

    pub fn window(&self) -> TimeWindow {
        self.window
    }

    pub fn snapshot(&self) -> &[Appointment] {
        &self.snapshot
    }

    /// Replaces the held set with a fresh fetch made for `status`.
    pub fn load(&mut self, status: StatusSelector, appointments: Vec<Appointment>) {
        debug!(%status, count = appointments.len(), "appointment board loaded");
        self.status = status;
        self.snapshot = appointments;
    }

    pub fn set_window(&mut self, window: TimeWindow) {
        self.window = window;
    }

    pub fn visible<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> Vec<&Appointment> {
        filter_by_window(&self.snapshot, self.window, now)
    }

    pub fn find(&self, id: AppointmentId) -> Option<&Appointment> {
        self.snapshot.iter().find(|appointment| appointment.id == id)
    }

    /// Merges an edited record into the held set. Returns whether a record
    /// with the same id was present.
    pub fn apply_update(&mut self, updated: &Appointment) -> bool {
        let present = self.find(updated.id).is_some();
        if present {
            self.snapshot = reconcile(&self.snapshot, updated);
        }
        present
    }
}
