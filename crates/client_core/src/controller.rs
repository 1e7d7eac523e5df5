use appointment_core::AppointmentBoard;
use chrono::{DateTime, TimeZone};
use shared::{
    domain::{AppointmentId, StatusSelector, TimeWindow},
    protocol::{Appointment, AppointmentUpdate},
};
use tracing::warn;
use url::Url;

use crate::{error::ClientError, report::ReportFile, AppointmentBackend};

/// Drives the appointment list view: fetches per status tab, narrows per
/// time window, and folds saved edits back into the held set.
///
/// A failed action leaves the previously held appointments untouched and
/// keeps the error message for display until the next successful action.
pub struct AppointmentsController<B> {
    backend: B,
    board: AppointmentBoard,
    last_error: Option<String>,
}

impl<B: AppointmentBackend> AppointmentsController<B> {
    pub fn new(backend: B, window: TimeWindow) -> Self {
        Self {
            backend,
            board: AppointmentBoard::new(window),
            last_error: None,
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn board(&self) -> &AppointmentBoard {
        &self.board
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Fetches the set for `status` and makes it the held snapshot.
    pub async fn select_status(&mut self, status: StatusSelector) -> Result<usize, ClientError> {
        let fetched = self.backend.fetch_appointments(status).await;
        let appointments = self.record(fetched)?;
        let count = appointments.len();
        self.board.load(status, appointments);
        Ok(count)
    }

    /// Re-runs the fetch for the active status tab.
    pub async fn refresh(&mut self) -> Result<usize, ClientError> {
        self.select_status(self.board.status()).await
    }

    pub fn select_window(&mut self, window: TimeWindow) {
        self.board.set_window(window);
    }

    pub fn visible<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> Vec<&Appointment> {
        self.board.visible(now)
    }

    /// Starts an edit of a held appointment, prefilled from its current values.
    pub fn edit(&self, id: AppointmentId) -> Option<AppointmentUpdate> {
        self.board.find(id).map(AppointmentUpdate::from_appointment)
    }

    /// Submits `update` and merges the record the backend returns.
    pub async fn save(
        &mut self,
        id: AppointmentId,
        update: &AppointmentUpdate,
    ) -> Result<Appointment, ClientError> {
        let submitted = self.backend.submit_appointment_update(id, update).await;
        let updated = self.record(submitted)?;
        if !self.board.apply_update(&updated) {
            warn!(appointment_id = %updated.id, "saved appointment is not in the held list");
        }
        Ok(updated)
    }

    /// Uploads a report and points the pending edit at it. The edit still has
    /// to be saved for the appointment to reference the report.
    pub async fn attach_report(
        &mut self,
        id: AppointmentId,
        file: ReportFile,
        draft: &mut AppointmentUpdate,
    ) -> Result<Url, ClientError> {
        let uploaded = self.backend.upload_report_file(id, file).await;
        let report_url = self.record(uploaded)?;
        draft.clinic_report_url = report_url.to_string();
        Ok(report_url)
    }

    fn record<T>(&mut self, outcome: Result<T, ClientError>) -> Result<T, ClientError> {
        match outcome {
            Ok(value) => {
                self.last_error = None;
                Ok(value)
            }
            Err(error) => {
                warn!(%error, "clinic action failed");
                self.last_error = Some(error.to_string());
                Err(error)
            }
        }
    }
}
