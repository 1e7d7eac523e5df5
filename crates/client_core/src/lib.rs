use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{cookie::Jar, header::HeaderValue, multipart, Client, Response};
use serde::de::DeserializeOwned;
use shared::{
    domain::{AppointmentId, StatusSelector},
    protocol::{Appointment, AppointmentUpdate},
};
use tracing::{info, warn};
use url::Url;

pub mod controller;
pub mod error;
mod report;

pub use controller::AppointmentsController;
pub use error::{Action, ClientError};
pub use report::ReportFile;

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8080/api/clinic";

/// The clinic backend as seen by the dashboard. Each call is a single
/// attempt; failures are returned to the caller untouched.
#[async_trait]
pub trait AppointmentBackend: Send + Sync {
    async fn fetch_appointments(
        &self,
        selector: StatusSelector,
    ) -> Result<Vec<Appointment>, ClientError>;
    async fn submit_appointment_update(
        &self,
        id: AppointmentId,
        update: &AppointmentUpdate,
    ) -> Result<Appointment, ClientError>;
    async fn upload_report_file(
        &self,
        id: AppointmentId,
        file: ReportFile,
    ) -> Result<Url, ClientError>;
    async fn logout(&self) -> Result<(), ClientError>;
}

/// HTTP client for the clinic appointments API.
///
/// The session is carried by cookies. An existing session cookie can be
/// seeded at construction; cookies the server sets later land in the same
/// jar and go out with every following request.
pub struct ClinicClient {
    http: Client,
    base_url: Url,
}

impl ClinicClient {
    pub fn new(base_url: &str, session_cookie: Option<&str>) -> Result<Self, ClientError> {
        let base_url = normalize_base_url(base_url)?;
        let jar = Jar::default();
        if let Some(cookie) = session_cookie {
            seed_cookies(&jar, cookie, &base_url)?;
        }
        let http = Client::builder()
            .cookie_provider(Arc::new(jar))
            .build()
            .map_err(ClientError::HttpClient)?;
        Ok(Self { http, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> Result<Url, ClientError> {
        Ok(self.base_url.join(path)?)
    }
}

/// Seeds `name=value` pairs, written as in a `Cookie` header, for the whole
/// host so a session the server later rotates replaces them.
fn seed_cookies(jar: &Jar, cookie: &str, base_url: &Url) -> Result<(), ClientError> {
    if HeaderValue::from_str(cookie).is_err() {
        return Err(ClientError::InvalidSessionCookie);
    }
    for pair in cookie.split(';').map(str::trim).filter(|pair| !pair.is_empty()) {
        if !pair.contains('=') {
            return Err(ClientError::InvalidSessionCookie);
        }
        jar.add_cookie_str(&format!("{pair}; Path=/"), base_url);
    }
    Ok(())
}

/// Ensures the base ends in `/` so relative joins append instead of
/// replacing the last path segment.
fn normalize_base_url(raw: &str) -> Result<Url, ClientError> {
    let raw = raw.trim();
    let mut url = Url::parse(raw)?;
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

fn checked(
    action: Action,
    sent: Result<Response, reqwest::Error>,
) -> Result<Response, ClientError> {
    let response = sent.map_err(|source| ClientError::Network { action, source })?;
    let status = response.status();
    if !status.is_success() {
        warn!(%action, %status, "clinic api rejected request");
        return Err(ClientError::Status { action, status });
    }
    Ok(response)
}

async fn decode<T: DeserializeOwned>(action: Action, response: Response) -> Result<T, ClientError> {
    response
        .json::<T>()
        .await
        .map_err(|source| ClientError::Decode { action, source })
}

#[async_trait]
impl AppointmentBackend for ClinicClient {
    async fn fetch_appointments(
        &self,
        selector: StatusSelector,
    ) -> Result<Vec<Appointment>, ClientError> {
        let action = Action::FetchAppointments;
        let url = self.endpoint(&format!("appointments/{}", selector.path_segment()))?;
        let response = checked(action, self.http.get(url).send().await)?;
        let appointments: Vec<Appointment> = decode(action, response).await?;
        info!(%selector, count = appointments.len(), "fetched appointments");
        Ok(appointments)
    }

    async fn submit_appointment_update(
        &self,
        id: AppointmentId,
        update: &AppointmentUpdate,
    ) -> Result<Appointment, ClientError> {
        let action = Action::UpdateAppointment;
        let url = self.endpoint(&format!("appointments/update/{id}"))?;
        let response = checked(action, self.http.post(url).json(update).send().await)?;
        let updated: Appointment = decode(action, response).await?;
        info!(
            appointment_id = %updated.id,
            status = %updated.status,
            "appointment updated"
        );
        Ok(updated)
    }

    async fn upload_report_file(
        &self,
        id: AppointmentId,
        file: ReportFile,
    ) -> Result<Url, ClientError> {
        let action = Action::UploadReport;
        let url = self.endpoint(&format!("appointments/upload-report/{id}"))?;
        let size_bytes = file.bytes.len();
        let part = multipart::Part::bytes(file.bytes)
            .file_name(file.file_name.clone())
            .mime_str(file.mime_type)
            .map_err(ClientError::HttpClient)?;
        let form = multipart::Form::new().part("file", part);

        let response = checked(action, self.http.post(url).multipart(form).send().await)?;
        let message = response
            .text()
            .await
            .map_err(|source| ClientError::Decode { action, source })?;
        let report_url = report::extract_report_url(&message).ok_or_else(|| {
            warn!(appointment_id = %id, %message, "upload response carried no report url");
            ClientError::MissingReportUrl
        })?;
        info!(
            appointment_id = %id,
            file_name = %file.file_name,
            size_bytes,
            %report_url,
            "clinic report uploaded"
        );
        Ok(report_url)
    }

    async fn logout(&self) -> Result<(), ClientError> {
        let action = Action::Logout;
        let url = self.endpoint("auth/logout")?;
        checked(action, self.http.post(url).send().await)?;
        info!("session logged out");
        Ok(())
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
