use std::{fmt, io, path::PathBuf};

use reqwest::StatusCode;
use thiserror::Error;

/// The user action a request was made for. Error messages are phrased
/// around it so they can be shown to staff as-is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    FetchAppointments,
    UpdateAppointment,
    UploadReport,
    Logout,
}

impl Action {
    fn infinitive(self) -> &'static str {
        match self {
            Action::FetchAppointments => "fetch appointments",
            Action::UpdateAppointment => "update appointment",
            Action::UploadReport => "upload report",
            Action::Logout => "log out",
        }
    }

    fn gerund(self) -> &'static str {
        match self {
            Action::FetchAppointments => "fetching appointments",
            Action::UpdateAppointment => "updating appointment",
            Action::UploadReport => "uploading report",
            Action::Logout => "logging out",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.infinitive())
    }
}

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("network error while {}: {source}", .action.gerund())]
    Network {
        action: Action,
        #[source]
        source: reqwest::Error,
    },
    #[error("failed to {action}: server responded with {status}")]
    Status { action: Action, status: StatusCode },
    #[error("invalid response while {}: {source}", .action.gerund())]
    Decode {
        action: Action,
        #[source]
        source: reqwest::Error,
    },
    #[error("report upload succeeded but the response carried no report url")]
    MissingReportUrl,
    #[error("invalid api base url: {0}")]
    InvalidBaseUrl(#[from] url::ParseError),
    #[error("invalid session cookie value")]
    InvalidSessionCookie,
    #[error("failed to build http client: {0}")]
    HttpClient(#[source] reqwest::Error),
    #[error("unsupported report file '{0}', expected an image or a PDF")]
    UnsupportedReport(String),
    #[error("failed to read report file {}: {source}", .path.display())]
    ReadReport {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl ClientError {
    /// Whether the request reached the server and got a non-success reply.
    pub fn is_status(&self) -> bool {
        matches!(self, ClientError::Status { .. })
    }
}
