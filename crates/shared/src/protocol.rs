use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Number, Value};

use crate::domain::{AppointmentId, AppointmentStatus};

/// Minute-precision prefix accepted by the edit form, `YYYY-MM-DDTHH:MM`.
const FORM_DATE_TIME_LEN: usize = 16;

/// A field that may be missing, `null`, or set. Missing fields stay missing
/// when the record is written back out, and explicit nulls stay null.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Nullable<T> {
    Absent,
    Null,
    Present(T),
}

impl<T> Default for Nullable<T> {
    fn default() -> Self {
        Nullable::Absent
    }
}

impl<T> Nullable<T> {
    pub fn is_absent(&self) -> bool {
        matches!(self, Nullable::Absent)
    }

    pub fn as_ref(&self) -> Option<&T> {
        match self {
            Nullable::Present(value) => Some(value),
            Nullable::Absent | Nullable::Null => None,
        }
    }
}

impl Nullable<String> {
    pub fn as_deref(&self) -> Option<&str> {
        self.as_ref().map(String::as_str)
    }
}

impl<T> From<Option<T>> for Nullable<T> {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(value) => Nullable::Present(value),
            None => Nullable::Null,
        }
    }
}

impl<T: fmt::Display> fmt::Display for Nullable<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Nullable::Present(value) => fmt::Display::fmt(value, f),
            Nullable::Absent | Nullable::Null => Ok(()),
        }
    }
}

impl<T: Serialize> Serialize for Nullable<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Nullable::Present(value) => value.serialize(serializer),
            Nullable::Absent | Nullable::Null => serializer.serialize_none(),
        }
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Nullable<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Option::<T>::deserialize(deserializer).map(Nullable::from)
    }
}

/// Identifiers and phone numbers arrive as strings or as JSON numbers
/// depending on the backend version; the original JSON type is kept.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TextOrNumber {
    Text(String),
    Number(Number),
}

impl fmt::Display for TextOrNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TextOrNumber::Text(text) => f.write_str(text),
            TextOrNumber::Number(number) => fmt::Display::fmt(number, f),
        }
    }
}

impl From<&str> for TextOrNumber {
    fn from(text: &str) -> Self {
        TextOrNumber::Text(text.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Clinic {
    pub name: String,
    #[serde(default, skip_serializing_if = "Nullable::is_absent")]
    pub contact_no: Nullable<TextOrNumber>,
    #[serde(default, skip_serializing_if = "Nullable::is_absent")]
    pub address: Nullable<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Appointment record as served by the clinic API.
///
/// Records are replaced wholesale after an edit, never patched field by
/// field. A parsed record serializes back to the JSON it came from: unknown
/// fields are kept in `extra`, and optional fields remember whether they
/// were missing or `null`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Appointment {
    pub id: AppointmentId,
    pub patient_name: String,
    #[serde(default, skip_serializing_if = "Nullable::is_absent")]
    pub patient_id: Nullable<TextOrNumber>,
    #[serde(default, skip_serializing_if = "Nullable::is_absent")]
    pub patient_contact_no: Nullable<TextOrNumber>,
    /// Either `YYYY-MM-DD` or a date-time; kept exactly as received.
    pub appointment_date: String,
    pub status: AppointmentStatus,
    #[serde(default, skip_serializing_if = "Nullable::is_absent")]
    pub medical_requirement: Nullable<String>,
    #[serde(default, skip_serializing_if = "Nullable::is_absent")]
    pub remarks: Nullable<String>,
    #[serde(default, skip_serializing_if = "Nullable::is_absent")]
    pub clinic_report_url: Nullable<String>,
    pub clinic: Clinic,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Appointment {
    pub fn has_time_component(&self) -> bool {
        self.appointment_date.contains('T')
    }
}

/// The mutable subset of an appointment, as submitted by the edit form.
///
/// All five fields are always sent; cleared optional text goes out as an
/// empty string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppointmentUpdate {
    pub appointment_date: String,
    pub status: AppointmentStatus,
    pub medical_requirement: String,
    pub remarks: String,
    pub clinic_report_url: String,
}

impl AppointmentUpdate {
    pub fn from_appointment(appointment: &Appointment) -> Self {
        Self {
            appointment_date: form_date(&appointment.appointment_date),
            status: appointment.status,
            medical_requirement: owned_text(&appointment.medical_requirement),
            remarks: owned_text(&appointment.remarks),
            clinic_report_url: owned_text(&appointment.clinic_report_url),
        }
    }
}

fn owned_text(field: &Nullable<String>) -> String {
    field.as_deref().unwrap_or_default().to_string()
}

fn form_date(raw: &str) -> String {
    if raw.contains('T') {
        raw.get(..FORM_DATE_TIME_LEN).unwrap_or(raw).to_string()
    } else {
        raw.to_string()
    }
}
