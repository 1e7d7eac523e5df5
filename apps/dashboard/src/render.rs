use std::fmt::{Display, Write as _};

use appointment_core::{parse_appointment_date, DashboardSummary};
use chrono::TimeZone;
use shared::{
    domain::StatusSelector,
    protocol::{Appointment, Nullable},
};

const NOT_AVAILABLE: &str = "N/A";

/// Plain-text card for one appointment, dates shown in the zone `tz`.
pub fn card<Tz>(appointment: &Appointment, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let when = parse_appointment_date(&appointment.appointment_date, tz);
    let mut out = String::new();

    let _ = writeln!(
        out,
        "#{} {} [{}]",
        appointment.id, appointment.patient_name, appointment.status
    );
    let _ = writeln!(
        out,
        "  ID: {} | Contact: {}",
        appointment.patient_id, appointment.patient_contact_no
    );
    let date = when
        .as_ref()
        .map(|at| at.format("%b %-d, %Y").to_string())
        .unwrap_or_else(|| NOT_AVAILABLE.to_string());
    let _ = writeln!(out, "  Date: {date}");
    if appointment.has_time_component() {
        let time = when
            .as_ref()
            .map(|at| at.format("%I:%M %p").to_string())
            .unwrap_or_else(|| NOT_AVAILABLE.to_string());
        let _ = writeln!(out, "  Time: {time}");
    }

    let requirement = non_empty(&appointment.medical_requirement)
        .unwrap_or("No specific requirement noted.");
    let _ = writeln!(out, "  Medical requirement: {requirement}");
    if let Some(remarks) = non_empty(&appointment.remarks) {
        let _ = writeln!(out, "  Remarks: {remarks}");
    }
    if let Some(report) = non_empty(&appointment.clinic_report_url) {
        let _ = writeln!(out, "  Report: {report}");
    }

    let clinic = &appointment.clinic;
    let _ = write!(
        out,
        "  Clinic: {} | {} | {}",
        clinic.name, clinic.contact_no, clinic.address
    );
    out
}

fn non_empty(value: &Nullable<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|text| !text.is_empty())
}

pub fn list<Tz>(status: StatusSelector, appointments: &[&Appointment], tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let noun = if appointments.len() == 1 {
        "appointment"
    } else {
        "appointments"
    };
    let mut out = format!(
        "{}: showing {} {noun}\n",
        status.label(),
        appointments.len()
    );
    if appointments.is_empty() {
        match status {
            StatusSelector::All => out.push_str("No appointments have been scheduled yet\n"),
            StatusSelector::Only(wanted) => {
                let _ = writeln!(
                    out,
                    "No {} appointments found",
                    wanted.as_str().to_ascii_lowercase()
                );
            }
        }
        return out;
    }
    for appointment in appointments {
        out.push('\n');
        out.push_str(&card(appointment, tz));
        out.push('\n');
    }
    out
}

pub fn summary<Tz>(
    totals: DashboardSummary,
    upcoming: &[&Appointment],
    all: &[Appointment],
    tz: &Tz,
) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let mut out = String::new();
    let _ = writeln!(out, "Total appointments: {}", totals.total);
    let _ = writeln!(out, "Upcoming: {}", totals.upcoming);
    let _ = writeln!(out, "Pending: {}", totals.pending);

    out.push_str("\nUpcoming appointments\n");
    if upcoming.is_empty() {
        out.push_str("No upcoming appointments\n");
    }
    for appointment in upcoming {
        out.push('\n');
        out.push_str(&card(appointment, tz));
        out.push('\n');
    }

    out.push_str("\nAll appointments\n");
    if all.is_empty() {
        out.push_str("No appointments found\n");
    }
    for appointment in all {
        out.push('\n');
        out.push_str(&card(appointment, tz));
        out.push('\n');
    }
    out
}

#[cfg(test)]
#[path = "tests/render_tests.rs"]
mod tests;
