use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, TimeZone};
use shared::protocol::Appointment;

const OFFSET_DATE_TIME_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f%z",
    "%Y-%m-%dT%H:%M:%S%.f%:z",
    "%Y-%m-%dT%H:%M%z",
    "%Y-%m-%dT%H:%M%:z",
];

const NAIVE_DATE_TIME_FORMATS: [&str; 3] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
];

/// Interprets a raw `appointmentDate` in the zone `tz`.
///
/// Values carrying an offset (`Z`, `+05:30` or `+0530`, with or without
/// seconds) are converted into `tz`; naive date-times are
/// read as wall-clock time in `tz`; bare dates become midnight in `tz`.
/// Returns `None` for anything else, including wall-clock times that do not
/// exist in `tz`.
pub fn parse_appointment_date<Tz: TimeZone>(raw: &str, tz: &Tz) -> Option<DateTime<Tz>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Some(with_offset) = parse_with_offset(raw) {
        return Some(with_offset.with_timezone(tz));
    }

    let naive = NAIVE_DATE_TIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })?;

    tz.from_local_datetime(&naive).earliest()
}

/// RFC 3339 plus the shorter forms browsers accept: no seconds, `Z`, and
/// offsets written without a colon.
fn parse_with_offset(raw: &str) -> Option<DateTime<FixedOffset>> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed);
    }
    let zulu;
    let raw = match raw.strip_suffix(['Z', 'z']) {
        Some(head) => {
            zulu = format!("{head}+00:00");
            zulu.as_str()
        }
        None => raw,
    };
    OFFSET_DATE_TIME_FORMATS
        .iter()
        .find_map(|format| DateTime::parse_from_str(raw, format).ok())
}

/// When the appointment takes place, seen from the zone of `now`.
pub fn scheduled_at<Tz: TimeZone>(appointment: &Appointment, now: &DateTime<Tz>) -> Option<DateTime<Tz>> {
    parse_appointment_date(&appointment.appointment_date, &now.timezone())
}
