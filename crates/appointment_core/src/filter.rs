use chrono::{DateTime, Datelike, Days, NaiveDateTime, TimeZone};
use shared::{
    domain::{StatusSelector, TimeWindow},
    protocol::Appointment,
};

use crate::dates::scheduled_at;

/// Narrows `all` to the records matching `status` and `window`.
///
/// The result borrows from `all` and keeps its order. The status check is a
/// plain equality test; callers normally already fetched with the same
/// selector, in which case it keeps everything.
pub fn filter<'a, Tz: TimeZone>(
    all: &'a [Appointment],
    status: StatusSelector,
    window: TimeWindow,
    now: &DateTime<Tz>,
) -> Vec<&'a Appointment> {
    all.iter()
        .filter(|appointment| status.matches(appointment.status))
        .filter(|appointment| window_contains(window, appointment, now))
        .collect()
}

/// Time-window narrowing only, used over a set the backend already filtered
/// by status.
pub fn filter_by_window<'a, Tz: TimeZone>(
    all: &'a [Appointment],
    window: TimeWindow,
    now: &DateTime<Tz>,
) -> Vec<&'a Appointment> {
    filter(all, StatusSelector::All, window, now)
}

/// Whether `appointment` falls in `window` relative to `now`.
///
/// `AllTime` holds for every record. The other windows never hold for a
/// record whose date cannot be parsed.
pub fn window_contains<Tz: TimeZone>(
    window: TimeWindow,
    appointment: &Appointment,
    now: &DateTime<Tz>,
) -> bool {
    if window == TimeWindow::AllTime {
        return true;
    }
    let Some(at) = scheduled_at(appointment, now) else {
        return false;
    };
    let at = at.naive_local();
    let today = now.naive_local();

    match window {
        TimeWindow::AllTime => true,
        TimeWindow::Today => at.date() == today.date(),
        TimeWindow::ThisWeek => {
            week_bounds(today).is_some_and(|(start, end)| at >= start && at <= end)
        }
        TimeWindow::ThisMonth => at.year() == today.year() && at.month() == today.month(),
    }
}

/// Sunday 00:00:00.000 through Saturday 23:59:59.999 of the week holding `today`.
fn week_bounds(today: NaiveDateTime) -> Option<(NaiveDateTime, NaiveDateTime)> {
    let back = u64::from(today.weekday().num_days_from_sunday());
    let sunday = today.date().checked_sub_days(Days::new(back))?;
    let saturday = sunday.checked_add_days(Days::new(6))?;
    Some((
        sunday.and_hms_opt(0, 0, 0)?,
        saturday.and_hms_milli_opt(23, 59, 59, 999)?,
    ))
}

/// Open visits at or after `now`, earliest first.
///
/// Cancelled and completed records are left out, as are records whose date
/// cannot be parsed. Records on the same instant keep their input order.
pub fn upcoming<'a, Tz: TimeZone>(all: &'a [Appointment], now: &DateTime<Tz>) -> Vec<&'a Appointment> {
    let mut selected: Vec<(DateTime<Tz>, &'a Appointment)> = all
        .iter()
        .filter(|appointment| !appointment.status.is_closed())
        .filter_map(|appointment| {
            scheduled_at(appointment, now)
                .filter(|at| at >= now)
                .map(|at| (at, appointment))
        })
        .collect();
    selected.sort_by(|left, right| left.0.cmp(&right.0));
    selected.into_iter().map(|(_, appointment)| appointment).collect()
}
