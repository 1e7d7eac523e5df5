//! Pure appointment logic for the clinic dashboard: interpreting appointment
//! dates, narrowing a fetched set by status and time window, picking the
//! upcoming visits, and merging an edited record back into a list.
//!
//! Nothing here touches the network. Every function takes its inputs
//! explicitly, including `now`, and returns a fresh value.

mod board;
mod dates;
mod filter;
mod reconcile;
mod summary;

pub use board::AppointmentBoard;
pub use dates::{parse_appointment_date, scheduled_at};
pub use filter::{filter, filter_by_window, upcoming, window_contains};
pub use reconcile::reconcile;
pub use summary::DashboardSummary;

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
