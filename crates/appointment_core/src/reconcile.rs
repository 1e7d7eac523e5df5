use shared::protocol::Appointment;
use tracing::debug;

/// Returns `list` with the entry sharing `updated.id` replaced by `updated`.
///
/// Length and positions are preserved. When no entry matches, the result
/// equals `list`; nothing is appended.
pub fn reconcile(list: &[Appointment], updated: &Appointment) -> Vec<Appointment> {
    let mut replaced = false;
    let merged: Vec<Appointment> = list
        .iter()
        .map(|current| {
            if current.id == updated.id {
                replaced = true;
                updated.clone()
            } else {
                current.clone()
            }
        })
        .collect();
    if !replaced {
        debug!(appointment_id = %updated.id, "edited appointment is not in the current list");
    }
    merged
}
