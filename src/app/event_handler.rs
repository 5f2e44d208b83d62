use std::cell::RefCell;
use std::rc::Rc;

use super::state::{AppState, BackendEvent};

/// Handle a backend event on the main thread.
pub fn handle_backend_event(state: &Rc<RefCell<AppState>>, event: BackendEvent) {
    let mut s = state.borrow_mut();
    match event {
        BackendEvent::StatusReceived { seq, status } => {
            log::debug!("Poll #{seq}: count={} alarm={}", status.count, status.alarm);
            if let Some(transition) = s.session.on_status(seq, status) {
                log::debug!(
                    "Alarm {transition:?}, sounding: {:?}",
                    s.session.alarm().active_backend()
                );
            }
        }
        BackendEvent::PollFailed { seq, error } => {
            s.session.on_poll_failed(seq, &error);
        }
    }
}
