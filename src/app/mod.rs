mod event_handler;
mod lifecycle;
mod poller;
mod session;
mod state;

pub use event_handler::handle_backend_event;
pub use lifecycle::{finish_pending, shutdown};
pub use poller::start_polling;
pub use state::{AppState, BackendEvent};
