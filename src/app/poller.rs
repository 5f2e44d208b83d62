use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use super::state::{AppState, BackendEvent};
use crate::client::StatusClient;
use crate::config::Credentials;

/// The running poll loop. Dropping it stops further polls; requests
/// already in flight still report back.
pub struct PollHandle(JoinHandle<()>);

impl Drop for PollHandle {
    fn drop(&mut self) {
        self.0.abort();
    }
}

/// Poll the server on a fixed cadence, starting immediately.
///
/// Each tick spawns its own request, so a slow response never delays the
/// next poll. Results carry the tick's sequence number.
pub fn spawn_poller(
    runtime: &Handle,
    client: StatusClient,
    credentials: Option<Credentials>,
    interval: Duration,
    sender: async_channel::Sender<BackendEvent>,
) -> PollHandle {
    let task = runtime.spawn(async move {
        if let Some(creds) = credentials {
            if let Err(e) = client.login(&creds.username, &creds.password).await {
                log::error!("Login failed: {e}");
            }
        }

        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut seq: u64 = 0;

        loop {
            ticker.tick().await;
            if sender.is_closed() {
                break;
            }
            seq += 1;

            let client = client.clone();
            let sender = sender.clone();
            tokio::spawn(async move {
                let event = match client.fetch_status().await {
                    Ok(status) => BackendEvent::StatusReceived { seq, status },
                    Err(e) => BackendEvent::PollFailed {
                        seq,
                        error: e.to_string(),
                    },
                };
                let _ = sender.send(event).await;
            });
        }
        log::debug!("Poller stopped after {seq} polls");
    });
    PollHandle(task)
}

/// Start polling for the dashboard in `state`.
pub fn start_polling(state: &Rc<RefCell<AppState>>) {
    let mut s = state.borrow_mut();
    log::info!(
        "Polling {} every {}ms",
        s.config.server_url,
        s.config.poll_interval_ms
    );
    let handle = spawn_poller(
        &s.runtime,
        s.client.clone(),
        s.config.credentials.clone(),
        s.config.poll_interval(),
        s.backend_sender.clone(),
    );
    s.poller = Some(handle);
}
