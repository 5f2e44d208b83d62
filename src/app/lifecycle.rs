use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use tokio::runtime::{Handle, Runtime};
use tokio::task::JoinHandle;

use super::poller::PollHandle;
use super::session::MonitorSession;
use super::state::AppState;
use crate::client::StatusClient;

/// Tells the server the dashboard went away.
pub trait StopNotifier {
    /// Must return immediately. The returned task, if any, is the request
    /// still in flight.
    fn notify_stop(&self) -> Option<JoinHandle<()>>;
}

/// Fire-and-forget `stop_detection` on the tokio runtime.
pub struct RemoteStop {
    client: StatusClient,
    runtime: Handle,
}

impl RemoteStop {
    pub fn new(client: StatusClient, runtime: Handle) -> Self {
        Self { client, runtime }
    }
}

impl StopNotifier for RemoteStop {
    fn notify_stop(&self) -> Option<JoinHandle<()>> {
        let client = self.client.clone();
        let task = self.runtime.spawn(async move {
            match client.stop_detection().await {
                Ok(()) => log::info!("Server detection stopped"),
                Err(e) => log::error!("Error stopping detection: {e}"),
            }
        });
        Some(task)
    }
}

/// Silence the alarm, cancel polling, then notify the server. The alarm is
/// stopped before anything else happens.
pub fn teardown(
    session: &mut MonitorSession,
    poller: Option<PollHandle>,
    notifier: &dyn StopNotifier,
) -> Option<JoinHandle<()>> {
    if !session.close() {
        return None;
    }
    log::info!("Dashboard closing");
    drop(poller);
    notifier.notify_stop()
}

/// Window close hook. Returns the pending stop request.
pub fn shutdown(state: &Rc<RefCell<AppState>>) -> Option<JoinHandle<()>> {
    let mut s = state.borrow_mut();
    let notifier = RemoteStop::new(s.client.clone(), s.runtime.clone());
    let poller = s.poller.take();
    teardown(&mut s.session, poller, &notifier)
}

/// Give pending stop requests up to `grace` to finish before the runtime is
/// torn down. Returns false if any were still running.
pub fn finish_pending(runtime: &Runtime, pending: Vec<JoinHandle<()>>, grace: Duration) -> bool {
    if pending.is_empty() {
        return true;
    }
    let count = pending.len();
    let done = runtime.block_on(async {
        tokio::time::timeout(grace, async {
            for task in pending {
                let _ = task.await;
            }
        })
        .await
    });
    match done {
        Ok(()) => true,
        Err(_) => {
            log::warn!("{count} stop request(s) still pending after {grace:?}");
            false
        }
    }
}
