use std::rc::Rc;

use tokio::runtime::Handle;

use super::poller::PollHandle;
use super::session::MonitorSession;
use crate::alarm::AlarmController;
use crate::audio::{FileBackend, SharedOutput, SynthesizedBackend};
use crate::client::{DetectionStatus, StatusClient};
use crate::config::Config;
use crate::render::{DisplaySurface, StatusRenderer};

/// Events sent from the tokio runtime to the GTK main thread.
#[derive(Debug, Clone)]
pub enum BackendEvent {
    StatusReceived { seq: u64, status: DetectionStatus },
    PollFailed { seq: u64, error: String },
}

/// Central application state. Lives on the GTK main thread inside Rc<RefCell<>>.
pub struct AppState {
    pub config: Config,
    pub client: StatusClient,
    pub runtime: Handle,
    pub session: MonitorSession,
    pub poller: Option<PollHandle>,
    pub backend_sender: async_channel::Sender<BackendEvent>,
}

impl AppState {
    pub fn new(
        config: Config,
        client: StatusClient,
        runtime: Handle,
        surface: Box<dyn DisplaySurface>,
        sender: async_channel::Sender<BackendEvent>,
    ) -> Self {
        let output = Rc::new(SharedOutput::cpal());
        let file = FileBackend::new(config.alarm_sound.clone(), output.clone());
        let siren = SynthesizedBackend::new(output, config.siren.clone(), runtime.clone());
        let alarm = AlarmController::new(Box::new(file), Box::new(siren));
        let renderer = StatusRenderer::new(surface, config.threshold_config(), config.text.clone());

        Self {
            config,
            client,
            runtime,
            session: MonitorSession::new(alarm, renderer),
            poller: None,
            backend_sender: sender,
        }
    }
}
