use crate::alarm::{AlarmController, Transition};
use crate::client::DetectionStatus;
use crate::render::StatusRenderer;

/// Orders poll results. Requests may overlap, so a response can arrive
/// after a newer one; only results newer than the last applied are taken.
#[derive(Debug, Default)]
pub struct PollSequence {
    latest: u64,
}

impl PollSequence {
    pub fn accept(&mut self, seq: u64) -> bool {
        if seq <= self.latest {
            return false;
        }
        self.latest = seq;
        true
    }
}

/// Per-window monitoring state: the alarm, the renderer and poll ordering.
pub struct MonitorSession {
    alarm: AlarmController,
    renderer: StatusRenderer,
    sequence: PollSequence,
    closed: bool,
}

impl MonitorSession {
    pub fn new(alarm: AlarmController, renderer: StatusRenderer) -> Self {
        Self {
            alarm,
            renderer,
            sequence: PollSequence::default(),
            closed: false,
        }
    }

    /// Apply one poll result. Rendering and the alarm see the same snapshot.
    pub fn on_status(&mut self, seq: u64, status: DetectionStatus) -> Option<Transition> {
        if self.closed {
            log::debug!("Ignoring poll #{seq} after close");
            return None;
        }
        if !self.sequence.accept(seq) {
            log::debug!("Dropping stale poll #{seq}");
            return None;
        }

        self.renderer.render(&status);
        Some(self.alarm.apply(status.alarm))
    }

    /// Failed polls leave everything as it was.
    pub fn on_poll_failed(&self, seq: u64, error: &str) {
        log::error!("Error fetching detection status (poll #{seq}): {error}");
    }

    pub fn alarm(&self) -> &AlarmController {
        &self.alarm
    }

    #[cfg(test)]
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Silence the alarm and stop accepting results. Returns false if the
    /// session was already closed.
    pub fn close(&mut self) -> bool {
        if self.closed {
            return false;
        }
        self.closed = true;
        self.alarm.deactivate();
        true
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;
    use std::time::Duration;

    use super::*;
    use crate::alarm::testing::MockBackend;
    use crate::app::lifecycle::{teardown, StopNotifier};
    use crate::audio::output::testing::{shared, MockOutput};
    use crate::audio::{BackendKind, FileBackend, SirenConfig, SynthesizedBackend};
    use crate::render::testing::RecordingSurface;
    use crate::render::AlarmText;
    use crate::threshold::ThresholdConfig;

    struct JournalNotifier(Rc<RefCell<Vec<String>>>);

    impl StopNotifier for JournalNotifier {
        fn notify_stop(&self) -> Option<tokio::task::JoinHandle<()>> {
            self.0.borrow_mut().push("notify stop".into());
            None
        }
    }

    struct Rig {
        session: MonitorSession,
        surface: RecordingSurface,
        journal: Rc<RefCell<Vec<String>>>,
    }

    fn renderer(surface: &RecordingSurface) -> StatusRenderer {
        StatusRenderer::new(
            Box::new(surface.clone()),
            ThresholdConfig::new(5, 3).unwrap(),
            AlarmText::default(),
        )
    }

    fn rig(file_fails: bool) -> Rig {
        let journal = Rc::new(RefCell::new(Vec::new()));
        let surface = RecordingSurface::default();
        let alarm = AlarmController::new(
            Box::new(MockBackend::new(BackendKind::File, file_fails, &journal)),
            Box::new(MockBackend::new(BackendKind::Synthesized, false, &journal)),
        );
        Rig {
            session: MonitorSession::new(alarm, renderer(&surface)),
            surface,
            journal,
        }
    }

    fn status(count: u32, alarm: bool) -> DetectionStatus {
        DetectionStatus { count, alarm }
    }

    #[test]
    fn quiet_poll_renders_without_sound() {
        let mut rig = rig(false);
        assert_eq!(rig.session.on_status(1, status(1, false)), Some(Transition::Unchanged));

        let view = rig.surface.last().unwrap();
        assert_eq!(view.count, "1");
        assert_eq!(view.alarm_status, "OFF");
        assert_eq!(view.bar_label, "Current: 20% of threshold");
        assert!(!view.warning);
        assert!(rig.journal.borrow().is_empty());
    }

    #[test]
    fn crowded_poll_clamps_bar_and_starts_file_alarm() {
        let mut rig = rig(false);
        assert_eq!(
            rig.session.on_status(1, status(6, true)),
            Some(Transition::Activated(BackendKind::File))
        );

        let view = rig.surface.last().unwrap();
        assert_eq!(view.bar_fill, 1.0);
        assert_eq!(view.bar_label, "Current: 100% of threshold");
        assert!(view.warning);
        assert!(view.alarm_active);
        assert_eq!(*rig.journal.borrow(), vec!["start file"]);
    }

    #[test]
    fn clearing_alarm_stops_backend() {
        let mut rig = rig(true);
        rig.session.on_status(1, status(6, true));
        assert_eq!(
            rig.session.on_status(2, status(2, false)),
            Some(Transition::Deactivated)
        );
        assert!(!rig.session.alarm().is_playing());
        assert_eq!(
            *rig.journal.borrow(),
            vec!["start file", "start synthesized", "stop synthesized"]
        );
        assert_eq!(rig.surface.last().unwrap().alarm_status, "OFF");
    }

    #[test]
    fn stale_results_are_dropped() {
        let mut rig = rig(false);
        rig.session.on_status(2, status(4, true));
        assert_eq!(rig.session.on_status(1, status(0, false)), None);
        assert!(rig.session.alarm().is_playing());
        assert_eq!(rig.surface.shown.borrow().len(), 1);
        assert_eq!(rig.surface.last().unwrap().count, "4");
    }

    #[test]
    fn failed_poll_keeps_previous_state() {
        let mut rig = rig(false);
        rig.session.on_status(1, status(6, true));
        rig.session.on_poll_failed(2, "connection refused");
        assert!(rig.session.alarm().is_playing());
        assert_eq!(rig.surface.shown.borrow().len(), 1);
        // a later success still applies
        assert!(rig.session.on_status(3, status(0, false)).is_some());
    }

    #[test]
    fn teardown_silences_before_notifying() {
        let mut rig = rig(false);
        rig.session.on_status(1, status(6, true));

        let notifier = JournalNotifier(rig.journal.clone());
        assert!(teardown(&mut rig.session, None, &notifier).is_none());
        assert_eq!(
            *rig.journal.borrow(),
            vec!["start file", "stop file", "notify stop"]
        );
        assert!(rig.session.is_closed());

        // runs once; late results are ignored
        teardown(&mut rig.session, None, &notifier);
        assert_eq!(rig.journal.borrow().len(), 3);
        assert_eq!(rig.session.on_status(2, status(9, true)), None);
        assert!(!rig.session.alarm().is_playing());
    }

    #[tokio::test(start_paused = true)]
    async fn missing_asset_falls_back_to_siren() {
        let mock = MockOutput::new(8000);
        let output = shared(&mock);
        let alarm = AlarmController::new(
            Box::new(FileBackend::new(None, output.clone())),
            Box::new(SynthesizedBackend::new(
                output,
                SirenConfig::default(),
                tokio::runtime::Handle::current(),
            )),
        );
        let surface = RecordingSurface::default();
        let mut session = MonitorSession::new(alarm, renderer(&surface));

        assert_eq!(
            session.on_status(1, status(6, true)),
            Some(Transition::Activated(BackendKind::Synthesized))
        );
        assert_eq!(mock.live.get(), 1);
        assert_eq!(session.on_status(2, status(6, true)), Some(Transition::Unchanged));
        assert_eq!(mock.plays.get(), 1);

        tokio::time::sleep(Duration::from_millis(600)).await;
        assert_eq!(session.on_status(3, status(1, false)), Some(Transition::Deactivated));
        assert_eq!(mock.live.get(), 0);
    }
}
