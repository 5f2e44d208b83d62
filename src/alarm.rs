use crate::audio::{AudioBackend, BackendKind};

/// Outcome of feeding one alarm flag to the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// OFF → ACTIVE with this backend sounding
    Activated(BackendKind),
    /// Alarm raised but no backend could start; stays OFF and retries
    VisualOnly,
    /// ACTIVE → OFF
    Deactivated,
    Unchanged,
}

/// Owns the alarm sound state.
///
/// The primary backend is always tried first; the fallback is tried once per
/// activation when the primary fails. At most one backend runs at a time.
pub struct AlarmController {
    primary: Box<dyn AudioBackend>,
    fallback: Box<dyn AudioBackend>,
    active: Option<BackendKind>,
}

impl AlarmController {
    pub fn new(primary: Box<dyn AudioBackend>, fallback: Box<dyn AudioBackend>) -> Self {
        Self {
            primary,
            fallback,
            active: None,
        }
    }

    pub fn is_playing(&self) -> bool {
        self.active.is_some()
    }

    pub fn active_backend(&self) -> Option<BackendKind> {
        self.active
    }

    /// Drive the state machine with the latest alarm flag.
    pub fn apply(&mut self, alarm: bool) -> Transition {
        match (alarm, self.is_playing()) {
            (true, false) => self.activate(),
            (false, true) => self.deactivate(),
            _ => Transition::Unchanged,
        }
    }

    pub fn activate(&mut self) -> Transition {
        if self.active.is_some() {
            return Transition::Unchanged;
        }

        let kind = match self.primary.start() {
            Ok(()) => self.primary.kind(),
            Err(primary_err) => {
                log::warn!(
                    "Alarm sound unavailable ({primary_err}), falling back to {} backend",
                    self.fallback.kind()
                );
                match self.fallback.start() {
                    Ok(()) => self.fallback.kind(),
                    Err(fallback_err) => {
                        log::error!("No alarm audio available, visual alarm only: {fallback_err}");
                        return Transition::VisualOnly;
                    }
                }
            }
        };

        log::info!("Alarm started ({kind})");
        self.active = Some(kind);
        Transition::Activated(kind)
    }

    /// Stop whatever is sounding. Safe when already OFF.
    pub fn deactivate(&mut self) -> Transition {
        let Some(kind) = self.active.take() else {
            return Transition::Unchanged;
        };
        if kind == self.primary.kind() {
            self.primary.stop();
        } else {
            self.fallback.stop();
        }
        log::info!("Alarm stopped");
        Transition::Deactivated
    }
}
