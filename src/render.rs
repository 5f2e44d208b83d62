use serde::{Deserialize, Serialize};

use crate::client::DetectionStatus;
use crate::threshold::{self, ThresholdConfig};

/// Alarm card wording. `{threshold}` in any field is replaced with the
/// configured threshold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlarmText {
    pub active_status: String,
    pub active_text: String,
    pub idle_status: String,
    pub idle_text: String,
}

impl Default for AlarmText {
    fn default() -> Self {
        Self {
            active_status: "ACTIVE!".into(),
            active_text: "More than {threshold} people detected!".into(),
            idle_status: "OFF".into(),
            idle_text: "Monitoring...".into(),
        }
    }
}

/// Everything the display shows for one poll result.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusView {
    pub count: String,
    pub alarm_status: String,
    pub alarm_text: String,
    pub alarm_active: bool,
    pub bar_fill: f64,
    pub bar_label: String,
    pub warning: bool,
}

/// Where a [`StatusView`] ends up.
pub trait DisplaySurface {
    fn show(&self, view: &StatusView);
}

/// Turns detection snapshots into display updates.
pub struct StatusRenderer {
    surface: Box<dyn DisplaySurface>,
    threshold: ThresholdConfig,
    text: AlarmText,
}

impl StatusRenderer {
    pub fn new(surface: Box<dyn DisplaySurface>, threshold: ThresholdConfig, text: AlarmText) -> Self {
        Self {
            surface,
            threshold,
            text,
        }
    }

    pub fn view(&self, status: &DetectionStatus) -> StatusView {
        let reading = threshold::render(status.count, &self.threshold);
        let (alarm_status, alarm_text) = if status.alarm {
            (&self.text.active_status, &self.text.active_text)
        } else {
            (&self.text.idle_status, &self.text.idle_text)
        };
        let limit = self.threshold.threshold().to_string();

        StatusView {
            count: status.count.to_string(),
            alarm_status: alarm_status.replace("{threshold}", &limit),
            alarm_text: alarm_text.replace("{threshold}", &limit),
            alarm_active: status.alarm,
            bar_fill: reading.fill,
            bar_label: reading.label(),
            warning: reading.warning,
        }
    }

    pub fn render(&self, status: &DetectionStatus) -> StatusView {
        let view = self.view(status);
        self.surface.show(&view);
        view
    }
}
