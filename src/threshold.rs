use thiserror::Error;

/// Rejected threshold settings.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ThresholdError {
    #[error("threshold must be positive")]
    ZeroThreshold,
    #[error("warning level {warning_level} must be below threshold {threshold}")]
    WarningNotBelowThreshold { threshold: u32, warning_level: u32 },
}

/// Bar scaling and warning trigger. Fixed for the lifetime of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThresholdConfig {
    threshold: u32,
    warning_level: u32,
}

impl ThresholdConfig {
    pub fn new(threshold: u32, warning_level: u32) -> Result<Self, ThresholdError> {
        if threshold == 0 {
            return Err(ThresholdError::ZeroThreshold);
        }
        if warning_level >= threshold {
            return Err(ThresholdError::WarningNotBelowThreshold {
                threshold,
                warning_level,
            });
        }
        Ok(Self {
            threshold,
            warning_level,
        })
    }

    pub fn threshold(&self) -> u32 {
        self.threshold
    }

    pub fn warning_level(&self) -> u32 {
        self.warning_level
    }
}

impl Default for ThresholdConfig {
    /// Full bar at 2 people, warning from 2 on.
    fn default() -> Self {
        Self {
            threshold: 2,
            warning_level: 1,
        }
    }
}

/// What the threshold bar should show for one count.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThresholdReading {
    /// Rounded, clamped to 0..=100.
    pub percentage: u8,
    /// Unrounded bar fill, clamped to 0.0..=1.0.
    pub fill: f64,
    /// Count is above the warning level.
    pub warning: bool,
}

/// Scale `count` against the configured threshold.
pub fn render(count: u32, config: &ThresholdConfig) -> ThresholdReading {
    let count_wide = u64::from(count);
    let threshold = u64::from(config.threshold);
    // round(100 * c / t), half away from zero, in integers
    let percentage = ((200 * count_wide + threshold) / (2 * threshold)).min(100) as u8;
    let fill = (f64::from(count) / f64::from(config.threshold)).min(1.0);

    ThresholdReading {
        percentage,
        fill,
        warning: count > config.warning_level,
    }
}

impl ThresholdReading {
    pub fn label(&self) -> String {
        format!("Current: {}% of threshold", self.percentage)
    }
}
