//! Servo position control.

use std::sync::Arc;

use tracing::debug;

use crate::config::ServoConfig;
use crate::error::{BoardError, BoardResult};
use crate::hardware::ServoDriver;
use crate::items::{check_range, CapabilityItem, ItemId};

/// Default minimum pulse width in microseconds.
pub const DEFAULT_PULSE_MIN_US: u32 = 1500;
/// Default maximum pulse width in microseconds.
pub const DEFAULT_PULSE_MAX_US: u32 = 2500;

/// One servo channel.
///
/// Position is a float in [-1, 1] mapped linearly onto the configured
/// pulse width range, or `None` when the output is disabled. The pulse
/// range defaults to 1500/2500 microseconds and is adjusted per servo to
/// match what the horn actually accepts.
pub struct ServoItem {
    id: ItemId,
    position: Option<f64>,
    pulse_min_us: u32,
    pulse_max_us: u32,
    driver: Arc<dyn ServoDriver>,
}

impl ServoItem {
    pub(crate) fn new(id: ItemId, driver: Arc<dyn ServoDriver>) -> Self {
        Self {
            id,
            position: None,
            pulse_min_us: DEFAULT_PULSE_MIN_US,
            pulse_max_us: DEFAULT_PULSE_MAX_US,
            driver,
        }
    }

    /// Set the servo position, or disable the output with `None`.
    ///
    /// Positions are silently clamped to [-1, 1]; -1 maps to the minimum
    /// pulse width, +1 to the maximum.
    pub fn set_position(&mut self, position: Option<f64>) -> BoardResult<()> {
        match position {
            Some(requested) => {
                let clamped = check_range(requested);
                self.position = Some(clamped);
                let pulse = self.pulse_for(clamped);
                debug!(servo = self.id, position = clamped, pulse_us = pulse, "set servo position");
                self.driver
                    .write_servo_pulse(self.id, Some(pulse))
                    .map_err(BoardError::Driver)
            }
            None => {
                self.position = None;
                debug!(servo = self.id, "disable servo");
                self.driver
                    .write_servo_pulse(self.id, None)
                    .map_err(BoardError::Driver)
            }
        }
    }

    /// Disable the servo output.
    pub fn disable(&mut self) -> BoardResult<()> {
        self.set_position(None)
    }

    /// Replace the pulse width range.
    ///
    /// Fails with [`BoardError::InvalidRange`] when `min_us >= max_us`,
    /// leaving the stored range untouched. The new mapping applies on the
    /// next [`set_position`](Self::set_position); the current output is not
    /// re-sent.
    pub fn set_pulse_range(&mut self, min_us: u32, max_us: u32) -> BoardResult<()> {
        if min_us >= max_us {
            return Err(BoardError::InvalidRange { min_us, max_us });
        }
        self.pulse_min_us = min_us;
        self.pulse_max_us = max_us;
        Ok(())
    }

    /// The stored position, `None` when disabled.
    pub fn position(&self) -> Option<f64> {
        self.position
    }

    /// The configured `(min_us, max_us)` pulse width range.
    pub fn pulse_range(&self) -> (u32, u32) {
        (self.pulse_min_us, self.pulse_max_us)
    }

    fn pulse_for(&self, position: f64) -> u32 {
        let span = f64::from(self.pulse_max_us - self.pulse_min_us);
        let offset = (position + 1.0) / 2.0 * span;
        self.pulse_min_us + offset.round() as u32
    }
}

impl CapabilityItem for ServoItem {
    type Config = ServoConfig;

    fn id(&self) -> ItemId {
        self.id
    }

    fn stop(&mut self) -> BoardResult<()> {
        self.disable()
    }

    fn extract_config(&self) -> ServoConfig {
        ServoConfig {
            position: Some(self.position),
            pulse_min_us: Some(self.pulse_min_us),
            pulse_max_us: Some(self.pulse_max_us),
        }
    }

    fn apply_config(&mut self, config: &ServoConfig) -> BoardResult<()> {
        let min_us = config.pulse_min_us.unwrap_or(self.pulse_min_us);
        let max_us = config.pulse_max_us.unwrap_or(self.pulse_max_us);
        if min_us >= max_us {
            return Err(BoardError::InvalidRange { min_us, max_us });
        }
        self.pulse_min_us = min_us;
        self.pulse_max_us = max_us;
        if let Some(position) = config.position {
            self.set_position(position)?;
        }
        Ok(())
    }
}
