//! Motor speed control.

use std::sync::Arc;

use tracing::debug;

use crate::config::MotorConfig;
use crate::error::{BoardError, BoardResult};
use crate::hardware::MotorDriver;
use crate::items::{check_range, CapabilityItem, ItemId};

/// One bidirectional motor channel.
///
/// Holds the requested speed along with the inversion flag and output
/// scale. The effective value sent to the driver is
/// `(invert ? -1 : 1) * speed * scale`, re-clamped to [-1, 1] — inversion
/// fixes wiring mistakes without touching application code, scale caps a
/// too-fast drivetrain.
pub struct MotorItem {
    id: ItemId,
    speed: f64,
    invert: bool,
    scale: f64,
    driver: Arc<dyn MotorDriver>,
}

impl MotorItem {
    pub(crate) fn new(id: ItemId, driver: Arc<dyn MotorDriver>) -> Self {
        Self {
            id,
            speed: 0.0,
            invert: false,
            scale: 1.0,
            driver,
        }
    }

    /// Set the requested speed, silently clamped to [-1, 1], and send the
    /// effective output to the driver.
    pub fn set_speed(&mut self, speed: f64) -> BoardResult<()> {
        self.speed = check_range(speed);
        debug!(motor = self.id, speed = self.speed, "set motor speed");
        self.push()
    }

    /// Flip output inversion and re-send the effective output immediately.
    pub fn set_invert(&mut self, invert: bool) -> BoardResult<()> {
        self.invert = invert;
        self.push()
    }

    /// Set the output scale, clamped to be non-negative, and re-send the
    /// effective output immediately.
    pub fn set_scale(&mut self, scale: f64) -> BoardResult<()> {
        self.scale = if scale < 0.0 {
            tracing::warn!(scale, "scale below 0.0, clamping to 0.0");
            0.0
        } else {
            scale
        };
        self.push()
    }

    /// The stored (clamped) requested speed.
    pub fn speed(&self) -> f64 {
        self.speed
    }

    /// Whether the output is inverted.
    pub fn invert(&self) -> bool {
        self.invert
    }

    /// The output scale factor.
    pub fn scale(&self) -> f64 {
        self.scale
    }

    fn push(&self) -> BoardResult<()> {
        let direction = if self.invert { -1.0 } else { 1.0 };
        let effective = (direction * self.speed * self.scale).clamp(-1.0, 1.0);
        self.driver
            .write_motor(self.id, effective)
            .map_err(BoardError::Driver)
    }
}

impl CapabilityItem for MotorItem {
    type Config = MotorConfig;

    fn id(&self) -> ItemId {
        self.id
    }

    fn stop(&mut self) -> BoardResult<()> {
        self.set_speed(0.0)
    }

    fn extract_config(&self) -> MotorConfig {
        MotorConfig {
            speed: Some(self.speed),
            invert: Some(self.invert),
            scale: Some(self.scale),
        }
    }

    fn apply_config(&mut self, config: &MotorConfig) -> BoardResult<()> {
        let any = config.speed.is_some() || config.invert.is_some() || config.scale.is_some();
        if let Some(invert) = config.invert {
            self.invert = invert;
        }
        if let Some(scale) = config.scale {
            self.scale = scale.max(0.0);
        }
        if let Some(speed) = config.speed {
            self.speed = check_range(speed);
        }
        if any {
            self.push()?;
        }
        Ok(())
    }
}
