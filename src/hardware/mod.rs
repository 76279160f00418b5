//! Board driver capability traits.
//!
//! This module defines the narrow, fine-grained traits a board-specific
//! driver implements for the capabilities its hardware actually has.
//! Instead of one monolithic board trait, a driver implements only the
//! pieces it supports:
//!
//! - A two-motor H-bridge board implements just [`MotorDriver`]
//! - A servo HAT implements just [`ServoDriver`]
//! - A combo robotics board implements all four
//!
//! This approach enables:
//! - Better composition (one driver can back several capability kinds)
//! - Clearer contracts (traits are small and focused)
//! - Easier testing (mock individual capabilities)
//!
//! # Design
//!
//! Each trait:
//! - Is synchronous — the runtime is a single-owner state machine and
//!   treats driver latency as unbounded; a hung driver call hangs the
//!   caller.
//! - Is thread-safe (`Send + Sync`); implementations use interior
//!   mutability for whatever bus or register state they carry.
//! - Uses `anyhow::Result` — driver failures are opaque to the runtime and
//!   surface to callers as [`crate::BoardError::Driver`].
//!
//! The runtime performs all range checking, clamping, caching, and color
//! correction before a value reaches a driver, so implementations can
//! forward arguments to the hardware unchecked.

use anyhow::Result;

use crate::items::ItemId;

pub mod mock;

/// Capability: forward motor speed output.
pub trait MotorDriver: Send + Sync {
    /// Write an effective speed in [-1, 1] to the given motor channel.
    ///
    /// The value already has inversion, scaling, and clamping applied.
    fn write_motor(&self, id: ItemId, speed: f64) -> Result<()>;
}

/// Capability: servo pulse width output.
pub trait ServoDriver: Send + Sync {
    /// Write a pulse width in microseconds to the given servo channel.
    ///
    /// `None` disables the servo output entirely (for hardware without a
    /// dedicated disable, writing a zero pulse width is the conventional
    /// equivalent).
    fn write_servo_pulse(&self, id: ItemId, pulse_us: Option<u32>) -> Result<()>;
}

/// Capability: raw analog input.
pub trait AdcDriver: Send + Sync {
    /// Read the raw, unscaled value of the given ADC channel.
    fn read_adc_raw(&self, id: ItemId) -> Result<f64>;
}

/// Capability: RGB indicator output.
pub trait LedDriver: Send + Sync {
    /// Write a corrected RGB triple, channels in [0, 1], to the given LED.
    fn write_led_rgb(&self, id: ItemId, r: f64, g: f64, b: f64) -> Result<()>;
}
