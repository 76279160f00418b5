//! Capability items: the per-channel state holders.
//!
//! One item exists per physical motor, servo, ADC channel, or LED. Each
//! item owns the validated configuration and current value for exactly one
//! channel, and delegates the final raw operation to the board driver. The
//! shared [`CapabilityItem`] trait is what lets a [`crate::CapabilityGroup`]
//! treat a collection of one kind uniformly for discovery, shutdown, and
//! configuration extraction/merge.

use std::fmt;

use tracing::warn;

use crate::error::BoardResult;

mod adc;
mod led;
mod motor;
mod servo;

pub use adc::{AdcItem, DEFAULT_ADC_DIVISOR};
pub use led::LedItem;
pub use motor::MotorItem;
pub use servo::{ServoItem, DEFAULT_PULSE_MAX_US, DEFAULT_PULSE_MIN_US};

/// Identifies one physical channel within a capability kind.
///
/// Ids are unique per kind but need not be contiguous; a board may well
/// expose servos `[0, 1, 5, 6]`.
pub type ItemId = u32;

/// The four capability kinds a board can expose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CapabilityKind {
    /// Bidirectional speed-controlled motor output.
    Motor,
    /// Pulse-width positioned servo output.
    Servo,
    /// Analog input channel.
    Adc,
    /// RGB indicator output.
    Led,
}

impl CapabilityKind {
    /// Stable lowercase name, used as the configuration key and in error
    /// paths.
    pub fn as_str(self) -> &'static str {
        match self {
            CapabilityKind::Motor => "motor",
            CapabilityKind::Servo => "servo",
            CapabilityKind::Adc => "adc",
            CapabilityKind::Led => "led",
        }
    }
}

impl fmt::Display for CapabilityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Common surface of the four item variants.
pub trait CapabilityItem {
    /// The per-item configuration record this item extracts and merges.
    type Config;

    /// The item's channel id.
    fn id(&self) -> ItemId;

    /// Bring the channel to its quiescent state.
    ///
    /// Motors go to zero speed, servos are disabled, LEDs go dark, ADC
    /// channels have nothing to silence.
    fn stop(&mut self) -> BoardResult<()>;

    /// Snapshot the item's configuration with every field populated.
    fn extract_config(&self) -> Self::Config;

    /// Merge the fields present in `config` into the item.
    ///
    /// Unspecified fields keep their current values. Setters' validation
    /// and write-through semantics apply.
    fn apply_config(&mut self, config: &Self::Config) -> BoardResult<()>;
}

/// Clamp a value to [-1, 1], warning when the input was out of range.
pub(crate) fn check_range(value: f64) -> f64 {
    if value < -1.0 {
        warn!(value, "value below -1.0, clamping to -1.0");
        return -1.0;
    }
    if value > 1.0 {
        warn!(value, "value above 1.0, clamping to 1.0");
        return 1.0;
    }
    value
}

/// Clamp a value to [0, 1], warning when the input was out of range.
pub(crate) fn check_positive(value: f64) -> f64 {
    if value < 0.0 {
        warn!(value, "value below 0.0, clamping to 0.0");
        return 0.0;
    }
    if value > 1.0 {
        warn!(value, "value above 1.0, clamping to 1.0");
        return 1.0;
    }
    value
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn check_range_clamps_both_ends() {
        assert_eq!(check_range(-3.0), -1.0);
        assert_eq!(check_range(2.5), 1.0);
        assert_eq!(check_range(0.25), 0.25);
    }

    #[test]
    fn check_positive_clamps_both_ends() {
        assert_eq!(check_positive(-0.1), 0.0);
        assert_eq!(check_positive(1.1), 1.0);
        assert_eq!(check_positive(0.6), 0.6);
    }

    #[test]
    fn kind_names_are_stable() {
        assert_eq!(CapabilityKind::Motor.to_string(), "motor");
        assert_eq!(CapabilityKind::Adc.as_str(), "adc");
    }
}
