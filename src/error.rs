//! Custom error types for the crate.
//!
//! This module defines the primary error type, `BoardError`, for the whole
//! runtime. Using the `thiserror` crate, it provides a centralized and
//! consistent way to handle the different failure kinds the capability
//! runtime can surface, from bad numeric inputs to configuration decode
//! problems and opaque driver faults.
//!
//! ## Error taxonomy
//!
//! - **`InvalidValue`**: a numeric field was outside its legal domain and
//!   clamping is not the policy for that field (gamma, ADC divisor).
//!   Fields whose policy IS clamping (speeds, positions, brightness) never
//!   produce this error; they are corrected silently with a warning.
//! - **`InvalidRange`**: a servo pulse range where the minimum does not sit
//!   below the maximum.
//! - **`UnknownColorName`**: a named-color lookup miss.
//! - **`NoSuchItem`**: a call was routed to an item id the board does not
//!   expose for that capability kind.
//! - **`DuplicateItem`**: the same id was declared twice for one capability
//!   kind at construction time.
//! - **`MalformedConfig`**: a structural or type mismatch while decoding a
//!   configuration, carrying the offending `kind/id/field` path.
//! - **`Io`**: wraps `std::io::Error` for configuration file operations.
//! - **`Driver`**: an opaque pass-through from the board-specific driver.
//! - **`Shutdown`**: the collected per-item failures of a best-effort stop
//!   sweep; the sweep itself never aborts early.

use thiserror::Error;

use crate::items::{CapabilityKind, ItemId};

/// Convenience alias for results using the crate error type.
pub type BoardResult<T> = std::result::Result<T, BoardError>;

/// Errors surfaced by the capability runtime.
#[derive(Error, Debug)]
pub enum BoardError {
    /// A numeric field was outside its legal domain where clamping is not
    /// the defined policy.
    #[error("{field} must be {constraint}, was {value}")]
    InvalidValue {
        /// Name of the offending field.
        field: &'static str,
        /// Human-readable constraint the value violated.
        constraint: &'static str,
        /// The rejected value.
        value: f64,
    },

    /// A servo pulse range whose minimum is not below its maximum.
    #[error("servo pulse range invalid: min {min_us}us must be below max {max_us}us")]
    InvalidRange {
        /// Requested minimum pulse width in microseconds.
        min_us: u32,
        /// Requested maximum pulse width in microseconds.
        max_us: u32,
    },

    /// A color name that is not in the extended web color table.
    #[error("unknown color name '{0}'")]
    UnknownColorName(String),

    /// An item id the board does not expose for the given capability kind.
    #[error("board has no {kind} with id {id}")]
    NoSuchItem {
        /// Capability kind the lookup was routed to.
        kind: CapabilityKind,
        /// The missing item id.
        id: ItemId,
    },

    /// The same item id declared twice for one capability kind.
    #[error("duplicate {kind} id {id}")]
    DuplicateItem {
        /// Capability kind carrying the duplicate.
        kind: CapabilityKind,
        /// The duplicated item id.
        id: ItemId,
    },

    /// A structural or type mismatch while decoding a configuration.
    #[error("malformed config at {path}: {reason}")]
    MalformedConfig {
        /// `kind/id/field` path to the offending entry, or `<document>`
        /// when the problem is with the document itself.
        path: String,
        /// What was wrong at that path.
        reason: String,
    },

    /// Configuration file I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Opaque failure reported by the board-specific driver.
    #[error("driver fault: {0}")]
    Driver(anyhow::Error),

    /// Collected failures from a best-effort stop sweep.
    #[error("shutdown completed with {} failure(s)", .0.len())]
    Shutdown(Vec<BoardError>),
}

impl From<serde_yaml::Error> for BoardError {
    fn from(err: serde_yaml::Error) -> Self {
        BoardError::MalformedConfig {
            path: "<document>".to_string(),
            reason: err.to_string(),
        }
    }
}
