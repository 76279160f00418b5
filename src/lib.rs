//! # Board Support Library
//!
//! This crate is the capability composition and configuration runtime for
//! small robotics controller boards: boards that expose some subset of
//! four capability kinds — motors, servos, analog input channels, and RGB
//! indicators — on top of a board-specific driver that performs the actual
//! register/bus I/O.
//!
//! The crate owns the typed, validated, cacheable state for every channel,
//! exposes it through a uniform property surface, round-trips per-item
//! configuration through structured and textual (YAML) forms, and runs the
//! color-correction pipeline that turns user-facing color inputs into
//! corrected raw RGB outputs. The driver underneath stays a thin, narrow
//! boundary: four small traits a board implements for the capabilities it
//! actually has.
//!
//! ## Crate Structure
//!
//! - **`board`**: the [`BoardRuntime`] composition root and its builder;
//!   aggregates the capability groups a concrete board supports.
//! - **`group`**: [`CapabilityGroup`], an ordered collection of one kind's
//!   items with discovery, best-effort shutdown, and bulk configuration.
//! - **`items`**: the four capability item variants ([`MotorItem`],
//!   [`ServoItem`], [`AdcItem`], [`LedItem`]) and the shared
//!   [`CapabilityItem`] trait.
//! - **`color`**: the pure color pipeline — HSV↔RGB, named-color lookup,
//!   and the brightness/gamma/saturation correction stage.
//! - **`config`**: [`BoardConfig`] and the structured/textual codec with
//!   merge-on-load semantics.
//! - **`hardware`**: the driver capability traits and the mock driver.
//! - **`clock`**: the monotonic [`Clock`] abstraction behind the ADC
//!   staleness cache.
//! - **`error`**: the [`BoardError`] taxonomy.
//!
//! ## Concurrency
//!
//! The runtime is a synchronous, single-owner state machine: every setter
//! validates, mutates, and writes through to the driver before returning.
//! Embedders needing shared access wrap a [`BoardRuntime`] in their own
//! lock.

pub mod board;
pub mod clock;
pub mod color;
pub mod config;
pub mod error;
pub mod group;
pub mod hardware;
pub mod items;

pub use board::{BoardBuilder, BoardRuntime};
pub use clock::{Clock, SystemClock};
pub use config::{AdcConfig, BoardConfig, LedConfig, MotorConfig, ServoConfig};
pub use error::{BoardError, BoardResult};
pub use group::CapabilityGroup;
pub use items::{
    AdcItem, CapabilityItem, CapabilityKind, ItemId, LedItem, MotorItem, ServoItem,
};
