//! Analog input channels with staleness caching.

use std::sync::Arc;
use std::time::Instant;

use tracing::debug;

use crate::clock::Clock;
use crate::config::AdcConfig;
use crate::error::{BoardError, BoardResult};
use crate::hardware::AdcDriver;
use crate::items::{CapabilityItem, ItemId};

/// Default per-channel divisor applied to raw readings.
pub const DEFAULT_ADC_DIVISOR: f64 = 7891.0;

/// One analog input channel.
///
/// Readings are the driver's raw value divided by the per-channel divisor
/// and rounded. A non-zero cache window serves repeat reads from the last
/// RAW value without touching the driver; because the cache stores the raw
/// value, a divisor change is reflected by cached reads too.
pub struct AdcItem {
    id: ItemId,
    divisor: f64,
    cache_seconds: f64,
    last_raw: Option<f64>,
    last_read_at: Option<Instant>,
    driver: Arc<dyn AdcDriver>,
    clock: Arc<dyn Clock>,
}

impl AdcItem {
    pub(crate) fn new(
        id: ItemId,
        divisor: f64,
        driver: Arc<dyn AdcDriver>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            id,
            divisor,
            cache_seconds: 0.0,
            last_raw: None,
            last_read_at: None,
            driver,
            clock,
        }
    }

    /// Read the scaled channel value, rounded to two digits.
    pub fn read(&mut self) -> BoardResult<f64> {
        self.read_rounded(2)
    }

    /// Read the scaled channel value, rounded to the given number of
    /// digits (half-away-from-zero, like `f64::round`).
    ///
    /// Served from the cache when a raw value newer than the cache window
    /// exists; otherwise performs one driver read and stores the raw value
    /// and read time together.
    pub fn read_rounded(&mut self, digits: i32) -> BoardResult<f64> {
        if let Some(raw) = self.cached_raw() {
            debug!(adc = self.id, raw, "adc read served from cache");
            return Ok(round_to(raw / self.divisor, digits));
        }
        let raw = self.driver.read_adc_raw(self.id).map_err(BoardError::Driver)?;
        self.last_raw = Some(raw);
        self.last_read_at = Some(self.clock.now());
        debug!(adc = self.id, raw, "adc read from driver");
        Ok(round_to(raw / self.divisor, digits))
    }

    /// Set the divisor applied to raw readings.
    ///
    /// Fails with [`BoardError::InvalidValue`] when the divisor is not
    /// strictly positive. Takes effect on the next read, including reads
    /// served from the cache.
    pub fn set_divisor(&mut self, divisor: f64) -> BoardResult<()> {
        if divisor <= 0.0 {
            return Err(BoardError::InvalidValue {
                field: "divisor",
                constraint: "greater than zero",
                value: divisor,
            });
        }
        self.divisor = divisor;
        Ok(())
    }

    /// Set the staleness window in seconds; zero disables caching.
    /// Negative input is clamped to zero.
    pub fn set_cache_seconds(&mut self, seconds: f64) {
        self.cache_seconds = if seconds < 0.0 {
            tracing::warn!(seconds, "cache window below 0, clamping to 0");
            0.0
        } else {
            seconds
        };
    }

    /// The configured divisor.
    pub fn divisor(&self) -> f64 {
        self.divisor
    }

    /// The configured staleness window in seconds.
    pub fn cache_seconds(&self) -> f64 {
        self.cache_seconds
    }

    fn cached_raw(&self) -> Option<f64> {
        if self.cache_seconds <= 0.0 {
            return None;
        }
        let raw = self.last_raw?;
        let read_at = self.last_read_at?;
        let age = self.clock.now().saturating_duration_since(read_at).as_secs_f64();
        (age < self.cache_seconds).then_some(raw)
    }
}

fn round_to(value: f64, digits: i32) -> f64 {
    let factor = 10f64.powi(digits);
    (value * factor).round() / factor
}

impl CapabilityItem for AdcItem {
    type Config = AdcConfig;

    fn id(&self) -> ItemId {
        self.id
    }

    /// Nothing to silence on an input channel.
    fn stop(&mut self) -> BoardResult<()> {
        Ok(())
    }

    fn extract_config(&self) -> AdcConfig {
        AdcConfig {
            divisor: Some(self.divisor),
            cache_seconds: Some(self.cache_seconds),
        }
    }

    fn apply_config(&mut self, config: &AdcConfig) -> BoardResult<()> {
        if let Some(divisor) = config.divisor {
            self.set_divisor(divisor)?;
        }
        if let Some(seconds) = config.cache_seconds {
            self.set_cache_seconds(seconds);
        }
        Ok(())
    }
}
