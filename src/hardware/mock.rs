//! Mock hardware implementations.
//!
//! Provides a simulated board driver and a manually-advanced clock for
//! testing without physical hardware. `MockBoard` records every write so
//! tests can assert on what reached the "hardware", serves scripted raw
//! ADC values, and can be told to fail individual motor channels to
//! exercise best-effort shutdown.

use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use anyhow::{anyhow, Result};

use crate::clock::Clock;
use crate::hardware::{AdcDriver, LedDriver, MotorDriver, ServoDriver};
use crate::items::{CapabilityKind, ItemId};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// A recording fake board driver implementing all four capability traits.
#[derive(Default)]
pub struct MockBoard {
    motor_writes: Mutex<Vec<(ItemId, f64)>>,
    servo_writes: Mutex<Vec<(ItemId, Option<u32>)>>,
    led_writes: Mutex<Vec<(ItemId, [f64; 3])>>,
    adc_raw: Mutex<HashMap<ItemId, f64>>,
    adc_reads: Mutex<HashMap<ItemId, u32>>,
    failing_motors: Mutex<HashSet<ItemId>>,
    op_log: Mutex<Vec<(CapabilityKind, ItemId)>>,
}

impl MockBoard {
    /// Create a fresh board with no recorded writes.
    pub fn new() -> Self {
        Self::default()
    }

    /// Script the raw value the given ADC channel will return.
    pub fn set_adc_raw(&self, id: ItemId, raw: f64) {
        lock(&self.adc_raw).insert(id, raw);
    }

    /// Make every subsequent write to the given motor fail.
    pub fn fail_motor(&self, id: ItemId) {
        lock(&self.failing_motors).insert(id);
    }

    /// Last speed written to the given motor, if any.
    pub fn last_motor_write(&self, id: ItemId) -> Option<f64> {
        lock(&self.motor_writes)
            .iter()
            .rev()
            .find(|(written, _)| *written == id)
            .map(|&(_, speed)| speed)
    }

    /// Every motor write in order.
    pub fn motor_writes(&self) -> Vec<(ItemId, f64)> {
        lock(&self.motor_writes).clone()
    }

    /// Last pulse width written to the given servo, if any.
    pub fn last_servo_write(&self, id: ItemId) -> Option<Option<u32>> {
        lock(&self.servo_writes)
            .iter()
            .rev()
            .find(|(written, _)| *written == id)
            .map(|&(_, pulse)| pulse)
    }

    /// Last RGB triple written to the given LED, if any.
    pub fn last_led_write(&self, id: ItemId) -> Option<[f64; 3]> {
        lock(&self.led_writes)
            .iter()
            .rev()
            .find(|(written, _)| *written == id)
            .map(|&(_, rgb)| rgb)
    }

    /// How many times the driver was asked for a raw read on the channel.
    pub fn adc_read_count(&self, id: ItemId) -> u32 {
        lock(&self.adc_reads).get(&id).copied().unwrap_or(0)
    }

    /// Every driver operation in the order it arrived, regardless of kind.
    pub fn op_log(&self) -> Vec<(CapabilityKind, ItemId)> {
        lock(&self.op_log).clone()
    }
}

impl MotorDriver for MockBoard {
    fn write_motor(&self, id: ItemId, speed: f64) -> Result<()> {
        if lock(&self.failing_motors).contains(&id) {
            return Err(anyhow!("motor {id} output stage fault"));
        }
        lock(&self.op_log).push((CapabilityKind::Motor, id));
        lock(&self.motor_writes).push((id, speed));
        Ok(())
    }
}

impl ServoDriver for MockBoard {
    fn write_servo_pulse(&self, id: ItemId, pulse_us: Option<u32>) -> Result<()> {
        lock(&self.op_log).push((CapabilityKind::Servo, id));
        lock(&self.servo_writes).push((id, pulse_us));
        Ok(())
    }
}

impl AdcDriver for MockBoard {
    fn read_adc_raw(&self, id: ItemId) -> Result<f64> {
        lock(&self.op_log).push((CapabilityKind::Adc, id));
        *lock(&self.adc_reads).entry(id).or_insert(0) += 1;
        lock(&self.adc_raw)
            .get(&id)
            .copied()
            .ok_or_else(|| anyhow!("no scripted raw value for adc {id}"))
    }
}

impl LedDriver for MockBoard {
    fn write_led_rgb(&self, id: ItemId, r: f64, g: f64, b: f64) -> Result<()> {
        lock(&self.op_log).push((CapabilityKind::Led, id));
        lock(&self.led_writes).push((id, [r, g, b]));
        Ok(())
    }
}

/// A clock that only moves when told to, for staleness-window tests.
pub struct ManualClock {
    epoch: Instant,
    offset: Mutex<Duration>,
}

impl ManualClock {
    /// Create a clock frozen at the current instant.
    pub fn new() -> Self {
        Self {
            epoch: Instant::now(),
            offset: Mutex::new(Duration::ZERO),
        }
    }

    /// Advance the clock by the given duration.
    pub fn advance(&self, by: Duration) {
        *lock(&self.offset) += by;
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.epoch + *lock(&self.offset)
    }
}
