//! The board runtime: composition root over the capability groups.

use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;

use tracing::debug;

use crate::clock::{Clock, SystemClock};
use crate::config::{self, BoardConfig};
use crate::error::{BoardError, BoardResult};
use crate::group::CapabilityGroup;
use crate::hardware::{AdcDriver, LedDriver, MotorDriver, ServoDriver};
use crate::items::{
    AdcItem, CapabilityItem, CapabilityKind, ItemId, LedItem, MotorItem, ServoItem,
    DEFAULT_ADC_DIVISOR,
};

/// A board: the fixed set of capability groups a piece of hardware
/// supports, plus the configuration plumbing for all of them.
///
/// Construct one with [`BoardRuntime::builder`], declaring each capability
/// kind the board has together with the driver that backs it. The
/// capability set is fixed at construction; a board without LEDs simply
/// reports an empty [`leds`](Self::leds) sequence.
///
/// # Example
///
/// ```rust,ignore
/// let driver = Arc::new(MyBoardDriver::open()?);
/// let mut board = BoardRuntime::builder()
///     .motors([0, 1], driver.clone())
///     .servos([0, 1, 5, 6], driver.clone())
///     .adcs([0, 1, 2], driver.clone())
///     .build()?;
/// board.set_motor_speed(0, 0.5)?;
/// println!("{}", board.config_text()?);
/// board.stop()?;
/// ```
pub struct BoardRuntime {
    motors: Option<CapabilityGroup<MotorItem>>,
    servos: Option<CapabilityGroup<ServoItem>>,
    adcs: Option<CapabilityGroup<AdcItem>>,
    leds: Option<CapabilityGroup<LedItem>>,
}

impl BoardRuntime {
    /// Start declaring a board.
    pub fn builder() -> BoardBuilder {
        BoardBuilder::new()
    }

    /// Motor ids, in declaration order; empty if the board has no motors.
    pub fn motors(&self) -> Vec<ItemId> {
        self.motors.as_ref().map(CapabilityGroup::ids).unwrap_or_default()
    }

    /// Servo ids, in declaration order; empty if the board has no servos.
    pub fn servos(&self) -> Vec<ItemId> {
        self.servos.as_ref().map(CapabilityGroup::ids).unwrap_or_default()
    }

    /// ADC channel ids, in declaration order; empty if the board has none.
    pub fn adcs(&self) -> Vec<ItemId> {
        self.adcs.as_ref().map(CapabilityGroup::ids).unwrap_or_default()
    }

    /// LED ids, in declaration order; empty if the board has no LEDs.
    pub fn leds(&self) -> Vec<ItemId> {
        self.leds.as_ref().map(CapabilityGroup::ids).unwrap_or_default()
    }

    /// Borrow one motor.
    pub fn motor(&self, id: ItemId) -> BoardResult<&MotorItem> {
        lookup(&self.motors, CapabilityKind::Motor, id)
    }

    /// Mutably borrow one motor.
    pub fn motor_mut(&mut self, id: ItemId) -> BoardResult<&mut MotorItem> {
        lookup_mut(&mut self.motors, CapabilityKind::Motor, id)
    }

    /// Borrow one servo.
    pub fn servo(&self, id: ItemId) -> BoardResult<&ServoItem> {
        lookup(&self.servos, CapabilityKind::Servo, id)
    }

    /// Mutably borrow one servo.
    pub fn servo_mut(&mut self, id: ItemId) -> BoardResult<&mut ServoItem> {
        lookup_mut(&mut self.servos, CapabilityKind::Servo, id)
    }

    /// Borrow one ADC channel.
    pub fn adc(&self, id: ItemId) -> BoardResult<&AdcItem> {
        lookup(&self.adcs, CapabilityKind::Adc, id)
    }

    /// Mutably borrow one ADC channel.
    pub fn adc_mut(&mut self, id: ItemId) -> BoardResult<&mut AdcItem> {
        lookup_mut(&mut self.adcs, CapabilityKind::Adc, id)
    }

    /// Borrow one LED.
    pub fn led(&self, id: ItemId) -> BoardResult<&LedItem> {
        lookup(&self.leds, CapabilityKind::Led, id)
    }

    /// Mutably borrow one LED.
    pub fn led_mut(&mut self, id: ItemId) -> BoardResult<&mut LedItem> {
        lookup_mut(&mut self.leds, CapabilityKind::Led, id)
    }

    /// Set a motor speed; see [`MotorItem::set_speed`].
    pub fn set_motor_speed(&mut self, id: ItemId, speed: f64) -> BoardResult<()> {
        self.motor_mut(id)?.set_speed(speed)
    }

    /// Set a servo position; see [`ServoItem::set_position`].
    pub fn set_servo_position(&mut self, id: ItemId, position: f64) -> BoardResult<()> {
        self.servo_mut(id)?.set_position(Some(position))
    }

    /// Disable a servo output.
    pub fn disable_servo(&mut self, id: ItemId) -> BoardResult<()> {
        self.servo_mut(id)?.disable()
    }

    /// Read an ADC channel, scaled and rounded to two digits.
    pub fn read_adc(&mut self, id: ItemId) -> BoardResult<f64> {
        self.adc_mut(id)?.read()
    }

    /// Set an LED color from an HSV triple.
    pub fn set_led_hsv(&mut self, id: ItemId, h: f64, s: f64, v: f64) -> BoardResult<()> {
        self.led_mut(id)?.set_hsv(h, s, v)
    }

    /// Set an LED color from an RGB triple.
    pub fn set_led_rgb(&mut self, id: ItemId, r: f64, g: f64, b: f64) -> BoardResult<()> {
        self.led_mut(id)?.set_rgb(r, g, b)
    }

    /// Set an LED color from an extended web color name.
    pub fn set_led_name(&mut self, id: ItemId, name: &str) -> BoardResult<()> {
        self.led_mut(id)?.set_name(name)
    }

    /// Set an LED's brightness.
    pub fn set_led_brightness(&mut self, id: ItemId, brightness: f64) -> BoardResult<()> {
        self.led_mut(id)?.set_brightness(brightness)
    }

    /// Stop all activity on the board, best-effort.
    ///
    /// Groups are swept in a fixed order — motors, servos, ADCs, LEDs — so
    /// actuators are halted before indicators are touched. A failure in
    /// one item never prevents the rest from being commanded; all failures
    /// are collected into [`BoardError::Shutdown`].
    pub fn stop(&mut self) -> BoardResult<()> {
        debug!("stopping all board activity");
        let mut failures = Vec::new();
        if let Some(group) = &mut self.motors {
            collect_stop_failures(group.stop_all(), &mut failures);
        }
        if let Some(group) = &mut self.servos {
            collect_stop_failures(group.stop_all(), &mut failures);
        }
        if let Some(group) = &mut self.adcs {
            collect_stop_failures(group.stop_all(), &mut failures);
        }
        if let Some(group) = &mut self.leds {
            collect_stop_failures(group.stop_all(), &mut failures);
        }
        if failures.is_empty() {
            Ok(())
        } else {
            Err(BoardError::Shutdown(failures))
        }
    }

    /// Snapshot the whole board's configuration.
    pub fn config(&self) -> BoardConfig {
        BoardConfig {
            motor: self.motors.as_ref().map(CapabilityGroup::extract_config).unwrap_or_default(),
            servo: self.servos.as_ref().map(CapabilityGroup::extract_config).unwrap_or_default(),
            adc: self.adcs.as_ref().map(CapabilityGroup::extract_config).unwrap_or_default(),
            led: self.leds.as_ref().map(CapabilityGroup::extract_config).unwrap_or_default(),
        }
    }

    /// Merge a configuration into the board.
    ///
    /// Kinds the board does not support are skipped; unknown ids within a
    /// supported kind are warned about and skipped; fields absent from a
    /// record keep their current values.
    pub fn apply_config(&mut self, config: &BoardConfig) -> BoardResult<()> {
        if let Some(group) = &mut self.motors {
            group.apply_config(&config.motor)?;
        }
        if let Some(group) = &mut self.servos {
            group.apply_config(&config.servo)?;
        }
        if let Some(group) = &mut self.adcs {
            group.apply_config(&config.adc)?;
        }
        if let Some(group) = &mut self.leds {
            group.apply_config(&config.led)?;
        }
        Ok(())
    }

    /// The board configuration in its textual YAML form.
    pub fn config_text(&self) -> BoardResult<String> {
        config::to_text(&self.config())
    }

    /// Decode a textual configuration and merge it into the board.
    pub fn apply_config_text(&mut self, text: &str) -> BoardResult<()> {
        let parsed = config::from_text(text)?;
        self.apply_config(&parsed)
    }

    /// Write the board configuration to a file in its textual form.
    pub fn save_config<P: AsRef<Path>>(&self, path: P) -> BoardResult<()> {
        config::save_to_file(path, &self.config())
    }

    /// Load a configuration file and merge it into the board.
    pub fn load_config<P: AsRef<Path>>(&mut self, path: P) -> BoardResult<()> {
        let loaded = config::load_from_file(path)?;
        self.apply_config(&loaded)
    }
}

fn lookup<I: CapabilityItem>(
    group: &Option<CapabilityGroup<I>>,
    kind: CapabilityKind,
    id: ItemId,
) -> BoardResult<&I> {
    match group {
        Some(group) => group.item(id),
        None => Err(BoardError::NoSuchItem { kind, id }),
    }
}

fn lookup_mut<I: CapabilityItem>(
    group: &mut Option<CapabilityGroup<I>>,
    kind: CapabilityKind,
    id: ItemId,
) -> BoardResult<&mut I> {
    match group {
        Some(group) => group.item_mut(id),
        None => Err(BoardError::NoSuchItem { kind, id }),
    }
}

fn collect_stop_failures(result: BoardResult<()>, failures: &mut Vec<BoardError>) {
    match result {
        Ok(()) => {}
        Err(BoardError::Shutdown(group_failures)) => failures.extend(group_failures),
        Err(other) => failures.push(other),
    }
}

/// Declares which capabilities a board has and builds the runtime.
pub struct BoardBuilder {
    motors: Option<(Vec<ItemId>, Arc<dyn MotorDriver>)>,
    servos: Option<(Vec<ItemId>, Arc<dyn ServoDriver>)>,
    adcs: Option<(Vec<ItemId>, Arc<dyn AdcDriver>)>,
    leds: Option<(Vec<ItemId>, Arc<dyn LedDriver>)>,
    clock: Arc<dyn Clock>,
    default_adc_divisor: f64,
}

impl BoardBuilder {
    fn new() -> Self {
        Self {
            motors: None,
            servos: None,
            adcs: None,
            leds: None,
            clock: Arc::new(SystemClock),
            default_adc_divisor: DEFAULT_ADC_DIVISOR,
        }
    }

    /// Declare the board's motor channels and the driver backing them.
    pub fn motors(
        mut self,
        ids: impl IntoIterator<Item = ItemId>,
        driver: Arc<dyn MotorDriver>,
    ) -> Self {
        self.motors = Some((ids.into_iter().collect(), driver));
        self
    }

    /// Declare the board's servo channels and the driver backing them.
    pub fn servos(
        mut self,
        ids: impl IntoIterator<Item = ItemId>,
        driver: Arc<dyn ServoDriver>,
    ) -> Self {
        self.servos = Some((ids.into_iter().collect(), driver));
        self
    }

    /// Declare the board's ADC channels and the driver backing them.
    pub fn adcs(
        mut self,
        ids: impl IntoIterator<Item = ItemId>,
        driver: Arc<dyn AdcDriver>,
    ) -> Self {
        self.adcs = Some((ids.into_iter().collect(), driver));
        self
    }

    /// Declare the board's LEDs and the driver backing them.
    pub fn leds(
        mut self,
        ids: impl IntoIterator<Item = ItemId>,
        driver: Arc<dyn LedDriver>,
    ) -> Self {
        self.leds = Some((ids.into_iter().collect(), driver));
        self
    }

    /// Replace the time source used by the ADC staleness cache.
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Initial divisor for every declared ADC channel.
    pub fn default_adc_divisor(mut self, divisor: f64) -> Self {
        self.default_adc_divisor = divisor;
        self
    }

    /// Build the runtime.
    ///
    /// Fails when an id is declared twice within one kind, or when the
    /// default ADC divisor is not strictly positive.
    pub fn build(self) -> BoardResult<BoardRuntime> {
        if self.default_adc_divisor <= 0.0 {
            return Err(BoardError::InvalidValue {
                field: "default_adc_divisor",
                constraint: "greater than zero",
                value: self.default_adc_divisor,
            });
        }
        let divisor = self.default_adc_divisor;
        let clock = self.clock;
        let motors = match self.motors {
            Some((ids, driver)) => Some(CapabilityGroup::new(
                CapabilityKind::Motor,
                build_items(CapabilityKind::Motor, &ids, |id| {
                    MotorItem::new(id, driver.clone())
                })?,
            )),
            None => None,
        };
        let servos = match self.servos {
            Some((ids, driver)) => Some(CapabilityGroup::new(
                CapabilityKind::Servo,
                build_items(CapabilityKind::Servo, &ids, |id| {
                    ServoItem::new(id, driver.clone())
                })?,
            )),
            None => None,
        };
        let adcs = match self.adcs {
            Some((ids, driver)) => Some(CapabilityGroup::new(
                CapabilityKind::Adc,
                build_items(CapabilityKind::Adc, &ids, |id| {
                    AdcItem::new(id, divisor, driver.clone(), clock.clone())
                })?,
            )),
            None => None,
        };
        let leds = match self.leds {
            Some((ids, driver)) => Some(CapabilityGroup::new(
                CapabilityKind::Led,
                build_items(CapabilityKind::Led, &ids, |id| {
                    LedItem::new(id, driver.clone())
                })?,
            )),
            None => None,
        };
        Ok(BoardRuntime {
            motors,
            servos,
            adcs,
            leds,
        })
    }
}

fn build_items<I>(
    kind: CapabilityKind,
    ids: &[ItemId],
    make: impl Fn(ItemId) -> I,
) -> BoardResult<Vec<I>> {
    let mut seen = HashSet::new();
    let mut items = Vec::with_capacity(ids.len());
    for &id in ids {
        if !seen.insert(id) {
            return Err(BoardError::DuplicateItem { kind, id });
        }
        items.push(make(id));
    }
    Ok(items)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hardware::mock::MockBoard;

    fn full_board(board: &Arc<MockBoard>) -> BoardRuntime {
        BoardRuntime::builder()
            .motors([0, 1], board.clone())
            .servos([0, 1, 5, 6], board.clone())
            .adcs([0, 1, 2], board.clone())
            .leds([0, 1], board.clone())
            .build()
            .unwrap()
    }

    #[test]
    fn discovery_reports_declared_ids() {
        let board = Arc::new(MockBoard::new());
        let runtime = full_board(&board);
        assert_eq!(runtime.motors(), vec![0, 1]);
        assert_eq!(runtime.servos(), vec![0, 1, 5, 6]);
        assert_eq!(runtime.adcs(), vec![0, 1, 2]);
        assert_eq!(runtime.leds(), vec![0, 1]);
    }

    #[test]
    fn absent_capability_reports_empty_ids() {
        let board = Arc::new(MockBoard::new());
        let runtime = BoardRuntime::builder()
            .motors([0, 1], board.clone())
            .build()
            .unwrap();
        assert!(runtime.leds().is_empty());
        assert!(runtime.servos().is_empty());
        assert!(runtime.adcs().is_empty());
    }

    #[test]
    fn routing_to_an_absent_capability_fails() {
        let board = Arc::new(MockBoard::new());
        let mut runtime = BoardRuntime::builder()
            .motors([0], board.clone())
            .build()
            .unwrap();
        assert!(matches!(
            runtime.set_led_name(0, "red"),
            Err(BoardError::NoSuchItem { kind: CapabilityKind::Led, id: 0 })
        ));
        assert!(matches!(
            runtime.set_motor_speed(7, 1.0),
            Err(BoardError::NoSuchItem { kind: CapabilityKind::Motor, id: 7 })
        ));
    }

    #[test]
    fn duplicate_ids_are_rejected_at_build() {
        let board = Arc::new(MockBoard::new());
        let result = BoardRuntime::builder().motors([0, 0], board.clone()).build();
        assert!(matches!(
            result,
            Err(BoardError::DuplicateItem { kind: CapabilityKind::Motor, id: 0 })
        ));
    }

    #[test]
    fn stop_halts_actuators_before_indicators() {
        let board = Arc::new(MockBoard::new());
        let mut runtime = full_board(&board);
        runtime.set_motor_speed(0, 1.0).unwrap();
        runtime.set_servo_position(5, 0.5).unwrap();
        runtime.set_led_name(1, "red").unwrap();
        let log_before = board.op_log().len();
        runtime.stop().unwrap();
        let log: Vec<_> = board.op_log()[log_before..].to_vec();
        let kinds: Vec<_> = log.iter().map(|(kind, _)| *kind).collect();
        // Every motor first, then every servo, then the LEDs; ADC stop is
        // a no-op and produces no driver traffic.
        let first_led = kinds.iter().position(|k| *k == CapabilityKind::Led).unwrap();
        let last_motor = kinds.iter().rposition(|k| *k == CapabilityKind::Motor).unwrap();
        let last_servo = kinds.iter().rposition(|k| *k == CapabilityKind::Servo).unwrap();
        assert!(last_motor < last_servo);
        assert!(last_servo < first_led);
        assert_eq!(board.last_servo_write(6), Some(None));
        assert_eq!(board.last_motor_write(1), Some(0.0));
    }

    #[test]
    fn stop_collects_failures_but_sweeps_everything() {
        let board = Arc::new(MockBoard::new());
        board.fail_motor(0);
        let mut runtime = full_board(&board);
        match runtime.stop() {
            Err(BoardError::Shutdown(failures)) => assert_eq!(failures.len(), 1),
            other => panic!("unexpected result: {other:?}"),
        }
        // Servos were still disabled despite the motor failure.
        assert_eq!(board.last_servo_write(0), Some(None));
    }

    #[test]
    fn config_round_trip_is_idempotent() {
        let board = Arc::new(MockBoard::new());
        let mut runtime = full_board(&board);
        runtime.set_motor_speed(0, 0.5).unwrap();
        runtime.motor_mut(1).unwrap().set_invert(true).unwrap();
        runtime.servo_mut(5).unwrap().set_pulse_range(800, 2200).unwrap();
        runtime.set_led_name(0, "teal").unwrap();
        let snapshot = runtime.config();
        runtime.apply_config(&snapshot).unwrap();
        assert_eq!(runtime.config(), snapshot);
    }

    #[test]
    fn config_for_superset_board_applies_cleanly() {
        let board = Arc::new(MockBoard::new());
        let mut runtime = BoardRuntime::builder()
            .motors([0], board.clone())
            .build()
            .unwrap();
        // Authored for a board with more motors, servos, and LEDs.
        let text = "motor:\n  0:\n    speed: 0.25\n  9:\n    speed: 1\nled:\n  0:\n    hue: 0.5\n";
        runtime.apply_config_text(text).unwrap();
        assert_eq!(runtime.motor(0).unwrap().speed(), 0.25);
    }

    #[test]
    fn default_divisor_applies_to_all_channels() {
        let board = Arc::new(MockBoard::new());
        let runtime = BoardRuntime::builder()
            .adcs([0, 1], board.clone())
            .default_adc_divisor(1000.0)
            .build()
            .unwrap();
        assert_eq!(runtime.adc(0).unwrap().divisor(), 1000.0);
        assert_eq!(runtime.adc(1).unwrap().divisor(), 1000.0);
    }

    #[test]
    fn non_positive_default_divisor_is_rejected() {
        let board = Arc::new(MockBoard::new());
        let result = BoardRuntime::builder()
            .adcs([0], board.clone())
            .default_adc_divisor(0.0)
            .build();
        assert!(matches!(result, Err(BoardError::InvalidValue { .. })));
    }
}
