//! RGB indicator control.

use std::sync::Arc;

use tracing::debug;

use crate::color;
use crate::config::LedConfig;
use crate::error::{BoardError, BoardResult};
use crate::hardware::LedDriver;
use crate::items::{check_positive, CapabilityItem, ItemId};

/// One RGB indicator.
///
/// Color is always held canonically as HSV plus the brightness, gamma, and
/// saturation-gain correction settings; the raw RGB triple sent to the
/// driver is derived from that state on every write and never stored.
/// Setting the color via RGB or a color name normalizes into the canonical
/// form first, so reading back always yields an HSV triple.
pub struct LedItem {
    id: ItemId,
    hue: f64,
    saturation: f64,
    value: f64,
    brightness: f64,
    gamma: f64,
    saturation_gain: f64,
    driver: Arc<dyn LedDriver>,
}

impl LedItem {
    pub(crate) fn new(id: ItemId, driver: Arc<dyn LedDriver>) -> Self {
        Self {
            id,
            hue: 0.0,
            saturation: 0.0,
            value: 0.0,
            brightness: 1.0,
            gamma: 1.0,
            saturation_gain: 1.0,
            driver,
        }
    }

    /// Set the color from an HSV triple.
    ///
    /// Hue is circular and taken mod 1; saturation and value are silently
    /// clamped to [0, 1].
    pub fn set_hsv(&mut self, h: f64, s: f64, v: f64) -> BoardResult<()> {
        self.hue = h.rem_euclid(1.0);
        self.saturation = check_positive(s);
        self.value = check_positive(v);
        debug!(
            led = self.id,
            hue = self.hue,
            saturation = self.saturation,
            value = self.value,
            "set led color"
        );
        self.push()
    }

    /// Set the color from an RGB triple, channels clamped to [0, 1].
    pub fn set_rgb(&mut self, r: f64, g: f64, b: f64) -> BoardResult<()> {
        let (h, s, v) = color::rgb_to_hsv(
            check_positive(r),
            check_positive(g),
            check_positive(b),
        );
        self.hue = h;
        self.saturation = s;
        self.value = v;
        self.push()
    }

    /// Set the color from an extended web color name.
    ///
    /// Fails with [`BoardError::UnknownColorName`] on a lookup miss,
    /// leaving the stored color untouched.
    pub fn set_name(&mut self, name: &str) -> BoardResult<()> {
        let (r, g, b) = color::resolve_name(name)?;
        self.set_rgb(r, g, b)
    }

    /// Set the brightness, clamped to [0, 1], and write through.
    pub fn set_brightness(&mut self, brightness: f64) -> BoardResult<()> {
        self.brightness = check_positive(brightness);
        self.push()
    }

    /// Set the gamma correction exponent and write through.
    ///
    /// Fails with [`BoardError::InvalidValue`] when gamma is not strictly
    /// positive; 1.0 disables correction.
    pub fn set_gamma(&mut self, gamma: f64) -> BoardResult<()> {
        if gamma <= 0.0 {
            return Err(BoardError::InvalidValue {
                field: "gamma",
                constraint: "greater than zero",
                value: gamma,
            });
        }
        self.gamma = gamma;
        self.push()
    }

    /// Set the saturation compensation factor, clamped to be non-negative,
    /// and write through. 1.0 means no compensation.
    pub fn set_saturation_gain(&mut self, gain: f64) -> BoardResult<()> {
        self.saturation_gain = if gain < 0.0 {
            tracing::warn!(gain, "saturation gain below 0.0, clamping to 0.0");
            0.0
        } else {
            gain
        };
        self.push()
    }

    /// The canonical stored HSV triple, however the color was last set.
    pub fn hsv(&self) -> (f64, f64, f64) {
        (self.hue, self.saturation, self.value)
    }

    /// The stored color as an uncorrected RGB triple.
    pub fn rgb(&self) -> (f64, f64, f64) {
        color::hsv_to_rgb(self.hue, self.saturation, self.value)
    }

    /// The configured brightness.
    pub fn brightness(&self) -> f64 {
        self.brightness
    }

    /// The configured gamma exponent.
    pub fn gamma(&self) -> f64 {
        self.gamma
    }

    /// The configured saturation compensation factor.
    pub fn saturation_gain(&self) -> f64 {
        self.saturation_gain
    }

    fn push(&self) -> BoardResult<()> {
        let (r, g, b) = color::apply_corrections(
            self.hue,
            self.saturation,
            self.value,
            self.brightness,
            self.gamma,
            self.saturation_gain,
        );
        self.driver
            .write_led_rgb(self.id, r, g, b)
            .map_err(BoardError::Driver)
    }
}

impl CapabilityItem for LedItem {
    type Config = LedConfig;

    fn id(&self) -> ItemId {
        self.id
    }

    /// Go dark, keeping hue and saturation for the next enable.
    fn stop(&mut self) -> BoardResult<()> {
        self.value = 0.0;
        self.push()
    }

    fn extract_config(&self) -> LedConfig {
        LedConfig {
            hue: Some(self.hue),
            saturation: Some(self.saturation),
            value: Some(self.value),
            brightness: Some(self.brightness),
            gamma: Some(self.gamma),
            saturation_gain: Some(self.saturation_gain),
        }
    }

    fn apply_config(&mut self, config: &LedConfig) -> BoardResult<()> {
        if let Some(gamma) = config.gamma {
            if gamma <= 0.0 {
                return Err(BoardError::InvalidValue {
                    field: "gamma",
                    constraint: "greater than zero",
                    value: gamma,
                });
            }
        }
        let any = config.hue.is_some()
            || config.saturation.is_some()
            || config.value.is_some()
            || config.brightness.is_some()
            || config.gamma.is_some()
            || config.saturation_gain.is_some();
        if let Some(hue) = config.hue {
            self.hue = hue.rem_euclid(1.0);
        }
        if let Some(saturation) = config.saturation {
            self.saturation = check_positive(saturation);
        }
        if let Some(value) = config.value {
            self.value = check_positive(value);
        }
        if let Some(brightness) = config.brightness {
            self.brightness = check_positive(brightness);
        }
        if let Some(gamma) = config.gamma {
            self.gamma = gamma;
        }
        if let Some(gain) = config.saturation_gain {
            self.saturation_gain = gain.max(0.0);
        }
        if any {
            self.push()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hardware::mock::MockBoard;

    const TOLERANCE: f64 = 1e-9;

    fn led(board: &Arc<MockBoard>) -> LedItem {
        LedItem::new(0, board.clone())
    }

    #[test]
    fn hue_wraps_mod_one() {
        let board = Arc::new(MockBoard::new());
        let mut l = led(&board);
        l.set_hsv(1.5, 1.0, 1.0).unwrap();
        let via_wrapped = board.last_led_write(0).unwrap();
        let (h, _, _) = l.hsv();
        assert!((h - 0.5).abs() < TOLERANCE);
        l.set_hsv(0.5, 1.0, 1.0).unwrap();
        assert_eq!(board.last_led_write(0).unwrap(), via_wrapped);
    }

    #[test]
    fn rgb_input_normalizes_to_hsv() {
        let board = Arc::new(MockBoard::new());
        let mut l = led(&board);
        l.set_rgb(0.0, 0.0, 1.0).unwrap();
        let (h, s, v) = l.hsv();
        assert!((h - 2.0 / 3.0).abs() < TOLERANCE);
        assert_eq!((s, v), (1.0, 1.0));
        assert_eq!(board.last_led_write(0), Some([0.0, 0.0, 1.0]));
    }

    #[test]
    fn named_color_round_trips_through_rgb() {
        let board = Arc::new(MockBoard::new());
        let mut l = led(&board);
        l.set_name("pink").unwrap();
        let (r, g, b) = l.rgb();
        assert!((r - 1.0).abs() < TOLERANCE);
        assert!((g - 192.0 / 255.0).abs() < TOLERANCE);
        assert!((b - 203.0 / 255.0).abs() < TOLERANCE);
    }

    #[test]
    fn unknown_name_leaves_state_untouched() {
        let board = Arc::new(MockBoard::new());
        let mut l = led(&board);
        l.set_hsv(0.25, 0.5, 0.75).unwrap();
        let before = l.hsv();
        let writes_before = board.last_led_write(0);
        assert!(matches!(
            l.set_name("not-a-color"),
            Err(BoardError::UnknownColorName(_))
        ));
        assert_eq!(l.hsv(), before);
        assert_eq!(board.last_led_write(0), writes_before);
    }

    #[test]
    fn brightness_dims_the_output_not_the_state() {
        let board = Arc::new(MockBoard::new());
        let mut l = led(&board);
        l.set_hsv(0.0, 0.0, 1.0).unwrap();
        l.set_brightness(0.5).unwrap();
        assert_eq!(l.hsv(), (0.0, 0.0, 1.0));
        assert_eq!(board.last_led_write(0), Some([0.5, 0.5, 0.5]));
    }

    #[test]
    fn gamma_must_be_positive() {
        let board = Arc::new(MockBoard::new());
        let mut l = led(&board);
        assert!(matches!(
            l.set_gamma(0.0),
            Err(BoardError::InvalidValue { field: "gamma", .. })
        ));
        assert_eq!(l.gamma(), 1.0);
    }

    #[test]
    fn stop_goes_dark_but_remembers_the_color() {
        let board = Arc::new(MockBoard::new());
        let mut l = led(&board);
        l.set_hsv(0.3, 0.8, 0.9).unwrap();
        l.stop().unwrap();
        assert_eq!(board.last_led_write(0), Some([0.0, 0.0, 0.0]));
        let (h, s, v) = l.hsv();
        assert!((h - 0.3).abs() < TOLERANCE);
        assert!((s - 0.8).abs() < TOLERANCE);
        assert_eq!(v, 0.0);
        // Re-enabling restores the remembered hue and saturation.
        l.set_hsv(h, s, 0.9).unwrap();
        let [r, g, b] = board.last_led_write(0).unwrap();
        let expected = crate::color::hsv_to_rgb(0.3, 0.8, 0.9);
        assert!((r - expected.0).abs() < TOLERANCE);
        assert!((g - expected.1).abs() < TOLERANCE);
        assert!((b - expected.2).abs() < TOLERANCE);
    }

    #[test]
    fn invalid_gamma_in_config_rejects_whole_record() {
        let board = Arc::new(MockBoard::new());
        let mut l = led(&board);
        l.set_hsv(0.1, 0.2, 0.3).unwrap();
        let before = l.hsv();
        let result = l.apply_config(&LedConfig {
            hue: Some(0.9),
            gamma: Some(-1.0),
            ..LedConfig::default()
        });
        assert!(matches!(result, Err(BoardError::InvalidValue { .. })));
        assert_eq!(l.hsv(), before);
    }
}
