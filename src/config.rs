//! Board configuration records and the structured/textual codec.
//!
//! A [`BoardConfig`] is the flat, per-item configuration of a whole board:
//! one record per item, keyed by capability kind and item id. Every record
//! field is optional so that a partial configuration can be merged onto a
//! live board — unspecified fields keep their current values, and
//! extraction always emits fully-populated records.
//!
//! The codec converts between four forms:
//!
//! - the typed [`BoardConfig`],
//! - a structured mapping ([`serde_yaml::Value`]) with deterministic key
//!   ordering (kinds in declaration order, ids sorted),
//! - the textual YAML form, which is exactly the structured mapping
//!   serialized losslessly,
//! - a file holding the textual form.
//!
//! Decoding from the structured mapping is an explicit walk rather than a
//! serde derive, so a mismatch can be reported as
//! [`BoardError::MalformedConfig`] naming the offending kind/id/field.
//! Decoding is all-or-nothing: any failure yields no partial output.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::Serialize;
use serde_yaml::{Mapping, Value};

use crate::error::{BoardError, BoardResult};
use crate::items::ItemId;

/// Configuration record for one motor.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MotorConfig {
    /// Requested speed in [-1, 1].
    #[serde(skip_serializing_if = "Option::is_none")]
    pub speed: Option<f64>,
    /// Output inversion flag.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub invert: Option<bool>,
    /// Non-negative output scale.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scale: Option<f64>,
}

/// Configuration record for one servo.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ServoConfig {
    /// Position in [-1, 1], or `None` (YAML `null`) for a disabled output.
    /// Absent means "leave the position alone".
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<Option<f64>>,
    /// Minimum pulse width in microseconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pulse_min_us: Option<u32>,
    /// Maximum pulse width in microseconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pulse_max_us: Option<u32>,
}

/// Configuration record for one ADC channel.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AdcConfig {
    /// Strictly positive divisor applied to raw readings.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub divisor: Option<f64>,
    /// Staleness window in seconds; zero disables caching.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_seconds: Option<f64>,
}

/// Configuration record for one LED.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LedConfig {
    /// Circular hue, stored mod 1.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hue: Option<f64>,
    /// Saturation in [0, 1].
    #[serde(skip_serializing_if = "Option::is_none")]
    pub saturation: Option<f64>,
    /// Value in [0, 1].
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
    /// Brightness in [0, 1].
    #[serde(skip_serializing_if = "Option::is_none")]
    pub brightness: Option<f64>,
    /// Strictly positive gamma exponent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gamma: Option<f64>,
    /// Non-negative saturation compensation factor.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub saturation_gain: Option<f64>,
}

/// The full per-item configuration of a board.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BoardConfig {
    /// Motor records by item id.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub motor: BTreeMap<ItemId, MotorConfig>,
    /// Servo records by item id.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub servo: BTreeMap<ItemId, ServoConfig>,
    /// ADC records by item id.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub adc: BTreeMap<ItemId, AdcConfig>,
    /// LED records by item id.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub led: BTreeMap<ItemId, LedConfig>,
}

/// Serialize a configuration to the structured mapping form.
///
/// Ordering is deterministic: kinds in motor/servo/adc/led order, ids
/// sorted ascending. Absent kinds and unset fields are omitted.
pub fn to_structured(config: &BoardConfig) -> BoardResult<Value> {
    Ok(serde_yaml::to_value(config)?)
}

/// Decode a configuration from the structured mapping form.
///
/// Fails with [`BoardError::MalformedConfig`] naming the offending
/// kind/id/field on any structural or type mismatch; on failure nothing is
/// produced.
pub fn from_structured(value: &Value) -> BoardResult<BoardConfig> {
    let root = value
        .as_mapping()
        .ok_or_else(|| malformed("<document>", "expected a mapping of capability kinds"))?;
    let mut config = BoardConfig::default();
    for (key, entry) in root {
        let kind = key
            .as_str()
            .ok_or_else(|| malformed("<document>", "capability kind keys must be strings"))?;
        match kind {
            "motor" => config.motor = decode_items(kind, entry, decode_motor)?,
            "servo" => config.servo = decode_items(kind, entry, decode_servo)?,
            "adc" => config.adc = decode_items(kind, entry, decode_adc)?,
            "led" => config.led = decode_items(kind, entry, decode_led)?,
            other => return Err(malformed(other, "unknown capability kind")),
        }
    }
    Ok(config)
}

/// Serialize a configuration to its textual YAML form.
pub fn to_text(config: &BoardConfig) -> BoardResult<String> {
    Ok(serde_yaml::to_string(config)?)
}

/// Decode a configuration from its textual YAML form.
///
/// Defined as [`from_structured`] composed with YAML parsing; a syntax
/// error surfaces as [`BoardError::MalformedConfig`] at the document root.
pub fn from_text(text: &str) -> BoardResult<BoardConfig> {
    let value: Value = serde_yaml::from_str(text)?;
    from_structured(&value)
}

/// Write the textual form of a configuration to a file.
///
/// The file handle is released on every exit path, including encode
/// failure.
pub fn save_to_file<P: AsRef<Path>>(path: P, config: &BoardConfig) -> BoardResult<()> {
    let text = to_text(config)?;
    fs::write(path, text)?;
    Ok(())
}

/// Read and decode the textual form of a configuration from a file.
///
/// Surfaces the same taxonomy as [`from_text`], plus [`BoardError::Io`]
/// for a missing or unreadable file.
pub fn load_from_file<P: AsRef<Path>>(path: P) -> BoardResult<BoardConfig> {
    let text = fs::read_to_string(path)?;
    from_text(&text)
}

fn malformed(path: impl Into<String>, reason: impl Into<String>) -> BoardError {
    BoardError::MalformedConfig {
        path: path.into(),
        reason: reason.into(),
    }
}

fn describe(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Sequence(_) => "a sequence",
        Value::Mapping(_) => "a mapping",
        Value::Tagged(_) => "a tagged value",
    }
}

fn decode_items<C>(
    kind: &str,
    value: &Value,
    decode: fn(&str, ItemId, &Mapping) -> BoardResult<C>,
) -> BoardResult<BTreeMap<ItemId, C>> {
    let mapping = value
        .as_mapping()
        .ok_or_else(|| malformed(kind, format!("expected a mapping of item ids, found {}", describe(value))))?;
    let mut records = BTreeMap::new();
    for (key, fields) in mapping {
        let id = key
            .as_u64()
            .and_then(|id| ItemId::try_from(id).ok())
            .ok_or_else(|| malformed(kind, "item ids must be non-negative integers"))?;
        let fields = fields.as_mapping().ok_or_else(|| {
            malformed(
                format!("{kind}/{id}"),
                format!("expected a mapping of fields, found {}", describe(fields)),
            )
        })?;
        records.insert(id, decode(kind, id, fields)?);
    }
    Ok(records)
}

fn field_path(kind: &str, id: ItemId, field: &str) -> String {
    format!("{kind}/{id}/{field}")
}

fn expect_f64(kind: &str, id: ItemId, field: &str, value: &Value) -> BoardResult<f64> {
    value.as_f64().ok_or_else(|| {
        malformed(
            field_path(kind, id, field),
            format!("expected a number, found {}", describe(value)),
        )
    })
}

fn expect_bool(kind: &str, id: ItemId, field: &str, value: &Value) -> BoardResult<bool> {
    value.as_bool().ok_or_else(|| {
        malformed(
            field_path(kind, id, field),
            format!("expected a boolean, found {}", describe(value)),
        )
    })
}

fn expect_u32(kind: &str, id: ItemId, field: &str, value: &Value) -> BoardResult<u32> {
    value
        .as_u64()
        .and_then(|pulse| u32::try_from(pulse).ok())
        .ok_or_else(|| {
            malformed(
                field_path(kind, id, field),
                format!("expected a non-negative integer, found {}", describe(value)),
            )
        })
}

fn field_name<'a>(kind: &str, id: ItemId, key: &'a Value) -> BoardResult<&'a str> {
    key.as_str()
        .ok_or_else(|| malformed(format!("{kind}/{id}"), "field names must be strings"))
}

fn decode_motor(kind: &str, id: ItemId, fields: &Mapping) -> BoardResult<MotorConfig> {
    let mut record = MotorConfig::default();
    for (key, value) in fields {
        match field_name(kind, id, key)? {
            "speed" => record.speed = Some(expect_f64(kind, id, "speed", value)?),
            "invert" => record.invert = Some(expect_bool(kind, id, "invert", value)?),
            "scale" => record.scale = Some(expect_f64(kind, id, "scale", value)?),
            other => return Err(malformed(field_path(kind, id, other), "unknown field")),
        }
    }
    Ok(record)
}

fn decode_servo(kind: &str, id: ItemId, fields: &Mapping) -> BoardResult<ServoConfig> {
    let mut record = ServoConfig::default();
    for (key, value) in fields {
        match field_name(kind, id, key)? {
            "position" => {
                record.position = Some(if value.is_null() {
                    None
                } else {
                    Some(expect_f64(kind, id, "position", value)?)
                });
            }
            "pulse_min_us" => {
                record.pulse_min_us = Some(expect_u32(kind, id, "pulse_min_us", value)?);
            }
            "pulse_max_us" => {
                record.pulse_max_us = Some(expect_u32(kind, id, "pulse_max_us", value)?);
            }
            other => return Err(malformed(field_path(kind, id, other), "unknown field")),
        }
    }
    Ok(record)
}

fn decode_adc(kind: &str, id: ItemId, fields: &Mapping) -> BoardResult<AdcConfig> {
    let mut record = AdcConfig::default();
    for (key, value) in fields {
        match field_name(kind, id, key)? {
            "divisor" => record.divisor = Some(expect_f64(kind, id, "divisor", value)?),
            "cache_seconds" => {
                record.cache_seconds = Some(expect_f64(kind, id, "cache_seconds", value)?);
            }
            other => return Err(malformed(field_path(kind, id, other), "unknown field")),
        }
    }
    Ok(record)
}

fn decode_led(kind: &str, id: ItemId, fields: &Mapping) -> BoardResult<LedConfig> {
    let mut record = LedConfig::default();
    for (key, value) in fields {
        match field_name(kind, id, key)? {
            "hue" => record.hue = Some(expect_f64(kind, id, "hue", value)?),
            "saturation" => record.saturation = Some(expect_f64(kind, id, "saturation", value)?),
            "value" => record.value = Some(expect_f64(kind, id, "value", value)?),
            "brightness" => record.brightness = Some(expect_f64(kind, id, "brightness", value)?),
            "gamma" => record.gamma = Some(expect_f64(kind, id, "gamma", value)?),
            "saturation_gain" => {
                record.saturation_gain = Some(expect_f64(kind, id, "saturation_gain", value)?);
            }
            other => return Err(malformed(field_path(kind, id, other), "unknown field")),
        }
    }
    Ok(record)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_config() -> BoardConfig {
        let mut config = BoardConfig::default();
        config.motor.insert(
            0,
            MotorConfig {
                speed: Some(0.5),
                invert: Some(true),
                scale: Some(0.8),
            },
        );
        config.motor.insert(
            1,
            MotorConfig {
                speed: Some(-0.25),
                invert: Some(false),
                scale: Some(1.0),
            },
        );
        config.servo.insert(
            5,
            ServoConfig {
                position: Some(None),
                pulse_min_us: Some(1000),
                pulse_max_us: Some(2000),
            },
        );
        config.adc.insert(
            2,
            AdcConfig {
                divisor: Some(7891.0),
                cache_seconds: Some(10.0),
            },
        );
        config.led.insert(
            0,
            LedConfig {
                hue: Some(0.5),
                saturation: Some(1.0),
                value: Some(0.75),
                brightness: Some(0.5),
                gamma: Some(2.2),
                saturation_gain: Some(1.5),
            },
        );
        config
    }

    #[test]
    fn structured_round_trip_is_lossless() {
        let config = sample_config();
        let value = to_structured(&config).unwrap();
        assert_eq!(from_structured(&value).unwrap(), config);
    }

    #[test]
    fn text_round_trip_is_lossless() {
        let config = sample_config();
        let text = to_text(&config).unwrap();
        assert_eq!(from_text(&text).unwrap(), config);
    }

    #[test]
    fn text_form_is_deterministic() {
        let config = sample_config();
        assert_eq!(to_text(&config).unwrap(), to_text(&config.clone()).unwrap());
        // Kinds appear in declaration order, ids ascending.
        let text = to_text(&config).unwrap();
        let motor_at = text.find("motor:").unwrap();
        let servo_at = text.find("servo:").unwrap();
        let adc_at = text.find("adc:").unwrap();
        let led_at = text.find("led:").unwrap();
        assert!(motor_at < servo_at && servo_at < adc_at && adc_at < led_at);
    }

    #[test]
    fn partial_records_survive_the_round_trip() {
        let mut config = BoardConfig::default();
        config.motor.insert(
            3,
            MotorConfig {
                invert: Some(true),
                ..MotorConfig::default()
            },
        );
        let text = to_text(&config).unwrap();
        assert!(!text.contains("speed"));
        assert_eq!(from_text(&text).unwrap(), config);
    }

    #[test]
    fn hand_written_yaml_decodes() {
        let text = "motor:\n  0:\n    speed: 1\n    invert: false\nservo:\n  1:\n    position: null\n";
        let config = from_text(text).unwrap();
        assert_eq!(config.motor[&0].speed, Some(1.0));
        assert_eq!(config.motor[&0].invert, Some(false));
        assert_eq!(config.servo[&1].position, Some(None));
    }

    #[test]
    fn wrong_type_reports_precise_path() {
        let text = "servo:\n  3:\n    pulse_min_us: soon\n";
        match from_text(text) {
            Err(BoardError::MalformedConfig { path, reason }) => {
                assert_eq!(path, "servo/3/pulse_min_us");
                assert!(reason.contains("a string"), "{reason}");
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn unknown_field_is_rejected() {
        let text = "adc:\n  0:\n    dividor: 100\n";
        match from_text(text) {
            Err(BoardError::MalformedConfig { path, .. }) => {
                assert_eq!(path, "adc/0/dividor");
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn unknown_kind_is_rejected() {
        let text = "stepper:\n  0:\n    speed: 1\n";
        assert!(matches!(
            from_text(text),
            Err(BoardError::MalformedConfig { path, .. }) if path == "stepper"
        ));
    }

    #[test]
    fn yaml_syntax_error_is_malformed_config() {
        assert!(matches!(
            from_text("motor: [unclosed"),
            Err(BoardError::MalformedConfig { .. })
        ));
    }

    #[test]
    fn non_integer_item_id_is_rejected() {
        let text = "motor:\n  left:\n    speed: 1\n";
        assert!(matches!(
            from_text(text),
            Err(BoardError::MalformedConfig { path, .. }) if path == "motor"
        ));
    }

    #[test]
    fn empty_document_decodes_to_empty_config() {
        assert_eq!(from_text("{}\n").unwrap(), BoardConfig::default());
    }
}
