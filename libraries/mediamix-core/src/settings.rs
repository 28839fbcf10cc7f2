//! Validated media settings
//!
//! A [`Settings`] value is the (volume, pan, speed) triple shared by every
//! media element of a document. Construction never fails: input that does
//! not parse as a number falls back to the field's default and numbers
//! outside a bound are clamped to that bound.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Lowest accepted volume (volume has no upper bound)
pub const VOLUME_MIN: f64 = 0.0;

/// Full left
pub const PAN_MIN: f64 = -1.0;

/// Full right
pub const PAN_MAX: f64 = 1.0;

/// Lowest accepted playback speed
pub const SPEED_MIN: f64 = 0.0;

/// Highest accepted playback speed
pub const SPEED_MAX: f64 = 16.0;

/// Unity gain
pub const DEFAULT_VOLUME: f64 = 1.0;

/// Centered
pub const DEFAULT_PAN: f64 = 0.0;

/// Normal speed
pub const DEFAULT_SPEED: f64 = 1.0;

/// Parse an untrusted JSON value as a finite number
///
/// JSON numbers and strings holding a decimal float are numeric.
/// Everything else (null, booleans, arrays, objects, `NaN`, infinities)
/// is not.
///
/// Strings that overflow to infinity (`"1e400"`) are not numeric either, so
/// they take the default instead of clamping to the upper bound.
pub fn parse_number(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse::<f64>().ok(),
        _ => None,
    }?;

    number.is_finite().then_some(number)
}

fn normalize(value: f64, default: f64, min: f64, max: f64) -> f64 {
    if value.is_finite() {
        value.clamp(min, max)
    } else {
        default
    }
}

/// Immutable, validated (volume, pan, speed) triple
///
/// Invariants: `volume >= 0`, `pan` in `[-1, 1]`, `speed` in `[0, 16]`.
/// Equality is field-wise numeric equality.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawSettings")]
pub struct Settings {
    volume: f64,
    pan: f64,
    speed: f64,
}

/// Wire shape accepted when deserializing settings from an untrusted peer
#[derive(Deserialize)]
struct RawSettings {
    #[serde(default)]
    volume: Value,
    #[serde(default)]
    pan: Value,
    #[serde(default)]
    speed: Value,
}

impl From<RawSettings> for Settings {
    fn from(raw: RawSettings) -> Self {
        Self::create(&raw.volume, &raw.pan, &raw.speed)
    }
}

impl Settings {
    /// Build settings from numbers, clamping each field into its bounds
    ///
    /// Non-finite inputs take the field's default.
    pub fn new(volume: f64, pan: f64, speed: f64) -> Self {
        Self {
            volume: normalize(volume, DEFAULT_VOLUME, VOLUME_MIN, f64::INFINITY),
            pan: normalize(pan, DEFAULT_PAN, PAN_MIN, PAN_MAX),
            speed: normalize(speed, DEFAULT_SPEED, SPEED_MIN, SPEED_MAX),
        }
    }

    /// Build settings from untrusted JSON values (parse-or-default, then clamp)
    pub fn create(volume: &Value, pan: &Value, speed: &Value) -> Self {
        Self::new(
            parse_number(volume).unwrap_or(DEFAULT_VOLUME),
            parse_number(pan).unwrap_or(DEFAULT_PAN),
            parse_number(speed).unwrap_or(DEFAULT_SPEED),
        )
    }

    /// Gain applied to every element (1.0 = unity)
    pub fn volume(&self) -> f64 {
        self.volume
    }

    /// Stereo position (-1.0 = left, 1.0 = right)
    pub fn pan(&self) -> f64 {
        self.pan
    }

    /// Native playback rate of every element
    pub fn speed(&self) -> f64 {
        self.speed
    }

    /// Return a new value with the patched fields replaced
    ///
    /// Unspecified (or non-finite) patch fields keep the current value.
    /// `self` is never modified.
    pub fn with_patch(&self, patch: &SettingsPatch) -> Self {
        let keep = |candidate: Option<f64>, current: f64| {
            candidate.filter(|value| value.is_finite()).unwrap_or(current)
        };

        Self::new(
            keep(patch.volume, self.volume),
            keep(patch.pan, self.pan),
            keep(patch.speed, self.speed),
        )
    }

    pub fn with_volume(&self, volume: f64) -> Self {
        self.with_patch(&SettingsPatch::volume(volume))
    }

    pub fn with_pan(&self, pan: f64) -> Self {
        self.with_patch(&SettingsPatch::pan(pan))
    }

    pub fn with_speed(&self, speed: f64) -> Self {
        self.with_patch(&SettingsPatch::speed(speed))
    }

    /// Check whether every field holds its default
    pub fn is_default(&self) -> bool {
        *self == Self::default()
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            volume: DEFAULT_VOLUME,
            pan: DEFAULT_PAN,
            speed: DEFAULT_SPEED,
        }
    }
}

/// Partial update of a [`Settings`] value
///
/// `None` means "keep the prior value".
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SettingsPatch {
    pub volume: Option<f64>,
    pub pan: Option<f64>,
    pub speed: Option<f64>,
}

impl SettingsPatch {
    pub fn volume(volume: f64) -> Self {
        Self {
            volume: Some(volume),
            ..Self::default()
        }
    }

    pub fn pan(pan: f64) -> Self {
        Self {
            pan: Some(pan),
            ..Self::default()
        }
    }

    pub fn speed(speed: f64) -> Self {
        Self {
            speed: Some(speed),
            ..Self::default()
        }
    }

    /// Patch that restores every field to its default
    pub fn reset() -> Self {
        Self {
            volume: Some(DEFAULT_VOLUME),
            pan: Some(DEFAULT_PAN),
            speed: Some(DEFAULT_SPEED),
        }
    }

    /// Build a patch from untrusted JSON values
    ///
    /// A value that does not parse as a number leaves its field unspecified.
    pub fn from_raw(volume: &Value, pan: &Value, speed: &Value) -> Self {
        Self {
            volume: parse_number(volume),
            pan: parse_number(pan),
            speed: parse_number(speed),
        }
    }

    /// True when no field is specified
    pub fn is_empty(&self) -> bool {
        self.volume.is_none() && self.pan.is_none() && self.speed.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.volume(), 1.0);
        assert_eq!(settings.pan(), 0.0);
        assert_eq!(settings.speed(), 1.0);
        assert!(settings.is_default());
    }

    #[test]
    fn clamps_out_of_range_values() {
        let settings = Settings::new(-0.5, 3.0, 20.0);
        assert_eq!(settings.volume(), 0.0);
        assert_eq!(settings.pan(), 1.0);
        assert_eq!(settings.speed(), 16.0);

        let settings = Settings::new(4.0, -7.0, -1.0);
        assert_eq!(settings.volume(), 4.0); // No upper bound on volume
        assert_eq!(settings.pan(), -1.0);
        assert_eq!(settings.speed(), 0.0);
    }

    #[test]
    fn non_finite_values_take_defaults() {
        let settings = Settings::new(f64::NAN, f64::INFINITY, f64::NEG_INFINITY);
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn create_parses_numbers_and_numeric_strings() {
        let settings = Settings::create(&json!(0.25), &json!("-0.5"), &json!(" 2 "));
        assert_eq!(settings.volume(), 0.25);
        assert_eq!(settings.pan(), -0.5);
        assert_eq!(settings.speed(), 2.0);
    }

    #[test]
    fn create_falls_back_to_defaults() {
        let settings = Settings::create(&json!("abc"), &json!(null), &json!({"speed": 2}));
        assert_eq!(settings, Settings::default());

        let settings = Settings::create(&json!(true), &json!([1]), &json!("NaN"));
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn parse_number_rejects_non_finite_strings() {
        assert_eq!(parse_number(&json!("inf")), None);
        assert_eq!(parse_number(&json!("-infinity")), None);
        assert_eq!(parse_number(&json!("NaN")), None);
        assert_eq!(parse_number(&json!("1e400")), None);
        assert_eq!(parse_number(&json!("1e2")), Some(100.0));
        assert_eq!(parse_number(&json!(3)), Some(3.0));
    }

    #[test]
    fn overflowing_string_takes_the_default() {
        let settings = Settings::create(&json!(0.5), &json!(0), &json!("1e400"));
        assert_eq!(settings.speed(), 1.0);
    }

    #[test]
    fn with_patch_replaces_only_given_fields() {
        let base = Settings::new(0.5, -0.25, 2.0);
        let updated = base.with_volume(0.75);

        assert_eq!(updated.volume(), 0.75);
        assert_eq!(updated.pan(), -0.25);
        assert_eq!(updated.speed(), 2.0);

        // Base untouched
        assert_eq!(base.volume(), 0.5);
    }

    #[test]
    fn with_patch_clamps() {
        let updated = Settings::default().with_speed(20.0);
        assert_eq!(updated.speed(), 16.0);
    }

    #[test]
    fn patch_from_unparseable_raw_keeps_prior_value() {
        let base = Settings::default().with_pan(0.3);
        let patch = SettingsPatch::from_raw(&Value::Null, &json!("abc"), &Value::Null);

        assert!(patch.is_empty());
        assert_eq!(base.with_patch(&patch), base);
    }

    #[test]
    fn reset_patch_restores_defaults() {
        let base = Settings::new(3.0, 1.0, 0.5);
        assert!(base.with_patch(&SettingsPatch::reset()).is_default());
    }

    #[test]
    fn serializes_as_plain_object() {
        let value = serde_json::to_value(Settings::new(0.5, 0.0, 1.0)).unwrap();
        assert_eq!(value, json!({"volume": 0.5, "pan": 0.0, "speed": 1.0}));
    }

    #[test]
    fn deserialization_normalizes() {
        let settings: Settings =
            serde_json::from_value(json!({"volume": -1, "pan": "x", "speed": 99})).unwrap();
        assert_eq!(settings.volume(), 0.0);
        assert_eq!(settings.pan(), 0.0);
        assert_eq!(settings.speed(), 16.0);

        let settings: Settings = serde_json::from_value(json!({})).unwrap();
        assert!(settings.is_default());
    }
}
