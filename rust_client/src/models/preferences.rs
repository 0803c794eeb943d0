//! Scheduling preferences sent with every generation request.

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

use crate::error::{ClientError, ClientResult};

/// Upper bound of every penalty weight.
pub const MAX_WEIGHT: u32 = 100;

/// `HH:MM` (de)serialization for clock times.
pub mod hhmm {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&time.format("%H:%M").to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveTime, D::Error> {
        use serde::de::Error;

        let text = String::deserialize(deserializer)?;
        super::parse_clock(&text).map_err(D::Error::custom)
    }
}

/// Parse `HH:MM` (seconds are accepted and kept).
pub fn parse_clock(text: &str) -> Result<NaiveTime, String> {
    let text = text.trim();
    NaiveTime::parse_from_str(text, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(text, "%H:%M:%S"))
        .map_err(|_| format!("invalid time '{}', expected HH:MM", text))
}

fn clock(hour: u32, minute: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(hour, minute, 0).unwrap_or(NaiveTime::MIN)
}

fn check_weight(weight: u32) -> ClientResult<u32> {
    if weight > MAX_WEIGHT {
        return Err(ClientError::Validation(format!(
            "weight {} is out of range 0..={}",
            weight, MAX_WEIGHT
        )));
    }
    Ok(weight)
}

/// A time window the user wants to keep free.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReservedSlot {
    pub key: String,
    #[serde(with = "hhmm")]
    pub from: NaiveTime,
    #[serde(with = "hhmm")]
    pub to: NaiveTime,
    /// How far the window may shift and still count
    #[serde(with = "hhmm")]
    pub wiggle: NaiveTime,
    pub weight: u32,
}

impl ReservedSlot {
    /// Create a slot with a fresh unique key.
    pub fn new(from: NaiveTime, to: NaiveTime, wiggle: NaiveTime, weight: u32) -> ClientResult<Self> {
        if from > to {
            return Err(ClientError::Validation(format!(
                "reserved slot starts at {} but ends at {}",
                from.format("%H:%M"),
                to.format("%H:%M")
            )));
        }
        Ok(Self {
            key: uuid::Uuid::new_v4().simple().to_string(),
            from,
            to,
            wiggle,
            weight: check_weight(weight)?,
        })
    }
}

/// Penalty weights and times.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Preferences {
    #[serde(with = "hhmm")]
    pub early_time: NaiveTime,
    pub early_weight: u32,
    #[serde(with = "hhmm")]
    pub late_time: NaiveTime,
    pub late_weight: u32,
    #[serde(with = "hhmm")]
    pub break_time: NaiveTime,
    pub break_weight: u32,
    #[serde(default)]
    pub reserved: Vec<ReservedSlot>,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            early_time: clock(10, 0),
            early_weight: 75,
            late_time: clock(15, 0),
            late_weight: 25,
            break_time: clock(0, 10),
            break_weight: 50,
            reserved: vec![
                ReservedSlot {
                    key: "#default0".to_string(),
                    from: clock(11, 30),
                    to: clock(12, 30),
                    wiggle: clock(1, 0),
                    weight: 50,
                },
                ReservedSlot {
                    key: "#default1".to_string(),
                    from: clock(17, 30),
                    to: clock(18, 30),
                    wiggle: clock(1, 0),
                    weight: 50,
                },
            ],
        }
    }
}

/// A single scalar preference change.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PreferenceEdit {
    EarlyTime(NaiveTime),
    EarlyWeight(u32),
    LateTime(NaiveTime),
    LateWeight(u32),
    BreakTime(NaiveTime),
    BreakWeight(u32),
}

impl PreferenceEdit {
    /// Build an edit from a field name and its textual value.
    ///
    /// # Arguments
    /// * `name` - Field name as it appears on the wire (`early_weight`, ...)
    /// * `value` - `HH:MM` for times, an integer in `0..=100` for weights
    pub fn parse(name: &str, value: &str) -> ClientResult<Self> {
        let time = || parse_clock(value).map_err(ClientError::Validation);
        let weight = || {
            value
                .trim()
                .parse::<u32>()
                .map_err(|_| ClientError::Validation(format!("invalid weight '{}'", value)))
                .and_then(check_weight)
        };

        match name {
            "early_time" => Ok(Self::EarlyTime(time()?)),
            "early_weight" => Ok(Self::EarlyWeight(weight()?)),
            "late_time" => Ok(Self::LateTime(time()?)),
            "late_weight" => Ok(Self::LateWeight(weight()?)),
            "break_time" => Ok(Self::BreakTime(time()?)),
            "break_weight" => Ok(Self::BreakWeight(weight()?)),
            other => Err(ClientError::Validation(format!(
                "unknown preference '{}'",
                other
            ))),
        }
    }
}

impl Preferences {
    pub fn apply(&mut self, edit: PreferenceEdit) {
        match edit {
            PreferenceEdit::EarlyTime(t) => self.early_time = t,
            PreferenceEdit::EarlyWeight(w) => self.early_weight = w.min(MAX_WEIGHT),
            PreferenceEdit::LateTime(t) => self.late_time = t,
            PreferenceEdit::LateWeight(w) => self.late_weight = w.min(MAX_WEIGHT),
            PreferenceEdit::BreakTime(t) => self.break_time = t,
            PreferenceEdit::BreakWeight(w) => self.break_weight = w.min(MAX_WEIGHT),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_default_wire_format() {
        let value = serde_json::to_value(Preferences::default()).unwrap();
        assert_eq!(value["early_time"], json!("10:00"));
        assert_eq!(value["break_time"], json!("00:10"));
        assert_eq!(value["reserved"][1]["key"], json!("#default1"));
        assert_eq!(value["reserved"][1]["from"], json!("17:30"));
        assert_eq!(value["reserved"][0]["wiggle"], json!("01:00"));
    }

    #[test]
    fn test_parse_edits() {
        assert_eq!(
            PreferenceEdit::parse("late_weight", "40").unwrap(),
            PreferenceEdit::LateWeight(40)
        );
        assert_eq!(
            PreferenceEdit::parse("early_time", "09:30").unwrap(),
            PreferenceEdit::EarlyTime(clock(9, 30))
        );
        assert!(PreferenceEdit::parse("early_weight", "101").is_err());
        assert!(PreferenceEdit::parse("lunch_weight", "1").is_err());
        assert!(PreferenceEdit::parse("late_time", "25:00").is_err());
    }

    #[test]
    fn test_reserved_slot_validation() {
        let slot = ReservedSlot::new(clock(9, 0), clock(10, 0), clock(0, 30), 60).unwrap();
        assert!(!slot.key.is_empty());
        let other = ReservedSlot::new(clock(9, 0), clock(10, 0), clock(0, 30), 60).unwrap();
        assert_ne!(slot.key, other.key);

        assert!(ReservedSlot::new(clock(11, 0), clock(10, 0), clock(0, 30), 60).is_err());
    }
}
