//! Meter readings: assembly from recognized digits, plausibility checks
//! and the persisted last-reading record.

pub mod assemble;
pub mod store;
pub mod validate;

use chrono::{Local, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};

pub use assemble::assemble_reading;
pub use store::ReadingStore;
pub use validate::validate;

/// Timestamp format of readings, e.g. `24/12/2023 18:05:00`.
pub const TIME_FORMAT: &str = "%d/%m/%Y %H:%M:%S";

/// An accepted meter value and when it was taken.
///
/// Serializes as `{ "current": <number>, "time": "<DD/MM/YYYY HH:MM:SS>" }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeterReading {
    #[serde(rename = "current")]
    pub value: f64,
    #[serde(with = "reading_time")]
    pub time: NaiveDateTime,
}

impl MeterReading {
    pub fn new(value: f64, time: NaiveDateTime) -> Self {
        Self { value, time }
    }

    /// A reading stamped with the current local time, to the second.
    pub fn taken_now(value: f64) -> Self {
        let now = Local::now().naive_local();
        Self::new(value, now.with_nanosecond(0).unwrap_or(now))
    }

    pub fn formatted_time(&self) -> String {
        self.time.format(TIME_FORMAT).to_string()
    }
}

mod reading_time {
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer};

    use super::TIME_FORMAT;

    pub fn serialize<S: Serializer>(time: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&time.format(TIME_FORMAT).to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDateTime, D::Error> {
        let s = String::deserialize(deserializer)?;
        NaiveDateTime::parse_from_str(&s, TIME_FORMAT).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(day: u32, hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, day)
            .unwrap()
            .and_hms_opt(hour, 5, 9)
            .unwrap()
    }

    #[test]
    fn test_json_shape() {
        let reading = MeterReading::new(12345.67, at(7, 18));
        let json = serde_json::to_value(&reading).unwrap();
        assert_eq!(json["current"], 12345.67);
        assert_eq!(json["time"], "07/03/2024 18:05:09");
    }

    #[test]
    fn test_parse_record() {
        let reading: MeterReading =
            serde_json::from_str(r#"{ "current": 123.45, "time": "01/03/2024 06:05:09" }"#).unwrap();
        assert_eq!(reading, MeterReading::new(123.45, at(1, 6)));
    }

    #[test]
    fn test_bad_time_is_rejected() {
        let result: Result<MeterReading, _> =
            serde_json::from_str(r#"{ "current": 1.0, "time": "2024-03-01T06:05:09" }"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_taken_now_has_whole_seconds() {
        let reading = MeterReading::taken_now(1.0);
        assert_eq!(reading.time.nanosecond(), 0);
    }
}
