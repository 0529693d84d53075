//! Fulfil's tagged JSON values.
//!
//! Values JSON has no native type for travel as objects carrying a
//! `__class__` marker, e.g. `{"__class__": "date", "year": 2024, ...}`.
//! [`FulfilValue`] converts between those objects and typed Rust values:
//!
//! ```
//! use chrono::NaiveDate;
//! use fulfil_client::serialization::{FulfilValue, encode};
//!
//! let date = NaiveDate::from_ymd_opt(2024, 3, 9).unwrap();
//! let wire = encode(date);
//! assert_eq!(wire["__class__"], "date");
//! assert_eq!(FulfilValue::from_json(&wire).unwrap(), Some(FulfilValue::Date(date)));
//! ```
//!
//! `AsyncResult` markers are handled by [`crate::AsyncResult::from_value`].

use crate::error::FulfilError;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta, Timelike};
use rust_decimal::Decimal;
use serde_json::{Map, Value, json};

pub const CLASS_KEY: &str = "__class__";

const MICROS_PER_SECOND: f64 = 1_000_000.0;

/// Reference to a record as embedded in responses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelRef {
    pub model_name: String,
    pub id: i64,
    pub rec_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FulfilValue {
    Date(NaiveDate),
    DateTime(NaiveDateTime),
    Time(NaiveTime),
    TimeDelta(TimeDelta),
    Decimal(Decimal),
    Bytes(Vec<u8>),
    Model(ModelRef),
}

impl FulfilValue {
    /// The `__class__` marker for this value.
    pub fn class_name(&self) -> &'static str {
        match self {
            FulfilValue::Date(_) => "date",
            FulfilValue::DateTime(_) => "datetime",
            FulfilValue::Time(_) => "time",
            FulfilValue::TimeDelta(_) => "timedelta",
            FulfilValue::Decimal(_) => "Decimal",
            FulfilValue::Bytes(_) => "bytes",
            FulfilValue::Model(_) => "Model",
        }
    }

    pub fn to_json(&self) -> Value {
        let class = self.class_name();
        match self {
            FulfilValue::Date(date) => json!({
                CLASS_KEY: class,
                "year": date.year(),
                "month": date.month(),
                "day": date.day(),
                "iso_string": date.format("%Y-%m-%d").to_string(),
            }),
            FulfilValue::DateTime(datetime) => json!({
                CLASS_KEY: class,
                "year": datetime.year(),
                "month": datetime.month(),
                "day": datetime.day(),
                "hour": datetime.hour(),
                "minute": datetime.minute(),
                "second": datetime.second(),
                "microsecond": microsecond(datetime.time()),
                "iso_string": iso_datetime(datetime),
            }),
            FulfilValue::Time(time) => json!({
                CLASS_KEY: class,
                "hour": time.hour(),
                "minute": time.minute(),
                "second": time.second(),
                "microsecond": microsecond(*time),
            }),
            FulfilValue::TimeDelta(delta) => json!({
                CLASS_KEY: class,
                "seconds": delta.num_seconds() as f64
                    + f64::from(delta.subsec_nanos()) / 1_000_000_000.0,
            }),
            FulfilValue::Decimal(decimal) => json!({
                CLASS_KEY: class,
                "decimal": decimal.to_string(),
            }),
            FulfilValue::Bytes(bytes) => json!({
                CLASS_KEY: class,
                "base64": STANDARD.encode(bytes),
            }),
            FulfilValue::Model(record) => json!({
                CLASS_KEY: class,
                "model_name": record.model_name,
                "id": record.id,
                "rec_name": record.rec_name,
            }),
        }
    }

    /// Decode a tagged object.
    ///
    /// `Ok(None)` for anything that is not an object with a known
    /// `__class__`; an error when the marker is known but the fields are not.
    pub fn from_json(value: &Value) -> Result<Option<Self>, FulfilError> {
        let Some(object) = value.as_object() else {
            return Ok(None);
        };
        let Some(class) = object.get(CLASS_KEY).and_then(Value::as_str) else {
            return Ok(None);
        };

        let decoded = match class {
            "date" => FulfilValue::Date(date_from(object, class)?),
            "datetime" => FulfilValue::DateTime(NaiveDateTime::new(
                date_from(object, class)?,
                time_from(object, class)?,
            )),
            "time" => FulfilValue::Time(time_from(object, class)?),
            "timedelta" => {
                let seconds = object
                    .get("seconds")
                    .and_then(Value::as_f64)
                    .ok_or_else(|| malformed(class, "seconds"))?;
                let micros = (seconds * MICROS_PER_SECOND).round() as i64;
                FulfilValue::TimeDelta(TimeDelta::microseconds(micros))
            }
            "Decimal" => {
                let raw = match object.get("decimal") {
                    Some(Value::String(text)) => text.clone(),
                    Some(Value::Number(number)) => number.to_string(),
                    _ => return Err(malformed(class, "decimal")),
                };
                let decimal = raw
                    .parse::<Decimal>()
                    .map_err(|e| FulfilError::json(format!("Invalid Decimal '{raw}': {e}")))?;
                FulfilValue::Decimal(decimal)
            }
            "bytes" => {
                let encoded = object
                    .get("base64")
                    .and_then(Value::as_str)
                    .ok_or_else(|| malformed(class, "base64"))?;
                // Encoders may wrap the payload across lines.
                let compact: String = encoded.chars().filter(|c| !c.is_whitespace()).collect();
                let bytes = STANDARD
                    .decode(compact)
                    .map_err(|e| FulfilError::json(format!("Invalid bytes payload: {e}")))?;
                FulfilValue::Bytes(bytes)
            }
            "Model" => FulfilValue::Model(ModelRef {
                model_name: object
                    .get("model_name")
                    .and_then(Value::as_str)
                    .ok_or_else(|| malformed(class, "model_name"))?
                    .to_string(),
                id: int_field(object, class, "id")?,
                rec_name: object
                    .get("rec_name")
                    .and_then(Value::as_str)
                    .map(str::to_string),
            }),
            _ => return Ok(None),
        };
        Ok(Some(decoded))
    }
}

/// JSON form of a typed value, ready to go into a request body.
pub fn encode(value: impl Into<FulfilValue>) -> Value {
    value.into().to_json()
}

impl From<FulfilValue> for Value {
    fn from(value: FulfilValue) -> Self {
        value.to_json()
    }
}

impl From<NaiveDate> for FulfilValue {
    fn from(value: NaiveDate) -> Self {
        FulfilValue::Date(value)
    }
}

impl From<NaiveDateTime> for FulfilValue {
    fn from(value: NaiveDateTime) -> Self {
        FulfilValue::DateTime(value)
    }
}

impl From<NaiveTime> for FulfilValue {
    fn from(value: NaiveTime) -> Self {
        FulfilValue::Time(value)
    }
}

impl From<TimeDelta> for FulfilValue {
    fn from(value: TimeDelta) -> Self {
        FulfilValue::TimeDelta(value)
    }
}

impl From<Decimal> for FulfilValue {
    fn from(value: Decimal) -> Self {
        FulfilValue::Decimal(value)
    }
}

impl From<Vec<u8>> for FulfilValue {
    fn from(value: Vec<u8>) -> Self {
        FulfilValue::Bytes(value)
    }
}

impl From<ModelRef> for FulfilValue {
    fn from(value: ModelRef) -> Self {
        FulfilValue::Model(value)
    }
}

fn microsecond(time: NaiveTime) -> u32 {
    time.nanosecond() / 1_000
}

fn iso_datetime(datetime: &NaiveDateTime) -> String {
    if microsecond(datetime.time()) == 0 {
        datetime.format("%Y-%m-%dT%H:%M:%S").to_string()
    } else {
        datetime.format("%Y-%m-%dT%H:%M:%S%.6f").to_string()
    }
}

#[track_caller]
fn malformed(class: &str, field: &str) -> FulfilError {
    FulfilError::json(format!("'{class}' value is missing '{field}'"))
}

fn int_field(object: &Map<String, Value>, class: &str, field: &str) -> Result<i64, FulfilError> {
    object
        .get(field)
        .and_then(Value::as_i64)
        .ok_or_else(|| malformed(class, field))
}

fn small_field(object: &Map<String, Value>, class: &str, field: &str) -> Result<u32, FulfilError> {
    u32::try_from(int_field(object, class, field)?)
        .map_err(|_| FulfilError::json(format!("'{class}' field '{field}' is out of range")))
}

fn date_from(object: &Map<String, Value>, class: &str) -> Result<NaiveDate, FulfilError> {
    let year = i32::try_from(int_field(object, class, "year")?)
        .map_err(|_| FulfilError::json(format!("'{class}' year is out of range")))?;
    let month = small_field(object, class, "month")?;
    let day = small_field(object, class, "day")?;
    NaiveDate::from_ymd_opt(year, month, day)
        .ok_or_else(|| FulfilError::json(format!("Invalid {class}: {year}-{month}-{day}")))
}

fn time_from(object: &Map<String, Value>, class: &str) -> Result<NaiveTime, FulfilError> {
    let hour = small_field(object, class, "hour")?;
    let minute = small_field(object, class, "minute")?;
    let second = small_field(object, class, "second")?;
    let micro = match object.get("microsecond") {
        None | Some(Value::Null) => 0,
        Some(_) => small_field(object, class, "microsecond")?,
    };
    NaiveTime::from_hms_micro_opt(hour, minute, second, micro).ok_or_else(|| {
        FulfilError::json(format!("Invalid {class}: {hour}:{minute}:{second}.{micro}"))
    })
}
