//! # Vehicle telemetry
//!
//! The simulator reports its numeric fields as JSON strings (for example
//! `{"cte":"0.7598","speed":"12.03","steering_angle":"-0.5"}`), so every field
//! here accepts either a JSON number or a string holding a number.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{de, Deserialize, Deserializer, Serialize};
use serde_json::Value;
use thiserror::Error;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// One telemetry sample from the vehicle.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct Telemetry {
    /// Cross track error, the signed lateral distance from the target path.
    #[serde(deserialize_with = "de_num_or_str")]
    pub cte: f64,

    /// Vehicle speed as reported by the simulator.
    #[serde(default, deserialize_with = "de_num_or_str")]
    pub speed: f64,

    /// Current steering angle as reported by the simulator.
    #[serde(default, deserialize_with = "de_num_or_str")]
    pub steering_angle: f64,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// An event delivered by the telemetry source once per tick.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum TlmEvent {
    /// A telemetry sample that the controller must act on.
    Telemetry(Telemetry),

    /// The vehicle sent no data and is under manual control.
    Manual,
}

/// Possible telemetry parsing errors.
#[derive(Debug, Error)]
pub enum TlmParseError {
    #[error("Telemetry contains invalid JSON: {0}")]
    InvalidJson(serde_json::Error),

    #[error("Telemetry is not a valid sample: {0}")]
    InvalidTelemetry(serde_json::Error),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum NumOrStr {
    Num(f64),
    Str(String),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl TlmEvent {
    /// Parse an event from a JSON string.
    ///
    /// `null` or an empty object is a manual event, any other value must be a
    /// telemetry object.
    pub fn from_json(json_str: &str) -> Result<Self, TlmParseError> {
        let val: Value = serde_json::from_str(json_str)
            .map_err(TlmParseError::InvalidJson)?;

        match val {
            Value::Null => Ok(TlmEvent::Manual),
            Value::Object(ref m) if m.is_empty() => Ok(TlmEvent::Manual),
            v @ Value::Object(_) => serde_json::from_value(v)
                .map(TlmEvent::Telemetry)
                .map_err(TlmParseError::InvalidTelemetry),
            v => Err(TlmParseError::InvalidTelemetry(de::Error::invalid_type(
                unexpected(&v),
                &"a telemetry object",
            ))),
        }
    }
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

fn unexpected(v: &Value) -> de::Unexpected {
    match v {
        Value::Null => de::Unexpected::Unit,
        Value::Bool(b) => de::Unexpected::Bool(*b),
        Value::Number(n) => match n.as_f64() {
            Some(f) => de::Unexpected::Float(f),
            None => de::Unexpected::Other("number"),
        },
        Value::String(s) => de::Unexpected::Str(s),
        Value::Array(_) => de::Unexpected::Seq,
        Value::Object(_) => de::Unexpected::Map,
    }
}

fn de_num_or_str<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    match NumOrStr::deserialize(deserializer)? {
        NumOrStr::Num(n) => Ok(n),
        NumOrStr::Str(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|e| de::Error::custom(format!("\"{}\" is not a number: {}", s, e))),
    }
}
