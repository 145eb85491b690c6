use crate::domain::convert::{celsius_to_fahrenheit, celsius_to_kelvin};
use crate::utils::validation::is_valid_postal_code;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

pub const INVALID_POSTAL_CODE_MESSAGE: &str = "invalid zipcode";
pub const POSTAL_CODE_NOT_FOUND_MESSAGE: &str = "can not find zipcode";

/// Body accepted by both services.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostalCodeRequest {
    #[serde(rename = "cep", default, deserialize_with = "null_as_empty")]
    pub code: String,
}

// `"cep": null` reads the same as a missing field.
fn null_as_empty<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

impl PostalCodeRequest {
    pub fn new(code: impl Into<String>) -> Self {
        Self { code: code.into() }
    }

    pub fn is_well_formed(&self) -> bool {
        is_valid_postal_code(&self.code)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalityResult {
    pub name: String,
    pub found: bool,
}

impl LocalityResult {
    pub fn found(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            found: true,
        }
    }

    pub fn not_found() -> Self {
        Self {
            name: String::new(),
            found: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TemperatureReading {
    pub celsius: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherResult {
    pub city: String,
    #[serde(rename = "temp_C", serialize_with = "serialize_compact")]
    pub celsius: f64,
    #[serde(rename = "temp_F", serialize_with = "serialize_compact")]
    pub fahrenheit: f64,
    #[serde(rename = "temp_K", serialize_with = "serialize_compact")]
    pub kelvin: f64,
}

impl WeatherResult {
    pub fn from_reading(city: impl Into<String>, reading: TemperatureReading) -> Self {
        Self {
            city: city.into(),
            celsius: reading.celsius,
            fahrenheit: celsius_to_fahrenheit(reading.celsius),
            kelvin: celsius_to_kelvin(reading.celsius),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorPayload {
    pub message: String,
}

impl ErrorPayload {
    pub fn invalid_postal_code() -> Self {
        Self {
            message: INVALID_POSTAL_CODE_MESSAGE.to_string(),
        }
    }

    pub fn postal_code_not_found() -> Self {
        Self {
            message: POSTAL_CODE_NOT_FOUND_MESSAGE.to_string(),
        }
    }
}

// Integral temperatures go out as `25` rather than `25.0`.
fn serialize_compact<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    const MAX_EXACT_INT: f64 = 9_007_199_254_740_992.0;
    if value.is_finite() && value.fract() == 0.0 && value.abs() < MAX_EXACT_INT {
        serializer.serialize_i64(*value as i64)
    } else {
        serializer.serialize_f64(*value)
    }
}
