//! The OpenWeatherMap "current weather" document, as written by the provider's
//! `/data/2.5/weather` endpoint.
//!
//! Only `main`, `wind` and `dt` are required; every other group falls back to
//! its zero value when the provider leaves it out.

use serde::Deserialize;

/// One point-in-time weather snapshot for a single location
///
/// Decoding is stricter than a zero-value decode: a document without `main`,
/// `wind` or `dt` is rejected instead of producing a point of zeros at the
/// epoch.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct WeatherObservation {
    #[serde(default)]
    pub coord: Coord,
    #[serde(default)]
    pub weather: Vec<Condition>,
    #[serde(default)]
    pub base: String,
    pub main: MainConditions,
    /// Metres
    #[serde(default)]
    pub visibility: i64,
    pub wind: Wind,
    #[serde(default)]
    pub clouds: Clouds,
    /// Time of the observation, seconds since the UNIX epoch (UTC)
    pub dt: i64,
    #[serde(default)]
    pub sys: Sys,
    /// Shift in seconds from UTC
    #[serde(default)]
    pub timezone: i64,
    /// Provider city id
    #[serde(default)]
    pub id: i64,
    /// Provider city name
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub cod: i64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize)]
pub struct Coord {
    #[serde(default)]
    pub lon: f64,
    #[serde(default)]
    pub lat: f64,
}

/// A textual weather description; the provider may send several.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Condition {
    #[serde(default)]
    pub id: i64,
    #[serde(default)]
    pub main: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub icon: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize)]
pub struct MainConditions {
    pub temp: f64,
    pub feels_like: f64,
    #[serde(default)]
    pub temp_min: f64,
    #[serde(default)]
    pub temp_max: f64,
    /// hPa
    pub pressure: i64,
    /// Percent
    #[serde(default)]
    pub humidity: i64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize)]
pub struct Wind {
    pub speed: f64,
    /// Degrees, meteorological
    #[serde(default)]
    pub deg: i64,
    #[serde(default)]
    pub gust: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct Clouds {
    /// Cloudiness in percent
    #[serde(default)]
    pub all: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Sys {
    #[serde(default, rename = "type")]
    pub kind: i64,
    #[serde(default)]
    pub id: i64,
    #[serde(default)]
    pub country: String,
    /// Seconds since the UNIX epoch (UTC)
    #[serde(default)]
    pub sunrise: i64,
    /// Seconds since the UNIX epoch (UTC)
    #[serde(default)]
    pub sunset: i64,
}
