//! Turns an observation into the point stored for it

use weather_influx_client::DataPoint;

use crate::observation::WeatherObservation;

/// Tag carrying the caller-supplied city label
pub const CITY_TAG: &str = "Stadt";
/// `main.temp`
pub const TEMPERATURE_FIELD: &str = "Temperatur";
/// `main.feels_like`
pub const FEELS_LIKE_FIELD: &str = "Temperatur (gefühlt)";
/// `main.pressure`
pub const PRESSURE_FIELD: &str = "Luftdruck";
/// `wind.speed`
pub const WIND_SPEED_FIELD: &str = "Windgeschwindigkeit";

/// The part of the configuration that shapes each point
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PointConfig {
    pub measurement: String,
}

impl PointConfig {
    pub fn new(measurement: impl Into<String>) -> Self {
        Self {
            measurement: measurement.into(),
        }
    }
}

/// Map one observation to its point.
///
/// The city is used verbatim as the tag value, even when empty. The four
/// fields are copied without unit conversion and the timestamp is the
/// observation's `dt`, never the current time.
pub fn map_observation(
    config: &PointConfig,
    observation: &WeatherObservation,
    city: &str,
) -> DataPoint {
    DataPoint::builder(config.measurement.as_str())
        .tag(CITY_TAG, city)
        .field(TEMPERATURE_FIELD, observation.main.temp)
        .field(FEELS_LIKE_FIELD, observation.main.feels_like)
        .field(PRESSURE_FIELD, observation.main.pressure)
        .field(WIND_SPEED_FIELD, observation.wind.speed)
        .timestamp(observation.dt)
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observation::{MainConditions, Wind};
    use chrono::{DateTime, Utc};
    use pretty_assertions::assert_eq;
    use weather_influx_client::{FieldValue, line_protocol_body};

    fn observation(temp: f64, feels_like: f64, pressure: i64, speed: f64, dt: i64) -> WeatherObservation {
        WeatherObservation {
            main: MainConditions {
                temp,
                feels_like,
                pressure,
                ..Default::default()
            },
            wind: Wind {
                speed,
                ..Default::default()
            },
            dt,
            ..Default::default()
        }
    }

    #[test]
    fn maps_berlin_observation() {
        let config = PointConfig::new("weather");
        let point = map_observation(
            &config,
            &observation(21.5, 20.1, 1012, 3.2, 1_700_000_000),
            "Berlin",
        );

        assert_eq!(point.measurement(), "weather");
        assert_eq!(point.tags().collect::<Vec<_>>(), vec![("Stadt", "Berlin")]);
        assert_eq!(
            point.fields().collect::<Vec<_>>(),
            vec![
                ("Luftdruck", &FieldValue::I64(1012)),
                ("Temperatur", &FieldValue::F64(21.5)),
                ("Temperatur (gefühlt)", &FieldValue::F64(20.1)),
                ("Windgeschwindigkeit", &FieldValue::F64(3.2)),
            ]
        );
        assert_eq!(
            point.time(),
            Some("2023-11-14T22:13:20Z".parse::<DateTime<Utc>>().unwrap())
        );
        assert_eq!(
            point.line_protocol().to_string(),
            r#"weather,Stadt=Berlin Luftdruck=1012i,Temperatur=21.5,Temperatur\ (gefühlt)=20.1,Windgeschwindigkeit=3.2 1700000000"#
        );
    }

    #[test]
    fn tag_and_measurement_pass_through() {
        let obs = observation(0.0, 0.0, 0, 0.0, 0);
        for (measurement, city) in [
            ("weather", ""),
            ("wetter daten", "Frankfurt am Main"),
            ("m", "Köln,Bonn=Region"),
        ] {
            let point = map_observation(&PointConfig::new(measurement), &obs, city);
            assert_eq!(point.measurement(), measurement);
            assert_eq!(point.tag(CITY_TAG), Some(city));
        }
    }

    #[test]
    fn city_label_stays_on_one_line() {
        let config = PointConfig::new("weather");
        let obs = observation(21.5, 20.1, 1012, 3.2, 1_700_000_000);
        let points = [
            map_observation(&config, &obs, "Berlin\nMitte"),
            map_observation(&config, &obs, "Berlin\\"),
        ];

        let body = line_protocol_body(&points);
        assert_eq!(body.lines().count(), 2, "{body}");
        assert_eq!(
            body,
            concat!(
                r#"weather,Stadt=Berlin\nMitte Luftdruck=1012i,Temperatur=21.5,Temperatur\ (gefühlt)=20.1,Windgeschwindigkeit=3.2 1700000000"#,
                "\n",
                r#"weather,Stadt=Berlin\\ Luftdruck=1012i,Temperatur=21.5,Temperatur\ (gefühlt)=20.1,Windgeschwindigkeit=3.2 1700000000"#,
                "\n",
            )
        );
    }

    #[test]
    fn timestamp_is_observation_time() {
        let config = PointConfig::new("weather");
        for dt in [0, -86_400, 1_700_000_000, i64::MIN, i64::MAX] {
            let point = map_observation(&config, &observation(1.0, 1.0, 1, 1.0, dt), "x");
            assert_eq!(point.timestamp(), Some(dt));
            assert_eq!(point.time(), DateTime::<Utc>::from_timestamp(dt, 0));
        }
    }

    #[test]
    fn exactly_four_fields() {
        let mut obs = observation(-3.5, -9.25, 998, 12.0, 1);
        obs.main.humidity = 93;
        obs.wind.gust = 20.0;
        obs.name = "Sylt".into();

        let point = map_observation(&PointConfig::new("weather"), &obs, "List");
        let keys: Vec<_> = point.fields().map(|(k, _)| k).collect();
        assert_eq!(
            keys,
            vec![
                PRESSURE_FIELD,
                TEMPERATURE_FIELD,
                FEELS_LIKE_FIELD,
                WIND_SPEED_FIELD
            ]
        );
        assert_eq!(point.tags().count(), 1);
    }

    #[test]
    fn mapping_is_deterministic() {
        let config = PointConfig::new("weather");
        let obs = observation(21.5, 20.1, 1012, 3.2, 1_700_000_000);

        let a = map_observation(&config, &obs, "Berlin");
        let b = map_observation(&config, &obs, "Berlin");
        assert_eq!(a, b);
        assert_eq!(a.line_protocol().to_string(), b.line_protocol().to_string());
    }
}
