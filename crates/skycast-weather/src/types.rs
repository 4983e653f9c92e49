use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Timelike};
use serde::{Deserialize, Serialize};

/// Number of forecast samples shown in the hourly strip.
pub const HOURLY_SAMPLES: usize = 8;
/// Maximum number of days shown in the daily strip.
pub const DAILY_DAYS: usize = 7;
/// UTC hour used to pick a representative sample per day.
const DAILY_REFERENCE_HOUR: i64 = 13;

/// Text shown in place of an air-quality reading that has not arrived.
pub const NO_DATA: &str = "No data";

/// Geocoding candidate returned by the direct geocoding endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Place {
    pub name: String,
    #[serde(default)]
    pub local_names: Option<BTreeMap<String, String>>,
    pub lat: f64,
    pub lon: f64,
    #[serde(default)]
    pub country: String,
    #[serde(default)]
    pub state: Option<String>,
}

impl Place {
    /// Display label such as "Portland, Oregon, US".
    pub fn label(&self) -> String {
        let mut parts = vec![self.name.as_str()];
        if let Some(state) = self.state.as_deref().filter(|s| !s.is_empty()) {
            parts.push(state);
        }
        if !self.country.is_empty() {
            parts.push(&self.country);
        }
        parts.join(", ")
    }

    /// Localized name for a language code, if the provider has one.
    pub fn local_name(&self, lang: &str) -> Option<&str> {
        self.local_names.as_ref()?.get(lang).map(String::as_str)
    }
}

/// Weather condition descriptor (`weather[]` in the API).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Condition {
    #[serde(default)]
    pub id: i32,
    #[serde(default)]
    pub main: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub icon: String,
}

impl Condition {
    pub fn icon_url(&self) -> Option<String> {
        if self.icon.is_empty() {
            None
        } else {
            Some(icon_url(&self.icon))
        }
    }
}

/// Temperature (Kelvin), pressure and humidity readings.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Readings {
    pub temp: f64,
    #[serde(default)]
    pub feels_like: f64,
    #[serde(default)]
    pub pressure: f64,
    #[serde(default)]
    pub humidity: u8,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Wind {
    #[serde(default)]
    pub speed: f64,
    #[serde(default)]
    pub deg: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SystemInfo {
    #[serde(default)]
    pub country: Option<String>,
}

/// Current conditions snapshot. Always present in a [`WeatherPayload`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentConditions {
    #[serde(default)]
    pub name: String,
    pub main: Readings,
    #[serde(default)]
    pub wind: Wind,
    #[serde(default)]
    pub weather: Vec<Condition>,
    /// Shift from UTC in seconds.
    #[serde(default)]
    pub timezone: i64,
    #[serde(default)]
    pub dt: i64,
    #[serde(default)]
    pub sys: SystemInfo,
}

impl CurrentConditions {
    pub fn condition(&self) -> Option<&Condition> {
        self.weather.first()
    }

    pub fn description(&self) -> &str {
        self.condition()
            .map(|c| c.description.as_str())
            .filter(|d| !d.is_empty())
            .unwrap_or("—")
    }

    /// Place name as reported by the weather endpoint, e.g. "London, GB".
    pub fn place_label(&self) -> String {
        match self.sys.country.as_deref().filter(|c| !c.is_empty()) {
            Some(country) => format!("{}, {}", self.name, country),
            None => self.name.clone(),
        }
    }
}

/// One timed forecast sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastSample {
    pub dt: i64,
    pub main: Readings,
    #[serde(default)]
    pub wind: Wind,
    #[serde(default)]
    pub weather: Vec<Condition>,
}

impl ForecastSample {
    pub fn condition(&self) -> Option<&Condition> {
        self.weather.first()
    }

    fn utc_date_and_hour(&self) -> Option<(NaiveDate, i64)> {
        let at = DateTime::from_timestamp(self.dt, 0)?;
        Some((at.date_naive(), i64::from(at.hour())))
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Forecast {
    #[serde(default)]
    pub list: Vec<ForecastSample>,
}

impl Forecast {
    /// Samples for the hourly strip.
    pub fn hourly(&self) -> &[ForecastSample] {
        &self.list[..self.list.len().min(HOURLY_SAMPLES)]
    }

    /// One representative sample per UTC day, the one nearest midday.
    ///
    /// Ties keep the earlier sample. At most [`DAILY_DAYS`] days are returned,
    /// in date order.
    pub fn daily(&self) -> Vec<&ForecastSample> {
        let mut by_date: BTreeMap<NaiveDate, (i64, &ForecastSample)> = BTreeMap::new();
        for sample in &self.list {
            let Some((date, hour)) = sample.utc_date_and_hour() else {
                continue;
            };
            let closer = by_date.get(&date).map_or(true, |(prev_hour, _)| {
                (hour - DAILY_REFERENCE_HOUR).abs() < (prev_hour - DAILY_REFERENCE_HOUR).abs()
            });
            if closer {
                by_date.insert(date, (hour, sample));
            }
        }
        by_date
            .into_values()
            .take(DAILY_DAYS)
            .map(|(_, sample)| sample)
            .collect()
    }
}

/// Air quality index band (OpenWeather scale 1..=5).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AqiLevel {
    Good,
    Moderate,
    UnhealthySensitive,
    Unhealthy,
    VeryUnhealthy,
}

impl AqiLevel {
    pub fn from_index(index: u8) -> Option<Self> {
        match index {
            1 => Some(Self::Good),
            2 => Some(Self::Moderate),
            3 => Some(Self::UnhealthySensitive),
            4 => Some(Self::Unhealthy),
            5 => Some(Self::VeryUnhealthy),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Good => "Good",
            Self::Moderate => "Moderate",
            Self::UnhealthySensitive => "Unhealthy (sensitive)",
            Self::Unhealthy => "Unhealthy",
            Self::VeryUnhealthy => "Very unhealthy",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AirIndex {
    pub aqi: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AirSample {
    pub main: AirIndex,
    /// Pollutant concentrations in μg/m³ keyed by pollutant (co, no2, pm2_5, ...).
    #[serde(default)]
    pub components: BTreeMap<String, f64>,
    #[serde(default)]
    pub dt: i64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AirQuality {
    #[serde(default)]
    pub list: Vec<AirSample>,
}

impl AirQuality {
    pub fn index(&self) -> Option<u8> {
        self.list.first().map(|s| s.main.aqi)
    }

    pub fn level(&self) -> Option<AqiLevel> {
        self.index().and_then(AqiLevel::from_index)
    }
}

/// Result of a staged weather lookup.
///
/// `forecast` and `air` being `None` means "not known yet", not failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherPayload {
    pub current: CurrentConditions,
    pub forecast: Option<Forecast>,
    pub air: Option<AirQuality>,
}

impl WeatherPayload {
    /// "Index: 2 (Moderate)" or [`NO_DATA`].
    pub fn air_summary(&self) -> String {
        let level = self.air.as_ref().and_then(|air| Some((air.index()?, air.level()?)));
        match level {
            Some((index, level)) => format!("Index: {} ({})", index, level.label()),
            None => NO_DATA.to_string(),
        }
    }
}

/// Convert Kelvin to whole degrees Celsius.
pub fn kelvin_to_celsius(kelvin: f64) -> i32 {
    (kelvin - 273.15).round() as i32
}

pub fn format_wind(speed: f64) -> String {
    format!("{:.1} m/s", speed)
}

pub fn format_pressure(hpa: f64) -> String {
    format!("{} hPa", hpa.round() as i64)
}

/// `HH:MM` at the location, given a unix timestamp and UTC shift in seconds.
pub fn local_time_hm(dt: i64, tz_offset_secs: i64) -> String {
    DateTime::from_timestamp(dt + tz_offset_secs, 0)
        .map(|t| t.format("%H:%M").to_string())
        .unwrap_or_else(|| "--:--".to_string())
}

/// Short UTC day label such as "Fri 01 Mar".
pub fn day_label(dt: i64) -> String {
    DateTime::from_timestamp(dt, 0)
        .map(|t| t.format("%a %d %b").to_string())
        .unwrap_or_default()
}

pub fn icon_url(icon: &str) -> String {
    format!("https://openweathermap.org/img/wn/{}@2x.png", icon)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
    use super::*;

    fn sample(dt: i64, temp: f64) -> ForecastSample {
        ForecastSample {
            dt,
            main: Readings {
                temp,
                ..Default::default()
            },
            wind: Wind::default(),
            weather: vec![],
        }
    }

    // 2024-03-01T00:00:00Z
    const MARCH_1: i64 = 1_709_251_200;
    const HOUR: i64 = 3600;

    #[test]
    fn test_kelvin_to_celsius() {
        assert_eq!(kelvin_to_celsius(273.15), 0);
        assert_eq!(kelvin_to_celsius(288.0), 15);
        assert_eq!(kelvin_to_celsius(260.0), -13);
    }

    #[test]
    fn test_formatting_helpers() {
        assert_eq!(format_wind(3.6), "3.6 m/s");
        assert_eq!(format_pressure(1012.4), "1012 hPa");
        assert_eq!(
            icon_url("10d"),
            "https://openweathermap.org/img/wn/10d@2x.png"
        );
    }

    #[test]
    fn test_local_time_applies_offset() {
        assert_eq!(local_time_hm(MARCH_1, 0), "00:00");
        assert_eq!(local_time_hm(MARCH_1, 3 * HOUR), "03:00");
        assert_eq!(local_time_hm(MARCH_1, -HOUR / 2), "23:30");
    }

    #[test]
    fn test_day_label() {
        assert_eq!(day_label(MARCH_1), "Fri 01 Mar");
    }

    #[test]
    fn test_hourly_takes_first_eight() {
        let forecast = Forecast {
            list: (0..40).map(|i| sample(MARCH_1 + i * 3 * HOUR, 280.0)).collect(),
        };
        assert_eq!(forecast.hourly().len(), 8);
        assert_eq!(forecast.hourly()[0].dt, MARCH_1);

        let short = Forecast {
            list: vec![sample(MARCH_1, 280.0)],
        };
        assert_eq!(short.hourly().len(), 1);
    }

    #[test]
    fn test_daily_picks_sample_nearest_midday() {
        let forecast = Forecast {
            list: (0..40).map(|i| sample(MARCH_1 + i * 3 * HOUR, 280.0 + i as f64)).collect(),
        };
        let daily = forecast.daily();
        assert_eq!(daily.len(), 5);
        for s in &daily {
            let hour = DateTime::from_timestamp(s.dt, 0).unwrap().hour();
            assert_eq!(hour, 12);
        }
    }

    #[test]
    fn test_daily_tie_keeps_first_sample() {
        // 12:00 and 14:00 are both one hour from 13:00.
        let forecast = Forecast {
            list: vec![sample(MARCH_1 + 12 * HOUR, 1.0), sample(MARCH_1 + 14 * HOUR, 2.0)],
        };
        let daily = forecast.daily();
        assert_eq!(daily.len(), 1);
        assert_eq!(daily[0].main.temp, 1.0);
    }

    #[test]
    fn test_daily_caps_at_seven_days() {
        let forecast = Forecast {
            list: (0..10).map(|d| sample(MARCH_1 + d * 24 * HOUR, 280.0)).collect(),
        };
        assert_eq!(forecast.daily().len(), 7);
    }

    #[test]
    fn test_aqi_levels() {
        assert_eq!(AqiLevel::from_index(1), Some(AqiLevel::Good));
        assert_eq!(AqiLevel::from_index(3).map(|l| l.label()), Some("Unhealthy (sensitive)"));
        assert_eq!(AqiLevel::from_index(5), Some(AqiLevel::VeryUnhealthy));
        assert_eq!(AqiLevel::from_index(0), None);
        assert_eq!(AqiLevel::from_index(6), None);
    }

    #[test]
    fn test_air_summary_without_air_is_no_data() {
        let current: CurrentConditions = serde_json::from_value(serde_json::json!({
            "name": "London",
            "main": {"temp": 285.0},
        }))
        .unwrap();
        let mut payload = WeatherPayload {
            current,
            forecast: None,
            air: None,
        };
        assert_eq!(payload.air_summary(), NO_DATA);

        payload.air = Some(serde_json::from_value(serde_json::json!({
            "list": [{"main": {"aqi": 2}, "components": {"pm2_5": 4.1}}]
        }))
        .unwrap());
        assert_eq!(payload.air_summary(), "Index: 2 (Moderate)");
    }

    #[test]
    fn test_current_conditions_parse_and_labels() {
        let current: CurrentConditions = serde_json::from_value(serde_json::json!({
            "name": "London",
            "main": {"temp": 285.3, "feels_like": 284.1, "pressure": 1012, "humidity": 81},
            "wind": {"speed": 4.1, "deg": 240},
            "weather": [{"id": 500, "main": "Rain", "description": "light rain", "icon": "10d"}],
            "timezone": 3600,
            "dt": 1709290800,
            "sys": {"country": "GB"}
        }))
        .unwrap();
        assert_eq!(current.place_label(), "London, GB");
        assert_eq!(current.description(), "light rain");
        assert_eq!(current.main.humidity, 81);
        assert_eq!(current.timezone, 3600);
    }

    #[test]
    fn test_description_fallback() {
        let current: CurrentConditions =
            serde_json::from_value(serde_json::json!({"main": {"temp": 280.0}})).unwrap();
        assert_eq!(current.description(), "—");
        assert_eq!(current.place_label(), "");
    }

    #[test]
    fn test_place_label_and_local_name() {
        let place: Place = serde_json::from_value(serde_json::json!({
            "name": "Portland",
            "local_names": {"en": "Portland", "ru": "Портленд"},
            "lat": 45.52,
            "lon": -122.67,
            "country": "US",
            "state": "Oregon"
        }))
        .unwrap();
        assert_eq!(place.label(), "Portland, Oregon, US");
        assert_eq!(place.local_name("ru"), Some("Портленд"));
        assert_eq!(place.local_name("de"), None);

        let bare = Place {
            state: None,
            ..place
        };
        assert_eq!(bare.label(), "Portland, US");
    }
}
