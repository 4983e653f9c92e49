use std::time::Duration;

use skycast_core::WeatherConfig;
use skycast_weather::{Timeouts, WeatherSettings};

/// Translate the on-disk weather section into provider settings.
pub fn weather_settings(config: &WeatherConfig) -> WeatherSettings {
    let timeouts = &config.timeouts;
    WeatherSettings {
        base_url: config.base_url.clone(),
        api_key: config.api_key.clone(),
        proxy_url: config.proxy_url.clone(),
        geocode_limit: config.geocode_limit,
        geocode_ttl: Duration::from_secs(config.geocode_ttl_secs),
        weather_ttl: Duration::from_secs(config.weather_ttl_secs),
        timeouts: Timeouts {
            geocode: Duration::from_millis(timeouts.geocode_ms),
            current: Duration::from_millis(timeouts.current_ms),
            forecast: Duration::from_millis(timeouts.forecast_ms),
            air: Duration::from_millis(timeouts.air_ms),
        },
    }
}
