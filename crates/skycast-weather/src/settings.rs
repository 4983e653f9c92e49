use std::time::Duration;

/// Default OpenWeather host.
pub const DEFAULT_BASE_URL: &str = "https://api.openweathermap.org";

/// Per-endpoint request timeouts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    pub geocode: Duration,
    pub current: Duration,
    pub forecast: Duration,
    pub air: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            geocode: Duration::from_millis(5000),
            current: Duration::from_millis(6000),
            forecast: Duration::from_millis(8000),
            air: Duration::from_millis(5000),
        }
    }
}

/// Everything the weather provider needs to reach the upstream API.
#[derive(Debug, Clone)]
pub struct WeatherSettings {
    pub base_url: String,
    pub api_key: Option<String>,
    /// Forwarding proxy that injects the key server-side. Takes precedence over `api_key`.
    pub proxy_url: Option<String>,
    pub geocode_limit: u8,
    pub geocode_ttl: Duration,
    pub weather_ttl: Duration,
    pub timeouts: Timeouts,
}

impl Default for WeatherSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: None,
            proxy_url: None,
            geocode_limit: 5,
            geocode_ttl: Duration::from_secs(24 * 60 * 60),
            weather_ttl: Duration::from_secs(3 * 60),
            timeouts: Timeouts::default(),
        }
    }
}

impl WeatherSettings {
    /// The API key, unless it is empty or still a `YOUR_...` placeholder.
    pub fn usable_api_key(&self) -> Option<&str> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty() && !k.starts_with("YOUR_"))
    }

    pub fn usable_proxy_url(&self) -> Option<&str> {
        self.proxy_url.as_deref().map(str::trim).filter(|p| !p.is_empty())
    }
}
