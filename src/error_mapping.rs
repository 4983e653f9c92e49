use skycast_core::{AppError, ConfigError, NetworkError, WeatherError};
use skycast_weather::WeatherError as LookupError;

/// Map weather lookup errors into the application error hierarchy.
pub trait LookupErrorExt {
    fn into_app_error(self) -> AppError;
}

impl LookupErrorExt for LookupError {
    fn into_app_error(self) -> AppError {
        match self {
            LookupError::MissingCredentials => {
                AppError::Config(ConfigError::MissingSetting("weather.api_key".into()))
            }
            LookupError::InvalidUrl(s) => AppError::Config(ConfigError::Invalid(s)),
            LookupError::Unauthorized => AppError::Weather(WeatherError::InvalidApiKey),
            LookupError::CurrentUnavailable(e) => {
                AppError::Weather(WeatherError::CurrentUnavailable(e.to_string()))
            }
            LookupError::Geocoding(e) => AppError::Weather(WeatherError::GeocodingFailed(e.to_string())),
            LookupError::Client(e) => AppError::Network(NetworkError::ConnectionFailed(e.to_string())),
        }
    }
}
