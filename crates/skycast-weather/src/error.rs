//! Weather lookup error types.

use thiserror::Error;

/// Failure of a single upstream request.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Unauthorized - API key invalid or rejected")]
    Unauthorized,

    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Request timed out")]
    Timeout,

    #[error("Network error: {0}")]
    Network(reqwest::Error),

    #[error("Invalid response body: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for ApiError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            ApiError::Timeout
        } else if e.is_decode() {
            ApiError::Decode(e.to_string())
        } else {
            ApiError::Network(e)
        }
    }
}

/// Errors that cross the weather crate's boundary.
///
/// Forecast and air-quality failures never appear here; they degrade to
/// absent fields on the payload.
#[derive(Error, Debug)]
pub enum WeatherError {
    #[error("No API key or proxy configured")]
    MissingCredentials,

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Weather API key invalid or unauthorized")]
    Unauthorized,

    #[error("Current conditions unavailable: {0}")]
    CurrentUnavailable(#[source] ApiError),

    #[error("Geocoding failed: {0}")]
    Geocoding(#[source] ApiError),

    #[error("HTTP client error: {0}")]
    Client(#[from] reqwest::Error),
}

impl WeatherError {
    /// User-friendly error message for display.
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::MissingCredentials => {
                "Missing OpenWeather API key. Set weather.api_key or weather.proxy_url in the config."
            }
            Self::InvalidUrl(_) => "Weather service URL is invalid. Check settings.",
            Self::Unauthorized => "OpenWeather API key invalid or unauthorized.",
            Self::CurrentUnavailable(_) => "Failed to retrieve data. Check API key or network.",
            Self::Geocoding(_) => "Geocoding error. Please try again.",
            Self::Client(_) => "Weather service could not be started.",
        }
    }
}
