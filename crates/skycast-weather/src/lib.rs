//! Weather service for SkyCast
//!
//! Provides geocoding and staged weather lookups against the OpenWeather API,
//! backed by a session-lived TTL cache.

pub mod cache;
pub mod client;
pub mod error;
pub mod geocode;
pub mod provider;
pub mod settings;
pub mod types;

pub use cache::{CachedResponse, ResponseCache, TtlCache};
pub use client::OpenWeatherClient;
pub use error::{ApiError, WeatherError};
pub use provider::{AirQualityHandle, AirQualityUpdate, WeatherFetch, WeatherProvider};
pub use settings::{Timeouts, WeatherSettings};
pub use types::*;
