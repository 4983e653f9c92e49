//! Forward geocoding: city name to candidate places.

use std::time::Duration;

use tracing::instrument;

use crate::cache::{geocode_key, CachedResponse, ResponseCache};
use crate::client::{OpenWeatherClient, GEOCODE_PATH};
use crate::error::WeatherError;
use crate::types::Place;

/// Look up `city`, serving repeated queries from the cache.
///
/// The raw input is both the query and the cache key; no trimming or case
/// folding is applied. An empty list is a successful lookup, and it is the
/// caller's job to treat it as "city not found".
#[instrument(skip(client, cache), level = "info")]
pub async fn geocode(
    client: &OpenWeatherClient,
    cache: &ResponseCache,
    city: &str,
    limit: u8,
    ttl: Duration,
    timeout: Duration,
) -> Result<Vec<Place>, WeatherError> {
    let key = geocode_key(city);
    if let Some(CachedResponse::Places(places)) = cache.get(&key) {
        tracing::debug!("Geocode cache hit");
        return Ok(places);
    }

    let params = [("q", city.to_string()), ("limit", limit.to_string())];
    let places: Vec<Place> = client
        .get_json(GEOCODE_PATH, &params, timeout)
        .await
        .map_err(WeatherError::Geocoding)?;

    tracing::info!("Geocoded to {} candidate(s)", places.len());
    cache.set(key, CachedResponse::Places(places.clone()), ttl);
    Ok(places)
}
