//! Staged weather lookup.
//!
//! Current conditions are mandatory and fetched first. Forecast and air
//! quality are then requested concurrently; the call returns once the
//! forecast settles, and air quality is patched in afterwards by a
//! background task that updates the cache and notifies subscribers.

use std::sync::Arc;

use tokio::sync::{broadcast, oneshot};
use tracing::instrument;

use crate::cache::{weather_key, CachedResponse, ResponseCache};
use crate::client::{OpenWeatherClient, AIR_POLLUTION_PATH, CURRENT_PATH, FORECAST_PATH};
use crate::error::{ApiError, WeatherError};
use crate::geocode;
use crate::settings::WeatherSettings;
use crate::types::{AirQuality, CurrentConditions, Forecast, Place, WeatherPayload};

const UPDATE_CHANNEL_CAPACITY: usize = 16;

/// Air quality arrived for a location after its payload was returned.
#[derive(Debug, Clone)]
pub struct AirQualityUpdate {
    /// Cache key of the location, `weather:<lat>,<lon>`.
    pub key: String,
    pub payload: WeatherPayload,
}

/// Resolves once the background air-quality request settles.
#[derive(Debug)]
pub struct AirQualityHandle {
    rx: oneshot::Receiver<Option<WeatherPayload>>,
}

impl AirQualityHandle {
    /// The enriched payload, or `None` if the air-quality request failed.
    pub async fn wait(self) -> Option<WeatherPayload> {
        self.rx.await.ok().flatten()
    }
}

/// Outcome of [`WeatherProvider::fetch_weather`].
#[derive(Debug)]
pub struct WeatherFetch {
    pub payload: WeatherPayload,
    /// Pending air-quality enrichment. `None` when served from cache.
    pub air_update: Option<AirQualityHandle>,
}

impl WeatherFetch {
    pub fn from_cache(&self) -> bool {
        self.air_update.is_none()
    }
}

/// Geocoding and weather lookups over a shared response cache.
#[derive(Debug, Clone)]
pub struct WeatherProvider {
    client: OpenWeatherClient,
    cache: Arc<ResponseCache>,
    settings: Arc<WeatherSettings>,
    updates: broadcast::Sender<AirQualityUpdate>,
}

impl WeatherProvider {
    pub fn new(settings: WeatherSettings) -> Result<Self, WeatherError> {
        Self::with_cache(settings, Arc::new(ResponseCache::new()))
    }

    /// Build a provider on top of an existing cache.
    pub fn with_cache(
        settings: WeatherSettings,
        cache: Arc<ResponseCache>,
    ) -> Result<Self, WeatherError> {
        let client = OpenWeatherClient::new(&settings)?;
        let (updates, _) = broadcast::channel(UPDATE_CHANNEL_CAPACITY);
        tracing::debug!(proxied = client.is_proxied(), "Weather provider ready");

        Ok(Self {
            client,
            cache,
            settings: Arc::new(settings),
            updates,
        })
    }

    pub fn cache(&self) -> &Arc<ResponseCache> {
        &self.cache
    }

    /// Forget every cached geocode and weather response.
    ///
    /// Air-quality requests still in flight will not write their results back.
    pub fn clear_cache(&self) {
        self.cache.clear();
        tracing::info!("Response cache cleared");
    }

    /// Receive an [`AirQualityUpdate`] each time air quality lands after a fetch.
    pub fn subscribe(&self) -> broadcast::Receiver<AirQualityUpdate> {
        self.updates.subscribe()
    }

    pub async fn geocode(&self, city: &str) -> Result<Vec<Place>, WeatherError> {
        geocode::geocode(
            &self.client,
            &self.cache,
            city,
            self.settings.geocode_limit,
            self.settings.geocode_ttl,
            self.settings.timeouts.geocode,
        )
        .await
    }

    /// Fetch weather for a location.
    ///
    /// Only a current-conditions failure is an error. Concurrent calls for
    /// the same location are not coalesced; each cache miss issues its own
    /// requests and the last write to the cache wins.
    #[instrument(skip(self), level = "info")]
    pub async fn fetch_weather(&self, lat: f64, lon: f64) -> Result<WeatherFetch, WeatherError> {
        let key = weather_key(lat, lon);
        if let Some(CachedResponse::Weather(payload)) = self.cache.get(&key) {
            tracing::debug!("Weather cache hit");
            return Ok(WeatherFetch {
                payload,
                air_update: None,
            });
        }

        let timeouts = self.settings.timeouts;
        let params = vec![("lat", lat.to_string()), ("lon", lon.to_string())];

        let current: CurrentConditions = self
            .client
            .get_json(CURRENT_PATH, &params, timeouts.current)
            .await
            .map_err(|e| match e {
                ApiError::Unauthorized => WeatherError::Unauthorized,
                other => WeatherError::CurrentUnavailable(other),
            })?;

        let air_task = {
            let client = self.client.clone();
            let params = params.clone();
            tokio::spawn(async move {
                client
                    .get_json::<AirQuality>(AIR_POLLUTION_PATH, &params, timeouts.air)
                    .await
            })
        };

        let forecast = match self
            .client
            .get_json::<Forecast>(FORECAST_PATH, &params, timeouts.forecast)
            .await
        {
            Ok(forecast) => Some(forecast),
            Err(e) => {
                tracing::debug!("Forecast unavailable: {}", e);
                None
            }
        };

        let payload = WeatherPayload {
            current,
            forecast,
            air: None,
        };
        let generation = self.cache.generation();
        self.cache.set(
            key.clone(),
            CachedResponse::Weather(payload.clone()),
            self.settings.weather_ttl,
        );

        let (tx, rx) = oneshot::channel();
        let cache = Arc::clone(&self.cache);
        let updates = self.updates.clone();
        let ttl = self.settings.weather_ttl;
        let base = payload.clone();
        tokio::spawn(async move {
            let enriched = match air_task.await {
                Ok(Ok(air)) => {
                    let enriched = WeatherPayload {
                        air: Some(air),
                        ..base
                    };
                    let stored = cache.set_if_generation(
                        key.clone(),
                        CachedResponse::Weather(enriched.clone()),
                        ttl,
                        generation,
                    );
                    if stored {
                        tracing::debug!(key = %key, "Air quality patched in");
                    } else {
                        tracing::debug!(key = %key, "Cache cleared before air quality landed");
                    }
                    // No subscribers is fine.
                    let _ = updates.send(AirQualityUpdate {
                        key,
                        payload: enriched.clone(),
                    });
                    Some(enriched)
                }
                Ok(Err(e)) => {
                    tracing::debug!("Air quality unavailable: {}", e);
                    None
                }
                Err(e) => {
                    tracing::warn!("Air quality task failed: {}", e);
                    None
                }
            };
            let _ = tx.send(enriched);
        });

        Ok(WeatherFetch {
            payload,
            air_update: Some(AirQualityHandle { rx }),
        })
    }
}
