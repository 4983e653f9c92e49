//! OpenWeather HTTP client.
//!
//! Requests go either straight to the API with the key appended, or through a
//! forwarding proxy that receives the target path as a `path` parameter and
//! injects the key server-side. Callers see the same responses either way.

use std::sync::Arc;
use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use url::Url;

use crate::error::{ApiError, WeatherError};
use crate::settings::WeatherSettings;

pub const GEOCODE_PATH: &str = "/geo/1.0/direct";
pub const CURRENT_PATH: &str = "/data/2.5/weather";
pub const FORECAST_PATH: &str = "/data/2.5/forecast";
pub const AIR_POLLUTION_PATH: &str = "/data/2.5/air_pollution";

const USER_AGENT: &str = "SkyCast/0.1.0";

#[derive(Debug, Clone)]
enum Route {
    Direct { base_url: Url, api_key: String },
    Proxy { proxy_url: Url },
}

#[derive(Debug, Clone)]
pub struct OpenWeatherClient {
    client: Arc<Client>,
    route: Route,
}

impl OpenWeatherClient {
    /// Build a client, resolving credentials before any request is made.
    pub fn new(settings: &WeatherSettings) -> Result<Self, WeatherError> {
        let route = if let Some(proxy) = settings.usable_proxy_url() {
            Route::Proxy {
                proxy_url: parse_url(proxy)?,
            }
        } else if let Some(key) = settings.usable_api_key() {
            Route::Direct {
                base_url: parse_url(&settings.base_url)?,
                api_key: key.to_string(),
            }
        } else {
            return Err(WeatherError::MissingCredentials);
        };

        let client = Client::builder().user_agent(USER_AGENT).build()?;

        Ok(Self {
            client: Arc::new(client),
            route,
        })
    }

    pub fn is_proxied(&self) -> bool {
        matches!(self.route, Route::Proxy { .. })
    }

    fn request_url(&self, path: &str, params: &[(&str, String)]) -> Url {
        let (mut url, key) = match &self.route {
            Route::Direct { base_url, api_key } => {
                let mut url = base_url.clone();
                let joined = format!("{}{}", base_url.path().trim_end_matches('/'), path);
                url.set_path(&joined);
                (url, Some(api_key.as_str()))
            }
            Route::Proxy { proxy_url } => {
                let mut url = proxy_url.clone();
                url.query_pairs_mut().append_pair("path", path);
                (url, None)
            }
        };

        {
            let mut query = url.query_pairs_mut();
            for (name, value) in params.iter().filter(|(_, v)| !v.is_empty()) {
                query.append_pair(name, value);
            }
            if let Some(key) = key {
                query.append_pair("appid", key);
            }
        }
        url
    }

    /// GET `path` and decode the JSON body, failing after `timeout`.
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, String)],
        timeout: Duration,
    ) -> Result<T, ApiError> {
        let url = self.request_url(path, params);

        let response = self.client.get(url).timeout(timeout).send().await?;
        let status = response.status();
        tracing::debug!(path, status = status.as_u16(), "OpenWeather response");

        if status == StatusCode::UNAUTHORIZED {
            return Err(ApiError::Unauthorized);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::Status {
                status: status.as_u16(),
                body,
            });
        }

        response
            .json()
            .await
            .map_err(|e| match ApiError::from(e) {
                ApiError::Timeout => ApiError::Timeout,
                other => ApiError::Decode(other.to_string()),
            })
    }
}

fn parse_url(raw: &str) -> Result<Url, WeatherError> {
    Url::parse(raw).map_err(|e| WeatherError::InvalidUrl(format!("{}: {}", raw, e)))
}
