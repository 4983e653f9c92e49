//! Interactive lookup loop.

use anyhow::Result;
use skycast_core::{AppError, WeatherError};
use skycast_weather::{AirQualityHandle, Place, WeatherProvider};
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::error_mapping::LookupErrorExt;
use crate::render::{self, SortOrder};

const HELP: &str = "Type a city name to look it up.\n  \
:find <city>         list matching places\n  \
:pick <n>            weather for a listed place\n  \
:sort asc|desc       order of the :find list\n  \
:coords <lat> <lon>  weather for coordinates\n  \
:clear               clear cached responses\n  \
:help                show this help\n  \
:quit                exit";

/// One line of user input.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Search(String),
    Find(String),
    Pick(usize),
    Sort(SortOrder),
    Coords { lat: f64, lon: f64 },
    ClearCache,
    Help,
    Quit,
    Empty,
    Invalid(String),
}

impl Command {
    pub fn parse(line: &str) -> Self {
        let line = line.trim();
        if line.is_empty() {
            return Command::Empty;
        }
        let Some(rest) = line.strip_prefix(':') else {
            return Command::Search(line.to_string());
        };

        let mut parts = rest.split_whitespace();
        match parts.next() {
            Some("quit") | Some("q") | Some("exit") => Command::Quit,
            Some("clear") => Command::ClearCache,
            Some("help") | Some("h") => Command::Help,
            Some("find") => {
                let city = parts.collect::<Vec<_>>().join(" ");
                if city.is_empty() {
                    Command::Invalid("usage: :find <city>".to_string())
                } else {
                    Command::Find(city)
                }
            }
            Some("pick") => match parts.next().and_then(|s| s.parse::<usize>().ok()) {
                Some(n) if n > 0 => Command::Pick(n),
                _ => Command::Invalid("usage: :pick <n>".to_string()),
            },
            Some("sort") => match parts.next() {
                Some("asc") => Command::Sort(SortOrder::Ascending),
                Some("desc") => Command::Sort(SortOrder::Descending),
                _ => Command::Invalid("usage: :sort asc|desc".to_string()),
            },
            Some("coords") => {
                let lat = parts.next().and_then(|s| s.parse::<f64>().ok());
                let lon = parts.next().and_then(|s| s.parse::<f64>().ok());
                match (lat, lon) {
                    (Some(lat), Some(lon))
                        if (-90.0..=90.0).contains(&lat) && (-180.0..=180.0).contains(&lon) =>
                    {
                        Command::Coords { lat, lon }
                    }
                    _ => Command::Invalid("usage: :coords <lat> <lon>".to_string()),
                }
            }
            _ => Command::Invalid(format!("unknown command: {}", line)),
        }
    }
}

/// A rendered weather summary for one location.
pub struct Report {
    pub title: String,
    pub summary: String,
    /// Air quality still on its way. `None` when served from cache.
    pub air_update: Option<AirQualityHandle>,
}

pub struct Session {
    provider: WeatherProvider,
    place_language: Option<String>,
    order: SortOrder,
    /// Last `:find` listing, in display order.
    candidates: Vec<(String, Place)>,
}

impl Session {
    pub fn new(provider: WeatherProvider, place_language: Option<String>) -> Self {
        Self {
            provider,
            place_language,
            order: SortOrder::default(),
            candidates: Vec::new(),
        }
    }

    /// Read commands from stdin until `:quit` or end of input.
    pub async fn run(mut self) -> Result<()> {
        println!("{}", HELP);

        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        while let Some(line) = lines.next_line().await? {
            match Command::parse(&line) {
                Command::Quit => break,
                Command::Empty => {}
                Command::Help => println!("{}", HELP),
                Command::Invalid(msg) => println!("{}", msg),
                Command::ClearCache => {
                    self.provider.clear_cache();
                    println!("Cache cleared");
                }
                Command::Sort(order) => {
                    self.order = order;
                    println!("Candidates sorted {:?}", order);
                }
                Command::Search(city) => match self.places(&city).await {
                    Ok(places) => {
                        // `places` is never empty here.
                        if let Some(place) = places.first() {
                            let title = render::place_title(place, self.place_language.as_deref());
                            self.show(place.lat, place.lon, Some(title)).await;
                        }
                    }
                    Err(err) => report_error("Geocoding failed", &err),
                },
                Command::Find(city) => match self.find(&city).await {
                    Ok(listing) => println!("{}\nUse :pick <n> to show one.", listing),
                    Err(err) => report_error("Geocoding failed", &err),
                },
                Command::Pick(n) => match self.pick(n) {
                    Some((title, lat, lon)) => self.show(lat, lon, Some(title)).await,
                    None => println!("No candidate {}. Run :find <city> first.", n),
                },
                Command::Coords { lat, lon } => self.show(lat, lon, None).await,
            }
        }

        Ok(())
    }

    /// Geocode `city`, treating an empty result as "not found".
    async fn places(&self, city: &str) -> Result<Vec<Place>, AppError> {
        let places = self
            .provider
            .geocode(city)
            .await
            .map_err(LookupErrorExt::into_app_error)?;
        if places.is_empty() {
            return Err(WeatherError::LocationNotFound(city.to_string()).into());
        }
        Ok(places)
    }

    /// List candidates for `city` and remember them for `:pick`.
    async fn find(&mut self, city: &str) -> Result<String, AppError> {
        let places = self.places(city).await?;
        self.candidates =
            render::sorted_candidates(&places, self.place_language.as_deref(), self.order);
        Ok(render::render_candidates(&self.candidates))
    }

    /// Title and coordinates of the `n`th listed candidate, counting from 1.
    fn pick(&self, n: usize) -> Option<(String, f64, f64)> {
        let (title, place) = self.candidates.get(n.checked_sub(1)?)?;
        Some((title.clone(), place.lat, place.lon))
    }

    async fn report(&self, lat: f64, lon: f64, title: Option<String>) -> Result<Report, AppError> {
        let fetch = self
            .provider
            .fetch_weather(lat, lon)
            .await
            .map_err(LookupErrorExt::into_app_error)?;
        let title = title.unwrap_or_else(|| fetch.payload.current.place_label());
        Ok(Report {
            summary: render::render_weather(&title, &fetch.payload),
            title,
            air_update: fetch.air_update,
        })
    }

    /// Print the summary, then the air-quality line once it lands.
    async fn show(&self, lat: f64, lon: f64, title: Option<String>) {
        println!("Loading…");
        match self.report(lat, lon, title).await {
            Ok(report) => {
                println!("{}", report.summary);
                if let Some(handle) = report.air_update {
                    let title = report.title;
                    tokio::spawn(async move {
                        if let Some(payload) = handle.wait().await {
                            println!("{}", render::render_air_update(&title, &payload));
                        }
                    });
                }
            }
            Err(err) => report_error("Weather lookup failed", &err),
        }
    }
}

fn report_error(context: &str, err: &AppError) {
    tracing::error!("{}: {}", context, err);
    println!("{}", err.user_message());
}
