//! Plain-text rendering of weather payloads.

use std::fmt::Write;

use skycast_weather::{
    day_label, format_pressure, format_wind, kelvin_to_celsius, local_time_hm, Condition, Place,
    WeatherPayload,
};

/// Order of the `:find` candidate list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    Ascending,
    Descending,
}

/// Title for a geocoded place, preferring a localized name when asked for one.
pub fn place_title(place: &Place, language: Option<&str>) -> String {
    language
        .and_then(|lang| place.local_name(lang))
        .map(str::to_string)
        .unwrap_or_else(|| place.label())
}

/// Geocoding candidates paired with their titles, ordered by title.
///
/// Comparison ignores case. Equal titles keep the provider's order.
pub fn sorted_candidates(
    places: &[Place],
    language: Option<&str>,
    order: SortOrder,
) -> Vec<(String, Place)> {
    let mut candidates: Vec<(String, Place)> = places
        .iter()
        .map(|place| (place_title(place, language), place.clone()))
        .collect();
    candidates.sort_by(|(a, _), (b, _)| {
        let ord = a.to_lowercase().cmp(&b.to_lowercase());
        match order {
            SortOrder::Ascending => ord,
            SortOrder::Descending => ord.reverse(),
        }
    });
    candidates
}

/// Numbered candidate list, one per line.
pub fn render_candidates(candidates: &[(String, Place)]) -> String {
    candidates
        .iter()
        .enumerate()
        .map(|(i, (title, place))| {
            format!("  {}. {}  ({:.4}, {:.4})", i + 1, title, place.lat, place.lon)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Full summary: current conditions, hourly and daily strips, air quality.
pub fn render_weather(title: &str, payload: &WeatherPayload) -> String {
    let current = &payload.current;
    let tz = current.timezone;

    let mut out = String::new();
    let _ = writeln!(out, "{}", title);
    let _ = writeln!(
        out,
        "  {}, {}°C (feels like {}°C)",
        capitalize(current.description()),
        kelvin_to_celsius(current.main.temp),
        kelvin_to_celsius(current.main.feels_like),
    );
    let _ = writeln!(
        out,
        "  Wind {}  Humidity {}%  Pressure {}",
        format_wind(current.wind.speed),
        current.main.humidity,
        format_pressure(current.main.pressure),
    );
    if current.dt > 0 {
        let _ = writeln!(out, "  Observed at {} local time", local_time_hm(current.dt, tz));
    }
    if let Some(url) = current.condition().and_then(Condition::icon_url) {
        let _ = writeln!(out, "  Icon: {}", url);
    }

    match &payload.forecast {
        Some(forecast) if !forecast.list.is_empty() => {
            let hourly: Vec<String> = forecast
                .hourly()
                .iter()
                .map(|s| format!("{} {}°", local_time_hm(s.dt, tz), kelvin_to_celsius(s.main.temp)))
                .collect();
            let _ = writeln!(out, "  Hourly: {}", hourly.join("  "));

            let daily: Vec<String> = forecast
                .daily()
                .iter()
                .map(|s| format!("{} {}°", day_label(s.dt), kelvin_to_celsius(s.main.temp)))
                .collect();
            let _ = writeln!(out, "  Daily:  {}", daily.join(" | "));
        }
        _ => {
            let _ = writeln!(out, "  Forecast: No data");
        }
    }

    let _ = write!(out, "  {}", render_air(payload));
    out
}

/// Air-quality line, "No data" until the reading arrives.
pub fn render_air(payload: &WeatherPayload) -> String {
    format!("Air quality: {}", payload.air_summary())
}

/// Line printed when a reading lands after the summary.
pub fn render_air_update(title: &str, payload: &WeatherPayload) -> String {
    format!("{}: {}", title, render_air(payload))
}
