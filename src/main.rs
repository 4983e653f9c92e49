mod error_mapping;
mod render;
mod session;
mod settings;

use anyhow::Result;
use skycast_core::Config;
use skycast_weather::WeatherProvider;

use crate::error_mapping::LookupErrorExt;
use crate::session::Session;

#[tokio::main]
async fn main() -> Result<()> {
    skycast_core::init()?;

    let (config, _warnings) = Config::load_validated()?;
    tracing::debug!("Config directory: {}", config.config_dir.display());

    let provider = match WeatherProvider::new(settings::weather_settings(&config.weather)) {
        Ok(provider) => provider,
        Err(e) => {
            let err = e.into_app_error();
            anyhow::bail!("{} ({})", err.user_message(), err);
        }
    };

    tracing::info!("SkyCast started");
    println!("SkyCast - terminal weather");

    Session::new(provider, config.ui.place_language.clone())
        .run()
        .await?;

    tracing::info!("SkyCast stopped");
    Ok(())
}
