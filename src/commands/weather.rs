use crate::api::{self, Forecast, Mode, WeatherSource};
use crate::commands::Out;
use crate::error::{ErrorType, IntoResult};
use crate::{Config, Result};
use std::time::Duration;
use tracing::{info, warn};

/// Shows the current conditions and today's forecast.
pub async fn weather(config: &Config, mode: Mode) -> Result<Out<Forecast>> {
    let source = api::weather_source(config, mode);
    fetch(source.as_ref()).await
}

/// Shows the forecast and refreshes it on the configured interval until interrupted. A failed
/// refresh is logged and the previous forecast stays on screen.
pub async fn weather_watch(config: &Config, mode: Mode) -> Result<Out<()>> {
    let source = api::weather_source(config, mode);
    let minutes = u64::from(config.weather().refresh_minutes.max(1));
    let mut interval = tokio::time::interval(Duration::from_secs(minutes * 60));
    info!("Refreshing the forecast every {minutes} minute(s), press Ctrl-C to stop");
    loop {
        tokio::select! {
            _ = interval.tick() => match fetch(source.as_ref()).await {
                Ok(out) => out.print(),
                Err(e) => warn!("Unable to refresh the forecast: {e:#}"),
            },
            _ = tokio::signal::ctrl_c() => break,
        }
    }
    Ok("Stopped watching the weather".into())
}

async fn fetch(source: &dyn WeatherSource) -> Result<Out<Forecast>> {
    let forecast = source.fetch().await.pub_result(ErrorType::Backend)?;
    let output = forecast.to_string();
    Ok(Out::new("Weather forecast", forecast).with_output(output.trim_end()))
}
