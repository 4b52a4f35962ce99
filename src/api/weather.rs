use crate::api::WeatherSource;
use crate::config::WeatherSettings;
use crate::Result;
use anyhow::{bail, Context};
use async_trait::async_trait;
use chrono::{Local, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use tracing::debug;
use url::Url;

const FORECAST_URL: &str = "https://api.open-meteo.com/v1/forecast";
const VARIABLES: &str = "temperature_2m,weather_code";
const TIME_FORMAT: &str = "%Y-%m-%dT%H:%M";

/// The fixed icon taxonomy that weather codes are mapped onto.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeatherIcon {
    ClearDay,
    ClearNight,
    PartlyCloudy,
    Cloudy,
    Fog,
    Drizzle,
    Rain,
    Snow,
    Thunderstorm,
}

impl WeatherIcon {
    pub fn symbol(&self) -> &'static str {
        match self {
            WeatherIcon::ClearDay => "☀️",
            WeatherIcon::ClearNight => "🌙",
            WeatherIcon::PartlyCloudy => "🌤️",
            WeatherIcon::Cloudy => "☁️",
            WeatherIcon::Fog => "🌫️",
            WeatherIcon::Drizzle => "🌦️",
            WeatherIcon::Rain => "🌧️",
            WeatherIcon::Snow => "❄️",
            WeatherIcon::Thunderstorm => "⛈️",
        }
    }
}

/// Maps a WMO weather interpretation code to an icon. `hour` (0-23, local) decides between the
/// day and night variants of clear sky; night is 19:00 to 05:59. Unknown codes are shown as
/// cloudy.
pub fn icon_for(code: u8, hour: u32) -> WeatherIcon {
    let night = !(6..19).contains(&hour);
    match code {
        0 if night => WeatherIcon::ClearNight,
        0 => WeatherIcon::ClearDay,
        1 | 2 => WeatherIcon::PartlyCloudy,
        3 => WeatherIcon::Cloudy,
        45 | 48 => WeatherIcon::Fog,
        51..=57 => WeatherIcon::Drizzle,
        61..=67 | 80..=82 => WeatherIcon::Rain,
        71..=77 | 85 | 86 => WeatherIcon::Snow,
        95..=99 => WeatherIcon::Thunderstorm,
        _ => WeatherIcon::Cloudy,
    }
}

/// One hour of the forecast.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HourlyEntry {
    pub time: NaiveDateTime,
    pub temperature: f64,
    pub code: u8,
    pub icon: WeatherIcon,
}

/// Current conditions plus the hourly entries for today.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Forecast {
    pub current_temperature: f64,
    pub current_code: u8,
    pub current_icon: WeatherIcon,
    pub hourly: Vec<HourlyEntry>,
}

impl Forecast {
    /// Every third hour starting at 01:00, the way the widget shows the day.
    pub fn highlights(&self) -> impl Iterator<Item = &HourlyEntry> {
        self.hourly.iter().filter(|h| h.time.hour() % 3 == 1)
    }
}

impl Display for Forecast {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        writeln!(
            f,
            "Now: {} {:.0}°C",
            self.current_icon.symbol(),
            self.current_temperature
        )?;
        for entry in self.highlights() {
            writeln!(
                f,
                "{}  {}  {:.0}°C",
                entry.time.format("%H:%M"),
                entry.icon.symbol(),
                entry.temperature
            )?;
        }
        Ok(())
    }
}

/// Reads the forecast from the Open-Meteo HTTP API.
pub struct OpenMeteo {
    settings: WeatherSettings,
    client: reqwest::Client,
}

impl OpenMeteo {
    pub fn new(settings: WeatherSettings) -> Self {
        Self {
            settings,
            client: reqwest::Client::new(),
        }
    }

    fn url(&self) -> Result<Url> {
        let mut url = Url::parse(FORECAST_URL).context("Invalid forecast URL")?;
        url.query_pairs_mut()
            .append_pair("latitude", &self.settings.latitude.to_string())
            .append_pair("longitude", &self.settings.longitude.to_string())
            .append_pair("current", VARIABLES)
            .append_pair("hourly", VARIABLES)
            .append_pair("timezone", &self.settings.timezone)
            .append_pair("forecast_days", "1");
        Ok(url)
    }
}

#[async_trait]
impl WeatherSource for OpenMeteo {
    async fn fetch(&self) -> Result<Forecast> {
        let url = self.url()?;
        debug!("Fetching the forecast from {url}");
        let response = self
            .client
            .get(url)
            .send()
            .await
            .context("Failed to send the forecast request")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read response body".to_string());
            bail!("The forecast request failed with status {status}: {body}");
        }

        let body: ForecastResponse = response
            .json()
            .await
            .context("Unable to parse the forecast response")?;
        body.into_forecast()
    }
}

/// Canned forecast data for `Mode::Test`.
pub struct TestWeather;

/// (hour, temperature, code)
const TEST_DATA: &[(u32, f64, u8)] = &[
    (1, 26.0, 0),
    (4, 25.0, 3),
    (7, 27.0, 0),
    (10, 31.0, 1),
    (13, 34.0, 80),
    (16, 32.0, 2),
    (19, 29.0, 3),
    (22, 28.0, 0),
];

#[async_trait]
impl WeatherSource for TestWeather {
    async fn fetch(&self) -> Result<Forecast> {
        let today = Local::now().date_naive();
        let hourly = TEST_DATA
            .iter()
            .filter_map(|&(hour, temperature, code)| {
                let time = today.and_hms_opt(hour, 0, 0)?;
                Some(HourlyEntry {
                    time,
                    temperature,
                    code,
                    icon: icon_for(code, hour),
                })
            })
            .collect();
        Ok(Forecast {
            current_temperature: 31.0,
            current_code: 1,
            current_icon: icon_for(1, 10),
            hourly,
        })
    }
}

#[derive(Debug, Deserialize)]
struct ForecastResponse {
    current: CurrentBlock,
    hourly: HourlyBlock,
}

#[derive(Debug, Deserialize)]
struct CurrentBlock {
    time: String,
    temperature_2m: f64,
    weather_code: u8,
}

#[derive(Debug, Deserialize)]
struct HourlyBlock {
    time: Vec<String>,
    temperature_2m: Vec<f64>,
    weather_code: Vec<u8>,
}

impl ForecastResponse {
    fn into_forecast(self) -> Result<Forecast> {
        let current_time = parse_time(&self.current.time)?;
        let HourlyBlock {
            time,
            temperature_2m,
            weather_code,
        } = self.hourly;
        if time.len() != temperature_2m.len() || time.len() != weather_code.len() {
            bail!(
                "The hourly forecast arrays have different lengths: {}, {} and {}",
                time.len(),
                temperature_2m.len(),
                weather_code.len()
            );
        }
        let hourly = time
            .iter()
            .zip(temperature_2m)
            .zip(weather_code)
            .map(|((time, temperature), code)| {
                let time = parse_time(time)?;
                Ok(HourlyEntry {
                    icon: icon_for(code, time.hour()),
                    time,
                    temperature,
                    code,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Forecast {
            current_temperature: self.current.temperature_2m,
            current_code: self.current.weather_code,
            current_icon: icon_for(self.current.weather_code, current_time.hour()),
            hourly,
        })
    }
}

fn parse_time(s: &str) -> Result<NaiveDateTime> {
    NaiveDateTime::parse_from_str(s, TIME_FORMAT)
        .with_context(|| format!("Invalid forecast time '{s}'"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_icon_for_day_and_night() {
        assert_eq!(icon_for(0, 12), WeatherIcon::ClearDay);
        assert_eq!(icon_for(0, 6), WeatherIcon::ClearDay);
        assert_eq!(icon_for(0, 18), WeatherIcon::ClearDay);
        assert_eq!(icon_for(0, 19), WeatherIcon::ClearNight);
        assert_eq!(icon_for(0, 5), WeatherIcon::ClearNight);
        assert_eq!(icon_for(0, 0), WeatherIcon::ClearNight);
    }

    #[test]
    fn test_icon_for_codes() {
        assert_eq!(icon_for(2, 12), WeatherIcon::PartlyCloudy);
        assert_eq!(icon_for(3, 12), WeatherIcon::Cloudy);
        assert_eq!(icon_for(48, 12), WeatherIcon::Fog);
        assert_eq!(icon_for(53, 12), WeatherIcon::Drizzle);
        assert_eq!(icon_for(63, 12), WeatherIcon::Rain);
        assert_eq!(icon_for(81, 12), WeatherIcon::Rain);
        assert_eq!(icon_for(75, 12), WeatherIcon::Snow);
        assert_eq!(icon_for(95, 23), WeatherIcon::Thunderstorm);
        assert_eq!(icon_for(200, 12), WeatherIcon::Cloudy);
    }

    #[test]
    fn test_url() {
        let source = OpenMeteo::new(WeatherSettings::default());
        let url = source.url().unwrap();
        let pairs: Vec<(String, String)> = url
            .query_pairs()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        assert!(url.as_str().starts_with(FORECAST_URL));
        assert!(pairs.contains(&("latitude".to_string(), "13.7563".to_string())));
        assert!(pairs.contains(&("longitude".to_string(), "100.5018".to_string())));
        assert!(pairs.contains(&("current".to_string(), VARIABLES.to_string())));
        assert!(pairs.contains(&("hourly".to_string(), VARIABLES.to_string())));
        assert!(pairs.contains(&("timezone".to_string(), "Asia/Bangkok".to_string())));
        assert!(pairs.contains(&("forecast_days".to_string(), "1".to_string())));
    }

    #[test]
    fn test_parse_response() {
        let json = r#"{
            "latitude": 13.75, "longitude": 100.5,
            "current": {"time": "2025-10-20T21:00", "interval": 900, "temperature_2m": 28.4, "weather_code": 0},
            "hourly": {
                "time": ["2025-10-20T00:00", "2025-10-20T01:00", "2025-10-20T13:00"],
                "temperature_2m": [26.1, 25.8, 34.2],
                "weather_code": [0, 3, 95]
            }
        }"#;
        let body: ForecastResponse = serde_json::from_str(json).unwrap();
        let forecast = body.into_forecast().unwrap();
        assert_eq!(forecast.current_icon, WeatherIcon::ClearNight);
        assert_eq!(forecast.hourly.len(), 3);
        assert_eq!(forecast.hourly[2].icon, WeatherIcon::Thunderstorm);
        let highlights: Vec<u32> = forecast.highlights().map(|h| h.time.hour()).collect();
        assert_eq!(highlights, vec![1, 13]);
    }

    #[test]
    fn test_parse_response_mismatched_lengths() {
        let json = r#"{
            "current": {"time": "2025-10-20T21:00", "temperature_2m": 28.4, "weather_code": 0},
            "hourly": {"time": ["2025-10-20T00:00"], "temperature_2m": [], "weather_code": [0]}
        }"#;
        let body: ForecastResponse = serde_json::from_str(json).unwrap();
        assert!(body.into_forecast().is_err());
    }

    #[tokio::test]
    async fn test_test_weather() {
        let forecast = TestWeather.fetch().await.unwrap();
        assert_eq!(forecast.hourly.len(), 8);
        assert_eq!(forecast.highlights().count(), 8);
        assert!(forecast.to_string().starts_with("Now: "));
    }
}
