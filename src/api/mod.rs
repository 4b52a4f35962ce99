//! External collaborators: the generative-language backend and the weather data source.
//!
//! Both sit behind a trait so the rest of the program never knows which implementation it talks
//! to. In `Mode::Test` the canned in-process implementations are used and nothing touches the
//! network.

mod echo;
mod gemini;
mod weather;

use crate::error::{ErrorType, IntoResult};
use crate::{Config, Result};
use async_trait::async_trait;

pub use echo::EchoBackend;
pub use gemini::GeminiBackend;
pub use weather::{icon_for, Forecast, HourlyEntry, OpenMeteo, TestWeather, WeatherIcon};

/// When this environment variable is set and non-empty the program runs in `Mode::Test`.
pub const TEST_MODE_ENV: &str = "DAILY_TOOLS_IN_TEST_MODE";

/// Selects the real network collaborators or the canned in-process ones.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    #[default]
    Live,
    Test,
}

impl Mode {
    pub fn from_env() -> Self {
        match std::env::var(TEST_MODE_ENV) {
            Ok(value) if !value.is_empty() => Mode::Test,
            _ => Mode::Live,
        }
    }
}

/// A black-box text generator: one prompt in, one block of text out.
#[async_trait]
pub trait Backend: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String>;
}

/// A read-only source of the current conditions and today's hourly forecast.
#[async_trait]
pub trait WeatherSource: Send + Sync {
    async fn fetch(&self) -> Result<Forecast>;
}

/// Creates the generative backend for `mode`. The live backend needs an API key.
pub async fn backend(config: &Config, mode: Mode) -> Result<Box<dyn Backend>> {
    match mode {
        Mode::Live => {
            let api_key = config.api_key().await.pub_result(ErrorType::Config)?;
            Ok(Box::new(GeminiBackend::new(config.model(), api_key)))
        }
        Mode::Test => Ok(Box::new(EchoBackend::default())),
    }
}

/// Creates the weather source for `mode`.
pub fn weather_source(config: &Config, mode: Mode) -> Box<dyn WeatherSource> {
    match mode {
        Mode::Live => Box::new(OpenMeteo::new(config.weather().clone())),
        Mode::Test => Box::new(TestWeather),
    }
}
