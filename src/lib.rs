pub mod annotate;
pub mod api;
pub mod args;
mod backup;
pub mod calculator;
pub mod commands;
mod config;
mod error;
pub mod flow;
pub mod model;
pub mod pipeline;
pub mod store;
mod utils;
pub mod views;

pub use api::Mode;
pub use config::{Config, WeatherSettings};
pub use error::{error_type, Error, ErrorType, Result};
