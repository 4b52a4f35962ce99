//! Command handlers for the daily CLI.
//!
//! This module contains implementations for all CLI subcommands. Handlers that read or edit
//! records are generic over the record schema; `for_schema!` picks the concrete type from the
//! configuration.

mod ai;
mod calc;
mod day;
mod init;
mod stats;
mod weather;

use serde::Serialize;
use std::fmt::Debug;
use tracing::{debug, info};

pub use ai::{ai, notebook_text};
pub use calc::{calc, CalcOutput};
pub use day::{image_add, income, notebook, show, txn_add, txn_delete, DayView};
pub use init::{init, whoami};
pub use stats::{export, stats, ExportSummary};
pub use weather::{weather, weather_watch};

/// Runs `$body` with `$R` bound to the record type of the configured schema.
///
/// ```ignore
/// for_schema!(config, R => commands::show::<R>(&config, date).await?.print())
/// ```
#[macro_export]
macro_rules! for_schema {
    ($config:expr, $R:ident => $body:expr) => {
        match $config.schema() {
            $crate::model::SchemaVariant::Ledger => {
                type $R = $crate::model::LedgerDay;
                $body
            }
            $crate::model::SchemaVariant::FixedFields => {
                type $R = $crate::model::IncomeDay;
                $body
            }
            $crate::model::SchemaVariant::NotebookGallery => {
                type $R = $crate::model::NotebookDay;
                $body
            }
        }
    };
}

/// The output type for a command. This allows the command to return a consistent message,
/// optional result text for standard output and, optionally, structured data.
#[derive(Debug, Clone, Serialize)]
pub struct Out<T>
where
    T: Serialize + Clone + Debug,
{
    /// A message that can be printed to the user regarding the outcome of the command execution.
    message: String,

    /// The primary result of the command, e.g. the generated text, printed to standard output.
    output: Option<String>,

    /// Any structured data that needs to be output from the call.
    structure: Option<T>,
}

impl<T, S> From<S> for Out<T>
where
    T: Debug + Clone + Serialize,
    S: Into<String>,
{
    fn from(value: S) -> Self {
        Out::new_message(value)
    }
}

impl<T> Out<T>
where
    T: Serialize + Clone + Debug,
{
    /// Create a new `Out` object that has `Some(structure)`.
    pub fn new<S>(message: S, structure: T) -> Self
    where
        S: Into<String>,
    {
        Self {
            message: message.into(),
            output: None,
            structure: Some(structure),
        }
    }

    /// Create a new `Out` object that has `None` for `structure`.
    pub fn new_message<S>(message: S) -> Self
    where
        S: Into<String>,
    {
        Self {
            message: message.into(),
            output: None,
            structure: None,
        }
    }

    /// Sets the text printed to standard output.
    pub fn with_output(mut self, output: impl Into<String>) -> Self {
        self.output = Some(output.into());
        self
    }

    /// Get the `message`.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Get the result text.
    pub fn output(&self) -> Option<&str> {
        self.output.as_deref()
    }

    /// Get the structured data stored in `structure`.
    pub fn structure(&self) -> Option<&T> {
        self.structure.as_ref()
    }

    /// Print the message to `info!`, the result text to standard output, and the structured data
    /// (if it exists) as JSON to `debug!`.
    pub fn print(&self) {
        info!("{}", self.message);
        if let Some(output) = self.output() {
            println!("{output}");
        }
        if let Some(structure) = self.structure() {
            if let Ok(json) = serde_json::to_string_pretty(structure) {
                debug!("Command output:\n\n{json}\n\n");
            }
        }
    }
}
