//! These structs provide the CLI interface for the daily CLI.

use crate::flow::{ContentKind, Flow, TargetModel};
use crate::model::{Amount, DateKey, IncomeUpdate, SchemaVariant, TransactionType};
use clap::{Parser, Subcommand};
use std::convert::Infallible;
use std::fmt::{Display, Formatter};
use std::ops::Deref;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::error;
use tracing_subscriber::filter::LevelFilter;

/// daily: a daily notebook and income tracker for the command line.
///
/// Every day gets one record, keyed by its date. Depending on the schema chosen at `daily init`,
/// a record holds income and expense transactions, a fixed set of income fields, or a gallery of
/// images, and always a free-text notebook entry. Records are kept in a single JSON file in the
/// data directory.
///
/// The `ai` commands send short fixed prompts to a hosted generative model. Set GEMINI_API_KEY or
/// write your key to $DAILY_HOME/.secrets/api_key to use them.
#[derive(Debug, Parser, Clone)]
pub struct Args {
    #[clap(flatten)]
    common: Common,

    #[command(subcommand)]
    command: Command,
}

impl Args {
    pub fn new(common: Common, command: Command) -> Self {
        Self { common, command }
    }

    pub fn common(&self) -> &Common {
        &self.common
    }

    pub fn command(&self) -> &Command {
        &self.command
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Create the data directory and the configuration file.
    ///
    /// This is the first command you should run. The schema decides what a daily record holds
    /// and cannot be changed afterwards:
    ///
    /// - ledger: income and expense transactions
    ///
    /// - fixed-fields: ID photos, photo editing, design work and other income
    ///
    /// - notebook-gallery: a gallery of images
    Init(InitArgs),
    /// Print the record of a day and its total.
    Show(DateArgs),
    /// Replace the notebook text of a day.
    Notebook(NotebookArgs),
    /// Set income fields of a day (fixed-fields schema).
    Income(IncomeArgs),
    /// Add or delete transactions (ledger schema).
    Txn(TxnArgs),
    /// Add images to the gallery (notebook-gallery schema).
    Image(ImageArgs),
    /// Print the total and daily average for the month of a day.
    Stats(DateArgs),
    /// Export every stored day to a CSV file.
    Export(ExportArgs),
    /// Generate text with the hosted model.
    Ai(AiArgs),
    /// Press calculator keys and print the display, e.g. `daily calc 12+3=`.
    Calc(CalcArgs),
    /// Print the weather forecast.
    Weather(WeatherArgs),
    /// Print your user id.
    Whoami,
}

/// Arguments common to all subcommands.
#[derive(Debug, Parser, Clone)]
pub struct Common {
    /// The logging verbosity. One of, from least to most verbose:
    /// off, error, warn, info, debug, trace
    ///
    /// This can be overridden by RUST_LOG.
    #[arg(long, default_value_t = LevelFilter::INFO)]
    log_level: LevelFilter,

    /// The directory where data and configuration is held. Defaults to ~/daily-tools
    #[arg(long, env = "DAILY_HOME", default_value_t = default_home())]
    home: DisplayPath,
}

impl Common {
    pub fn new(log_level: LevelFilter, home: PathBuf) -> Self {
        Self {
            log_level,
            home: home.into(),
        }
    }

    pub fn log_level(&self) -> LevelFilter {
        self.log_level
    }

    pub fn home(&self) -> &DisplayPath {
        &self.home
    }
}

/// (Not shown): Args for the `daily init` command.
#[derive(Debug, Parser, Clone)]
pub struct InitArgs {
    /// The daily record schema.
    #[arg(long, value_enum, default_value_t = SchemaVariant::Ledger)]
    schema: SchemaVariant,
}

impl InitArgs {
    pub fn new(schema: SchemaVariant) -> Self {
        Self { schema }
    }

    pub fn schema(&self) -> SchemaVariant {
        self.schema
    }
}

/// (Not shown): Selects a day. Used by several commands.
#[derive(Debug, Parser, Clone)]
pub struct DateArgs {
    /// The day, as YYYY-MM-DD. Defaults to today.
    #[arg(long, default_value_t = DateKey::today())]
    date: DateKey,
}

impl DateArgs {
    pub fn new(date: DateKey) -> Self {
        Self { date }
    }

    pub fn date(&self) -> DateKey {
        self.date
    }
}

/// (Not shown): Args for the `daily notebook` command.
#[derive(Debug, Parser, Clone)]
pub struct NotebookArgs {
    #[clap(flatten)]
    date: DateArgs,

    /// The new notebook text. An empty string clears it.
    #[arg(long)]
    text: String,
}

impl NotebookArgs {
    pub fn date(&self) -> DateKey {
        self.date.date()
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}

/// (Not shown): Args for the `daily income` command. Fields that are not given keep their value.
#[derive(Debug, Parser, Clone)]
pub struct IncomeArgs {
    #[clap(flatten)]
    date: DateArgs,

    /// Number of ID photos taken. Each is worth a fixed price.
    #[arg(long)]
    id_photos: Option<u32>,

    /// Photo editing income.
    #[arg(long)]
    photo_editing: Option<Amount>,

    /// Design work income.
    #[arg(long)]
    design_work: Option<Amount>,

    /// Any other income.
    #[arg(long)]
    other_income: Option<Amount>,
}

impl IncomeArgs {
    pub fn date(&self) -> DateKey {
        self.date.date()
    }

    pub fn update(&self) -> IncomeUpdate {
        IncomeUpdate {
            id_photos: self.id_photos,
            photo_editing: self.photo_editing,
            design_work: self.design_work,
            other_income: self.other_income,
        }
    }
}

/// (Not shown): Args for the `daily txn` command.
#[derive(Debug, Parser, Clone)]
pub struct TxnArgs {
    #[command(subcommand)]
    action: TxnSubcommand,
}

impl TxnArgs {
    pub fn action(&self) -> &TxnSubcommand {
        &self.action
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum TxnSubcommand {
    /// Add a transaction.
    Add(TxnAddArgs),
    /// Delete a transaction by its id, as printed by `daily show`.
    Delete(TxnDeleteArgs),
}

/// (Not shown): Args for the `daily txn add` command.
#[derive(Debug, Parser, Clone)]
pub struct TxnAddArgs {
    #[clap(flatten)]
    date: DateArgs,

    /// Whether the money came in or went out.
    #[arg(long = "type", value_enum)]
    kind: TransactionType,

    /// What the transaction was for.
    #[arg(long)]
    description: String,

    /// The amount, without a sign. Currency symbols and thousands separators are accepted.
    #[arg(long)]
    amount: String,
}

impl TxnAddArgs {
    pub fn date(&self) -> DateKey {
        self.date.date()
    }

    pub fn kind(&self) -> TransactionType {
        self.kind
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn amount(&self) -> &str {
        &self.amount
    }
}

/// (Not shown): Args for the `daily txn delete` command.
#[derive(Debug, Parser, Clone)]
pub struct TxnDeleteArgs {
    #[clap(flatten)]
    date: DateArgs,

    /// The transaction id, e.g. txn-1760952600000
    #[arg(long)]
    id: String,
}

impl TxnDeleteArgs {
    pub fn date(&self) -> DateKey {
        self.date.date()
    }

    pub fn id(&self) -> &str {
        &self.id
    }
}

/// (Not shown): Args for the `daily image` command.
#[derive(Debug, Parser, Clone)]
pub struct ImageArgs {
    #[command(subcommand)]
    action: ImageSubcommand,
}

impl ImageArgs {
    pub fn action(&self) -> &ImageSubcommand {
        &self.action
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum ImageSubcommand {
    /// Add an image file (png, jpeg, gif or webp) to the gallery.
    Add(ImageAddArgs),
}

/// (Not shown): Args for the `daily image add` command.
#[derive(Debug, Parser, Clone)]
pub struct ImageAddArgs {
    #[clap(flatten)]
    date: DateArgs,

    /// The image file.
    #[arg(long)]
    path: PathBuf,

    /// A caption drawn over the bottom of the image. The image is then stored as PNG.
    #[arg(long)]
    text: Option<String>,

    /// The TrueType or OpenType font for the caption. Defaults to an installed bold sans-serif.
    #[arg(long, requires = "text")]
    font: Option<PathBuf>,
}

impl ImageAddArgs {
    pub fn date(&self) -> DateKey {
        self.date.date()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    pub fn font(&self) -> Option<&Path> {
        self.font.as_deref()
    }
}

/// (Not shown): Args for the `daily export` command.
#[derive(Debug, Parser, Clone)]
pub struct ExportArgs {
    /// Where to write the CSV file.
    #[arg(long)]
    out: PathBuf,
}

impl ExportArgs {
    pub fn out(&self) -> &Path {
        &self.out
    }
}

/// (Not shown): Args for the `daily ai` command.
#[derive(Debug, Parser, Clone)]
pub struct AiArgs {
    #[command(subcommand)]
    flow: AiSubcommand,
}

impl AiArgs {
    pub fn flow(&self) -> &AiSubcommand {
        &self.flow
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum AiSubcommand {
    /// Break a goal down into 3 actionable steps.
    Plan {
        /// The goal to plan for.
        #[arg(long)]
        goal: String,
    },
    /// Expand a simple idea into a detailed prompt for a generative model.
    Prompt {
        /// The idea to expand.
        #[arg(long)]
        idea: String,

        /// The model the prompt is for.
        #[arg(long, value_enum, default_value_t = TargetModel::Imagen3)]
        model: TargetModel,
    },
    /// Summarize a notebook entry into 3 bullet points.
    Summarize {
        #[clap(flatten)]
        date: DateArgs,

        /// The text to summarize. Defaults to the notebook of --date.
        #[arg(long)]
        text: Option<String>,
    },
    /// Write marketing copy.
    Content {
        /// What the copy is about.
        #[arg(long)]
        description: String,

        /// The kind of copy to write.
        #[arg(long, value_enum, default_value_t = ContentKind::FacebookPost)]
        kind: ContentKind,
    },
}

impl AiSubcommand {
    /// The flow to run. `summarize` without `--text` uses `stored_notebook`, the notebook of its
    /// `--date`.
    pub fn flow(&self, stored_notebook: Option<String>) -> Flow {
        match self {
            AiSubcommand::Plan { goal } => Flow::GoalPlan { goal: goal.clone() },
            AiSubcommand::Prompt { idea, model } => Flow::PromptIdea {
                idea: idea.clone(),
                model: *model,
            },
            AiSubcommand::Summarize { text, .. } => Flow::NotebookSummary {
                notebook_text: text.clone().or(stored_notebook).unwrap_or_default(),
            },
            AiSubcommand::Content { description, kind } => Flow::MarketingCopy {
                description: description.clone(),
                kind: *kind,
            },
        }
    }
}

/// (Not shown): Args for the `daily calc` command.
#[derive(Debug, Parser, Clone)]
pub struct CalcArgs {
    /// Keys to press: digits, '.', '+', '-', '*', '/', '=' and 'C' to clear.
    #[arg(required = true, allow_hyphen_values = true, num_args = 1..)]
    keys: Vec<String>,
}

impl CalcArgs {
    pub fn keys(&self) -> &[String] {
        &self.keys
    }
}

/// (Not shown): Args for the `daily weather` command.
#[derive(Debug, Parser, Clone)]
pub struct WeatherArgs {
    /// Keep running and refresh on the configured interval.
    #[arg(long)]
    watch: bool,
}

impl WeatherArgs {
    pub fn watch(&self) -> bool {
        self.watch
    }
}

fn default_home() -> DisplayPath {
    DisplayPath(match dirs::home_dir() {
        Some(home) => home.join("daily-tools"),
        None => {
            error!(
                "There was an error when trying to get your home directory. You can get around \
                this by providing --home or DAILY_HOME instead of relying on the default data \
                directory. If you continue using the program right now, you may have problems!",
            );
            PathBuf::from("daily-tools")
        }
    })
}

#[derive(Debug, Default, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct DisplayPath(PathBuf);

impl From<PathBuf> for DisplayPath {
    fn from(value: PathBuf) -> Self {
        DisplayPath(value)
    }
}

impl Deref for DisplayPath {
    type Target = Path;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl AsRef<Path> for DisplayPath {
    fn as_ref(&self) -> &Path {
        &self.0
    }
}

impl Display for DisplayPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.to_string_lossy())
    }
}

impl FromStr for DisplayPath {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(PathBuf::from(s)))
    }
}

impl DisplayPath {
    pub fn path(&self) -> &Path {
        &self.0
    }
}
