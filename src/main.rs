use clap::Parser;
use daily_tools::args::{AiSubcommand, Args, Command, ImageSubcommand, TxnSubcommand};
use daily_tools::{commands, Config, Mode, Result};
use std::process::ExitCode;
use tracing::{debug, error, trace};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    let log_level = args.common().log_level();
    init_logger(log_level);
    debug!("Log level set to {}", log_level.to_string().to_lowercase());

    match main_inner(args).await {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Exiting with error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

pub async fn main_inner(args: Args) -> Result<()> {
    trace!("{args:?}");
    let home = args.common().home().path();

    // When DAILY_TOOLS_IN_TEST_MODE is set and non-empty the canned backends are used and nothing
    // touches the network.
    let mode = Mode::from_env();

    let _: () = match args.command() {
        Command::Init(init_args) => commands::init(home, init_args.schema()).await?.print(),

        Command::Calc(calc_args) => commands::calc(calc_args.keys())?.print(),

        Command::Whoami => commands::whoami(&Config::load(home).await?).await?.print(),

        Command::Show(date_args) => {
            let config = Config::load(home).await?;
            let date = date_args.date();
            daily_tools::for_schema!(config, R => commands::show::<R>(&config, date).await?.print())
        }

        Command::Notebook(notebook_args) => {
            let config = Config::load(home).await?;
            let date = notebook_args.date();
            let text = notebook_args.text().to_string();
            daily_tools::for_schema!(config, R => {
                commands::notebook::<R>(&config, date, text).await?.print()
            })
        }

        Command::Income(income_args) => {
            let config = Config::load(home).await?;
            let date = income_args.date();
            let update = income_args.update();
            daily_tools::for_schema!(config, R => {
                commands::income::<R>(&config, date, update).await?.print()
            })
        }

        Command::Txn(txn_args) => {
            let config = Config::load(home).await?;
            match txn_args.action() {
                TxnSubcommand::Add(add) => daily_tools::for_schema!(config, R => {
                    commands::txn_add::<R>(
                        &config,
                        add.date(),
                        add.kind(),
                        add.description().to_string(),
                        add.amount().to_string(),
                    )
                    .await?
                    .print()
                }),
                TxnSubcommand::Delete(delete) => daily_tools::for_schema!(config, R => {
                    commands::txn_delete::<R>(&config, delete.date(), delete.id().to_string())
                        .await?
                        .print()
                }),
            }
        }

        Command::Image(image_args) => {
            let config = Config::load(home).await?;
            match image_args.action() {
                ImageSubcommand::Add(add) => daily_tools::for_schema!(config, R => {
                    commands::image_add::<R>(&config, add.date(), add.path(), add.text(), add.font())
                        .await?
                        .print()
                }),
            }
        }

        Command::Stats(date_args) => {
            let config = Config::load(home).await?;
            let date = date_args.date();
            daily_tools::for_schema!(config, R => commands::stats::<R>(&config, date).await?.print())
        }

        Command::Export(export_args) => {
            let config = Config::load(home).await?;
            daily_tools::for_schema!(config, R => {
                commands::export::<R>(&config, export_args.out()).await?.print()
            })
        }

        Command::Ai(ai_args) => {
            let config = Config::load(home).await?;
            // `summarize` without --text reads the stored notebook
            let stored_notebook = match ai_args.flow() {
                AiSubcommand::Summarize { date, text: None } => {
                    let date = date.date();
                    Some(daily_tools::for_schema!(config, R => {
                        commands::notebook_text::<R>(&config, date).await?
                    }))
                }
                _ => None,
            };
            let flow = ai_args.flow().flow(stored_notebook);
            commands::ai(&config, mode, flow).await?.print()
        }

        Command::Weather(weather_args) => {
            let config = Config::load(home).await?;
            if weather_args.watch() {
                commands::weather_watch(&config, mode).await?.print()
            } else {
                commands::weather(&config, mode).await?.print()
            }
        }
    };
    Ok(())
}

/// Initializes the tracing subscriber.
pub fn init_logger(level: LevelFilter) {
    let filter = match std::env::var("RUST_LOG").ok() {
        Some(_) => {
            // RUST_LOG exists; use it.
            EnvFilter::from_default_env()
        }
        None => {
            // RUST_LOG does not exist; use default log level for this crate only.
            EnvFilter::new(format!(
                "{}={},{}={}",
                env!("CARGO_CRATE_NAME"),
                level,
                "daily_tools",
                level
            ))
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
