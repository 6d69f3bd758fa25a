//! Entrypoint of the weather_influx binary
#![deny(rustdoc::broken_intra_doc_links, rustdoc::bare_urls, rust_2018_idioms)]
#![warn(
    missing_debug_implementations,
    clippy::explicit_iter_loop,
    clippy::use_self,
    clippy::clone_on_ref_ptr,
    clippy::future_not_send
)]

use std::io::IsTerminal;

use dotenvy::dotenv;

mod config;
mod import;
mod logging;

enum ReturnCode {
    Failure = 1,
}

#[derive(Debug, clap::Parser)]
#[clap(
    name = "weather_influx",
    version,
    about = "Write OpenWeatherMap observations to InfluxDB",
    long_about = r#"Write OpenWeatherMap observations to InfluxDB

Each file holds one "current weather" JSON document. Every document becomes
one point in the configured measurement, tagged with the given city.

Examples:
    # Import two observations for Berlin
    weather_influx -c config.json -s Berlin 2023-11-14T22.json 2023-11-14T23.json

    # Same, with debug logging
    weather_influx -vv -c config.json -s Berlin observations/*.json
"#
)]
struct Cli {
    #[clap(flatten)]
    import_config: import::Config,

    #[clap(flatten)]
    logging_config: logging::LoggingConfig,
}

fn main() -> Result<(), std::io::Error> {
    // load all environment variables from .env before doing anything
    load_dotenv();

    let config: Cli = clap::Parser::parse();

    if let Err(e) = logging::Builder::new()
        .with_default_log_filter("info")
        .with_ansi(std::io::stderr().is_terminal())
        .with_logging_config(&config.logging_config)
        .install_global()
    {
        eprintln!("Initializing logs failed: {e}");
        std::process::exit(ReturnCode::Failure as _);
    }

    // one logical thread drives the whole import
    let tokio_runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    tokio_runtime.block_on(async move {
        match import::command(config.import_config).await {
            Ok(summary) => println!(
                "wrote {} point(s) from {} file(s) in {} batch(es)",
                summary.points_written, summary.files_processed, summary.batches_written
            ),
            Err(e) => {
                eprintln!("Import failed: {e}");
                std::process::exit(ReturnCode::Failure as _)
            }
        }
    });

    Ok(())
}

/// Source the .env file before initialising the Cli struct - this sets
/// any envs in the file, which the Cli struct then uses.
///
/// Precedence is given to existing env variables.
fn load_dotenv() {
    match dotenv() {
        Ok(_) => {}
        Err(dotenvy::Error::Io(err)) if err.kind() == std::io::ErrorKind::NotFound => {
            // Ignore this - a missing env file is not an error, defaults will
            // be applied when initialising the Cli struct.
        }
        Err(e) => {
            eprintln!("FATAL Error loading config from: {e}");
            eprintln!("Aborting");
            std::process::exit(1);
        }
    };
}
