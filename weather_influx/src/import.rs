//! Import observation files into the configured bucket

use std::path::PathBuf;

use clap::Parser;
use secrecy::ExposeSecret;
use tracing::info;
use weather_influx_client::Client;
use weather_influx_write::{
    BatchedWriter, DEFAULT_BATCH_SIZE, JsonFileSource, PointConfig, RunError, RunSummary, run,
};

use crate::config::{ConfigError, Configuration, InfluxDbConfig};

#[derive(Debug, thiserror::Error)]
pub(crate) enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Client(#[from] weather_influx_client::Error),

    #[error(transparent)]
    Run(#[from] RunError),
}

pub(crate) type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Parser)]
pub(crate) struct Config {
    /// Path of the JSON configuration file naming the InfluxDB server, token,
    /// organization, bucket and measurement
    #[clap(short = 'c', long = "config", env = "WEATHER_INFLUX_CONFIG")]
    pub(crate) config_path: PathBuf,

    /// City written as the `Stadt` tag of every point
    #[clap(short = 's', long = "city", env = "WEATHER_INFLUX_CITY", default_value = "")]
    pub(crate) city: String,

    /// OpenWeatherMap observation files, written in the order given
    #[clap(value_name = "FILE")]
    pub(crate) files: Vec<PathBuf>,
}

pub(crate) async fn command(config: Config) -> Result<RunSummary> {
    let Config {
        config_path,
        city,
        files,
    } = config;

    let InfluxDbConfig {
        server_url,
        token,
        bucket,
        org,
        measurement,
    } = Configuration::load(&config_path).await?.influx_db;

    info!(
        server_url = %server_url,
        org = %org,
        bucket = %bucket,
        measurement = %measurement,
        files = files.len(),
        "starting import"
    );

    let api = Client::new(server_url.as_str())?
        .with_auth_token(token.expose_secret().as_str())
        .bucket_writer(org, bucket);
    let writer = BatchedWriter::new(api, DEFAULT_BATCH_SIZE);

    let summary = run(
        &PointConfig::new(measurement),
        &JsonFileSource,
        &files,
        &city,
        writer,
    )
    .await?;

    Ok(summary)
}
