//! The JSON configuration file
//!
//! ```json
//! {
//!   "influxDB": {
//!     "serverUrl": "http://localhost:8086",
//!     "token": "...",
//!     "bucket": "weather",
//!     "org": "home",
//!     "measurement": "weather"
//!   }
//! }
//! ```

use std::{
    io,
    path::{Path, PathBuf},
};

use secrecy::Secret;
use serde::Deserialize;

#[derive(Debug, thiserror::Error)]
pub(crate) enum ConfigError {
    #[error("configuration file not found: {}", path.display())]
    NotFound { path: PathBuf },

    #[error("error reading configuration file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("error parsing configuration file {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Deserialize)]
pub(crate) struct Configuration {
    #[serde(rename = "influxDB")]
    pub(crate) influx_db: InfluxDbConfig,
}

/// Where and how points are written
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct InfluxDbConfig {
    pub(crate) server_url: String,
    pub(crate) token: Secret<String>,
    pub(crate) bucket: String,
    pub(crate) org: String,
    pub(crate) measurement: String,
}

impl Configuration {
    pub(crate) async fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = match tokio::fs::read(path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(ConfigError::NotFound {
                    path: path.to_path_buf(),
                });
            }
            Err(source) => {
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };

        serde_json::from_slice(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}
