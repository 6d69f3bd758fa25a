//! Where observations come from

use std::{
    fmt::Debug,
    path::{Path, PathBuf},
};

use async_trait::async_trait;

use crate::observation::WeatherObservation;

#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("error reading file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("error decoding weather observation from {}: {source}", path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Supplies one decoded [`WeatherObservation`] per input identifier
#[async_trait]
pub trait RecordSource: Debug + Send + Sync {
    async fn load(&self, path: &Path) -> Result<WeatherObservation, SourceError>;
}

/// Reads each observation from a JSON file on the local filesystem
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonFileSource;

#[async_trait]
impl RecordSource for JsonFileSource {
    async fn load(&self, path: &Path) -> Result<WeatherObservation, SourceError> {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|source| SourceError::Read {
                path: path.to_path_buf(),
                source,
            })?;

        serde_json::from_slice(&bytes).map_err(|source| SourceError::Decode {
            path: path.to_path_buf(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[tokio::test]
    async fn loads_observation_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"main": {{"temp": 4.5, "feels_like": 1.25, "pressure": 1030}}, "wind": {{"speed": 2.0}}, "dt": 42, "name": "Kiel"}}"#
        )
        .unwrap();

        let obs = JsonFileSource.load(file.path()).await.unwrap();
        assert_eq!(obs.dt, 42);
        assert_eq!(obs.main.feels_like, 1.25);
        assert_eq!(obs.name, "Kiel");
    }

    #[tokio::test]
    async fn missing_file_is_a_read_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nope.json");

        let err = JsonFileSource.load(&path).await.unwrap_err();
        assert!(matches!(&err, SourceError::Read { path: p, .. } if p == &path));
        assert!(err.to_string().contains("nope.json"));
    }

    #[tokio::test]
    async fn malformed_file_is_a_decode_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{ not json").unwrap();

        let err = JsonFileSource.load(file.path()).await.unwrap_err();
        assert!(matches!(err, SourceError::Decode { .. }));
    }
}
