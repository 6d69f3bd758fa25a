//! Maps weather observations to InfluxDB points and writes them in batches.
//!
//! The pieces, leaf first:
//!
//! - [`source`]: loads one [`WeatherObservation`] per input file
//! - [`mapper`]: turns an observation into a [`DataPoint`](weather_influx_client::DataPoint)
//! - [`writer`]: buffers points and drains them to a
//!   [`WriteApi`](weather_influx_client::WriteApi)
//! - [`run`](mod@run): ties the three together for a list of files

pub mod mapper;
pub mod observation;
pub mod run;
pub mod source;
pub mod writer;

pub use mapper::{PointConfig, map_observation};
pub use observation::WeatherObservation;
pub use run::{RunError, RunSummary, run};
pub use source::{JsonFileSource, RecordSource, SourceError};
pub use writer::{BatchedWriter, DEFAULT_BATCH_SIZE, WriteError};
