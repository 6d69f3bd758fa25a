//! Log setup
//!
//! Logs are written to stderr so that stdout only carries the run summary.

use std::{fmt, io, str::FromStr};

use tracing_subscriber::{EnvFilter, Layer, Registry, prelude::*};

#[derive(Debug, thiserror::Error)]
pub(crate) enum Error {
    #[error("invalid log filter '{filter}': {source}")]
    InvalidFilter {
        filter: String,
        #[source]
        source: tracing_subscriber::filter::ParseError,
    },

    #[error("cannot set global tracing subscriber: {0}")]
    SetGlobalDefault(#[from] tracing::subscriber::SetGlobalDefaultError),
}

pub(crate) type Result<T, E = Error> = std::result::Result<T, E>;

/// CLI config for the logging related subset of options.
#[derive(Debug, Clone, clap::Parser)]
pub(crate) struct LoggingConfig {
    /// Logs: filter directive
    ///
    /// Configures log severity level filter, by target.
    ///
    /// Simplest options: error, warn, info, debug, trace
    ///
    /// Levels for different modules can be specified. For example
    /// `debug,hyper::proto::h1=info` specifies debug logging for all modules
    /// except for the `hyper::proto::h1` module which will only display info
    /// level logging.
    ///
    /// Overridden by `-v`.
    #[clap(long = "log-filter", env = "LOG_FILTER")]
    pub(crate) log_filter: Option<String>,

    /// Logs: filter short-hand
    ///
    /// Convenient way to set log severity level filter.
    /// Overrides `--log-filter`.
    ///
    /// -v   'info'
    ///
    /// -vv  'debug,hyper::proto::h1=info,h2=info'
    ///
    /// -vvv 'trace,hyper::proto::h1=info,h2=info'
    #[clap(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
    pub(crate) log_verbose_count: u8,

    /// Logs: message format
    ///
    /// Can be one of: full, pretty, json
    #[clap(long = "log-format", env = "LOG_FORMAT", default_value = "full")]
    pub(crate) log_format: LogFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LogFormat {
    Full,
    Pretty,
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "full" => Ok(Self::Full),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            _ => Err(format!(
                "Invalid log format '{s}'. Valid options: full, pretty, json"
            )),
        }
    }
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Full => write!(f, "full"),
            Self::Pretty => write!(f, "pretty"),
            Self::Json => write!(f, "json"),
        }
    }
}

/// Builder for the global log subscriber.
#[derive(Debug)]
pub(crate) struct Builder {
    log_format: LogFormat,
    log_filter: Option<String>,
    // used when log_filter is none.
    default_log_filter: String,
    with_ansi: bool,
}

impl Default for Builder {
    fn default() -> Self {
        Self {
            log_format: LogFormat::Full,
            log_filter: None,
            default_log_filter: Self::DEFAULT_LOG_FILTER.to_string(),
            with_ansi: true,
        }
    }
}

impl Builder {
    pub(crate) const DEFAULT_LOG_FILTER: &'static str = "warn";

    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Set log_filter using a simple numeric "verbosity level".
    ///
    /// 0 means, keep existing `log_filter` value.
    pub(crate) fn with_log_verbose_count(self, log_verbose_count: u8) -> Self {
        let log_filter = match log_verbose_count {
            0 => self.log_filter,
            1 => Some("info".to_string()),
            2 => Some("debug,hyper::proto::h1=info,h2=info".to_string()),
            _ => Some("trace,hyper::proto::h1=info,h2=info".to_string()),
        };
        Self { log_filter, ..self }
    }

    pub(crate) fn with_log_filter(self, log_filter: &Option<String>) -> Self {
        Self {
            log_filter: log_filter.clone(),
            ..self
        }
    }

    pub(crate) fn with_default_log_filter(self, default_log_filter: impl Into<String>) -> Self {
        Self {
            default_log_filter: default_log_filter.into(),
            ..self
        }
    }

    pub(crate) fn with_log_format(self, log_format: LogFormat) -> Self {
        Self { log_format, ..self }
    }

    /// Enable/disable ANSI encoding for formatted events (i.e. colors).
    pub(crate) fn with_ansi(self, with_ansi: bool) -> Self {
        Self { with_ansi, ..self }
    }

    /// Applies all entries of a [`LoggingConfig`].
    pub(crate) fn with_logging_config(self, config: &LoggingConfig) -> Self {
        self.with_log_filter(&config.log_filter)
            // goes after with_log_filter because -v overrides --log-filter
            .with_log_verbose_count(config.log_verbose_count)
            .with_log_format(config.log_format)
    }

    /// The filter directive that will be installed
    pub(crate) fn filter_directive(&self) -> &str {
        self.log_filter
            .as_deref()
            .unwrap_or(&self.default_log_filter)
    }

    fn env_filter(&self) -> Result<EnvFilter> {
        let filter = self.filter_directive();
        EnvFilter::try_new(filter).map_err(|source| Error::InvalidFilter {
            filter: filter.to_string(),
            source,
        })
    }

    fn fmt_layer(&self) -> Box<dyn Layer<Registry> + Send + Sync> {
        let layer = tracing_subscriber::fmt::layer()
            .with_writer(io::stderr)
            .with_ansi(self.with_ansi);
        match self.log_format {
            LogFormat::Full => layer.boxed(),
            LogFormat::Pretty => layer.pretty().boxed(),
            LogFormat::Json => layer.json().boxed(),
        }
    }

    /// Install the subscriber as the process-wide default
    pub(crate) fn install_global(self) -> Result<()> {
        let filter = self.env_filter()?;
        let subscriber = Registry::default().with(self.fmt_layer()).with(filter);
        tracing::subscriber::set_global_default(subscriber)?;
        Ok(())
    }
}
