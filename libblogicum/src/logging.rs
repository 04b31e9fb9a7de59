//! stderr logging for the blog-feed and blog-post binaries
//!
//! The `[logging]` config section picks the format and level;
//! `BLOGICUM_LOG_FORMAT`, `BLOGICUM_LOG_LEVEL` and `RUST_LOG` override it.
//!
//! ```no_run
//! use libblogicum::config::LoggingSection;
//! use libblogicum::logging::LoggingConfig;
//!
//! LoggingConfig::from_section(&LoggingSection::default(), false).init();
//! ```

use std::str::FromStr;

use crate::config::LoggingSection;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    /// One JSON object per event
    Json,
    /// Multi-line with source locations
    Pretty,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            "pretty" => Ok(LogFormat::Pretty),
            other => Err(format!("Unknown log format '{}' (expected text, json or pretty)", other)),
        }
    }
}

impl std::fmt::Display for LogFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogFormat::Text => write!(f, "text"),
            LogFormat::Json => write!(f, "json"),
            LogFormat::Pretty => write!(f, "pretty"),
        }
    }
}

/// Resolved logging settings for one process
pub struct LoggingConfig {
    pub format: LogFormat,
    pub level: String,
    pub verbose: bool,
}

impl LoggingConfig {
    /// `verbose` lowers the default level to debug. `RUST_LOG` still wins.
    pub fn new(format: LogFormat, level: String, verbose: bool) -> Self {
        Self {
            format,
            level,
            verbose,
        }
    }

    /// Build from the `[logging]` config section
    ///
    /// `BLOGICUM_LOG_FORMAT` and `BLOGICUM_LOG_LEVEL` take precedence over
    /// the file. An unknown format falls back to text.
    pub fn from_section(section: &LoggingSection, verbose: bool) -> Self {
        let format = std::env::var("BLOGICUM_LOG_FORMAT")
            .ok()
            .and_then(|s| s.parse().ok())
            .or_else(|| section.format.parse().ok())
            .unwrap_or(LogFormat::Text);

        let level =
            std::env::var("BLOGICUM_LOG_LEVEL").unwrap_or_else(|_| section.level.clone());

        Self::new(format, level, verbose)
    }

    /// Initialize logging with the configured settings
    ///
    /// Call once at program start. Later calls are ignored.
    pub fn init(&self) {
        use tracing_subscriber::EnvFilter;

        let filter = if self.verbose {
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
        } else {
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&self.level))
        };

        let result = match self.format {
            LogFormat::Json => tracing_subscriber::fmt()
                .json()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .with_current_span(true)
                .flatten_event(true)
                .with_target(true)
                .try_init(),
            LogFormat::Pretty => tracing_subscriber::fmt()
                .pretty()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_line_number(true)
                .with_file(true)
                .try_init(),
            LogFormat::Text => tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_level(true)
                .try_init(),
        };

        if result.is_err() {
            tracing::debug!("Logging already initialized");
        }
    }
}
