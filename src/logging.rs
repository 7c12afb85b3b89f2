//! Logging System
//!
//! Structured logging with `tracing`. Level, format and destination come
//! from the site's `[logging]` table; `PAGETYPE_LOG`, `PAGETYPE_LOG_FORMAT`
//! and `PAGETYPE_LOG_OUTPUT` win over it. The sled engine is held at `warn`
//! unless a module directive overrides it.

use crate::error::PageTypeError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing_subscriber::filter::Directive;
use tracing_subscriber::fmt::time::ChronoUtc;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

const LEVEL_VAR: &str = "PAGETYPE_LOG";
const FORMAT_VAR: &str = "PAGETYPE_LOG_FORMAT";
const OUTPUT_VAR: &str = "PAGETYPE_LOG_OUTPUT";

/// Storage engine directive applied below any configured module levels
const STORAGE_DIRECTIVE: &str = "sled=warn";

/// `[logging]` table of the site configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// trace, debug, info, warn, error or off
    #[serde(default = "default_log_level")]
    pub level: String,

    /// json or text
    #[serde(default = "default_format")]
    pub format: String,

    /// stdout, stderr or file
    #[serde(default = "default_output")]
    pub output: String,

    /// Log file when `output = "file"`; relative paths sit under the site root
    #[serde(default = "default_log_file")]
    pub file: PathBuf,

    /// ANSI colors for text output on a terminal stream
    #[serde(default = "default_true")]
    pub color: bool,

    /// Per-target levels, e.g. `pagetype::router = "trace"`
    #[serde(default)]
    pub modules: HashMap<String, String>,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_format() -> String {
    "text".to_string()
}

fn default_output() -> String {
    "stderr".to_string()
}

fn default_log_file() -> PathBuf {
    PathBuf::from(".pagetype/pagetype.log")
}

fn default_true() -> bool {
    true
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_format(),
            output: default_output(),
            file: default_log_file(),
            color: default_true(),
            modules: HashMap::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Format {
    Text,
    Json,
}

impl FromStr for Format {
    type Err = PageTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "text" => Ok(Format::Text),
            "json" => Ok(Format::Json),
            other => Err(PageTypeError::Configuration(format!(
                "Invalid log format: {} (must be 'json' or 'text')",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Output {
    Stdout,
    Stderr,
    File,
}

impl FromStr for Output {
    type Err = PageTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "stdout" => Ok(Output::Stdout),
            "stderr" => Ok(Output::Stderr),
            "file" => Ok(Output::File),
            other => Err(PageTypeError::Configuration(format!(
                "Invalid log output: {} (must be 'stdout', 'stderr' or 'file')",
                other
            ))),
        }
    }
}

/// Logging settings after environment overrides are applied
#[derive(Debug)]
struct Resolved {
    filter: EnvFilter,
    format: Format,
    output: Output,
    color: bool,
    file: PathBuf,
}

impl LoggingConfig {
    fn resolve(&self, site_root: Option<&Path>) -> Result<Resolved, PageTypeError> {
        let format: Format = match std::env::var(FORMAT_VAR) {
            // An unusable override falls back to the configured format
            Ok(value) => value.parse().or_else(|_| self.format.parse::<Format>())?,
            Err(_) => self.format.parse()?,
        };
        let output: Output = match std::env::var(OUTPUT_VAR) {
            Ok(value) => value.parse()?,
            Err(_) => self.output.parse()?,
        };
        let file = match site_root {
            Some(root) if self.file.is_relative() => root.join(&self.file),
            _ => self.file.clone(),
        };

        Ok(Resolved {
            filter: self.filter()?,
            format,
            output,
            color: self.color && output != Output::File,
            file,
        })
    }

    fn filter(&self) -> Result<EnvFilter, PageTypeError> {
        if let Ok(filter) = EnvFilter::try_from_env(LEVEL_VAR) {
            return Ok(filter);
        }
        if self.level == "off" {
            return Ok(EnvFilter::new("off"));
        }

        let mut directives = std::iter::once(STORAGE_DIRECTIVE.to_string()).chain(
            self.modules
                .iter()
                .map(|(target, level)| format!("{}={}", target, level)),
        );
        directives.try_fold(EnvFilter::new(&self.level), |filter, directive| {
            let directive = directive.parse::<Directive>().map_err(|e| {
                PageTypeError::Configuration(format!(
                    "Invalid log directive '{}': {}",
                    directive, e
                ))
            })?;
            Ok(filter.add_directive(directive))
        })
    }
}

fn file_writer(path: &Path) -> Result<BoxMakeWriter, PageTypeError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| {
            PageTypeError::Configuration(format!("Failed to create log directory: {}", e))
        })?;
    }
    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| {
            PageTypeError::Configuration(format!("Failed to open log file {:?}: {}", path, e))
        })?;
    Ok(BoxMakeWriter::new(std::sync::Mutex::new(file)))
}

/// Install the global subscriber
///
/// Without a config the defaults apply. Fails if a subscriber is already
/// installed.
pub fn init_logging(
    config: Option<&LoggingConfig>,
    site_root: Option<&Path>,
) -> Result<(), PageTypeError> {
    let defaults = LoggingConfig::default();
    let settings = config.unwrap_or(&defaults).resolve(site_root)?;

    let writer = match settings.output {
        Output::Stdout => BoxMakeWriter::new(std::io::stdout),
        Output::Stderr => BoxMakeWriter::new(std::io::stderr),
        Output::File => file_writer(&settings.file)?,
    };

    let registry = Registry::default().with(settings.filter);
    let layer = fmt::layer()
        .with_target(true)
        .with_timer(ChronoUtc::rfc_3339())
        .with_writer(writer);
    let installed = match settings.format {
        Format::Json => registry.with(layer.json()).try_init(),
        Format::Text => registry.with(layer.with_ansi(settings.color)).try_init(),
    };

    installed.map_err(|e| PageTypeError::Configuration(format!("Failed to install logger: {}", e)))
}
