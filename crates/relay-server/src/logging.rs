//! Logging configuration and initialization.
//!
//! Presets pick a level per `relay::*` target; `--log TARGET=LEVEL` flags
//! refine them, RUST_LOG replaces them, and output is text or JSON.

use clap::Args;
use std::collections::BTreeMap;
use tracing::Level;
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl std::str::FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            _ => Err(format!("Invalid log format: '{}'. Use 'text' or 'json'.", s)),
        }
    }
}

/// Logging preset levels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogPreset {
    /// Joins, leaves and failures.
    #[default]
    Production,
    /// Adds renames and per-broadcast summaries.
    Verbose,
    Debug,
    /// Everything, including every frame read.
    Trace,
    /// Warnings and errors only.
    Quiet,
}

/// Logging flags shared by the binary's CLI.
#[derive(Args, Debug, Clone, Default)]
pub struct LogArgs {
    /// Enable verbose logging (INFO everywhere, DEBUG for the dispatch loop)
    #[arg(short, long)]
    pub verbose: bool,

    /// Enable debug logging
    #[arg(short, long)]
    pub debug: bool,

    /// Enable trace logging (every frame read)
    #[arg(long)]
    pub trace: bool,

    /// Quiet mode (WARN and ERROR only)
    #[arg(short, long)]
    pub quiet: bool,

    /// Set log level for specific targets (e.g., "dispatch=debug" or "ws=trace").
    /// Can be given multiple times. Targets are prefixed with "relay::" automatically.
    #[arg(long = "log", value_name = "TARGET=LEVEL")]
    pub overrides: Vec<String>,

    /// Log output format
    #[arg(long = "log-format", value_name = "FORMAT", default_value = "text")]
    pub format: LogFormat,
}

/// Resolved logging configuration.
#[derive(Debug, Clone, Default)]
pub struct LogConfig {
    pub preset: LogPreset,
    /// Full target name -> level. Ordered so the filter string is stable.
    pub overrides: BTreeMap<String, Level>,
    pub format: LogFormat,
}

impl From<&LogArgs> for LogConfig {
    fn from(args: &LogArgs) -> Self {
        // Quietest flag wins
        let preset = if args.quiet {
            LogPreset::Quiet
        } else if args.trace {
            LogPreset::Trace
        } else if args.debug {
            LogPreset::Debug
        } else if args.verbose {
            LogPreset::Verbose
        } else {
            LogPreset::Production
        };

        let overrides = args
            .overrides
            .iter()
            .flat_map(|arg| arg.split(','))
            .filter_map(parse_override)
            .collect();

        Self {
            preset,
            overrides,
            format: args.format,
        }
    }
}

impl LogConfig {
    /// Build an EnvFilter from this configuration. RUST_LOG wins when set.
    pub fn build_filter(&self) -> EnvFilter {
        if let Ok(env_filter) = EnvFilter::try_from_default_env() {
            return env_filter;
        }

        let filter_str = self.directives().join(",");
        EnvFilter::try_new(&filter_str).unwrap_or_else(|_| EnvFilter::new("info"))
    }

    /// Filter directives for the preset, followed by the overrides.
    pub fn directives(&self) -> Vec<String> {
        let preset: &[&str] = match self.preset {
            LogPreset::Production => &[
                "relay::startup=info",
                "relay::ws=info",
                "relay::dispatch=info",
                "relay::broadcast=warn",
                "tower_http=warn",
            ],
            LogPreset::Verbose => &["relay=info", "relay::dispatch=debug", "tower_http=info"],
            LogPreset::Debug => &["relay=debug", "tower_http=debug"],
            LogPreset::Trace => &["relay=trace", "tower_http=trace"],
            LogPreset::Quiet => &["relay=warn", "tower_http=error"],
        };

        preset
            .iter()
            .map(|d| d.to_string())
            .chain(
                self.overrides
                    .iter()
                    .map(|(target, level)| format!("{}={}", target, level_to_str(*level))),
            )
            .collect()
    }
}

/// Parse one "target=level" pair. Bad levels are skipped.
fn parse_override(part: &str) -> Option<(String, Level)> {
    let (target, level) = part.split_once('=')?;
    let target = target.trim();
    let level = parse_level(level.trim())?;

    let full_target = if target.starts_with("relay::") || target == "relay" || target == "tower_http" {
        target.to_string()
    } else {
        format!("relay::{}", target)
    };
    Some((full_target, level))
}

/// Parse a level string (case-insensitive).
fn parse_level(s: &str) -> Option<Level> {
    match s.to_lowercase().as_str() {
        "trace" => Some(Level::TRACE),
        "debug" => Some(Level::DEBUG),
        "info" => Some(Level::INFO),
        "warn" | "warning" => Some(Level::WARN),
        "error" => Some(Level::ERROR),
        _ => None,
    }
}

fn level_to_str(level: Level) -> &'static str {
    match level {
        Level::TRACE => "trace",
        Level::DEBUG => "debug",
        Level::INFO => "info",
        Level::WARN => "warn",
        Level::ERROR => "error",
    }
}

/// Initialize the tracing subscriber with the given configuration.
pub fn init(config: &LogConfig) {
    let filter = config.build_filter();

    match config.format {
        LogFormat::Text => {
            tracing_subscriber::registry()
                .with(filter)
                .with(
                    fmt::layer()
                        .with_target(true)
                        .with_thread_ids(false)
                        .with_file(false)
                        .with_line_number(false),
                )
                .init();
        }
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(filter)
                .with(
                    fmt::layer()
                        .json()
                        .with_target(true)
                        .with_span_events(FmtSpan::CLOSE),
                )
                .init();
        }
    }
}
