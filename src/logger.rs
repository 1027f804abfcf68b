use crate::config::{Config, SelectionPolicy, TriggerPolicy};
use crate::error::{GenerationError, Result};
use chrono::{DateTime, Utc};
use colored::*;
use log::{Level, LevelFilter, Metadata, Record};
use once_cell::sync::Lazy;
use serde::Serialize;
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Mutex;
use std::time::{Duration, Instant};
use uuid::Uuid;

static LOGGER: Lazy<ConsoleLogger> = Lazy::new(ConsoleLogger::new);

pub fn init() -> Result<()> {
    init_with_config(LoggerConfig::default())
}

pub fn init_with_config(config: LoggerConfig) -> Result<()> {
    let max_level = config.min_level.to_level_filter();
    LOGGER.configure(config)?;

    log::set_logger(&*LOGGER)
        .map_err(|e| GenerationError::ConfigError(format!("Failed to set logger: {}", e)))?;
    log::set_max_level(max_level);
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn color(&self) -> Color {
        match self {
            LogLevel::Trace => Color::Cyan,
            LogLevel::Debug => Color::Blue,
            LogLevel::Info => Color::Green,
            LogLevel::Warn => Color::Yellow,
            LogLevel::Error => Color::Red,
        }
    }

    pub fn emoji(&self) -> &'static str {
        match self {
            LogLevel::Trace => "🔍",
            LogLevel::Debug => "🐛",
            LogLevel::Info => "💡",
            LogLevel::Warn => "⚠️",
            LogLevel::Error => "❌",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "TRACE",
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warn => "WARN",
            LogLevel::Error => "ERROR",
        }
    }

    pub fn to_level_filter(&self) -> LevelFilter {
        match self {
            LogLevel::Trace => LevelFilter::Trace,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Error => LevelFilter::Error,
        }
    }
}

impl From<Level> for LogLevel {
    fn from(level: Level) -> Self {
        match level {
            Level::Trace => LogLevel::Trace,
            Level::Debug => LogLevel::Debug,
            Level::Info => LogLevel::Info,
            Level::Warn => LogLevel::Warn,
            Level::Error => LogLevel::Error,
        }
    }
}

impl FromStr for LogLevel {
    type Err = GenerationError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "trace" => Ok(LogLevel::Trace),
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "error" => Ok(LogLevel::Error),
            other => Err(GenerationError::ConfigError(format!(
                "unknown log level `{}`",
                other
            ))),
        }
    }
}

/// One emitted line; serialized as-is in JSON mode.
#[derive(Debug, Clone, Serialize)]
pub struct LogLine {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub level: LogLevel,
    pub target: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

impl LogLine {
    fn from_record(record: &Record) -> Self {
        let location = match (record.file(), record.line()) {
            (Some(file), Some(line)) => Some(format!("{}:{}", file, line)),
            _ => None,
        };

        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            level: record.level().into(),
            target: record.target().to_string(),
            message: record.args().to_string(),
            location,
        }
    }
}

#[derive(Debug, Clone)]
pub struct LoggerConfig {
    pub min_level: LogLevel,
    pub show_colors: bool,
    pub show_emojis: bool,
    pub show_target: bool,
    pub show_location: bool,
    pub output_json: bool,
    pub timestamp_format: String,
    pub log_file: Option<PathBuf>,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            min_level: LogLevel::Info,
            show_colors: true,
            show_emojis: true,
            show_target: true,
            show_location: false,
            output_json: false,
            timestamp_format: "%Y-%m-%d %H:%M:%S%.3f".to_string(),
            log_file: None,
        }
    }
}

impl LoggerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn development() -> Self {
        Self {
            min_level: LogLevel::Debug,
            show_location: true,
            ..Default::default()
        }
    }

    pub fn production() -> Self {
        Self {
            show_colors: false,
            show_emojis: false,
            output_json: true,
            ..Default::default()
        }
    }

    pub fn with_level(mut self, level: LogLevel) -> Self {
        self.min_level = level;
        self
    }

    pub fn with_colors(mut self, enabled: bool) -> Self {
        self.show_colors = enabled;
        self
    }

    pub fn with_json_output(mut self, enabled: bool) -> Self {
        self.output_json = enabled;
        self
    }

    pub fn with_file_output(mut self, path: impl Into<PathBuf>) -> Self {
        self.log_file = Some(path.into());
        self
    }

    /// Renders a line for the console or the plain-text file sink.
    pub fn render(&self, line: &LogLine) -> String {
        if self.output_json {
            return serde_json::to_string(line).unwrap_or_else(|_| line.message.clone());
        }

        let mut out = String::new();

        let timestamp = line.timestamp.format(&self.timestamp_format).to_string();
        if self.show_colors {
            out.push_str(&format!("{} ", timestamp.bright_black()));
        } else {
            out.push_str(&format!("{} ", timestamp));
        }

        let level = if self.show_emojis {
            format!("{} {}", line.level.emoji(), line.level.as_str())
        } else {
            line.level.as_str().to_string()
        };
        if self.show_colors {
            out.push_str(&format!("[{}] ", level.color(line.level.color()).bold()));
        } else {
            out.push_str(&format!("[{}] ", level));
        }

        if self.show_target && !line.target.is_empty() {
            if self.show_colors {
                out.push_str(&format!("{}: ", line.target.bright_blue()));
            } else {
                out.push_str(&format!("{}: ", line.target));
            }
        }

        out.push_str(&line.message);

        if let Some(location) = line.location.as_ref().filter(|_| self.show_location) {
            if self.show_colors {
                out.push_str(&format!(" ({})", location.bright_black()));
            } else {
                out.push_str(&format!(" ({})", location));
            }
        }

        out
    }
}

pub struct ConsoleLogger {
    config: Mutex<LoggerConfig>,
    file: Mutex<Option<File>>,
}

impl ConsoleLogger {
    fn new() -> Self {
        Self {
            config: Mutex::new(LoggerConfig::default()),
            file: Mutex::new(None),
        }
    }

    fn configure(&self, config: LoggerConfig) -> Result<()> {
        let file = match &config.log_file {
            Some(path) => Some(
                OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(path)
                    .map_err(|e| {
                        GenerationError::ConfigError(format!(
                            "cannot open log file {}: {}",
                            path.display(),
                            e
                        ))
                    })?,
            ),
            None => None,
        };

        if let Ok(mut slot) = self.file.lock() {
            *slot = file;
        }
        if let Ok(mut current) = self.config.lock() {
            *current = config;
        }
        Ok(())
    }
}

impl log::Log for ConsoleLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        self.config
            .lock()
            .map(|config| LogLevel::from(metadata.level()) >= config.min_level)
            .unwrap_or(true)
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        let Ok(config) = self.config.lock() else {
            return;
        };
        let line = LogLine::from_record(record);
        let rendered = config.render(&line);
        eprintln!("{}", rendered);

        if config.log_file.is_some() {
            let plain = if config.output_json {
                rendered
            } else {
                config.clone().with_colors(false).render(&line)
            };
            if let Ok(mut file) = self.file.lock() {
                if let Some(file) = file.as_mut() {
                    let _ = writeln!(file, "{}", plain);
                }
            }
        }
    }

    fn flush(&self) {
        let _ = io::stderr().flush();
        if let Ok(mut file) = self.file.lock() {
            if let Some(file) = file.as_mut() {
                let _ = file.flush();
            }
        }
    }
}

/// Logs how long a named operation took when dropped.
pub struct Timer {
    start: Instant,
    name: String,
}

impl Timer {
    pub fn new(name: &str) -> Self {
        log::trace!("⏱️  Starting timer: {}", name);
        Self {
            start: Instant::now(),
            name: name.to_string(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}

impl Drop for Timer {
    fn drop(&mut self) {
        log::debug!(
            "⏱️  {} finished in {}ms",
            self.name,
            self.elapsed().as_millis()
        );
    }
}

pub fn timer(name: &str) -> Timer {
    Timer::new(name)
}

pub fn log_config_info(config: &Config) {
    log::info!("⚙️  Configuration loaded:");
    log::info!("   Endpoint: {}", config.client.endpoint);
    match config.client.timeout {
        Some(timeout) => log::info!("   Timeout: {}s", timeout.as_secs()),
        None => log::info!("   Timeout: none"),
    }
    log::info!(
        "   Overlapping prompts: {}",
        match config.orchestrator.trigger_policy {
            TriggerPolicy::RejectWhileInFlight => "rejected",
            TriggerPolicy::AllowConcurrent => "allowed",
        }
    );
    log::info!(
        "   History selection: {}",
        match config.orchestrator.selection_policy {
            SelectionPolicy::Strict => "strict",
            SelectionPolicy::Trusted => "trusted",
        }
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(level: LogLevel, message: &str) -> LogLine {
        LogLine {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            level,
            target: "imagegen::orchestrator".to_string(),
            message: message.to_string(),
            location: Some("src/orchestrator/mod.rs:42".to_string()),
        }
    }

    #[test]
    fn test_log_levels() {
        assert_eq!(LogLevel::Info.as_str(), "INFO");
        assert_eq!(LogLevel::Error.emoji(), "❌");
        assert_eq!(LogLevel::Debug.color(), Color::Blue);
        assert!(LogLevel::Warn > LogLevel::Info);
        assert_eq!("Warning".parse::<LogLevel>().unwrap(), LogLevel::Warn);
        assert!("loud".parse::<LogLevel>().is_err());
    }

    #[test]
    fn test_logger_config_presets() {
        let config = LoggerConfig::development();
        assert_eq!(config.min_level, LogLevel::Debug);
        assert!(config.show_colors);

        let prod_config = LoggerConfig::production();
        assert!(!prod_config.show_colors);
        assert!(prod_config.output_json);
    }

    #[test]
    fn test_plain_render() {
        let config = LoggerConfig::new().with_colors(false);
        let rendered = config.render(&line(LogLevel::Warn, "Rejected overlapping prompt"));

        let expected = format!(
            "[{} WARN] imagegen::orchestrator: Rejected overlapping prompt",
            LogLevel::Warn.emoji()
        );
        assert!(rendered.contains(&expected));
        assert!(!rendered.contains("src/orchestrator/mod.rs"));
    }

    #[test]
    fn test_json_render() {
        let config = LoggerConfig::production();
        let rendered = config.render(&line(LogLevel::Error, "Image generation failed"));
        let value: serde_json::Value = serde_json::from_str(&rendered).unwrap();

        assert_eq!(value["level"], "ERROR");
        assert_eq!(value["message"], "Image generation failed");
        assert_eq!(value["location"], "src/orchestrator/mod.rs:42");
    }
}
