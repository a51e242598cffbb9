//! Named log sinks that write every record to a file and, optionally, stderr.
//!
//! Each line has the form `<timestamp> - <name> - <level> - <message>`. Sinks
//! are owned by a [`LogRegistry`]; asking the registry for a name it already
//! holds returns the existing sink instead of attaching more outputs to it.

use std::collections::HashMap;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use chrono::Local;
use env_logger::{Target, WriteStyle};
use log::{Level, LevelFilter, Log, Record};

use crate::config::LoggerConfig;
use crate::error::{Context, Result};

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S,%3f";

pub struct LogSink {
    name: String,
    file_path: PathBuf,
    inner: env_logger::Logger,
}

impl LogSink {
    /// Open the log file in append mode and build a sink that accepts every level.
    pub fn open(config: &LoggerConfig) -> Result<Self> {
        let file = open_append(&config.file_path)?;
        let writer = TeeWriter {
            file,
            console: config.console,
        };

        let inner = env_logger::Builder::new()
            .filter_level(LevelFilter::Trace)
            .write_style(WriteStyle::Never)
            .format(|buf, record| {
                writeln!(
                    buf,
                    "{} - {} - {} - {}",
                    Local::now().format(TIMESTAMP_FORMAT),
                    record.target(),
                    record.level(),
                    record.args()
                )
            })
            .target(Target::Pipe(Box::new(writer)))
            .build();

        Ok(Self {
            name: config.name.clone(),
            file_path: config.file_path.clone(),
            inner,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn file_path(&self) -> &Path {
        &self.file_path
    }

    pub fn log_message(&self, level: Level, message: &str) {
        self.inner.log(
            &Record::builder()
                .args(format_args!("{message}"))
                .level(level)
                .target(&self.name)
                .build(),
        );
    }

    pub fn debug(&self, message: &str) {
        self.log_message(Level::Debug, message);
    }

    pub fn info(&self, message: &str) {
        self.log_message(Level::Info, message);
    }

    pub fn warn(&self, message: &str) {
        self.log_message(Level::Warn, message);
    }

    pub fn error(&self, message: &str) {
        self.log_message(Level::Error, message);
    }
}

impl std::fmt::Debug for LogSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LogSink")
            .field("name", &self.name)
            .field("file_path", &self.file_path)
            .finish()
    }
}

fn open_append(path: &Path) -> Result<File> {
    if let Some(parent) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create log directory {}", parent.display()))?;
    }

    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("failed to open log file {}", path.display()))?;
    Ok(file)
}

/// Writes each buffer to the log file and mirrors it to stderr.
struct TeeWriter {
    file: File,
    console: bool,
}

impl Write for TeeWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.file.write_all(buf)?;
        if self.console {
            io::stderr().write_all(buf)?;
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.file.flush()?;
        if self.console {
            io::stderr().flush()?;
        }
        Ok(())
    }
}

/// Owner of every named sink in the process.
#[derive(Debug, Default)]
pub struct LogRegistry {
    sinks: Mutex<HashMap<String, Arc<LogSink>>>,
}

impl LogRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the sink registered under `config.name`, creating it on first use.
    ///
    /// A second call for the same name returns the existing sink unchanged,
    /// even if the rest of `config` differs.
    pub fn get_or_init(&self, config: &LoggerConfig) -> Result<Arc<LogSink>> {
        let mut sinks = self.sinks.lock().unwrap_or_else(PoisonError::into_inner);

        if let Some(existing) = sinks.get(&config.name) {
            if existing.file_path() != config.file_path {
                log::warn!(
                    "Log sink `{}` already writes to {}; ignoring {}",
                    config.name,
                    existing.file_path().display(),
                    config.file_path.display()
                );
            }
            return Ok(Arc::clone(existing));
        }

        let sink = Arc::new(LogSink::open(config)?);
        sinks.insert(config.name.clone(), Arc::clone(&sink));
        Ok(sink)
    }

    pub fn get(&self, name: &str) -> Option<Arc<LogSink>> {
        self.sinks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
    }

    /// Drop the sink registered under `name`; the next `get_or_init` opens a fresh one.
    pub fn reset(&self, name: &str) -> bool {
        self.sinks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(name)
            .is_some()
    }

    pub fn len(&self) -> usize {
        self.sinks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Send `log` macro output (provider and HTTP client diagnostics) to stderr,
/// filtered by `RUST_LOG`. Request sinks never receive these records.
///
/// Returns `false` if a logger was already installed.
pub fn init_diagnostics() -> bool {
    env_logger::Builder::from_default_env()
        .format(|buf, record| {
            writeln!(
                buf,
                "{} - {} - {} - {}",
                Local::now().format(TIMESTAMP_FORMAT),
                record.target(),
                record.level(),
                record.args()
            )
        })
        .target(Target::Stderr)
        .try_init()
        .is_ok()
}
