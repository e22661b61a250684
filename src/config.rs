//! Link and session flags shared by every binary that drives a menu terminal.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Result};
use clap::{Parser, ValueEnum};

use crate::host::RetryPolicy;
use crate::serial::{baud_constant, SerialSettings};

pub const DEFAULT_PORT: &str = "/dev/ttyUSB0";
pub const DEFAULT_BAUD: u32 = 9600;
pub const DEFAULT_ROWS: u16 = 24;
pub const DEFAULT_RETRY_DELAY_MS: u64 = 1000;

/// Column modes a VT-100 can switch between.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Default)]
pub enum ColumnMode {
    #[default]
    #[value(name = "80")]
    Normal,
    #[value(name = "132")]
    Wide,
}

impl ColumnMode {
    #[must_use]
    pub fn columns(self) -> usize {
        match self {
            Self::Normal => 80,
            Self::Wide => 132,
        }
    }
}

#[derive(Debug, Parser, Clone)]
#[command(about = "VT-100 menu link settings", author, version)]
pub struct AppConfig {
    /// Serial device the terminal is attached to
    #[arg(long = "port", env = "VTMENU_PORT", default_value = DEFAULT_PORT)]
    pub port: PathBuf,

    /// Line speed
    #[arg(long = "baud", default_value_t = DEFAULT_BAUD)]
    pub baud: u32,

    /// Enable software flow control (XON/XOFF)
    #[arg(long = "flow", default_value_t = false)]
    pub flow: bool,

    /// Column mode to start in
    #[arg(long = "columns", value_enum, default_value_t = ColumnMode::Normal)]
    pub columns: ColumnMode,

    /// Screen height in rows
    #[arg(
        long = "rows",
        default_value_t = DEFAULT_ROWS,
        value_parser = clap::value_parser!(u16).range(5..=255)
    )]
    pub rows: u16,

    /// Wait between connection attempts (ms)
    #[arg(long = "retry-delay-ms", default_value_t = DEFAULT_RETRY_DELAY_MS)]
    pub retry_delay_ms: u64,

    /// Give up after this many failed connection attempts in a row (default: never)
    #[arg(long = "max-connect-attempts")]
    pub max_connect_attempts: Option<u32>,

    /// Write JSON trace logs (path from VTMENU_TRACE_LOG or the temp dir)
    #[arg(long = "logs", default_value_t = false)]
    pub logs: bool,

    /// Disable trace logs even if --logs is set
    #[arg(long = "no-logs", default_value_t = false)]
    pub no_logs: bool,
}

impl AppConfig {
    /// Reject settings the serial layer cannot honor.
    ///
    /// # Errors
    ///
    /// Returns an error naming the first bad flag.
    pub fn validate(&self) -> Result<()> {
        if baud_constant(self.baud).is_none() {
            bail!(
                "--baud {} is not a standard rate (300, 600, 1200, 2400, 4800, 9600, 19200, 38400, 57600, 115200)",
                self.baud
            );
        }
        if self.max_connect_attempts == Some(0) {
            bail!("--max-connect-attempts must be at least 1");
        }
        if self.port.as_os_str().is_empty() {
            bail!("--port must not be empty");
        }
        Ok(())
    }

    #[must_use]
    pub fn serial_settings(&self) -> SerialSettings {
        SerialSettings {
            port: self.port.clone(),
            baud: self.baud,
            flow: self.flow,
        }
    }

    #[must_use]
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            delay: Duration::from_millis(self.retry_delay_ms),
            max_attempts: self.max_connect_attempts,
        }
    }

    #[must_use]
    pub fn rows(&self) -> usize {
        usize::from(self.rows)
    }
}
