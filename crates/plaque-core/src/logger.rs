//! Stderr logging for the plaque crates and tools.
//!
//! Lines look like `[   0.512s  INFO plaque_analysis] message`. Records from
//! other crates (codecs, process plumbing) are capped at `warn` so raising the
//! verbosity only surfaces pipeline detail.

use std::fmt::Write as _;
use std::io::Write;
use std::sync::OnceLock;
use std::time::Instant;

use log::{LevelFilter, Log, Metadata, Record};

#[cfg(feature = "tracing")]
use tracing_subscriber::fmt::format::FmtSpan;
#[cfg(feature = "tracing")]
use tracing_subscriber::util::SubscriberInitExt;
#[cfg(feature = "tracing")]
use tracing_subscriber::{fmt, EnvFilter};

/// Crates whose records pass at the configured level.
const OWN_CRATES: [&str; 3] = ["plaque_core", "plaque_analysis", "plaque_scan"];

fn is_own_target(target: &str) -> bool {
    OWN_CRATES.iter().any(|c| target.starts_with(c))
}

struct PlaqueLogger {
    level: LevelFilter,
    started: Instant,
}

impl PlaqueLogger {
    fn threshold(&self, target: &str) -> LevelFilter {
        if is_own_target(target) {
            self.level
        } else {
            self.level.min(LevelFilter::Warn)
        }
    }
}

fn format_line(elapsed_s: f64, record: &Record<'_>) -> String {
    let mut line = String::new();
    let _ = write!(
        line,
        "[{elapsed_s:8.3}s {:>5} {}] {}",
        record.level(),
        record.target(),
        record.args()
    );
    line
}

impl Log for PlaqueLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.threshold(metadata.target())
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let line = format_line(self.started.elapsed().as_secs_f64(), record);
        let _ = writeln!(std::io::stderr().lock(), "{line}");
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

static LOGGER: OnceLock<PlaqueLogger> = OnceLock::new();

/// Install the stderr logger at `level`.
///
/// Only the first call has an effect; later calls return `Ok(())`.
pub fn init_with_level(level: LevelFilter) -> Result<(), log::SetLoggerError> {
    if LOGGER.get().is_some() {
        return Ok(());
    }
    let logger = LOGGER.get_or_init(|| PlaqueLogger {
        level,
        started: Instant::now(),
    });
    log::set_logger(logger)?;
    log::set_max_level(level);
    Ok(())
}

/// `0 -> Info`, `1 -> Debug`, `2+ -> Trace`.
pub fn level_from_verbosity(verbose: u8) -> LevelFilter {
    match verbose {
        0 => LevelFilter::Info,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

/// `RUST_LOG`-style directive: `warn` globally, `level` for the plaque crates.
pub fn default_directive(level: LevelFilter) -> String {
    let level = level.to_string().to_lowercase();
    let mut directive = String::from("warn");
    for krate in OWN_CRATES {
        let _ = write!(directive, ",{krate}={level}");
    }
    directive
}

/// Install a `tracing` subscriber with span timings.
///
/// `RUST_LOG` wins when set; otherwise [`default_directive`] is used for
/// `verbose`.
#[cfg(feature = "tracing")]
pub fn init_tracing(json: bool, verbose: u8) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(level_from_verbosity(verbose))));
    let builder = fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_span_events(FmtSpan::CLOSE);
    if json {
        let _ = builder.json().flatten_event(true).finish().try_init();
    } else {
        let _ = builder
            .with_timer(fmt::time::Uptime::default())
            .finish()
            .try_init();
    }
}
