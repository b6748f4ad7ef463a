//! Stderr backends for the crate's `log` and `tracing` output.
//!
//! [`init_with_level`] prints `[  0.012s DEBUG groundplane_core::ransac] 12 inliers`
//! style lines. With the `tracing` feature, [`init_tracing`] installs a
//! `tracing-subscriber` writing to the same stream.

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

struct StderrLogger {
    level: LevelFilter,
    started: Instant,
}

impl Log for StderrLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let line = format_line(
            self.started.elapsed().as_secs_f64(),
            record.level(),
            record.target(),
            record.args(),
        );
        let _ = writeln!(std::io::stderr().lock(), "{line}");
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

fn format_line(
    elapsed: f64,
    level: log::Level,
    target: &str,
    args: &std::fmt::Arguments<'_>,
) -> String {
    format!("[{elapsed:7.3}s {level:>5} {target}] {args}")
}

static LOGGER: OnceLock<StderrLogger> = OnceLock::new();

/// Route `log` records at or above `level` to stderr.
///
/// The first call wins: the level and the start instant are fixed then, and
/// later calls return `Ok(())` without touching the installed logger.
pub fn init_with_level(level: LevelFilter) -> Result<(), log::SetLoggerError> {
    if LOGGER.get().is_some() {
        return Ok(());
    }
    let logger = LOGGER.get_or_init(|| StderrLogger {
        level,
        started: Instant::now(),
    });
    log::set_logger(logger)?;
    log::set_max_level(level);
    Ok(())
}

/// Install a stderr `tracing` subscriber that reports closed spans.
///
/// `RUST_LOG` takes precedence; `fallback` (e.g. `"debug"`) applies when it is
/// unset or unparsable. `json` selects flattened JSON events over text lines.
#[cfg(feature = "tracing")]
pub fn init_tracing(json: bool, fallback: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    let builder = fmt()
        .with_env_filter(filter)
        .with_span_events(FmtSpan::CLOSE)
        .with_writer(std::io::stderr);
    // A subscriber installed earlier stays in place.
    let _ = if json {
        builder.json().flatten_event(true).finish().try_init()
    } else {
        builder
            .with_timer(fmt::time::Uptime::default())
            .finish()
            .try_init()
    };
}
