//! Process-wide tracing setup for the `sales-tax` binary.
//!
//! Two sinks share one level filter: the terminal (stderr, so console menus
//! and piped stdout stay clean) and an optional log file that can be attached
//! once the command line has been parsed. Both can be adjusted at runtime.

use std::fs::File;
use std::io::{self, IsTerminal, LineWriter, Write};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError};

use anyhow::{Context, Result, anyhow, bail};
use chrono::Local;
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{
        FmtContext, MakeWriter,
        format::{FormatEvent, FormatFields, Writer},
    },
    layer::SubscriberExt,
    registry::LookupSpan,
    reload,
    util::SubscriberInitExt,
};

const DEFAULT_FILTER: &str = "info";

// --- Record layout ---

/// `HH:MM:SS.mmm LEVEL target: fields`, colored on a terminal.
struct CatalogFormat;

fn level_color(level: &Level) -> &'static str {
    match *level {
        Level::ERROR => "\x1b[1;31m",
        Level::WARN => "\x1b[1;33m",
        Level::INFO => "\x1b[1;32m",
        Level::DEBUG => "\x1b[1;34m",
        Level::TRACE => "\x1b[1;35m",
    }
}

/// Drops the workspace crate prefix: `sales_tax_db_sqlite::repository`
/// becomes `db_sqlite::repository`.
fn short_target(target: &str) -> &str {
    target.strip_prefix("sales_tax_").unwrap_or(target)
}

impl<S, N> FormatEvent<S, N> for CatalogFormat
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> std::fmt::Result {
        let meta = event.metadata();
        let time = Local::now().format("%H:%M:%S%.3f");
        let target = short_target(meta.target());

        if writer.has_ansi_escapes() {
            write!(
                writer,
                "\x1b[2m{time}\x1b[0m {}{:>5}\x1b[0m \x1b[36m{target}\x1b[0m: ",
                level_color(meta.level()),
                meta.level()
            )?;
        } else {
            write!(writer, "{time} {:>5} {target}: ", meta.level())?;
        }

        ctx.field_format().format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}

// --- Optional log file ---

type SharedLog = Arc<Mutex<Option<LineWriter<File>>>>;

/// Writer target that discards everything until a file is attached.
#[derive(Clone)]
struct LogFile(SharedLog);

struct LogFileGuard<'a>(MutexGuard<'a, Option<LineWriter<File>>>);

impl Write for LogFileGuard<'_> {
    fn write(
        &mut self,
        buf: &[u8],
    ) -> io::Result<usize> {
        self.0.as_mut().map_or(Ok(buf.len()), |file| file.write(buf))
    }

    fn flush(&mut self) -> io::Result<()> {
        self.0.as_mut().map_or(Ok(()), |file| file.flush())
    }
}

impl<'a> MakeWriter<'a> for LogFile {
    type Writer = LogFileGuard<'a>;

    fn make_writer(&'a self) -> Self::Writer {
        LogFileGuard(self.0.lock().unwrap_or_else(PoisonError::into_inner))
    }
}

// --- Runtime controls ---

type Reloader<T> = Box<dyn Fn(T) -> Result<()> + Send + Sync>;

/// Handles captured when the subscriber is installed.
struct Controls {
    level: Reloader<EnvFilter>,
    terminal: Reloader<bool>,
    file: SharedLog,
}

static CONTROLS: OnceLock<Controls> = OnceLock::new();

fn controls() -> Result<&'static Controls> {
    match CONTROLS.get() {
        Some(controls) => Ok(controls),
        None => bail!("logging not yet initialized"),
    }
}

fn level_reloader<S>(handle: reload::Handle<EnvFilter, S>) -> Reloader<EnvFilter>
where
    S: Subscriber + Send + Sync + 'static,
{
    Box::new(move |filter| {
        handle
            .reload(filter)
            .map_err(|e| anyhow!("level reload failed: {e}"))
    })
}

fn terminal_reloader<S>(handle: reload::Handle<EnvFilter, S>) -> Reloader<bool>
where
    S: Subscriber + Send + Sync + 'static,
{
    // The shared level filter still applies when the gate is open.
    Box::new(move |enabled| {
        let gate = EnvFilter::new(if enabled { "trace" } else { "off" });
        handle
            .reload(gate)
            .map_err(|e| anyhow!("terminal reload failed: {e}"))
    })
}

// --- Public API ---

/// Replaces the level filter. Takes a bare level such as `debug` or any
/// `EnvFilter` directive list such as `info,sales_tax_db_sqlite=trace`.
pub fn set_log_level(directives: &str) -> Result<()> {
    let filter = EnvFilter::try_new(directives)
        .map_err(|e| anyhow!("invalid log level '{directives}': {e}"))?;
    (controls()?.level)(filter)
}

/// Shows or hides records on the terminal. The log file is unaffected.
pub fn set_terminal_enabled(enabled: bool) -> Result<()> {
    (controls()?.terminal)(enabled)
}

/// Appends records to `path`, replacing any file attached earlier.
pub fn enable_file_logging(path: &Path) -> Result<()> {
    let file = File::options()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("cannot open log file '{}'", path.display()))?;

    let controls = controls()?;
    *controls.file.lock().unwrap_or_else(PoisonError::into_inner) = Some(LineWriter::new(file));
    Ok(())
}

/// Installs the global subscriber. Later calls are no-ops.
///
/// The level comes from `RUST_LOG` when set and defaults to `info`.
pub fn init_default_logging() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let (level_layer, level_handle) = reload::Layer::new(filter);
    let (terminal_gate, terminal_handle) = reload::Layer::new(EnvFilter::new("trace"));
    let file: SharedLog = Arc::new(Mutex::new(None));

    let terminal_layer = tracing_subscriber::fmt::layer()
        .event_format(CatalogFormat)
        .with_writer(io::stderr)
        .with_ansi(io::stderr().is_terminal())
        .with_filter(terminal_gate);

    let file_layer = tracing_subscriber::fmt::layer()
        .event_format(CatalogFormat)
        .with_writer(LogFile(file.clone()))
        .with_ansi(false);

    let installed = tracing_subscriber::registry()
        .with(level_layer)
        .with(terminal_layer)
        .with(file_layer)
        .try_init();

    if installed.is_ok() {
        let _ = CONTROLS.set(Controls {
            level: level_reloader(level_handle),
            terminal: terminal_reloader(terminal_handle),
            file,
        });
    }
}
