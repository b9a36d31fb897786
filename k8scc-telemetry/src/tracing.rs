use k8scc_config::Environment;
use std::io::Error;
use std::io::Write;
use std::path::Path;
use std::sync::OnceLock;
use std::{
    backtrace::{Backtrace, BacktraceStatus},
    panic::PanicHookInfo,
    sync::Once,
};
use thiserror::Error;
use tracing::Subscriber;
use tracing::field::display;
use tracing::subscriber::{SetGlobalDefaultError, set_global_default};
use tracing_appender::{
    non_blocking::{NonBlocking, WorkerGuard},
    rolling,
};
use tracing_log::{LogTracer, log_tracer::SetLoggerError};
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::{
    EnvFilter, FmtSubscriber, Layer, Registry, fmt, layer::SubscriberExt,
};

/// Directory of the rolling log files, relative to the working directory.
const LOG_DIR: &str = "logs";

/// JSON field name carrying the chaincode the invocation works on.
const CHAINCODE_KEY_IN_LOG: &str = "chaincode";

/// Errors that can occur during tracing initialization.
#[derive(Debug, Error)]
pub enum TracingError {
    #[error("failed to init log tracer: {0}")]
    InitLogTracer(#[from] SetLoggerError),

    #[error("failed to set global default subscriber: {0}")]
    SetGlobalDefault(#[from] SetGlobalDefaultError),

    #[error("an io error occurred: {0}")]
    Io(#[from] Error),
}

/// Log flusher handle for ensuring logs are written before the process exits.
///
/// The launcher is short lived, dropping the guard too early loses the tail
/// of the log file.
#[must_use]
pub enum LogFlusher {
    Flusher(WorkerGuard),
    NullFlusher,
}

static INIT_TEST_TRACING: Once = Once::new();

/// Initializes tracing for tests.
///
/// Set `ENABLE_TRACING=1` to view tracing output:
/// ```bash
/// ENABLE_TRACING=1 cargo test test_name
/// ```
pub fn init_test_tracing() {
    INIT_TEST_TRACING.call_once(|| {
        if std::env::var("ENABLE_TRACING").is_ok() {
            // Without an explicit environment the launcher assumes prod and logs to files.
            Environment::Dev.set();
            let _log_flusher =
                init_tracing("test").expect("Failed to initialize tracing for tests");
        }
    });
}

static CHAINCODE: OnceLock<String> = OnceLock::new();

/// Sets the chaincode label or id injected into every JSON log entry.
///
/// Only the first call has an effect.
pub fn set_global_chaincode(chaincode: String) {
    let _ = CHAINCODE.set(chaincode);
}

/// Returns the chaincode set through [`set_global_chaincode`].
pub fn get_global_chaincode() -> Option<&'static str> {
    CHAINCODE.get().map(|s| s.as_str())
}

/// Writer wrapper that injects the chaincode field into JSON log entries.
struct ChaincodeInjectingWriter<W> {
    inner: W,
}

impl<W> ChaincodeInjectingWriter<W> {
    fn new(inner: W) -> Self {
        Self { inner }
    }
}

impl<W> Write for ChaincodeInjectingWriter<W>
where
    W: Write,
{
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        if let Some(chaincode) = get_global_chaincode()
            && let Ok(json_str) = std::str::from_utf8(buf)
            && let Ok(serde_json::Value::Object(mut map)) =
                serde_json::from_str::<serde_json::Value>(json_str)
            && !map.contains_key(CHAINCODE_KEY_IN_LOG)
        {
            map.insert(
                CHAINCODE_KEY_IN_LOG.to_string(),
                serde_json::Value::String(chaincode.to_string()),
            );

            if let Ok(modified) = serde_json::to_string(&map) {
                // Preserve trailing newline if present
                let output = if json_str.ends_with('\n') {
                    format!("{modified}\n")
                } else {
                    modified
                };

                // The caller only knows about the original buffer.
                return self.inner.write_all(output.as_bytes()).map(|_| buf.len());
            }
        }

        self.inner.write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.inner.flush()
    }
}

/// Initializes tracing for the application.
///
/// Production environments log JSON to stderr and to rotating files,
/// development environments pretty print to stderr.
pub fn init_tracing(app_name: &str) -> Result<LogFlusher, TracingError> {
    // Capture logs emitted through the `log` crate by dependencies such as `kube` and `reqwest`.
    LogTracer::init()?;

    let is_prod = Environment::load()?.is_prod();

    // Default to `info` when `RUST_LOG` is not set.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into());

    let log_flusher = if is_prod {
        configure_prod_tracing(filter, app_name)?
    } else {
        configure_dev_tracing(filter)?
    };

    set_tracing_panic_hook();

    Ok(log_flusher)
}

fn configure_prod_tracing(filter: EnvFilter, app_name: &str) -> Result<LogFlusher, TracingError> {
    // The peer relays stderr of builders into its own log, so stderr always gets every event.
    let stderr_layer = json_layer(|| ChaincodeInjectingWriter::new(std::io::stderr()));

    let (file_layer, log_flusher) = match rolling_file_writer(app_name, Path::new(LOG_DIR)) {
        Some((file_writer, guard)) => (
            Some(json_layer(move || {
                ChaincodeInjectingWriter::new(file_writer.make_writer())
            })),
            LogFlusher::Flusher(guard),
        ),
        None => (None, LogFlusher::NullFlusher),
    };

    let subscriber = Registry::default()
        .with(filter)
        .with(stderr_layer)
        .with(file_layer);

    set_global_default(subscriber)?;

    Ok(log_flusher)
}

/// Daily rotating writer under `log_dir`, if that directory is usable.
///
/// The launcher runs in whatever working directory the peer has, which may
/// not be writable.
fn rolling_file_writer(app_name: &str, log_dir: &Path) -> Option<(NonBlocking, WorkerGuard)> {
    let file_appender = rolling::Builder::new()
        .filename_prefix(app_name)
        .filename_suffix("log")
        .rotation(rolling::Rotation::DAILY)
        .max_log_files(5)
        .build(log_dir)
        .ok()?;

    Some(tracing_appender::non_blocking(file_appender))
}

fn json_layer<S, W>(make_writer: W) -> impl Layer<S>
where
    S: Subscriber + for<'span> LookupSpan<'span>,
    W: for<'writer> MakeWriter<'writer> + Send + Sync + 'static,
{
    let format = fmt::format()
        .with_level(true)
        .with_ansi(false)
        .with_target(false);

    fmt::layer()
        .event_format(format)
        .with_writer(make_writer)
        .json()
        .with_current_span(true)
        .with_span_list(true)
}

fn configure_dev_tracing(filter: EnvFilter) -> Result<LogFlusher, TracingError> {
    let format = fmt::format()
        .with_level(true)
        .with_ansi(true)
        .pretty()
        .with_line_number(false)
        .with_file(false)
        .with_target(true);

    let subscriber = FmtSubscriber::builder()
        .event_format(format)
        .with_env_filter(filter)
        // The peer captures stdout of builders, keep it free for its own protocol.
        .with_writer(std::io::stderr)
        .finish();

    set_global_default(subscriber)?;

    Ok(LogFlusher::NullFlusher)
}

/// Replaces the default panic hook so panics also reach the log files.
fn set_tracing_panic_hook() {
    let prev_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        panic_hook(info);
        prev_hook(info);
    }));
}

fn panic_hook(panic_info: &PanicHookInfo) {
    let backtrace = Backtrace::capture();
    let (backtrace, note) = match backtrace.status() {
        BacktraceStatus::Captured => (Some(backtrace), None),
        BacktraceStatus::Disabled => (
            None,
            Some("run with RUST_BACKTRACE=1 to display backtraces"),
        ),
        BacktraceStatus::Unsupported => {
            (None, Some("backtraces are not supported on this platform"))
        }
        _ => (None, Some("backtrace status is unknown")),
    };

    let payload = if let Some(s) = panic_info.payload().downcast_ref::<&str>() {
        s
    } else if let Some(s) = panic_info.payload().downcast_ref::<String>() {
        s
    } else {
        "unknown panic payload"
    };

    let location = panic_info.location().map(|location| location.to_string());

    tracing::error!(
        panic.payload = payload,
        payload.location = location,
        panic.backtrace = backtrace.map(display),
        panic.note = note,
        "a panic occurred",
    );
}
