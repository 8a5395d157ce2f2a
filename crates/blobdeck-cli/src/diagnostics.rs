use std::backtrace::Backtrace;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, Once, OnceLock, PoisonError};
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result, anyhow};
use blobdeck_core::executor::WORKER_THREAD_PREFIX;
use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_FILTER: &str =
    "blobdeck_core=debug,blobdeck_app=debug,blobdeck_tui=debug,blobdeck_cli=debug";

#[derive(Default)]
struct RuntimeDiagnostics {
    path: Option<PathBuf>,
    file: Option<File>,
}

static HOOK_ONCE: Once = Once::new();
static STATE: OnceLock<Mutex<RuntimeDiagnostics>> = OnceLock::new();

fn diagnostics_state() -> &'static Mutex<RuntimeDiagnostics> {
    STATE.get_or_init(|| Mutex::new(RuntimeDiagnostics::default()))
}

fn epoch_millis() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis()
}

pub struct DiagnosticsSession {
    path: Option<PathBuf>,
}

impl DiagnosticsSession {
    /// Installs the panic hook, and when `enabled` opens a fresh log next to
    /// `config_path` and routes `tracing` events into it.
    pub fn initialize(enabled: bool, config_path: &Path) -> Result<Self> {
        install_panic_hook();
        if !enabled {
            let mut state = diagnostics_state()
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            state.path = None;
            state.file = None;
            return Ok(Self { path: None });
        }

        let path = create_diagnostics_log_path(config_path)?;
        let mut file = OpenOptions::new()
            .create_new(true)
            .write(true)
            .open(&path)
            .with_context(|| format!("failed to create diagnostics log at {}", path.display()))?;

        writeln!(
            file,
            "blobdeck diagnostics start\nversion={}\nstart_epoch_ms={}\npid={}",
            env!("CARGO_PKG_VERSION"),
            epoch_millis(),
            std::process::id()
        )
        .with_context(|| format!("failed to write diagnostics header to {}", path.display()))?;
        writeln!(file, "argv={:?}", std::env::args().collect::<Vec<String>>())
            .with_context(|| format!("failed to write diagnostics args to {}", path.display()))?;
        file.flush()
            .with_context(|| format!("failed to flush diagnostics header to {}", path.display()))?;

        let event_file = file
            .try_clone()
            .with_context(|| format!("failed to share diagnostics log {}", path.display()))?;
        install_subscriber(event_file)?;

        let mut state = diagnostics_state()
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        state.path = Some(path.clone());
        state.file = Some(file);

        Ok(Self { path: Some(path) })
    }

    pub fn path(&self) -> Option<&PathBuf> {
        self.path.as_ref()
    }

    pub fn record<S: AsRef<str>>(&self, entry: S) {
        append_line(entry.as_ref());
    }
}

fn install_subscriber(file: File) -> Result<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .try_init()
        .map_err(|error| anyhow!("failed to install diagnostics subscriber: {error}"))
}

fn install_panic_hook() {
    HOOK_ONCE.call_once(|| {
        std::panic::set_hook(Box::new(|panic_info| {
            let payload = panic_payload(panic_info);
            let location = panic_info
                .location()
                .map(|value| format!("{}:{}:{}", value.file(), value.line(), value.column()))
                .unwrap_or_else(|| "UNCONFIRMED".to_string());

            // Executor workers catch their panics and report them as item failures.
            if is_recovered_worker_panic(std::thread::current().name()) {
                append_line("recovered worker panic");
                append_line(format!("panic_message={payload}"));
                append_line(format!("panic_location={location}"));
                return;
            }

            let backtrace = Backtrace::force_capture();
            append_line("panic captured");
            append_line(format!("panic_message={payload}"));
            append_line(format!("panic_location={location}"));
            append_line(format!("panic_backtrace={backtrace:?}"));

            let path = diagnostics_state()
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .path
                .clone();

            eprintln!("Fatal internal error in blobdeck.");
            match path {
                Some(path) => {
                    eprintln!("Diagnostics written to {}", path.display());
                }
                None => {
                    eprintln!("Run `blobdeck --diagnostics` to capture a diagnostics log.");
                }
            }
        }));
    });
}

fn is_recovered_worker_panic(thread_name: Option<&str>) -> bool {
    thread_name.is_some_and(|name| name.starts_with(WORKER_THREAD_PREFIX))
}

fn panic_payload(panic_info: &std::panic::PanicHookInfo<'_>) -> String {
    if let Some(payload) = panic_info.payload().downcast_ref::<&str>() {
        return (*payload).to_string();
    }
    if let Some(payload) = panic_info.payload().downcast_ref::<String>() {
        return payload.clone();
    }
    "unknown panic payload".to_string()
}

fn append_line<S: AsRef<str>>(line: S) {
    let mut state = diagnostics_state()
        .lock()
        .unwrap_or_else(PoisonError::into_inner);
    let Some(file) = state.file.as_mut() else {
        return;
    };

    let _ = writeln!(file, "[{}] {}", epoch_millis(), line.as_ref());
    let _ = file.flush();
}

fn create_diagnostics_log_path(config_path: &Path) -> Result<PathBuf> {
    let config_dir = config_path.parent().ok_or_else(|| {
        anyhow!(
            "failed to resolve diagnostics directory from config path {}",
            config_path.display()
        )
    })?;

    let diagnostics_dir = config_dir.join("diagnostics");
    fs::create_dir_all(&diagnostics_dir).with_context(|| {
        format!(
            "failed to create diagnostics directory {}",
            diagnostics_dir.display()
        )
    })?;

    Ok(diagnostics_dir.join(format!("{}.log", epoch_millis())))
}

#[cfg(test)]
mod tests {
    use super::{create_diagnostics_log_path, is_recovered_worker_panic};

    #[test]
    fn log_path_sits_beside_the_config() {
        let temp = tempfile::tempdir().expect("temp dir");
        let config = temp.path().join("blobdeck").join("config.toml");

        let path = create_diagnostics_log_path(&config).expect("log path");

        assert_eq!(
            path.parent(),
            Some(temp.path().join("blobdeck").join("diagnostics").as_path())
        );
        assert!(path.parent().is_some_and(|dir| dir.is_dir()));
        assert_eq!(path.extension().and_then(|ext| ext.to_str()), Some("log"));
    }

    #[test]
    fn only_executor_workers_count_as_recovered() {
        assert!(is_recovered_worker_panic(Some("blobdeck-exec-0")));
        assert!(is_recovered_worker_panic(Some("blobdeck-exec-12")));
        assert!(!is_recovered_worker_panic(Some("main")));
        assert!(!is_recovered_worker_panic(Some("blobdeck-job")));
        assert!(!is_recovered_worker_panic(None));
    }
}
