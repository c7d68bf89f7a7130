use std::path::Path;

pub const LOG_FILE_BASENAME: &str = "todo-planner";
pub const LOG_FILE_SUFFIX: &str = "log";
pub const LOG_ROTATE_SIZE_BYTES: u64 = 10 * 1024 * 1024;
pub const LOG_ROTATE_KEEP_FILES: usize = 10;
pub const LOG_ENV: &str = "TODO_PLANNER_LOG";

/// Log files live next to the task and settings records.
pub fn log_directory(data_dir: &Path) -> &Path {
    data_dir
}

/// Level spec: `TODO_PLANNER_LOG`, then `RUST_LOG`, then a build-dependent default.
pub fn log_spec() -> String {
    let default_spec = if cfg!(debug_assertions) {
        "warn,todo_planner_lib=debug,todo_planner=debug"
    } else {
        "warn,todo_planner_lib=info,todo_planner=info"
    };
    [LOG_ENV, "RUST_LOG"]
        .iter()
        .filter_map(|key| std::env::var(key).ok())
        .find(|value| !value.trim().is_empty())
        .unwrap_or_else(|| default_spec.to_string())
}

pub fn init_logging(
    data_dir: &Path,
    verbose: bool,
) -> Result<flexi_logger::LoggerHandle, flexi_logger::FlexiLoggerError> {
    use flexi_logger::{
        detailed_format, Cleanup, Criterion, Duplicate, FileSpec, Logger, Naming, WriteMode,
    };

    std::fs::create_dir_all(data_dir)?;

    let handle = Logger::try_with_str(log_spec())?
        .log_to_file(
            FileSpec::default()
                .directory(log_directory(data_dir))
                .basename(LOG_FILE_BASENAME)
                .suffix(LOG_FILE_SUFFIX),
        )
        .write_mode(WriteMode::BufferAndFlush)
        .format_for_files(detailed_format)
        .rotate(
            Criterion::Size(LOG_ROTATE_SIZE_BYTES),
            Naming::Numbers,
            Cleanup::KeepLogFiles(LOG_ROTATE_KEEP_FILES),
        )
        // stdout carries command output, so diagnostics go to stderr.
        .duplicate_to_stderr(if verbose {
            Duplicate::Info
        } else {
            Duplicate::Warn
        })
        .start()?;

    install_panic_hook();

    log::debug!(
        "logger initialized dir={} rotate_size_bytes={} keep_files={}",
        log_directory(data_dir).display(),
        LOG_ROTATE_SIZE_BYTES,
        LOG_ROTATE_KEEP_FILES
    );
    Ok(handle)
}

/// Text of a panic payload; `panic!` produces either a `&str` or a `String`.
fn panic_message(payload: &(dyn std::any::Any + Send)) -> &str {
    if let Some(text) = payload.downcast_ref::<&str>() {
        *text
    } else if let Some(text) = payload.downcast_ref::<String>() {
        text.as_str()
    } else {
        "<opaque panic payload>"
    }
}

/// Routes panics into the log file before the default hook prints them.
fn install_panic_hook() {
    let previous = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let location = info.location().map_or_else(
            || "<unknown>".to_string(),
            |loc| format!("{}:{}", loc.file(), loc.line()),
        );
        log::error!(
            "panic at {location}: {}\n{}",
            panic_message(info.payload()),
            std::backtrace::Backtrace::force_capture()
        );
        previous(info);
    }));
}
