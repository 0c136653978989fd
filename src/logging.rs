use std::fs;
use std::path::Path;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Installs the global subscriber for an analysis run: human-readable
/// events on stderr and JSON lines in `analysis.log` under `log_dir`,
/// rotated daily. `RUST_LOG` directives add to the `svh_analysis=info` default.
pub fn init_logging(log_dir: &Path) {
    // A run still proceeds with console output when the log folder is unwritable
    let _ = fs::create_dir_all(log_dir);

    let file_appender = tracing_appender::rolling::daily(log_dir, "analysis.log");
    let (run_log_writer, guard) = tracing_appender::non_blocking(file_appender);

    let run_log_layer = fmt::layer().json().with_writer(run_log_writer);
    let console_layer = fmt::layer().with_writer(std::io::stderr);

    let filter = match "svh_analysis=info".parse() {
        Ok(directive) => EnvFilter::from_default_env().add_directive(directive),
        Err(_) => EnvFilter::from_default_env(),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(run_log_layer)
        .with(console_layer)
        .init();

    // The writer flushes on drop; a run lasts as long as the process
    std::mem::forget(guard);
}
