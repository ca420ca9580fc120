use chrono::Local;
use env_logger::Builder;
use log::LevelFilter;
use std::env;
use std::io::Write;
use std::thread;

// Producers, consumers and pool workers all log through the same queue,
// so every line says which thread it came from.
fn thread_label() -> String {
    let current = thread::current();
    match current.name() {
        Some(name) => name.to_string(),
        None => format!("{:?}", current.id()),
    }
}

/// Installs the process logger at `level`. A `RUST_LOG` spec in the
/// environment takes precedence. Calling it again only moves the level.
pub fn set_log_level(level: LevelFilter) {
    let mut builder = Builder::new();
    builder
        .format(|buf, record| {
            writeln!(
                buf,
                "{} {:5} [{}] {} - {}",
                Local::now().format("%Y-%m-%d %H:%M:%S%.3f"),
                record.level(),
                thread_label(),
                record.module_path().unwrap_or("?"),
                record.args(),
            )
        })
        .filter(None, level);
    if let Ok(spec) = env::var("RUST_LOG") {
        builder.parse_filters(&spec);
    }
    if builder.try_init().is_err() {
        log::set_max_level(level);
    }
}
