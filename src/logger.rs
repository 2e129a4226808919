use crate::config::{Config, LogFormat, PACKAGE_VERSION};
use crate::prelude::*;
use slog::{o, Drain, Logger};

fn log_file_name() -> String {
    let stamp = chrono::offset::Local::now().format("%d-%m-%Y_%H-%M");
    format!("{}_{}.txt", env!("CARGO_PKG_NAME"), stamp)
}

fn open_log_file() -> UResult<std::fs::File> {
    Ok(std::fs::File::create(log_file_name())?)
}

/// Moves formatting off the calling thread and stamps the crate version
fn async_root<D>(drain: D) -> Logger
where
    D: Drain<Ok = (), Err = std::io::Error> + Send + 'static,
{
    let drain = slog_async::Async::new(drain.fuse()).build().fuse();
    Logger::root(drain, o!("version" => PACKAGE_VERSION))
}

/// Terminal logger writing the full format to stderr
pub fn configure_term_root() -> Logger {
    let decorator = slog_term::TermDecorator::new().stderr().build();
    async_root(
        slog_term::FullFormat::new(decorator)
            .use_local_timestamp()
            .build(),
    )
}

/// File logger using the compact format
pub fn configure_compact_root() -> UResult<Logger> {
    let decorator = slog_term::PlainDecorator::new(open_log_file()?);
    Ok(async_root(
        slog_term::CompactFormat::new(decorator)
            .use_local_timestamp()
            .build(),
    ))
}

/// File logger using the full format, keys in original order
pub fn configure_full_root() -> UResult<Logger> {
    let decorator = slog_term::PlainDecorator::new(open_log_file()?);
    Ok(async_root(
        slog_term::FullFormat::new(decorator)
            .use_original_order()
            .use_local_timestamp()
            .build(),
    ))
}

/// Root logger selected by the `log_format` setting
pub fn configure_root(config: &Config) -> UResult<Logger> {
    match config.log_format {
        LogFormat::Term => Ok(configure_term_root()),
        LogFormat::Compact => configure_compact_root(),
        LogFormat::Full => configure_full_root(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_files_are_named_after_the_crate() {
        let name = log_file_name();
        assert!(name.starts_with("tg_dispatch_"));
        assert!(name.ends_with(".txt"));
        // dd-mm-YYYY_HH-MM
        assert_eq!(name.len(), "tg_dispatch_".len() + 16 + ".txt".len());
    }
}
