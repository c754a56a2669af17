use clap::ValueEnum;
use serde::Deserialize;
use slog::{o, Drain as _, Level, LevelFilter, Logger};
use slog_async::Async;
use slog_term::{FullFormat, TermDecorator};
use strum::EnumString;

#[derive(Clone, Copy, Debug, Default, Deserialize, EnumString, Eq, PartialEq, ValueEnum)]
#[clap(rename_all = "kebab_case")]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum LogLevel {
    Error,
    #[default]
    Warning,
    Info,
    Debug,
}

impl LogLevel {
    pub fn as_slog_level(&self) -> Level {
        match self {
            LogLevel::Error => Level::Error,
            LogLevel::Warning => Level::Warning,
            LogLevel::Info => Level::Info,
            LogLevel::Debug => Level::Debug,
        }
    }
}

/// Run `f` with a logger writing to the terminal. Buffered messages are flushed before this
/// returns.
pub fn run_with_logger<T>(log_level: LogLevel, f: impl FnOnce(Logger) -> T) -> T {
    let decorator = TermDecorator::new().stderr().build();
    let drain = FullFormat::new(decorator).build().fuse();
    let drain = Async::new(drain).build().fuse();
    let drain = LevelFilter::new(drain, log_level.as_slog_level()).fuse();
    let log = Logger::root(drain, o!());
    f(log)
}
