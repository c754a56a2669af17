//! Legacy `mount(2)` on top of `nmount(2)`.
//!
//! FreeBSD's old `mount(2)` takes a filesystem-specific argument struct. Its replacement,
//! `nmount(2)`, takes a list of named options instead. [`dispatch`] looks the filesystem type up
//! in the [`registry`], translates the struct into an [`OptionList`] with the filesystem's
//! [`Encoder`], and calls `nmount(2)`. Filesystem types it doesn't know go to the old `mount(2)`
//! unchanged.

mod dispatch;
mod encoder;
mod error;
pub mod export;
pub mod ffi;
mod legacy;
mod options;
pub mod registry;
pub mod scratch;

pub use dispatch::{dispatch, MountSyscalls, SystemSyscalls};
pub use encoder::Encoder;
pub use error::{MountError, TranslationError};
pub use legacy::LegacyArgs;
pub use options::{Entries, Entry, OptionList, Options, Value};

#[cfg(test)]
pub(crate) fn test_logger() -> slog::Logger {
    use slog::Drain as _;
    let decorator = slog_term::PlainSyncDecorator::new(slog_term::TestStdoutWriter);
    let drain = slog_term::FullFormat::new(decorator).build().fuse();
    let drain = slog_async::Async::new(drain).build().fuse();
    slog::Logger::root(drain, slog::o!())
}
