//! A library for downloading the assets of a repository's latest release.
//!
//! It looks up the latest release of a repository with the GitHub REST API, picks the release's
//! assets (downloadable files) whose names match a regex, and downloads each of them into a
//! directory, one after another.
//!
//! This project also ships a CLI tool named `relget`.
//!
//! The main entry point for programmatic use is the [`RelgetBuilder`] struct. Here is an example
//! of its usage:
//!
//! ```ignore
//! use relget::RelgetBuilder;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let relget = RelgetBuilder::new()
//!         .repo("houseabsolute/precious")
//!         .matching(r"\.tar\.gz$")
//!         .download_to("/tmp/precious")
//!         .build()?;
//!
//!     relget.run().await?;
//!
//!     Ok(())
//! }
//! ```
//!
//! ## How Assets Are Picked
//!
//! Assets are checked in the order the API returns them. The regex is searched for anywhere in
//! the asset name, so `linux` matches `tool-x86_64-linux.tar.gz`. Anchor it with `^` and `$` if
//! you need to. Every asset that matches is downloaded to `<download dir>/<asset name>`,
//! replacing any file that is already there. Assets that don't match are skipped with a log
//! message.
//!
//! ## Errors
//!
//! There is no retrying and no partial success. The first error stops the run, and the error's
//! root cause is a [`RelgetError`]. A release with no assets at all is an error too.
//!
//! ## Features
//!
//! This crate offers several features to control the TLS dependency used by `reqwest`:
//!
#![doc = document_features::document_features!()]

mod builder;
mod downloader;
mod error;
mod github;
mod matcher;
mod relget;
#[cfg(test)]
mod test;

pub use crate::{
    builder::RelgetBuilder,
    error::{ErrorKind, RelgetError},
    github::{Asset, Release},
    relget::Relget,
};

// The version of the `relget` crate.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(feature = "logging")]
use fern::{
    colors::{Color, ColoredLevelConfig},
    Dispatch,
};

/// This function initializes logging for the application. It's public for the sake of the
/// `relget` binary, but it lives in the library crate so that test code can also enable logging.
///
/// # Errors
///
/// This can return a `log::SetLoggerError` error.
#[cfg(feature = "logging")]
pub fn init_logger(level: log::LevelFilter) -> Result<(), log::SetLoggerError> {
    let line_colors = ColoredLevelConfig::new()
        .error(Color::Red)
        .warn(Color::Yellow)
        .info(Color::BrightBlack)
        .debug(Color::BrightBlack)
        .trace(Color::BrightBlack);
    let level_colors = line_colors.info(Color::Green).debug(Color::Black);

    Dispatch::new()
        .format(move |out, message, record| {
            out.finish(format_args!(
                "{color_line}[{target}][{level}{color_line}] {message}\x1B[0m",
                color_line = format_args!(
                    "\x1B[{}m",
                    line_colors.get_color(&record.level()).to_fg_str()
                ),
                target = record.target(),
                level = level_colors.color(record.level()),
                message = message,
            ));
        })
        .level(level)
        // This is very noisy.
        .level_for("hyper", log::LevelFilter::Error)
        .level_for("reqwest", log::LevelFilter::Warn)
        .chain(std::io::stderr())
        .apply()
}
