use std::path::PathBuf;
use thiserror::Error;
use url::Url;

/// The errors that `relget` can produce. Every one of these is fatal for a run. The library
/// returns them wrapped in an [`anyhow::Error`], so use `downcast_ref::<RelgetError>()` to get at
/// them.
#[derive(Debug, Error)]
#[allow(clippy::module_name_repetitions)]
pub enum RelgetError {
    #[error("{0}")]
    Configuration(String),
    #[error("could not create a valid regular expression from `{pattern}`: {source}")]
    Pattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
    #[error("failed to get the latest release from {url}: {source:#}")]
    Fetch {
        url: Url,
        #[source]
        source: anyhow::Error,
    },
    #[error("could not find any assets in the latest release of {repo} (from {url})")]
    NoAssets { repo: String, url: Url },
    #[error("failed to download the asset `{name}` to {}: {source:#}", .path.display())]
    Download {
        name: String,
        path: PathBuf,
        #[source]
        source: anyhow::Error,
    },
}

/// The broad category of a [`RelgetError`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// Missing or unusable settings, like no repo or no usable download directory.
    Configuration,
    /// The asset name pattern is not a valid regex.
    Pattern,
    /// Getting the release metadata failed, or the release has no assets.
    Fetch,
    /// Creating, requesting, or writing a specific asset failed.
    Download,
}

impl RelgetError {
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            RelgetError::Configuration(_) => ErrorKind::Configuration,
            RelgetError::Pattern { .. } => ErrorKind::Pattern,
            RelgetError::Fetch { .. } | RelgetError::NoAssets { .. } => ErrorKind::Fetch,
            RelgetError::Download { .. } => ErrorKind::Download,
        }
    }
}
