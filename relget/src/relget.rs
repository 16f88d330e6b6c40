use crate::{
    downloader::Downloader,
    error::RelgetError,
    github::{GitHub, Release},
};
use anyhow::Result;
use log::{debug, info};
use reqwest::Client;
use std::path::PathBuf;

/// `Relget` fetches the latest release of a repository and downloads the release assets whose
/// names match a pattern. Use the [`RelgetBuilder`](crate::RelgetBuilder) struct to create a new
/// `Relget` instance.
#[derive(Debug)]
pub struct Relget {
    github: GitHub,
    downloader: Downloader,
    include_draft: bool,
    reqwest_client: Client,
}

impl Relget {
    pub(crate) fn new(
        github: GitHub,
        downloader: Downloader,
        include_draft: bool,
        reqwest_client: Client,
    ) -> Relget {
        Relget {
            github,
            downloader,
            include_draft,
            reqwest_client,
        }
    }

    /// Fetch the latest release and download every matching asset into the download directory,
    /// one at a time, in the order the API lists them. Returns the paths of the files that were
    /// written.
    ///
    /// # Errors
    ///
    /// Any error stops the run immediately, so assets after a failed one are never
    /// downloaded. The root cause of the returned error is always a
    /// [`RelgetError`](crate::RelgetError):
    ///
    /// * [`RelgetError::Fetch`] for network errors, non-2xx responses, or a response body that
    ///   can't be decoded.
    /// * [`RelgetError::NoAssets`] if the latest release has no assets at all. Nothing is written
    ///   in this case.
    /// * [`RelgetError::Download`] if the file for an asset cannot be created, the asset cannot be
    ///   requested, or its content cannot be written. A partially written file is left in place.
    pub async fn run(&self) -> Result<Vec<PathBuf>> {
        info!(
            "Checking for the latest available release from {}",
            self.github.repo(),
        );
        if self.include_draft {
            debug!("--include-draft was given, but the latest release is never a draft");
        }

        let release = self.fetch_release().await?;
        if release.assets.is_empty() {
            return Err(RelgetError::NoAssets {
                repo: self.github.repo().to_string(),
                url: self.github.release_info_url(),
            }
            .into());
        }

        let downloaded = self
            .downloader
            .download_matching(&self.reqwest_client, &release.assets)
            .await?;
        info!(
            "Downloaded {} of {} asset(s) to {}",
            downloaded.len(),
            release.assets.len(),
            self.downloader.download_to().display(),
        );

        Ok(downloaded)
    }

    /// Fetch the latest release without downloading anything.
    ///
    /// # Errors
    ///
    /// Returns a [`RelgetError::Fetch`] error if the request fails, the response status is not
    /// 2xx, or the response body can't be decoded. An empty asset list is not an error here.
    pub async fn fetch_release(&self) -> Result<Release> {
        self.github.fetch_release(&self.reqwest_client).await
    }
}
