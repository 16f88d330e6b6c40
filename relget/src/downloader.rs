use crate::{error::RelgetError, github::Asset, matcher::AssetMatcher};
use anyhow::{anyhow, Context, Result};
use log::{debug, info};
use reqwest::{
    header::{HeaderValue, ACCEPT},
    Client, StatusCode,
};
use std::{
    fs::File,
    io::Write,
    path::{Component, Path, PathBuf},
};
use url::Url;

#[derive(Debug)]
pub(crate) struct Downloader {
    download_to: PathBuf,
    matcher: AssetMatcher,
}

impl Downloader {
    pub(crate) fn new(download_to: PathBuf, matcher: AssetMatcher) -> Self {
        Self {
            download_to,
            matcher,
        }
    }

    pub(crate) fn download_to(&self) -> &Path {
        &self.download_to
    }

    /// Downloads every asset whose name matches, in the order given, and returns the paths that
    /// were written. The first failure stops the whole run, so later assets are never attempted.
    pub(crate) async fn download_matching(
        &self,
        client: &Client,
        assets: &[Asset],
    ) -> Result<Vec<PathBuf>> {
        debug!(
            "matching {} asset name(s) against `{}`",
            assets.len(),
            self.matcher.pattern(),
        );
        let mut downloaded = vec![];
        for asset in assets {
            if !self.matcher.is_match(&asset.name) {
                info!("Skipping the asset {}", asset.name);
                continue;
            }

            info!(
                "Downloading the asset {} to {}",
                asset.name,
                self.download_to.display(),
            );
            downloaded.push(self.download_asset(client, asset).await?);
        }

        Ok(downloaded)
    }

    pub(crate) async fn download_asset(&self, client: &Client, asset: &Asset) -> Result<PathBuf> {
        let path = self.download_to.join(&asset.name);
        self.write_asset(client, asset, &path)
            .await
            .map_err(|source| RelgetError::Download {
                name: asset.name.clone(),
                path: path.clone(),
                source,
            })?;

        info!(
            "Downloaded the file {} to {}",
            asset.name,
            self.download_to.display(),
        );
        Ok(path)
    }

    // The file is created before the request is made, and it is not removed if anything after
    // that fails.
    async fn write_asset(&self, client: &Client, asset: &Asset, path: &Path) -> Result<()> {
        check_asset_name(&asset.name)?;
        let url = Url::parse(&asset.url)
            .with_context(|| format!("the asset has an invalid download URL `{}`", asset.url))?;

        let mut file = File::create(path)
            .with_context(|| format!("failed to create file at {}", path.display()))?;

        debug!("downloading asset from {url}");
        let req = client
            .get(url)
            .header(ACCEPT, HeaderValue::from_static("application/octet-stream"))
            .build()
            .with_context(|| format!("failed to build HTTP request for {}", asset.url))?;
        let mut resp = client.execute(req).await.with_context(|| {
            format!(
                "failed to execute HTTP request to download asset from {}",
                asset.url
            )
        })?;
        if resp.status() != StatusCode::OK {
            let mut msg = format!("error requesting {}: {}", asset.url, resp.status());
            if let Ok(t) = resp.text().await {
                msg.push('\n');
                msg.push_str(&t);
            }
            return Err(anyhow!(msg));
        }

        let mut written = 0;
        while let Some(c) = resp.chunk().await.with_context(|| {
            format!(
                "failed to read chunk while downloading asset from {}",
                asset.url
            )
        })? {
            file.write_all(c.as_ref())
                .with_context(|| format!("failed to write chunk to {}", path.display()))?;
            written += c.len();
        }
        file.flush()
            .with_context(|| format!("failed to flush {}", path.display()))?;
        debug!("wrote {written} bytes to {}", path.display());

        Ok(())
    }
}

// The name comes from the API response and is joined onto the download directory, so it must not
// be able to point anywhere else.
fn check_asset_name(name: &str) -> Result<()> {
    let plain = |c: Component<'_>| match c {
        Component::Normal(_) => true,
        Component::Prefix(_) | Component::RootDir | Component::CurDir | Component::ParentDir => {
            false
        }
    };
    let mut components = Path::new(name).components().peekable();
    if components.peek().is_none() || !components.all(plain) {
        return Err(anyhow!(
            "the asset name `{name}` is not a relative path inside the download directory"
        ));
    }
    Ok(())
}
