use crate::error::RelgetError;
use anyhow::{Context, Result};
use itertools::Itertools;
use lazy_regex::Lazy;
use log::debug;
use reqwest::{
    header::{HeaderValue, ACCEPT},
    Client,
};
use serde::{Deserialize, Deserializer, Serialize};
use url::Url;

pub(crate) static DEFAULT_API_BASE_URL: Lazy<Url> =
    Lazy::new(|| Url::parse("https://api.github.com").unwrap());

pub(crate) static PROJECT_BASE_URL: Lazy<Url> =
    Lazy::new(|| Url::parse("https://github.com").unwrap());

/// The latest release of a repository. Only the assets are kept from the API response.
#[derive(Debug, Deserialize, Serialize)]
pub struct Release {
    // A release without this field, or with `null`, is treated the same as one with an empty
    // list.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub assets: Vec<Asset>,
}

/// A downloadable file attached to a release.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq, Serialize)]
pub struct Asset {
    pub name: String,
    /// The download URL as the API sent it. It is only parsed when the asset is downloaded, so a
    /// bad URL on an asset that doesn't match never fails the run.
    #[serde(rename = "browser_download_url", default)]
    pub url: String,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<Asset>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<Asset>>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug)]
pub(crate) struct GitHub {
    repo: String,
    api_base_url: Url,
}

impl GitHub {
    pub(crate) fn new(repo: String, api_base_url: Url) -> Self {
        Self { repo, api_base_url }
    }

    pub(crate) fn repo(&self) -> &str {
        &self.repo
    }

    pub(crate) fn release_info_url(&self) -> Url {
        // The repo name was checked to be in `owner/name` form when it was parsed.
        let (owner, name) = self.repo.split_once('/').unwrap_or((&self.repo, ""));

        let mut url = self.api_base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments
                .pop_if_empty()
                .push("repos")
                .push(owner)
                .push(name)
                .push("releases")
                .push("latest");
        }
        url
    }

    pub(crate) async fn fetch_release(&self, client: &Client) -> Result<Release> {
        let url = self.release_info_url();
        debug!("Getting release info from `{url}`");

        let release = self
            .make_release_info_request(client, &url)
            .await
            .map_err(|source| RelgetError::Fetch {
                url: url.clone(),
                source,
            })?;
        debug!(
            "release for {} has {} asset(s): {}",
            self.repo,
            release.assets.len(),
            release.assets.iter().map(|a| a.name.as_str()).join(", "),
        );

        Ok(release)
    }

    async fn make_release_info_request(&self, client: &Client, url: &Url) -> Result<Release> {
        let req = client
            .get(url.clone())
            .header(ACCEPT, HeaderValue::from_static("application/json"))
            .build()
            .context("failed to build HTTP request")?;
        let resp = client
            .execute(req)
            .await
            .context("failed to execute HTTP request")?;

        if let Err(e) = resp.error_for_status_ref() {
            return Err(anyhow::Error::new(e));
        }

        // The body is never echoed into the error. The decode error already names the line and
        // column where it went wrong.
        resp.json::<Release>()
            .await
            .context("could not decode the response body as a release")
    }
}

/// Parses a repo given as `owner/name` or as the URL of any page in the project on the hosting
/// site, and returns it as `owner/name`.
pub(crate) fn parse_repo_name(repo: &str) -> Result<String, RelgetError> {
    let url = if repo.starts_with("https://") || repo.starts_with("http://") {
        Url::parse(repo)
    } else {
        PROJECT_BASE_URL.join(repo)
    }
    .map_err(|e| RelgetError::Configuration(format!("could not parse --repo {repo}: {e}")))?;

    let mut parts = url.path().split('/').skip(1);
    match (parts.next(), parts.next()) {
        (Some(owner), Some(name)) if !owner.is_empty() && !name.is_empty() => {
            debug!("Parsed --repo {repo} = {owner} / {name}");
            Ok(format!("{owner}/{name}"))
        }
        _ => Err(RelgetError::Configuration(format!(
            "could not parse owner and repo name from --repo {repo}, expected something like `owner/name`",
        ))),
    }
}
