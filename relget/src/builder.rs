/// The `builder` module contains the `RelgetBuilder` struct which is used to create a `Relget`
/// instance.
use crate::{
    downloader::Downloader,
    error::RelgetError,
    github::{self, GitHub},
    matcher::{AssetMatcher, MATCH_EVERYTHING},
    relget::Relget,
};
use anyhow::Result;
use log::debug;
use reqwest::{
    header::{HeaderMap, HeaderValue, USER_AGENT},
    Client,
};
use std::{
    env,
    path::{Path, PathBuf},
};
use url::Url;

/// `RelgetBuilder` is used to create a [`Relget`] instance.
#[derive(Debug, Default)]
#[allow(clippy::module_name_repetitions)]
pub struct RelgetBuilder<'a> {
    repo: Option<&'a str>,
    matching: Option<&'a str>,
    download_to: Option<PathBuf>,
    include_draft: bool,
    api_base_url: Option<&'a str>,
}

impl<'a> RelgetBuilder<'a> {
    /// Returns a new empty `RelgetBuilder`.
    #[must_use]
    pub fn new() -> Self {
        RelgetBuilder::default()
    }

    /// Set the repo to download from. This can either be just the owner/name, like
    /// `houseabsolute/precious`, or the URL of any page in the project, like
    /// `https://github.com/houseabsolute/precious/releases`.
    ///
    /// This is required.
    #[must_use]
    pub fn repo(mut self, repo: &'a str) -> Self {
        self.repo = Some(repo);
        self
    }

    /// Set a regex that asset names must match to be downloaded. The regex may match anywhere in
    /// the name, so use `^` and `$` to anchor it. By default every asset is downloaded.
    #[must_use]
    pub fn matching(mut self, matching: &'a str) -> Self {
        self.matching = Some(matching);
        self
    }

    /// Set the directory to download assets into. If not set, it will default to the current
    /// working directory. The directory must already exist.
    #[must_use]
    pub fn download_to<P: AsRef<Path>>(mut self, download_to: P) -> Self {
        self.download_to = Some(download_to.as_ref().to_path_buf());
        self
    }

    /// Ask for draft releases to be considered. This is accepted for compatibility but currently
    /// has no effect, because only the latest release is ever fetched, and that is never a draft.
    #[must_use]
    pub fn include_draft(mut self, include_draft: bool) -> Self {
        self.include_draft = include_draft;
        self
    }

    /// Set the base URL for the release API. This is useful for testing or if you want to operate
    /// against an Enterprise version of GitHub. This should be something like
    /// `https://github.my-corp.example.com/api/v3`.
    #[must_use]
    pub fn api_base_url(mut self, api_base_url: &'a str) -> Self {
        self.api_base_url = Some(api_base_url);
        self
    }

    /// Builds a new [`Relget`] instance and returns it. This does not make any network requests.
    ///
    /// # Errors
    ///
    /// This returns a [`RelgetError::Configuration`] error if no repo was set, the repo can't be
    /// parsed, the API base URL is invalid, or the current directory can't be determined. It
    /// returns a [`RelgetError::Pattern`] error if the `matching` regex is invalid.
    pub fn build(self) -> Result<Relget> {
        let Some(repo) = self.repo else {
            return Err(RelgetError::Configuration("You must set a repo".to_string()).into());
        };
        let repo = github::parse_repo_name(repo)?;

        let matcher = AssetMatcher::new(self.matching.unwrap_or(MATCH_EVERYTHING))?;
        let api_base_url = self.parse_api_base_url()?;
        let download_to = download_to(self.download_to)?;
        debug!("include draft releases = {}", self.include_draft);

        Ok(Relget::new(
            GitHub::new(repo, api_base_url),
            Downloader::new(download_to, matcher),
            self.include_draft,
            reqwest_client()?,
        ))
    }

    fn parse_api_base_url(&self) -> Result<Url, RelgetError> {
        match self.api_base_url {
            Some(u) => Url::parse(u).map_err(|e| {
                RelgetError::Configuration(format!("could not parse the API base URL {u}: {e}"))
            }),
            None => Ok(github::DEFAULT_API_BASE_URL.clone()),
        }
    }
}

fn download_to(download_to: Option<PathBuf>) -> Result<PathBuf, RelgetError> {
    let download_to = if let Some(download_to) = download_to {
        download_to
    } else {
        env::current_dir().map_err(|e| {
            RelgetError::Configuration(format!(
                "Could not get the current working directory, please try passing the --download-to flag: {e}"
            ))
        })?
    };
    debug!("download dir = {}", download_to.display());
    Ok(download_to)
}

fn reqwest_client() -> Result<Client> {
    let builder = Client::builder().gzip(true);

    let mut headers = HeaderMap::new();
    headers.insert(
        USER_AGENT,
        HeaderValue::from_str(&format!("relget version {}", super::VERSION))?,
    );
    Ok(builder.default_headers(headers).build()?)
}
