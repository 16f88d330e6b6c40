use crate::error::RelgetError;
use log::debug;
use regex::Regex;

pub(crate) const MATCH_EVERYTHING: &str = ".*";

/// Decides which release assets get downloaded, based on their names.
#[derive(Clone, Debug)]
pub(crate) struct AssetMatcher {
    re: Regex,
}

impl AssetMatcher {
    pub(crate) fn new(pattern: &str) -> Result<Self, RelgetError> {
        let re = Regex::new(pattern).map_err(|source| RelgetError::Pattern {
            pattern: pattern.to_string(),
            source,
        })?;
        debug!("compiled asset name pattern `{pattern}`");
        Ok(Self { re })
    }

    // This is a search, not a full match, so `tar` matches `tool.tar.gz`. Use `^` and `$` to
    // anchor the pattern.
    pub(crate) fn is_match(&self, name: &str) -> bool {
        self.re.is_match(name)
    }

    pub(crate) fn pattern(&self) -> &str {
        self.re.as_str()
    }
}
