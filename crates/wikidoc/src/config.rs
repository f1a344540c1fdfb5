use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::WikidocError;

const DEFAULT_API_URL: &str = "https://en.wikipedia.org/w/api.php";
const DEFAULT_USER_AGENT: &str = concat!("wikidoc/", env!("CARGO_PKG_VERSION"));
const DEFAULT_TIMEOUT_MS: u64 = 30_000;
/// Token MediaWiki hands to anonymous sessions.
const ANONYMOUS_EDIT_TOKEN: &str = "+\\";

/// Connection and identity settings for one wiki session.
///
/// Passed explicitly into [`WikiClient`](crate::client::WikiClient); nothing here is read
/// from ambient process state after construction.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct WikiConfig {
    pub api_url: Url,
    pub user_agent: String,
    pub timeout_ms: u64,
    /// Write-authorization token sent with every edit and move.
    pub edit_token: String,
    /// Account name of the reviewer driving the session.
    pub actor: String,
    /// Canonical name of the page the workflow was opened on.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_page: Option<String>,
    /// Appended verbatim to every edit summary and move reason.
    pub summary_suffix: String,
    /// When set, writes are logged and reported as simulated instead of being sent.
    pub dry_run: bool,
    /// Extra namespace prefixes (lowercase or not) mapped to namespace ids.
    pub namespaces: BTreeMap<String, i32>,
}

impl Default for WikiConfig {
    fn default() -> Self {
        Self {
            api_url: Url::parse(DEFAULT_API_URL).expect("default api url is valid"),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
            edit_token: ANONYMOUS_EDIT_TOKEN.to_string(),
            actor: String::new(),
            current_page: None,
            summary_suffix: String::new(),
            dry_run: false,
            namespaces: BTreeMap::new(),
        }
    }
}

impl WikiConfig {
    /// Loads a YAML configuration file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, WikidocError> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path)
            .map_err(|err| WikidocError::Config(format!("failed to read {}: {err}", path.display())))?;
        Self::from_yaml_str(&raw).map_err(|err| err.context(path.display()))
    }

    pub fn from_yaml_str(raw: &str) -> Result<Self, WikidocError> {
        let config: WikiConfig = serde_yaml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Overlays `WIKIDOC_API_URL`, `WIKIDOC_EDIT_TOKEN`, `WIKIDOC_ACTOR` and `WIKIDOC_DRY_RUN`.
    pub fn apply_env_overrides(mut self) -> Result<Self, WikidocError> {
        if let Ok(raw) = env::var("WIKIDOC_API_URL") {
            self.api_url = Url::parse(&raw)
                .map_err(|err| WikidocError::Config(format!("invalid WIKIDOC_API_URL {raw}: {err}")))?;
        }
        if let Ok(token) = env::var("WIKIDOC_EDIT_TOKEN") {
            self.edit_token = token;
        }
        if let Ok(actor) = env::var("WIKIDOC_ACTOR") {
            self.actor = actor;
        }
        if let Ok(raw) = env::var("WIKIDOC_DRY_RUN") {
            self.dry_run = parse_flag(&raw).ok_or_else(|| {
                WikidocError::Config(format!("invalid WIKIDOC_DRY_RUN value {raw}"))
            })?;
        }
        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> Result<(), WikidocError> {
        match self.api_url.scheme() {
            "http" | "https" => {}
            other => {
                return Err(WikidocError::Config(format!(
                    "unsupported api_url scheme {other} (expected http or https)"
                )));
            }
        }
        if self.edit_token.is_empty() {
            return Err(WikidocError::Config("edit_token must not be empty".into()));
        }
        if let Some(bad) = self
            .namespaces
            .keys()
            .find(|prefix| prefix.trim().is_empty() || prefix.contains(':'))
        {
            return Err(WikidocError::Config(format!(
                "invalid namespace prefix {bad:?}"
            )));
        }
        Ok(())
    }

    /// Applies the configured suffix to an edit summary or move reason.
    pub fn decorate_summary(&self, summary: &str) -> String {
        format!("{summary}{}", self.summary_suffix)
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" | "" => Some(false),
        _ => None,
    }
}
