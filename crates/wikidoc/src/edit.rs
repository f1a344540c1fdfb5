use crate::config::WikiConfig;
use crate::error::WikidocError;
use crate::response::{SavedEdit, decode_edit};
use crate::title::Title;
use crate::transport::{Query, Transport};

/// How submitted content combines with the current text.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum EditMode {
    #[default]
    Replace,
    Append,
    Prepend,
}

impl EditMode {
    /// Parameter that overrides full replacement on the server side.
    fn field(self) -> Option<&'static str> {
        match self {
            EditMode::Replace => None,
            EditMode::Append => Some("appendtext"),
            EditMode::Prepend => Some("prependtext"),
        }
    }
}

/// A single write against one document.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EditRequest {
    pub content: String,
    pub summary: String,
    pub mode: EditMode,
    /// Only write when the document does not exist yet.
    pub create_only: bool,
    /// Skip the network call and report a simulated success.
    pub dry_run: bool,
}

impl EditRequest {
    pub fn replace(content: impl Into<String>, summary: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            summary: summary.into(),
            ..Self::default()
        }
    }

    pub fn append(content: impl Into<String>, summary: impl Into<String>) -> Self {
        Self {
            mode: EditMode::Append,
            ..Self::replace(content, summary)
        }
    }

    pub fn prepend(content: impl Into<String>, summary: impl Into<String>) -> Self {
        Self {
            mode: EditMode::Prepend,
            ..Self::replace(content, summary)
        }
    }

    pub fn create_only(mut self) -> Self {
        self.create_only = true;
        self
    }

    pub fn dry_run(mut self) -> Self {
        self.dry_run = true;
        self
    }
}

/// Result of an edit that did not fail.
#[derive(Clone, Debug, PartialEq)]
pub enum EditOutcome {
    Saved(SavedEdit),
    /// Dry run: nothing was sent.
    Simulated,
}

impl EditOutcome {
    pub fn is_simulated(&self) -> bool {
        matches!(self, EditOutcome::Simulated)
    }
}

/// Builds the single `action=edit` call for `request`.
pub fn edit_query(config: &WikiConfig, title: &Title, request: &EditRequest) -> Query {
    let mut query = Query::new()
        .with("action", "edit")
        .with("title", title.prefixed_text())
        .with("text", request.content.as_str())
        .with("summary", config.decorate_summary(&request.summary))
        .with("token", config.edit_token.as_str());
    if let Some(field) = request.mode.field() {
        query.set(field, request.content.as_str());
    }
    if request.create_only {
        query.set("createonly", true);
    }
    query
}

/// Copy of `query` safe to log: the edit token is masked.
pub(crate) fn redacted(query: &Query) -> Query {
    let mut shown = query.clone();
    if shown.get("token").is_some() {
        shown.set("token", "<redacted>");
    }
    shown
}

/// Sends one edit. Success requires the store's explicit success marker; no retries.
pub async fn apply_edit(
    transport: &dyn Transport,
    config: &WikiConfig,
    title: &Title,
    request: &EditRequest,
) -> Result<EditOutcome, WikidocError> {
    let query = edit_query(config, title, request);

    if request.dry_run || config.dry_run {
        tracing::debug!(%title, query = %redacted(&query), "dry run: edit not sent");
        return Ok(EditOutcome::Simulated);
    }

    let payload = transport.post(query).await.inspect_err(|err| {
        tracing::warn!(%title, error = %err, "edit failed");
    })?;
    match decode_edit(title.prefixed_text(), payload) {
        Ok(saved) => {
            tracing::info!(%title, revision = ?saved.new_revision, "saved");
            Ok(EditOutcome::Saved(saved))
        }
        Err(err) => {
            tracing::warn!(%title, error = %err, "edit rejected");
            Err(err)
        }
    }
}
