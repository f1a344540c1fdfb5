use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::OnceCell;

use crate::categories::extract_categories;
use crate::client::WikiClient;
use crate::edit::{EditOutcome, EditRequest, apply_edit};
use crate::error::WikidocError;
use crate::response::{PageLookup, lookup_page};
use crate::revision::{RevisionCache, RevisionSnapshot};
use crate::templates::{TemplateInvocation, extract_templates};
use crate::title::Title;
use crate::transport::{Query, Transport};

struct DocumentState {
    client: WikiClient,
    title: Title,
    revision: RevisionCache,
    creator: OnceCell<String>,
}

/// Handle on one wiki document.
///
/// Every read is served from a single memoized fetch of the current revision. Clones are the
/// same handle and share that state; see [`Document::is_same`].
#[derive(Clone)]
pub struct Document {
    state: Arc<DocumentState>,
}

impl Document {
    pub(crate) fn new(client: WikiClient, title: Title) -> Self {
        let revision = RevisionCache::new(title.prefixed_text(), client.transport_handle());
        Self {
            state: Arc::new(DocumentState {
                client,
                title,
                revision,
                creator: OnceCell::new(),
            }),
        }
    }

    pub fn title(&self) -> &Title {
        &self.state.title
    }

    /// Whether `other` is this very handle rather than another handle on the same title.
    pub fn is_same(&self, other: &Document) -> bool {
        Arc::ptr_eq(&self.state, &other.state)
    }

    pub async fn revision(&self, use_cache: bool) -> Result<Arc<RevisionSnapshot>, WikidocError> {
        self.state.revision.ensure_loaded(use_cache).await
    }

    /// Current text; an absent document reads as empty text.
    pub async fn text(&self, use_cache: bool) -> Result<String, WikidocError> {
        Ok(self.revision(use_cache).await?.text.clone())
    }

    /// Top-level templates of the current revision.
    pub async fn templates(&self) -> Result<Vec<TemplateInvocation>, WikidocError> {
        let snapshot = self.revision(true).await?;
        extract_templates(snapshot.parse_tree.as_deref().unwrap_or_default())
            .map_err(|err| err.context(self.title()))
    }

    pub async fn categories(&self, include_links: bool) -> Result<Vec<String>, WikidocError> {
        let snapshot = self.revision(true).await?;
        Ok(extract_categories(&snapshot.text, include_links))
    }

    pub async fn last_modified(&self) -> Result<Option<DateTime<Utc>>, WikidocError> {
        Ok(self.revision(true).await?.last_modified)
    }

    pub async fn last_editor(&self) -> Result<Option<String>, WikidocError> {
        Ok(self.revision(true).await?.last_editor.clone())
    }

    /// Author of the first revision. Memoized once it succeeds.
    pub async fn creator(&self) -> Result<String, WikidocError> {
        let creator = self
            .state
            .creator
            .get_or_try_init(|| fetch_creator(self.state.client.transport(), self.title()))
            .await?;
        Ok(creator.clone())
    }

    /// Asks the store whether the page exists. Does not consult or fill the revision cache.
    pub async fn exists(&self) -> Result<bool, WikidocError> {
        let query = Query::new()
            .with("action", "query")
            .with("prop", "info")
            .with("indexpageids", true)
            .with("titles", self.title().prefixed_text());
        let payload = self.state.client.transport().get(query).await?;
        Ok(matches!(lookup_page(&payload)?, PageLookup::Present(_)))
    }

    /// The talk-namespace counterpart. A handle already in a talk namespace (or in a virtual
    /// namespace without one) returns itself.
    pub fn talk_page(&self) -> Result<Document, WikidocError> {
        match self.title().talk(self.state.client.namespaces())? {
            Some(talk) => Ok(self.state.client.document_for(talk)),
            None => Ok(self.clone()),
        }
    }

    pub async fn edit(&self, request: &EditRequest) -> Result<EditOutcome, WikidocError> {
        apply_edit(
            self.state.client.transport(),
            self.state.client.config(),
            self.title(),
            request,
        )
        .await
    }

    /// Forgets the memoized revision so the next read fetches again.
    pub fn invalidate(&self) {
        self.state.revision.invalidate();
    }
}

impl fmt::Display for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self.title(), f)
    }
}

impl fmt::Debug for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Document")
            .field("title", self.title())
            .field("loaded", &self.state.revision.cached().is_some())
            .finish()
    }
}

pub(crate) fn creator_query(title: &Title) -> Query {
    Query::new()
        .with("action", "query")
        .with("prop", "revisions")
        .with("rvprop", "user")
        .with("rvdir", "newer")
        .with("rvlimit", 1i64)
        .with("indexpageids", true)
        .with("titles", title.prefixed_text())
}

async fn fetch_creator(transport: &dyn Transport, title: &Title) -> Result<String, WikidocError> {
    let payload = transport.get(creator_query(title)).await?;
    let page = match lookup_page(&payload)? {
        PageLookup::Present(page) => page,
        PageLookup::Missing => {
            return Err(WikidocError::NotFound {
                title: title.to_string(),
                payload,
            });
        }
    };
    match page.revisions.into_iter().next().and_then(|rev| rev.user) {
        Some(user) => Ok(user),
        None => Err(WikidocError::NotFound {
            title: title.to_string(),
            payload,
        }),
    }
}
