use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use parking_lot::Mutex;

use crate::error::WikidocError;
use crate::response::{PageLookup, lookup_page};
use crate::transport::{Query, Transport};

/// Current revision of a document as fetched in one round trip.
#[derive(Clone, Debug)]
pub struct RevisionSnapshot {
    pub text: String,
    pub last_modified: Option<DateTime<Utc>>,
    pub last_editor: Option<String>,
    /// Serialized template parse tree of `text`.
    pub parse_tree: Option<String>,
    pub fetched_at: Instant,
}

impl RevisionSnapshot {
    /// Snapshot standing in for a document that does not exist.
    pub fn absent() -> Self {
        Self {
            text: String::new(),
            last_modified: None,
            last_editor: None,
            parse_tree: None,
            fetched_at: Instant::now(),
        }
    }

    pub fn is_absent(&self) -> bool {
        self.text.is_empty() && self.last_editor.is_none() && self.last_modified.is_none()
    }
}

type PendingFetch = Shared<BoxFuture<'static, Result<Arc<RevisionSnapshot>, WikidocError>>>;

#[derive(Default)]
struct CacheState {
    snapshot: Option<Arc<RevisionSnapshot>>,
    pending: Option<(u64, PendingFetch)>,
    generation: u64,
}

/// Lazily fetches and memoizes the current revision of one document.
///
/// At most one fetch is in flight at a time; callers arriving while it runs await the same
/// shared future and observe the same result, error included.
pub struct RevisionCache {
    title: String,
    transport: Arc<dyn Transport>,
    state: Mutex<CacheState>,
}

impl RevisionCache {
    pub fn new(title: impl Into<String>, transport: Arc<dyn Transport>) -> Self {
        Self {
            title: title.into(),
            transport,
            state: Mutex::new(CacheState::default()),
        }
    }

    /// Returns the memoized snapshot when `use_cache` allows it, otherwise fetches (or joins
    /// the fetch already running).
    pub async fn ensure_loaded(
        &self,
        use_cache: bool,
    ) -> Result<Arc<RevisionSnapshot>, WikidocError> {
        let (generation, pending) = {
            let mut state = self.state.lock();
            if use_cache {
                if let Some(snapshot) = &state.snapshot {
                    tracing::trace!(title = %self.title, "revision cache hit");
                    return Ok(snapshot.clone());
                }
            }
            match &state.pending {
                Some((generation, pending)) => (*generation, pending.clone()),
                None => {
                    state.generation += 1;
                    let generation = state.generation;
                    let pending = fetch_revision(self.transport.clone(), self.title.clone())
                        .boxed()
                        .shared();
                    state.pending = Some((generation, pending.clone()));
                    (generation, pending)
                }
            }
        };

        let result = pending.await;

        let mut state = self.state.lock();
        if matches!(&state.pending, Some((current, _)) if *current == generation) {
            state.pending = None;
            if let Ok(snapshot) = &result {
                state.snapshot = Some(snapshot.clone());
            }
        }
        result
    }

    /// The memoized snapshot, without fetching.
    pub fn cached(&self) -> Option<Arc<RevisionSnapshot>> {
        self.state.lock().snapshot.clone()
    }

    /// Drops the memoized snapshot; the next read fetches again.
    ///
    /// A fetch already in flight is abandoned: its waiters still get its result, but it is not
    /// memoized and later reads do not join it.
    pub fn invalidate(&self) {
        let mut state = self.state.lock();
        state.snapshot = None;
        state.pending = None;
        state.generation += 1;
    }
}

pub(crate) fn revision_query(title: &str) -> Query {
    Query::new()
        .with("action", "query")
        .with("prop", "revisions")
        .with("rvprop", "content|timestamp|user")
        .with("rvgeneratexml", true)
        .with("indexpageids", true)
        .with("titles", title)
}

async fn fetch_revision(
    transport: Arc<dyn Transport>,
    title: String,
) -> Result<Arc<RevisionSnapshot>, WikidocError> {
    tracing::debug!(%title, "fetching current revision");
    let payload = transport.get(revision_query(&title)).await?;

    let page = match lookup_page(&payload)? {
        PageLookup::Missing => {
            tracing::debug!(%title, "document does not exist; using empty text");
            return Ok(Arc::new(RevisionSnapshot::absent()));
        }
        PageLookup::Present(page) => page,
    };

    let Some(revision) = page.revisions.into_iter().next() else {
        return Err(WikidocError::UnexpectedResponse {
            context: format!("{title} has no revisions"),
            payload,
        });
    };

    let last_modified = match revision.timestamp.as_deref() {
        Some(raw) => Some(
            DateTime::parse_from_rfc3339(raw)
                .map(|ts| ts.with_timezone(&Utc))
                .map_err(|err| WikidocError::UnexpectedResponse {
                    context: format!("invalid revision timestamp {raw}: {err}"),
                    payload: payload.clone(),
                })?,
        ),
        None => None,
    };

    Ok(Arc::new(RevisionSnapshot {
        text: revision.content.unwrap_or_default(),
        last_modified,
        last_editor: revision.user,
        parse_tree: revision.parsetree,
        fetched_at: Instant::now(),
    }))
}
