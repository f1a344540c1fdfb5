//! Typed views over the reply shapes of the remote store.
//!
//! Replies stay as raw [`serde_json::Value`] at the transport boundary; the functions here turn
//! them into explicit variants so callers match on outcomes rather than probing for fields.

use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::Value;

use crate::error::WikidocError;

/// Page id the store uses for titles that do not exist.
pub const MISSING_PAGE_ID: &str = "-1";

#[derive(Clone, Debug, Deserialize)]
struct QueryEnvelope {
    query: Option<QueryBody>,
}

#[derive(Clone, Debug, Deserialize)]
struct QueryBody {
    #[serde(default)]
    pageids: Vec<String>,
    #[serde(default)]
    pages: BTreeMap<String, PageEntry>,
}

/// One entry of `query.pages`.
#[derive(Clone, Debug, Deserialize)]
pub struct PageEntry {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    missing: Option<Value>,
    #[serde(default)]
    pub revisions: Vec<RevisionEntry>,
}

/// One entry of a page's `revisions` list.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct RevisionEntry {
    #[serde(rename = "*", default)]
    pub content: Option<String>,
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default)]
    pub parsetree: Option<String>,
}

/// Outcome of a single-title query.
#[derive(Clone, Debug)]
pub enum PageLookup {
    Missing,
    Present(PageEntry),
}

/// Resolves the single page a `titles=` query with `indexpageids` asked for.
pub fn lookup_page(payload: &Value) -> Result<PageLookup, WikidocError> {
    let envelope: QueryEnvelope = serde_json::from_value(payload.clone()).map_err(|err| {
        WikidocError::UnexpectedResponse {
            context: format!("query reply did not decode: {err}"),
            payload: payload.clone(),
        }
    })?;
    let unexpected = |context: &str| WikidocError::UnexpectedResponse {
        context: context.to_string(),
        payload: payload.clone(),
    };

    let mut body = envelope.query.ok_or_else(|| unexpected("reply has no query"))?;
    let id = match body.pageids.first() {
        Some(id) => id.clone(),
        None => body
            .pages
            .keys()
            .next()
            .cloned()
            .ok_or_else(|| unexpected("reply lists no pages"))?,
    };

    if id == MISSING_PAGE_ID {
        return Ok(PageLookup::Missing);
    }
    let page = body
        .pages
        .remove(&id)
        .ok_or_else(|| unexpected("page id has no page entry"))?;
    if page.missing.is_some() {
        return Ok(PageLookup::Missing);
    }
    Ok(PageLookup::Present(page))
}

#[derive(Clone, Debug, Deserialize)]
struct EditEnvelope {
    edit: Option<EditBody>,
}

#[derive(Clone, Debug, Deserialize)]
struct EditBody {
    result: Option<String>,
    #[serde(default)]
    pageid: Option<u64>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    oldrevid: Option<u64>,
    #[serde(default)]
    newrevid: Option<u64>,
    #[serde(default)]
    newtimestamp: Option<String>,
    #[serde(default)]
    nochange: Option<Value>,
}

/// Receipt for an edit the store accepted.
#[derive(Clone, Debug, PartialEq)]
pub struct SavedEdit {
    pub page_id: Option<u64>,
    pub title: Option<String>,
    pub old_revision: Option<u64>,
    pub new_revision: Option<u64>,
    pub timestamp: Option<String>,
    /// The submitted text matched the current revision.
    pub no_change: bool,
    pub raw: Value,
}

/// Accepts an edit reply only when it carries the explicit success marker.
pub fn decode_edit(title: &str, payload: Value) -> Result<SavedEdit, WikidocError> {
    let body = serde_json::from_value::<EditEnvelope>(payload.clone())
        .ok()
        .and_then(|envelope| envelope.edit)
        .filter(|body| body.result.as_deref() == Some("Success"));
    match body {
        Some(body) => Ok(SavedEdit {
            page_id: body.pageid,
            title: body.title,
            old_revision: body.oldrevid,
            new_revision: body.newrevid,
            timestamp: body.newtimestamp,
            no_change: body.nochange.is_some(),
            raw: payload,
        }),
        None => Err(WikidocError::WriteRejected {
            title: title.to_string(),
            payload,
        }),
    }
}
