use serde::Deserialize;
use wikidoc::{Query, WikiClient, WikidocError};

/// A page move with its logged reason.
#[derive(Clone, Debug, Default)]
pub struct MoveRequest {
    pub from: String,
    pub to: String,
    pub reason: String,
    /// Additional `action=move` parameters such as `movetalk` or `noredirect`.
    pub extra: Query,
}

impl MoveRequest {
    pub fn new(from: impl Into<String>, to: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            reason: reason.into(),
            extra: Query::new(),
        }
    }

    pub fn with(mut self, key: &str, value: impl Into<wikidoc::QueryValue>) -> Self {
        self.extra.set(key, value);
        self
    }
}

/// What the store reported for a completed move.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct MovedPage {
    pub from: String,
    pub to: String,
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default, rename = "talkfrom")]
    pub talk_from: Option<String>,
    #[serde(default, rename = "talkto")]
    pub talk_to: Option<String>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum MoveOutcome {
    Moved(MovedPage),
    /// Dry run: nothing was sent.
    Simulated { to: String },
}

impl MoveOutcome {
    /// Title the page lives under afterwards.
    pub fn destination(&self) -> &str {
        match self {
            MoveOutcome::Moved(moved) => &moved.to,
            MoveOutcome::Simulated { to } => to,
        }
    }
}

pub fn move_query(client: &WikiClient, request: &MoveRequest) -> Result<Query, WikidocError> {
    let from = client.title(&request.from)?;
    let to = client.title(&request.to)?;
    let config = client.config();
    let mut query = Query::new()
        .with("action", "move")
        .with("from", from.prefixed_text())
        .with("to", to.prefixed_text())
        .with("reason", config.decorate_summary(&request.reason))
        .with("token", config.edit_token.as_str());
    query.extend(request.extra.clone());
    Ok(query)
}

/// Moves a page. The reply must carry a `move` object to count as success.
///
/// Error envelopes from the store (bad token, protected title, ...) never reach this point:
/// the transport reports them as [`WikidocError::Transport`]. Any other reply without a
/// `move` object is a [`WikidocError::WriteRejected`] carrying the whole payload.
pub async fn move_page(
    client: &WikiClient,
    request: &MoveRequest,
) -> Result<MoveOutcome, WikidocError> {
    let query = move_query(client, request)?;
    let to = query.get_str("to").unwrap_or_default();
    if client.config().dry_run {
        tracing::info!(from = %request.from, %to, "dry run: move not sent");
        return Ok(MoveOutcome::Simulated { to });
    }

    let payload = client.transport().post(query).await?;
    match payload.get("move") {
        Some(moved) => {
            let moved: MovedPage = serde_json::from_value(moved.clone()).map_err(|err| {
                WikidocError::UnexpectedResponse {
                    context: format!("move reply did not decode: {err}"),
                    payload: payload.clone(),
                }
            })?;
            tracing::info!(from = %moved.from, to = %moved.to, "moved");
            Ok(MoveOutcome::Moved(moved))
        }
        None => {
            tracing::warn!(from = %request.from, %to, reply = %payload, "move rejected");
            Err(WikidocError::WriteRejected {
                title: request.from.clone(),
                payload,
            })
        }
    }
}
