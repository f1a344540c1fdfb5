use wikidoc::title::NS_USER_TALK;
use wikidoc::{EditOutcome, EditRequest, Title, WikiClient, WikidocError};

const DEFAULT_SUMMARY: &str = "Notifying user";

/// Message left at the bottom of a user's talk page.
#[derive(Clone, Debug, Default)]
pub struct Notification {
    pub message: String,
    pub summary: Option<String>,
}

impl Notification {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            summary: None,
        }
    }

    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = Some(summary.into());
        self
    }
}

/// Appends `notification` to `User talk:<user>`.
pub async fn notify_user(
    client: &WikiClient,
    user: &str,
    notification: &Notification,
) -> Result<EditOutcome, WikidocError> {
    let title = Title::new(NS_USER_TALK, user, client.namespaces())?;
    let summary = notification.summary.as_deref().unwrap_or(DEFAULT_SUMMARY);
    tracing::debug!(%title, "notifying user");
    client
        .document_for(title)
        .edit(&EditRequest::append(
            format!("\n\n{}", notification.message),
            summary,
        ))
        .await
}
