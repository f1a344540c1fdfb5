use wikidoc::{WikiClient, WikidocError};

/// Page listing the reviewers allowed to run the workflow.
pub const DEFAULT_PARTICIPANT_LIST: &str =
    "Wikipedia:WikiProject Articles for creation/Participants";

/// Whether `user` is mentioned on the participant list page.
///
/// An absent list page reads as empty text, so nobody is listed.
pub async fn is_participant(
    client: &WikiClient,
    list_title: &str,
    user: &str,
) -> Result<bool, WikidocError> {
    let user = user.trim();
    if user.is_empty() {
        return Ok(false);
    }
    let text = client.document(list_title)?.text(true).await?;
    let listed = text.contains(user);
    if !listed {
        tracing::warn!(%user, list = %list_title, "user is not on the participant list");
    }
    Ok(listed)
}
