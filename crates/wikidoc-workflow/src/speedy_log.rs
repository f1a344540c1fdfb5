use chrono::{DateTime, Datelike, Utc};
use regex::Regex;
use wikidoc::title::NS_USER;
use wikidoc::{EditOutcome, EditRequest, Title, WikiClient, WikidocError};

use crate::timestamp::month_name;

/// Log subpage under the acting user's namespace.
pub const DEFAULT_LOG_PAGE: &str = "CSD log";

/// One speedy deletion nomination to record.
#[derive(Clone, Debug, Default)]
pub struct SpeedyLogEntry {
    pub title: String,
    pub reason: String,
    pub users_notified: Vec<String>,
    /// Overrides [`DEFAULT_LOG_PAGE`].
    pub log_page: Option<String>,
}

impl SpeedyLogEntry {
    pub fn new(title: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            reason: reason.into(),
            ..Self::default()
        }
    }

    pub fn notified(mut self, user: impl Into<String>) -> Self {
        self.users_notified.push(user.into());
        self
    }

    pub fn log_page(mut self, page: impl Into<String>) -> Self {
        self.log_page = Some(page.into());
        self
    }

    /// The `# [[:Title]]: reason...` line, without the leading newline.
    pub fn render_line(&self) -> String {
        let mut line = format!("# [[:{}]]: {}", self.title, self.reason);
        if !self.users_notified.is_empty() {
            let users: Vec<String> = self
                .users_notified
                .iter()
                .map(|user| format!("{{{{user|1={user}}}}}"))
                .collect();
            line.push_str("; notified ");
            line.push_str(&users.join(", "));
        }
        line.push_str(" ~~~~~");
        line
    }
}

/// Whether `text` already has a section heading for the month of `now`.
pub fn has_month_header(text: &str, now: DateTime<Utc>) -> Result<bool, WikidocError> {
    let month = month_name(now.month()).unwrap_or_default();
    let pattern = format!(
        r"(?m)^==+\s*{}\s+{}\s*==+",
        regex::escape(month),
        now.year()
    );
    let header = Regex::new(&pattern)
        .map_err(|err| WikidocError::Config(format!("invalid log header pattern: {err}")))?;
    Ok(header.is_match(text))
}

/// Text appended to an existing log for `entry`.
pub fn log_addition(
    existing: &str,
    entry: &SpeedyLogEntry,
    now: DateTime<Utc>,
) -> Result<String, WikidocError> {
    let mut addition = String::new();
    if !has_month_header(existing, now)? {
        let month = month_name(now.month()).unwrap_or_default();
        addition.push_str(&format!("\n\n=== {month} {} ===", now.year()));
    }
    addition.push('\n');
    addition.push_str(&entry.render_line());
    addition.push('\n');
    Ok(addition)
}

/// Appends `entry` to the acting user's speedy deletion log.
///
/// Users who have not started a log (empty or absent page) are left alone and the call
/// resolves to `None`.
pub async fn log_speedy_deletion(
    client: &WikiClient,
    entry: &SpeedyLogEntry,
    now: DateTime<Utc>,
) -> Result<Option<EditOutcome>, WikidocError> {
    let actor = client.config().actor.trim();
    if actor.is_empty() {
        return Err(WikidocError::Config(
            "speedy deletion log needs an acting user".to_string(),
        ));
    }
    let page = entry.log_page.as_deref().unwrap_or(DEFAULT_LOG_PAGE);
    let title = Title::new(NS_USER, &format!("{actor}/{page}"), client.namespaces())?;
    let log = client.document_for(title);

    let existing = log.text(false).await?;
    if existing.is_empty() {
        tracing::debug!(%log, "no speedy deletion log; skipping");
        return Ok(None);
    }

    let addition = log_addition(&existing, entry, now)?;
    let summary = format!("Logging speedy deletion nomination of [[{}]]", entry.title);
    let outcome = log.edit(&EditRequest::append(addition, summary)).await?;
    tracing::info!(%log, page = %entry.title, "logged speedy deletion nomination");
    Ok(Some(outcome))
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn march_2024() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 14, 10, 0, 0).unwrap()
    }

    #[test]
    fn renders_line_with_notified_users() {
        let entry = SpeedyLogEntry::new("Draft:Spam", "[[WP:G11|G11]]")
            .notified("Alice")
            .notified("Bob");
        assert_eq!(
            entry.render_line(),
            "# [[:Draft:Spam]]: [[WP:G11|G11]]; notified {{user|1=Alice}}, {{user|1=Bob}} ~~~~~"
        );
    }

    #[test]
    fn renders_line_without_notifications() {
        let entry = SpeedyLogEntry::new("Draft:Spam", "G11");
        assert_eq!(entry.render_line(), "# [[:Draft:Spam]]: G11 ~~~~~");
    }

    #[test]
    fn recognizes_existing_month_header() {
        let now = march_2024();
        assert!(has_month_header("intro\n\n=== March 2024 ===\n# x", now).unwrap());
        assert!(has_month_header("==March  2024==", now).unwrap());
        assert!(!has_month_header("=== February 2024 ===", now).unwrap());
        assert!(!has_month_header("=== March 2023 ===", now).unwrap());
        assert!(!has_month_header("see March 2024 ===", now).unwrap());
    }

    #[test]
    fn addition_adds_header_only_when_missing() {
        let now = march_2024();
        let entry = SpeedyLogEntry::new("Draft:Spam", "G11");
        assert_eq!(
            log_addition("=== February 2024 ===", &entry, now).unwrap(),
            "\n\n=== March 2024 ===\n# [[:Draft:Spam]]: G11 ~~~~~\n"
        );
        assert_eq!(
            log_addition("=== March 2024 ===", &entry, now).unwrap(),
            "\n# [[:Draft:Spam]]: G11 ~~~~~\n"
        );
    }
}
