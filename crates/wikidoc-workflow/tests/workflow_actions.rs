use std::sync::Arc;

use chrono::{TimeZone, Utc};
use serde_json::{Value, json};
use wikidoc::{Method, ScriptedTransport, TransportError, WikiClient, WikiConfig, WikidocError};
use wikidoc_workflow::{
    MoveOutcome, MoveRequest, Notification, SpeedyLogEntry, init_tracing, is_participant,
    log_speedy_deletion, move_page, notify_user,
};

fn client_with(transport: Arc<ScriptedTransport>, dry_run: bool) -> WikiClient {
    init_tracing(Some("wikidoc=debug,wikidoc_workflow=debug"));
    let config = WikiConfig {
        edit_token: "token+\\".into(),
        actor: "Reviewer".into(),
        summary_suffix: " (review helper)".into(),
        dry_run,
        ..WikiConfig::default()
    };
    WikiClient::new(transport, config)
}

fn page_reply(title: &str, text: &str) -> Value {
    json!({
        "query": {
            "pageids": ["77"],
            "pages": {"77": {
                "pageid": 77,
                "title": title,
                "revisions": [{"user": "Reviewer", "timestamp": "2024-03-01T00:00:00Z", "*": text}]
            }}
        }
    })
}

fn missing_reply(title: &str) -> Value {
    json!({
        "query": {
            "pageids": ["-1"],
            "pages": {"-1": {"title": title, "missing": ""}}
        }
    })
}

fn edit_success(title: &str) -> Value {
    json!({
        "edit": {
            "result": "Success",
            "pageid": 77,
            "title": title,
            "oldrevid": 10,
            "newrevid": 11,
            "newtimestamp": "2024-03-14T10:00:00Z"
        }
    })
}

#[tokio::test]
async fn move_reports_destination() {
    let transport = Arc::new(ScriptedTransport::new());
    transport.push_reply(json!({
        "move": {"from": "Draft:Example", "to": "Example", "reason": "Accepted"}
    }));
    let client = client_with(transport.clone(), false);

    let outcome = move_page(
        &client,
        &MoveRequest::new("Draft:Example", "Example", "Accepted").with("movetalk", true),
    )
    .await
    .expect("moved");
    assert_eq!(outcome.destination(), "Example");
    assert!(matches!(outcome, MoveOutcome::Moved(_)));

    let calls = transport.calls();
    assert_eq!(calls.len(), 1);
    let (method, query) = &calls[0];
    assert_eq!(*method, Method::Post);
    assert_eq!(query.get_str("action").as_deref(), Some("move"));
    assert_eq!(query.get_str("reason").as_deref(), Some("Accepted (review helper)"));
    assert_eq!(query.get_str("movetalk").as_deref(), Some("1"));
}

#[tokio::test]
async fn move_without_move_object_is_rejected() {
    let transport = Arc::new(ScriptedTransport::new());
    transport.push_reply(json!({"warnings": {"main": {"*": "nothing happened"}}}));
    let client = client_with(transport, false);

    let err = move_page(&client, &MoveRequest::new("Draft:Example", "Example", "Accepted"))
        .await
        .expect_err("rejected");
    match err {
        WikidocError::WriteRejected { title, payload } => {
            assert_eq!(title, "Draft:Example");
            assert!(payload.get("warnings").is_some());
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn move_error_envelope_surfaces_as_api_error() {
    let transport = Arc::new(ScriptedTransport::new());
    transport.push_reply(json!({
        "error": {"code": "articleexists", "info": "A page of that name already exists"}
    }));
    let client = client_with(transport, false);

    let err = move_page(&client, &MoveRequest::new("Draft:Example", "Example", "Accepted"))
        .await
        .expect_err("rejected");
    match err {
        WikidocError::Transport(TransportError::Api { code, payload, .. }) => {
            assert_eq!(code, "articleexists");
            assert!(payload.get("error").is_some());
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn dry_run_move_sends_nothing() {
    let transport = Arc::new(ScriptedTransport::new());
    let client = client_with(transport.clone(), true);

    let outcome = move_page(&client, &MoveRequest::new("Draft:Example", "Example", "Accepted"))
        .await
        .expect("simulated");
    assert_eq!(
        outcome,
        MoveOutcome::Simulated {
            to: "Example".into()
        }
    );
    assert_eq!(transport.call_count(), 0);
}

#[tokio::test]
async fn notification_appends_to_user_talk() {
    let transport = Arc::new(ScriptedTransport::new());
    transport.push_reply(edit_success("User talk:Submitter"));
    let client = client_with(transport.clone(), false);

    let outcome = notify_user(&client, "Submitter", &Notification::new("{{subst:afc talk}}"))
        .await
        .expect("notified");
    assert!(!outcome.is_simulated());

    let (_, query) = &transport.calls()[0];
    assert_eq!(query.get_str("title").as_deref(), Some("User talk:Submitter"));
    assert_eq!(
        query.get_str("appendtext").as_deref(),
        Some("\n\n{{subst:afc talk}}")
    );
    assert_eq!(
        query.get_str("summary").as_deref(),
        Some("Notifying user (review helper)")
    );
}

#[tokio::test]
async fn speedy_log_adds_month_header_when_missing() {
    let transport = Arc::new(ScriptedTransport::new());
    transport.push_reply(page_reply(
        "User:Reviewer/CSD log",
        "=== February 2024 ===\n# [[:Draft:Old]]: G11 ~~~~~",
    ));
    transport.push_reply(edit_success("User:Reviewer/CSD log"));
    let client = client_with(transport.clone(), false);
    let now = Utc.with_ymd_and_hms(2024, 3, 14, 10, 0, 0).unwrap();

    let entry = SpeedyLogEntry::new("Draft:Spam", "G11").notified("Submitter");
    let outcome = log_speedy_deletion(&client, &entry, now)
        .await
        .expect("logged");
    assert!(outcome.is_some());

    let calls = transport.calls();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[0].1.get_str("titles").as_deref(), Some("User:Reviewer/CSD log"));
    assert_eq!(
        calls[1].1.get_str("appendtext").as_deref(),
        Some("\n\n=== March 2024 ===\n# [[:Draft:Spam]]: G11; notified {{user|1=Submitter}} ~~~~~\n")
    );
    assert_eq!(
        calls[1].1.get_str("summary").as_deref(),
        Some("Logging speedy deletion nomination of [[Draft:Spam]] (review helper)")
    );
}

#[tokio::test]
async fn speedy_log_reuses_existing_month_header() {
    let transport = Arc::new(ScriptedTransport::new());
    transport.push_reply(page_reply("User:Reviewer/CSD log", "=== March 2024 ===\n"));
    transport.push_reply(edit_success("User:Reviewer/CSD log"));
    let client = client_with(transport.clone(), false);
    let now = Utc.with_ymd_and_hms(2024, 3, 20, 8, 0, 0).unwrap();

    log_speedy_deletion(&client, &SpeedyLogEntry::new("Draft:Spam", "G11"), now)
        .await
        .expect("logged");
    assert_eq!(
        transport.calls()[1].1.get_str("appendtext").as_deref(),
        Some("\n# [[:Draft:Spam]]: G11 ~~~~~\n")
    );
}

#[tokio::test]
async fn absent_speedy_log_is_left_alone() {
    let transport = Arc::new(ScriptedTransport::new());
    transport.push_reply(missing_reply("User:Reviewer/CSD log"));
    let client = client_with(transport.clone(), false);
    let now = Utc.with_ymd_and_hms(2024, 3, 14, 10, 0, 0).unwrap();

    let outcome = log_speedy_deletion(&client, &SpeedyLogEntry::new("Draft:Spam", "G11"), now)
        .await
        .expect("no-op");
    assert!(outcome.is_none());
    assert_eq!(transport.call_count(), 1);
}

#[tokio::test]
async fn speedy_log_needs_an_actor() {
    let transport = Arc::new(ScriptedTransport::new());
    let client = WikiClient::new(transport.clone(), WikiConfig::default());
    let now = Utc.with_ymd_and_hms(2024, 3, 14, 10, 0, 0).unwrap();

    let err = log_speedy_deletion(&client, &SpeedyLogEntry::new("Draft:Spam", "G11"), now)
        .await
        .expect_err("no actor");
    assert!(matches!(err, WikidocError::Config(_)));
    assert_eq!(transport.call_count(), 0);
}

#[tokio::test]
async fn participant_check_reads_the_list() {
    let transport = Arc::new(ScriptedTransport::new());
    transport.push_reply(page_reply(
        "Wikipedia:WikiProject Articles for creation/Participants",
        "* {{user|Reviewer}}\n* {{user|Someone}}",
    ));
    let client = client_with(transport.clone(), false);
    let list = wikidoc_workflow::DEFAULT_PARTICIPANT_LIST;

    assert!(is_participant(&client, list, "Reviewer").await.expect("listed"));
    assert!(!is_participant(&client, list, "   ").await.expect("blank"));
    assert_eq!(transport.call_count(), 1);
}
