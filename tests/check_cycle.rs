use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use proofpad::async_check::AsyncChecker;
use proofpad::checker::{CheckError, CheckService};
use proofpad::highlight::escape_html;
use proofpad::issue::parse_matches;
use proofpad::panel::{render_badge_html, MAX_REPLACEMENTS};
use proofpad::session::{CheckOutcome, CheckPhase, EditSession};
use proofpad::{Issue, TextStats};

const AGREEMENT_RESPONSE: &str = r#"{"matches":[{
    "offset": 2, "length": 3,
    "message": "Subject-verb agreement",
    "rule": {"issueType": "grammar"},
    "context": {"text": "I has a dog", "offset": 2, "length": 3},
    "replacements": [{"value": "have"}]
}]}"#;

/// Answers "I has a dog" with the agreement match and everything else with nothing.
#[derive(Default)]
struct ScriptedService {
    calls: AtomicUsize,
}

#[async_trait]
impl CheckService for ScriptedService {
    async fn check(&self, text: &str) -> Result<Vec<Issue>, CheckError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if text == "I has a dog" {
            Ok(parse_matches(AGREEMENT_RESPONSE)?)
        } else {
            Ok(Vec::new())
        }
    }
}

async fn next_outcome(checker: &mut AsyncChecker, session: &mut EditSession) -> CheckOutcome {
    let response = tokio::time::timeout(Duration::from_secs(5), checker.receive_response())
        .await
        .expect("check timed out")
        .expect("checker closed");
    session.complete_check(response.request_id, response.result)
}

#[tokio::test]
async fn test_subject_verb_agreement_scenario() {
    let service = Arc::new(ScriptedService::default());
    let mut checker = AsyncChecker::spawn(Arc::clone(&service), &tokio::runtime::Handle::current());
    let mut session = EditSession::new("I has a dog");

    let ticket = session.begin_check().unwrap();
    checker.request_check(ticket.request_id, ticket.text);
    assert_eq!(
        next_outcome(&mut checker, &mut session).await,
        CheckOutcome::Rendered { issue_count: 1 }
    );

    let panel = session.panel_html(MAX_REPLACEMENTS);
    assert_eq!(panel.matches(r#"<div class="issue-type">Grammar</div>"#).count(), 1);
    assert!(panel.contains(r#"data-issue="0" data-choice="0">have</button>"#));
    assert_eq!(
        render_badge_html(&session.badge()),
        r#"<span class="badge badge-grammar-only">1</span>"#
    );

    let ticket = session.apply_choice(0, 0).unwrap().expect("re-check issued");
    assert_eq!(session.text(), "I have a dog");
    assert_eq!(session.stats(), TextStats::from_text("I have a dog"));
    checker.request_check(ticket.request_id, ticket.text);

    assert_eq!(
        next_outcome(&mut checker, &mut session).await,
        CheckOutcome::Rendered { issue_count: 0 }
    );
    assert_eq!(service.calls.load(Ordering::SeqCst), 2);
    assert_eq!(
        session.panel_html(MAX_REPLACEMENTS),
        r#"<div class="no-issues">No issues found. Your text looks good!</div>"#
    );
    assert!(session.badge().hidden);
}

#[tokio::test]
async fn test_edit_after_check_unwraps_overlay_before_recheck() {
    let service = Arc::new(ScriptedService::default());
    let mut checker = AsyncChecker::spawn(service, &tokio::runtime::Handle::current());
    let mut session = EditSession::new("I has a dog");

    let ticket = session.begin_check().unwrap();
    checker.request_check(ticket.request_id, ticket.text);
    next_outcome(&mut checker, &mut session).await;
    assert!(session.overlay_html().contains("<span"));

    session.set_text("I has a <dog>");
    assert_eq!(session.issues().len(), 0);
    assert_eq!(session.phase(), CheckPhase::Idle);
    assert_eq!(session.overlay_html(), escape_html("I has a <dog>"));
}

#[tokio::test]
async fn test_overlapping_requests_latest_issued_wins() {
    let service = Arc::new(ScriptedService::default());
    let mut checker = AsyncChecker::spawn(service, &tokio::runtime::Handle::current());
    let mut session = EditSession::new("I has a dog");

    let first = session.begin_check().unwrap();
    let second = session.begin_check().unwrap();
    checker.request_check(first.request_id, first.text);
    checker.request_check(second.request_id, second.text);

    let mut outcomes = vec![
        next_outcome(&mut checker, &mut session).await,
        next_outcome(&mut checker, &mut session).await,
    ];
    outcomes.sort_by_key(|o| matches!(o, CheckOutcome::Stale));
    assert_eq!(
        outcomes,
        vec![CheckOutcome::Rendered { issue_count: 1 }, CheckOutcome::Stale]
    );
    assert_eq!(session.issues().len(), 1);
}
