use erpspace_rs::config::NotifierConfig;
use erpspace_rs::host::Host;
use erpspace_rs::host::fixture::Fixture;
use erpspace_rs::notifier::WorkflowNotifier;

const FIXTURE: &str = r#"
[[workflow]]
doctype = "Leave Application"
name = "Leave Approval"

[[transition]]
workflow = "Leave Approval"
doctype = "Leave Application"
state = "Open"
action = "Approve"
next_state = "Approved"
allowed = "Leave Approver"

[[user]]
email = "hr@example.com"
roles = ["Leave Approver"]

[[user]]
email = "former@example.com"
roles = ["Leave Approver"]
enabled = false

[[document]]
doctype = "Leave Application"
name = "HR-LAP-0001"
owner = "employee@example.com"
workflow_state = "Open"
fields = { total_leave_days = 3 }
"#;

#[tokio::test]
async fn fixture_seeds_the_memory_host() {
    let host = Fixture::from_toml(FIXTURE).unwrap().into_host();

    let doc = host
        .get_document("Leave Application", "HR-LAP-0001")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(doc.owner, "employee@example.com");
    assert_eq!(doc.fields["total_leave_days"], 3);
    assert_eq!(
        host.workflow_name("Leave Application").await.unwrap().as_deref(),
        Some("Leave Approval")
    );
    assert_eq!(
        host.users_with_role("Leave Approver").await.unwrap(),
        vec!["hr@example.com"]
    );

    let notifier = WorkflowNotifier::new(host, NotifierConfig::default());
    let report = notifier.on_update(None, &doc).await;
    assert_eq!(report.pipeline.unwrap().approvers, vec!["hr@example.com"]);
    assert_eq!(
        notifier
            .host()
            .open_todos("Leave Application", "HR-LAP-0001")
            .len(),
        1
    );
}

#[test]
fn malformed_fixture_is_a_config_error() {
    let err = Fixture::from_toml("[[transition]]\nworkflow = 1").unwrap_err();
    assert!(err.to_string().starts_with("configuration error: bad fixture"));
}
