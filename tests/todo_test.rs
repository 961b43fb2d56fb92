//! Canonical to-do upsert.

use chrono::{Duration, Utc};
use erpspace_rs::config::{CanonicalPolicy, NotifierConfig};
use erpspace_rs::host::memory::MemoryHost;
use erpspace_rs::model::{ToDo, TodoId, TodoPriority, TodoStatus};
use erpspace_rs::notifier::{TodoAssignment, UpsertAction, WorkflowNotifier};

const USER: &str = "alice@example.com";

fn seed(host: &MemoryHost, state: &str, status: TodoStatus, hours_ago: i64) -> TodoId {
    let created_at = Utc::now() - Duration::hours(hours_ago);
    let todo = ToDo {
        id: TodoId::new(),
        reference_type: "Purchase Order".to_string(),
        reference_name: "PO-0001".to_string(),
        allocated_to: USER.to_string(),
        description: "stale text".to_string(),
        status,
        priority: TodoPriority::Low,
        date: created_at.date_naive(),
        assigned_by: None,
        workflow_state: Some(state.to_string()),
        created_at,
        updated_at: created_at,
    };
    let id = todo.id;
    host.seed_todo(todo);
    id
}

fn assignment(state: &str) -> TodoAssignment {
    TodoAssignment {
        user: USER.to_string(),
        reference_type: "Purchase Order".to_string(),
        reference_name: "PO-0001".to_string(),
        state: state.to_string(),
        action: "Approve".to_string(),
        assigned_by: Some("clerk@example.com".to_string()),
    }
}

fn notifier_with(policy: CanonicalPolicy) -> WorkflowNotifier<MemoryHost> {
    let config = NotifierConfig {
        canonical_policy: policy,
        ..NotifierConfig::default()
    };
    WorkflowNotifier::new(MemoryHost::new(), config)
}

fn find(notifier: &WorkflowNotifier<MemoryHost>, id: TodoId) -> ToDo {
    notifier
        .host()
        .todos()
        .into_iter()
        .find(|t| t.id == id)
        .unwrap()
}

#[tokio::test]
async fn creates_a_todo_when_none_exists() {
    let notifier = notifier_with(CanonicalPolicy::OldestWins);
    let upsert = notifier
        .upsert_todo(&assignment("Manager Review"))
        .await
        .unwrap();
    assert_eq!(upsert.action, UpsertAction::Created);
    assert_eq!(upsert.closed, 0);

    let todo = find(&notifier, upsert.id);
    assert_eq!(todo.status, TodoStatus::Open);
    assert_eq!(todo.priority, TodoPriority::Medium);
    assert_eq!(todo.date, Utc::now().date_naive());
    assert_eq!(todo.assigned_by.as_deref(), Some("clerk@example.com"));
    assert_eq!(todo.workflow_state.as_deref(), Some("Manager Review"));
}

#[tokio::test]
async fn duplicates_collapse_to_the_oldest() {
    let notifier = notifier_with(CanonicalPolicy::OldestWins);
    let host = notifier.host();
    let oldest = seed(host, "Manager Review", TodoStatus::Open, 3);
    let newer = seed(host, "Manager Review", TodoStatus::Open, 2);
    let other_state = seed(host, "Draft", TodoStatus::Open, 1);

    let upsert = notifier
        .upsert_todo(&assignment("Manager Review"))
        .await
        .unwrap();
    assert_eq!(upsert.id, oldest);
    assert_eq!(upsert.action, UpsertAction::Refreshed);
    assert_eq!(upsert.closed, 2);

    let open = notifier.host().open_todos("Purchase Order", "PO-0001");
    assert_eq!(open.len(), 1);
    assert_eq!(open[0].id, oldest);
    assert_eq!(
        open[0].description,
        "Approve required for Purchase Order PO-0001 (state: Manager Review)"
    );
    assert_eq!(find(&notifier, newer).status, TodoStatus::Closed);
    assert_eq!(find(&notifier, other_state).status, TodoStatus::Closed);
    assert_eq!(notifier.host().todos().len(), 3);
}

#[tokio::test]
async fn newest_wins_keeps_the_latest() {
    let notifier = notifier_with(CanonicalPolicy::NewestWins);
    let host = notifier.host();
    let older = seed(host, "Manager Review", TodoStatus::Open, 2);
    let newest = seed(host, "Manager Review", TodoStatus::Open, 1);

    let upsert = notifier
        .upsert_todo(&assignment("Manager Review"))
        .await
        .unwrap();
    assert_eq!(upsert.id, newest);
    assert_eq!(find(&notifier, older).status, TodoStatus::Closed);
}

#[tokio::test]
async fn repeated_upserts_are_stable() {
    let notifier = notifier_with(CanonicalPolicy::OldestWins);
    let first = notifier
        .upsert_todo(&assignment("Manager Review"))
        .await
        .unwrap();
    let second = notifier
        .upsert_todo(&assignment("Manager Review"))
        .await
        .unwrap();

    assert_eq!(first.id, second.id);
    assert_eq!(second.action, UpsertAction::Refreshed);
    assert_eq!(second.closed, 0);
    assert_eq!(notifier.host().todos().len(), 1);
}

#[tokio::test]
async fn todo_of_another_state_is_promoted() {
    let notifier = notifier_with(CanonicalPolicy::OldestWins);
    let host = notifier.host();
    let oldest = seed(host, "Draft", TodoStatus::Closed, 2);
    let newer = seed(host, "Draft", TodoStatus::Open, 1);

    let upsert = notifier
        .upsert_todo(&assignment("Manager Review"))
        .await
        .unwrap();
    assert_eq!(upsert.id, oldest);
    assert_eq!(upsert.action, UpsertAction::Promoted);
    assert_eq!(upsert.closed, 1);

    let promoted = find(&notifier, oldest);
    assert_eq!(promoted.status, TodoStatus::Open);
    assert_eq!(promoted.workflow_state.as_deref(), Some("Manager Review"));
    assert_eq!(find(&notifier, newer).status, TodoStatus::Closed);
}

#[tokio::test]
async fn closed_todo_for_the_same_state_stays_closed() {
    let notifier = notifier_with(CanonicalPolicy::OldestWins);
    let closed = seed(notifier.host(), "Manager Review", TodoStatus::Closed, 1);

    let upsert = notifier
        .upsert_todo(&assignment("Manager Review"))
        .await
        .unwrap();
    assert_eq!(upsert.id, closed);
    assert_eq!(upsert.action, UpsertAction::Refreshed);

    let todo = find(&notifier, closed);
    assert_eq!(todo.status, TodoStatus::Closed);
    assert_eq!(
        todo.description,
        "Approve required for Purchase Order PO-0001 (state: Manager Review)"
    );
    assert!(
        notifier
            .host()
            .open_todos("Purchase Order", "PO-0001")
            .is_empty()
    );
}

#[tokio::test]
async fn open_todo_for_the_same_state_stays_open() {
    let notifier = notifier_with(CanonicalPolicy::OldestWins);
    let open = seed(notifier.host(), "Manager Review", TodoStatus::Open, 1);

    notifier
        .upsert_todo(&assignment("Manager Review"))
        .await
        .unwrap();
    assert_eq!(find(&notifier, open).status, TodoStatus::Open);
}

#[tokio::test]
async fn other_users_are_untouched() {
    let notifier = notifier_with(CanonicalPolicy::OldestWins);
    let mut bob = ToDo {
        id: TodoId::new(),
        reference_type: "Purchase Order".to_string(),
        reference_name: "PO-0001".to_string(),
        allocated_to: "bob@example.com".to_string(),
        description: "bob's".to_string(),
        status: TodoStatus::Open,
        priority: TodoPriority::Medium,
        date: Utc::now().date_naive(),
        assigned_by: None,
        workflow_state: Some("Manager Review".to_string()),
        created_at: Utc::now() - Duration::hours(1),
        updated_at: Utc::now() - Duration::hours(1),
    };
    notifier.host().seed_todo(bob.clone());

    notifier
        .upsert_todo(&assignment("Manager Review"))
        .await
        .unwrap();
    bob.updated_at = find(&notifier, bob.id).updated_at;
    assert_eq!(find(&notifier, bob.id), bob);
    assert_eq!(
        notifier
            .host()
            .open_todos("Purchase Order", "PO-0001")
            .len(),
        2
    );
}
