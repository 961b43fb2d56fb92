use erpspace_rs::error::Error;
use erpspace_rs::registry::FunctionRegistry;
use serde_json::{Value, json};

#[test]
fn builtins_render_message_texts() {
    let registry = FunctionRegistry::with_builtins();
    assert_eq!(registry.names(), vec!["approval_subject", "todo_description"]);

    let subject = registry
        .call("approval_subject", &[json!("Purchase Order"), json!("PO-0001")])
        .unwrap();
    assert_eq!(subject, json!("Approval Required: Purchase Order PO-0001"));

    let description = registry
        .call(
            "todo_description",
            &[
                json!("Approve"),
                json!("Purchase Order"),
                json!("PO-0001"),
                json!("Manager Review"),
            ],
        )
        .unwrap();
    assert_eq!(
        description,
        json!("Approve required for Purchase Order PO-0001 (state: Manager Review)")
    );
}

#[test]
fn unknown_name_is_not_registered() {
    let registry = FunctionRegistry::empty();
    let err = registry.call("missing", &[]).unwrap_err();
    assert!(matches!(err, Error::NotRegistered(ref name) if name == "missing"));
    assert_eq!(err.to_string(), "function 'missing' is not registered");
}

#[test]
fn builtin_rejects_non_string_arguments() {
    let registry = FunctionRegistry::with_builtins();
    let err = registry
        .call("approval_subject", &[json!(42), json!("PO-0001")])
        .unwrap_err();
    assert!(matches!(err, Error::InvalidValue(_)));
}

#[test]
fn registration_replaces_earlier_entries() {
    let mut registry = FunctionRegistry::empty();
    registry.register("answer", |_| Ok(json!(1)));
    registry.register("answer", |args: &[Value]| Ok(json!(args.len())));

    assert!(registry.contains("answer"));
    assert_eq!(registry.call("answer", &[json!(null), json!(null)]).unwrap(), json!(2));
    assert_eq!(registry.names(), vec!["answer"]);
}
