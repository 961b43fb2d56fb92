use erpspace_rs::error::Error;
use erpspace_rs::formula::FormulaEvaluator;
use erpspace_rs::model::Document;

fn leave() -> Document {
    Document::new("Leave Application", "HR-LAP-0001", "employee@example.com")
        .workflow_state("Open")
        .status("Open")
        .field("department", "Operations")
        .field("total_leave_days", 12)
}

#[test]
fn header_fields_are_visible() {
    let eval = FormulaEvaluator::new();
    let doc = leave();
    assert!(eval.eval_condition(r#"doc.doctype == "Leave Application""#, &doc).unwrap());
    assert!(eval.eval_condition(r#"doc.workflow_state == "Open""#, &doc).unwrap());
    assert_eq!(
        eval.eval_role("doc.owner", &doc).unwrap().as_deref(),
        Some("employee@example.com")
    );
}

#[test]
fn conditions_combine_fields() {
    let eval = FormulaEvaluator::new();
    let expr = r#"doc.total_leave_days > 10 && doc.department == "Operations""#;
    assert!(eval.eval_condition(expr, &leave()).unwrap());
    let short = leave().field("total_leave_days", 2);
    assert!(!eval.eval_condition(expr, &short).unwrap());
}

#[test]
fn non_string_role_is_an_error() {
    let eval = FormulaEvaluator::new();
    let err = eval.eval_role("doc.total_leave_days", &leave()).unwrap_err();
    assert!(matches!(err, Error::Formula { .. }));
}

#[test]
fn unknown_variables_fail() {
    let eval = FormulaEvaluator::new();
    assert!(eval.eval_condition("frappe.session.user == 1", &leave()).is_err());
}
