//! Hook span helpers.
//!
//! Every lifecycle hook runs inside a span naming the hook and the document
//! it fired for.

use tracing::Span;

/// Start a span for one hook invocation.
///
/// The `workflow.state` field is declared empty and can be filled via
/// [`record_state_change`].
pub fn start_hook_span(hook: &str, doctype: &str, name: &str) -> Span {
    tracing::info_span!(
        "workflow.hook",
        "hook.name" = hook,
        "document.doctype" = doctype,
        "document.name" = name,
        "workflow.state" = tracing::field::Empty,
    )
}

/// Record a workflow state change on the hook span.
pub fn record_state_change(span: &Span, from: Option<&str>, to: Option<&str>) {
    let to = to.unwrap_or("");
    span.record("workflow.state", to);
    span.in_scope(|| {
        tracing::info!(from = from.unwrap_or(""), to = to, "state_change");
    });
}
