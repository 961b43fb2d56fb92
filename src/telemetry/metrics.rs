//! Metric instrument factories for erpspace-rs.
//!
//! Uses the OTel Meter API with the globally-registered `MeterProvider`.
//! All instruments are created lazily from the `"erpspace-rs"` meter.

use opentelemetry::metrics::{Counter, Histogram, Meter};

/// Returns the shared meter for erpspace-rs instruments.
fn meter() -> Meter {
    opentelemetry::global::meter(super::SCOPE)
}

/// Counter: canonical to-do upserts.
/// Labels: `action` ("created" | "refreshed" | "promoted").
pub fn todos_upserted() -> Counter<u64> {
    meter()
        .u64_counter("erpspace.todos.upserted")
        .with_description("Number of canonical to-do upserts")
        .build()
}

/// Counter: to-dos closed.
/// Labels: `reason` ("duplicate" | "state_change" | "rejected" | "submitted").
pub fn todos_closed() -> Counter<u64> {
    meter()
        .u64_counter("erpspace.todos.closed")
        .with_description("Number of to-dos closed")
        .build()
}

/// Counter: approval emails handed to the mail subsystem.
pub fn emails_sent() -> Counter<u64> {
    meter()
        .u64_counter("erpspace.emails.sent")
        .with_description("Number of approval emails sent")
        .build()
}

/// Counter: in-app notifications.
/// Labels: `result` ("created" | "suppressed").
pub fn notifications() -> Counter<u64> {
    meter()
        .u64_counter("erpspace.notifications")
        .with_description("Number of in-app notifications created or suppressed")
        .build()
}

/// Counter: document shares.
/// Labels: `result` ("created" | "existing").
pub fn shares() -> Counter<u64> {
    meter()
        .u64_counter("erpspace.shares")
        .with_description("Number of document shares requested")
        .build()
}

/// Counter: documents whose approving role could not be resolved.
/// Labels: `doctype`.
pub fn role_unresolved() -> Counter<u64> {
    meter()
        .u64_counter("erpspace.role.unresolved")
        .with_description("Documents with no resolvable approving role")
        .build()
}

/// Counter: background jobs enqueued.
/// Labels: `queue`.
pub fn jobs_enqueued() -> Counter<u64> {
    meter()
        .u64_counter("erpspace.jobs.enqueued")
        .with_description("Number of background jobs enqueued")
        .build()
}

/// Counter: failures caught at a hook boundary or per recipient.
/// Labels: `hook`.
pub fn hook_failures() -> Counter<u64> {
    meter()
        .u64_counter("erpspace.hook.failures")
        .with_description("Failures logged and swallowed by hooks")
        .build()
}

/// Histogram: hook duration in milliseconds.
/// Labels: `hook`.
pub fn hook_duration_ms() -> Histogram<f64> {
    meter()
        .f64_histogram("erpspace.hook.duration_ms")
        .with_description("Hook duration in milliseconds")
        .with_unit("ms")
        .build()
}
