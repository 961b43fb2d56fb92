//! Data types exchanged with the host.
//!
//! Every entity here is owned and persisted by the host; the notifier only
//! reads snapshots and asks the host to write side effects.

pub mod document;
pub mod outbox;
pub mod todo;
pub mod workflow;

pub use document::Document;
pub use outbox::{DocShare, ErrorLogEntry, JobRequest, NotificationLog, OutgoingEmail};
pub use todo::{NewToDo, ToDo, TodoFilter, TodoId, TodoPriority, TodoStatus, TodoUpdate};
pub use workflow::TransitionRule;
