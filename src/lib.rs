//! # erpspace-rs
//!
//! Workflow notifications for ERP documents.
//!
//! When a document's workflow state changes, the [`notifier`] resolves who
//! must approve it next, shares the document with them, mails and notifies
//! them, and keeps a single canonical to-do per (document, user), closing
//! stale ones on state change, rejection, or submission. The host framework
//! is reached through the [`host::Host`] trait; [`db`] implements it over
//! Postgres and [`host::memory`] in memory.

pub mod config;
pub mod db;
pub mod error;
pub mod formula;
pub mod host;
pub mod model;
pub mod notifier;
pub mod registry;
pub mod telemetry;
