//! Core library for buildlog.
//!
//! Consumes build lifecycle events, aggregates project outcomes and
//! diagnostics, and renders an inline progress indicator plus an end-of-run
//! summary.
//!
//! - `events`: the inbound event model.
//! - `sink`: the callback interface a host drives, and subscription.
//! - `reporter`: the console logger that implements it.
//! - `state` / `summary`: run aggregation and summary rendering.
//! - `replay`: an event source that reads recorded JSON-lines streams.
//! - `config`: `buildlog.yaml` loading.
pub mod clock;
pub mod config;
pub mod diagnostic;
pub mod error;
pub mod events;
pub mod replay;
pub mod reporter;
pub mod sink;
pub mod state;
pub mod summary;
