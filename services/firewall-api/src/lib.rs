//! Firewall rule gateway service library crate.
//!
//! # Purpose
//! Exposes the HTTP API surface, the rule catalog, configuration, provider
//! backends and observability wiring for use by the binary and tests.
//!
//! # Notes
//! Authorization primitives live in the `firewall-authz` crate; this crate
//! only wires them to HTTP and to the provider clients.
pub mod api;
pub mod app;
pub mod catalog;
pub mod config;
pub mod model;
pub mod observability;
pub mod store;
