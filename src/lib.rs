//! Headless email-triage client: a message-driven controller, a staleness
//! guard for context switches, and two interchangeable backend transports
//! (HTTP and in-process bridge).

pub mod app;
pub mod config;
pub mod core;
pub mod transport;
