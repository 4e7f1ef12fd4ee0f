//! Relay server for a shared real-time drawing surface.
//!
//! Clients connect over a single WebSocket endpoint. Drawing events from one
//! ready client are rebroadcast to every other ready client, and a newly ready
//! client is brought up to date by asking an existing peer for a snapshot of
//! its surface.

// layers
pub mod domain;
pub mod infrastructure;
pub mod ui;
pub mod usecase;
