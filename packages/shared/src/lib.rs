//! Shared building blocks for the Tegaki drawing relay.
//!
//! Both the relay server and the drawing client speak the same JSON envelope
//! protocol, defined in [`protocol`].

pub mod logger;
pub mod protocol;
