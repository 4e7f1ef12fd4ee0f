//! UseCase layer: the relay protocol state machine and the state bootstrap.

pub mod bootstrap;
pub mod relay_message;

pub use bootstrap::{BootstrapOutcome, BootstrapStart, DEFAULT_BOOTSTRAP_TIMEOUT, StateBootstrap};
pub use relay_message::{IgnoreReason, MessageRelay, RelayOutcome};
