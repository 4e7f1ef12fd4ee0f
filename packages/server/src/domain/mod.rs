//! Domain layer: client identity, readiness, and the registry abstraction.

pub mod entity;
pub mod error;
pub mod registry;
pub mod value_object;

pub use entity::Client;
pub use error::MessagePushError;
pub use registry::{
    BootstrapSourceSelector, ConnectionRegistry, NewestPeer, OldestPeer, PusherChannel,
};
pub use value_object::{ClientId, Readiness};

#[cfg(test)]
pub use registry::MockConnectionRegistry;
