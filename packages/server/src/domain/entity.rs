//! Client entity held by the connection registry.

use chrono::{DateTime, Utc};

use super::{ClientId, PusherChannel, Readiness};

/// One accepted connection.
///
/// Only the registry keeps `Client` records; everyone else works with [`ClientId`].
#[derive(Debug)]
pub struct Client {
    pub id: ClientId,
    /// Outbound queue drained into the socket by the connection's push task
    pub sender: PusherChannel,
    pub readiness: Readiness,
    /// Registration order, used to rank bootstrap candidates
    pub join_seq: u64,
    pub connected_at: DateTime<Utc>,
}

impl Client {
    pub fn new(id: ClientId, sender: PusherChannel, join_seq: u64) -> Self {
        Self {
            id,
            sender,
            readiness: Readiness::Connecting,
            join_seq,
            connected_at: Utc::now(),
        }
    }

    /// Connecting → Ready. Returns `false` when the transition is not allowed.
    pub fn mark_ready(&mut self) -> bool {
        match self.readiness {
            Readiness::Connecting => {
                self.readiness = Readiness::Ready;
                true
            }
            Readiness::Ready | Readiness::Closed => false,
        }
    }

    pub fn close(&mut self) {
        self.readiness = Readiness::Closed;
    }
}
