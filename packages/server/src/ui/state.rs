//! Server state shared by handlers.

use std::sync::Arc;

use crate::usecase::MessageRelay;

/// Shared application state
pub struct AppState {
    /// MessageRelay（受信メッセージ振り分けのユースケース）
    pub relay: Arc<MessageRelay>,
}
