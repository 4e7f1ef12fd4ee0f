//! UseCase: 受信メッセージの振り分け（MessageRelay）
//!
//! 接続ごとの状態 `Connecting → Ready → Closed` に従い、受信した全てのフレームを
//! ブートストラップ・ブロードキャスト・破棄のいずれかに振り分けます。
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - MessageRelay::handle_text の振り分け表
//!
//! ### なぜこのテストが必要か
//! - 送信者には自分の draw-line / clear が返らないことを保証する
//! - client-ready 前の描画が中継されないことを保証する
//! - 不正なフレームで接続が閉じられないことを保証する

use std::sync::Arc;

use tegaki_shared::protocol::{Message, MessageKind, ProtocolError};

use crate::domain::{ClientId, ConnectionRegistry, PusherChannel, Readiness};

use super::bootstrap::{BootstrapStart, StateBootstrap};

/// Why a frame was dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    Malformed,
    UnknownType,
    InvalidPayload,
    /// Anything but `client-ready` before the client is Ready.
    NotReady,
    AlreadyReady,
    /// A server → client kind sent by a client.
    WrongDirection,
    /// `canvas-state` nobody asked for.
    NoPendingRequest,
}

impl From<&ProtocolError> for IgnoreReason {
    fn from(error: &ProtocolError) -> Self {
        match error {
            ProtocolError::Malformed(_) => IgnoreReason::Malformed,
            ProtocolError::UnknownType(_) => IgnoreReason::UnknownType,
            ProtocolError::InvalidPayload { .. } => IgnoreReason::InvalidPayload,
        }
    }
}

/// What the relay did with one inbound frame.
#[derive(Debug)]
pub enum RelayOutcome {
    BecameReady(BootstrapStart),
    Broadcast {
        kind: MessageKind,
        recipients: usize,
    },
    SnapshotForwarded,
    Ignored(IgnoreReason),
}

/// メッセージ中継のユースケース
pub struct MessageRelay {
    /// ConnectionRegistry（接続管理の抽象化）
    registry: Arc<dyn ConnectionRegistry>,
    bootstrap: Arc<StateBootstrap>,
}

impl MessageRelay {
    /// 新しい MessageRelay を作成
    pub fn new(registry: Arc<dyn ConnectionRegistry>, bootstrap: Arc<StateBootstrap>) -> Self {
        Self {
            registry,
            bootstrap,
        }
    }

    /// 新しい接続を Connecting 状態で登録する
    pub async fn connect(&self, sender: PusherChannel) -> ClientId {
        let client_id = self.registry.register(sender).await;
        tracing::info!(
            "Client '{}' connected ({} connected)",
            client_id,
            self.registry.connected_count().await
        );
        client_id
    }

    /// 受信した 1 フレームを処理する
    ///
    /// `draw-line` と `clear` は受信したテキストをそのまま中継する。
    pub async fn handle_text(&self, client_id: &ClientId, text: &str) -> RelayOutcome {
        let message = match Message::decode(text) {
            Ok(message) => message,
            Err(e) => {
                tracing::warn!("Ignoring frame from '{}': {}", client_id, e);
                return RelayOutcome::Ignored(IgnoreReason::from(&e));
            }
        };
        tracing::debug!("Received '{}' from '{}'", message.kind(), client_id);

        let readiness = self.registry.readiness(client_id).await;
        match (readiness, message) {
            (Readiness::Connecting, Message::ClientReady) => self.accept_ready(client_id).await,
            (Readiness::Ready, Message::ClientReady) => {
                tracing::warn!("Client '{}' sent client-ready twice", client_id);
                RelayOutcome::Ignored(IgnoreReason::AlreadyReady)
            }
            (Readiness::Connecting | Readiness::Closed, message) => {
                tracing::warn!(
                    "Ignoring '{}' from '{}' before client-ready",
                    message.kind(),
                    client_id
                );
                RelayOutcome::Ignored(IgnoreReason::NotReady)
            }
            (Readiness::Ready, message @ (Message::DrawLine(_) | Message::Clear)) => {
                let recipients = self.registry.broadcast_except(client_id, text).await;
                tracing::debug!(
                    "Broadcast '{}' from '{}' to {} client(s)",
                    message.kind(),
                    client_id,
                    recipients
                );
                RelayOutcome::Broadcast {
                    kind: message.kind(),
                    recipients,
                }
            }
            (Readiness::Ready, Message::CanvasState(snapshot)) => {
                if self.bootstrap.complete(client_id, snapshot).await {
                    RelayOutcome::SnapshotForwarded
                } else {
                    RelayOutcome::Ignored(IgnoreReason::NoPendingRequest)
                }
            }
            (
                Readiness::Ready,
                message @ (Message::GetCanvasState | Message::CanvasStateFromServer(_)),
            ) => {
                tracing::warn!(
                    "Client '{}' sent server-only message '{}'",
                    client_id,
                    message.kind()
                );
                RelayOutcome::Ignored(IgnoreReason::WrongDirection)
            }
        }
    }

    /// 切断されたクライアントを削除し、関連するブートストラップ待機を破棄する
    ///
    /// 複数回呼んでも安全。
    pub async fn disconnect(&self, client_id: &ClientId) {
        let removed = self.registry.unregister(client_id).await;
        self.bootstrap.cancel_for(client_id).await;

        if removed {
            tracing::info!(
                "Client '{}' disconnected and removed from registry ({} connected)",
                client_id,
                self.registry.connected_count().await
            );
        }
    }

    async fn accept_ready(&self, client_id: &ClientId) -> RelayOutcome {
        if !self.registry.mark_ready(client_id).await {
            // 判定後に切断された場合
            return RelayOutcome::Ignored(IgnoreReason::NotReady);
        }
        tracing::info!(
            "Client '{}' is ready ({} ready)",
            client_id,
            self.registry.ready_count().await
        );

        RelayOutcome::BecameReady(self.bootstrap.begin(*client_id).await)
    }
}
