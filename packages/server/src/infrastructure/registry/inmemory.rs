//! InMemory ConnectionRegistry 実装
//!
//! ## 責務
//!
//! - 接続中クライアント（Client エンティティ）の保持
//! - クライアントへのメッセージ送信（push_to, broadcast_except）
//! - ブートストラップ元となるピアの選定
//!
//! ## 設計ノート
//!
//! WebSocket の生成は UI 層（`src/ui/handler/websocket.rs`）で行われます。
//! この実装は生成された `UnboundedSender` を受け取り、メッセージ送信に使用します。
//! 全ての操作は 1 つの Mutex の下で実行されるため、ブロードキャスト中の
//! 追加・削除と競合しません。

use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;

use crate::domain::{
    BootstrapSourceSelector, Client, ClientId, ConnectionRegistry, MessagePushError, OldestPeer,
    PusherChannel, Readiness,
};

#[derive(Default)]
struct RegistryInner {
    clients: HashMap<ClientId, Client>,
    next_join_seq: u64,
}

/// インメモリ ConnectionRegistry 実装
///
/// ## 使用例
///
/// ```ignore
/// let registry = InMemoryConnectionRegistry::new(Arc::new(OldestPeer));
///
/// let client_id = registry.register(tx).await;
/// registry.mark_ready(&client_id).await;
/// registry.broadcast_except(&client_id, "{\"type\":\"clear\",\"data\":null}").await;
/// ```
pub struct InMemoryConnectionRegistry {
    inner: Mutex<RegistryInner>,
    /// ブートストラップ元の選定ポリシー
    selector: Arc<dyn BootstrapSourceSelector>,
}

impl InMemoryConnectionRegistry {
    /// 新しい InMemoryConnectionRegistry を作成
    pub fn new(selector: Arc<dyn BootstrapSourceSelector>) -> Self {
        Self {
            inner: Mutex::new(RegistryInner::default()),
            selector,
        }
    }
}

impl Default for InMemoryConnectionRegistry {
    fn default() -> Self {
        Self::new(Arc::new(OldestPeer))
    }
}

#[async_trait]
impl ConnectionRegistry for InMemoryConnectionRegistry {
    async fn register(&self, sender: PusherChannel) -> ClientId {
        let mut inner = self.inner.lock().await;

        let client_id = ClientId::generate();
        let join_seq = inner.next_join_seq;
        inner.next_join_seq += 1;
        inner
            .clients
            .insert(client_id, Client::new(client_id, sender, join_seq));

        tracing::debug!("Client '{}' registered (join #{})", client_id, join_seq);
        client_id
    }

    async fn mark_ready(&self, client_id: &ClientId) -> bool {
        let mut inner = self.inner.lock().await;
        match inner.clients.get_mut(client_id) {
            Some(client) => client.mark_ready(),
            None => false,
        }
    }

    async fn readiness(&self, client_id: &ClientId) -> Readiness {
        let inner = self.inner.lock().await;
        inner
            .clients
            .get(client_id)
            .map(|client| client.readiness)
            .unwrap_or(Readiness::Closed)
    }

    async fn unregister(&self, client_id: &ClientId) -> bool {
        let mut inner = self.inner.lock().await;
        match inner.clients.remove(client_id) {
            Some(mut client) => {
                client.close();
                let connected_for = Utc::now() - client.connected_at;
                tracing::debug!(
                    "Client '{}' unregistered after {}s",
                    client_id,
                    connected_for.num_seconds()
                );
                true
            }
            None => false,
        }
    }

    async fn push_to(&self, client_id: &ClientId, content: &str) -> Result<(), MessagePushError> {
        let inner = self.inner.lock().await;

        let client = inner
            .clients
            .get(client_id)
            .ok_or_else(|| MessagePushError::ClientNotFound(client_id.to_string()))?;

        client
            .sender
            .send(content.to_string())
            .map_err(|e| MessagePushError::PushFailed(e.to_string()))?;
        tracing::debug!("Pushed message to client '{}'", client_id);
        Ok(())
    }

    async fn broadcast_except(&self, sender_id: &ClientId, content: &str) -> usize {
        let inner = self.inner.lock().await;

        let mut delivered = 0;
        for client in inner.clients.values() {
            if &client.id == sender_id || !client.readiness.is_ready() {
                continue;
            }
            // ブロードキャストでは一部の送信失敗を許容
            match client.sender.send(content.to_string()) {
                Ok(()) => delivered += 1,
                Err(e) => {
                    tracing::warn!("Failed to push message to client '{}': {}", client.id, e)
                }
            }
        }

        delivered
    }

    async fn pick_bootstrap_source(&self, exclude: &ClientId) -> Option<ClientId> {
        let inner = self.inner.lock().await;

        let mut candidates: Vec<&Client> = inner
            .clients
            .values()
            .filter(|client| &client.id != exclude && client.readiness.is_ready())
            .collect();
        candidates.sort_by_key(|client| client.join_seq);
        let candidate_ids: Vec<ClientId> = candidates.iter().map(|client| client.id).collect();

        // セレクタが候補外の ID を返した場合は「該当なし」とみなす
        self.selector
            .select(&candidate_ids)
            .filter(|picked| candidate_ids.contains(picked))
    }

    async fn connected_count(&self) -> usize {
        self.inner.lock().await.clients.len()
    }

    async fn ready_count(&self) -> usize {
        let inner = self.inner.lock().await;
        inner
            .clients
            .values()
            .filter(|client| client.readiness.is_ready())
            .count()
    }
}
