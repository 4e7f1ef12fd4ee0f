//! ConnectionRegistry trait 定義
//!
//! 接続中クライアントの集合と、ユニキャスト・送信者除外ブロードキャストの
//! インターフェースを定義します。具体的な実装は Infrastructure 層が提供します（依存性の逆転）。

use async_trait::async_trait;
use tokio::sync::mpsc;

use super::{ClientId, MessagePushError, Readiness};

/// Outbound channel of one connection. Each item is one text frame.
pub type PusherChannel = mpsc::UnboundedSender<String>;

/// ConnectionRegistry trait
///
/// Client レコードを排他的に所有する唯一の共有可変リソース。
/// 実装は全ての操作を互いに排他的に実行しなければならない。
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ConnectionRegistry: Send + Sync {
    /// Connecting 状態のクライアントを追加し、新しい ClientId を返す
    async fn register(&self, sender: PusherChannel) -> ClientId;

    /// Connecting → Ready に遷移させる。未知・Ready 済み・Closed の場合は何もせず false
    async fn mark_ready(&self, client_id: &ClientId) -> bool;

    /// 現在の状態。未登録の ID は Closed として扱う
    async fn readiness(&self, client_id: &ClientId) -> Readiness;

    /// クライアントを削除する（冪等）。削除した場合のみ true
    async fn unregister(&self, client_id: &ClientId) -> bool;

    /// 特定のクライアントへ送信（状態を問わない）
    async fn push_to(&self, client_id: &ClientId, content: &str) -> Result<(), MessagePushError>;

    /// 送信者以外の全 Ready クライアントへ送信し、送信できた数を返す
    async fn broadcast_except(&self, sender_id: &ClientId, content: &str) -> usize;

    /// `exclude` 以外の Ready クライアントを 1 つ選ぶ
    async fn pick_bootstrap_source(&self, exclude: &ClientId) -> Option<ClientId>;

    /// 接続中のクライアント数
    async fn connected_count(&self) -> usize;

    /// Ready 状態のクライアント数
    async fn ready_count(&self) -> usize;
}

/// Chooses which Ready peer is asked for its surface.
///
/// `candidates` are ordered by join order (oldest first) and never contain
/// the requester.
pub trait BootstrapSourceSelector: Send + Sync {
    fn select(&self, candidates: &[ClientId]) -> Option<ClientId>;
}

/// Ask the peer that has been connected the longest.
#[derive(Debug, Clone, Copy, Default)]
pub struct OldestPeer;

impl BootstrapSourceSelector for OldestPeer {
    fn select(&self, candidates: &[ClientId]) -> Option<ClientId> {
        candidates.first().copied()
    }
}

/// Ask the most recently joined peer.
#[derive(Debug, Clone, Copy, Default)]
pub struct NewestPeer;

impl BootstrapSourceSelector for NewestPeer {
    fn select(&self, candidates: &[ClientId]) -> Option<ClientId> {
        candidates.last().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_oldest_peer_picks_first_candidate() {
        // テスト項目: OldestPeer は最初の候補を選ぶ
        // given (前提条件):
        let candidates = [ClientId::generate(), ClientId::generate()];

        // when (操作):
        let picked = OldestPeer.select(&candidates);

        // then (期待する結果):
        assert_eq!(picked, Some(candidates[0]));
    }

    #[test]
    fn test_newest_peer_picks_last_candidate() {
        // テスト項目: NewestPeer は最後の候補を選ぶ
        // given (前提条件):
        let candidates = [ClientId::generate(), ClientId::generate()];

        // when (操作):
        let picked = NewestPeer.select(&candidates);

        // then (期待する結果):
        assert_eq!(picked, Some(candidates[1]));
    }

    #[test]
    fn test_selectors_return_none_without_candidates() {
        // テスト項目: 候補がない場合はどちらも None を返す
        assert_eq!(OldestPeer.select(&[]), None);
        assert_eq!(NewestPeer.select(&[]), None);
    }
}
