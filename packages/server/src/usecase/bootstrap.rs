//! UseCase: 新規クライアントへのキャンバス状態の受け渡し（ブートストラップ）
//!
//! ## 流れ
//!
//! 1. 要求者以外の Ready クライアントを 1 つ選ぶ（いなければ何もしない）
//! 2. 選ばれたクライアントに `get-canvas-state` を送り、待機を登録する
//! 3. `canvas-state` が届いたら `canvas-state-from-server` として要求者だけに転送する
//! 4. タイムアウト・送信元の切断・要求者の切断のいずれかで待機を破棄する（再試行なし）
//!
//! 応答は送信元ごとに要求順で対応付ける。待機をやめた要求も送信元が応答するか
//! 切断するまでキューに残し、その応答は破棄する（次の要求者には渡さない）。
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - StateBootstrap::begin / complete / cancel_for
//!
//! ### どのような状況を想定しているか
//! - 正常系：スナップショットがバイト単位でそのまま要求者に届く
//! - 異常系：タイムアウト、送信元の切断、要求者の切断
//! - エッジケース：最初のクライアント（送信元なし）、同じ送信元への同時要求、
//!   タイムアウト後に届いた古い応答

use std::{
    collections::{HashMap, VecDeque},
    sync::Arc,
    time::Duration,
};

use tegaki_shared::protocol::{Message, SurfaceSnapshot};
use tokio::{
    sync::{Mutex, oneshot},
    task::JoinHandle,
};

use crate::domain::{ClientId, ConnectionRegistry};

/// Default bound on how long a requester waits for a peer's snapshot.
pub const DEFAULT_BOOTSTRAP_TIMEOUT: Duration = Duration::from_secs(3);

/// How a single bootstrap wait ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootstrapOutcome {
    /// `canvas-state-from-server` was queued to the requester.
    Delivered,
    TimedOut,
    SourceGone,
    RequesterGone,
}

/// Result of starting a bootstrap for a newly ready client.
#[derive(Debug)]
pub enum BootstrapStart {
    /// First client: nobody to ask, the surface stays blank.
    NoSource,
    /// The requester already has an outstanding wait.
    AlreadyPending,
    Requested {
        source: ClientId,
        wait: JoinHandle<BootstrapOutcome>,
    },
}

#[derive(Debug)]
enum WaitSignal {
    Snapshot(SurfaceSnapshot),
    SourceGone,
    RequesterGone,
}

/// One `get-canvas-state` sent to a source.
///
/// `signal` is `None` once the requester stopped waiting. The entry stays
/// queued until the source answers, so every reply is paired with the
/// request it answers.
#[derive(Debug)]
struct PendingWait {
    requester: ClientId,
    signal: Option<oneshot::Sender<WaitSignal>>,
}

impl PendingWait {
    fn is_live(&self) -> bool {
        self.signal.is_some()
    }
}

/// Outstanding requests, queued per source in request order.
#[derive(Debug, Default)]
struct PendingTable {
    by_source: HashMap<ClientId, VecDeque<PendingWait>>,
}

impl PendingTable {
    fn has_requester(&self, requester: &ClientId) -> bool {
        self.by_source
            .values()
            .flatten()
            .any(|wait| wait.is_live() && &wait.requester == requester)
    }

    fn push(&mut self, source: ClientId, wait: PendingWait) {
        self.by_source.entry(source).or_default().push_back(wait);
    }

    fn pop_oldest(&mut self, source: &ClientId) -> Option<PendingWait> {
        let queue = self.by_source.get_mut(source)?;
        let wait = queue.pop_front();
        if queue.is_empty() {
            self.by_source.remove(source);
        }
        wait
    }

    fn remove(&mut self, source: &ClientId, requester: &ClientId) -> Option<PendingWait> {
        let queue = self.by_source.get_mut(source)?;
        let position = queue.iter().position(|wait| &wait.requester == requester)?;
        let wait = queue.remove(position);
        if queue.is_empty() {
            self.by_source.remove(source);
        }
        wait
    }

    /// Stop waiting on `source` for `requester`, keeping the request queued.
    fn abandon(&mut self, source: &ClientId, requester: &ClientId) {
        if let Some(queue) = self.by_source.get_mut(source) {
            for wait in queue.iter_mut().filter(|wait| &wait.requester == requester) {
                wait.signal = None;
            }
        }
    }

    /// Drop every request sent to `source`, abandoned ones included.
    fn take_by_source(&mut self, source: &ClientId) -> Vec<oneshot::Sender<WaitSignal>> {
        self.by_source
            .remove(source)
            .into_iter()
            .flatten()
            .filter_map(|wait| wait.signal)
            .collect()
    }

    /// Abandon every live wait of `requester`. Its requests stay queued so
    /// that the sources' replies are still consumed in order.
    fn abandon_requester(&mut self, requester: &ClientId) -> Vec<oneshot::Sender<WaitSignal>> {
        self.by_source
            .values_mut()
            .flatten()
            .filter(|wait| &wait.requester == requester)
            .filter_map(|wait| wait.signal.take())
            .collect()
    }

    /// Number of live waits.
    fn len(&self) -> usize {
        self.by_source
            .values()
            .flatten()
            .filter(|wait| wait.is_live())
            .count()
    }
}

/// ブートストラップのユースケース
pub struct StateBootstrap {
    /// ConnectionRegistry（接続管理の抽象化）
    registry: Arc<dyn ConnectionRegistry>,
    /// 送信元からの応答を待つ上限時間
    timeout: Duration,
    pending: Arc<Mutex<PendingTable>>,
}

impl StateBootstrap {
    /// 新しい StateBootstrap を作成
    pub fn new(registry: Arc<dyn ConnectionRegistry>, timeout: Duration) -> Self {
        Self {
            registry,
            timeout,
            pending: Arc::new(Mutex::new(PendingTable::default())),
        }
    }

    /// Ready になったばかりの `requester` のためにブートストラップを開始する
    ///
    /// # Returns
    ///
    /// * `BootstrapStart::NoSource` - 他に Ready クライアントがいない
    /// * `BootstrapStart::AlreadyPending` - 既に待機中の要求がある
    /// * `BootstrapStart::Requested` - 送信元に `get-canvas-state` を送った
    pub async fn begin(&self, requester: ClientId) -> BootstrapStart {
        let (signal, receiver) = oneshot::channel();

        let source = {
            let mut pending = self.pending.lock().await;
            if pending.has_requester(&requester) {
                tracing::warn!(
                    "Client '{}' already has a bootstrap in flight; not starting another",
                    requester
                );
                return BootstrapStart::AlreadyPending;
            }

            let Some(source) = self.registry.pick_bootstrap_source(&requester).await else {
                tracing::info!(
                    "No ready peer to bootstrap '{}' from; starting with a blank surface",
                    requester
                );
                return BootstrapStart::NoSource;
            };

            // 応答より先に待機を登録しておく
            pending.push(
                source,
                PendingWait {
                    requester,
                    signal: Some(signal),
                },
            );
            source
        };

        let request = Message::GetCanvasState.encode();
        if let Err(e) = self.registry.push_to(&source, &request).await {
            tracing::warn!(
                "Failed to ask '{}' for canvas state on behalf of '{}': {}",
                source,
                requester,
                e
            );
            let abandoned = self.pending.lock().await.remove(&source, &requester);
            if let Some(signal) = abandoned.and_then(|wait| wait.signal) {
                let _ = signal.send(WaitSignal::SourceGone);
            }
        } else {
            tracing::info!("Asked '{}' for canvas state for '{}'", source, requester);
        }

        let wait = tokio::spawn(await_snapshot(
            self.registry.clone(),
            self.pending.clone(),
            self.timeout,
            requester,
            source,
            receiver,
        ));

        BootstrapStart::Requested { source, wait }
    }

    /// `source` から届いた `canvas-state` を、それが応答している最も古い要求の要求者に渡す
    ///
    /// 要求者が既に待機をやめていた場合は応答を破棄し、次の要求者には回さない。
    /// 要求者に渡せた場合のみ true を返す。
    pub async fn complete(&self, source: &ClientId, snapshot: SurfaceSnapshot) -> bool {
        let wait = self.pending.lock().await.pop_oldest(source);

        let Some(wait) = wait else {
            tracing::warn!("Unsolicited canvas-state from '{}', dropping", source);
            return false;
        };

        let delivered = wait
            .signal
            .is_some_and(|signal| signal.send(WaitSignal::Snapshot(snapshot)).is_ok());
        if !delivered {
            tracing::debug!(
                "Late canvas-state from '{}' for '{}', dropping",
                source,
                wait.requester
            );
        }
        delivered
    }

    /// 切断したクライアントが関わる全ての待機を破棄する
    pub async fn cancel_for(&self, client_id: &ClientId) {
        let (as_source, as_requester) = {
            let mut pending = self.pending.lock().await;
            (
                pending.take_by_source(client_id),
                pending.abandon_requester(client_id),
            )
        };

        for signal in as_source {
            let _ = signal.send(WaitSignal::SourceGone);
        }
        for signal in as_requester {
            let _ = signal.send(WaitSignal::RequesterGone);
        }
    }

    /// 待機中の要求数
    pub async fn pending_count(&self) -> usize {
        self.pending.lock().await.len()
    }
}

async fn await_snapshot(
    registry: Arc<dyn ConnectionRegistry>,
    pending: Arc<Mutex<PendingTable>>,
    bound: Duration,
    requester: ClientId,
    source: ClientId,
    receiver: oneshot::Receiver<WaitSignal>,
) -> BootstrapOutcome {
    let outcome = match tokio::time::timeout(bound, receiver).await {
        Ok(Ok(WaitSignal::Snapshot(snapshot))) => {
            let frame = Message::CanvasStateFromServer(snapshot).encode();
            match registry.push_to(&requester, &frame).await {
                Ok(()) => BootstrapOutcome::Delivered,
                Err(e) => {
                    tracing::debug!("Dropping canvas state for '{}': {}", requester, e);
                    BootstrapOutcome::RequesterGone
                }
            }
        }
        Ok(Ok(WaitSignal::SourceGone)) | Ok(Err(_)) => BootstrapOutcome::SourceGone,
        Ok(Ok(WaitSignal::RequesterGone)) => BootstrapOutcome::RequesterGone,
        Err(_) => {
            pending.lock().await.abandon(&source, &requester);
            BootstrapOutcome::TimedOut
        }
    };

    tracing::info!(
        "Bootstrap of '{}' from '{}' finished: {:?}",
        requester,
        source,
        outcome
    );
    outcome
}
