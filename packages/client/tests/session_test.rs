//! End-to-end tests: real client sessions with raster surfaces against an
//! in-process relay.

use std::{sync::Arc, time::Duration};

use tegaki_client::{
    Connection, SessionEnd,
    command::Command,
    engine::{DrawEngine, RasterCanvas},
};
use tegaki_server::{
    infrastructure::registry::InMemoryConnectionRegistry,
    ui::{Server, WS_PATH},
    usecase::{MessageRelay, StateBootstrap},
};
use tegaki_shared::protocol::{Color, Point};
use tokio::{net::TcpListener, sync::mpsc, task::JoinHandle};

const SETTLE: Duration = Duration::from_millis(200);
const RED: [u8; 4] = [255, 0, 0, 255];

/// Start the relay on an ephemeral port and return its WebSocket URL
async fn start_server() -> String {
    let registry = Arc::new(InMemoryConnectionRegistry::default());
    let bootstrap = Arc::new(StateBootstrap::new(
        registry.clone(),
        Duration::from_millis(500),
    ));
    let relay = Arc::new(MessageRelay::new(registry, bootstrap));

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(Server::new(relay).serve_with_shutdown(listener, std::future::pending()));

    format!("ws://{}{}", addr, WS_PATH)
}

/// A running client driven through its command channel
struct RunningClient {
    input: mpsc::UnboundedSender<Command>,
    task: JoinHandle<(RasterCanvas, SessionEnd)>,
}

impl RunningClient {
    async fn join(url: &str) -> Self {
        let connection = Connection::open(url, RasterCanvas::new(64, 48))
            .await
            .unwrap();
        let (input, rx) = mpsc::unbounded_channel();
        let task = tokio::spawn(connection.run(rx, |_: &RasterCanvas| {}));
        tokio::time::sleep(SETTLE).await;
        RunningClient { input, task }
    }

    fn command(&self, command: Command) {
        self.input.send(command).unwrap();
    }

    /// Stop the client and return its final surface
    async fn leave(self) -> RasterCanvas {
        tokio::time::sleep(SETTLE).await;
        self.command(Command::Quit);
        let (canvas, end) = self.task.await.unwrap();
        assert_eq!(end, SessionEnd::Quit);
        canvas
    }
}

fn red_line(from: (f64, f64), to: (f64, f64)) -> [Command; 2] {
    [
        Command::Color(Color::new("#ff0000")),
        Command::Line(Point::new(from.0, from.1), Point::new(to.0, to.1)),
    ]
}

#[tokio::test]
async fn test_newcomer_receives_existing_drawing() {
    // テスト項目: 1 人目が描いた赤い線が、後から参加した 2 人目の画面に同じように現れる
    // given (前提条件):
    let url = start_server().await;
    let alice = RunningClient::join(&url).await;
    for command in red_line((0.0, 0.0), (10.0, 10.0)) {
        alice.command(command);
    }
    tokio::time::sleep(SETTLE).await;

    // when (操作):
    let bob = RunningClient::join(&url).await;

    // then (期待する結果):
    let bob_canvas = bob.leave().await;
    let alice_canvas = alice.leave().await;
    assert_eq!(alice_canvas.pixel(5, 5), Some(RED));
    assert_eq!(bob_canvas.pixel(5, 5), Some(RED));
    assert_eq!(bob_canvas.capture_snapshot(), alice_canvas.capture_snapshot());
}

#[tokio::test]
async fn test_clear_propagates_to_every_peer() {
    // テスト項目: 双方が線を描いた後、片方の clear で両方の画面が空になる
    // given (前提条件):
    let url = start_server().await;
    let alice = RunningClient::join(&url).await;
    let bob = RunningClient::join(&url).await;
    for command in red_line((20.0, 5.0), (20.0, 30.0)) {
        bob.command(command);
    }
    alice.command(Command::Line(Point::new(0.0, 40.0), Point::new(60.0, 40.0)));
    tokio::time::sleep(SETTLE).await;

    // when (操作):
    alice.command(Command::Clear);
    bob.command(Command::Show);

    // then (期待する結果):
    let alice_canvas = alice.leave().await;
    let bob_canvas = bob.leave().await;
    assert!(alice_canvas.is_blank());
    assert!(bob_canvas.is_blank());
}

#[tokio::test]
async fn test_peer_strokes_reach_each_other() {
    // テスト項目: 相手の線は自分の画面に描かれ、両者の画面が一致する
    // given (前提条件):
    let url = start_server().await;
    let alice = RunningClient::join(&url).await;
    let bob = RunningClient::join(&url).await;

    // when (操作):
    for command in red_line((20.0, 5.0), (20.0, 30.0)) {
        bob.command(command);
    }
    alice.command(Command::Line(Point::new(0.0, 40.0), Point::new(60.0, 40.0)));

    // then (期待する結果):
    let alice_canvas = alice.leave().await;
    let bob_canvas = bob.leave().await;
    assert_eq!(alice_canvas.pixel(20, 10), Some(RED));
    assert_eq!(bob_canvas.pixel(30, 40), Some([0, 0, 0, 255]));
    assert_eq!(alice_canvas, bob_canvas);
}
