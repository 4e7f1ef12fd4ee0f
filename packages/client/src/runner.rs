//! WebSocket plumbing around a [`ClientSession`].
//!
//! A [`Connection`] owns the socket. Inbound frames and local commands are
//! handled in one `select!` loop; outbound frames go through the session's
//! channel to a writer task that owns the sink.

use std::io::Write;

use futures_util::{
    SinkExt, StreamExt,
    stream::{SplitSink, SplitStream},
};
use rustyline::{DefaultEditor, error::ReadlineError};
use tokio::{net::TcpStream, sync::mpsc, task::JoinHandle};
use tokio_tungstenite::{
    MaybeTlsStream, WebSocketStream, connect_async, tungstenite::protocol::Message as WsMessage,
};

use crate::{
    command::{Command, HELP},
    engine::{DrawEngine, RasterCanvas},
    error::ClientError,
    preview::{PREVIEW_COLUMNS, render_ascii},
    session::ClientSession,
};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

const PROMPT: &str = "tegaki> ";

/// Why [`Connection::run`] returned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEnd {
    /// `quit` was entered
    Quit,
    /// The command source went away
    InputClosed,
    /// The server closed the socket
    ServerClosed,
    /// Reading from the socket failed
    ConnectionLost(String),
}

/// An open session with the relay.
pub struct Connection<E: DrawEngine> {
    session: ClientSession<E>,
    read: SplitStream<WsStream>,
    writer: JoinHandle<()>,
}

impl<E: DrawEngine> Connection<E> {
    /// Connect to `url` and announce readiness.
    pub async fn open(url: &str, engine: E) -> Result<Self, ClientError> {
        let (ws_stream, _response) = connect_async(url)
            .await
            .map_err(|e| ClientError::ConnectionError(e.to_string()))?;
        tracing::info!("Connected to {}", url);

        let (write, read) = ws_stream.split();
        let (tx, rx) = mpsc::unbounded_channel::<String>();
        let writer = tokio::spawn(writer_loop(rx, write));

        let mut session = ClientSession::new(engine, tx);
        session.on_open();

        Ok(Self {
            session,
            read,
            writer,
        })
    }

    /// Process inbound frames and `input` commands until one side ends.
    ///
    /// `on_show` is called for [`Command::Show`]. Returns the engine with the
    /// final surface once the socket has been closed.
    pub async fn run<F>(
        self,
        mut input: mpsc::UnboundedReceiver<Command>,
        mut on_show: F,
    ) -> (E, SessionEnd)
    where
        F: FnMut(&E),
    {
        let Connection {
            mut session,
            mut read,
            writer,
        } = self;

        let end = loop {
            tokio::select! {
                frame = read.next() => match frame {
                    Some(Ok(WsMessage::Text(text))) => {
                        session.handle_text(&text);
                    }
                    Some(Ok(WsMessage::Close(_))) | None => {
                        tracing::info!("Server closed the connection");
                        break SessionEnd::ServerClosed;
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        tracing::warn!("WebSocket read error: {}", e);
                        break SessionEnd::ConnectionLost(e.to_string());
                    }
                },
                command = input.recv() => match command {
                    Some(Command::Quit) => break SessionEnd::Quit,
                    Some(Command::Show) => on_show(session.engine()),
                    Some(command) => execute(&mut session, command),
                    None => break SessionEnd::InputClosed,
                },
            }
        };

        // Dropping the session closes the outbound channel, which lets the
        // writer flush and send a close frame.
        let engine = session.into_engine();
        if let Err(e) = writer.await {
            tracing::warn!("Writer task failed: {}", e);
        }

        (engine, end)
    }
}

/// Apply a command that acts on the session. `Show` and `Quit` are handled
/// by the caller.
fn execute<E: DrawEngine>(session: &mut ClientSession<E>, command: Command) {
    match command {
        Command::Down(point) => session.pointer_down(point),
        Command::Move(point) => session.pointer_move(point),
        Command::Up => session.pointer_up(),
        Command::Line(from, to) => {
            session.pointer_down(from);
            session.pointer_move(to);
            session.pointer_up();
        }
        Command::Color(color) => session.set_color(color),
        Command::Clear => session.clear(),
        Command::Help => {
            println!("{}", HELP);
            redisplay_prompt();
        }
        Command::Show | Command::Quit => {}
    }
}

/// Drain encoded frames to the socket, then close it.
async fn writer_loop(
    mut rx: mpsc::UnboundedReceiver<String>,
    mut write: SplitSink<WsStream, WsMessage>,
) {
    while let Some(frame) = rx.recv().await {
        if let Err(e) = write.send(WsMessage::Text(frame.into())).await {
            tracing::warn!("Failed to send frame: {}", e);
            return;
        }
    }
    let _ = write.close().await;
}

fn redisplay_prompt() {
    print!("{}", PROMPT);
    std::io::stdout().flush().ok();
}

/// Read commands from the terminal on a blocking thread.
fn spawn_readline(input_tx: mpsc::UnboundedSender<Command>) {
    std::thread::spawn(move || {
        let mut rl = match DefaultEditor::new() {
            Ok(rl) => rl,
            Err(e) => {
                eprintln!("Failed to initialize readline: {}", e);
                return;
            }
        };

        loop {
            match rl.readline(PROMPT) {
                Ok(line) => {
                    let line = line.trim();
                    if line.is_empty() {
                        continue;
                    }
                    rl.add_history_entry(line).ok();
                    match line.parse::<Command>() {
                        Ok(command) => {
                            let quit = command == Command::Quit;
                            if input_tx.send(command).is_err() || quit {
                                break;
                            }
                        }
                        Err(e) => println!("{}", e),
                    }
                }
                Err(ReadlineError::Interrupted) => {
                    // Ctrl+C
                    tracing::info!("Interrupted");
                    break;
                }
                Err(ReadlineError::Eof) => {
                    // Ctrl+D
                    tracing::info!("EOF");
                    break;
                }
                Err(err) => {
                    tracing::error!("Readline error: {}", err);
                    break;
                }
            }
        }
    });
}

/// Run the interactive client until the user quits or the server goes away.
pub async fn run_client(
    url: String,
    width: u16,
    height: u16,
) -> Result<(), Box<dyn std::error::Error>> {
    let connection = Connection::open(&url, RasterCanvas::new(width, height)).await?;
    println!(
        "\nDrawing on a {}x{} surface. Type 'help' for commands, Ctrl+D to exit.\n",
        width, height
    );

    let (input_tx, input_rx) = mpsc::unbounded_channel::<Command>();
    spawn_readline(input_tx);

    let (canvas, end) = connection
        .run(input_rx, |canvas: &RasterCanvas| {
            print!("\n{}", render_ascii(canvas, PREVIEW_COLUMNS));
            redisplay_prompt();
        })
        .await;

    match end {
        SessionEnd::ConnectionLost(reason) => Err(Box::new(ClientError::ConnectionLost(reason))),
        end => {
            tracing::info!(
                "Session ended ({:?}) with {} painted pixels",
                end,
                canvas.painted_pixels()
            );
            Ok(())
        }
    }
}
