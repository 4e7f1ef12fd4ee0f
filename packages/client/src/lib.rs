pub mod command;
pub mod engine;
pub mod error;
pub mod preview;
pub mod runner;
pub mod session;

pub use runner::{Connection, SessionEnd, run_client};
pub use session::ClientSession;
