//! ConnectionRegistry の実装
//!
//! - `inmemory`: HashMap と Mutex による実装

pub mod inmemory;

pub use inmemory::InMemoryConnectionRegistry;
