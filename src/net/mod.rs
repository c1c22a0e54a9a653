//! TCP line protocol and per-connection sessions

pub mod handler;
pub mod protocol;

pub use handler::handle_connection;
