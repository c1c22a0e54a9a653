//! Session registry and the shared game service

pub mod hub;
pub mod service;

pub use hub::Inbox;
pub use service::GameService;
