//! Client Module
//!
//! The client half of the sync protocol: the presence connection with its
//! reconnect state machine, the inbound event router with echo
//! suppression, the local presence registry, and the since-cursor chat
//! poller.

/// Presence connection and reconnect state machine
pub mod connection;

/// Inbound event routing
pub mod router;

/// Local presence registry
pub mod registry;

/// Chat polling
pub mod chat;

pub use chat::ChatClient;
pub use connection::{backoff_delay, ConnectionState, PresenceClient, PresenceConfig};
pub use registry::PresenceRegistry;
pub use router::EventRouter;
