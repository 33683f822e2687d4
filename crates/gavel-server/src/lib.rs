//! Server runtime for live player auctions: room coordinators, the
//! WebSocket gateway, and the ClickHouse persistence pump.

pub mod config;
pub mod coordinator;
pub mod gateway;
pub mod persist;
pub mod protocol;
pub mod registry;

pub use config::ServerConfig;
pub use coordinator::{CallError, RoomHandle};
pub use gateway::Gateway;
pub use registry::RoomRegistry;
